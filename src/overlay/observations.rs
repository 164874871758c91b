use chrono::NaiveDate;
use gdal::Dataset;
use gdal::vector::{Feature, LayerAccess};
use log::{debug, info};
use std::path::Path;

use crate::config::FieldNames;
use crate::error::{Result, TempError};

/// A dated point observation. `date_text` is the attribute exactly as read.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationPoint {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub date_text: String,
    pub x: f64,
    pub y: f64,
}

/// Loads observations from a CSV (`.csv`) or any GDAL vector source.
///
/// Points must share the rasters' coordinate system. A date that does not parse with
/// `date_format` aborts the load.
pub fn load_observations(
    path: &Path,
    fields: &FieldNames,
    date_format: &str,
) -> Result<Vec<ObservationPoint>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let points = if is_csv {
        load_csv(path, fields, date_format)?
    } else {
        load_vector(path, fields, date_format)?
    };

    info!("Loaded {} observations from {}", points.len(), path.display());
    Ok(points)
}

pub fn parse_observation_date(id: &str, text: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), format).map_err(|_| TempError::MalformedDate {
        id: id.to_string(),
        value: text.to_string(),
        format: format.to_string(),
    })
}

fn load_csv(path: &Path, fields: &FieldNames, date_format: &str) -> Result<Vec<ObservationPoint>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |field: &str| {
        headers
            .iter()
            .position(|h| h == field)
            .ok_or_else(|| TempError::MissingField {
                id: "header".to_string(),
                field: field.to_string(),
            })
    };

    let id_col = column(&fields.id)?;
    let name_col = column(&fields.name)?;
    let date_col = column(&fields.date)?;
    let x_col = column(&fields.x)?;
    let y_col = column(&fields.y)?;

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        let get = |col: usize| record.get(col).unwrap_or_default().to_string();

        let id = get(id_col);
        let date_text = get(date_col);
        let coordinate = |col: usize| {
            get(col)
                .parse::<f64>()
                .map_err(|_| TempError::MissingGeometry(id.clone()))
        };

        points.push(ObservationPoint {
            date: parse_observation_date(&id, &date_text, date_format)?,
            x: coordinate(x_col)?,
            y: coordinate(y_col)?,
            name: get(name_col),
            date_text,
            id,
        });
    }

    Ok(points)
}

fn load_vector(
    path: &Path,
    fields: &FieldNames,
    date_format: &str,
) -> Result<Vec<ObservationPoint>> {
    let dataset = Dataset::open(path)?;
    let mut layer = dataset.layer(0)?;
    debug!("Reading layer '{}' from {}", layer.name(), path.display());

    let mut points = Vec::new();
    for feature in layer.features() {
        let id = field_text(&feature, &fields.id, "?")?;
        let name = field_text(&feature, &fields.name, &id)?;
        let date_text = field_text(&feature, &fields.date, &id)?;

        let (x, y, _) = feature
            .geometry()
            .ok_or_else(|| TempError::MissingGeometry(id.clone()))?
            .get_point(0);

        points.push(ObservationPoint {
            date: parse_observation_date(&id, &date_text, date_format)?,
            date_text,
            id,
            name,
            x,
            y,
        });
    }

    Ok(points)
}

fn field_text(feature: &Feature, field: &str, id: &str) -> Result<String> {
    let missing = || TempError::MissingField {
        id: id.to_string(),
        field: field.to_string(),
    };
    let index = feature.field_index(field).map_err(|_| missing())?;
    Ok(feature.field_as_string(index)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_observation_date() {
        assert_eq!(
            parse_observation_date("1", "1/5/2020", "%m/%d/%Y").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 5).unwrap()
        );
        assert_eq!(
            parse_observation_date("1", "12/31/2019", "%m/%d/%Y").unwrap(),
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_malformed_date_names_the_observation() {
        let err = parse_observation_date("17", "2020-01-05", "%m/%d/%Y").unwrap_err();
        match err {
            TempError::MalformedDate { id, value, .. } => {
                assert_eq!(id, "17");
                assert_eq!(value, "2020-01-05");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("obs.csv");
        fs::write(
            &path,
            "OBS_NUM,OBS_NAME,OBS_DATE,X,Y\n\
             1, Block Island ,1/5/2020,-71.58,41.17\n\
             2,Kingston,2/29/2020,-71.53,41.48\n",
        )
        .unwrap();

        let points = load_observations(&path, &FieldNames::default(), "%m/%d/%Y").unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, "1");
        assert_eq!(points[0].name, "Block Island");
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2020, 1, 5).unwrap());
        assert_eq!(points[0].date_text, "1/5/2020");
        assert_eq!((points[1].x, points[1].y), (-71.53, 41.48));
    }

    #[test]
    fn test_load_csv_with_malformed_date_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("obs.csv");
        fs::write(
            &path,
            "OBS_NUM,OBS_NAME,OBS_DATE,X,Y\n1,A,1/5/2020,0,0\n2,B,13/45/2020,0,0\n",
        )
        .unwrap();

        let result = load_observations(&path, &FieldNames::default(), "%m/%d/%Y");
        assert!(matches!(result, Err(TempError::MalformedDate { ref id, .. }) if id == "2"));
    }

    #[test]
    fn test_load_csv_missing_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("obs.csv");
        fs::write(&path, "OBS_NUM,OBS_DATE,X,Y\n1,1/5/2020,0,0\n").unwrap();

        let result = load_observations(&path, &FieldNames::default(), "%m/%d/%Y");
        assert!(matches!(result, Err(TempError::MissingField { ref field, .. }) if field == "OBS_NAME"));
    }

    fn write_points(path: &Path, dates: &[&str]) {
        let features: Vec<serde_json::Value> = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                serde_json::json!({
                    "type": "Feature",
                    "properties": {
                        "OBS_NUM": format!("{}", i + 1),
                        "OBS_NAME": format!("Station {}", i + 1),
                        "OBS_DATE": date,
                    },
                    "geometry": {
                        "type": "Point",
                        "coordinates": [-71.5 + i as f64 * 0.25, 41.25]
                    }
                })
            })
            .collect();
        let layer = serde_json::json!({ "type": "FeatureCollection", "features": features });
        fs::write(path, layer.to_string()).unwrap();
    }

    #[test]
    fn test_load_vector_points() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_obsv.geojson");
        write_points(&path, &["1/5/2020", "12/31/2019"]);

        let points = load_observations(&path, &FieldNames::default(), "%m/%d/%Y").unwrap();

        assert_eq!(
            points,
            vec![
                ObservationPoint {
                    id: "1".to_string(),
                    name: "Station 1".to_string(),
                    date: NaiveDate::from_ymd_opt(2020, 1, 5).unwrap(),
                    date_text: "1/5/2020".to_string(),
                    x: -71.5,
                    y: 41.25,
                },
                ObservationPoint {
                    id: "2".to_string(),
                    name: "Station 2".to_string(),
                    date: NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
                    date_text: "12/31/2019".to_string(),
                    x: -71.25,
                    y: 41.25,
                },
            ]
        );
    }

    #[test]
    fn test_load_vector_with_malformed_date_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_obsv.geojson");
        write_points(&path, &["1/5/2020", "not a date"]);

        let result = load_observations(&path, &FieldNames::default(), "%m/%d/%Y");
        assert!(matches!(result, Err(TempError::MalformedDate { ref id, .. }) if id == "2"));
    }

    #[test]
    fn test_load_vector_missing_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_obsv.geojson");
        write_points(&path, &["1/5/2020"]);
        let fields = FieldNames {
            date: "SURVEY_DATE".to_string(),
            ..FieldNames::default()
        };

        let result = load_observations(&path, &fields, "%m/%d/%Y");
        assert!(
            matches!(result, Err(TempError::MissingField { ref field, .. }) if field == "SURVEY_DATE")
        );
    }
}
