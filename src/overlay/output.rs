use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::sampler::SampleResult;
use crate::config::Window;
use crate::error::{Result, TempError};

const BASE_COLUMNS: [&str; 7] = [
    "OBS_NUM",
    "OBS_NAME",
    "OBS_DATE",
    "RASTER_ROW",
    "RASTER_COL",
    "RASTER_FILE",
    "TEMP",
];

/// `temp_observations_multiday_2023_04_28.csv` style name for a run on `run_date`.
pub fn output_file_name(window: Option<Window>, run_date: NaiveDate) -> String {
    let mode = if window.is_some() {
        "multiday_"
    } else {
        "singleday_"
    };
    format!("temp_observations_{}{}.csv", mode, run_date.format("%Y_%m_%d"))
}

pub fn header(window: Option<Window>) -> Vec<String> {
    let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
    if let Some(window) = window {
        columns.extend(window.offsets().map(|d| format!("TMINUS_{}", d)));
        columns.push("TEMP_RANGE".to_string());
        columns.push("AVG_TEMP".to_string());
    }
    columns
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn record(result: &SampleResult, window: Option<Window>) -> Vec<String> {
    let mut fields = vec![
        result.point_id.clone(),
        result.point_name.clone(),
        result.point_date.clone(),
        optional(result.cell.map(|c| c.row)),
        optional(result.cell.map(|c| c.col)),
        result.raster_file.clone().unwrap_or_default(),
        optional(result.temperature),
    ];

    if window.is_some() {
        fields.extend(result.trailing.iter().map(|s| optional(s.temperature)));
        fields.push(optional(result.range));
        fields.push(optional(result.average));
    }

    fields
}

/// CSV writer for sample results; the header is written on creation.
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
    window: Option<Window>,
    records: usize,
}

impl ResultWriter<File> {
    pub fn create(path: &Path, window: Option<Window>) -> Result<Self> {
        Self::from_writer(File::create(path)?, window)
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn from_writer(inner: W, window: Option<Window>) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(false)
            .from_writer(inner);
        writer.write_record(header(window))?;
        Ok(Self {
            writer,
            window,
            records: 0,
        })
    }

    pub fn write(&mut self, result: &SampleResult) -> Result<()> {
        self.writer.write_record(record(result, self.window))?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| TempError::Io(std::io::Error::other(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::sampler::{Cell, SampleStatus, TrailingSample};

    fn result(window: bool) -> SampleResult {
        let day = NaiveDate::from_ymd_opt(2020, 1, 4).unwrap();
        SampleResult {
            point_id: "12".to_string(),
            point_name: "Narragansett, RI".to_string(),
            point_date: "1/5/2020".to_string(),
            cell: Some(Cell { row: 3, col: 7 }),
            raster_file: Some("clipped_PRISM_tmean_stable_4kmD2_20200105_bil.tif".to_string()),
            temperature: Some(2.5),
            status: SampleStatus::Sampled,
            trailing: if window {
                vec![
                    TrailingSample {
                        offset: 1,
                        date: day,
                        temperature: None,
                    },
                    TrailingSample {
                        offset: 2,
                        date: day.pred_opt().unwrap(),
                        temperature: Some(-1.5),
                    },
                ]
            } else {
                Vec::new()
            },
            range: window.then_some(4.0),
            average: window.then_some(0.5),
        }
    }

    #[test]
    fn test_output_file_name() {
        let run_date = NaiveDate::from_ymd_opt(2023, 4, 28).unwrap();
        assert_eq!(
            output_file_name(None, run_date),
            "temp_observations_singleday_2023_04_28.csv"
        );
        assert_eq!(
            output_file_name(Some(Window::new(1, 7).unwrap()), run_date),
            "temp_observations_multiday_2023_04_28.csv"
        );
    }

    #[test]
    fn test_header() {
        assert_eq!(header(None).len(), 7);
        assert_eq!(
            header(Some(Window::new(1, 4).unwrap()))[5..],
            [
                "RASTER_FILE",
                "TEMP",
                "TMINUS_1",
                "TMINUS_2",
                "TMINUS_3",
                "TEMP_RANGE",
                "AVG_TEMP"
            ]
        );
    }

    #[test]
    fn test_single_day_csv() {
        let mut writer = ResultWriter::from_writer(Vec::new(), None).unwrap();
        writer.write(&result(false)).unwrap();
        assert_eq!(writer.records(), 1);

        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(
            text,
            "OBS_NUM,OBS_NAME,OBS_DATE,RASTER_ROW,RASTER_COL,RASTER_FILE,TEMP\n\
             12,\"Narragansett, RI\",1/5/2020,3,7,clipped_PRISM_tmean_stable_4kmD2_20200105_bil.tif,2.5\n"
        );
    }

    #[test]
    fn test_multiday_csv_leaves_absent_values_empty() {
        let window = Some(Window::new(1, 3).unwrap());
        let mut writer = ResultWriter::from_writer(Vec::new(), window).unwrap();
        writer.write(&result(true)).unwrap();

        let mut unsampled = result(true);
        unsampled.cell = None;
        unsampled.raster_file = None;
        unsampled.temperature = None;
        unsampled.status = SampleStatus::MissingRaster;
        for sample in unsampled.trailing.iter_mut() {
            sample.temperature = None;
        }
        unsampled.range = None;
        unsampled.average = None;
        writer.write(&unsampled).unwrap();

        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "OBS_NUM,OBS_NAME,OBS_DATE,RASTER_ROW,RASTER_COL,RASTER_FILE,TEMP,TMINUS_1,TMINUS_2,TEMP_RANGE,AVG_TEMP"
        );
        assert!(lines[1].ends_with(",2.5,,-1.5,4,0.5"));
        assert_eq!(lines[2], "12,\"Narragansett, RI\",1/5/2020,,,,,,,,");
    }
}
