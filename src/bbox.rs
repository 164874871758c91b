use gdal::Dataset;
use gdal::vector::LayerAccess;
use serde_json::{Value, json};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{Result, TempError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Bbox {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<Self> {
        if ![xmin, xmax, ymin, ymax].iter().all(|v| v.is_finite()) {
            return Err(TempError::Bbox("Bounds must be finite".to_string()));
        }

        if xmin > xmax || ymin > ymax {
            return Err(TempError::Bbox("Min values must be <= max values".to_string()));
        }

        Ok(Bbox {
            xmin,
            xmax,
            ymin,
            ymax,
        })
    }

    /// Total extent of every geometry in the first layer of a vector file.
    pub fn from_vector_file(path: &Path) -> Result<Self> {
        let dataset = Dataset::open(path)?;
        let layer = dataset.layer(0)?;
        let extent = layer.get_extent()?;

        Bbox::new(extent.MinX, extent.MaxX, extent.MinY, extent.MaxY)
    }

    /// Corners clockwise from the upper-left: `(xmin, ymax)`, `(xmax, ymax)`,
    /// `(xmax, ymin)`, `(xmin, ymin)`.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.xmin, self.ymax),
            (self.xmax, self.ymax),
            (self.xmax, self.ymin),
            (self.xmin, self.ymin),
        ]
    }

    /// Closed ring of the corners, first point repeated at the end.
    pub fn ring(&self) -> Vec<(f64, f64)> {
        let corners = self.corners();
        let mut ring = corners.to_vec();
        ring.push(corners[0]);
        ring
    }

    pub fn to_geojson(&self, crs: &str) -> Value {
        let ring: Vec<[f64; 2]> = self.ring().into_iter().map(|(x, y)| [x, y]).collect();

        json!({
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": crs } },
            "features": [{
                "type": "Feature",
                "id": 0,
                "properties": {},
                "geometry": { "type": "Polygon", "coordinates": [ring] }
            }]
        })
    }

    pub fn write_geojson(&self, path: &Path, crs: &str) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.to_geojson(crs))?;
        Ok(())
    }
}
