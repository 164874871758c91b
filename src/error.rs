use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::readers::ReadError;

#[derive(Error, Debug)]
pub enum TempError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Raster read error: {0}")]
    Read(#[from] ReadError),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Raster directory does not exist: {}", .0.display())]
    RasterDir(PathBuf),

    #[error("Observation {id}: cannot parse date '{value}' with format '{format}'")]
    MalformedDate {
        id: String,
        value: String,
        format: String,
    },

    #[error("Observation {id}: missing attribute '{field}'")]
    MissingField { id: String, field: String },

    #[error("Observation {0}: missing point geometry")]
    MissingGeometry(String),

    #[error("Invalid bounding box: {0}")]
    Bbox(String),

    #[error("Bounding box does not overlap raster {}", .0.display())]
    DisjointBbox(PathBuf),
}

pub type Result<T> = std::result::Result<T, TempError>;
