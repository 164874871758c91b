pub mod gdal_raster;
pub mod geotiff;
pub mod types;
pub mod utils;

pub use gdal_raster::GdalReader;
pub use geotiff::GeoTiffReader;
pub use types::{CellRead, DataReader, FileType, Footprint, GeoTransform, Grid, ReadError};
pub use utils::reader_from_filetype;

use std::path::PathBuf;

pub fn create_reader(file_name: PathBuf) -> Box<dyn DataReader> {
    match reader_from_filetype(&file_name) {
        FileType::GeoTiff => Box::new(GeoTiffReader { file_name }),
        FileType::Gdal => Box::new(GdalReader { file_name }),
    }
}
