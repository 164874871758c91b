use super::{DataReader, GeoTransform, Grid, ReadError};
use gdal::Dataset;
use std::path::PathBuf;

/// Reads band 1 of any raster format GDAL can open (BIL, ASCII grid, ...).
pub struct GdalReader {
    pub file_name: PathBuf,
}

impl DataReader for GdalReader {
    fn read_data(&self) -> Result<Grid, ReadError> {
        let dataset = Dataset::open(&self.file_name)
            .map_err(|e| ReadError::Gdal(format!("Failed to open dataset: {}", e)))?;

        let band = dataset
            .rasterband(1)
            .map_err(|e| ReadError::Gdal(format!("Failed to get band 1: {}", e)))?;
        let (width, height) = dataset.raster_size();

        let transform = dataset
            .geo_transform()
            .map_err(|e| ReadError::Gdal(format!("Missing geotransform: {}", e)))?;

        let buffer = band
            .read_as::<f32>((0, 0), (width, height), (width, height), None)
            .map_err(|e| ReadError::Gdal(format!("Failed to read band: {}", e)))?;

        Ok(Grid {
            width,
            height,
            transform: GeoTransform(transform),
            nodata: band.no_data_value(),
            buffer: buffer.data().to_vec(),
        })
    }
}
