use std::fmt;

pub trait DataReader {
    fn read_data(&self) -> Result<Grid, ReadError>;
}

#[derive(Debug)]
pub enum ReadError {
    GeoTiff(String),
    Gdal(String),
    SingularTransform,
    /// The file already failed to load earlier in the run.
    Unavailable(String),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::GeoTiff(msg) => write!(f, "GeoTIFF: {}", msg),
            ReadError::Gdal(msg) => write!(f, "GDAL: {}", msg),
            ReadError::SingularTransform => {
                write!(f, "Affine transform is not invertible")
            }
            ReadError::Unavailable(msg) => write!(f, "Previously failed to load: {}", msg),
        }
    }
}

impl std::error::Error for ReadError {}

pub enum FileType {
    GeoTiff,
    Gdal,
}

/// GDAL-ordered affine coefficients:
/// `[origin_x, pixel_width, row_rotation, origin_y, column_rotation, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// North-up transform without rotation.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform([origin_x, pixel_width, 0.0, origin_y, 0.0, -pixel_height])
    }

    /// Row and column of the cell containing `(x, y)`.
    ///
    /// Fractional pixel coordinates are floored, so points left of or above the origin
    /// map to negative indices instead of being rounded onto the grid.
    pub fn world_to_cell(&self, x: f64, y: f64) -> Result<(isize, isize), ReadError> {
        let [x0, a, b, y0, d, e] = self.0;
        let det = a * e - b * d;
        if det == 0.0 || !det.is_finite() {
            return Err(ReadError::SingularTransform);
        }

        let dx = x - x0;
        let dy = y - y0;
        let col = (dx * e - dy * b) / det;
        let row = (dy * a - dx * d) / det;

        Ok((row.floor() as isize, col.floor() as isize))
    }

    /// World coordinates of the upper-left corner of `(row, col)`.
    pub fn cell_to_world(&self, row: isize, col: isize) -> (f64, f64) {
        let [x0, a, b, y0, d, e] = self.0;
        let (row, col) = (row as f64, col as f64);
        (x0 + col * a + row * b, y0 + col * d + row * e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellRead {
    Value(f32),
    NoData,
    OutOfBounds,
}

/// Transform and size; two grids with equal footprints are co-registered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub transform: GeoTransform,
    pub width: usize,
    pub height: usize,
}

/// Band 1 of a raster, row-major.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
    pub buffer: Vec<f32>,
}

impl Grid {
    pub fn cell_at(&self, x: f64, y: f64) -> Result<(isize, isize), ReadError> {
        self.transform.world_to_cell(x, y)
    }

    pub fn contains(&self, row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width
    }

    pub fn read_cell(&self, row: isize, col: isize) -> CellRead {
        if !self.contains(row, col) {
            return CellRead::OutOfBounds;
        }

        let value = self.buffer[row as usize * self.width + col as usize];
        if value.is_nan() || self.nodata.is_some_and(|nd| value == nd as f32) {
            CellRead::NoData
        } else {
            CellRead::Value(value)
        }
    }

    pub fn footprint(&self) -> Footprint {
        Footprint {
            transform: self.transform,
            width: self.width,
            height: self.height,
        }
    }
}
