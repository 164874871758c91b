use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::bbox::Bbox;
use crate::config::ClipConfig;
use crate::error::{Result, TempError};
use crate::raster_index::list_files;
use crate::readers::GeoTransform;

/// Pixel window of a raster, in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    /// Smallest window of whole pixels covering `bbox`, clamped to the raster.
    ///
    /// Only meaningful for north-up transforms. Returns `None` when the box misses the
    /// raster entirely.
    pub fn for_bbox(
        transform: &GeoTransform,
        raster_width: usize,
        raster_height: usize,
        bbox: &Bbox,
    ) -> Option<Self> {
        let [x0, pixel_w, _, y0, _, pixel_h] = transform.0;
        if pixel_w == 0.0 || pixel_h == 0.0 {
            return None;
        }

        // geotransform: [top_left_x, pixel_width, 0, top_left_y, 0, -pixel_height]
        let min_col = ((bbox.xmin - x0) / pixel_w).floor() as i64;
        let max_col = ((bbox.xmax - x0) / pixel_w).ceil() as i64;
        let min_row = ((bbox.ymax - y0) / pixel_h).floor() as i64;
        let max_row = ((bbox.ymin - y0) / pixel_h).ceil() as i64;

        let start_col = min_col.clamp(0, raster_width as i64) as usize;
        let end_col = max_col.clamp(0, raster_width as i64) as usize;
        let start_row = min_row.clamp(0, raster_height as i64) as usize;
        let end_row = max_row.clamp(0, raster_height as i64) as usize;

        if end_col <= start_col || end_row <= start_row {
            return None;
        }

        Some(PixelWindow {
            col_off: start_col,
            row_off: start_row,
            width: end_col - start_col,
            height: end_row - start_row,
        })
    }

    /// Transform of the cropped raster: same pixels, origin moved to the window corner.
    pub fn transform(&self, source: &GeoTransform) -> GeoTransform {
        let (x, y) = source.cell_to_world(self.row_off as isize, self.col_off as isize);
        let [_, a, b, _, d, e] = source.0;
        GeoTransform([x, a, b, y, d, e])
    }
}

/// `clipped_<stem>.tif`, where the stem stops at the first `.` of the file name.
pub fn clipped_file_name(source: &Path) -> Option<String> {
    let name = source.file_name()?.to_str()?;
    let stem = name.split('.').next()?;
    Some(format!("clipped_{}.tif", stem))
}

/// Crops every band of `input` to `bbox` and writes the result as a GeoTIFF.
pub fn clip_raster(input: &Path, output: &Path, bbox: &Bbox) -> Result<PixelWindow> {
    let dataset = Dataset::open(input)?;
    let transform = GeoTransform(dataset.geo_transform()?);
    let (width, height) = dataset.raster_size();

    let window = PixelWindow::for_bbox(&transform, width, height, bbox)
        .ok_or_else(|| TempError::DisjointBbox(input.to_path_buf()))?;

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let clipped = driver.create_with_band_type::<f32, _>(
        output,
        window.width,
        window.height,
        dataset.raster_count(),
    )?;

    discard_on_error(output, copy_window(&dataset, clipped, &transform, window))?;
    Ok(window)
}

/// Writes the `window` of every band of `source` into `clipped`, closing it on return.
fn copy_window(
    source: &Dataset,
    mut clipped: Dataset,
    transform: &GeoTransform,
    window: PixelWindow,
) -> Result<()> {
    clipped.set_geo_transform(&window.transform(transform).0)?;
    let projection = source.projection();
    if !projection.is_empty() {
        clipped.set_projection(&projection)?;
    }

    for band_index in 1..=source.raster_count() {
        let band = source.rasterband(band_index)?;
        let buffer = band.read_as::<f32>(
            (window.col_off as isize, window.row_off as isize),
            (window.width, window.height),
            (window.width, window.height),
            None,
        )?;

        let mut out_band = clipped.rasterband(band_index)?;
        let mut out_buffer = Buffer::new((window.width, window.height), buffer.data().to_vec());
        out_band.write((0, 0), (window.width, window.height), &mut out_buffer)?;

        if let Some(nodata) = band.no_data_value() {
            out_band.set_no_data_value(Some(nodata))?;
        }
    }

    Ok(())
}

/// Removes a partially written `output` when `result` is an error.
fn discard_on_error<T>(output: &Path, result: Result<T>) -> Result<T> {
    if result.is_err()
        && let Err(e) = fs::remove_file(output)
    {
        warn!("Could not remove partial output {}: {}", output.display(), e);
    }
    result
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClipSummary {
    pub bbox: Option<Bbox>,
    pub clipped: Vec<PathBuf>,
    pub failed: usize,
}

/// Clips every matching raster in a folder to the bounding box of a polygon layer.
#[derive(Debug)]
pub struct ClipRunner<'a> {
    config: &'a ClipConfig,
}

impl<'a> ClipRunner<'a> {
    pub fn new(config: &'a ClipConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<ClipSummary> {
        let config = self.config;

        let bbox = Bbox::from_vector_file(config.mask_file())?;
        info!("Bounding box corners: {:?}", bbox.corners());

        bbox.write_geojson(config.bbox_file(), config.crs())?;
        info!("Bounding box written to {}", config.bbox_file().display());

        let mut summary = self.clip_all(&bbox)?;
        summary.bbox = Some(bbox);
        Ok(summary)
    }

    fn clip_all(&self, bbox: &Bbox) -> Result<ClipSummary> {
        let config = self.config;
        if !config.raster_dir().is_dir() {
            return Err(TempError::RasterDir(config.raster_dir().to_path_buf()));
        }
        fs::create_dir_all(config.output_dir())?;

        let mut summary = ClipSummary::default();
        for input in list_files(config.raster_dir(), config.raster_pattern(), false)? {
            let Some(name) = clipped_file_name(&input) else {
                continue;
            };
            let output = config.output_dir().join(name);

            match clip_raster(&input, &output, bbox) {
                Ok(window) => {
                    debug!("{} -> {} ({:?})", input.display(), output.display(), window);
                    summary.clipped.push(output);
                    if summary.clipped.len() % config.progress_every() == 0 {
                        info!("Processed {} rasters so far...", summary.clipped.len());
                    }
                }
                Err(e) => {
                    error!("Failed to clip {}: {}", input.display(), e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Finished clipping {} raster files to bounding box: {:?}",
            summary.clipped.len(),
            bbox
        );
        Ok(summary)
    }
}
