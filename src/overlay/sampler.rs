use chrono::NaiveDate;
use log::{debug, warn};
use std::fmt;
use std::iter;

use super::cache::{GridLoader, RasterCache};
use super::observations::ObservationPoint;
use crate::config::Window;
use crate::date_gen::TrailingDates;
use crate::raster_index::RasterDateIndex;
use crate::readers::{CellRead, Footprint, ReadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: isize,
    pub col: isize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    Sampled,
    MissingRaster,
    OutOfBounds,
    NoData,
    Unreadable,
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleStatus::Sampled => write!(f, "sampled"),
            SampleStatus::MissingRaster => write!(f, "no raster for date"),
            SampleStatus::OutOfBounds => write!(f, "outside raster extent"),
            SampleStatus::NoData => write!(f, "nodata cell"),
            SampleStatus::Unreadable => write!(f, "raster could not be read"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrailingSample {
    pub offset: u32,
    pub date: NaiveDate,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleResult {
    pub point_id: String,
    pub point_name: String,
    pub point_date: String,
    pub cell: Option<Cell>,
    pub raster_file: Option<String>,
    pub temperature: Option<f32>,
    pub status: SampleStatus,
    pub trailing: Vec<TrailingSample>,
    pub range: Option<f32>,
    pub average: Option<f32>,
}

impl SampleResult {
    /// Result carrying only the point's identity, with every value absent.
    pub fn blank(point: &ObservationPoint, window: Option<Window>, status: SampleStatus) -> Self {
        let trailing = window
            .map(|w| {
                TrailingDates::new(point.date, w)
                    .map(|(offset, date)| TrailingSample {
                        offset,
                        date,
                        temperature: None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            point_id: point.id.clone(),
            point_name: point.name.clone(),
            point_date: point.date_text.clone(),
            cell: None,
            raster_file: None,
            temperature: None,
            status,
            trailing,
            range: None,
            average: None,
        }
    }
}

/// Range and mean of the observation-day value plus every present trailing value.
///
/// Returns `None` without an observation-day value, even if trailing days were sampled.
pub fn aggregate(observed: Option<f32>, trailing: &[TrailingSample]) -> Option<(f32, f32)> {
    let observed = observed?;

    let values = iter::once(observed)
        .chain(trailing.iter().filter_map(|s| s.temperature))
        .map(f64::from);

    let (min, max, sum, count) = values.fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0, 0usize),
        |(min, max, sum, count), v| (min.min(v), max.max(v), sum + v, count + 1),
    );

    Some(((max - min) as f32, (sum / count as f64) as f32))
}

/// Samples observation points against date-matched rasters, with an optional trailing
/// window over the preceding days.
///
/// The row and column found on the observation-day raster are reused for every trailing
/// raster, so the grids are expected to be co-registered. A trailing grid with a
/// different transform or size contributes no value.
pub struct WindowedTemperatureSampler<'a, L: GridLoader> {
    index: &'a RasterDateIndex,
    cache: RasterCache<L>,
    window: Option<Window>,
}

impl<'a, L: GridLoader> WindowedTemperatureSampler<'a, L> {
    pub fn new(index: &'a RasterDateIndex, loader: L, window: Option<Window>) -> Self {
        Self {
            index,
            cache: RasterCache::new(loader),
            window,
        }
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub fn sample(&mut self, point: &ObservationPoint) -> Result<SampleResult, ReadError> {
        let index = self.index;
        let Some(path) = index.get(&point.date) else {
            warn!(
                "No raster available for observation {} and date {}",
                point.id, point.date_text
            );
            return Ok(SampleResult::blank(
                point,
                self.window,
                SampleStatus::MissingRaster,
            ));
        };

        let grid = self.cache.get(point.date, path)?;
        let (row, col) = grid.cell_at(point.x, point.y)?;
        let read = grid.read_cell(row, col);
        let footprint = grid.footprint();

        let mut result = SampleResult::blank(point, self.window, SampleStatus::Sampled);
        result.cell = Some(Cell { row, col });
        result.raster_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        match read {
            CellRead::Value(value) => result.temperature = Some(value),
            CellRead::NoData => {
                debug!(
                    "Observation {} falls on a nodata cell ({}, {})",
                    point.id, row, col
                );
                result.status = SampleStatus::NoData;
            }
            CellRead::OutOfBounds => {
                warn!(
                    "Observation {} at ({}, {}) is outside raster {} (row {}, col {})",
                    point.id,
                    point.x,
                    point.y,
                    path.display(),
                    row,
                    col
                );
                result.status = SampleStatus::OutOfBounds;
                return Ok(result);
            }
        }

        if self.window.is_none() {
            return Ok(result);
        }

        for sample in result.trailing.iter_mut() {
            sample.temperature = self.trailing_value(point, sample.date, footprint, row, col);
        }

        if let Some((range, average)) = aggregate(result.temperature, &result.trailing) {
            result.range = Some(range);
            result.average = Some(average);
        }

        Ok(result)
    }

    fn trailing_value(
        &mut self,
        point: &ObservationPoint,
        date: NaiveDate,
        reference: Footprint,
        row: isize,
        col: isize,
    ) -> Option<f32> {
        let index = self.index;
        let Some(path) = index.get(&date) else {
            debug!("Observation {}: no raster for {}", point.id, date);
            return None;
        };

        let grid = match self.cache.get(date, path) {
            Ok(grid) => grid,
            Err(e) => {
                debug!("Observation {}: skipping {}: {}", point.id, date, e);
                return None;
            }
        };
        if grid.footprint() != reference {
            warn!(
                "Observation {}: raster {} is not aligned with the observation-day raster",
                point.id,
                path.display()
            );
            return None;
        }

        match grid.read_cell(row, col) {
            CellRead::Value(value) => Some(value),
            CellRead::NoData | CellRead::OutOfBounds => None,
        }
    }
}
