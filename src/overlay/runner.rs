use chrono::{Local, NaiveDate};
use log::{error, info};
use std::fs;
use std::path::PathBuf;

use super::cache::{FileLoader, GridLoader};
use super::observations::load_observations;
use super::output::{ResultWriter, output_file_name};
use super::sampler::{SampleResult, SampleStatus, WindowedTemperatureSampler};
use crate::config::OverlayConfig;
use crate::error::Result;
use crate::raster_index::RasterDateIndex;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OverlaySummary {
    pub observations: usize,
    pub records: usize,
    pub missing_raster: usize,
    pub out_of_bounds: usize,
    pub no_data: usize,
    pub failed: usize,
    pub output_file: PathBuf,
}

/// Overlays every observation on its date-matched raster and writes one CSV row per point.
#[derive(Debug)]
pub struct OverlayRunner<'a> {
    config: &'a OverlayConfig,
}

impl<'a> OverlayRunner<'a> {
    pub fn new(config: &'a OverlayConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<OverlaySummary> {
        self.run_with(FileLoader, Local::now().date_naive())
    }

    pub fn run_with<L: GridLoader>(&self, loader: L, run_date: NaiveDate) -> Result<OverlaySummary> {
        let config = self.config;

        let index = RasterDateIndex::from_dir(
            config.raster_dir(),
            config.raster_pattern(),
            config.date_token_index(),
            config.recursive(),
        )?;
        match index.date_range() {
            Some((first, last)) => info!(
                "Indexed {} rasters from {} to {} ({} names without a date)",
                index.len(),
                first,
                last,
                index.skipped()
            ),
            None => info!("No dated rasters found in {}", config.raster_dir().display()),
        }

        let points = load_observations(
            config.point_file(),
            config.fields(),
            config.date_format(),
        )?;

        fs::create_dir_all(config.output_dir())?;
        let output_file = config
            .output_dir()
            .join(output_file_name(config.window(), run_date));
        let mut writer = ResultWriter::create(&output_file, config.window())?;

        let mut sampler = WindowedTemperatureSampler::new(&index, loader, config.window());
        let mut summary = OverlaySummary {
            observations: points.len(),
            ..Default::default()
        };

        for (idx, point) in points.iter().enumerate() {
            match sampler.sample(point) {
                Ok(result) => {
                    match result.status {
                        SampleStatus::MissingRaster => summary.missing_raster += 1,
                        SampleStatus::OutOfBounds => summary.out_of_bounds += 1,
                        SampleStatus::NoData => summary.no_data += 1,
                        SampleStatus::Sampled | SampleStatus::Unreadable => {}
                    }
                    writer.write(&result)?;
                }
                Err(e) => {
                    error!(
                        "Observation {} ({}): {}",
                        point.id, point.date_text, e
                    );
                    summary.failed += 1;
                    writer.write(&SampleResult::blank(
                        point,
                        config.window(),
                        SampleStatus::Unreadable,
                    ))?;
                }
            }

            if (idx + 1) % config.progress_every() == 0 {
                info!("Processed {} records so far...", idx + 1);
            }
        }

        summary.records = writer.records();
        writer.finish()?;

        info!(
            "Done. {} observations in input file, {} records in results",
            summary.observations, summary.records
        );
        info!("Results written to {}", output_file.display());

        summary.output_file = output_file;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Window;
    use crate::overlay::cache::memory::MemoryLoader;
    use crate::readers::{GeoTransform, Grid};
    use std::fs::File;
    use tempfile::tempdir;

    fn grid(value: f32) -> Grid {
        Grid {
            width: 2,
            height: 1,
            transform: GeoTransform::north_up(-72.0, 42.0, 0.5, 0.5),
            nodata: Some(-9999.0),
            buffer: vec![value, value * 2.0],
        }
    }

    #[test]
    fn test_overlay_run_writes_one_row_per_point() {
        let dir = tempdir().unwrap();
        let raster_dir = dir.path().join("clipped");
        fs::create_dir(&raster_dir).unwrap();

        let mut loader = MemoryLoader::default();
        for (day, value) in [("20200101", 1.0), ("20200103", 2.5), ("20200105", 8.0)] {
            let path = raster_dir.join(format!(
                "clipped_PRISM_tmean_stable_4kmD2_{}_bil.tif",
                day
            ));
            File::create(&path).unwrap();
            loader.insert(path, grid(value));
        }

        let point_file = dir.path().join("obs.csv");
        fs::write(
            &point_file,
            "OBS_NUM,OBS_NAME,OBS_DATE,X,Y\n\
             1,Westerly,1/5/2020,-71.8,41.9\n\
             2,Providence,1/3/2020,-71.2,41.9\n\
             3,Newport,1/7/2020,-71.8,41.9\n",
        )
        .unwrap();

        let output_dir = dir.path().join("output");
        let config = OverlayConfig::new(point_file, raster_dir, output_dir.clone())
            .unwrap()
            .with_window(Some(Window::new(1, 3).unwrap()));

        let run_date = NaiveDate::from_ymd_opt(2023, 4, 28).unwrap();
        let summary = OverlayRunner::new(&config)
            .run_with(&loader, run_date)
            .unwrap();

        assert_eq!(summary.observations, 3);
        assert_eq!(summary.records, 3);
        assert_eq!(summary.missing_raster, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            summary.output_file,
            output_dir.join("temp_observations_multiday_2023_04_28.csv")
        );

        let text = fs::read_to_string(&summary.output_file).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            "1,Westerly,1/5/2020,0,0,clipped_PRISM_tmean_stable_4kmD2_20200105_bil.tif,8,,2.5,5.5,5.25"
        );
        assert_eq!(
            lines[2],
            "2,Providence,1/3/2020,0,1,clipped_PRISM_tmean_stable_4kmD2_20200103_bil.tif,5,,2,3,3.5"
        );
        assert_eq!(lines[3], "3,Newport,1/7/2020,,,,,,,,");
    }

    #[test]
    fn test_load_failure_writes_a_blank_row() {
        let dir = tempdir().unwrap();
        let raster_dir = dir.path().join("clipped");
        fs::create_dir(&raster_dir).unwrap();
        File::create(raster_dir.join("clipped_PRISM_tmean_stable_4kmD2_20200105_bil.tif")).unwrap();

        let point_file = dir.path().join("obs.csv");
        fs::write(
            &point_file,
            "OBS_NUM,OBS_NAME,OBS_DATE,X,Y\n1,Westerly,1/5/2020,-71.8,41.9\n",
        )
        .unwrap();

        // Nothing registered in the loader, so opening the raster fails
        let loader = MemoryLoader::default();
        let config =
            OverlayConfig::new(point_file, raster_dir, dir.path().join("output")).unwrap();
        let run_date = NaiveDate::from_ymd_opt(2023, 4, 28).unwrap();

        let summary = OverlayRunner::new(&config)
            .run_with(&loader, run_date)
            .unwrap();

        assert_eq!(summary.observations, 1);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.failed, 1);
        assert!(
            summary
                .output_file
                .ends_with("temp_observations_singleday_2023_04_28.csv")
        );

        let text = fs::read_to_string(&summary.output_file).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "1,Westerly,1/5/2020,,,,");
    }
}
