use glob::Pattern;

use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub mod error;
pub use error::ConfigError;

pub mod window;
pub use window::Window;

const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";
const DEFAULT_DATE_TOKEN: usize = 5;
const DEFAULT_RASTER_PATTERN: &str = "*.tif";

/// Attribute names holding the observation ID, name, date and (for CSV input) coordinates.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FieldNames {
    pub id: String,
    pub name: String,
    pub date: String,
    pub x: String,
    pub y: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            id: "OBS_NUM".to_string(),
            name: "OBS_NAME".to_string(),
            date: "OBS_DATE".to_string(),
            x: "X".to_string(),
            y: "Y".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    point_file: PathBuf,
    raster_dir: PathBuf,
    output_dir: PathBuf,
    raster_pattern: Pattern,
    date_token_index: usize,
    recursive: bool,
    fields: FieldNames,
    date_format: String,
    window: Option<Window>,
    progress_every: usize,
}

#[derive(Debug, Clone)]
pub struct ClipConfig {
    mask_file: PathBuf,
    bbox_file: PathBuf,
    raster_dir: PathBuf,
    output_dir: PathBuf,
    raster_pattern: Pattern,
    crs: String,
    progress_every: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    overlay: Option<OverlayConfig>,
    clip: Option<ClipConfig>,
}

fn compile_pattern<E: Error>(pattern: &str) -> Result<Pattern, E> {
    Pattern::new(pattern).map_err(|e| E::custom(ConfigError::Pattern(e)))
}

fn check_progress<E: Error>(progress_every: usize) -> Result<usize, E> {
    if progress_every == 0 {
        return Err(E::custom(ConfigError::ProgressInterval));
    }
    Ok(progress_every)
}

// Deserializes the overlay section, compiling the raster pattern and validating the window
// bounds and progress interval up front.
impl<'de> Deserialize<'de> for OverlayConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct OverlayHelper {
            point_file: PathBuf,
            raster_dir: PathBuf,
            output_dir: PathBuf,
            #[serde(default = "default_overlay_pattern")]
            raster_pattern: String,
            #[serde(default = "default_date_token")]
            date_token_index: usize,
            #[serde(default)]
            recursive: bool,
            #[serde(default)]
            fields: FieldNames,
            #[serde(default = "default_date_format")]
            date_format: String,
            window: Option<window::WindowHelper>,
            #[serde(default = "default_overlay_progress")]
            progress_every: usize,
        }

        fn default_overlay_pattern() -> String {
            DEFAULT_RASTER_PATTERN.to_string()
        }
        fn default_date_token() -> usize {
            DEFAULT_DATE_TOKEN
        }
        fn default_date_format() -> String {
            DEFAULT_DATE_FORMAT.to_string()
        }
        fn default_overlay_progress() -> usize {
            200
        }

        let helper = OverlayHelper::deserialize(deserializer)?;

        let window = match helper.window {
            Some(w) => Some(
                Window::new(w.start, w.end).map_err(|e| D::Error::custom(ConfigError::Window(e)))?,
            ),
            None => None,
        };

        Ok(OverlayConfig {
            point_file: helper.point_file,
            raster_dir: helper.raster_dir,
            output_dir: helper.output_dir,
            raster_pattern: compile_pattern::<D::Error>(&helper.raster_pattern)?,
            date_token_index: helper.date_token_index,
            recursive: helper.recursive,
            fields: helper.fields,
            date_format: helper.date_format,
            window,
            progress_every: check_progress::<D::Error>(helper.progress_every)?,
        })
    }
}

impl<'de> Deserialize<'de> for ClipConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ClipHelper {
            mask_file: PathBuf,
            bbox_file: PathBuf,
            raster_dir: PathBuf,
            output_dir: PathBuf,
            #[serde(default = "default_clip_pattern")]
            raster_pattern: String,
            #[serde(default = "default_crs")]
            crs: String,
            #[serde(default = "default_clip_progress")]
            progress_every: usize,
        }

        fn default_clip_pattern() -> String {
            "*.bil".to_string()
        }
        fn default_crs() -> String {
            "EPSG:4269".to_string()
        }
        fn default_clip_progress() -> usize {
            20
        }

        let helper = ClipHelper::deserialize(deserializer)?;

        Ok(ClipConfig {
            mask_file: helper.mask_file,
            bbox_file: helper.bbox_file,
            raster_dir: helper.raster_dir,
            output_dir: helper.output_dir,
            raster_pattern: compile_pattern::<D::Error>(&helper.raster_pattern)?,
            crs: helper.crs,
            progress_every: check_progress::<D::Error>(helper.progress_every)?,
        })
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader).map_err(ConfigError::from)?;

        Ok(config)
    }

    pub fn overlay(&self) -> Result<&OverlayConfig, ConfigError> {
        self.overlay
            .as_ref()
            .ok_or(ConfigError::MissingSection("overlay"))
    }

    pub fn clip(&self) -> Result<&ClipConfig, ConfigError> {
        self.clip.as_ref().ok_or(ConfigError::MissingSection("clip"))
    }
}

impl OverlayConfig {
    /// Single-day overlay with default field names, date format and raster pattern.
    pub fn new(
        point_file: PathBuf,
        raster_dir: PathBuf,
        output_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            point_file,
            raster_dir,
            output_dir,
            raster_pattern: Pattern::new(DEFAULT_RASTER_PATTERN)?,
            date_token_index: DEFAULT_DATE_TOKEN,
            recursive: false,
            fields: FieldNames::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            window: None,
            progress_every: 200,
        })
    }

    pub fn with_window(mut self, window: Option<Window>) -> Self {
        self.window = window;
        self
    }

    pub fn point_file(&self) -> &Path {
        &self.point_file
    }

    pub fn raster_dir(&self) -> &Path {
        &self.raster_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn raster_pattern(&self) -> &Pattern {
        &self.raster_pattern
    }

    pub fn date_token_index(&self) -> usize {
        self.date_token_index
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn fields(&self) -> &FieldNames {
        &self.fields
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub fn progress_every(&self) -> usize {
        self.progress_every
    }
}

impl ClipConfig {
    pub fn mask_file(&self) -> &Path {
        &self.mask_file
    }

    pub fn bbox_file(&self) -> &Path {
        &self.bbox_file
    }

    pub fn raster_dir(&self) -> &Path {
        &self.raster_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn raster_pattern(&self) -> &Pattern {
        &self.raster_pattern
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn progress_every(&self) -> usize {
        self.progress_every
    }
}
