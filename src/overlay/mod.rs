pub mod cache;
pub mod observations;
pub mod output;
pub mod runner;
pub mod sampler;

pub use cache::{FileLoader, GridLoader, RasterCache};
pub use observations::{ObservationPoint, load_observations};
pub use runner::{OverlayRunner, OverlaySummary};
pub use sampler::{Cell, SampleResult, SampleStatus, TrailingSample, WindowedTemperatureSampler};
