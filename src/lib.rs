pub mod bbox;
pub mod clip;
pub mod config;
pub mod date_gen;
pub mod error;
pub mod overlay;
pub mod raster_index;
pub mod readers;
