use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "prism-temps")]
#[command(about = "Clip daily temperature rasters and overlay dated point observations")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE", default_value = "./config.json")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clip every raster in a folder to the bounding box of a polygon layer
    Clip,

    /// Extract temperatures for point observations from date-matched rasters
    Overlay {
        /// Ignore the configured trailing window and sample the observation day only
        #[arg(long)]
        single_day: bool,
    },
}
