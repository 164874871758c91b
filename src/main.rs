use clap::Parser;
use env_logger::Env;
use log::{error, info};

mod cli;

use cli::{Args, Command};
use prism_temps::clip::ClipRunner;
use prism_temps::config::Config;
use prism_temps::error::Result;
use prism_temps::overlay::OverlayRunner;

fn run(args: &Args) -> Result<()> {
    let config = Config::from_file(&args.config)?;

    match args.command {
        Command::Clip => {
            let summary = ClipRunner::new(config.clip()?).run()?;
            if summary.failed > 0 {
                error!("{} rasters could not be clipped", summary.failed);
            }
        }
        Command::Overlay { single_day } => {
            let mut overlay = config.overlay()?.clone();
            if single_day {
                overlay = overlay.with_window(None);
            }
            let summary = OverlayRunner::new(&overlay).run()?;
            info!(
                "{} without a raster, {} outside the raster extent, {} on nodata cells, {} failed",
                summary.missing_raster, summary.out_of_bounds, summary.no_data, summary.failed
            );
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
