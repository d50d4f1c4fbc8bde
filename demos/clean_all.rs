//! Runs the whole pipeline on the files under `data/raw`.
//!
//! ```text
//! cargo run --example clean_all --features demos -- [config.json]
//! ```

use log::info;
use raindust::{Pipeline, PipelineConfig, PipelineError};
use std::path::Path;

fn main() -> Result<(), PipelineError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let pipeline = match std::env::args().nth(1) {
        Some(path) => Pipeline::from_config_file(Path::new(&path))?,
        None => Pipeline::new(PipelineConfig::default())?,
    };
    let report = pipeline.run()?;

    info!(
        "Radiation rows: {} raw, {} clean",
        report.radiation_raw_rows, report.radiation_clean_rows
    );
    info!("Geolocation retention: {}", report.geolocation);
    info!("Association retention: {}", report.association);
    if let Some(path) = report.output_path {
        println!("{} associated measurements written to {}", report.output_rows, path.display());
    }
    Ok(())
}
