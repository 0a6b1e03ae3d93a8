use anyhow::{Context, Result};
use clap::Parser;

use rmbg_rs::{initialize_model, logging, BatchProcessor, Config};

fn main() -> Result<()> {
    let config = Config::parse();
    logging::init(config.verbose)?;

    let model = initialize_model(&config.model).context("Failed to initialize model")?;
    let processor = BatchProcessor::new(&model, config.batch_options());

    // Per-item failures are already logged; they never change the exit status.
    match processor.run(config.input.as_slice()) {
        Ok(report) => {
            tracing::info!("Background removal completed successfully! ({report})");
            for item in report.failed() {
                tracing::warn!("Failed: {}", item.input());
            }
        }
        Err(e) => tracing::error!("An error occurred: {}", e.chain()),
    }

    Ok(())
}
