use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::{ArgAction, Parser};

use rmbg_rs::{initialize_model, logging, BatchOptions, BatchProcessor, ModelArgs};

const INPUT_FOLDER: &str = "img";
const OUTPUT_FOLDER: &str = "img_no_bg";

/// Removes backgrounds from every image in `img/` into `img_no_bg/`.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct BatchConfig {
    #[command(flatten)]
    model: ModelArgs,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let config = BatchConfig::parse();
    logging::init(config.verbose)?;

    ensure!(
        Path::new(INPUT_FOLDER).is_dir(),
        "Input directory `{INPUT_FOLDER}` does not exist"
    );

    let model = initialize_model(&config.model).context("Failed to initialize model")?;

    let options = BatchOptions {
        output_dir: PathBuf::from(OUTPUT_FOLDER),
        ..BatchOptions::default()
    };
    let processor = BatchProcessor::new(&model, options);

    let report = processor
        .run(&[INPUT_FOLDER])
        .with_context(|| format!("Failed to process {INPUT_FOLDER}"))?;
    tracing::info!("Done: {report}");

    Ok(())
}
