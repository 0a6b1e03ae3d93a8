pub mod batch;
pub mod config;
pub mod device;
pub mod download;
pub mod errors;
pub mod image_processor;
pub mod imageops_ai;
pub mod inputs;
pub mod logging;
pub mod model;
pub mod traits;
pub mod writer;

pub mod mocks;

mod progress_tracker;

pub use batch::{BatchOptions, BatchProcessor, BatchReport, CleanupPolicy, ItemOutcome};
pub use config::{Config, ModelArgs};
pub use device::{select_device, Device};
pub use errors::{Result, RmbgError};
pub use image_processor::BackgroundRemover;
pub use model::Model;
pub use traits::*;

/// Picks the device, resolves the model file and loads it. Called once per run.
///
/// Every failure here is fatal for the run: there is nothing to process images with.
pub fn initialize_model(args: &ModelArgs) -> Result<Model> {
    let device = args.device.resolve();
    tracing::info!("Using device: {device}");

    let model_path = match &args.model_path {
        Some(path) => path.clone(),
        None => model::fetch_model(&args.model_repo, &args.model_file, args.hf_token.clone())?,
    };

    let model = Model::new(&model_path, device, args.device_id)?;
    tracing::info!("Model {} ready on {}", model_path.display(), model.device());
    Ok(model)
}
