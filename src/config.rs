use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, ValueEnum};

use crate::batch::{BatchOptions, CleanupPolicy, DEFAULT_DOWNLOAD_DIR, DEFAULT_OUTPUT_DIR};
use crate::device::{select_device, Device};
use crate::model::{DEFAULT_MODEL_FILE, DEFAULT_MODEL_REPO};

/// Command line of `rmbg`.
#[derive(Parser, Clone, Debug)]
#[command(
    version,
    about = "Remove background from images using the RMBG-2.0 model",
    long_about = None
)]
pub struct Config {
    /// Input image file(s), directory, or URL(s)
    #[arg(required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output directory
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Where URL inputs are downloaded before processing
    #[arg(long, default_value = DEFAULT_DOWNLOAD_DIR)]
    pub download_dir: PathBuf,

    /// When downloaded inputs are deleted
    #[arg(long, value_enum, default_value_t = CleanupPolicy::OnSuccess)]
    pub cleanup_downloads: CleanupPolicy,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            output_dir: self.output.clone(),
            download_dir: self.download_dir.clone(),
            cleanup: self.cleanup_downloads,
            show_progress: true,
        }
    }
}

/// Model and device selection, shared by both binaries.
#[derive(Args, Clone, Debug)]
pub struct ModelArgs {
    /// Local ONNX model file; skips the model hub when set
    #[arg(short, long, value_parser = existing_file)]
    pub model_path: Option<PathBuf>,

    /// Model hub repository to fetch the model from
    #[arg(long, default_value = DEFAULT_MODEL_REPO)]
    pub model_repo: String,

    /// File inside the repository
    #[arg(long, default_value = DEFAULT_MODEL_FILE)]
    pub model_file: String,

    /// Access token for gated repositories
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// Compute backend
    #[arg(short, long, value_enum, default_value_t = DevicePreference::Auto)]
    pub device: DevicePreference,

    /// CUDA device ordinal
    #[arg(long, default_value_t = 0)]
    pub device_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DevicePreference {
    /// CUDA if available, then CoreML, then CPU
    Auto,
    Cuda,
    Coreml,
    Cpu,
}

impl DevicePreference {
    pub fn resolve(self) -> Device {
        match self {
            Self::Auto => select_device(),
            Self::Cuda => Device::Cuda,
            Self::Coreml => Device::CoreMl,
            Self::Cpu => Device::Cpu,
        }
    }
}

fn existing_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{s} is not a file"))
    }
}
