use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::download::download;
use crate::errors::{RmbgError, Result};
use crate::image_processor::BackgroundRemover;
use crate::inputs::{is_supported_image, list_directory, output_file_for, InputSource};
use crate::progress_tracker::ProgressTracker;
use crate::traits::SegmentationModel;

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_DOWNLOAD_DIR: &str = "temp_downloads";

/// What happens to a downloaded temp file once its image has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CleanupPolicy {
    /// Delete only after the image was written; failed downloads stay for inspection.
    #[default]
    OnSuccess,
    /// Delete whether or not processing succeeded.
    Always,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub download_dir: PathBuf,
    pub cleanup: CleanupPolicy,
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            cleanup: CleanupPolicy::default(),
            show_progress: true,
        }
    }
}

/// Result of one input item. Failures carry the rendered error so a run can
/// report them after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Processed { input: String, output: PathBuf },
    Skipped { input: String, reason: String },
    Failed { input: String, error: String },
}

impl ItemOutcome {
    pub fn input(&self) -> &str {
        match self {
            Self::Processed { input, .. } | Self::Skipped { input, .. } | Self::Failed { input, .. } => {
                input
            }
        }
    }

    pub const fn is_processed(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn processed(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|item| item.is_processed())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items
            .iter()
            .filter(|item| matches!(item, ItemOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items
            .iter()
            .filter(|item| matches!(item, ItemOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} skipped, {} failed",
            self.processed().count(),
            self.skipped().count(),
            self.failed().count()
        )
    }
}

/// Unit of work after inputs are expanded.
enum Planned {
    Local(PathBuf),
    Remote(String),
    Done(ItemOutcome),
}

/// Drives inputs through the pipeline one at a time, in order.
///
/// A failing item is logged and recorded; it never stops the items after it.
pub struct BatchProcessor<M: SegmentationModel> {
    remover: BackgroundRemover<M>,
    options: BatchOptions,
}

impl<M: SegmentationModel> BatchProcessor<M> {
    pub const fn new(model: M, options: BatchOptions) -> Self {
        Self {
            remover: BackgroundRemover::new(model),
            options,
        }
    }

    /// Processes every input. Only a failure to create the output directory is
    /// returned as an error; everything else ends up in the report.
    pub fn run<S: AsRef<str>>(&self, inputs: &[S]) -> Result<BatchReport> {
        let output_dir = &self.options.output_dir;
        fs::create_dir_all(output_dir)
            .map_err(|e| RmbgError::file_system(output_dir, "output directory creation", e))?;

        let plan = inputs
            .iter()
            .flat_map(|input| plan(InputSource::parse(input.as_ref())))
            .collect::<Vec<_>>();
        let jobs = plan
            .iter()
            .filter(|planned| !matches!(planned, Planned::Done(_)))
            .count();
        if jobs == 0 {
            tracing::warn!("No supported images found in the given inputs");
        }

        let progress = ProgressTracker::new(jobs, self.options.show_progress);
        let mut report = BatchReport::default();
        for planned in plan {
            let outcome = match planned {
                Planned::Done(outcome) => outcome,
                Planned::Local(path) => {
                    let label = path.display().to_string();
                    progress.start(&label);
                    let outcome = self.process_file(&path, &label, &progress);
                    progress.inc();
                    outcome
                }
                Planned::Remote(url) => {
                    progress.start(&url);
                    let outcome = self.process_url(&url, &progress);
                    progress.inc();
                    outcome
                }
            };
            report.items.push(outcome);
        }
        progress.finish();

        Ok(report)
    }

    fn process_file(&self, path: &Path, label: &str, progress: &ProgressTracker) -> ItemOutcome {
        let output = output_file_for(&self.options.output_dir, path);
        progress.suspend(|| {
            tracing::info!("Processing {} -> {}", path.display(), output.display());
        });

        match self.remover.remove_background(path, &output) {
            Ok(output) => ItemOutcome::Processed {
                input: label.to_string(),
                output,
            },
            Err(e) => {
                let error = e.chain();
                progress.suspend(|| {
                    tracing::error!("Error processing {}: {error}", path.display());
                });
                ItemOutcome::Failed {
                    input: label.to_string(),
                    error,
                }
            }
        }
    }

    fn process_url(&self, url: &str, progress: &ProgressTracker) -> ItemOutcome {
        let downloaded = match download(url, &self.options.download_dir) {
            Ok(downloaded) => downloaded,
            Err(e) => {
                let error = e.chain();
                progress.suspend(|| tracing::error!("Failed to download {url}: {error}"));
                return ItemOutcome::Failed {
                    input: url.to_string(),
                    error,
                };
            }
        };

        let outcome = self.process_file(&downloaded, url, progress);

        let remove = match self.options.cleanup {
            CleanupPolicy::Always => true,
            CleanupPolicy::OnSuccess => outcome.is_processed(),
        };
        progress.suspend(|| {
            if remove {
                if let Err(e) = fs::remove_file(&downloaded) {
                    tracing::warn!("Could not remove {}: {e}", downloaded.display());
                }
            } else {
                tracing::warn!("Keeping {} after failed processing", downloaded.display());
            }
        });

        outcome
    }
}

fn plan(source: InputSource) -> Vec<Planned> {
    tracing::debug!("Resolving input {source}");
    match source {
        InputSource::Url(url) => vec![Planned::Remote(url)],
        InputSource::File(path) if is_supported_image(&path) => vec![Planned::Local(path)],
        InputSource::File(path) => {
            tracing::debug!("Skipping unsupported file {}", path.display());
            vec![Planned::Done(ItemOutcome::Skipped {
                input: path.display().to_string(),
                reason: "unsupported extension".to_string(),
            })]
        }
        InputSource::Directory(dir) => match list_directory(&dir) {
            Ok(files) => files.into_iter().map(Planned::Local).collect(),
            Err(e) => {
                let error = e.chain();
                tracing::error!("Error processing {}: {error}", dir.display());
                vec![Planned::Done(ItemOutcome::Failed {
                    input: dir.display().to_string(),
                    error,
                })]
            }
        },
        InputSource::Missing(path) => {
            tracing::warn!("Skipping {}: no such file or directory", path.display());
            vec![Planned::Done(ItemOutcome::Skipped {
                input: path.display().to_string(),
                reason: "no such file or directory".to_string(),
            })]
        }
    }
}
