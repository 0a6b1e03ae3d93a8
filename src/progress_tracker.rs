use indicatif::{ProgressBar, ProgressStyle};

pub(crate) struct ProgressTracker {
    progress_bar: ProgressBar,
}

impl ProgressTracker {
    pub(crate) fn new(len: usize, visible: bool) -> Self {
        if !visible {
            return Self {
                progress_bar: ProgressBar::hidden(),
            };
        }

        let progress_bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        ) {
            progress_bar.set_style(style.progress_chars("#>-"));
        }

        Self { progress_bar }
    }

    /// Runs `f` with the bar cleared so log lines do not tear through it.
    pub(crate) fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.progress_bar.suspend(f)
    }

    pub(crate) fn start(&self, label: &str) {
        self.progress_bar.set_message(label.to_string());
    }

    pub(crate) fn inc(&self) {
        self.progress_bar.inc(1);
    }

    pub(crate) fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}
