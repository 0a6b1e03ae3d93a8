use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{blocking::Client, Url};

use crate::errors::{RmbgError, Result};

const FALLBACK_FILE_NAME: &str = "download";

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Local file name for a URL: its last path segment, query and fragment dropped.
pub fn file_name_for(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Fetches `url` into `download_dir` with a single blocking GET.
///
/// No timeout and no retry. A non-2xx status counts as a failure.
pub fn download(url: &str, download_dir: &Path) -> Result<PathBuf> {
    let download_error = |source| RmbgError::Download {
        url: url.to_string(),
        source,
    };

    fs::create_dir_all(download_dir)
        .map_err(|e| RmbgError::file_system(download_dir, "download directory creation", e))?;
    let destination = download_dir.join(file_name_for(url));

    tracing::debug!("downloading {url} to {}", destination.display());
    let client = Client::builder().timeout(None::<Duration>).build()?;
    let mut response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(download_error)?;

    let mut file = File::create(&destination)
        .map_err(|e| RmbgError::file_system(&destination, "download file creation", e))?;
    if let Err(source) = response.copy_to(&mut file) {
        drop(file);
        let _ = fs::remove_file(&destination);
        return Err(download_error(source));
    }

    Ok(destination)
}
