use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for background removal.
///
/// Each variant carries the path or operation it failed on, so a batch run can log
/// the offending input without parsing error strings.
#[derive(Error, Debug)]
pub enum RmbgError {
    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Download error: fetching {url} failed")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Model hub error: fetching {file} from {repo} failed")]
    Hub {
        repo: String,
        file: String,
        #[source]
        source: hf_hub::api::sync::ApiError,
    },

    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RmbgError>;

impl RmbgError {
    /// This error followed by each of its sources, `: `-separated.
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = std::error::Error::source(err);
        }
        message
    }

    pub(crate) fn image<E>(path: impl Into<String>, operation: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageProcessing {
            path: path.into(),
            operation: operation.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn model<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Model {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn file_system(path: impl Into<PathBuf>, operation: &str, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            operation: operation.to_string(),
            source,
        }
    }
}

/// Convert I/O errors to filesystem errors.
///
/// Fallback for I/O errors raised without path context. Code that knows the path
/// should build `RmbgError::FileSystem` directly.
impl From<std::io::Error> for RmbgError {
    fn from(err: std::io::Error) -> Self {
        Self::file_system("unknown", "unknown", err)
    }
}

impl From<image::ImageError> for RmbgError {
    fn from(err: image::ImageError) -> Self {
        Self::image("unknown", "image processing", err)
    }
}

impl From<ort::Error> for RmbgError {
    fn from(err: ort::Error) -> Self {
        Self::model("ort operation", err)
    }
}

/// Used where no URL is at hand; the request URL is recovered from the error when
/// reqwest recorded one.
impl From<reqwest::Error> for RmbgError {
    fn from(err: reqwest::Error) -> Self {
        Self::Download {
            url: err.url().map(ToString::to_string).unwrap_or_default(),
            source: err,
        }
    }
}

/// Shape errors only show up while reshaping model tensors, so they are model errors.
impl From<ndarray::ShapeError> for RmbgError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::model("tensor shape conversion", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_error_mentions_operation_and_path() {
        let err = RmbgError::file_system(
            "out/a.png",
            "create output directory",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("create output directory"));
        assert!(message.contains("out/a.png"));
    }

    #[test]
    fn test_chain_includes_sources() {
        let err = RmbgError::model("inference", std::io::Error::other("out of memory"));
        assert_eq!(err.chain(), "Model error: inference failed: out of memory");
    }

    #[test]
    fn test_io_error_conversion_keeps_source() {
        let err: RmbgError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("gone"));
    }

    #[test]
    fn test_reqwest_error_conversion_keeps_url() {
        let request_error = reqwest::blocking::Client::new()
            .get("http://127.0.0.1:9/none.png")
            .send()
            .err();
        let Some(request_error) = request_error else {
            return;
        };

        let err: RmbgError = request_error.into();
        match err {
            RmbgError::Download { url, .. } => assert_eq!(url, "http://127.0.0.1:9/none.png"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
