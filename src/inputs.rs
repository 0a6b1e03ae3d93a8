use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::download::is_url;
use crate::errors::{RmbgError, Result};

pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// One command-line input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Url(String),
    File(PathBuf),
    Directory(PathBuf),
    /// Neither a URL nor an existing file or directory.
    Missing(PathBuf),
}

impl InputSource {
    /// Classifies `input`. Anything starting with `http://` or `https://` is a URL;
    /// everything else is looked up on the local filesystem.
    pub fn parse(input: &str) -> Self {
        if is_url(input) {
            return Self::Url(input.to_string());
        }

        let path = PathBuf::from(input);
        if path.is_file() {
            Self::File(path)
        } else if path.is_dir() {
            Self::Directory(path)
        } else {
            Self::Missing(path)
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) | Self::Directory(path) | Self::Missing(path) => {
                write!(f, "{}", path.display())
            }
        }
    }
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// `<output_dir>/<stem>.png`, whatever the input's own extension was.
pub fn output_file_for(output_dir: &Path, input: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .map_or_else(|| OsString::from("output"), OsStr::to_os_string);
    name.push(".png");
    output_dir.join(name)
}

/// Supported images directly inside `dir`, sorted by file name. Not recursive.
pub fn list_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut image_files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| RmbgError::file_system(dir, "directory listing", e.into()))?;
        let path = entry.path();
        if path.is_file() && is_supported_image(path) {
            image_files.push(path.to_path_buf());
        }
    }

    Ok(image_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_supported_formats() {
        let test_cases = vec![
            ("test.jpg", true),
            ("test.JPEG", true),
            ("test.png", true),
            ("test.WebP", true),
            ("test.gif", false),
            ("test.bmp", false),
            ("test.txt", false),
            ("test", false),
        ];

        for (filename, expected) in test_cases {
            assert_eq!(is_supported_image(Path::new(filename)), expected, "{filename}");
        }
    }

    #[test]
    fn test_output_file_for() {
        let output_dir = Path::new("out");
        assert_eq!(output_file_for(output_dir, Path::new("img/a.jpg")), output_dir.join("a.png"));
        assert_eq!(output_file_for(output_dir, Path::new("c.PNG")), output_dir.join("c.png"));
        assert_eq!(
            output_file_for(output_dir, Path::new("x/photo.v2.webp")),
            output_dir.join("photo.v2.png")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_output_file_for_keeps_non_utf8_stem() {
        use std::os::unix::ffi::OsStrExt;

        let input = Path::new(OsStr::from_bytes(b"img/caf\xe9.jpg"));
        let output = output_file_for(Path::new("out"), input);
        assert_eq!(output.as_os_str().as_bytes(), b"out/caf\xe9.png");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            InputSource::Url("https://example.com/a.jpg".to_string()).to_string(),
            "https://example.com/a.jpg"
        );
        assert_eq!(InputSource::Missing(PathBuf::from("x/y.png")).to_string(), "x/y.png");
    }

    #[test]
    fn test_parse() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("a.jpg");
        fs::write(&file, b"")?;
        let missing = temp_dir.path().join("nope.jpg");

        assert_eq!(
            InputSource::parse("https://example.com/a.jpg"),
            InputSource::Url("https://example.com/a.jpg".to_string())
        );
        assert_eq!(InputSource::parse(&file.to_string_lossy()), InputSource::File(file.clone()));
        assert_eq!(
            InputSource::parse(&temp_dir.path().to_string_lossy()),
            InputSource::Directory(temp_dir.path().to_path_buf())
        );
        assert_eq!(InputSource::parse(&missing.to_string_lossy()), InputSource::Missing(missing));
        Ok(())
    }

    #[test]
    fn test_list_directory_is_flat_and_filtered() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        for name in ["b.png", "a.jpg", "notes.txt", "c.PNG", "anim.gif"] {
            fs::write(root.join(name), b"")?;
        }
        fs::create_dir_all(root.join("nested"))?;
        fs::write(root.join("nested/d.jpg"), b"")?;
        fs::create_dir_all(root.join("folder.png"))?;

        let files = list_directory(root)?;
        assert_eq!(files, vec![root.join("a.jpg"), root.join("b.png"), root.join("c.PNG")]);
        Ok(())
    }

    #[test]
    fn test_list_missing_directory_fails() {
        assert!(list_directory(Path::new("/definitely/not/here")).is_err());
    }
}
