//! Error types for the downloader module.

use std::path::PathBuf;
use thiserror::Error;

use crate::browser::BrowserError;

/// Download failures that end the whole run.
///
/// Per-image failures (timeouts, bad responses) are not errors; they are
/// reported through an unsuccessful `DownloadResult`.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The browser could not be started.
    #[error("Browser launch failed")]
    Launch(#[source] BrowserError),

    /// Failed to create the destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the image file.
    #[error("Failed to write file: {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Whether this error comes from the local filesystem.
    pub fn is_filesystem(&self) -> bool {
        matches!(
            self,
            Self::DirectoryCreationFailed { .. } | Self::WriteFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_launch_error_keeps_source() {
        let err = DownloadError::Launch(BrowserError::Launch {
            path: PathBuf::from("/opt/chrome"),
            reason: "No such file or directory".to_string(),
        });
        assert_eq!(err.to_string(), "Browser launch failed");
        assert!(err.source().unwrap().to_string().contains("/opt/chrome"));
        assert!(!err.is_filesystem());
    }

    #[test]
    fn test_filesystem_errors() {
        let err = DownloadError::WriteFailed {
            path: PathBuf::from("/out/a.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_filesystem());
        assert_eq!(err.to_string(), "Failed to write file: /out/a.png");
    }
}
