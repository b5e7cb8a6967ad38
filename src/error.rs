use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure categories reported to callers in a [`ListingResult`](crate::ListingResult).
///
/// The serialized names match the category strings the remote helper uses,
/// so the UI can localize a message per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "NotAFileError")]
    NotAFile,
    #[serde(rename = "CorruptArchiveError")]
    CorruptArchive,
    #[serde(rename = "UnsupportedFeatureError")]
    UnsupportedFeature,
    #[serde(rename = "EmptyArchiveError")]
    EmptyArchive,
    #[serde(rename = "RemoteUnavailableError")]
    RemoteUnavailable,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "NotFoundError",
            ErrorCategory::NotAFile => "NotAFileError",
            ErrorCategory::CorruptArchive => "CorruptArchiveError",
            ErrorCategory::UnsupportedFeature => "UnsupportedFeatureError",
            ErrorCategory::EmptyArchive => "EmptyArchiveError",
            ErrorCategory::RemoteUnavailable => "RemoteUnavailableError",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while reading, listing or extracting a container.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("container not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// Password-protected containers and unknown formats.
    #[error("unsupported archive: {0}")]
    UnsupportedFeature(String),

    /// The container parsed but holds no entries. Callers render this as an
    /// empty listing.
    #[error("archive contains no entries")]
    EmptyArchive,

    /// Only seen inside the resolver; always recovered by the local fallback.
    #[error("remote helper unavailable: {0}")]
    RemoteUnavailable(String),

    /// The container could not be read after it passed the existence check.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl ArchiveError {
    /// Category for a user-facing failure, `None` for invariant violations
    /// that must propagate to the caller.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            ArchiveError::NotFound(_) => Some(ErrorCategory::NotFound),
            ArchiveError::NotAFile(_) => Some(ErrorCategory::NotAFile),
            ArchiveError::CorruptArchive(_) => Some(ErrorCategory::CorruptArchive),
            ArchiveError::UnsupportedFeature(_) => Some(ErrorCategory::UnsupportedFeature),
            ArchiveError::EmptyArchive => Some(ErrorCategory::EmptyArchive),
            ArchiveError::RemoteUnavailable(_) => Some(ErrorCategory::RemoteUnavailable),
            ArchiveError::Io { .. } => None,
        }
    }

    /// Whether an error raised mid-enumeration ends the whole listing instead
    /// of skipping the single entry.
    pub fn aborts_listing(&self) -> bool {
        matches!(
            self,
            ArchiveError::UnsupportedFeature(_) | ArchiveError::Io { .. }
        )
    }

    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ArchiveError::Io {
            source,
            path: path.into(),
        }
    }

    pub(crate) fn password_required() -> Self {
        ArchiveError::UnsupportedFeature(
            "password-protected archives are not supported".to_string(),
        )
    }
}

pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;
