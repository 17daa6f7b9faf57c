use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`crate::Archive`] and the [`crate::ArchiveReader`] implementations
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The container could not be opened (missing, unreadable, wrong format)
    #[error("Unable to open archive {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A content or scan operation was attempted without an open archive
    #[error("No archive has been opened")]
    NotOpen,

    /// No entry with the requested name exists in the container
    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),

    /// The container is a known format with no reader (rar, 7z)
    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    /// The container is readable but its directory or an entry is malformed
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    #[error("Entry {name} is too large to extract safely ({size} bytes)")]
    EntryTooLarge { name: String, size: u64 },

    #[error("Suspicious compression ratio ({ratio}:1) for entry {name}")]
    SuspiciousRatio { name: String, ratio: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub(crate) fn open(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ArchiveError::Open {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether this error means the entry name was not present in the container
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::EntryNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
