use chrono::NaiveDateTime;
use serde_json::{Value, json};

/// Metadata about one entry in an archive, as reported by the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Position of the entry in the archive's own enumeration order
    pub index: usize,
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Stored size, when the format compresses entries individually
    pub compressed_size: Option<u64>,
    pub crc32: Option<u32>,
    pub modified: Option<NaiveDateTime>,
    pub is_dir: bool,
}

impl EntryMetadata {
    /// Create a record with only the required fields set
    pub fn new(index: usize, name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let is_dir = name.ends_with('/');
        Self {
            index,
            name,
            size,
            compressed_size: None,
            crc32: None,
            modified: None,
            is_dir,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "index": self.index,
            "name": self.name,
            "size": self.size,
            "compressed_size": self.compressed_size,
            "crc32": self.crc32,
            "modified": self.modified.map(|m| m.format("%Y-%m-%dT%H:%M:%S").to_string()),
            "is_dir": self.is_dir,
        })
    }
}
