use bytes::Bytes;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use super::EntryMetadata;
use super::tar::TarReader;
use super::zip::ZipReader;
use crate::error::{ArchiveError, Result};

/// Maximum entry size a reader will materialize (1GB)
pub const MAX_ENTRY_SIZE: u64 = 1024 * 1024 * 1024;

/// Maximum compression ratio allowed (1000:1) to detect zip bombs
pub const MAX_COMPRESSION_RATIO: u64 = 1000;

/// Bytes read from the start of a file when sniffing its format
const HEADER_LEN: u64 = 512;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const EMPTY_ZIP_MAGIC: &[u8] = b"PK\x05\x06";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const USTAR_MAGIC: &[u8] = b"ustar";
const USTAR_OFFSET: usize = 257;
const RAR_MAGIC: &[u8] = b"Rar!\x1a\x07";
const SEVEN_ZIP_MAGIC: &[u8] = b"7z\xbc\xaf\x27\x1c";

/// Low-level access to one container format.
///
/// A reader starts unbound; [`ArchiveReader::open`] binds it to a file and
/// every accessor fails with [`ArchiveError::NotOpen`] until then.
pub trait ArchiveReader {
    /// Bind the reader to the container at `path`, releasing any previous one
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Release the container. Does nothing when unbound.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Metadata for the entry at `index`, or `None` past the last entry
    fn stat_index(&mut self, index: usize) -> Result<Option<EntryMetadata>>;

    /// Fully decompressed contents of the named entry
    fn get_from_name(&mut self, name: &str) -> Result<Bytes>;

    /// A stream over the decompressed contents of the named entry
    fn get_stream(&mut self, name: &str) -> Result<Box<dyn Read + '_>>;
}

/// Container formats with a built-in reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    Zip,
    Tar,
    TarGz,
    TarBz2,
}

impl ArchiveType {
    /// Detect archive type from file extension
    pub fn from_path(path: &str) -> Option<Self> {
        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".tar.gz") || path_lower.ends_with(".tgz") {
            return Some(ArchiveType::TarGz);
        }
        if path_lower.ends_with(".tar.bz2") || path_lower.ends_with(".tbz2") {
            return Some(ArchiveType::TarBz2);
        }
        if path_lower.ends_with(".tar") {
            return Some(ArchiveType::Tar);
        }
        if path_lower.ends_with(".zip") {
            return Some(ArchiveType::Zip);
        }
        None
    }

    /// Detect archive type from the leading bytes of a file
    pub fn from_magic(header: &[u8]) -> Option<Self> {
        if header.starts_with(ZIP_MAGIC) || header.starts_with(EMPTY_ZIP_MAGIC) {
            return Some(ArchiveType::Zip);
        }
        if header.starts_with(GZIP_MAGIC) {
            return Some(ArchiveType::TarGz);
        }
        if header.starts_with(BZIP2_MAGIC) {
            return Some(ArchiveType::TarBz2);
        }
        if header
            .get(USTAR_OFFSET..USTAR_OFFSET + USTAR_MAGIC.len())
            .is_some_and(|magic| magic == USTAR_MAGIC)
        {
            return Some(ArchiveType::Tar);
        }
        None
    }

    /// Pick the format for the container at `path`.
    ///
    /// The file name decides when it has a known suffix. Otherwise the
    /// leading bytes are sniffed, and anything unrecognized is handed to the
    /// zip reader so that open failures surface from the reader itself.
    /// Containers identified as rar or 7z are refused up front.
    pub fn detect(path: &Path) -> Result<Self> {
        if let Some(archive_type) = Self::from_path(&path.to_string_lossy()) {
            return Ok(archive_type);
        }

        let header = match read_header(path) {
            Ok(header) => header,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot sniff container, assuming zip");
                return Ok(ArchiveType::Zip);
            }
        };

        if let Some(archive_type) = Self::from_magic(&header) {
            debug!(path = %path.display(), ?archive_type, "detected container from magic bytes");
            return Ok(archive_type);
        }
        if header.starts_with(RAR_MAGIC) || header.starts_with(SEVEN_ZIP_MAGIC) {
            return Err(ArchiveError::UnsupportedFormat(path.display().to_string()));
        }
        Ok(ArchiveType::Zip)
    }

    /// Create an unbound reader for this format
    pub fn reader(self) -> Box<dyn ArchiveReader> {
        match self {
            ArchiveType::Zip => Box::new(ZipReader::new()),
            tar_type => Box::new(TarReader::new(tar_type)),
        }
    }
}

/// Pick a reader for the container at `path`, see [`ArchiveType::detect`]
pub fn reader_for_path(path: &Path) -> Result<Box<dyn ArchiveReader>> {
    Ok(ArchiveType::detect(path)?.reader())
}

fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    File::open(path)?.take(HEADER_LEN).read_to_end(&mut header)?;
    Ok(header)
}

/// Refuse to materialize entries that are implausibly large or compressed
pub(crate) fn check_extract_limits(
    name: &str,
    size: u64,
    compressed_size: Option<u64>,
) -> Result<()> {
    if size > MAX_ENTRY_SIZE {
        return Err(ArchiveError::EntryTooLarge {
            name: name.to_string(),
            size,
        });
    }

    if let Some(compressed) = compressed_size.filter(|c| *c > 0) {
        let ratio = size / compressed;
        if ratio > MAX_COMPRESSION_RATIO {
            return Err(ArchiveError::SuspiciousRatio {
                name: name.to_string(),
                ratio,
            });
        }
    }

    Ok(())
}
