use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use super::reader::{ArchiveReader, MAX_ENTRY_SIZE, check_extract_limits};
use super::EntryMetadata;
use crate::error::{ArchiveError, Result};

/// Reads zip containers through the `zip` crate
#[derive(Default)]
pub struct ZipReader {
    archive: Option<ZipArchive<BufReader<File>>>,
    path: Option<PathBuf>,
}

impl ZipReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn archive_mut(&mut self) -> Result<&mut ZipArchive<BufReader<File>>> {
        self.archive.as_mut().ok_or(ArchiveError::NotOpen)
    }
}

impl ArchiveReader for ZipReader {
    fn open(&mut self, path: &Path) -> Result<()> {
        self.close();

        let file = File::open(path).map_err(|e| ArchiveError::open(path, e))?;
        let archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| ArchiveError::open(path, e))?;

        debug!(path = %path.display(), entries = archive.len(), "opened zip archive");
        self.archive = Some(archive);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn close(&mut self) {
        if self.archive.take().is_some() {
            debug!(path = ?self.path, "closed zip archive");
        }
        self.path = None;
    }

    fn is_open(&self) -> bool {
        self.archive.is_some()
    }

    fn stat_index(&mut self, index: usize) -> Result<Option<EntryMetadata>> {
        let archive = self.archive_mut()?;
        if index >= archive.len() {
            return Ok(None);
        }

        // Raw access skips decompressor setup; only the header is needed here
        let file = archive
            .by_index_raw(index)
            .map_err(|e| map_zip_error(None, e))?;

        let modified: Option<zip::DateTime> = file.last_modified().into();

        Ok(Some(EntryMetadata {
            index,
            name: file.name().to_string(),
            size: file.size(),
            compressed_size: Some(file.compressed_size()),
            crc32: Some(file.crc32()),
            modified: modified.and_then(to_naive),
            is_dir: file.is_dir(),
        }))
    }

    fn get_from_name(&mut self, name: &str) -> Result<Bytes> {
        let archive = self.archive_mut()?;
        let mut file = archive
            .by_name(name)
            .map_err(|e| map_zip_error(Some(name), e))?;

        check_extract_limits(name, file.size(), Some(file.compressed_size()))?;

        let capacity = file.size().min(MAX_ENTRY_SIZE) as usize;
        let mut buffer = Vec::with_capacity(capacity);
        // The zip crate checks the CRC once the entry is read to the end
        file.read_to_end(&mut buffer)?;

        Ok(Bytes::from(buffer))
    }

    fn get_stream(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        let archive = self.archive_mut()?;
        let file = archive
            .by_name(name)
            .map_err(|e| map_zip_error(Some(name), e))?;

        check_extract_limits(name, file.size(), Some(file.compressed_size()))?;
        Ok(Box::new(file))
    }
}

fn map_zip_error(name: Option<&str>, err: ZipError) -> ArchiveError {
    match (name, err) {
        (Some(name), ZipError::FileNotFound) => ArchiveError::EntryNotFound(name.to_string()),
        (_, ZipError::Io(e)) => ArchiveError::Io(e),
        (_, other) => ArchiveError::Corrupt(other.to_string()),
    }
}

/// Zip timestamps are MS-DOS local times without a zone
fn to_naive(dt: zip::DateTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(dt.year() as i32, dt.month() as u32, dt.day() as u32)?.and_hms_opt(
        dt.hour() as u32,
        dt.minute() as u32,
        dt.second() as u32,
    )
}
