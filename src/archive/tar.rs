use bytes::Bytes;
use chrono::DateTime;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom, Take};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::EntryMetadata;
use super::reader::{ArchiveReader, ArchiveType, check_extract_limits};
use crate::error::{ArchiveError, Result};

/// An indexed tar member
#[derive(Debug, Clone)]
struct TarMember {
    metadata: EntryMetadata,
    /// Offset of the member's data in the uncompressed stream
    data_offset: u64,
}

/// Reads tar containers, optionally gzip or bzip2 compressed.
///
/// Tar has no central directory, so the whole stream is walked once on
/// open to build an index of members.
pub struct TarReader {
    archive_type: ArchiveType,
    path: Option<PathBuf>,
    members: Vec<TarMember>,
}

impl TarReader {
    pub fn new(archive_type: ArchiveType) -> Self {
        TarReader {
            archive_type,
            path: None,
            members: Vec::new(),
        }
    }

    fn bound_path(&self) -> Result<&Path> {
        self.path.as_deref().ok_or(ArchiveError::NotOpen)
    }

    /// Later members shadow earlier ones with the same name, as on extraction
    fn find(&self, name: &str) -> Result<&TarMember> {
        self.members
            .iter()
            .rev()
            .find(|m| m.metadata.name == name)
            .ok_or_else(|| ArchiveError::EntryNotFound(name.to_string()))
    }

    /// Wrap the raw file in the decompressor matching the archive type
    fn decoder(&self, file: File) -> Box<dyn Read> {
        let reader = BufReader::new(file);
        match self.archive_type {
            ArchiveType::TarGz => Box::new(flate2::read::GzDecoder::new(reader)),
            ArchiveType::TarBz2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            _ => Box::new(reader),
        }
    }

    fn index_members(&self, path: &Path) -> std::io::Result<Vec<TarMember>> {
        let file = File::open(path)?;
        let mut archive = tar::Archive::new(self.decoder(file));
        let mut members = Vec::new();

        for (index, entry_result) in archive.entries()?.enumerate() {
            let entry = entry_result?;
            let header = entry.header();
            let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let modified = header
                .mtime()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
                .map(|dt| dt.naive_utc());

            members.push(TarMember {
                metadata: EntryMetadata {
                    index,
                    size: entry.size(),
                    compressed_size: None,
                    crc32: None,
                    modified,
                    is_dir: header.entry_type().is_dir() || name.ends_with('/'),
                    name,
                },
                data_offset: entry.raw_file_position(),
            });
        }

        Ok(members)
    }

    /// Walk the decompressed stream again up to `index` and read that member
    fn read_member_sequential(&self, path: &Path, index: usize) -> Result<Vec<u8>> {
        let file = File::open(path)?;
        let mut archive = tar::Archive::new(self.decoder(file));

        for (position, entry_result) in archive.entries()?.enumerate() {
            let mut entry = entry_result?;
            if position == index {
                let mut buffer = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut buffer)?;
                return Ok(buffer);
            }
        }

        Err(ArchiveError::Corrupt(format!(
            "tar member {index} disappeared after indexing"
        )))
    }

    /// Seekable access for uncompressed tar files
    fn open_member_direct(&self, path: &Path, member: &TarMember) -> Result<Take<BufReader<File>>> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(member.data_offset))?;
        Ok(BufReader::new(file).take(member.metadata.size))
    }
}

impl ArchiveReader for TarReader {
    fn open(&mut self, path: &Path) -> Result<()> {
        self.close();

        let members = self
            .index_members(path)
            .map_err(|e| ArchiveError::open(path, e))?;

        debug!(
            path = %path.display(),
            archive_type = ?self.archive_type,
            entries = members.len(),
            "indexed tar archive"
        );
        self.members = members;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn close(&mut self) {
        if let Some(path) = self.path.take() {
            debug!(path = %path.display(), "closed tar archive");
        }
        self.members.clear();
    }

    fn is_open(&self) -> bool {
        self.path.is_some()
    }

    fn stat_index(&mut self, index: usize) -> Result<Option<EntryMetadata>> {
        self.bound_path()?;
        Ok(self.members.get(index).map(|m| m.metadata.clone()))
    }

    fn get_from_name(&mut self, name: &str) -> Result<Bytes> {
        let path = self.bound_path()?;
        let member = self.find(name)?;
        check_extract_limits(name, member.metadata.size, None)?;

        let buffer = match self.archive_type {
            ArchiveType::Tar => {
                let mut buffer = Vec::with_capacity(member.metadata.size as usize);
                self.open_member_direct(path, member)?
                    .read_to_end(&mut buffer)?;
                buffer
            }
            _ => self.read_member_sequential(path, member.metadata.index)?,
        };

        if buffer.len() as u64 != member.metadata.size {
            return Err(ArchiveError::Corrupt(format!(
                "{name}: expected {} bytes, got {}",
                member.metadata.size,
                buffer.len()
            )));
        }

        Ok(Bytes::from(buffer))
    }

    fn get_stream(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        let path = self.bound_path()?;
        let member = self.find(name)?;

        match self.archive_type {
            ArchiveType::Tar => {
                check_extract_limits(name, member.metadata.size, None)?;
                Ok(Box::new(self.open_member_direct(path, member)?))
            }
            // Compressed streams are not seekable, so hand out the materialized bytes
            _ => {
                let bytes = self.get_from_name(name)?;
                Ok(Box::new(Cursor::new(bytes)))
            }
        }
    }
}
