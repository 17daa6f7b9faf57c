//! Recorded-game access layered on top of a container reader.
//!
//! [`Archive`] owns one [`ArchiveReader`], scans the container once when it
//! is opened, and keeps the entries that look like recorded games. Entry
//! contents are read by name straight from the reader.

pub mod entry;
pub mod reader;
pub mod tar;
pub mod zip;

use bytes::Bytes;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace, warn};

use crate::config::RecognizedExtensions;
use crate::error::{ArchiveError, Result};

pub use entry::EntryMetadata;
pub use reader::{ArchiveReader, ArchiveType, reader_for_path};

/// An archive of recorded games
pub struct Archive {
    reader: Box<dyn ArchiveReader>,
    extensions: RecognizedExtensions,
    is_open: bool,
    /// Recorded-game entries found by the last successful open, in archive order
    stats: Vec<EntryMetadata>,
}

impl Archive {
    /// Create a closed archive backed by `reader`, recognizing the default
    /// recorded-game extensions
    pub fn new(reader: Box<dyn ArchiveReader>) -> Self {
        Self::with_extensions(reader, RecognizedExtensions::default())
    }

    pub fn with_extensions(reader: Box<dyn ArchiveReader>, extensions: RecognizedExtensions) -> Self {
        Archive {
            reader,
            extensions,
            is_open: false,
            stats: Vec::new(),
        }
    }

    /// Create a closed archive whose reader matches the container format of `path`
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(reader_for_path(path.as_ref())?))
    }

    /// Open the container at `path` and scan it for recorded games.
    ///
    /// Any previously open container is closed first and the cached stats
    /// are cleared, whatever the outcome.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.close();
        self.stats.clear();

        self.reader.open(path)?;
        self.is_open = true;

        match self.scan() {
            Ok(stats) => {
                debug!(
                    path = %path.display(),
                    recorded_games = stats.len(),
                    "opened archive"
                );
                self.stats = stats;
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to scan archive");
                self.close();
                Err(e)
            }
        }
    }

    /// Close the active container. Does nothing if none is open.
    ///
    /// The cached stats stay readable after closing.
    pub fn close(&mut self) {
        if self.is_open {
            self.reader.close();
            self.is_open = false;
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Get a stream over the entry named `name`.
    ///
    /// Any entry in the container can be read, not only recorded games.
    pub fn get_file_handler(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        self.ensure_open()?;
        self.reader.get_stream(name)
    }

    /// Returns the contents of the entry named `name`
    pub fn get_file_contents(&mut self, name: &str) -> Result<Bytes> {
        self.ensure_open()?;
        self.reader.get_from_name(name)
    }

    /// Recorded-game entries from the last successful open
    pub fn get_stats(&self) -> &[EntryMetadata] {
        &self.stats
    }

    /// Look up a recorded-game entry by name in the cached stats
    pub fn stat(&self, name: &str) -> Option<&EntryMetadata> {
        self.stats.iter().find(|entry| entry.name == name)
    }

    pub fn extensions(&self) -> &RecognizedExtensions {
        &self.extensions
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open {
            Ok(())
        } else {
            Err(ArchiveError::NotOpen)
        }
    }

    /// Walk every entry and keep the non-empty ones with a recognized extension
    fn scan(&mut self) -> Result<Vec<EntryMetadata>> {
        self.ensure_open()?;

        let mut stats = Vec::new();
        let mut index = 0;
        while let Some(entry) = self.reader.stat_index(index)? {
            index += 1;

            // skip directories and 0-byte files
            if entry.size == 0 {
                trace!(name = %entry.name, "skipping empty entry");
                continue;
            }

            if !self.extensions.matches(&entry.name) {
                trace!(name = %entry.name, "skipping unrecognized entry");
                continue;
            }

            stats.push(entry);
        }

        debug!(scanned = index, kept = stats.len(), "scanned archive entries");
        Ok(stats)
    }
}

impl Drop for Archive {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Observable state of a [`MockReader`], shared with the test
    #[derive(Default)]
    struct MockState {
        open_calls: Vec<PathBuf>,
        close_calls: usize,
    }

    /// In-memory reader serving fixed containers keyed by path
    struct MockReader {
        containers: HashMap<PathBuf, Vec<(EntryMetadata, Vec<u8>)>>,
        /// Index at which `stat_index` fails, to simulate a corrupt directory
        fail_at: Option<usize>,
        current: Option<PathBuf>,
        state: Arc<Mutex<MockState>>,
    }

    impl MockReader {
        fn new(state: Arc<Mutex<MockState>>) -> Self {
            MockReader {
                containers: HashMap::new(),
                fail_at: None,
                current: None,
                state,
            }
        }

        fn with_container(mut self, path: &str, entries: &[(&str, u64)]) -> Self {
            let entries = entries
                .iter()
                .enumerate()
                .map(|(i, (name, size))| {
                    let data = if name.ends_with('/') {
                        Vec::new()
                    } else {
                        vec![b'x'; *size as usize]
                    };
                    (EntryMetadata::new(i, *name, *size), data)
                })
                .collect();
            self.containers.insert(PathBuf::from(path), entries);
            self
        }

        fn entries(&self) -> Result<&Vec<(EntryMetadata, Vec<u8>)>> {
            let path = self.current.as_ref().ok_or(ArchiveError::NotOpen)?;
            Ok(&self.containers[path])
        }

        fn find(&self, name: &str) -> Result<&[u8]> {
            self.entries()?
                .iter()
                .find(|(meta, _)| meta.name == name)
                .map(|(_, data)| data.as_slice())
                .ok_or_else(|| ArchiveError::EntryNotFound(name.to_string()))
        }
    }

    impl ArchiveReader for MockReader {
        fn open(&mut self, path: &Path) -> Result<()> {
            self.state.lock().unwrap().open_calls.push(path.to_path_buf());
            if !self.containers.contains_key(path) {
                return Err(ArchiveError::open(path, "no such file"));
            }
            self.current = Some(path.to_path_buf());
            Ok(())
        }

        fn close(&mut self) {
            if self.current.take().is_some() {
                self.state.lock().unwrap().close_calls += 1;
            }
        }

        fn is_open(&self) -> bool {
            self.current.is_some()
        }

        fn stat_index(&mut self, index: usize) -> Result<Option<EntryMetadata>> {
            if self.fail_at == Some(index) {
                return Err(ArchiveError::Corrupt("bad central directory record".into()));
            }
            Ok(self.entries()?.get(index).map(|(meta, _)| meta.clone()))
        }

        fn get_from_name(&mut self, name: &str) -> Result<Bytes> {
            Ok(Bytes::copy_from_slice(self.find(name)?))
        }

        fn get_stream(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
            Ok(Box::new(Cursor::new(self.find(name)?)))
        }
    }

    fn mixed_archive() -> (Archive, Arc<Mutex<MockState>>) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let reader = MockReader::new(Arc::clone(&state))
            .with_container(
                "recs.zip",
                &[("game1.mgx", 500), ("readme.txt", 10), ("folder/", 0)],
            )
            .with_container(
                "other.zip",
                &[("b.mgz", 7), ("empty.mgl", 0), ("a.MGL", 3), ("c.mgx2", 9)],
            );
        (Archive::new(Box::new(reader)), state)
    }

    #[test]
    fn test_scan_keeps_only_recorded_games() {
        let (mut archive, _) = mixed_archive();
        archive.open("recs.zip").unwrap();

        let stats = archive.get_stats();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, "game1.mgx");
        assert_eq!(stats[0].size, 500);
    }

    #[test]
    fn test_scan_preserves_archive_order() {
        let (mut archive, _) = mixed_archive();
        archive.open("other.zip").unwrap();

        let names: Vec<&str> = archive.get_stats().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b.mgz", "a.MGL", "c.mgx2"]);
        assert!(archive.get_stats().iter().all(|e| e.size > 0));
    }

    #[test]
    fn test_open_missing_leaves_archive_closed() {
        let (mut archive, _) = mixed_archive();
        let err = archive.open("missing.zip").unwrap_err();

        assert!(matches!(err, ArchiveError::Open { .. }));
        assert!(!archive.is_open());
        assert!(archive.get_stats().is_empty());
    }

    #[test]
    fn test_failed_open_clears_previous_stats() {
        let (mut archive, _) = mixed_archive();
        archive.open("recs.zip").unwrap();
        assert!(archive.open("missing.zip").is_err());

        assert!(!archive.is_open());
        assert!(archive.get_stats().is_empty());
    }

    #[test]
    fn test_reopen_replaces_stats_and_closes_previous() {
        let (mut archive, state) = mixed_archive();
        archive.open("recs.zip").unwrap();
        archive.open("other.zip").unwrap();

        assert!(archive.stat("game1.mgx").is_none());
        assert_eq!(archive.get_stats().len(), 3);

        let state = state.lock().unwrap();
        assert_eq!(state.open_calls.len(), 2);
        assert_eq!(state.close_calls, 1);
    }

    #[test]
    fn test_close_is_idempotent_and_keeps_stats() {
        let (mut archive, state) = mixed_archive();
        archive.close();
        archive.open("recs.zip").unwrap();
        archive.close();
        archive.close();

        assert!(!archive.is_open());
        assert_eq!(archive.get_stats().len(), 1);
        assert_eq!(state.lock().unwrap().close_calls, 1);
    }

    #[test]
    fn test_access_after_close_fails() {
        let (mut archive, _) = mixed_archive();
        archive.open("recs.zip").unwrap();
        archive.close();

        assert!(matches!(archive.get_file_contents("game1.mgx"), Err(ArchiveError::NotOpen)));
        assert!(matches!(archive.get_file_handler("game1.mgx"), Err(ArchiveError::NotOpen)));
    }

    #[test]
    fn test_access_before_open_fails() {
        let (mut archive, _) = mixed_archive();
        assert!(matches!(archive.get_file_contents("anything"), Err(ArchiveError::NotOpen)));
        assert!(archive.get_stats().is_empty());
    }

    #[test]
    fn test_lookup_passes_through_to_reader() {
        let (mut archive, _) = mixed_archive();
        archive.open("recs.zip").unwrap();

        // filtered out of stats but still readable
        assert_eq!(archive.get_file_contents("readme.txt").unwrap().len(), 10);

        let mut data = Vec::new();
        archive
            .get_file_handler("game1.mgx")
            .unwrap()
            .read_to_end(&mut data)
            .unwrap();
        assert_eq!(data.len(), 500);
    }

    #[test]
    fn test_contents_and_handler_agree_on_existence() {
        let (mut archive, _) = mixed_archive();
        archive.open("recs.zip").unwrap();

        for name in ["game1.mgx", "readme.txt", "folder/", "nope.mgx"] {
            let contents = archive.get_file_contents(name).map(|_| ());
            let handler = archive.get_file_handler(name).map(|_| ());
            assert_eq!(contents.is_ok(), handler.is_ok(), "disagree on {name}");
            if let Err(e) = contents {
                assert!(e.is_not_found());
            }
        }
    }

    #[test]
    fn test_scan_failure_leaves_no_partial_stats() {
        let state = Arc::new(Mutex::new(MockState::default()));
        let mut reader = MockReader::new(Arc::clone(&state))
            .with_container("bad.zip", &[("a.mgx", 5), ("b.mgx", 6), ("c.mgx", 7)]);
        reader.fail_at = Some(2);

        let mut archive = Archive::new(Box::new(reader));
        let err = archive.open("bad.zip").unwrap_err();

        assert!(matches!(err, ArchiveError::Corrupt(_)));
        assert!(!archive.is_open());
        assert!(archive.get_stats().is_empty());
        assert_eq!(state.lock().unwrap().close_calls, 1);
    }

    #[test]
    fn test_custom_extensions() {
        let state = Arc::new(Mutex::new(MockState::default()));
        let reader = MockReader::new(state).with_container(
            "recs.zip",
            &[("game1.mgx", 500), ("game2.aoe2record", 800)],
        );
        let mut archive =
            Archive::with_extensions(Box::new(reader), RecognizedExtensions::parse_list("aoe2record"));
        archive.open("recs.zip").unwrap();

        assert_eq!(archive.get_stats().len(), 1);
        assert_eq!(archive.get_stats()[0].name, "game2.aoe2record");
        assert!(archive.extensions().contains("aoe2record"));
    }

    #[test]
    fn test_drop_closes_reader() {
        let (mut archive, state) = mixed_archive();
        archive.open("recs.zip").unwrap();
        drop(archive);
        assert_eq!(state.lock().unwrap().close_calls, 1);
    }
}
