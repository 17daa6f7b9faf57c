//! # recarchive
//!
//! Open zip and tar archives and get at the recorded-game files inside them.
//!
//! An [`Archive`] scans its container once when opened and caches metadata
//! for every non-empty entry whose extension is a recognized recorded-game
//! format (`mgl`, `mgx`, `mgx2`, `mgz` by default). Entry contents are then
//! read by name, either fully materialized or as a stream.
//!
//! ## Example
//!
//! ```no_run
//! use recarchive::Archive;
//!
//! fn main() -> recarchive::Result<()> {
//!     let mut archive = Archive::for_path("tournament.zip")?;
//!     archive.open("tournament.zip")?;
//!
//!     for entry in archive.get_stats().to_vec() {
//!         let bytes = archive.get_file_contents(&entry.name)?;
//!         println!("{}: {} bytes", entry.name, bytes.len());
//!     }
//!
//!     archive.close();
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod path;
pub mod shell;
pub mod ui;

pub use archive::{Archive, ArchiveReader, ArchiveType, EntryMetadata};
pub use config::RecognizedExtensions;
pub use error::{ArchiveError, Result};
