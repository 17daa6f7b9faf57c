//! Configuration for which archive entries count as recorded games.

use std::collections::BTreeSet;

/// Environment variable holding a comma-separated extension list
pub const EXTENSIONS_ENV: &str = "RECARCHIVE_EXTENSIONS";

/// Age of Kings recorded game
pub const MGL_EXT: &str = "mgl";
/// Age of Conquerors recorded game
pub const MGX_EXT: &str = "mgx";
/// HD Edition / UserPatch variant of the AoC format
pub const MGX2_EXT: &str = "mgx2";
/// UserPatch 1.4+ recorded game
pub const MGZ_EXT: &str = "mgz";

/// The set of file-name extensions treated as recorded games.
///
/// Stored lowercase without a leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedExtensions {
    extensions: BTreeSet<String>,
}

impl RecognizedExtensions {
    /// Build a set from arbitrary extension strings (`"MGX"`, `".mgz"`, ...)
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .filter_map(|ext| normalize(ext.as_ref()))
            .collect();
        RecognizedExtensions { extensions }
    }

    /// Parse a comma-separated list such as `"mgx, .mgz,MGL"`
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Read the set from `RECARCHIVE_EXTENSIONS`, falling back to the default
    /// recorded-game formats when the variable is unset or yields nothing.
    pub fn from_env() -> Self {
        match std::env::var(EXTENSIONS_ENV) {
            Ok(value) => {
                let parsed = Self::parse_list(&value);
                if parsed.is_empty() {
                    Self::default()
                } else {
                    parsed
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Whether an extension (as returned by [`crate::path::extension`]) is recognized
    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// Whether an entry name ends in a recognized extension
    pub fn matches(&self, name: &str) -> bool {
        crate::path::extension(name).is_some_and(|ext| self.contains(&ext))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for RecognizedExtensions {
    fn default() -> Self {
        Self::new([MGL_EXT, MGX_EXT, MGX2_EXT, MGZ_EXT])
    }
}

impl std::fmt::Display for RecognizedExtensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let list: Vec<&str> = self.iter().collect();
        write!(f, "{}", list.join(","))
    }
}

fn normalize(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}
