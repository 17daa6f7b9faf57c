/// An entry name inside an archive, split into `/`-separated segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPath {
    /// Path segments (e.g., ["recs", "2024", "game1.mgx"])
    segments: Vec<String>,
    /// Whether the raw name ended with a separator (directory entry)
    is_dir: bool,
}

impl EntryPath {
    /// Parse an entry name. Both `/` and `\` act as separators since
    /// some zip writers on Windows store backslashes.
    pub fn parse(name: &str) -> Self {
        let is_dir = name.ends_with('/') || name.ends_with('\\');
        let segments: Vec<String> = name
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != ".")
            .map(String::from)
            .collect();

        EntryPath { segments, is_dir }
    }

    /// Get the last segment (file name), `None` for directories
    pub fn file_name(&self) -> Option<&str> {
        if self.is_dir {
            return None;
        }
        self.segments.last().map(|s| s.as_str())
    }

    /// Lowercase extension of the file name: the text after its last dot.
    ///
    /// A name without a dot has no extension; a name ending in a dot has
    /// an empty one.
    pub fn extension(&self) -> Option<String> {
        let file_name = self.file_name()?;
        let dot = file_name.rfind('.')?;
        Some(file_name[dot + 1..].to_lowercase())
    }
}

/// Lowercase extension of an entry name
pub fn extension(name: &str) -> Option<String> {
    EntryPath::parse(name).extension()
}
