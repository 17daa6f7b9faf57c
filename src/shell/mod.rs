pub mod commands;
pub mod completion;

use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::{Archive, ArchiveType};
use crate::config::RecognizedExtensions;
use crate::error::ArchiveError;
use commands::Command;
pub use completion::{CompletionCache, ShellCompleter};

/// Shell state - the archive being inspected and the registered commands
pub struct ShellState {
    /// Current archive, kept after `close` so its listing stays available
    archive: Option<Archive>,
    archive_type: Option<ArchiveType>,
    archive_path: Option<PathBuf>,
    extensions: RecognizedExtensions,
    /// Tab completion cache
    completion_cache: CompletionCache,
    /// Registered commands
    commands: HashMap<String, Arc<dyn Command>>,
}

impl ShellState {
    /// Create a new shell state with all built-in commands
    pub fn new(extensions: RecognizedExtensions) -> Self {
        let mut state = ShellState {
            archive: None,
            archive_type: None,
            archive_path: None,
            extensions,
            completion_cache: CompletionCache::new(),
            commands: HashMap::new(),
        };

        // Register commands
        state.register_command(Arc::new(commands::open::OpenCommand));
        state.register_command(Arc::new(commands::open::CloseCommand));
        state.register_command(Arc::new(commands::ls::LsCommand));
        state.register_command(Arc::new(commands::cat::CatCommand));

        state
    }

    /// Register a command
    fn register_command(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Execute a command line
    pub fn execute(&mut self, line: &str) -> Result<()> {
        // Parse command line respecting quotes
        let parts = Self::parse_command_line(line.trim())?;

        if parts.is_empty() {
            return Ok(());
        }

        let cmd_name = &parts[0];
        let args = &parts[1..];

        // Check for built-in commands first
        match cmd_name.as_str() {
            "exit" | "quit" => {
                return Err(anyhow!("exit"));
            }
            "help" => {
                self.print_help();
                return Ok(());
            }
            _ => {}
        }

        // Look up command
        if let Some(command) = self.commands.get(cmd_name) {
            let cmd = Arc::clone(command);
            cmd.execute(self, args)
        } else {
            Err(anyhow!("Unknown command: {cmd_name}"))
        }
    }

    /// Open `path`, replacing the current archive.
    ///
    /// The existing [`Archive`] is reused when the container format is the
    /// same, otherwise a new one is built for the new format.
    pub fn open_archive(&mut self, path: &Path) -> Result<()> {
        let archive_type = ArchiveType::detect(path)?;

        if self.archive_type != Some(archive_type) {
            // dropping the old archive closes it
            self.archive = None;
        }
        let extensions = &self.extensions;
        let archive = self
            .archive
            .get_or_insert_with(|| Archive::with_extensions(archive_type.reader(), extensions.clone()));
        self.archive_type = Some(archive_type);

        let result = archive.open(path);
        self.archive_path = result.is_ok().then(|| path.to_path_buf());
        self.refresh_completions();
        result.with_context(|| format!("Failed to open {}", path.display()))
    }

    /// Close the current archive, keeping its listing
    pub fn close_archive(&mut self) -> bool {
        match self.archive.as_mut() {
            Some(archive) if archive.is_open() => {
                archive.close();
                true
            }
            _ => false,
        }
    }

    /// The current archive, open or not
    pub fn archive(&self) -> Option<&Archive> {
        self.archive.as_ref()
    }

    /// The current archive, failing unless one is open
    pub fn open_archive_mut(&mut self) -> Result<&mut Archive> {
        match self.archive.as_mut() {
            Some(archive) if archive.is_open() => Ok(archive),
            _ => Err(ArchiveError::NotOpen.into()),
        }
    }

    pub fn archive_path(&self) -> Option<&Path> {
        self.archive_path.as_deref()
    }

    pub fn extensions(&self) -> &RecognizedExtensions {
        &self.extensions
    }

    /// Get the completion cache
    pub fn completion_cache(&self) -> &CompletionCache {
        &self.completion_cache
    }

    fn refresh_completions(&self) {
        let names = self
            .archive
            .as_ref()
            .map(|a| a.get_stats().iter().map(|e| e.name.clone()).collect())
            .unwrap_or_default();
        self.completion_cache.set_entries(names);
    }

    /// Print help message
    fn print_help(&self) {
        println!("Available commands:");
        println!("  open ARCHIVE   - Open a zip or tar archive");
        println!("  close          - Close the current archive");
        println!("  ls [-l|--json] - List recorded games");
        println!("  cat ENTRY      - Display entry contents");
        println!("  help           - Show this help");
        println!("  exit/quit      - Exit the shell");
        println!();
        println!("Recognized extensions: {}", self.extensions);
    }

    /// Get the prompt string
    pub fn prompt(&self) -> String {
        let open = self.archive.as_ref().is_some_and(|a| a.is_open());
        match self.archive_path.as_deref().and_then(|p| p.file_name()) {
            Some(name) if open => format!("recarchive:{} $ ", name.to_string_lossy()),
            _ => "recarchive $ ".to_string(),
        }
    }

    /// Parse command line respecting quotes (both single and double)
    fn parse_command_line(line: &str) -> Result<Vec<String>> {
        let mut args = Vec::new();
        let mut current_arg = String::new();
        let mut in_single_quote = false;
        let mut in_double_quote = false;
        let mut escape_next = false;
        // distinguishes `""` (an empty argument) from no argument at all
        let mut has_arg = false;

        for ch in line.chars() {
            if escape_next {
                current_arg.push(ch);
                escape_next = false;
                continue;
            }

            match ch {
                '\\' if !in_single_quote => {
                    escape_next = true;
                    has_arg = true;
                }
                '\'' if !in_double_quote => {
                    in_single_quote = !in_single_quote;
                    has_arg = true;
                }
                '"' if !in_single_quote => {
                    in_double_quote = !in_double_quote;
                    has_arg = true;
                }
                ' ' | '\t' if !in_single_quote && !in_double_quote => {
                    if has_arg {
                        args.push(std::mem::take(&mut current_arg));
                        has_arg = false;
                    }
                }
                _ => {
                    current_arg.push(ch);
                    has_arg = true;
                }
            }
        }

        // Push the last argument
        if has_arg {
            args.push(current_arg);
        }

        // Check for unclosed quotes
        if in_single_quote {
            return Err(anyhow!("Unclosed single quote"));
        }
        if in_double_quote {
            return Err(anyhow!("Unclosed double quote"));
        }

        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_words() {
        let args = ShellState::parse_command_line("cat  game1.mgx").unwrap();
        assert_eq!(args, vec!["cat", "game1.mgx"]);
    }

    #[test]
    fn test_parse_quoted_names() {
        let args = ShellState::parse_command_line(r#"cat "final round.mgz" 'a b.mgx'"#).unwrap();
        assert_eq!(args, vec!["cat", "final round.mgz", "a b.mgx"]);
    }

    #[test]
    fn test_parse_escaped_space() {
        let args = ShellState::parse_command_line(r"open my\ recs.zip").unwrap();
        assert_eq!(args, vec!["open", "my recs.zip"]);
    }

    #[test]
    fn test_parse_empty_quoted_argument() {
        let args = ShellState::parse_command_line(r#"cat """#).unwrap();
        assert_eq!(args, vec!["cat", ""]);
    }

    #[test]
    fn test_parse_unclosed_quote() {
        assert!(ShellState::parse_command_line("cat \"oops").is_err());
        assert!(ShellState::parse_command_line("cat 'oops").is_err());
    }

    #[test]
    fn test_unknown_command() {
        let mut state = ShellState::new(RecognizedExtensions::default());
        let err = state.execute("frobnicate").unwrap_err();
        assert!(err.to_string().contains("Unknown command"));
    }

    #[test]
    fn test_exit_is_signalled() {
        let mut state = ShellState::new(RecognizedExtensions::default());
        assert_eq!(state.execute("quit").unwrap_err().to_string(), "exit");
        assert!(state.execute("   ").is_ok());
    }

    #[test]
    fn test_commands_require_open_archive() {
        let mut state = ShellState::new(RecognizedExtensions::default());
        assert!(state.execute("cat game1.mgx").is_err());
        assert!(!state.close_archive());
        assert_eq!(state.prompt(), "recarchive $ ");
    }

    #[test]
    fn test_open_rejects_unknown_format() {
        let mut state = ShellState::new(RecognizedExtensions::default());
        let err = state.open_archive(Path::new("recs.rar")).unwrap_err();
        assert!(err.to_string().contains("Unsupported archive format"));
        assert!(state.archive().is_none());
    }
}
