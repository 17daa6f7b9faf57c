use rustyline::Context;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use std::sync::{Arc, RwLock};

/// Completion candidates shared between the shell state and the line editor
#[derive(Clone)]
pub struct CompletionCache {
    /// Recorded-game entry names of the current archive
    entries: Arc<RwLock<Vec<String>>>,
    /// Available commands
    commands: Vec<String>,
}

impl CompletionCache {
    pub fn new() -> Self {
        CompletionCache {
            entries: Arc::new(RwLock::new(Vec::new())),
            commands: ["open", "close", "ls", "cat", "help", "exit"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the cached entry names
    pub fn set_entries(&self, names: Vec<String>) {
        if let Ok(mut entries) = self.entries.write() {
            *entries = names;
        }
    }

    pub fn get_entries(&self) -> Vec<String> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Get available commands
    pub fn get_commands(&self) -> &[String] {
        &self.commands
    }
}

impl Default for CompletionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Tab completion helper for the shell
pub struct ShellCompleter {
    cache: CompletionCache,
    files: FilenameCompleter,
}

impl ShellCompleter {
    pub fn new(cache: CompletionCache) -> Self {
        ShellCompleter {
            cache,
            files: FilenameCompleter::new(),
        }
    }

    /// Complete a command at the start of the line
    fn complete_command(&self, prefix: &str) -> Vec<Pair> {
        self.cache
            .get_commands()
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect()
    }

    /// Complete an entry name of the current archive
    fn complete_entry(&self, prefix: &str) -> Vec<Pair> {
        self.cache
            .get_entries()
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| Pair {
                display: name.clone(),
                replacement: quote_if_needed(&name),
            })
            .collect()
    }
}

fn quote_if_needed(name: &str) -> String {
    if name.contains(char::is_whitespace) {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        // Split into words
        let words: Vec<&str> = line.split_whitespace().collect();

        if words.is_empty() {
            return Ok((0, Vec::new()));
        }

        // If we're on the first word, complete commands
        if words.len() == 1 && !line.ends_with(char::is_whitespace) {
            let start = line.len() - words[0].len();
            return Ok((start, self.complete_command(words[0])));
        }

        match words[0] {
            "open" => self.files.complete(line, pos, ctx),
            "cat" => {
                let prefix = if line.ends_with(char::is_whitespace) {
                    ""
                } else {
                    words.last().copied().unwrap_or("")
                };
                Ok((pos - prefix.len(), self.complete_entry(prefix)))
            }
            _ => Ok((pos, Vec::new())),
        }
    }
}

impl rustyline::Helper for ShellCompleter {}
impl rustyline::highlight::Highlighter for ShellCompleter {}
impl rustyline::hint::Hinter for ShellCompleter {
    type Hint = String;
}
impl rustyline::validate::Validator for ShellCompleter {}
