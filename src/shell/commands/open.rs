use anyhow::{Result, anyhow};
use colored::*;
use std::path::Path;

use super::{Command, ShellState};
use crate::ui::create_spinner;

pub struct OpenCommand;

impl Command for OpenCommand {
    fn name(&self) -> &str {
        "open"
    }

    fn usage(&self) -> &str {
        "open ARCHIVE - Open a zip or tar archive"
    }

    fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let [path] = args else {
            return Err(anyhow!("Usage: {}", self.usage()));
        };
        let path = Path::new(path);

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let spinner = create_spinner(&format!("Scanning {filename}..."));
        let result = state.open_archive(path);
        spinner.finish_and_clear();
        result?;

        let count = state.archive().map(|a| a.get_stats().len()).unwrap_or(0);
        println!(
            "Opened {} ({} recorded game{})",
            filename.bold(),
            count,
            if count == 1 { "" } else { "s" }
        );
        Ok(())
    }
}

pub struct CloseCommand;

impl Command for CloseCommand {
    fn name(&self) -> &str {
        "close"
    }

    fn usage(&self) -> &str {
        "close - Close the current archive"
    }

    fn execute(&self, state: &mut ShellState, _args: &[String]) -> Result<()> {
        if !state.close_archive() {
            eprintln!("{} no archive is open", "Note:".yellow());
        }
        Ok(())
    }
}
