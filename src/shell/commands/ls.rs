use anyhow::{Result, anyhow};
use colored::*;
use serde_json::Value;

use super::output::print_line;
use super::{Command, ShellState};
use crate::archive::EntryMetadata;

/// How a listing of recorded games is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Short,
    Long,
    Json,
}

pub struct LsCommand;

impl Command for LsCommand {
    fn name(&self) -> &str {
        "ls"
    }

    fn usage(&self) -> &str {
        "ls [-l|--json] - List recorded games"
    }

    fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let mut format = ListFormat::Short;
        for arg in args {
            match arg.as_str() {
                "-l" => format = ListFormat::Long,
                "--json" => format = ListFormat::Json,
                _ => return Err(anyhow!("Usage: {}", self.usage())),
            }
        }

        // The listing is a snapshot and stays available after `close`
        let archive = state
            .archive()
            .ok_or_else(|| anyhow!("No archive has been opened"))?;
        if !archive.is_open() {
            eprintln!("{} archive is closed, showing last listing", "Note:".yellow());
        }

        print_stats(archive.get_stats(), format)
    }
}

/// Print recorded-game entries to stdout
pub fn print_stats(stats: &[EntryMetadata], format: ListFormat) -> Result<()> {
    match format {
        ListFormat::Json => {
            let entries = Value::Array(stats.iter().map(EntryMetadata::to_json).collect());
            print_line!("{}", serde_json::to_string_pretty(&entries)?);
        }
        ListFormat::Long => {
            for entry in stats {
                let (size, modified) = long_columns(entry);
                print_line!("{:>10}  {:<16}  {}", size, modified, entry.name.green());
            }
            let total: u64 = stats.iter().map(|e| e.size).sum();
            print_line!(
                "{} recorded game{}, {}",
                stats.len(),
                if stats.len() == 1 { "" } else { "s" },
                humansize::format_size(total, humansize::BINARY)
            );
        }
        ListFormat::Short => {
            for entry in stats {
                print_line!("{}", entry.name.green());
            }
        }
    }
    Ok(())
}

/// Size and modification time columns of a long listing
fn long_columns(entry: &EntryMetadata) -> (String, String) {
    let size = humansize::format_size(entry.size, humansize::BINARY);
    let modified = entry
        .modified
        .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    (size, modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_long_columns() {
        let mut entry = EntryMetadata::new(0, "game1.mgx", 2048);
        entry.modified = NaiveDate::from_ymd_opt(2010, 6, 1).and_then(|d| d.and_hms_opt(9, 5, 0));

        let (size, modified) = long_columns(&entry);
        assert_eq!(size, "2 KiB");
        assert_eq!(modified, "2010-06-01 09:05");
    }

    #[test]
    fn test_long_columns_without_time() {
        let entry = EntryMetadata::new(0, "game1.mgx", 500);
        let (size, modified) = long_columns(&entry);
        assert_eq!(size, "500 B");
        assert_eq!(modified, "-");
    }

    #[test]
    fn test_ls_without_archive() {
        let mut state = ShellState::new(Default::default());
        let err = LsCommand.execute(&mut state, &[]).unwrap_err();
        assert!(err.to_string().contains("No archive"));
    }

    #[test]
    fn test_ls_rejects_unknown_flag() {
        let mut state = ShellState::new(Default::default());
        let err = LsCommand
            .execute(&mut state, &["-x".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("Usage"));
    }
}
