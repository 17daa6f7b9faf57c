use anyhow::{Result, anyhow};

use super::output::print_line;
use super::{Command, ShellState};

/// Number of bytes shown when an entry is binary
const HEX_PREVIEW_LEN: usize = 1024;

pub struct CatCommand;

impl Command for CatCommand {
    fn name(&self) -> &str {
        "cat"
    }

    fn usage(&self) -> &str {
        "cat ENTRY - Display entry contents"
    }

    fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let [name] = args else {
            return Err(anyhow!("Usage: {}", self.usage()));
        };

        let bytes = state.open_archive_mut()?.get_file_contents(name)?;

        // Recorded games are binary; anything else that is valid UTF-8 prints as text
        match std::str::from_utf8(&bytes) {
            Ok(text) => print_line!("{text}"),
            Err(_) => {
                for line in hex_dump(&bytes[..bytes.len().min(HEX_PREVIEW_LEN)]) {
                    print_line!("{line}");
                }
                if bytes.len() > HEX_PREVIEW_LEN {
                    eprintln!("... ({} more bytes)", bytes.len() - HEX_PREVIEW_LEN);
                }
            }
        }

        Ok(())
    }
}

/// Format bytes as offset-prefixed rows of 16 hex octets
fn hex_dump(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(row, chunk)| {
            let octets: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
            format!("{:08x}: {}", row * 16, octets.join(" "))
        })
        .collect()
}
