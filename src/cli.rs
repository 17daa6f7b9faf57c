use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RecognizedExtensions;

#[derive(Parser, Debug)]
#[command(name = "recarchive")]
#[command(version)]
#[command(about = "Inspect archives of recorded games", long_about = None)]
#[command(after_help = "Examples:\n  \
  recarchive ls -l tournament.zip            list recorded games with sizes\n  \
  recarchive ls --json recs.tar.gz           dump entry metadata as JSON\n  \
  recarchive cat recs.zip final.mgz -o f.mgz extract one recorded game\n  \
  recarchive shell recs.zip                  browse interactively")]
pub struct Cli {
    /// Recorded-game extensions, comma separated (default: mgl,mgx,mgx2,mgz)
    #[arg(long, global = true, value_name = "EXTS")]
    pub ext: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the recorded games in an archive
    Ls {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Long listing with size and modification time
        #[arg(short = 'l')]
        long: bool,

        /// Print entry metadata as a JSON array
        #[arg(long, conflicts_with = "long")]
        json: bool,
    },

    /// Write the raw contents of one entry to stdout or a file
    Cat {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Entry name inside the archive
        #[arg(value_name = "ENTRY")]
        entry: String,

        /// Write to FILE instead of stdout
        #[arg(short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Start the interactive shell (the default)
    Shell {
        /// Archive to open on startup
        #[arg(value_name = "ARCHIVE")]
        archive: Option<PathBuf>,
    },
}

impl Cli {
    /// The extension set from `--ext`, else from the environment
    pub fn extensions(&self) -> RecognizedExtensions {
        match self.ext.as_deref().map(RecognizedExtensions::parse_list) {
            Some(exts) if !exts.is_empty() => exts,
            _ => RecognizedExtensions::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ls() {
        let cli = Cli::parse_from(["recarchive", "ls", "-l", "recs.zip"]);
        match cli.command {
            Some(Commands::Ls { archive, long, json }) => {
                assert_eq!(archive, PathBuf::from("recs.zip"));
                assert!(long);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_cat_with_output() {
        let cli = Cli::parse_from(["recarchive", "cat", "recs.zip", "a/game.mgz", "-o", "out.mgz"]);
        match cli.command {
            Some(Commands::Cat { entry, output, .. }) => {
                assert_eq!(entry, "a/game.mgz");
                assert_eq!(output, Some(PathBuf::from("out.mgz")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ext_flag_overrides() {
        let cli = Cli::parse_from(["recarchive", "--ext", "aoe2record,MGZ", "ls", "recs.zip"]);
        let exts = cli.extensions();
        assert!(exts.contains("aoe2record"));
        assert!(exts.contains("mgz"));
        assert!(!exts.contains("mgx"));
    }

    #[test]
    fn test_long_and_json_conflict() {
        assert!(Cli::try_parse_from(["recarchive", "ls", "-l", "--json", "recs.zip"]).is_err());
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::parse_from(["recarchive"]);
        assert!(cli.command.is_none());
    }
}
