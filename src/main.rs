use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use recarchive::cli::{Cli, Commands};
use recarchive::shell::commands::Command;
use recarchive::shell::commands::ls::{ListFormat, print_stats};
use recarchive::shell::commands::open::OpenCommand;
use recarchive::shell::commands::output::copy_to_stdout;
use recarchive::shell::{ShellCompleter, ShellState};
use recarchive::{Archive, RecognizedExtensions};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    // Logs go to stderr so they never mix with entry contents on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let extensions = cli.extensions();

    match cli.command {
        Some(Commands::Ls {
            archive,
            long,
            json,
        }) => {
            let format = if json {
                ListFormat::Json
            } else if long {
                ListFormat::Long
            } else {
                ListFormat::Short
            };
            list(&archive, extensions, format)
        }
        Some(Commands::Cat {
            archive,
            entry,
            output,
        }) => cat(&archive, extensions, &entry, output.as_deref()),
        Some(Commands::Shell { archive }) => run_shell(extensions, archive),
        None => run_shell(extensions, None),
    }
}

fn open(path: &Path, extensions: RecognizedExtensions) -> Result<Archive> {
    let reader = recarchive::archive::reader_for_path(path)?;
    let mut archive = Archive::with_extensions(reader, extensions);
    archive
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(archive)
}

fn list(path: &Path, extensions: RecognizedExtensions, format: ListFormat) -> Result<()> {
    let mut archive = open(path, extensions)?;
    print_stats(archive.get_stats(), format)?;
    archive.close();
    Ok(())
}

fn cat(
    path: &Path,
    extensions: RecognizedExtensions,
    entry: &str,
    output: Option<&Path>,
) -> Result<()> {
    let mut archive = open(path, extensions)?;
    let mut reader = archive
        .get_file_handler(entry)
        .with_context(|| format!("Failed to read {entry}"))?;

    match output {
        Some(out) => {
            let mut file = std::fs::File::create(out)
                .with_context(|| format!("Failed to create {}", out.display()))?;
            let written = std::io::copy(&mut reader, &mut file)?;
            tracing::info!(entry, bytes = written, output = %out.display(), "extracted entry");
        }
        None => {
            copy_to_stdout(&mut reader)?;
        }
    }

    drop(reader);
    archive.close();
    Ok(())
}

fn run_shell(extensions: RecognizedExtensions, initial: Option<PathBuf>) -> Result<()> {
    // Print welcome message
    println!("{}", "=".repeat(60).cyan());
    println!("{}", "  recarchive - recorded game archive shell".bold().cyan());
    println!("{}", "=".repeat(60).cyan());
    println!();
    println!("Type 'help' for available commands or 'exit' to quit");
    println!();

    let mut state = ShellState::new(extensions);

    if let Some(path) = initial {
        let args = [path.to_string_lossy().into_owned()];
        if let Err(e) = OpenCommand.execute(&mut state, &args) {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
    }

    // Create readline editor with tab completion
    let completer = ShellCompleter::new(state.completion_cache().clone());
    let mut rl = Editor::new()?;
    rl.set_helper(Some(completer));

    // Load history if available
    let history_file = dirs::home_dir().map(|mut p| {
        p.push(".recarchive_history");
        p
    });

    if let Some(path) = &history_file {
        let _ = rl.load_history(path);
    }

    // REPL loop
    loop {
        let prompt = state.prompt();

        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                match state.execute(&line) {
                    Ok(_) => {}
                    Err(e) => {
                        if e.to_string() == "exit" {
                            break;
                        }
                        eprintln!("{} {:#}", "Error:".red().bold(), e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("exit");
                break;
            }
            Err(err) => {
                eprintln!("{} {:?}", "Error:".red().bold(), err);
                break;
            }
        }
    }

    // Save history
    if let Some(path) = &history_file {
        let _ = rl.save_history(path);
    }

    state.close_archive();
    println!("Goodbye!");
    Ok(())
}
