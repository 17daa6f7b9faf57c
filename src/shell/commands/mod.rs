use anyhow::Result;

pub mod cat;
pub mod ls;
pub mod open;
pub mod output;

use super::ShellState;

/// Trait for shell commands
pub trait Command: Send + Sync {
    /// Get the command name
    fn name(&self) -> &str;

    /// Get command usage help
    fn usage(&self) -> &str;

    /// Execute the command
    fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()>;
}
