//! Built-in help command listing every registered command

use serde::Serialize;

use crate::command::{Command, Invocation};
use crate::error::Result;
use crate::tree::CommandTree;
use crate::value::Value;

/// One listed command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpEntry {
    pub name: String,
    pub usage: String,
    pub summary: String,
}

/// Displays a list of available commands
pub struct HelpCommand;

impl HelpCommand {
    pub const NAME: &'static str = "help";

    /// Help entries for every command of the tree, in listing order
    pub fn entries(tree: &CommandTree) -> Vec<HelpEntry> {
        tree.command_paths()
            .into_iter()
            .map(|(name, command)| HelpEntry {
                name,
                usage: command.usage(),
                summary: command.summary().to_string(),
            })
            .collect()
    }

    /// The `help` command itself
    pub fn command() -> Command {
        Command::new(Self::NAME)
            .with_summary("Displays a list of available commands")
            .with_executor(Self::execute)
    }

    fn execute(invocation: &Invocation<'_>) -> Result<Option<Value>> {
        let lines = Self::entries(invocation.tree())
            .into_iter()
            .map(|entry| {
                let line = if entry.summary.is_empty() {
                    entry.usage
                } else {
                    format!("{} - {}", entry.usage, entry.summary)
                };
                Value::String(line)
            })
            .collect();
        Ok(Some(Value::List(lines)))
    }
}
