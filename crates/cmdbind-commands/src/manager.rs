use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::binder::{ArgumentBinder, RawArguments};
use crate::command::{Command, Invocation};
use crate::config::EngineConfig;
use crate::error::{CommandError, ConfigError, RegistryError, Result};
use crate::help::HelpCommand;
use crate::parameter_type::ParameterTypes;
use crate::response::{CommandResponse, MessageReceiver};
use crate::sender::{CommandSender, SenderAdapters, SenderGate};
use crate::tree::CommandTree;

/// High-level command manager for registering, dispatching and executing commands
pub struct CommandManager {
    config: EngineConfig,
    tree: CommandTree,
    types: ParameterTypes,
    adapters: SenderAdapters,
    listeners: Vec<Arc<dyn MessageReceiver>>,
}

impl CommandManager {
    /// Create a new command manager
    pub fn new(config: EngineConfig) -> Self {
        let mut tree = CommandTree::new(config.separator.clone(), config.case_insensitive);
        if config.register_help {
            if let Err(e) = tree.add_command(HelpCommand::command()) {
                warn!(error = %e, "Could not register help command");
            }
        }

        Self {
            config,
            tree,
            types: ParameterTypes::with_builtins(),
            adapters: SenderAdapters::new(),
            listeners: Vec::new(),
        }
    }

    /// Create a command manager from a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(EngineConfig::load_from_file(path)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// Parameter types available when declaring parameters
    pub fn types(&self) -> &ParameterTypes {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut ParameterTypes {
        &mut self.types
    }

    pub fn adapters(&self) -> &SenderAdapters {
        &self.adapters
    }

    /// Register a conversion between sender types used by the gate
    pub fn register_adapter<F>(
        &mut self,
        source: &str,
        target: &str,
        adapter: F,
    ) -> std::result::Result<(), RegistryError>
    where
        F: Fn(&Arc<dyn CommandSender>) -> Option<Arc<dyn CommandSender>> + Send + Sync + 'static,
    {
        self.adapters.register_adapter(source, target, adapter)
    }

    /// Receive every rendered response, and echoed input when enabled
    pub fn add_output_listener(&mut self, listener: Arc<dyn MessageReceiver>) {
        self.listeners.push(listener);
    }

    pub fn register_command(&mut self, command: Command) -> std::result::Result<(), RegistryError> {
        self.tree.add_command(command)
    }

    pub fn get_command(&self, path: &str) -> Option<Arc<Command>> {
        self.tree.get_command(path)
    }

    /// Every registered command in listing order
    pub fn list_commands(&self) -> Vec<Arc<Command>> {
        self.tree.commands()
    }

    /// Resolve, gate and bind an invocation without running it
    ///
    /// Path segments left over after the deepest matching command become the
    /// leading positional tokens. The sender is checked before any argument is
    /// bound.
    pub fn dispatch(
        &self,
        sender: &Arc<dyn CommandSender>,
        path: &str,
        raw: &RawArguments,
    ) -> Result<Invocation<'_>> {
        let segments = self.segments(path);
        let resolved = self
            .tree
            .resolve(&segments)
            .map_err(|e| self.reject(sender, path, e))?;
        let command = resolved.command;

        let narrowed = SenderGate::new(&self.adapters)
            .check(command.senders(), command.permission(), sender)
            .map_err(|e| self.reject(sender, path, e))?;

        let mut arguments = raw.clone();
        arguments.positional = segments[resolved.consumed..]
            .iter()
            .map(|s| s.to_string())
            .chain(raw.positional.iter().cloned())
            .collect();

        let bindings = ArgumentBinder::bind(command.parameters(), &arguments)
            .map_err(|e| self.reject(sender, path, e))?;

        debug!(command = command.name(), sender = sender.name(), "Dispatched command");
        Ok(Invocation {
            command,
            sender: narrowed,
            bindings,
            tree: &self.tree,
        })
    }

    /// Dispatch and run a command, delivering the rendered response to the
    /// sender and every output listener
    pub fn execute(
        &self,
        sender: &Arc<dyn CommandSender>,
        path: &str,
        raw: &RawArguments,
    ) -> CommandResponse {
        if self.config.echo_input {
            let line = std::iter::once(path)
                .chain(raw.positional.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            self.notify(&format!("{}: {}", sender.name(), line));
        }

        let result = self
            .dispatch(sender, path, raw)
            .and_then(|invocation| invocation.command.executor().execute(&invocation));
        let response = CommandResponse::from(result);

        if let Some(text) = response.render(self.config.response_format) {
            sender.send_message(&text);
            self.notify(&text);
        }
        response
    }

    /// Suggestions for the next word after `path` and `raw`
    ///
    /// Unresolvable paths produce no suggestions.
    pub fn complete(&self, path: &str, raw: &RawArguments) -> BTreeSet<String> {
        let segments = self.segments(path);
        let Ok(resolved) = self.tree.resolve(&segments) else {
            return BTreeSet::new();
        };

        let named: HashSet<String> = raw.named.keys().cloned().collect();
        let flags: HashSet<char> = raw.flags.iter().copied().collect();
        let positional = segments.len() - resolved.consumed + raw.positional.len();

        resolved.command.completion_suggestions(
            &named,
            &flags,
            positional,
            self.config.complete_flags,
        )
    }

    /// Raw path segments; leftover segments keep their case as arguments
    fn segments<'p>(&self, path: &'p str) -> Vec<&'p str> {
        path.split(self.tree.separator())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn reject(
        &self,
        sender: &Arc<dyn CommandSender>,
        path: &str,
        error: CommandError,
    ) -> CommandError {
        warn!(
            sender = sender.name(),
            path,
            code = %error.code(),
            "Rejected command: {}",
            error
        );
        error
    }

    fn notify(&self, message: &str) {
        for listener in &self.listeners {
            listener.send_message(message);
        }
    }
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
