//! Command declarations, execution contract and completion

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::binder::Bindings;
use crate::error::{RegistryError, Result};
use crate::parameter::{CommandParameter, CommandParameterSet};
use crate::sender::{CommandSender, SenderConstraint};
use crate::tree::CommandTree;
use crate::value::Value;

/// A resolved, gated and bound command ready to run
pub struct Invocation<'a> {
    pub command: Arc<Command>,
    /// The sender, narrowed to a type the command accepts
    pub sender: Arc<dyn CommandSender>,
    pub bindings: Bindings,
    pub(crate) tree: &'a CommandTree,
}

impl<'a> Invocation<'a> {
    /// The tree the command was resolved from
    pub fn tree(&self) -> &'a CommandTree {
        self.tree
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("command", &self.command.name())
            .field("sender", &self.sender.name())
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Runs a command once its arguments are bound
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, invocation: &Invocation<'_>) -> Result<Option<Value>>;
}

struct FnExecutor<F>(F);

impl<F> CommandExecutor for FnExecutor<F>
where
    F: Fn(&Invocation<'_>) -> Result<Option<Value>> + Send + Sync,
{
    fn execute(&self, invocation: &Invocation<'_>) -> Result<Option<Value>> {
        (self.0)(invocation)
    }
}

struct NoopExecutor;

impl CommandExecutor for NoopExecutor {
    fn execute(&self, _invocation: &Invocation<'_>) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// An executable command addressed by a separator-delimited path
#[derive(Clone)]
pub struct Command {
    name: String,
    aliases: BTreeSet<String>,
    summary: String,
    description: String,
    parameters: CommandParameterSet,
    senders: SenderConstraint,
    permission: Option<String>,
    executor: Arc<dyn CommandExecutor>,
}

impl Command {
    /// Create a command that does nothing when executed
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: BTreeSet::new(),
            summary: String::new(),
            description: String::new(),
            parameters: CommandParameterSet::new(),
            senders: SenderConstraint::Any,
            permission: None,
            executor: Arc::new(NoopExecutor),
        }
    }

    /// Alternative name for the last path segment
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameters(mut self, parameters: CommandParameterSet) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(
        mut self,
        parameter: CommandParameter,
    ) -> std::result::Result<Self, RegistryError> {
        self.parameters.add(parameter)?;
        Ok(self)
    }

    pub fn with_senders(mut self, senders: SenderConstraint) -> Self {
        self.senders = senders;
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn with_executor<F>(mut self, executor: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.executor = Arc::new(FnExecutor(executor));
        self
    }

    pub fn with_executor_impl(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &BTreeSet<String> {
        &self.aliases
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &CommandParameterSet {
        &self.parameters
    }

    pub fn senders(&self) -> &SenderConstraint {
        &self.senders
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn executor(&self) -> &Arc<dyn CommandExecutor> {
        &self.executor
    }

    /// `name <required> [optional=default] <list...>`
    pub fn usage(&self) -> String {
        std::iter::once(self.name.clone())
            .chain(self.parameters.iter().map(CommandParameter::usage))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Suggestions for the next input word, given the named arguments and
    /// flags already supplied and how many positional arguments precede it
    pub fn completion_suggestions(
        &self,
        named: &HashSet<String>,
        flags: &HashSet<char>,
        positional: usize,
        include_flags: bool,
    ) -> BTreeSet<String> {
        let unused: Vec<&CommandParameter> = self
            .parameters
            .iter()
            .filter(|p| !named.contains(p.id()) && !p.flags().iter().any(|f| flags.contains(f)))
            .collect();

        // A collection parameter keeps absorbing positional words
        let mut skip = positional;
        let mut start = unused.len();
        for (index, param) in unused.iter().enumerate() {
            if skip == 0 || param.is_collection() {
                start = index;
                break;
            }
            skip -= 1;
        }
        let remaining = &unused[start..];

        let mut suggestions = BTreeSet::new();
        if let Some(next) = remaining.first() {
            suggestions.extend(next.suggestions());
        }
        if include_flags {
            for param in remaining {
                suggestions.extend(param.flag_aliases());
            }
        }
        suggestions
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("parameters", &self.parameters)
            .field("senders", &self.senders)
            .field("permission", &self.permission)
            .finish()
    }
}
