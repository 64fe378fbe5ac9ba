//! Hierarchical command registry with deepest-match lookup

use std::sync::Arc;

use tracing::{debug, info};

use crate::command::Command;
use crate::error::{CommandError, RegistryError, Result};

#[derive(Debug)]
struct Node {
    name: String,
    aliases: Vec<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    command: Option<Arc<Command>>,
}

impl Node {
    fn new(name: String, parent: Option<usize>) -> Self {
        Self {
            name,
            aliases: Vec::new(),
            parent,
            children: Vec::new(),
            command: None,
        }
    }

    fn answers_to(&self, segment: &str) -> bool {
        self.name == segment || self.aliases.iter().any(|a| a == segment)
    }
}

/// A command found by [`CommandTree::resolve`]
#[derive(Debug, Clone)]
pub struct Resolved {
    pub command: Arc<Command>,
    /// Number of path segments that matched the command's path
    pub consumed: usize,
}

/// Tree of commands keyed by path segment
///
/// Nodes live in an arena; children are kept in insertion order so listing
/// is deterministic. The root has an empty name.
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<Node>,
    separator: String,
    case_insensitive: bool,
}

impl CommandTree {
    const ROOT: usize = 0;

    pub fn new(separator: impl Into<String>, case_insensitive: bool) -> Self {
        Self {
            nodes: vec![Node::new(String::new(), None)],
            separator: separator.into(),
            case_insensitive,
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Split a path into normalized segments
    pub fn split_path(&self, path: &str) -> Vec<String> {
        path.split(self.separator.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| self.normalize(s))
            .collect()
    }

    fn normalize(&self, segment: &str) -> String {
        if self.case_insensitive {
            segment.to_lowercase()
        } else {
            segment.to_string()
        }
    }

    fn child(&self, node: usize, segment: &str) -> Option<usize> {
        self.nodes[node]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].answers_to(segment))
    }

    /// Insert a command at the path formed by its name, creating group nodes
    pub fn add_command(&mut self, command: Command) -> std::result::Result<(), RegistryError> {
        let segments = self.split_path(command.name());
        if segments.is_empty() {
            return Err(RegistryError::InvalidCommandName(command.name().to_string()));
        }

        // Validate against existing nodes before creating any
        let (last, parents) = segments.split_at(segments.len() - 1);
        let parent = parents
            .iter()
            .try_fold(Self::ROOT, |node, segment| self.child(node, segment));
        let existing = parent.and_then(|p| self.child(p, &last[0]));

        if let Some(node) = existing {
            if self.nodes[node].command.is_some() {
                return Err(RegistryError::DuplicateCommand(command.name().to_string()));
            }
        }

        let aliases: Vec<String> = command.aliases().iter().map(|a| self.normalize(a)).collect();
        if let Some(parent) = parent {
            for alias in &aliases {
                if let Some(sibling) = self.child(parent, alias) {
                    if Some(sibling) != existing {
                        return Err(RegistryError::DuplicateCommand(alias.clone()));
                    }
                }
            }
        }

        let mut current = Self::ROOT;
        for segment in &segments {
            current = match self.child(current, segment) {
                Some(child) => child,
                None => {
                    let index = self.nodes.len();
                    self.nodes.push(Node::new(segment.clone(), Some(current)));
                    self.nodes[current].children.push(index);
                    index
                }
            };
        }

        info!(command = command.name(), "Registered command");
        let node = &mut self.nodes[current];
        node.aliases.extend(aliases);
        node.command = Some(Arc::new(command));
        Ok(())
    }

    /// Deepest command attached along `segments`
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Result<Resolved> {
        let mut current = Self::ROOT;
        let mut found: Option<Resolved> = None;

        for (depth, segment) in segments.iter().enumerate() {
            let segment = self.normalize(segment.as_ref());
            match self.child(current, &segment) {
                Some(child) => current = child,
                None => break,
            }
            if let Some(command) = &self.nodes[current].command {
                found = Some(Resolved {
                    command: Arc::clone(command),
                    consumed: depth + 1,
                });
            }
        }

        match found {
            Some(resolved) => {
                debug!(
                    command = resolved.command.name(),
                    leftover = segments.len() - resolved.consumed,
                    "Resolved command"
                );
                Ok(resolved)
            }
            None if current != Self::ROOT => {
                Err(CommandError::IncompleteCommand(Some(self.node_path(current))))
            }
            None => Err(CommandError::NotACommand(
                segments.first().map(|s| s.as_ref().to_string()),
            )),
        }
    }

    /// Deepest command attached along the path, if any
    pub fn get_command(&self, path: &str) -> Option<Arc<Command>> {
        self.resolve(&self.split_path(path))
            .ok()
            .map(|resolved| resolved.command)
    }

    /// Every attached command in pre-order
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.command_paths()
            .into_iter()
            .map(|(_, command)| command)
            .collect()
    }

    /// Every attached command in pre-order with its canonical path
    pub fn command_paths(&self) -> Vec<(String, Arc<Command>)> {
        let mut out = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if let Some(command) = &node.command {
                out.push((self.node_path(index), Arc::clone(command)));
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Path of a node following parent links up to the root
    fn node_path(&self, index: usize) -> String {
        let mut names = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            if i != Self::ROOT {
                names.push(self.nodes[i].name.as_str());
            }
            current = self.nodes[i].parent;
        }
        names.reverse();
        names.join(&self.separator)
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.command.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CommandTree {
    fn default() -> Self {
        Self::new(" ", true)
    }
}
