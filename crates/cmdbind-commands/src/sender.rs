//! Command senders, sender-type adapters and the sender/permission gate

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CommandError, RegistryError, Result};

/// Tag identifying a concrete kind of sender (`"console"`, `"player"`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SenderType(String);

impl SenderType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SenderType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whoever issued a command
pub trait CommandSender: Send + Sync {
    fn name(&self) -> &str;

    fn sender_type(&self) -> SenderType;

    fn send_message(&self, message: &str);

    fn has_permission(&self, _permission: &str) -> bool {
        true
    }

    /// Access to the concrete sender for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Sender that writes messages to standard output
#[derive(Debug, Clone)]
pub struct ConsoleSender {
    name: String,
    permissions: Option<BTreeSet<String>>,
}

impl ConsoleSender {
    pub const TYPE: &'static str = "console";

    /// A console sender holding every permission
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: None,
        }
    }

    /// Restrict the sender to the given permissions
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = Some(permissions.into_iter().map(Into::into).collect());
        self
    }
}

impl CommandSender for ConsoleSender {
    fn name(&self) -> &str {
        &self.name
    }

    fn sender_type(&self) -> SenderType {
        SenderType::new(Self::TYPE)
    }

    fn send_message(&self, message: &str) {
        println!("{}", message);
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .map_or(true, |granted| granted.contains(permission))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Which sender types a command accepts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SenderConstraint {
    #[default]
    Any,
    Required(SenderType),
    OneOf(BTreeSet<SenderType>),
}

impl SenderConstraint {
    pub fn one_of<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SenderType>,
    {
        SenderConstraint::OneOf(types.into_iter().map(Into::into).collect())
    }

    pub fn accepts(&self, sender_type: &SenderType) -> bool {
        match self {
            SenderConstraint::Any => true,
            SenderConstraint::Required(required) => required == sender_type,
            SenderConstraint::OneOf(types) => types.contains(sender_type),
        }
    }
}

type AdapterFn =
    Arc<dyn Fn(&Arc<dyn CommandSender>) -> Option<Arc<dyn CommandSender>> + Send + Sync>;

/// Registry of conversions from one sender type to another
#[derive(Clone, Default)]
pub struct SenderAdapters {
    adapters: BTreeMap<(SenderType, SenderType), AdapterFn>,
}

impl SenderAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversion; the function may decline by returning `None`
    pub fn register_adapter<F>(
        &mut self,
        source: impl Into<SenderType>,
        target: impl Into<SenderType>,
        adapter: F,
    ) -> std::result::Result<(), RegistryError>
    where
        F: Fn(&Arc<dyn CommandSender>) -> Option<Arc<dyn CommandSender>> + Send + Sync + 'static,
    {
        let key = (source.into(), target.into());
        if self.adapters.contains_key(&key) {
            return Err(RegistryError::DuplicateAdapter {
                source_type: key.0.to_string(),
                target_type: key.1.to_string(),
            });
        }
        debug!(source = %key.0, target = %key.1, "Registering sender adapter");
        self.adapters.insert(key, Arc::new(adapter));
        Ok(())
    }

    /// Narrow `sender` to a type accepted by `constraint`: a direct match first,
    /// then a single adapter application
    pub fn narrow(
        &self,
        sender: &Arc<dyn CommandSender>,
        constraint: &SenderConstraint,
    ) -> Option<Arc<dyn CommandSender>> {
        let sender_type = sender.sender_type();
        if constraint.accepts(&sender_type) {
            return Some(Arc::clone(sender));
        }

        self.adapters
            .iter()
            .filter(|((source, target), _)| *source == sender_type && constraint.accepts(target))
            .find_map(|((_, target), adapter)| {
                let adapted = adapter(sender);
                if adapted.is_some() {
                    debug!(source = %sender_type, target = %target, "Adapted sender");
                }
                adapted
            })
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Checks sender compatibility and permission before any argument is bound
pub struct SenderGate<'a> {
    adapters: &'a SenderAdapters,
}

impl<'a> SenderGate<'a> {
    pub fn new(adapters: &'a SenderAdapters) -> Self {
        Self { adapters }
    }

    /// Returns the sender narrowed to an accepted type
    pub fn check(
        &self,
        constraint: &SenderConstraint,
        permission: Option<&str>,
        sender: &Arc<dyn CommandSender>,
    ) -> Result<Arc<dyn CommandSender>> {
        let narrowed = self.adapters.narrow(sender, constraint).ok_or_else(|| {
            CommandError::IncompatibleSender(Some(sender.sender_type().to_string()))
        })?;

        if let Some(permission) = permission {
            if !sender.has_permission(permission) {
                return Err(CommandError::PermissionDenied(Some(permission.to_string())));
            }
        }

        Ok(narrowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Player {
        name: String,
    }

    impl CommandSender for Player {
        fn name(&self) -> &str {
            &self.name
        }

        fn sender_type(&self) -> SenderType {
            SenderType::new("player")
        }

        fn send_message(&self, _message: &str) {}

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn console() -> Arc<dyn CommandSender> {
        Arc::new(ConsoleSender::new("console"))
    }

    #[test]
    fn test_constraint_accepts() {
        let console_type = SenderType::new("console");
        assert!(SenderConstraint::Any.accepts(&console_type));
        assert!(SenderConstraint::Required("console".into()).accepts(&console_type));
        assert!(!SenderConstraint::Required("player".into()).accepts(&console_type));
        assert!(SenderConstraint::one_of(["player", "console"]).accepts(&console_type));
    }

    #[test]
    fn test_gate_direct_match() {
        let adapters = SenderAdapters::new();
        let gate = SenderGate::new(&adapters);
        let sender = console();
        let narrowed = gate
            .check(&SenderConstraint::Required("console".into()), None, &sender)
            .unwrap();
        assert_eq!(narrowed.name(), "console");
    }

    #[test]
    fn test_gate_incompatible() {
        let adapters = SenderAdapters::new();
        let gate = SenderGate::new(&adapters);
        let err = gate
            .check(&SenderConstraint::Required("player".into()), None, &console())
            .err()
            .unwrap();
        assert_eq!(err, CommandError::IncompatibleSender(Some("console".to_string())));
    }

    #[test]
    fn test_gate_uses_adapter() {
        let mut adapters = SenderAdapters::new();
        adapters
            .register_adapter("console", "player", |s: &Arc<dyn CommandSender>| {
                Some(Arc::new(Player {
                    name: format!("{}-as-player", s.name()),
                }) as Arc<dyn CommandSender>)
            })
            .unwrap();
        let gate = SenderGate::new(&adapters);
        let narrowed = gate
            .check(&SenderConstraint::Required("player".into()), None, &console())
            .unwrap();
        assert_eq!(narrowed.name(), "console-as-player");
        assert!(narrowed.as_any().downcast_ref::<Player>().is_some());
    }

    #[test]
    fn test_adapter_may_decline() {
        let mut adapters = SenderAdapters::new();
        adapters
            .register_adapter("console", "player", |_: &Arc<dyn CommandSender>| None)
            .unwrap();
        assert!(adapters
            .narrow(&console(), &SenderConstraint::Required("player".into()))
            .is_none());
    }

    #[test]
    fn test_duplicate_adapter_rejected() {
        let mut adapters = SenderAdapters::new();
        adapters
            .register_adapter("console", "player", |_: &Arc<dyn CommandSender>| None)
            .unwrap();
        assert!(adapters
            .register_adapter("console", "player", |_: &Arc<dyn CommandSender>| None)
            .is_err());
    }

    #[test]
    fn test_gate_reports_sender_type_before_permission() {
        let adapters = SenderAdapters::new();
        let gate = SenderGate::new(&adapters);
        let sender: Arc<dyn CommandSender> =
            Arc::new(ConsoleSender::new("guest").with_permissions(["chat"]));
        let err = gate
            .check(
                &SenderConstraint::Required("player".into()),
                Some("admin"),
                &sender,
            )
            .err()
            .unwrap();
        assert_eq!(err, CommandError::IncompatibleSender(Some("console".to_string())));
    }

    #[test]
    fn test_gate_permission_denied() {
        let adapters = SenderAdapters::new();
        let gate = SenderGate::new(&adapters);
        let sender: Arc<dyn CommandSender> =
            Arc::new(ConsoleSender::new("guest").with_permissions(["chat"]));
        let err = gate
            .check(&SenderConstraint::Any, Some("admin"), &sender)
            .err()
            .unwrap();
        assert_eq!(err, CommandError::PermissionDenied(Some("admin".to_string())));
        assert!(gate.check(&SenderConstraint::Any, Some("chat"), &sender).is_ok());
    }
}
