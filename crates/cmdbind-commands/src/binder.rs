//! Argument binding: raw positional, named and flag tokens to typed values
//!
//! Binding proceeds in a fixed order:
//! 1. parameters referenced by name or flag leave the positional pool
//! 2. the pool consumes positional tokens left to right; a collection
//!    parameter consumes greedily until a token fails element conversion,
//!    possibly consuming none
//! 3. unresolved parameters take their explicit value, then their default;
//!    a collection then binds empty, an optional scalar binds absence, and a
//!    required scalar fails the bind
//! 4. leftover positional tokens fail the bind
//! 5. named keys or flags matching no parameter fail the bind
//!
//! A failed bind returns no partial result.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::error::{CommandError, Result};
use crate::parameter::{CommandParameter, CommandParameterSet};
use crate::parameter_type::CommandEnum;
use crate::value::{FromValue, Value};

/// Tokenized invocation arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArguments {
    pub positional: Vec<String>,
    pub named: BTreeMap<String, String>,
    pub flags: BTreeSet<char>,
}

impl RawArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments made only of positional tokens
    pub fn positional<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            positional: tokens.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_positional(mut self, token: impl Into<String>) -> Self {
        self.positional.push(token.into());
        self
    }

    pub fn with_named(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    pub fn with_flag(mut self, flag: char) -> Self {
        self.flags.insert(flag);
        self
    }
}

/// Parameter ids mapped to bound values, in declaration order
///
/// An entry with `None` is an omitted optional scalar parameter without default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: Vec<(String, Option<Value>)>,
}

impl Bindings {
    /// The bound value, `None` when absent or undeclared
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(key, _)| key == id)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Whether the parameter is part of this binding, bound or absent
    pub fn contains(&self, id: &str) -> bool {
        self.values.iter().any(|(key, _)| key == id)
    }

    pub fn get_as<T: FromValue>(&self, id: &str) -> Option<T> {
        self.get(id).and_then(T::from_value)
    }

    /// Read a value the executor cannot do without
    pub fn require<T: FromValue>(&self, id: &str) -> Result<T> {
        let value = self
            .get(id)
            .ok_or_else(|| CommandError::RequiredParameter(Some(id.to_string())))?;
        T::from_value(value).ok_or_else(|| CommandError::invalid_argument(id, value.to_string()))
    }

    /// Narrow an enumeration constant back to its Rust type
    pub fn get_enum<E: CommandEnum>(&self, id: &str) -> Option<E> {
        match self.get(id)? {
            Value::Enum {
                type_name,
                constant,
            } if type_name == E::TYPE_NAME => E::from_constant(constant),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Where an explicitly referenced parameter got its raw value from
enum Explicit<'a> {
    Named(&'a str),
    Flag(char),
}

/// Binds raw arguments against a parameter set
pub struct ArgumentBinder;

impl ArgumentBinder {
    pub fn bind(parameters: &CommandParameterSet, raw: &RawArguments) -> Result<Bindings> {
        // Step 1: partition into explicitly referenced parameters and the positional pool
        let mut explicit: HashMap<&str, Explicit<'_>> = HashMap::new();
        let mut unknown: Vec<String> = Vec::new();

        for flag in &raw.flags {
            match parameters.get_by_flag(*flag) {
                Some(param) => {
                    explicit.insert(param.id(), Explicit::Flag(*flag));
                }
                None => unknown.push(format!("-{}", flag)),
            }
        }

        // Named references override flags for the same parameter
        for (key, value) in &raw.named {
            match parameters.get(key) {
                Some(param) => {
                    explicit.insert(param.id(), Explicit::Named(value));
                }
                None => unknown.push(key.clone()),
            }
        }

        let mut bound: HashMap<&str, Option<Value>> = HashMap::new();

        // Step 2: positional consumption
        let tokens = &raw.positional;
        let mut next = 0;
        for param in parameters.iter().filter(|p| !explicit.contains_key(p.id())) {
            if next >= tokens.len() {
                break;
            }

            match param.collection_type() {
                Some(collection) => {
                    let (value, consumed) = collection.convert_greedy(&tokens[next..]);
                    debug!(parameter = param.id(), consumed, "Bound collection parameter");
                    // An empty run resolves to the default or an empty collection in step 3
                    if consumed > 0 {
                        bound.insert(param.id(), Some(value));
                        next += consumed;
                    }
                }
                None => {
                    let value = param.parameter_type().convert(param.id(), &tokens[next])?;
                    bound.insert(param.id(), Some(value));
                    next += 1;
                }
            }
        }

        // Step 3: resolve the rest
        for param in parameters {
            if bound.contains_key(param.id()) {
                continue;
            }
            let value = Self::resolve_unbound(param, explicit.get(param.id()))?;
            bound.insert(param.id(), value);
        }

        // Step 4
        if let Some(extra) = tokens.get(next) {
            return Err(CommandError::TooManyArguments(Some(extra.clone())));
        }

        // Step 5
        if let Some(key) = unknown.into_iter().next() {
            return Err(CommandError::InvalidParameter(Some(key)));
        }

        let values = parameters
            .iter()
            .map(|p| (p.id().to_string(), bound.remove(p.id()).flatten()))
            .collect();
        Ok(Bindings { values })
    }

    fn resolve_unbound(
        param: &CommandParameter,
        explicit: Option<&Explicit<'_>>,
    ) -> Result<Option<Value>> {
        match explicit {
            Some(Explicit::Named(raw)) => return param.convert(raw).map(Some),
            Some(Explicit::Flag(flag)) => return Self::flag_value(param, *flag).map(Some),
            None => {}
        }

        if let Some(default) = param.default_binding()? {
            return Ok(Some(default));
        }

        if let Some(collection) = param.collection_type() {
            return Ok(Some(collection.empty()));
        }

        if param.is_optional() {
            return Ok(None);
        }

        Err(CommandError::TooFewArguments(Some(param.id().to_string())))
    }

    /// A flag selects `true` for boolean parameters and the default otherwise
    fn flag_value(param: &CommandParameter, flag: char) -> Result<Value> {
        if !param.is_collection() {
            if let Some(Value::Boolean(_)) = param.parameter_type().try_convert("true") {
                return Ok(Value::Boolean(true));
            }
        }

        param
            .default_binding()?
            .ok_or_else(|| CommandError::invalid_argument(param.id(), format!("-{}", flag)))
    }
}
