//! Parameter declarations and ordered parameter sets

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::parameter_type::{CollectionType, ParameterType};
use crate::value::Value;

static PARAMETER_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("parameter id pattern is valid")
});

/// How many tokens a parameter slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    /// Exactly one token
    #[default]
    Value,
    /// An ordered run of tokens
    List,
    /// An unordered run of tokens without duplicates
    Set,
}

impl Form {
    pub fn is_collection(&self) -> bool {
        !matches!(self, Form::Value)
    }
}

/// Raw value substituted for an omitted parameter, plus how to show it in usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValue {
    pub value: String,
    pub representation: String,
}

impl DefaultValue {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            representation: value.clone(),
            value,
        }
    }

    pub fn with_representation(value: impl Into<String>, representation: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            representation: representation.into(),
        }
    }
}

type SuggestionFn = Arc<dyn Fn() -> Vec<String> + Send + Sync>;

/// Declaration of one argument slot
#[derive(Clone)]
pub struct CommandParameter {
    id: String,
    display_name: String,
    description: Option<String>,
    parameter_type: ParameterType,
    form: Form,
    flags: BTreeSet<char>,
    optional: bool,
    default_value: Option<DefaultValue>,
    suggestions: Option<SuggestionFn>,
}

impl CommandParameter {
    /// Create a required single-value parameter
    pub fn new(id: impl Into<String>, parameter_type: ParameterType) -> Self {
        let id = id.into();
        Self {
            display_name: id.replace('-', " "),
            id,
            description: None,
            parameter_type,
            form: Form::Value,
            flags: BTreeSet::new(),
            optional: false,
            default_value: None,
            suggestions: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_form(mut self, form: Form) -> Self {
        self.form = form;
        self
    }

    /// Add a single-character alias usable as `-c`
    pub fn with_flag(mut self, flag: char) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Set a default value; the parameter becomes optional
    pub fn with_default(self, value: impl Into<String>) -> Self {
        self.with_default_value(DefaultValue::new(value))
    }

    pub fn with_default_value(mut self, default_value: DefaultValue) -> Self {
        self.default_value = Some(default_value);
        self.optional = true;
        self
    }

    /// Override the completion candidates; called anew for every request
    pub fn with_suggestions<F>(mut self, suggestions: F) -> Self
    where
        F: Fn() -> Vec<String> + Send + Sync + 'static,
    {
        self.suggestions = Some(Arc::new(suggestions));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parameter_type(&self) -> &ParameterType {
        &self.parameter_type
    }

    pub fn form(&self) -> Form {
        self.form
    }

    pub fn flags(&self) -> &BTreeSet<char> {
        &self.flags
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default_value.as_ref()
    }

    pub fn is_collection(&self) -> bool {
        self.form.is_collection()
    }

    /// The collection type of this parameter, if it has a collection form
    pub fn collection_type(&self) -> Option<CollectionType> {
        self.is_collection()
            .then(|| self.parameter_type.collection(self.form))
    }

    /// Completion candidates for this parameter
    pub fn suggestions(&self) -> Vec<String> {
        match &self.suggestions {
            Some(suggestions) => suggestions(),
            None => self.parameter_type.values().unwrap_or_default(),
        }
    }

    /// `--id` plus `-c` for each flag
    pub fn flag_aliases(&self) -> Vec<String> {
        let mut aliases = vec![format!("--{}", self.id)];
        aliases.extend(self.flags.iter().map(|f| format!("-{}", f)));
        aliases
    }

    /// Convert an explicitly supplied raw value
    pub fn convert(&self, raw: &str) -> Result<Value> {
        match self.collection_type() {
            Some(collection) => collection.convert_all(&self.id, &[raw]),
            None => self.parameter_type.convert(&self.id, raw),
        }
    }

    /// Converted default value, if one is declared
    pub fn default_binding(&self) -> Result<Option<Value>> {
        let Some(default) = &self.default_value else {
            return Ok(None);
        };
        let value = match self.collection_type() {
            Some(collection) => {
                let tokens: Vec<&str> = default.value.split_whitespace().collect();
                collection.convert_all(&self.id, &tokens)?
            }
            None => self.parameter_type.convert(&self.id, &default.value)?,
        };
        Ok(Some(value))
    }

    /// Usage fragment: `<id>`, `[id]`, `[id=5]` or `<id...>`
    pub fn usage(&self) -> String {
        let mut name = self.id.clone();
        if self.is_collection() {
            name.push_str("...");
        }
        if let Some(default) = &self.default_value {
            name = format!("{}={}", name, default.representation);
        }
        if self.optional {
            format!("[{}]", name)
        } else {
            format!("<{}>", name)
        }
    }
}

impl fmt::Debug for CommandParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandParameter")
            .field("id", &self.id)
            .field("type", &self.parameter_type.name())
            .field("form", &self.form)
            .field("flags", &self.flags)
            .field("optional", &self.optional)
            .field("default_value", &self.default_value)
            .finish()
    }
}

/// Ordered, uniquely keyed parameters of a command
#[derive(Debug, Clone, Default)]
pub struct CommandParameterSet {
    parameters: Vec<CommandParameter>,
}

impl CommandParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, enforcing the declaration rules
    pub fn add(&mut self, parameter: CommandParameter) -> std::result::Result<(), RegistryError> {
        if !PARAMETER_ID.is_match(&parameter.id) {
            return Err(RegistryError::InvalidParameterId(parameter.id.clone()));
        }

        if self.get(&parameter.id).is_some() {
            return Err(RegistryError::DuplicateParameter(parameter.id.clone()));
        }

        for flag in &parameter.flags {
            if let Some(owner) = self.get_by_flag(*flag) {
                return Err(RegistryError::DuplicateFlag {
                    flag: *flag,
                    owner: owner.id.clone(),
                });
            }
        }

        if parameter.is_collection() && self.parameters.iter().any(|p| p.is_collection()) {
            return Err(RegistryError::MultipleCollections(parameter.id.clone()));
        }

        if !parameter.optional && self.parameters.iter().any(|p| p.optional) {
            return Err(RegistryError::RequiredAfterOptional(parameter.id.clone()));
        }

        if let Some(default) = &parameter.default_value {
            if parameter.default_binding().is_err() {
                return Err(RegistryError::InvalidDefault {
                    parameter: parameter.id.clone(),
                    value: default.value.clone(),
                    type_name: parameter.parameter_type.name().to_string(),
                });
            }
        }

        self.parameters.push(parameter);
        Ok(())
    }

    /// Builder-style [`add`](Self::add)
    pub fn with(mut self, parameter: CommandParameter) -> std::result::Result<Self, RegistryError> {
        self.add(parameter)?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&CommandParameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    pub fn get_at(&self, index: usize) -> Option<&CommandParameter> {
        self.parameters.get(index)
    }

    pub fn get_by_flag(&self, flag: char) -> Option<&CommandParameter> {
        self.parameters.iter().find(|p| p.flags.contains(&flag))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandParameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl<'a> IntoIterator for &'a CommandParameterSet {
    type Item = &'a CommandParameter;
    type IntoIter = std::slice::Iter<'a, CommandParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter_type::ParameterTypes;

    fn int() -> ParameterType {
        ParameterTypes::with_builtins()
            .get(ParameterTypes::INTEGER)
            .unwrap()
    }

    fn string() -> ParameterType {
        ParameterTypes::with_builtins()
            .get(ParameterTypes::STRING)
            .unwrap()
    }

    #[test]
    fn test_parameter_defaults() {
        let param = CommandParameter::new("max-count", int());
        assert_eq!(param.display_name(), "max count");
        assert_eq!(param.form(), Form::Value);
        assert!(!param.is_optional());
        assert_eq!(param.usage(), "<max-count>");
    }

    #[test]
    fn test_default_makes_optional() {
        let param = CommandParameter::new("count", int()).with_default("5");
        assert!(param.is_optional());
        assert_eq!(param.default_binding().unwrap(), Some(Value::Integer(5)));
        assert_eq!(param.usage(), "[count=5]");
    }

    #[test]
    fn test_collection_default_split() {
        let param = CommandParameter::new("ids", int())
            .with_form(Form::List)
            .with_default("1 2");
        assert_eq!(
            param.default_binding().unwrap(),
            Some(Value::List(vec![Value::Integer(1), Value::Integer(2)]))
        );
        assert_eq!(param.usage(), "[ids...=1 2]");
    }

    #[test]
    fn test_flag_aliases() {
        let param = CommandParameter::new("force", string())
            .with_flag('f')
            .with_flag('F');
        assert_eq!(param.flag_aliases(), vec!["--force", "-F", "-f"]);
    }

    #[test]
    fn test_suggestions_recomputed() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let param = CommandParameter::new("name", string()).with_suggestions(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec!["alice".to_string()]
        });
        param.suggestions();
        param.suggestions();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_set_lookup() {
        let set = CommandParameterSet::new()
            .with(CommandParameter::new("a", string()))
            .unwrap()
            .with(CommandParameter::new("b", int()).with_flag('b').with_optional(true))
            .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_at(1).unwrap().id(), "b");
        assert_eq!(set.get_by_flag('b').unwrap().id(), "b");
        assert!(set.get("c").is_none());
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let mut set = CommandParameterSet::new();
        set.add(CommandParameter::new("a", string())).unwrap();
        assert_eq!(
            set.add(CommandParameter::new("a", int())),
            Err(RegistryError::DuplicateParameter("a".to_string()))
        );
    }

    #[test]
    fn test_rejects_invalid_id() {
        let mut set = CommandParameterSet::new();
        assert!(matches!(
            set.add(CommandParameter::new("Bad_Id", string())),
            Err(RegistryError::InvalidParameterId(_))
        ));
    }

    #[test]
    fn test_rejects_second_collection() {
        let mut set = CommandParameterSet::new();
        set.add(CommandParameter::new("a", string()).with_form(Form::List))
            .unwrap();
        assert_eq!(
            set.add(CommandParameter::new("b", string()).with_form(Form::Set)),
            Err(RegistryError::MultipleCollections("b".to_string()))
        );
    }

    #[test]
    fn test_rejects_required_after_optional() {
        let mut set = CommandParameterSet::new();
        set.add(CommandParameter::new("a", string()).with_optional(true))
            .unwrap();
        assert_eq!(
            set.add(CommandParameter::new("b", string())),
            Err(RegistryError::RequiredAfterOptional("b".to_string()))
        );
    }

    #[test]
    fn test_rejects_duplicate_flag() {
        let mut set = CommandParameterSet::new();
        set.add(CommandParameter::new("a", string()).with_flag('x'))
            .unwrap();
        assert!(matches!(
            set.add(CommandParameter::new("b", string()).with_flag('x')),
            Err(RegistryError::DuplicateFlag { flag: 'x', .. })
        ));
    }

    #[test]
    fn test_rejects_unconvertible_default() {
        let mut set = CommandParameterSet::new();
        assert!(matches!(
            set.add(CommandParameter::new("n", int()).with_default("five")),
            Err(RegistryError::InvalidDefault { .. })
        ));
    }
}
