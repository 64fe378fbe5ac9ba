//! Parameter types: converters from raw tokens to typed values
//!
//! A [`ParameterType`] turns one raw string into a [`Value`] and optionally
//! enumerates its legal values for completion. The [`ParameterTypes`] registry
//! maps semantic type keys (`"integer"`, `"boolean"`, ...) to parameter types and
//! synthesizes converters for [`CommandEnum`] enumerations on demand.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{CommandError, RegistryError, Result};
use crate::parameter::Form;
use crate::value::Value;

/// Converts a single raw token into a typed value
pub trait Converter: Send + Sync {
    /// Returns `None` when the token cannot be parsed
    fn convert(&self, raw: &str) -> Option<Value>;

    /// Legal values for suggestion, `None` for open-ended types
    fn values(&self) -> Option<Vec<String>> {
        None
    }
}

struct FnConverter<F>(F);

impl<F> Converter for FnConverter<F>
where
    F: Fn(&str) -> Option<Value> + Send + Sync,
{
    fn convert(&self, raw: &str) -> Option<Value> {
        (self.0)(raw)
    }
}

/// Free text, always succeeds
pub struct StringConverter;

impl Converter for StringConverter {
    fn convert(&self, raw: &str) -> Option<Value> {
        Some(Value::String(raw.to_string()))
    }
}

/// Strict decimal integer, optionally negative
pub struct IntegerConverter;

impl Converter for IntegerConverter {
    fn convert(&self, raw: &str) -> Option<Value> {
        if raw.starts_with('+') {
            return None;
        }
        raw.parse::<i64>().ok().map(Value::Integer)
    }
}

/// Finite floating-point number
pub struct NumberConverter;

impl Converter for NumberConverter {
    fn convert(&self, raw: &str) -> Option<Value> {
        raw.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
    }
}

/// `true`/`false` (any case) or `1`/`0`
pub struct BooleanConverter;

impl Converter for BooleanConverter {
    fn convert(&self, raw: &str) -> Option<Value> {
        if raw.eq_ignore_ascii_case("true") || raw == "1" {
            Some(Value::Boolean(true))
        } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
            Some(Value::Boolean(false))
        } else {
            None
        }
    }

    fn values(&self) -> Option<Vec<String>> {
        Some(vec![
            "true".to_string(),
            "false".to_string(),
            "1".to_string(),
            "0".to_string(),
        ])
    }
}

/// Case-insensitive match against a closed set of constant names
pub struct EnumConverter {
    type_name: String,
    constants: Vec<String>,
}

impl EnumConverter {
    pub fn new(type_name: impl Into<String>, constants: Vec<String>) -> Self {
        Self {
            type_name: type_name.into(),
            constants,
        }
    }
}

impl Converter for EnumConverter {
    fn convert(&self, raw: &str) -> Option<Value> {
        self.constants
            .iter()
            .find(|c| c.eq_ignore_ascii_case(raw))
            .map(|c| Value::Enum {
                type_name: self.type_name.clone(),
                constant: c.clone(),
            })
    }

    fn values(&self) -> Option<Vec<String>> {
        Some(self.constants.clone())
    }
}

/// A closed set of named constants usable as a parameter type
///
/// ```ignore
/// #[derive(Clone, Copy)]
/// enum Color { Red, Green, Blue }
///
/// impl CommandEnum for Color {
///     const TYPE_NAME: &'static str = "color";
///     fn variants() -> &'static [Self] { &[Color::Red, Color::Green, Color::Blue] }
///     fn constant(&self) -> &'static str {
///         match self { Color::Red => "RED", Color::Green => "GREEN", Color::Blue => "BLUE" }
///     }
/// }
/// ```
pub trait CommandEnum: Sized + Copy + 'static {
    /// Semantic type key of the enumeration
    const TYPE_NAME: &'static str;

    /// All constants in declaration order
    fn variants() -> &'static [Self];

    /// Name of this constant
    fn constant(&self) -> &'static str;

    /// Find a constant by name, ignoring case
    fn from_constant(name: &str) -> Option<Self> {
        Self::variants()
            .iter()
            .copied()
            .find(|v| v.constant().eq_ignore_ascii_case(name))
    }
}

/// A named converter
#[derive(Clone)]
pub struct ParameterType {
    name: String,
    converter: Arc<dyn Converter>,
}

impl ParameterType {
    pub fn new(name: impl Into<String>, converter: impl Converter + 'static) -> Self {
        Self {
            name: name.into(),
            converter: Arc::new(converter),
        }
    }

    /// Create a type from a conversion closure
    pub fn from_fn<F>(name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&str) -> Option<Value> + Send + Sync + 'static,
    {
        Self::new(name, FnConverter(convert))
    }

    /// Synthesize the converter of an enumeration
    pub fn of_enum<E: CommandEnum>() -> Self {
        let constants = E::variants()
            .iter()
            .map(|v| v.constant().to_string())
            .collect();
        Self::new(E::TYPE_NAME, EnumConverter::new(E::TYPE_NAME, constants))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Convert a raw token, `None` if it does not parse
    pub fn try_convert(&self, raw: &str) -> Option<Value> {
        self.converter.convert(raw)
    }

    /// Convert a raw token on behalf of `parameter`
    pub fn convert(&self, parameter: &str, raw: &str) -> Result<Value> {
        self.try_convert(raw)
            .ok_or_else(|| CommandError::invalid_argument(parameter, raw))
    }

    pub fn values(&self) -> Option<Vec<String>> {
        self.converter.values()
    }

    /// Derive the collection type for the given form
    pub fn collection(&self, form: Form) -> CollectionType {
        CollectionType {
            element: self.clone(),
            form,
        }
    }
}

impl fmt::Debug for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterType")
            .field("name", &self.name)
            .finish()
    }
}

/// Collection form of a scalar [`ParameterType`]
#[derive(Debug, Clone)]
pub struct CollectionType {
    element: ParameterType,
    form: Form,
}

impl CollectionType {
    pub fn element(&self) -> &ParameterType {
        &self.element
    }

    pub fn form(&self) -> Form {
        self.form
    }

    /// Pluralized element name, e.g. `Integers`
    pub fn name(&self) -> String {
        let name = self.element.name();
        if name.ends_with('s') {
            name.to_string()
        } else {
            format!("{}s", name)
        }
    }

    pub fn values(&self) -> Option<Vec<String>> {
        self.element.values()
    }

    /// Convert tokens from the front until one fails, returning the collection
    /// and how many tokens were consumed
    pub fn convert_greedy<S: AsRef<str>>(&self, tokens: &[S]) -> (Value, usize) {
        let mut items = Vec::new();
        for token in tokens {
            match self.element.try_convert(token.as_ref()) {
                Some(value) => items.push(value),
                None => break,
            }
        }
        let consumed = items.len();
        (self.wrap(items), consumed)
    }

    /// Convert every token, failing on the first one that does not parse
    pub fn convert_all<S: AsRef<str>>(&self, parameter: &str, tokens: &[S]) -> Result<Value> {
        let items = tokens
            .iter()
            .map(|t| self.element.convert(parameter, t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.wrap(items))
    }

    /// The collection holding no elements
    pub fn empty(&self) -> Value {
        self.wrap(Vec::new())
    }

    fn wrap(&self, items: Vec<Value>) -> Value {
        match self.form {
            Form::Set => Value::set_from(items),
            _ => Value::List(items),
        }
    }
}

/// Registry of parameter types keyed by semantic type
#[derive(Clone)]
pub struct ParameterTypes {
    types: HashMap<String, ParameterType>,
}

impl ParameterTypes {
    pub const STRING: &'static str = "string";
    pub const INTEGER: &'static str = "integer";
    pub const NUMBER: &'static str = "number";
    pub const BOOLEAN: &'static str = "boolean";

    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in types
    pub fn with_builtins() -> Self {
        let mut types = Self::new();
        types.register(Self::STRING, ParameterType::new("String", StringConverter));
        types.register(Self::INTEGER, ParameterType::new("Integer", IntegerConverter));
        types.register(Self::NUMBER, ParameterType::new("Number", NumberConverter));
        types.register(Self::BOOLEAN, ParameterType::new("Boolean", BooleanConverter));
        types
    }

    /// Register a type, replacing any previous type under the same key
    pub fn register(&mut self, key: impl Into<String>, parameter_type: ParameterType) {
        let key = key.into();
        debug!(key = %key, name = parameter_type.name(), "Registering parameter type");
        self.types.insert(key, parameter_type);
    }

    /// Register the synthesized converter of an enumeration under its type key
    pub fn register_enum<E: CommandEnum>(&mut self) {
        self.register(E::TYPE_NAME, ParameterType::of_enum::<E>());
    }

    /// Look up a type by key
    pub fn get(&self, key: &str) -> std::result::Result<ParameterType, RegistryError> {
        self.types
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::UnsupportedType(key.to_string()))
    }

    /// Look up an enumeration type, synthesizing it when not registered
    pub fn get_enum<E: CommandEnum>(&self) -> ParameterType {
        self.types
            .get(E::TYPE_NAME)
            .cloned()
            .unwrap_or_else(ParameterType::of_enum::<E>)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.types.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for ParameterTypes {
    fn default() -> Self {
        Self::with_builtins()
    }
}
