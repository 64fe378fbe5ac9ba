//! Error types for command routing and argument binding

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier for a kind of user-facing command failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The fetched command does not exist
    NotACommand,
    /// The command path stops at a group without a command
    IncompleteCommand,
    /// An argument has the wrong format
    InvalidArgument,
    /// A named argument or flag does not exist
    InvalidParameter,
    /// The command does not accept the current sender
    IncompatibleSender,
    /// Too few arguments supplied with the command
    TooFewArguments,
    /// Too many arguments supplied with the command
    TooManyArguments,
    /// A required parameter was not supplied
    RequiredParameter,
    /// Permission not granted for this command
    PermissionDenied,
}

impl ErrorCode {
    /// Stable identifier of the error kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::NotACommand => "NOT_A_COMMAND",
            ErrorCode::IncompleteCommand => "INCOMPLETE_COMMAND",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::IncompatibleSender => "INCOMPATIBLE_SENDER",
            ErrorCode::TooFewArguments => "TOO_FEW_ARGUMENTS",
            ErrorCode::TooManyArguments => "TOO_MANY_ARGUMENTS",
            ErrorCode::RequiredParameter => "REQUIRED_PARAMETER",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
        }
    }

    /// Human-readable message template
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::NotACommand => "Not a command",
            ErrorCode::IncompleteCommand => "Incomplete command",
            ErrorCode::InvalidArgument => "Invalid argument",
            ErrorCode::InvalidParameter => "Invalid parameter",
            ErrorCode::IncompatibleSender => "You cannot use that command",
            ErrorCode::TooFewArguments => "Too few arguments",
            ErrorCode::TooManyArguments => "Too many arguments",
            ErrorCode::RequiredParameter => "Missing a required parameter",
            ErrorCode::PermissionDenied => "Permission denied",
        }
    }

    /// Render the message with an optional context suffix
    pub fn render(&self, context: Option<&str>) -> String {
        match context {
            Some(context) => format!("{}: {}", self.message(), context),
            None => self.message().to_string(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn suffix(context: &Option<String>) -> String {
    context
        .as_deref()
        .map(|c| format!(": {}", c))
        .unwrap_or_default()
}

/// Expected, user-facing failures reported while routing, gating or binding a command
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Not a command{}", suffix(.0))]
    NotACommand(Option<String>),

    #[error("Incomplete command{}", suffix(.0))]
    IncompleteCommand(Option<String>),

    #[error("Invalid argument: {parameter}: {token}")]
    InvalidArgument { parameter: String, token: String },

    #[error("Invalid parameter{}", suffix(.0))]
    InvalidParameter(Option<String>),

    #[error("You cannot use that command{}", suffix(.0))]
    IncompatibleSender(Option<String>),

    #[error("Too few arguments{}", suffix(.0))]
    TooFewArguments(Option<String>),

    #[error("Too many arguments{}", suffix(.0))]
    TooManyArguments(Option<String>),

    #[error("Missing a required parameter{}", suffix(.0))]
    RequiredParameter(Option<String>),

    #[error("Permission denied{}", suffix(.0))]
    PermissionDenied(Option<String>),
}

impl CommandError {
    /// The kind of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            CommandError::NotACommand(_) => ErrorCode::NotACommand,
            CommandError::IncompleteCommand(_) => ErrorCode::IncompleteCommand,
            CommandError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            CommandError::InvalidParameter(_) => ErrorCode::InvalidParameter,
            CommandError::IncompatibleSender(_) => ErrorCode::IncompatibleSender,
            CommandError::TooFewArguments(_) => ErrorCode::TooFewArguments,
            CommandError::TooManyArguments(_) => ErrorCode::TooManyArguments,
            CommandError::RequiredParameter(_) => ErrorCode::RequiredParameter,
            CommandError::PermissionDenied(_) => ErrorCode::PermissionDenied,
        }
    }

    /// The context value rendered into the message, if any
    pub fn context(&self) -> Option<String> {
        match self {
            CommandError::NotACommand(c)
            | CommandError::IncompleteCommand(c)
            | CommandError::IncompatibleSender(c)
            | CommandError::TooFewArguments(c)
            | CommandError::TooManyArguments(c)
            | CommandError::PermissionDenied(c)
            | CommandError::InvalidParameter(c)
            | CommandError::RequiredParameter(c) => c.clone(),
            CommandError::InvalidArgument { parameter, token } => {
                Some(format!("{}: {}", parameter, token))
            }
        }
    }

    pub(crate) fn invalid_argument(parameter: &str, token: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            parameter: parameter.to_string(),
            token: token.into(),
        }
    }
}

/// Errors raised while declaring parameters, types, senders or commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unsupported parameter type: {0}")]
    UnsupportedType(String),

    #[error("A parameter with the id \"{0}\" already exists")]
    DuplicateParameter(String),

    #[error("Invalid parameter id: {0}")]
    InvalidParameterId(String),

    #[error("Flag -{flag} is already used by parameter \"{owner}\"")]
    DuplicateFlag { flag: char, owner: String },

    #[error("Parameter \"{0}\" would be a second collection parameter")]
    MultipleCollections(String),

    #[error("Required parameter \"{0}\" cannot follow an optional parameter")]
    RequiredAfterOptional(String),

    #[error("Default value \"{value}\" of parameter \"{parameter}\" is not a valid {type_name}")]
    InvalidDefault {
        parameter: String,
        value: String,
        type_name: String,
    },

    #[error("Command already registered: {0}")]
    DuplicateCommand(String),

    #[error("Invalid command name: {0}")]
    InvalidCommandName(String),

    #[error("Adapter from {source_type} to {target_type} already registered")]
    DuplicateAdapter {
        source_type: String,
        target_type: String,
    },
}

/// Errors that can occur while loading or saving engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, CommandError>;
