//! Command routing and argument binding
//!
//! Commands are registered in a tree under separator-delimited paths. An
//! invocation is resolved to the deepest matching command, checked against the
//! command's sender constraint and permission, and its raw positional, named
//! and flag arguments are bound to typed parameters before the executor runs.
//!
//! # Examples
//!
//! ```ignore
//! use cmdbind_commands::{
//!     Command, CommandManager, CommandParameter, CommandSender, ConsoleSender,
//!     Form, ParameterTypes, RawArguments, Value,
//! };
//! use std::sync::Arc;
//!
//! let mut manager = CommandManager::default();
//! let integer = manager.types().get(ParameterTypes::INTEGER)?;
//!
//! let sum = Command::new("math sum")
//!     .with_summary("Add numbers")
//!     .with_parameter(CommandParameter::new("numbers", integer).with_form(Form::List))?
//!     .with_executor(|invocation| {
//!         let numbers: Vec<i64> = invocation.bindings.require("numbers")?;
//!         Ok(Some(Value::Integer(numbers.iter().sum())))
//!     });
//! manager.register_command(sum)?;
//!
//! let sender: Arc<dyn CommandSender> = Arc::new(ConsoleSender::new("console"));
//! let response = manager.execute(&sender, "math sum", &RawArguments::positional(["1", "2"]));
//! assert_eq!(response.body, Some(Value::Integer(3)));
//! ```

pub mod binder;
pub mod command;
pub mod config;
pub mod error;
pub mod help;
pub mod manager;
pub mod parameter;
pub mod parameter_type;
pub mod response;
pub mod sender;
pub mod tree;
pub mod value;

pub use binder::{ArgumentBinder, Bindings, RawArguments};
pub use command::{Command, CommandExecutor, Invocation};
pub use config::EngineConfig;
pub use error::{CommandError, ConfigError, ErrorCode, RegistryError, Result};
pub use help::{HelpCommand, HelpEntry};
pub use manager::CommandManager;
pub use parameter::{CommandParameter, CommandParameterSet, DefaultValue, Form};
pub use parameter_type::{
    BooleanConverter, CollectionType, CommandEnum, Converter, EnumConverter, IntegerConverter,
    NumberConverter, ParameterType, ParameterTypes, StringConverter,
};
pub use response::{CommandResponse, MessageReceiver, ResponseError, ResponseFormat};
pub use sender::{CommandSender, ConsoleSender, SenderAdapters, SenderConstraint, SenderGate, SenderType};
pub use tree::{CommandTree, Resolved};
pub use value::{FromValue, Value};
