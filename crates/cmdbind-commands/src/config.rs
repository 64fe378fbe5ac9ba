use crate::error::ConfigError;
use crate::response::ResponseFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Separator between command path segments
    pub separator: String,

    /// Whether path segments are matched ignoring case
    pub case_insensitive: bool,

    /// Whether the built-in `help` command is registered
    pub register_help: bool,

    /// Whether dispatched input is echoed to output listeners
    pub echo_input: bool,

    /// Whether completion includes flag aliases by default
    pub complete_flags: bool,

    /// How responses are rendered for senders and listeners
    pub response_format: ResponseFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            separator: " ".to_string(),
            case_insensitive: true,
            register_help: true,
            echo_input: false,
            complete_flags: false,
            response_format: ResponseFormat::Plain,
        }
    }
}

type Result<T> = std::result::Result<T, ConfigError>;

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load configuration from a JSON file
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load configuration from a file (auto-detect format)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match extension(path) {
            "yaml" | "yml" => Self::load_from_yaml(path),
            "json" => Self::load_from_json(path),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Save configuration to a file (auto-detect format)
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match extension(path) {
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            "json" => serde_json::to_string_pretty(self)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        fs::write(path, content)?;
        Ok(())
    }
}

fn extension(path: &Path) -> &str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
}
