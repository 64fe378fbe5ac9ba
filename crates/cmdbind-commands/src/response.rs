use serde::{Deserialize, Serialize};

use crate::error::{CommandError, ErrorCode};
use crate::value::Value;

/// Receives rendered command output
pub trait MessageReceiver: Send + Sync {
    fn send_message(&self, message: &str);
}

/// Output format for rendered responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Plain text, one line per collection element
    #[default]
    Plain,

    /// JSON object with `body` and `error`
    Json,
}

/// Structured error part of a response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseError {
    pub code: ErrorCode,
    pub message: String,
}

/// Outcome of executing a command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    pub body: Option<Value>,
    pub error: Option<ResponseError>,
}

impl CommandResponse {
    pub fn ok(body: Option<Value>) -> Self {
        Self { body, error: None }
    }

    pub fn error(error: &CommandError) -> Self {
        Self {
            body: None,
            error: Some(ResponseError {
                code: error.code(),
                message: error.to_string(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Render for delivery, `None` when there is nothing to show
    pub fn render(&self, format: ResponseFormat) -> Option<String> {
        match format {
            ResponseFormat::Plain => self.format_plain(),
            ResponseFormat::Json => Some(self.format_json()),
        }
    }

    fn format_plain(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.message.clone());
        }

        match self.body.as_ref()? {
            Value::List(items) | Value::Set(items) => Some(
                items
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            other => Some(other.to_string()),
        }
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

impl From<Result<Option<Value>, CommandError>> for CommandResponse {
    fn from(result: Result<Option<Value>, CommandError>) -> Self {
        match result {
            Ok(body) => CommandResponse::ok(body),
            Err(e) => CommandResponse::error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_error() {
        let response = CommandResponse::error(&CommandError::TooFewArguments(Some("x".into())));
        assert!(!response.is_success());
        assert_eq!(
            response.render(ResponseFormat::Plain).as_deref(),
            Some("Too few arguments: x")
        );
    }

    #[test]
    fn test_plain_list_one_per_line() {
        let response = CommandResponse::ok(Some(Value::List(vec![
            Value::String("a".into()),
            Value::String("b".into()),
        ])));
        assert_eq!(response.render(ResponseFormat::Plain).as_deref(), Some("a\nb"));
    }

    #[test]
    fn test_plain_empty_body() {
        assert_eq!(CommandResponse::ok(None).render(ResponseFormat::Plain), None);
    }

    #[test]
    fn test_json_format() {
        let response = CommandResponse::error(&CommandError::PermissionDenied(None));
        let json: serde_json::Value =
            serde_json::from_str(&response.render(ResponseFormat::Json).unwrap()).unwrap();
        assert_eq!(json["error"]["code"], "PERMISSION_DENIED");
        assert_eq!(json["error"]["message"], "Permission denied");
        assert!(json["body"].is_null());
    }
}
