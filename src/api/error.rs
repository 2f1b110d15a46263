use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        ApiError::InvalidUrl(e.to_string())
    }
}

/// Pulls a user-facing message out of an error body.
///
/// Understands the `detail` shapes the bid-management service produces:
/// a plain string, a list of field errors, or an object with `msg` or
/// `message`. Anything else, including an empty string, falls back to
/// `fallback`.
pub fn extract_error_message(body: &Value, fallback: &str) -> String {
    match body.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(format_field_error)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Object(obj)) => non_empty_str(obj.get("msg"))
            .or_else(|| non_empty_str(obj.get("message")))
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(obj.clone()).to_string()),
        _ => fallback.to_string(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn format_field_error(item: &Value) -> String {
    let field = match item.get("loc").and_then(Value::as_array) {
        Some(loc) => loc
            .iter()
            .map(|part| match part {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("."),
        None => "field".to_string(),
    };
    let msg = match item.get("msg") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "undefined".to_string(),
    };
    format!("{}: {}", field, msg)
}
