use serde_json::Value;
use thiserror::Error;

use crate::alert::AlertMessage;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(String),

    #[error("request failed ({status})")]
    Status { status: u16, body: Value },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// The `detail` field of a failed response, when the server sent one.
    pub fn detail(&self) -> Option<&Value> {
        match self {
            ApiError::Status { body, .. } => body.get("detail").filter(|value| !value.is_null()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server detail verbatim, else `fallback`.
    pub fn alert_message(&self, fallback: &str) -> AlertMessage {
        match self.detail() {
            Some(Value::String(text)) => AlertMessage::Text(text.clone()),
            Some(value) => AlertMessage::Structured(value.clone()),
            None => AlertMessage::Text(fallback.to_string()),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("The {0} field is required")]
    Missing(&'static str),

    #[error("Invalid {field}: {value}")]
    Invalid { field: &'static str, value: String },
}
