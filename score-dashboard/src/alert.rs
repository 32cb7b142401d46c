use std::fmt;

use serde_json::Value;

use crate::render::escape_html;

pub const ALERT_TIMEOUT_MS: u32 = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Danger,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Success => "success",
            AlertKind::Danger => "danger",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AlertMessage {
    Text(String),
    Structured(Value),
}

impl fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertMessage::Text(text) => f.write_str(text),
            AlertMessage::Structured(value) => {
                let text = serde_json::to_string_pretty(value).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
        }
    }
}

impl From<&str> for AlertMessage {
    fn from(value: &str) -> Self {
        AlertMessage::Text(value.to_string())
    }
}

impl From<String> for AlertMessage {
    fn from(value: String) -> Self {
        AlertMessage::Text(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: AlertMessage,
}

impl Alert {
    pub fn success(message: impl Into<AlertMessage>) -> Self {
        Self {
            kind: AlertKind::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<AlertMessage>) -> Self {
        Self {
            kind: AlertKind::Danger,
            message: message.into(),
        }
    }

    /// How long the notice stays on the page unless closed first.
    pub fn lifetime_ms(&self) -> u32 {
        ALERT_TIMEOUT_MS
    }

    pub fn class_name(&self) -> String {
        format!("alert alert-{} alert-dismissible fade show", self.kind.as_str())
    }

    /// Inner markup of the notice element: the message and its close button.
    pub fn inner_html(&self) -> String {
        let body = match &self.message {
            AlertMessage::Text(_) => escape_html(&self.message.to_string()),
            AlertMessage::Structured(_) => {
                format!("<pre class=\"mb-0\">{}</pre>", escape_html(&self.message.to_string()))
            }
        };
        format!(
            "{}<button type=\"button\" class=\"btn-close\" data-bs-dismiss=\"alert\" aria-label=\"Close\"></button>",
            body
        )
    }
}

/// Shows transient notices. Implementations remove each notice after
/// [`ALERT_TIMEOUT_MS`] and let the user dismiss it earlier.
pub trait AlertPresenter {
    fn show(&self, alert: Alert);
}
