//! The status-tagged value every lookup tool returns

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Outcome of a tool call.
///
/// Serializes to exactly `{"status":"success","report":...}` or
/// `{"status":"error","error_message":...}`. Agent runtimes key on those
/// names, so they must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolResult {
    Success { report: String },
    Error { error_message: String },
}

impl ToolResult {
    pub fn success(report: impl Into<String>) -> Self {
        Self::Success {
            report: report.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error_message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// `"success"` or `"error"`
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }

    pub fn report(&self) -> Option<&str> {
        match self {
            Self::Success { report } => Some(report),
            Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Error { error_message } => Some(error_message),
        }
    }

    /// Wire mapping handed to the agent runtime
    pub fn to_value(&self) -> Value {
        match self {
            Self::Success { report } => json!({ "status": "success", "report": report }),
            Self::Error { error_message } => {
                json!({ "status": "error", "error_message": error_message })
            }
        }
    }
}

impl fmt::Display for ToolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
