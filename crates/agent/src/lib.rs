//! Weather and time agent
//!
//! Two city lookup tools, the status-tagged result contract they return,
//! and the tool-calling loop that lets a chat model use them.

use thiserror::Error;

pub mod context;
pub mod definition;
pub mod loop_agent;
pub mod tools;

pub use context::ContextBuilder;
pub use definition::AgentDefinition;
pub use loop_agent::AgentLoop;
pub use tools::{ToolRegistry, ToolResult, ToolTrait};

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("tool '{0}' not found")]
    ToolNotFound(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("model provider error: {0}")]
    Provider(String),

    #[error("maximum tool iterations ({0}) exceeded")]
    MaxIterations(u32),
}

pub type Result<T> = std::result::Result<T, AgentError>;
