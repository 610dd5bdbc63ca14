//! Context builder for assembling agent prompts

use chrono::Local;
use weatherdesk_provider::{Message, ToolCallDef};

use crate::AgentDefinition;

/// Builds the system prompt and message list for one prompt
pub struct ContextBuilder {
    name: String,
    description: String,
    instruction: String,
}

impl ContextBuilder {
    pub fn new(definition: &AgentDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            description: definition.description.clone(),
            instruction: definition.instruction.clone(),
        }
    }

    pub fn build_system_prompt(&self) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M (%A)");

        format!(
            "# {}\n\n{}\n\n## Instructions\n\n{}\n\n## Current Time\n\n{}",
            self.name, self.description, self.instruction, now
        )
    }

    /// System prompt followed by the user's prompt. No history is carried.
    pub fn build_messages(&self, prompt: &str) -> Vec<Message> {
        vec![
            Message::system(self.build_system_prompt()),
            Message::user(prompt),
        ]
    }

    /// Add a tool result to messages
    pub fn add_tool_result(
        messages: &mut Vec<Message>,
        tool_call_id: &str,
        name: &str,
        result: &str,
    ) {
        messages.push(Message::tool(tool_call_id, name, result));
    }

    /// Add an assistant message with tool calls
    pub fn add_assistant_message(
        messages: &mut Vec<Message>,
        content: Option<&str>,
        tool_calls: Option<Vec<ToolCallDef>>,
    ) {
        let mut msg = Message::assistant(content.unwrap_or(""));
        msg.tool_calls = tool_calls;
        messages.push(msg);
    }
}
