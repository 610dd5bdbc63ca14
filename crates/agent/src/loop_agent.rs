//! Agent loop - tool-calling conversation driver

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use weatherdesk_config::Config;
use weatherdesk_provider::{ChatParams, Message, Provider, ToolCall, ToolCallDef};

use crate::context::ContextBuilder;
use crate::tools::{ToolRegistry, ToolResult};
use crate::{AgentDefinition, AgentError};

/// Runs prompts against a model, executing the tool calls it requests
pub struct AgentLoop<P: Provider> {
    provider: Arc<P>,
    definition: AgentDefinition,
    context: ContextBuilder,
    tools: ToolRegistry,
    max_iterations: u32,
    max_tokens: u32,
    temperature: f32,
}

impl<P: Provider> AgentLoop<P> {
    /// Agent with the default weather and time tools
    pub fn new(provider: P, definition: AgentDefinition) -> Self {
        Self::with_tools(provider, definition, ToolRegistry::with_defaults())
    }

    pub fn with_tools(provider: P, definition: AgentDefinition, tools: ToolRegistry) -> Self {
        let context = ContextBuilder::new(&definition);
        Self {
            provider: Arc::new(provider),
            definition,
            context,
            tools,
            max_iterations: 10,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    /// Weather and time agent configured from `config.agent`
    pub fn from_config(provider: P, config: &Config) -> Self {
        let mut agent = Self::new(provider, AgentDefinition::weather_time(config.model()));
        agent.max_iterations = config.agent.max_tool_iterations;
        agent.max_tokens = config.agent.max_tokens;
        agent.temperature = config.agent.temperature;
        agent
    }

    pub fn set_max_iterations(&mut self, max: u32) {
        self.max_iterations = max;
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Model named by the definition, or the provider's default when blank
    pub fn model(&self) -> String {
        if self.definition.model.trim().is_empty() {
            self.provider.default_model()
        } else {
            self.definition.model.clone()
        }
    }

    /// Run one prompt; errors are rendered into the returned text
    pub async fn process_direct(&self, prompt: &str) -> String {
        match self.run(prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("agent run failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }

    /// Run one prompt to completion
    pub async fn run(&self, prompt: &str) -> crate::Result<String> {
        let model = self.model();
        info!(agent = %self.definition.name, model = %model, "processing prompt");
        debug!("prompt: {}", prompt);

        let messages = self.context.build_messages(prompt);
        self.run_agent_loop(&model, messages).await
    }

    async fn run_agent_loop(
        &self,
        model: &str,
        mut messages: Vec<Message>,
    ) -> crate::Result<String> {
        let mut iteration = 0;

        loop {
            iteration += 1;
            if iteration > self.max_iterations {
                return Err(AgentError::MaxIterations(self.max_iterations));
            }

            debug!("agent iteration {}", iteration);

            let params = ChatParams {
                model: model.to_string(),
                messages: messages.clone(),
                tools: self.tools.definitions(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            };

            let response = self
                .provider
                .chat(params)
                .await
                .map_err(|e| AgentError::Provider(e.to_string()))?;

            if !response.has_tool_calls() {
                return Ok(response
                    .content
                    .unwrap_or_else(|| "Task completed.".to_string()));
            }

            let tool_call_defs: Vec<ToolCallDef> =
                response.tool_calls.iter().map(ToolCallDef::from).collect();
            ContextBuilder::add_assistant_message(
                &mut messages,
                response.content.as_deref(),
                Some(tool_call_defs),
            );

            for tool_call in &response.tool_calls {
                let result = self.invoke_tool(tool_call).await;
                ContextBuilder::add_tool_result(
                    &mut messages,
                    &tool_call.id,
                    &tool_call.name,
                    &result.to_string(),
                );
            }
        }
    }

    /// Dispatch one call. Invocation failures are folded into an error result
    /// so the model sees them like any other tool outcome.
    async fn invoke_tool(&self, call: &ToolCall) -> ToolResult {
        debug!("executing tool: {}", call.name);

        match self.tools.execute(&call.name, call.arguments.clone()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.name, "tool invocation failed: {}", e);
                ToolResult::error(format!("Error: {}", e))
            }
        }
    }
}
