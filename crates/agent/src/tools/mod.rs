//! City lookup tools and the registry the agent loop dispatches through

pub mod clock;
pub mod result;
pub mod weather;

pub use clock::{get_current_time, ClockError, CurrentTimeTool, ZoneTable};
pub use result::ToolResult;
pub use weather::{get_weather, WeatherTool};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use weatherdesk_provider::{object_schema, Tool};

use crate::{AgentError, Result};

type BoxedTool = Box<dyn ToolTrait + Send + Sync>;

/// A tool the model can call.
///
/// Lookup outcomes, including unsupported input, are always returned as a
/// [`ToolResult`]. `Err` is reserved for invocations the tool cannot even
/// interpret, such as a missing argument.
#[async_trait]
pub trait ToolTrait: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<ToolResult>;
}

pub fn to_provider_tool(tool: &dyn ToolTrait) -> Tool {
    Tool::new(tool.name(), tool.description(), tool.parameters())
}

/// Schema shared by both lookups: a single required `city` string
pub fn city_schema() -> Value {
    object_schema(&[(
        "city",
        "The name of the city to look up, for example \"New York\".",
        true,
    )])
}

/// Extract the `city` argument for `tool`
pub fn city_argument<'a>(tool: &str, args: &'a Value) -> Result<&'a str> {
    args.get("city")
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::InvalidArguments {
            tool: tool.to_string(),
            reason: "missing string argument 'city'".to_string(),
        })
}

/// Tool registry
pub struct ToolRegistry {
    tools: HashMap<String, BoxedTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registry holding `get_weather` and `get_current_time`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_default_tools(&mut registry);
        registry
    }

    pub fn register<T: ToolTrait + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&(dyn ToolTrait + Send + Sync)> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Provider specs, ordered by tool name
    pub fn definitions(&self) -> Vec<Tool> {
        let mut defs: Vec<Tool> = self
            .tools
            .values()
            .map(|t| to_provider_tool(t.as_ref()))
            .collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<ToolResult> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        tool.execute(args).await
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the weather and time lookups
pub fn register_default_tools(registry: &mut ToolRegistry) {
    registry.register(WeatherTool);
    registry.register(CurrentTimeTool::default());
}
