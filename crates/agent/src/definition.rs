//! Agent identity and instructions

/// Who the agent is and how it should use its tools
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    pub name: String,
    pub model: String,
    pub description: String,
    pub instruction: String,
}

impl AgentDefinition {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        description: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            description: description.into(),
            instruction: instruction.into(),
        }
    }

    /// The weather and time assistant
    pub fn weather_time(model: impl Into<String>) -> Self {
        Self::new(
            "weather_time_agent",
            model,
            "Agent to answer questions about the time and weather in a city.",
            "You are a helpful agent who can answer user questions about the time and weather in a city. \
             When asked for information, first determine if it's a weather or time request. \
             Then, identify the city. \
             Use the appropriate tool to find the information and respond to the user based on the tool's output.",
        )
    }
}
