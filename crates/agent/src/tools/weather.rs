//! Weather lookup

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::{city_argument, city_schema, ToolResult, ToolTrait};
use crate::Result;

const SUPPORTED_CITY: &str = "new york";

const NEW_YORK_REPORT: &str = "The weather in New York is sunny with a temperature of 25 degrees \
                               Celsius (77 degrees Fahrenheit).";

/// Current weather report for `city`.
///
/// Matching is case-insensitive. The error message quotes the city exactly
/// as given.
pub fn get_weather(city: &str) -> ToolResult {
    info!(tool = "get_weather", city, "tool called");

    let result = if city.to_lowercase() == SUPPORTED_CITY {
        ToolResult::success(NEW_YORK_REPORT)
    } else {
        ToolResult::error(format!(
            "Weather information for '{}' is not available.",
            city
        ))
    };

    info!(tool = "get_weather", %result, "tool returning");
    result
}

pub struct WeatherTool;

#[async_trait]
impl ToolTrait for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Retrieves the current weather report for a specified city. \
         Returns a status of 'success' with a report, or 'error' with an error_message."
    }

    fn parameters(&self) -> Value {
        city_schema()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let city = city_argument(self.name(), &args)?;
        Ok(get_weather(city))
    }
}
