//! Current-time lookup

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use super::{city_argument, city_schema, ToolResult, ToolTrait};
use crate::Result;

/// Why a supported city's time could not be produced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("unknown timezone '{zone}': {reason}")]
    UnknownZone { zone: String, reason: String },
}

/// Resolve an IANA zone identifier such as `America/New_York`
pub fn resolve_zone(zone: &str) -> std::result::Result<Tz, ClockError> {
    zone.parse::<Tz>().map_err(|e| ClockError::UnknownZone {
        zone: zone.to_string(),
        reason: e.to_string(),
    })
}

/// Cities the time tool knows, keyed by lowercase name
#[derive(Debug, Clone)]
pub struct ZoneTable {
    zones: BTreeMap<String, String>,
}

impl ZoneTable {
    /// Table with no cities
    pub fn empty() -> Self {
        Self {
            zones: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, city: &str, zone: impl Into<String>) {
        self.zones.insert(city.to_lowercase(), zone.into());
    }

    pub fn zone_for(&self, city: &str) -> Option<&str> {
        self.zones.get(&city.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl Default for ZoneTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert("new york", "America/New_York");
        table
    }
}

/// `The current time in <city> is YYYY-MM-DD HH:MM:SS ZZZ+hhmm`
pub fn format_report<T>(city: &str, local: &DateTime<T>) -> String
where
    T: TimeZone,
    T::Offset: std::fmt::Display,
{
    format!(
        "The current time in {} is {}",
        city,
        local.format("%Y-%m-%d %H:%M:%S %Z%z")
    )
}

pub struct CurrentTimeTool {
    zones: ZoneTable,
}

impl CurrentTimeTool {
    pub fn new(zones: ZoneTable) -> Self {
        Self { zones }
    }

    /// Look up `city` as of now
    pub fn lookup(&self, city: &str) -> ToolResult {
        self.lookup_at(city, Utc::now())
    }

    /// Look up `city` at a fixed instant
    pub fn lookup_at(&self, city: &str, now: DateTime<Utc>) -> ToolResult {
        info!(tool = "get_current_time", city, "tool called");

        let result = match self.zones.zone_for(city) {
            None => ToolResult::error(format!(
                "Sorry, I don't have timezone information for {}.",
                city
            )),
            Some(zone) => match resolve_zone(zone) {
                Ok(tz) => ToolResult::success(format_report(city, &now.with_timezone(&tz))),
                Err(e) => {
                    warn!(city, error = %e, "timezone resolution failed");
                    ToolResult::error(format!("Error getting time for {}: {}", city, e))
                }
            },
        };

        info!(tool = "get_current_time", %result, "tool returning");
        result
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::new(ZoneTable::default())
    }
}

/// Current time in `city`, using the default zone table
pub fn get_current_time(city: &str) -> ToolResult {
    CurrentTimeTool::default().lookup(city)
}

#[async_trait]
impl ToolTrait for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Returns the current time in a specified city. \
         Returns a status of 'success' with a report, or 'error' with an error_message."
    }

    fn parameters(&self) -> Value {
        city_schema()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let city = city_argument(self.name(), &args)?;
        Ok(self.lookup(city))
    }
}
