//! Bus entry conversion.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::DomainEvent;

/// One record sent to the event bus, built from exactly one domain event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusEntry {
    pub event_bus_name: String,
    pub source: String,
    pub time: DateTime<Utc>,
    /// Classification tag, e.g. `TaskChanged`
    pub detail_type: String,
    /// The originating event's JSON, exactly as delivered
    pub detail: String,
}

impl BusEntry {
    /// Build the bus entry for `event`.
    pub fn from_event(
        event: &DomainEvent,
        event_bus_name: &str,
        source: &str,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_bus_name: event_bus_name.to_string(),
            source: source.to_string(),
            time: event.created_at,
            detail_type: classification_tag(event),
            detail: serde_json::to_string(event.raw())?,
        })
    }
}

/// Resource kind and action, each with an upper-cased initial:
/// `task` + `changed` gives `TaskChanged`.
pub fn classification_tag(event: &DomainEvent) -> String {
    format!(
        "{}{}",
        capitalize_initial(&event.resource.resource_type),
        capitalize_initial(event.action.as_str())
    )
}

fn capitalize_initial(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
