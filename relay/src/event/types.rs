//! Webhook payload types.
//!
//! Field names match the task service's JSON. Each event keeps the JSON it
//! arrived as; the typed fields are a read-only view used for routing, and
//! serializing an event writes the original JSON back out.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// One webhook call's worth of events, in delivery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub events: Vec<DomainEvent>,
}

/// What happened to the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Changed,
    Added,
    Removed,
    Deleted,
    Undeleted,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Changed => "changed",
            Action::Added => "added",
            Action::Removed => "removed",
            Action::Deleted => "deleted",
            Action::Undeleted => "undeleted",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed reference to a resource in the task service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub gid: String,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_subtype: Option<String>,
}

/// New value carried by a field change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeValue {
    pub gid: String,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_subtype: Option<String>,
    /// Selected option when the changed field is an enum custom field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_value: Option<ResourceRef>,
}

/// Which field changed and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDescriptor {
    pub field: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<ChangeValue>,
}

/// One reported change.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    pub created_at: DateTime<Utc>,
    pub action: Action,
    pub resource: ResourceRef,
    pub parent: Option<ResourceRef>,
    pub user: Option<ResourceRef>,
    pub change: Option<ChangeDescriptor>,
    raw: serde_json::Value,
}

impl DomainEvent {
    /// The event exactly as delivered, every field included.
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}

/// Typed view of an event. Only the fields needed to route the event are
/// required; optional parts with an unexpected shape read as absent.
#[derive(Deserialize)]
struct EventView {
    created_at: DateTime<Utc>,
    action: Action,
    resource: ResourceRef,
    #[serde(default, deserialize_with = "lenient")]
    parent: Option<ResourceRef>,
    #[serde(default, deserialize_with = "lenient")]
    user: Option<ResourceRef>,
    #[serde(default, deserialize_with = "lenient")]
    change: Option<ChangeDescriptor>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl<'de> Deserialize<'de> for DomainEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let view = EventView::deserialize(&raw).map_err(de::Error::custom)?;

        Ok(DomainEvent {
            created_at: view.created_at,
            action: view.action,
            resource: view.resource,
            parent: view.parent,
            user: view.user,
            change: view.change,
            raw,
        })
    }
}

impl Serialize for DomainEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}
