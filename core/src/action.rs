//! Serializable event actions used by delegated event handling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// Namespace under which enrichment data is merged when an action does not name one.
pub const DEFAULT_ENRICHMENT_NAMESPACE: &str = "bioroid";

/// A serializable description of how the application reacts to a UI event.
///
/// Actions are attached to elements through the `on` prop and dispatched by
/// the delegated event system instead of running a closure per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAction {
    /// Action type, e.g. `"TODO_TOGGLED"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Caller-supplied payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Json>>,
    /// Optional request to merge live element state into `data` at dispatch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
}

impl EventAction {
    /// Creates an action with no payload and no enrichment.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
            enrichment: None,
        }
    }

    /// Replaces the payload.
    #[must_use]
    pub fn with_data(mut self, data: Map<String, Json>) -> Self {
        self.data = Some(data);
        self
    }

    /// Inserts a single payload entry.
    #[must_use]
    pub fn with_datum(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the enrichment descriptor.
    #[must_use]
    pub fn with_enrichment(mut self, enrichment: Enrichment) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    /// Looks up a payload entry.
    #[must_use]
    pub fn datum(&self, key: &str) -> Option<&Json> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}

/// Which pieces of live state to attach to a dispatched action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    /// Include the triggering input's current value.
    #[serde(default)]
    pub include_value: bool,
    /// Include the triggering input's checked state.
    #[serde(default)]
    pub include_checked: bool,
    /// Include a capture timestamp in milliseconds.
    #[serde(default)]
    pub include_timestamp: bool,
    /// Key under which the enrichment object is merged into `data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Enrichment {
    /// Requests the input value.
    #[must_use]
    pub const fn value(mut self) -> Self {
        self.include_value = true;
        self
    }

    /// Requests the checked state.
    #[must_use]
    pub const fn checked(mut self) -> Self {
        self.include_checked = true;
        self
    }

    /// Requests a timestamp.
    #[must_use]
    pub const fn timestamp(mut self) -> Self {
        self.include_timestamp = true;
        self
    }

    /// Overrides the namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}
