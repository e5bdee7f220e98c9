use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Error body returned by the catalog service on rejected requests.
///
/// Mirrors the common `{ "message": ..., "errors": { field: [..] } }` shape;
/// both members are optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// First message per field, in field order.
    pub fn field_messages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().filter_map(|(field, messages)| {
            messages
                .first()
                .map(|message| (field.as_str(), message.as_str()))
        })
    }
}
