//! Authenticated principal as seen by policy evaluation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multi-valued attribute map, keyed by attribute name
pub type Attributes = BTreeMap<String, Vec<String>>;

/// An authenticated principal and its resolved attributes
///
/// Supplied by the caller; the registry never resolves attributes itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Principal {
    /// Primary principal identifier
    pub id: String,
    /// Resolved attributes
    #[serde(default)]
    pub attributes: Attributes,
}

impl Principal {
    /// Create a principal without attributes
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    /// Add an attribute value (appends to existing values)
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Replace all values of an attribute
    pub fn with_attribute_values<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// First value of an attribute, if any
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}
