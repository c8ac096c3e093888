//! Directory Connection Port
//!
//! Minimal LDAP-shaped contract used by the directory registry backend:
//! entries addressed by DN, multi-valued attributes, and searches under a
//! base DN with a structured filter.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;

/// A directory entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name
    pub dn: String,
    /// Attribute name to values
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// Create an entry without attributes
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute value
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// First value of an attribute (names compare case-insensitively)
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values of an attribute (names compare case-insensitively)
    pub fn values(&self, name: &str) -> Option<&Vec<String>> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values)
    }
}

/// Search filter, rendered in RFC 4515 string form by `Display`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryFilter {
    /// `(attr=value)`
    Equals(String, String),
    /// `(attr=*)`
    Present(String),
    /// `(&f1f2...)`
    And(Vec<DirectoryFilter>),
}

impl DirectoryFilter {
    /// `(attr=value)`
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals(attribute.into(), value.into())
    }

    /// Whether `entry` satisfies the filter
    ///
    /// Attribute names and values compare case-insensitively, as they do for
    /// the directory's default matching rules.
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        match self {
            Self::Equals(attribute, expected) => entry
                .values(attribute)
                .is_some_and(|values| values.iter().any(|v| v.eq_ignore_ascii_case(expected))),
            Self::Present(attribute) => entry.values(attribute).is_some_and(|v| !v.is_empty()),
            Self::And(filters) => filters.iter().all(|f| f.matches(entry)),
        }
    }
}

/// Escape a filter assertion value (RFC 4515 section 3)
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

impl fmt::Display for DirectoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(attribute, value) => {
                write!(f, "({attribute}={})", escape_filter_value(value))
            }
            Self::Present(attribute) => write!(f, "({attribute}=*)"),
            Self::And(filters) => {
                f.write_str("(&")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Directory Connection Port
///
/// # Implementations
///
/// - **InMemory**: process-local tree, used by default and in tests
#[async_trait]
pub trait DirectoryConnection: Send + Sync + std::fmt::Debug {
    /// Entries at or below `base_dn` matching `filter`
    async fn search(&self, base_dn: &str, filter: &DirectoryFilter) -> Result<Vec<DirectoryEntry>>;

    /// Read one entry by DN
    async fn lookup(&self, dn: &str) -> Result<Option<DirectoryEntry>>;

    /// Create an entry; fails when the DN exists
    async fn add(&self, entry: DirectoryEntry) -> Result<()>;

    /// Replace the attributes of an existing entry
    async fn modify(&self, entry: DirectoryEntry) -> Result<()>;

    /// Remove an entry; `false` when it did not exist
    async fn delete(&self, dn: &str) -> Result<bool>;
}
