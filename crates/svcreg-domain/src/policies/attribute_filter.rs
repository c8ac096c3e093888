//! Attribute value filters applied after release

use crate::entities::Attributes;
use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Filter applied to released attribute values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeFilter {
    /// One pattern for every attribute value
    Regex(RegexAttributeFilter),
    /// One pattern per attribute name
    MappedRegex(MappedRegexAttributeFilter),
}

impl AttributeFilter {
    /// Keep only the values accepted by the filter; attributes left empty are dropped
    pub fn filter(&self, attributes: Attributes) -> Result<Attributes> {
        match self {
            Self::Regex(f) => f.filter(attributes),
            Self::MappedRegex(f) => f.filter(attributes),
        }
    }
}

/// Keeps the values matching a single pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexAttributeFilter {
    /// Value pattern
    pub pattern: String,
    /// Require the whole value to match instead of any substring
    #[serde(default)]
    pub complete_match: bool,
}

impl RegexAttributeFilter {
    /// Create a filter with substring semantics
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            complete_match: false,
        }
    }

    /// Require whole-value matches
    pub fn complete(mut self) -> Self {
        self.complete_match = true;
        self
    }

    fn filter(&self, attributes: Attributes) -> Result<Attributes> {
        let regex = compile(&self.pattern, self.complete_match, false)?;
        Ok(attributes
            .into_iter()
            .filter_map(|(name, values)| retain_matching(&regex, name, values))
            .collect())
    }
}

/// Keeps values matching a pattern chosen by attribute name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappedRegexAttributeFilter {
    /// Attribute name to value pattern
    pub patterns: BTreeMap<String, String>,
    /// Require the whole value to match instead of any substring
    pub complete_match: bool,
    /// Drop attributes without a pattern (otherwise they pass unfiltered)
    pub exclude_unmapped_attributes: bool,
    /// Compile patterns case-insensitively
    pub case_insensitive: bool,
}

impl MappedRegexAttributeFilter {
    /// Add a pattern for an attribute
    pub fn with_pattern(mut self, attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.patterns.insert(attribute.into(), pattern.into());
        self
    }

    fn filter(&self, attributes: Attributes) -> Result<Attributes> {
        let compiled = self
            .patterns
            .iter()
            .map(|(name, pattern)| {
                compile(pattern, self.complete_match, self.case_insensitive)
                    .map(|regex| (name.as_str(), regex))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(attributes
            .into_iter()
            .filter_map(|(name, values)| match compiled.get(name.as_str()) {
                Some(regex) => retain_matching(regex, name, values),
                None if self.exclude_unmapped_attributes => {
                    trace!(attribute = %name, "Dropping unmapped attribute");
                    None
                }
                None => Some((name, values)),
            })
            .collect())
    }
}

fn compile(pattern: &str, complete_match: bool, case_insensitive: bool) -> Result<Regex> {
    let source = if complete_match {
        format!("^(?:{pattern})$")
    } else {
        pattern.to_string()
    };
    Ok(RegexBuilder::new(&source)
        .case_insensitive(case_insensitive)
        .build()?)
}

fn retain_matching(regex: &Regex, name: String, values: Vec<String>) -> Option<(String, Vec<String>)> {
    let kept: Vec<String> = values.into_iter().filter(|v| regex.is_match(v)).collect();
    if kept.is_empty() {
        trace!(attribute = %name, "No values left after filtering");
        None
    } else {
        Some((name, kept))
    }
}
