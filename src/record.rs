//! Minimal model of a queried job record.
//!
//! Query tools emit one JSON object per matching job (or daemon). Only the
//! attribute values' tags matter here: a string, an explicit undefined, or
//! anything else. Expressions and nested ads are not interpreted.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{DiscoveryError, Result};

/// Legacy spelling of an undefined attribute, emitted as a plain string.
const UNDEFINED_SENTINEL: &str = "undefined";

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Undefined,
    /// Any other value; carries the name of its type.
    Other(&'static str),
}

impl AttributeValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => AttributeValue::String(s.clone()),
            Value::Null => AttributeValue::Undefined,
            Value::Bool(_) => AttributeValue::Other("boolean"),
            Value::Number(n) if n.is_f64() => AttributeValue::Other("real"),
            Value::Number(_) => AttributeValue::Other("integer"),
            Value::Array(_) => AttributeValue::Other("list"),
            Value::Object(_) => AttributeValue::Other("classad"),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Undefined => "undefined",
            AttributeValue::Other(kind) => *kind,
        }
    }

    /// True for a tagged undefined and for the `"undefined"` string sentinel.
    pub fn is_undefined(&self) -> bool {
        match self {
            AttributeValue::Undefined => true,
            AttributeValue::String(s) => s == UNDEFINED_SENTINEL,
            AttributeValue::Other(_) => false,
        }
    }
}

/// One record returned by a query: attribute name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobRecord {
    attributes: HashMap<String, AttributeValue>,
}

impl JobRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(name.into(), value);
    }

    /// Look up an attribute. Names compare case-insensitively, as in classads.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Read a string attribute.
    ///
    /// `Ok(None)` when the attribute is absent or undefined (including the
    /// `"undefined"` sentinel). Any non-string value is an
    /// [`DiscoveryError::UnsupportedAttributeType`].
    pub fn string_attr(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some(value) if value.is_undefined() => Ok(None),
            Some(AttributeValue::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(DiscoveryError::UnsupportedAttributeType {
                attribute: name.to_string(),
                kind: other.type_name().to_string(),
            }),
        }
    }

    pub fn from_json_object(object: &serde_json::Map<String, Value>) -> Self {
        let attributes = object
            .iter()
            .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
            .collect();
        Self { attributes }
    }
}

/// Decode the `-json` output of a query tool into records.
///
/// The tools print nothing at all when no ad matches, so blank output is an
/// empty result rather than a decode error. Non-object array entries are
/// skipped.
pub fn parse_records(output: &str) -> std::result::Result<Vec<JobRecord>, serde_json::Error> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }

    let values: Vec<Value> = serde_json::from_str(output)?;
    Ok(values
        .iter()
        .filter_map(|v| v.as_object().map(JobRecord::from_json_object))
        .collect())
}
