use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The key for the score of a crosslink as used for FDR estimation
pub const LINK_SCORE: &str = "linkScore";
/// The key for the estimated FDR of a crosslink
pub const FDR: &str = "fdr";

/// A single metadata value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// A number
    Number(f64),
    /// A flag
    Bool(bool),
    /// Any text
    Text(String),
}

impl MetaValue {
    /// Get the number if this is numeric
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the text if this is textual
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl std::fmt::Display for MetaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(t) => write!(f, "{t}"),
        }
    }
}

/// Arbitrary named values attached to a crosslink or match, in insertion order. Holds the computed
/// [`LINK_SCORE`] and [`FDR`] as well as any extra columns from imported data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaData(IndexMap<String, MetaValue>);

impl MetaData {
    /// Get a value
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    /// Get a value if it is numeric
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(MetaValue::as_number)
    }

    /// Set a value, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Option<MetaValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        self.0.shift_remove(key)
    }

    /// Iterate over all values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The number of values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
