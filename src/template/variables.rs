//! Variable resolution across the three template layers
//!
//! Values are layered lowest to highest precedence:
//! 1. ObjectVersion declarations (names only, contribute no values)
//! 2. ApplicationObject overrides from the ApplicationTemplate
//! 3. Application overrides, which win on every collision

use std::collections::BTreeMap;

/// Flat mapping of variable name to value for one rendered object
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Variables(BTreeMap<String, String>);

impl Variables {
    /// Create an empty variable set
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a variable by exact name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Insert a value, replacing any earlier layer's value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Number of resolved variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no layer contributed a value
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolved names that the ObjectVersion does not declare
    ///
    /// Declarations are informational, so this only feeds diagnostics.
    pub fn undeclared<'a>(&'a self, declared: &'a [String]) -> Vec<&'a str> {
        self.0
            .keys()
            .filter(|name| !declared.iter().any(|d| d == *name))
            .map(String::as_str)
            .collect()
    }
}

impl From<BTreeMap<String, String>> for Variables {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Compute the effective variables for one object reference.
///
/// `declared` is accepted for symmetry with the ObjectVersion but never
/// supplies a value. Unknown names are not an error.
pub fn resolve_variables(
    _declared: &[String],
    object: &BTreeMap<String, String>,
    application: &BTreeMap<String, String>,
) -> Variables {
    let mut resolved = Variables::new();
    for (name, value) in object.iter().chain(application.iter()) {
        resolved.insert(name.clone(), value.clone());
    }
    resolved
}
