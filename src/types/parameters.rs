// ABOUTME: Stack parameter set with layered overrides.
// ABOUTME: Parses the `K=V;K2=V2` command-line form and merges parameter sources.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParametersError {
    #[error("parameter without a name in '{0}'")]
    MissingName(String),
}

/// Parameter name to value, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackParameters(BTreeMap<String, String>);

impl StackParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `Name=Value;Other=Value`. Everything after the first `=` is the
    /// value, a pair without `=` gets an empty value, and empty pairs are ignored.
    pub fn parse(input: &str) -> Result<Self, ParametersError> {
        let mut params = Self::new();
        for pair in input.split(';').filter(|p| !p.trim().is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = name.trim();
            if name.is_empty() {
                return Err(ParametersError::MissingName(pair.to_string()));
            }
            params.insert(name, value);
        }
        Ok(params)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Apply `other` on top of `self`; keys in `other` win.
    pub fn overlay(&mut self, other: &StackParameters) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StackParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl std::str::FromStr for StackParameters {
    type Err = ParametersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StackParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                f.write_str(";")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}
