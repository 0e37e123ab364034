use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::vocabulary::FilterKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Boolean(bool),
    Integer(u32),
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => f.write_str(text),
            FilterValue::Integer(n) => write!(f, "{n}"),
            FilterValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Everything currently confirmed about what the user wants.
///
/// Serializes as the flat JSON object the inventory service expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterSet(BTreeMap<FilterKey, FilterValue>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any previous value for `key`.
    pub fn insert(&mut self, key: FilterKey, value: FilterValue) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.0.get(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &FilterValue)> {
        self.0.iter().map(|(key, value)| (*key, value))
    }
}

impl FromIterator<(FilterKey, FilterValue)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (FilterKey, FilterValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
