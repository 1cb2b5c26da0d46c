use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Name of the custom claim that marks an account as an administrator.
pub const ADMIN_CLAIM: &str = "isAdmin";

/// Custom claims attached to an account and embedded into its tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(BTreeMap<String, Value>);

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &Value) -> bool,
    {
        self.0.retain(|name, value| keep(name, value));
    }

    /// True only when `isAdmin` is the JSON boolean `true`. Strings such as
    /// `"true"` or numbers do not count.
    pub fn is_admin(&self) -> bool {
        matches!(self.get(ADMIN_CLAIM), Some(Value::Bool(true)))
    }

    /// Returns a copy of these claims with `isAdmin = true`, keeping every
    /// other claim untouched.
    pub fn with_admin(&self) -> Self {
        let mut merged = self.clone();
        merged.insert(ADMIN_CLAIM, true);
        merged
    }
}

impl<K, V> FromIterator<(K, V)> for ClaimSet
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
