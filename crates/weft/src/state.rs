use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// String-keyed store of arbitrary JSON values, used for global and scope state.
///
/// Keys share one namespace; nothing prevents two components from picking the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateMap {
    values: HashMap<String, Value>,
}

impl StateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Deserializes the value under `key`. `None` when absent or of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(typed) => Some(typed),
            Err(error) => {
                log::debug!("state {key:?} does not have the requested shape: {error}");
                None
            }
        }
    }

    /// Stores a value, returning the one it replaced.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Independent copy of every entry.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values.clone()
    }
}
