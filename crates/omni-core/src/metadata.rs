//! Framework metadata side channel.
//!
//! Each framework owns exactly one slot, named after the identifier it was
//! registered under. Slot contents are opaque JSON to everything else.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-framework auxiliary data passed to standard handlers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameworkMetadata(BTreeMap<String, serde_json::Value>);

impl FrameworkMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create metadata holding a single serialized slot.
    pub fn with_slot<T: Serialize>(slot: impl Into<String>, value: &T) -> Result<Self> {
        let mut metadata = Self::new();
        metadata.set_slot(slot, value)?;
        Ok(metadata)
    }

    /// Serialize a value into a slot, replacing previous contents.
    pub fn set_slot<T: Serialize>(&mut self, slot: impl Into<String>, value: &T) -> Result<()> {
        self.0.insert(slot.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Raw slot contents.
    pub fn slot(&self, slot: &str) -> Option<&serde_json::Value> {
        self.0.get(slot)
    }

    /// Deserialize a slot into a typed view.
    pub fn typed<T: DeserializeOwned>(&self, slot: &str) -> Result<Option<T>> {
        match self.0.get(slot) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    /// Whether a slot is populated.
    pub fn contains_slot(&self, slot: &str) -> bool {
        self.0.contains_key(slot)
    }

    /// Names of populated slots.
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no slot is populated.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct RouteInfo {
        path: String,
        version: u8,
    }

    #[test]
    fn test_with_slot_and_typed() {
        let info = RouteInfo {
            path: "/items".into(),
            version: 2,
        };
        let metadata = FrameworkMetadata::with_slot("server", &info).unwrap();

        assert!(metadata.contains_slot("server"));
        assert_eq!(metadata.typed::<RouteInfo>("server").unwrap(), Some(info));
        assert_eq!(metadata.typed::<RouteInfo>("lambda").unwrap(), None);
    }

    #[test]
    fn test_typed_mismatch_is_error() {
        let metadata = FrameworkMetadata::with_slot("server", &json!("not a struct")).unwrap();
        assert!(metadata.typed::<RouteInfo>("server").is_err());
    }

    #[test]
    fn test_slots_are_independent() {
        let mut metadata = FrameworkMetadata::new();
        metadata.set_slot("a", &json!({"x": 1})).unwrap();
        metadata.set_slot("b", &json!([1, 2])).unwrap();
        metadata.set_slot("a", &json!({"x": 2})).unwrap();

        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.slot("a"), Some(&json!({"x": 2})));
        assert_eq!(metadata.slot("b"), Some(&json!([1, 2])));
        assert_eq!(metadata.slots().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
