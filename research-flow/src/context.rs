use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{GraphError, Result};

/// Typed key/value store shared by every task of one graph execution.
///
/// Values are held as JSON so tasks stay decoupled from each other's types;
/// clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, key: impl Into<String>, value: impl Serialize) -> Result<()> {
        let key = key.into();
        let value = serde_json::to_value(value)
            .map_err(|e| GraphError::ContextError(format!("cannot store '{}': {}", key, e)))?;
        self.data.insert(key, value);
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_sync(key)
    }

    /// Synchronous read, usable from edge conditions.
    pub fn get_sync<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Read a value a previous task was required to produce.
    pub async fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .data
            .get(key)
            .map(|v| v.clone())
            .ok_or_else(|| GraphError::ContextError(format!("{} not found", key)))?;
        serde_json::from_value(value)
            .map_err(|e| GraphError::ContextError(format!("{} has unexpected shape: {}", key, e)))
    }
}
