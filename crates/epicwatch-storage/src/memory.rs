//! In-memory credential store for tests.

use std::collections::HashMap;
use std::sync::RwLock;

use epicwatch_core::{Error, Result};

use crate::CredentialStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with credentials.
    pub fn with_credentials<K, V>(credentials: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = credentials
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            credentials: RwLock::new(map),
        }
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> Error {
    Error::Storage(format!("Lock poisoned: {}", e))
}

impl CredentialStore for MemoryStore {
    fn store(&self, key: &str, value: &str) -> Result<()> {
        self.credentials
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.credentials.read().map_err(poisoned)?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.credentials.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}
