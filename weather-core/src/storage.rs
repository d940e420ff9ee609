//! Persistence of the saved-city list under a single well-known key.
//!
//! [`CityStorage`] is generic over a [`KeyValueStore`] so the same logic runs
//! against files on disk ([`FileStore`]) or in memory ([`MemoryStore`]).
//! Corrupt or unreadable data is never an error for readers: it loads as `None`.

use std::fmt::Debug;

use serde_json::Value;

use crate::model::{City, StoredConfig};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// The only key this crate ever writes.
pub const STORAGE_KEY: &str = "weather-widget-config";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to access storage at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize saved cities: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable string key-value storage.
pub trait KeyValueStore: Send + Sync + Debug {
    /// Returns `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Only `{"cities": [{..}, ..]}` is a record; arrays standing in for objects are not.
fn is_stored_config(value: &Value) -> bool {
    value
        .get("cities")
        .and_then(Value::as_array)
        .is_some_and(|cities| cities.iter().all(Value::is_object))
}

#[derive(Debug)]
pub struct CityStorage<S> {
    store: S,
}

impl<S: KeyValueStore> CityStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the stored record with `cities`.
    pub fn save(&self, cities: &[City]) -> Result<(), StorageError> {
        let config = StoredConfig {
            cities: cities.to_vec(),
        };
        let json = serde_json::to_string(&config)?;

        self.store.set(STORAGE_KEY, &json)?;
        tracing::debug!(count = cities.len(), "saved cities");
        Ok(())
    }

    pub fn load(&self) -> Option<StoredConfig> {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(err) => {
                tracing::warn!("could not read saved cities: {err}");
                return None;
            }
        };

        let value = match serde_json::from_str::<Value>(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("ignoring corrupt saved cities: {err}");
                return None;
            }
        };

        if !is_stored_config(&value) {
            tracing::warn!("ignoring saved cities with unexpected structure");
            return None;
        }

        match serde_json::from_value::<StoredConfig>(value) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("ignoring corrupt saved cities: {err}");
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(STORAGE_KEY)
    }

    /// Saved cities, or an empty list when nothing valid is stored.
    pub fn cities(&self) -> Vec<City> {
        self.load().map(|config| config.cities).unwrap_or_default()
    }

    /// Append `city` unless one with the same id is already saved.
    /// Returns whether the list changed.
    pub fn add_city(&self, city: City) -> Result<bool, StorageError> {
        let mut cities = self.cities();
        if cities.iter().any(|c| c.id() == city.id()) {
            return Ok(false);
        }

        cities.push(city);
        self.save(&cities)?;
        Ok(true)
    }

    /// Returns whether a city with `id` was removed.
    pub fn remove_city(&self, id: &str) -> Result<bool, StorageError> {
        let mut cities = self.cities();
        let before = cities.len();
        cities.retain(|c| c.id() != id);

        if cities.len() == before {
            return Ok(false);
        }

        self.save(&cities)?;
        Ok(true)
    }
}
