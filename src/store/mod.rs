mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Key owned by the connectivity manager.
pub const PRICING_ENABLED_KEY: &str = "pricing.enabled";
/// Keys owned by the property resolver.
pub const SELECTED_PROPERTY_ID_KEY: &str = "session.selected_property_id";
pub const SELECTED_PROPERTY_KEY: &str = "session.selected_property";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable key-value storage shared by the session components.
///
/// Reads observe every earlier write made through the same handle. Each key
/// is independent; nothing here spans keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(value)?;
        self.set(key, &value)
    }
}

/// Reads a typed value, treating any store or decode failure as absent.
///
/// The reconciling components never fail on a bad cache entry; they log and
/// move on to the next fallback.
pub fn read_or_absent<S, T>(store: &S, key: &str) -> Option<T>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match store.get_json(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unreadable cache entry");
            None
        }
    }
}

/// Writes a typed value, logging instead of failing.
pub fn write_or_log<S, T>(store: &S, key: &str, value: &T)
where
    S: KeyValueStore,
    T: Serialize,
{
    if let Err(e) = store.set_json(key, value) {
        tracing::warn!(key, error = %e, "failed to persist cache entry");
    }
}
