use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{KeyValueStore, StoreError};

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// SQLite-backed store that survives restarts.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Provides the connection to the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        f(&self.conn)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> = self.with_conn(|conn| {
            Ok(conn
                .query_row("select value from kv where key = ?", params![key], |row| {
                    row.get(0)
                })
                .optional()?)
        })?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(value)?;
        let now = Utc::now().timestamp();

        self.with_conn(|conn| {
            conn.execute(
                r#"
                insert into kv (key, value, updated_at) values (?1, ?2, ?3)
                on conflict(key) do update set
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                params![key, text, now],
            )?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute("delete from kv where key = ?", params![key])?;
            Ok(())
        })
    }
}
