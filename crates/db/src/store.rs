use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::db::{self, DbConn};
use crate::{AppError, AppResult};

/// String key-value storage the rest of the app persists through.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_string(&self, key: &str) -> AppResult<Option<String>>;
    async fn set_string(&self, key: &str, value: &str) -> AppResult<()>;
    async fn remove_string(&self, key: &str) -> AppResult<()>;
    async fn remove_many(&self, keys: &[&str]) -> AppResult<()>;

    async fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()> {
        for (key, value) in entries {
            self.set_string(key, value).await?;
        }
        Ok(())
    }
}

/// `KeyValueStore` backed by the libsql `app_settings` table.
#[derive(Clone)]
pub struct LibsqlKeyValueStore {
    conn: DbConn,
}

impl LibsqlKeyValueStore {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    /// Opens (or creates) the database file and ensures the settings table exists.
    pub async fn open(db_path: &Path) -> AppResult<Self> {
        let conn = db::open_db(db_path).await.map_err(|error| {
            AppError::from(error).with_context("dbPath", db_path.display().to_string())
        })?;
        db::init_db(&conn).await?;
        Ok(Self::new(conn))
    }

    pub async fn get_many(&self, keys: &[&str]) -> AppResult<HashMap<String, String>> {
        Ok(db::get_app_settings_batch(&self.conn, keys).await?)
    }
}

fn storage_error(error: impl Into<AppError>, operation: &str, key: &str) -> AppError {
    error
        .into()
        .with_context("operation", operation.to_string())
        .with_context("key", key.to_string())
}

#[async_trait]
impl KeyValueStore for LibsqlKeyValueStore {
    async fn get_string(&self, key: &str) -> AppResult<Option<String>> {
        db::get_app_setting(&self.conn, key)
            .await
            .map_err(|error| storage_error(error, "get", key))
    }

    async fn set_string(&self, key: &str, value: &str) -> AppResult<()> {
        db::set_app_setting(&self.conn, key, value)
            .await
            .map_err(|error| storage_error(error, "set", key))
    }

    async fn remove_string(&self, key: &str) -> AppResult<()> {
        db::delete_app_settings(&self.conn, &[key])
            .await
            .map_err(|error| storage_error(error, "remove", key))
    }

    async fn remove_many(&self, keys: &[&str]) -> AppResult<()> {
        db::delete_app_settings(&self.conn, keys)
            .await
            .map_err(|error| storage_error(error, "remove_many", &keys.join(",")))
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()> {
        let keys = entries.iter().map(|(key, _)| *key).collect::<Vec<_>>();
        db::set_app_settings_batch(&self.conn, entries)
            .await
            .map_err(|error| storage_error(error, "set_many", &keys.join(",")))
    }
}

/// Process-local store used by tests and by hosts without persistent storage.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.values.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(event = "kv_store_lock_poisoned", lock = "memory_store");
                poisoned.into_inner()
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_string(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    async fn set_string(&self, key: &str, value: &str) -> AppResult<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_string(&self, key: &str) -> AppResult<()> {
        self.values().remove(key);
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> AppResult<()> {
        let mut values = self.values();
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/store/store_tests.rs"]
mod tests;
