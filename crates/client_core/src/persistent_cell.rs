use std::{fmt::Display, str::FromStr, sync::Arc};

use anyhow::Result;
use storage::KeyValueStore;
use tokio::sync::watch;
use tracing::warn;

pub const SEARCH_TERM_KEY: &str = "search";
pub const DEFAULT_SEARCH_TERM: &str = "React";

/// Reads `key` from `store`, falling back to `default` when the key is absent,
/// unreadable or does not decode.
pub async fn read_value<T>(store: &dyn KeyValueStore, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(err) => {
            warn!(key, "persistent cell: read failed, using default: {err:#}");
            return default;
        }
    };

    match raw.parse::<T>() {
        Ok(value) => value,
        Err(err) => {
            warn!(key, "persistent cell: stored value does not decode, using default: {err}");
            default
        }
    }
}

pub async fn write_value<T: ToString>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    store.set(key, &value.to_string()).await
}

/// A named durable value slot.
///
/// The current value is cached in memory and broadcast to subscribers on
/// change; every [`PersistentCell::set`] is written through to the store
/// before it returns.
pub struct PersistentCell<T> {
    key: String,
    store: Arc<dyn KeyValueStore>,
    value: watch::Sender<T>,
}

impl<T> PersistentCell<T>
where
    T: FromStr + ToString + Clone + PartialEq + Send + Sync + 'static,
    T::Err: Display,
{
    pub async fn open(store: Arc<dyn KeyValueStore>, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let initial = read_value(store.as_ref(), &key, default).await;
        let (value, _) = watch::channel(initial);
        Self { key, store, value }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// The cached value changes even when the write fails; the error is
    /// returned so the caller can decide whether it matters.
    pub async fn set(&self, value: T) -> Result<()> {
        self.value.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value.clone();
                true
            }
        });
        write_value(self.store.as_ref(), &self.key, &value).await
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.value.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/persistent_cell_tests.rs"]
mod tests;
