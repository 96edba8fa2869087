//! Provide a [`Context`] for the plugin chain of responsibilities.
//!
//! Router plugins accept a [`Context`] when invoked and this contains a DashMap which
//! allows additional data to be passed back and forth along the request invocation pipeline.
//!
//! A [`Context`] is created once per call. Clones share the same storage, so anything
//! attached to it lives exactly as long as the call: see [`Context::ptr_eq`].

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tower::BoxError;

use crate::json_ext::Value;

pub(crate) mod slot;

/// Holds [`Context`] entries.
pub(crate) type Entries = DashMap<String, Value>;

#[derive(Debug, Default)]
struct Storage {
    entries: Entries,
    extensions: parking_lot::Mutex<http::Extensions>,
}

/// Context for one call flowing through the pipeline.
#[derive(Clone, Debug, Default)]
pub struct Context {
    storage: Arc<Storage>,
}

impl Context {
    /// Create a new, empty context. Every call gets its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`, deserialized as `V`.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>, BoxError>
    where
        K: Into<String>,
        V: for<'de> serde::Deserialize<'de>,
    {
        self.storage
            .entries
            .get(&key.into())
            .map(|v| serde_json_bytes::from_value(v.value().clone()))
            .transpose()
            .map_err(|e| e.into())
    }

    /// Stores `value` under `key`, returning the previous value if there was one.
    pub fn insert<K, V>(&self, key: K, value: V) -> Result<Option<V>, BoxError>
    where
        K: Into<String>,
        V: for<'de> serde::Deserialize<'de> + Serialize,
    {
        match serde_json_bytes::to_value(value) {
            Ok(value) => self
                .storage
                .entries
                .insert(key.into(), value)
                .map(|v| serde_json_bytes::from_value(v))
                .transpose()
                .map_err(|e| e.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns `true` if the context has an entry for `key`.
    pub fn contains_key<K>(&self, key: K) -> bool
    where
        K: Into<String>,
    {
        self.storage.entries.contains_key(&key.into())
    }

    /// Non-serializable data attached to this call.
    ///
    /// The lock is released once the closure completes.
    pub fn with_extensions<T>(&self, func: impl FnOnce(&mut http::Extensions) -> T) -> T {
        let mut extensions = self.storage.extensions.lock();
        func(&mut extensions)
    }

    /// Returns `true` if both contexts belong to the same call.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }
}
