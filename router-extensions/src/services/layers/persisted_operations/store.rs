use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use tower::BoxError;

/// Where persisted operation documents live.
///
/// The store is authoritative: it is asked on every call and its answer is never cached.
/// `Ok(None)` means the key is unknown; `Err` is a failure of the store itself and ends
/// the call.
#[async_trait]
pub trait PersistedOperationStore: Send + Sync + 'static {
    /// Returns the operation document registered under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError>;
}

#[async_trait]
impl PersistedOperationStore for HashMap<String, String> {
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        Ok(HashMap::get(self, key).cloned())
    }
}

/// A store backed by an async function.
///
/// ```ignore
/// let store = FnStore::new(|key: String| async move {
///     Ok::<_, BoxError>(database.lookup(&key).await?)
/// });
/// ```
pub struct FnStore<F> {
    lookup: F,
}

impl<F> FnStore<F> {
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl<F, Fut> PersistedOperationStore for FnStore<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<String>, BoxError>> + Send + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        (self.lookup)(key.to_owned()).await
    }
}
