use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::services::supergraph;

type Decide = Arc<dyn Fn(&supergraph::Request) -> BoxFuture<'static, bool> + Send + Sync>;

/// Whether a call may carry its own operation text instead of a persisted key.
#[derive(Clone)]
pub enum AllowArbitraryOperations {
    /// The same answer for every call.
    Static(bool),
    /// Decided per call from the inbound request.
    Dynamic(Decide),
}

impl AllowArbitraryOperations {
    /// Decide per call. The closure sees the request before any parameter rewriting.
    pub fn dynamic<F, Fut>(decide: F) -> Self
    where
        F: Fn(&supergraph::Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::Dynamic(Arc::new(move |request: &supergraph::Request| {
            decide(request).boxed()
        }))
    }

    pub(crate) async fn evaluate(&self, request: &supergraph::Request) -> bool {
        match self {
            AllowArbitraryOperations::Static(allowed) => *allowed,
            AllowArbitraryOperations::Dynamic(decide) => decide(request).await,
        }
    }
}

impl Default for AllowArbitraryOperations {
    fn default() -> Self {
        Self::Static(false)
    }
}

impl From<bool> for AllowArbitraryOperations {
    fn from(allowed: bool) -> Self {
        Self::Static(allowed)
    }
}

impl fmt::Debug for AllowArbitraryOperations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(allowed) => f.debug_tuple("Static").field(allowed).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}
