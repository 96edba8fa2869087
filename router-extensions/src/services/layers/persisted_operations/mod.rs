//! Persisted operations gate.
//!
//! Only operation documents registered in a [`PersistedOperationStore`] may run. A call either
//! carries operation text, which is accepted or refused by the arbitrary operations policy, or
//! a persisted operation key, which is swapped for the stored document before execution.

mod id_extractor;
mod manifest;
mod policy;
mod store;

use std::ops::ControlFlow;
use std::sync::Arc;

use futures::future::BoxFuture;
pub use id_extractor::ExtractPersistedOperationId;
pub use id_extractor::default_extract_persisted_operation_id;
pub use manifest::ManifestOperation;
pub use manifest::ManifestStore;
pub use manifest::PersistedQueryManifest;
pub use policy::AllowArbitraryOperations;
pub use store::FnStore;
pub use store::PersistedOperationStore;
use tower::BoxError;
use tower::Layer;
use tower::Service;
use tower::buffer::Buffer;

use crate::Context;
use crate::error::PersistedOperationError;
use crate::graphql;
use crate::layers::DEFAULT_BUFFER_SIZE;
use crate::layers::async_checkpoint::AsyncCheckpointService;
use crate::services::supergraph;

/// Context key holding the key of the persisted operation a call resolved to.
pub const PERSISTED_OPERATION_ID_CONTEXT_KEY: &str = "persisted_operations::id";

/// [`Layer`] enforcing persisted operations on the supergraph stage.
#[derive(Clone)]
pub struct PersistedOperationsLayer {
    store: Arc<dyn PersistedOperationStore>,
    allow_arbitrary_operations: AllowArbitraryOperations,
    extract_persisted_operation_id: ExtractPersistedOperationId,
    log_rejections: bool,
}

impl PersistedOperationsLayer {
    /// A gate over `store` that refuses operation text and reads keys with
    /// [`default_extract_persisted_operation_id`].
    pub fn new(store: Arc<dyn PersistedOperationStore>) -> Self {
        Self {
            store,
            allow_arbitrary_operations: AllowArbitraryOperations::default(),
            extract_persisted_operation_id: id_extractor::default_extractor(),
            log_rejections: true,
        }
    }

    pub fn allow_arbitrary_operations(
        mut self,
        policy: impl Into<AllowArbitraryOperations>,
    ) -> Self {
        self.allow_arbitrary_operations = policy.into();
        self
    }

    pub fn extract_persisted_operation_id(
        mut self,
        extract: impl Fn(&graphql::Request) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.extract_persisted_operation_id = Arc::new(extract);
        self
    }

    /// Log refused calls at `warn`. On by default.
    pub fn log_rejections(mut self, log_rejections: bool) -> Self {
        self.log_rejections = log_rejections;
        self
    }

    /// Decides whether `request` runs, and with which document.
    pub(crate) async fn persisted_operation_request(
        &self,
        mut request: supergraph::Request,
    ) -> Result<ControlFlow<supergraph::Response, supergraph::Request>, BoxError> {
        if request.supergraph_request.body().operation_text().is_some() {
            return if self.allow_arbitrary_operations.evaluate(&request).await {
                tracing::trace!("persisted operations: arbitrary operation allowed");
                Ok(ControlFlow::Continue(request))
            } else {
                self.reject(PersistedOperationError::PersistedQueryOnly, request.context)
            };
        }

        let Some(id) = (self.extract_persisted_operation_id)(request.supergraph_request.body())
        else {
            tracing::trace!("persisted operations: no operation id in request");
            return self.reject(
                PersistedOperationError::PersistedQueryNotFound,
                request.context,
            );
        };

        let Some(document) = self.store.get(&id).await? else {
            tracing::trace!(id = %id, "persisted operations: unknown operation id");
            return self.reject(
                PersistedOperationError::PersistedQueryNotFound,
                request.context,
            );
        };

        tracing::trace!(id = %id, "persisted operations: operation found");
        let body = request.supergraph_request.body_mut();
        let variables = std::mem::take(&mut body.variables);
        let extensions = std::mem::take(&mut body.extensions);
        *body = graphql::Request::builder()
            .query(document)
            .variables(variables)
            .extensions(extensions)
            .build();
        request
            .context
            .insert(PERSISTED_OPERATION_ID_CONTEXT_KEY, id)?;
        Ok(ControlFlow::Continue(request))
    }

    fn reject(
        &self,
        error: PersistedOperationError,
        context: Context,
    ) -> Result<ControlFlow<supergraph::Response, supergraph::Request>, BoxError> {
        if self.log_rejections {
            tracing::warn!(%error, "persisted operations: request rejected");
        }
        let response = supergraph::Response::error_builder()
            .error(error.to_graphql_error())
            .status_code(error.status_code())
            .context(context)
            .build()?;
        Ok(ControlFlow::Break(response))
    }
}

impl<S> Layer<S> for PersistedOperationsLayer
where
    S: Service<supergraph::Request, Response = supergraph::Response, Error = BoxError>
        + Send
        + 'static,
    <S as Service<supergraph::Request>>::Future: Send + 'static,
{
    type Service = AsyncCheckpointService<
        Buffer<S, supergraph::Request>,
        BoxFuture<
            'static,
            Result<ControlFlow<supergraph::Response, supergraph::Request>, BoxError>,
        >,
        supergraph::Request,
    >;

    fn layer(&self, service: S) -> Self::Service {
        let gate = self.clone();
        AsyncCheckpointService::new(
            move |request| {
                let gate = gate.clone();
                Box::pin(async move { gate.persisted_operation_request(request).await })
                    as BoxFuture<
                        'static,
                        Result<ControlFlow<supergraph::Response, supergraph::Request>, BoxError>,
                    >
            },
            Buffer::new(service, DEFAULT_BUFFER_SIZE),
        )
    }
}
