//! Per-call correlation between REST calls and execution environments.
//!
//! The REST mapping is built once per schema and shared by every call, but contexts must be
//! built and operations executed by the environment the engine produced for *that* call. The
//! binder restores the link in two steps, both keyed by context identity:
//!
//! 1. the host-created call context is bound to the call's request head and environment,
//! 2. each context value derived from it is associated with that same environment, so that
//!    `execute` and `subscribe` can find it again.
//!
//! Both links are stored in the keyed context itself, so they are dropped together with it,
//! whichever way the call ends. Nothing outlives the call.

use std::sync::Arc;

use async_trait::async_trait;
use tower::BoxError;

use crate::Context;
use crate::context::slot::ContextSlot;
use crate::error::BindingError;
use crate::graphql;
use crate::plugins::rest::mapping::ExecutionHooks;
use crate::services::ExecutionArgs;
use crate::services::ExecutionEnvironment;
use crate::services::router::RequestHead;

#[derive(Clone)]
struct Binding {
    head: RequestHead,
    environment: Arc<dyn ExecutionEnvironment>,
}

/// Correlates REST calls with the execution environment they were bound to.
#[derive(Default)]
pub struct ExecutionBinder {
    requests: ContextSlot<Binding>,
    context_values: ContextSlot<Arc<dyn ExecutionEnvironment>>,
}

impl ExecutionBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the call owning `call` to `environment`. A second bind for the same call replaces
    /// the first.
    pub fn bind(
        &self,
        call: &Context,
        head: RequestHead,
        environment: Arc<dyn ExecutionEnvironment>,
    ) {
        self.requests.insert(call, Binding { head, environment });
    }

    /// Build a context value for `call` with the environment it was bound to.
    ///
    /// Fails with [`BindingError::ContextBindingMissing`] if the call was never bound.
    pub async fn derive_context(&self, call: &Context) -> Result<Context, BoxError> {
        let Some(Binding { head, environment }) = self.requests.get(call) else {
            tracing::warn!("REST call has no bound execution environment");
            return Err(BindingError::ContextBindingMissing.into());
        };
        let context_value = environment.context(&head).await?;
        self.context_values.insert(&context_value, environment);
        tracing::trace!("derived context value for REST call");
        Ok(context_value)
    }

    /// The environment `context_value` was derived with.
    ///
    /// Fails with [`BindingError::IllegalInvocation`] for context values this binder did not
    /// produce, or whose call has ended.
    pub fn resolve_environment(
        &self,
        context_value: &Context,
    ) -> Result<Arc<dyn ExecutionEnvironment>, BindingError> {
        self.context_values
            .get(context_value)
            .ok_or(BindingError::IllegalInvocation)
    }

    /// Execute with the environment `args.context_value` was derived with.
    pub async fn execute(&self, args: ExecutionArgs) -> Result<graphql::Response, BoxError> {
        let environment = self.resolve_environment(&args.context_value)?;
        environment.execute(args).await
    }

    /// Subscribe with the environment `args.context_value` was derived with.
    pub async fn subscribe(
        &self,
        args: ExecutionArgs,
    ) -> Result<graphql::ResponseStream, BoxError> {
        let environment = self.resolve_environment(&args.context_value)?;
        environment.subscribe(args).await
    }
}

#[async_trait]
impl ExecutionHooks for ExecutionBinder {
    async fn context(&self, call: &Context) -> Result<Context, BoxError> {
        self.derive_context(call).await
    }

    async fn execute(&self, args: ExecutionArgs) -> Result<graphql::Response, BoxError> {
        ExecutionBinder::execute(self, args).await
    }

    async fn subscribe(&self, args: ExecutionArgs) -> Result<graphql::ResponseStream, BoxError> {
        ExecutionBinder::subscribe(self, args).await
    }
}
