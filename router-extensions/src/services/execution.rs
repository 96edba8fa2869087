//! The execution engine seen from the extensions.
//!
//! The host owns the engine. Each engine lifecycle event (startup, schema change) yields an
//! [`ExecutionEngine`], and the engine hands out one [`ExecutionEnvironment`] per call: the
//! context builder, `execute` and `subscribe` with every engine-level behavior already installed.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;
use tower::BoxError;

use crate::Context;
use crate::graphql;
use crate::json_ext::Object;
use crate::services::router::RequestHead;

/// Arguments of a single `execute` or `subscribe` invocation.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct ExecutionArgs {
    /// The operation document to run.
    pub document: String,
    /// Selects the operation when the document holds several.
    pub operation_name: Option<String>,
    pub variables: Object,
    /// The value produced by the environment's context builder for this call.
    pub context_value: Context,
}

#[buildstructor::buildstructor]
impl ExecutionArgs {
    #[builder(visibility = "pub")]
    fn new(
        document: String,
        operation_name: Option<String>,
        // Skip the `Object` type alias in order to use buildstructor’s map special-casing
        variables: JsonMap<ByteString, Value>,
        context_value: Context,
    ) -> Self {
        Self {
            document,
            operation_name,
            variables,
            context_value,
        }
    }
}

/// Context construction and execution for one call, as the engine would perform it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionEnvironment: Send + Sync + 'static {
    /// Build the context value for a call from its request head.
    async fn context(&self, request: &RequestHead) -> Result<Context, BoxError>;

    /// Run a query or mutation to completion.
    async fn execute(&self, args: ExecutionArgs) -> Result<graphql::Response, BoxError>;

    /// Start a subscription.
    async fn subscribe(&self, args: ExecutionArgs) -> Result<graphql::ResponseStream, BoxError>;
}

/// The host's execution engine, announced once it is initialized.
#[cfg_attr(test, mockall::automock)]
pub trait ExecutionEngine: Send + Sync + 'static {
    /// The environment to use for the call whose host-created context is `call`.
    fn environment(&self, call: &Context) -> Arc<dyn ExecutionEnvironment>;
}
