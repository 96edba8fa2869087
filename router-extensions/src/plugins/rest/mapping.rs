//! The contract with the REST mapping library.
//!
//! The library derives REST routes from a schema and answers REST calls by running GraphQL
//! operations. It knows nothing about the host engine: it receives [`ExecutionHooks`] to build
//! per-call contexts and to execute operations.

use std::collections::HashMap;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use tower::BoxError;

use crate::Context;
use crate::Schema;
use crate::graphql;
use crate::services::ExecutionArgs;
use crate::services::router;

/// How the mapping library reaches the execution engine.
#[async_trait]
pub trait ExecutionHooks: Send + Sync + 'static {
    /// Build the context value for the call whose host-created context is `call`.
    async fn context(&self, call: &Context) -> Result<Context, BoxError>;

    /// Run a query or mutation. `args.context_value` must come from [`ExecutionHooks::context`].
    async fn execute(&self, args: ExecutionArgs) -> Result<graphql::Response, BoxError>;

    /// Start a subscription. `args.context_value` must come from [`ExecutionHooks::context`].
    async fn subscribe(&self, args: ExecutionArgs) -> Result<graphql::ResponseStream, BoxError>;
}

/// A REST route derived from the schema.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct RouteInfo {
    pub method: Method,
    /// Path relative to the base path, with `:name` path parameters.
    pub path: String,
    /// Name of the operation the route runs.
    pub operation_name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

#[buildstructor::buildstructor]
impl RouteInfo {
    #[builder(visibility = "pub")]
    fn new(
        method: Method,
        path: String,
        operation_name: String,
        description: Option<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            method,
            path,
            operation_name,
            description,
            tags,
        }
    }
}

/// Called once for every route the mapping registers.
pub type OnRoute = Arc<dyn Fn(&RouteInfo) + Send + Sync + 'static>;

/// Everything the mapping library needs to build a mapping.
#[non_exhaustive]
pub struct MappingOptions {
    pub schema: Arc<Schema>,
    pub hooks: Arc<dyn ExecutionHooks>,
    /// Prefix of every REST path.
    pub base_path: String,
    /// JSON schema to use for each custom scalar.
    pub custom_scalars: HashMap<String, serde_json::Value>,
    /// `Type.field` coordinates that get no route.
    pub ignore: Vec<String>,
    /// Maximum selection depth of generated operations.
    pub depth_limit: Option<usize>,
    pub on_route: Option<OnRoute>,
}

impl fmt::Debug for MappingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingOptions")
            .field("schema", &self.schema)
            .field("base_path", &self.base_path)
            .field("custom_scalars", &self.custom_scalars)
            .field("ignore", &self.ignore)
            .field("depth_limit", &self.depth_limit)
            .field("on_route", &self.on_route.is_some())
            .finish_non_exhaustive()
    }
}

/// A schema-specific REST mapping.
#[async_trait]
pub trait RestMapping: Send + Sync + 'static {
    /// Answer `request` if it targets one of the mapped routes, or hand it back untouched.
    async fn handle(
        &self,
        request: router::Request,
    ) -> Result<ControlFlow<router::Response, router::Request>, BoxError>;
}

/// Builds a [`RestMapping`] for a schema.
pub trait RestMappingFactory: Send + Sync + 'static {
    fn create(&self, options: MappingOptions) -> Result<Arc<dyn RestMapping>, BoxError>;
}
