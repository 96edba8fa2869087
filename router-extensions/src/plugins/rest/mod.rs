//! REST facade.
//!
//! Exposes the schema over conventional HTTP verbs and paths. A [`RestMappingFactory`] builds a
//! mapping for every schema the host announces, and each inbound call is bound to the
//! execution environment the engine hands out for it before the mapping sees it.

pub mod binder;
pub mod docs;
pub mod mapping;
pub mod openapi;
mod swagger_ui;

#[cfg(test)]
pub(crate) mod fake;

use std::ops::ControlFlow;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
pub use binder::ExecutionBinder;
pub use docs::RestDocs;
use futures::FutureExt;
pub use mapping::ExecutionHooks;
pub use mapping::MappingOptions;
pub use mapping::OnRoute;
pub use mapping::RestMapping;
pub use mapping::RestMappingFactory;
pub use mapping::RouteInfo;
pub use openapi::ApiDocument;
pub use openapi::ApiDocumentFactory;
pub use openapi::ApiMetadata;
pub use openapi::OpenApiDocument;
pub use openapi::OpenApiDocumentFactory;
use tower::BoxError;
use tower::ServiceBuilder;
use tower::ServiceExt;

use crate::Schema;
use crate::configuration::RestConfig;
use crate::layers::ServiceBuilderExt;
use crate::plugin::Plugin;
use crate::services::ExecutionEngine;
use crate::services::router;

struct EngineHandle(Arc<dyn ExecutionEngine>);

/// The mapping built for one schema, with its API document when one was generated.
/// Never mutated once published.
struct MappingSnapshot {
    mapping: Arc<dyn RestMapping>,
    document: Option<docs::DocumentSnapshot>,
    schema_id: String,
}

/// Plugin answering REST calls through a schema-specific [`RestMapping`].
///
/// Clones share the published mapping, the announced engine and the binder.
#[derive(Clone)]
pub struct RestFacade {
    config: Arc<RestConfig>,
    factory: Arc<dyn RestMappingFactory>,
    on_route: Option<OnRoute>,
    binder: Arc<ExecutionBinder>,
    engine: Arc<ArcSwapOption<EngineHandle>>,
    mapping: Arc<ArcSwapOption<MappingSnapshot>>,
}

impl RestFacade {
    pub fn new(config: RestConfig, factory: Arc<dyn RestMappingFactory>) -> Self {
        Self {
            config: Arc::new(config),
            factory,
            on_route: None,
            binder: Arc::new(ExecutionBinder::new()),
            engine: Arc::default(),
            mapping: Arc::default(),
        }
    }

    /// Call `on_route` for every route registered by each mapping built from now on.
    pub fn on_route(mut self, on_route: impl Fn(&RouteInfo) + Send + Sync + 'static) -> Self {
        self.on_route = Some(Arc::new(on_route));
        self
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Schema id of the mapping currently served, if any.
    pub fn schema_id(&self) -> Option<String> {
        self.mapping
            .load()
            .as_ref()
            .map(|snapshot| snapshot.schema_id.clone())
    }

    /// Build a mapping for `schema` without publishing it.
    pub(crate) fn build_mapping(
        &self,
        schema: &Arc<Schema>,
        on_route: Option<OnRoute>,
    ) -> Result<Arc<dyn RestMapping>, BoxError> {
        let options = MappingOptions {
            schema: schema.clone(),
            hooks: self.binder.clone(),
            base_path: self.config.base_path.clone(),
            custom_scalars: self.config.custom_scalars.clone(),
            ignore: self.config.ignore.clone(),
            depth_limit: self.config.depth_limit,
            on_route,
        };
        self.factory.create(options)
    }

    /// Serve `mapping` and `document` to every call starting from now on.
    pub(crate) fn publish(
        &self,
        schema: &Schema,
        mapping: Arc<dyn RestMapping>,
        document: Option<docs::DocumentSnapshot>,
    ) {
        self.mapping.store(Some(Arc::new(MappingSnapshot {
            mapping,
            document,
            schema_id: schema.id().to_string(),
        })));
    }

    pub(crate) async fn handle(
        &self,
        request: router::Request,
    ) -> Result<ControlFlow<router::Response, router::Request>, BoxError> {
        let Some(snapshot) = self.mapping.load_full() else {
            tracing::debug!("no REST mapping built yet, passing the call through");
            return Ok(ControlFlow::Continue(request));
        };

        if let Some(engine) = &*self.engine.load() {
            let environment = engine.0.environment(&request.context);
            self.binder
                .bind(&request.context, request.head(), environment);
        } else {
            tracing::warn!(
                schema.id = %snapshot.schema_id,
                "no execution engine announced, REST call is not bound"
            );
        }

        snapshot.mapping.handle(request).await
    }
}

impl Plugin for RestFacade {
    fn engine_ready(&self, engine: Arc<dyn ExecutionEngine>) {
        self.engine.store(Some(Arc::new(EngineHandle(engine))));
    }

    fn schema_changed(&self, schema: &Arc<Schema>) -> Result<(), BoxError> {
        let mapping = self.build_mapping(schema, self.on_route.clone())?;
        self.publish(schema, mapping, None);
        tracing::info!(
            schema.id = schema.id(),
            base_path = %self.config.base_path,
            "REST mapping rebuilt"
        );
        Ok(())
    }

    fn router_service(&self, service: router::BoxService) -> router::BoxService {
        let facade = self.clone();
        ServiceBuilder::new()
            .checkpoint_async(move |request: router::Request| {
                let facade = facade.clone();
                async move { facade.handle(request).await }.boxed()
            })
            .buffered()
            .service(service)
            .boxed()
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
