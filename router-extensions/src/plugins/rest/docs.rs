//! REST facade with generated API documentation.
//!
//! Every schema change produces a fresh API document. Each route the new mapping registers is
//! added to it, and the finished document is published in the same snapshot as the mapping,
//! so a call never sees a mapping next to the document of another schema. The document is
//! served as JSON, and rendered as a Swagger UI page.

use std::ops::ControlFlow;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use http::header::CONTENT_TYPE;
use parking_lot::Mutex;
use tower::BoxError;
use tower::ServiceBuilder;
use tower::ServiceExt;

use super::RestFacade;
use super::swagger_ui::swagger_ui_page_content;
use crate::Schema;
use crate::configuration::RestDocsConfig;
use crate::layers::ServiceBuilderExt;
use crate::plugin::Plugin;
use crate::plugins::rest::mapping::OnRoute;
use crate::plugins::rest::mapping::RestMappingFactory;
use crate::plugins::rest::mapping::RouteInfo;
use crate::plugins::rest::openapi::ApiDocumentFactory;
use crate::plugins::rest::openapi::OpenApiDocumentFactory;
use crate::services::APPLICATION_JSON_HEADER_VALUE;
use crate::services::ExecutionEngine;
use crate::services::TEXT_HTML_HEADER_VALUE;
use crate::services::router;

/// The rendered documentation for one schema.
pub(crate) struct DocumentSnapshot {
    json: Bytes,
    page: Bytes,
}

/// [`RestFacade`] that also serves the API document of the current schema.
#[derive(Clone)]
pub struct RestDocs {
    facade: RestFacade,
    config: Arc<RestDocsConfig>,
    document_factory: Arc<dyn ApiDocumentFactory>,
    on_route: Option<OnRoute>,
}

impl RestDocs {
    /// Documented with [`OpenApiDocumentFactory`] unless told otherwise.
    pub fn new(config: RestDocsConfig, factory: Arc<dyn RestMappingFactory>) -> Self {
        Self {
            facade: RestFacade::new(config.rest.clone(), factory),
            config: Arc::new(config),
            document_factory: Arc::new(OpenApiDocumentFactory),
            on_route: None,
        }
    }

    pub fn document_factory(mut self, document_factory: Arc<dyn ApiDocumentFactory>) -> Self {
        self.document_factory = document_factory;
        self
    }

    /// Call `on_route` for every route, after it was added to the document.
    pub fn on_route(mut self, on_route: impl Fn(&RouteInfo) + Send + Sync + 'static) -> Self {
        self.on_route = Some(Arc::new(on_route));
        self
    }

    pub fn facade(&self) -> &RestFacade {
        &self.facade
    }

    fn serve_docs(
        &self,
        request: router::Request,
    ) -> Result<ControlFlow<router::Response, router::Request>, BoxError> {
        if request.router_request.method() != Method::GET {
            return Ok(ControlFlow::Continue(request));
        }
        let path = request.router_request.uri().path();
        let serve_json = if path == self.config.swagger_json_endpoint {
            true
        } else if path == self.config.swagger_ui_endpoint {
            false
        } else {
            return Ok(ControlFlow::Continue(request));
        };

        let snapshot = self.facade.mapping.load_full();
        let Some(document) = snapshot.as_ref().and_then(|snapshot| snapshot.document.as_ref())
        else {
            tracing::debug!("no API document built yet, passing the call through");
            return Ok(ControlFlow::Continue(request));
        };
        let (body, content_type) = if serve_json {
            (document.json.clone(), APPLICATION_JSON_HEADER_VALUE.clone())
        } else {
            (document.page.clone(), TEXT_HTML_HEADER_VALUE.clone())
        };
        let response = router::Response::builder()
            .body(body)
            .header(CONTENT_TYPE, content_type)
            .context(request.context)
            .build()?;
        Ok(ControlFlow::Break(response))
    }
}

impl Plugin for RestDocs {
    fn engine_ready(&self, engine: Arc<dyn ExecutionEngine>) {
        self.facade.engine_ready(engine);
    }

    fn schema_changed(&self, schema: &Arc<Schema>) -> Result<(), BoxError> {
        let document = Arc::new(Mutex::new(
            self.document_factory
                .create(schema, &self.config.metadata()),
        ));

        let route_document = document.clone();
        let base_path = self.config.rest.base_path.clone();
        let user_on_route = self.on_route.clone();
        let on_route: OnRoute = Arc::new(move |route: &RouteInfo| {
            route_document.lock().add_route(route, &base_path);
            if let Some(on_route) = &user_on_route {
                on_route(route);
            }
        });

        let mapping = self.facade.build_mapping(schema, Some(on_route))?;
        let document = document.lock().get();
        let snapshot = DocumentSnapshot {
            json: Bytes::from(serde_json::to_vec(&document)?),
            page: Bytes::from(swagger_ui_page_content(&document)?),
        };

        self.facade.publish(schema, mapping, Some(snapshot));
        tracing::info!(
            schema.id = schema.id(),
            base_path = %self.config.rest.base_path,
            "REST mapping and API document rebuilt"
        );
        Ok(())
    }

    fn router_service(&self, service: router::BoxService) -> router::BoxService {
        let docs = self.clone();
        ServiceBuilder::new()
            .checkpoint(move |request: router::Request| docs.serve_docs(request))
            .service(self.facade.router_service(service))
            .boxed()
    }

    fn name(&self) -> &'static str {
        "rest_docs"
    }
}
