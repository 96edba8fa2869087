//! A minimal host: decodes GraphQL over HTTP, runs the plugin pipeline and executes
//! operations with a tenant-aware engine. REST routes come from a small mapping library.

use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use http::HeaderValue;
use http::Method;
use http::header::CONTENT_TYPE;
use router_extensions::Context;
use router_extensions::graphql;
use router_extensions::plugin::PluginPipeline;
use router_extensions::plugins::rest::ExecutionHooks;
use router_extensions::plugins::rest::MappingOptions;
use router_extensions::plugins::rest::RestMapping;
use router_extensions::plugins::rest::RestMappingFactory;
use router_extensions::plugins::rest::RouteInfo;
use router_extensions::services::ExecutionArgs;
use router_extensions::services::ExecutionEngine;
use router_extensions::services::ExecutionEnvironment;
use router_extensions::services::router;
use router_extensions::services::router::RequestHead;
use router_extensions::services::supergraph;
use serde_json_bytes::ByteString;
use serde_json_bytes::Value;
use serde_json_bytes::json;
use tower::BoxError;
use tower::ServiceExt;
use tower::service_fn;

pub(crate) const TENANT_CONTEXT_KEY: &str = "test::tenant";

/// Serve `request` through the full pipeline, the way a host would.
pub(crate) async fn call(
    pipeline: &PluginPipeline,
    request: http::Request<Bytes>,
) -> Result<router::Response, BoxError> {
    let context = Context::new();
    if let Some(tenant) = request
        .headers()
        .get("x-tenant")
        .and_then(|value| value.to_str().ok())
    {
        context.insert(TENANT_CONTEXT_KEY, tenant.to_string())?;
    }
    router_service(pipeline)
        .oneshot(router::Request::from((request, context)))
        .await
}

fn router_service(pipeline: &PluginPipeline) -> router::BoxService {
    let supergraph_pipeline = pipeline.clone();
    let graphql_over_http = service_fn(move |request: router::Request| {
        let pipeline = supergraph_pipeline.clone();
        async move {
            let (parts, body) = request.router_request.into_parts();
            let body: graphql::Request = serde_json::from_slice(&body)?;
            let supergraph_request = supergraph::Request::builder()
                .and_query(body.query)
                .and_operation_name(body.operation_name)
                .variables(body.variables)
                .extensions(body.extensions)
                .context(request.context)
                .uri(parts.uri)
                .method(parts.method)
                .build()?;

            let mut response = pipeline
                .supergraph_service(executor())
                .oneshot(supergraph_request)
                .await?;
            let status = response.response.status();
            let body = response.next_response().await.unwrap_or_default();
            router::Response::builder()
                .body(serde_json::to_vec(&body)?)
                .status_code(status)
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .context(response.context)
                .build()
        }
    });
    pipeline.router_service(graphql_over_http.boxed())
}

/// Answers every GraphQL call with the document it was asked to run.
fn executor() -> supergraph::BoxService {
    service_fn(|request: supergraph::Request| async move {
        let query = request.supergraph_request.body().query.clone();
        supergraph::Response::builder()
            .data(json!({ "executed": query }))
            .context(request.context)
            .build()
    })
    .boxed()
}

pub(crate) fn get(path: &str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(Method::GET)
        .uri(format!("http://localhost{path}"))
        .body(Bytes::new())
        .unwrap()
}

pub(crate) fn get_as(tenant: &str, path: &str) -> http::Request<Bytes> {
    let mut request = get(path);
    request
        .headers_mut()
        .insert("x-tenant", HeaderValue::from_str(tenant).unwrap());
    request
}

pub(crate) fn post_graphql(body: serde_json::Value) -> http::Request<Bytes> {
    http::Request::builder()
        .method(Method::POST)
        .uri("http://localhost/graphql")
        .header(CONTENT_TYPE, "application/json")
        .body(Bytes::from(body.to_string()))
        .unwrap()
}

pub(crate) fn body_json(response: &router::Response) -> serde_json::Value {
    serde_json::from_slice(response.response.body()).unwrap()
}

/// Hands each call the environment of the tenant found in its context.
pub(crate) struct TenantEngine;

impl ExecutionEngine for TenantEngine {
    fn environment(&self, call: &Context) -> Arc<dyn ExecutionEnvironment> {
        let tenant = call
            .get::<_, String>(TENANT_CONTEXT_KEY)
            .ok()
            .flatten()
            .unwrap_or_else(|| "anonymous".to_string());
        Arc::new(TenantEnvironment { tenant })
    }
}

struct TenantEnvironment {
    tenant: String,
}

#[async_trait]
impl ExecutionEnvironment for TenantEnvironment {
    async fn context(&self, request: &RequestHead) -> Result<Context, BoxError> {
        let context_value = Context::new();
        context_value.insert("tenant", self.tenant.clone())?;
        context_value.insert("path", request.uri.path().to_string())?;
        Ok(context_value)
    }

    async fn execute(&self, args: ExecutionArgs) -> Result<graphql::Response, BoxError> {
        // let concurrent calls interleave
        tokio::task::yield_now().await;
        Ok(graphql::Response::builder()
            .data(json!({
                "tenant": self.tenant,
                "seen_tenant": args.context_value.get::<_, String>("tenant")?.unwrap_or_default(),
                "document": args.document,
                "variables": args.variables,
            }))
            .build())
    }

    async fn subscribe(&self, args: ExecutionArgs) -> Result<graphql::ResponseStream, BoxError> {
        let tenant = self.tenant.clone();
        let document = args.document;
        Ok(stream::iter(0..3)
            .map(move |tick| {
                graphql::Response::builder()
                    .data(json!({ "tenant": tenant, "document": document, "tick": tick }))
                    .build()
            })
            .boxed())
    }
}

/// Maps `Query.me`, `Query.user(id)` and `Subscription.ticks`, plus a route that hands the
/// engine a context value it never produced.
#[derive(Default)]
pub(crate) struct TinyRestLibrary;

struct Route {
    info: RouteInfo,
    document: &'static str,
    subscription: bool,
}

fn routes(options: &MappingOptions) -> Vec<Route> {
    let mut routes = vec![
        Route {
            info: RouteInfo::builder()
                .method(Method::GET)
                .path("/me")
                .operation_name("me_query")
                .tag("Query")
                .build(),
            document: "query me_query { me }",
            subscription: false,
        },
        Route {
            info: RouteInfo::builder()
                .method(Method::GET)
                .path("/user/:id")
                .operation_name("user_query")
                .description("A user by id")
                .tag("Query")
                .build(),
            document: "query user_query($id: ID!) { user(id: $id) }",
            subscription: false,
        },
        Route {
            info: RouteInfo::builder()
                .method(Method::GET)
                .path("/ticks")
                .operation_name("ticks_subscription")
                .tag("Subscription")
                .build(),
            document: "subscription ticks_subscription { ticks }",
            subscription: true,
        },
        Route {
            info: RouteInfo::builder()
                .method(Method::GET)
                .path("/forged")
                .operation_name("forged_query")
                .build(),
            document: "query forged_query { me }",
            subscription: false,
        },
    ];
    routes.retain(|route| {
        let field = route.info.operation_name.split('_').next().unwrap_or_default();
        !options
            .ignore
            .iter()
            .any(|ignored| ignored.rsplit('.').next() == Some(field))
    });
    routes
}

impl RestMappingFactory for TinyRestLibrary {
    fn create(&self, options: MappingOptions) -> Result<Arc<dyn RestMapping>, BoxError> {
        if !options.schema.raw_sdl().contains("type Query") {
            return Err("schema has no query type".into());
        }
        let routes = routes(&options);
        if let Some(on_route) = &options.on_route {
            for route in &routes {
                on_route(&route.info);
            }
        }
        Ok(Arc::new(TinyRestMapping {
            base_path: options.base_path,
            hooks: options.hooks,
            routes,
        }))
    }
}

type Variables = serde_json_bytes::Map<ByteString, Value>;

struct TinyRestMapping {
    base_path: String,
    hooks: Arc<dyn ExecutionHooks>,
    routes: Vec<Route>,
}

impl TinyRestMapping {
    /// The route matching `path`, with its path parameters as variables.
    fn find(&self, method: &Method, path: &str) -> Option<(&Route, Variables)> {
        let path = path.strip_prefix(&self.base_path)?;
        let segments: Vec<_> = path.split('/').collect();
        self.routes.iter().find_map(|route| {
            if route.info.method != method {
                return None;
            }
            let pattern: Vec<_> = route.info.path.split('/').collect();
            if pattern.len() != segments.len() {
                return None;
            }
            let mut variables = Variables::new();
            for (expected, actual) in pattern.iter().zip(&segments) {
                match expected.strip_prefix(':') {
                    Some(name) => {
                        variables.insert(
                            ByteString::from(name),
                            Value::String(ByteString::from(*actual)),
                        );
                    }
                    None if expected != actual => return None,
                    None => {}
                }
            }
            Some((route, variables))
        })
    }
}

#[async_trait]
impl RestMapping for TinyRestMapping {
    async fn handle(
        &self,
        request: router::Request,
    ) -> Result<ControlFlow<router::Response, router::Request>, BoxError> {
        let Some((route, variables)) = self.find(
            request.router_request.method(),
            request.router_request.uri().path(),
        ) else {
            return Ok(ControlFlow::Continue(request));
        };

        let context_value = if route.info.operation_name == "forged_query" {
            Context::new()
        } else {
            self.hooks.context(&request.context).await?
        };
        let args = ExecutionArgs::builder()
            .document(route.document)
            .operation_name(route.info.operation_name.clone())
            .variables(variables)
            .context_value(context_value)
            .build();

        let body = if route.subscription {
            let responses: Vec<_> = self.hooks.subscribe(args).await?.collect().await;
            serde_json::to_vec(&responses)?
        } else {
            serde_json::to_vec(&self.hooks.execute(args).await?)?
        };
        Ok(ControlFlow::Break(
            router::Response::builder()
                .body(body)
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .context(request.context)
                .build()?,
        ))
    }
}
