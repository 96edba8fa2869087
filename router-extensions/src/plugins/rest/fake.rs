//! A mapping library stand-in for tests.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use http::Method;
use parking_lot::Mutex;
use serde_json_bytes::json;
use tokio::sync::Notify;
use tower::BoxError;

use crate::Context;
use crate::graphql;
use crate::plugins::rest::mapping::ExecutionHooks;
use crate::plugins::rest::mapping::MappingOptions;
use crate::plugins::rest::mapping::RestMapping;
use crate::plugins::rest::mapping::RestMappingFactory;
use crate::plugins::rest::mapping::RouteInfo;
use crate::services::ExecutionArgs;
use crate::services::ExecutionEnvironment;
use crate::services::router;
use crate::services::router::RequestHead;

/// What a mapping was built with.
#[derive(Debug)]
pub(crate) struct BuiltMapping {
    pub(crate) schema_id: String,
    pub(crate) base_path: String,
    pub(crate) ignore: Vec<String>,
    pub(crate) depth_limit: Option<usize>,
}

/// Registers a single `GET {base_path}/me` route running `{ me }`.
#[derive(Default)]
pub(crate) struct FakeMappingFactory {
    pub(crate) built: Mutex<Vec<BuiltMapping>>,
    fail: AtomicBool,
}

impl FakeMappingFactory {
    pub(crate) fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl RestMappingFactory for FakeMappingFactory {
    fn create(&self, options: MappingOptions) -> Result<Arc<dyn RestMapping>, BoxError> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err("schema has no mappable fields".into());
        }
        self.built.lock().push(BuiltMapping {
            schema_id: options.schema.id().to_string(),
            base_path: options.base_path.clone(),
            ignore: options.ignore.clone(),
            depth_limit: options.depth_limit,
        });

        let route = RouteInfo::builder()
            .method(Method::GET)
            .path("/me")
            .operation_name("me")
            .description("The current user")
            .tag("Query")
            .build();
        if let Some(on_route) = &options.on_route {
            on_route(&route);
        }

        Ok(Arc::new(FakeMapping {
            route: format!("{}{}", options.base_path, route.path),
            sdl: options.schema.raw_sdl().to_string(),
            hooks: options.hooks,
        }))
    }
}

struct FakeMapping {
    route: String,
    sdl: String,
    hooks: Arc<dyn ExecutionHooks>,
}

#[async_trait]
impl RestMapping for FakeMapping {
    async fn handle(
        &self,
        request: router::Request,
    ) -> Result<ControlFlow<router::Response, router::Request>, BoxError> {
        if request.router_request.method() != Method::GET
            || request.router_request.uri().path() != self.route
        {
            return Ok(ControlFlow::Continue(request));
        }

        let context_value = self.hooks.context(&request.context).await?;
        let response = self
            .hooks
            .execute(
                ExecutionArgs::builder()
                    .document("{ me }")
                    .context_value(context_value)
                    .build(),
            )
            .await?;
        let body = serde_json::json!({ "schema": self.sdl, "response": response });
        Ok(ControlFlow::Break(
            router::Response::builder()
                .body(serde_json::to_vec(&body)?)
                .context(request.context)
                .build()?,
        ))
    }
}

/// An environment whose `execute` waits for [`GatedEnvironment::release`].
pub(crate) struct GatedEnvironment {
    label: &'static str,
    pub(crate) entered: Notify,
    pub(crate) release: Notify,
}

impl GatedEnvironment {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            label,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl ExecutionEnvironment for GatedEnvironment {
    async fn context(&self, _request: &RequestHead) -> Result<Context, BoxError> {
        Ok(Context::new())
    }

    async fn execute(&self, args: ExecutionArgs) -> Result<graphql::Response, BoxError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(graphql::Response::builder()
            .data(json!({ "environment": self.label, "document": args.document }))
            .build())
    }

    async fn subscribe(&self, _args: ExecutionArgs) -> Result<graphql::ResponseStream, BoxError> {
        Err("subscriptions are not supported".into())
    }
}
