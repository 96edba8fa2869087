use std::sync::Arc;

use http::StatusCode;
use parking_lot::Mutex;
use router_extensions::Schema;
use router_extensions::configuration::RestConfig;
use router_extensions::error::BindingError;
use router_extensions::plugin::Plugin;
use router_extensions::plugin::PluginPipeline;
use router_extensions::plugins::rest::RestFacade;
use serde_json::json;

use super::common::TenantEngine;
use super::common::TinyRestLibrary;
use super::common::body_json;
use super::common::call;
use super::common::get;
use super::common::get_as;
use super::common::post_graphql;

const SDL: &str = "type Query { me: String user(id: ID!): String }";

fn ready_pipeline(facade: RestFacade) -> PluginPipeline {
    let pipeline = PluginPipeline::new().with_plugin(facade);
    pipeline.engine_ready(Arc::new(TenantEngine));
    pipeline.schema_changed(Schema::new(SDL)).unwrap();
    pipeline
}

fn facade() -> RestFacade {
    RestFacade::new(RestConfig::default(), Arc::new(TinyRestLibrary))
}

#[tokio::test]
async fn rest_calls_execute_with_their_own_context() {
    let pipeline = ready_pipeline(facade());

    let response = call(&pipeline, get_as("acme", "/rest/user/42")).await.unwrap();
    assert_eq!(response.response.status(), StatusCode::OK);
    assert_eq!(
        body_json(&response),
        json!({
            "data": {
                "tenant": "acme",
                "seen_tenant": "acme",
                "document": "query user_query($id: ID!) { user(id: $id) }",
                "variables": { "id": "42" },
            }
        })
    );
}

#[tokio::test]
async fn subscriptions_run_in_the_bound_environment() {
    let pipeline = ready_pipeline(facade());

    let response = call(&pipeline, get_as("acme", "/rest/ticks")).await.unwrap();
    let ticks = body_json(&response);
    assert_eq!(ticks.as_array().unwrap().len(), 3);
    assert_eq!(ticks[2]["data"]["tenant"], "acme");
    assert_eq!(ticks[2]["data"]["tick"], 2);
}

#[tokio::test]
async fn graphql_calls_fall_through() {
    let pipeline = ready_pipeline(facade());

    let response = call(&pipeline, post_graphql(json!({ "query": "{ me }" })))
        .await
        .unwrap();
    assert_eq!(body_json(&response), json!({ "data": { "executed": "{ me }" } }));
}

#[tokio::test]
async fn concurrent_calls_never_see_each_other() {
    let pipeline = ready_pipeline(facade());

    let calls = (0..50).map(|n| {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            let tenant = format!("tenant-{}", n % 7);
            let response = call(&pipeline, get_as(&tenant, &format!("/rest/user/{n}")))
                .await
                .unwrap();
            (tenant, n, body_json(&response))
        })
    });

    for call in futures::future::join_all(calls).await {
        let (tenant, n, body) = call.unwrap();
        assert_eq!(body["data"]["tenant"], tenant.as_str());
        assert_eq!(body["data"]["seen_tenant"], tenant.as_str());
        assert_eq!(body["data"]["variables"]["id"], n.to_string().as_str());
    }
}

#[tokio::test]
async fn forged_context_values_are_refused() {
    let pipeline = ready_pipeline(facade());

    let error = call(&pipeline, get("/rest/forged")).await.unwrap_err();
    assert_eq!(
        error.downcast_ref::<BindingError>(),
        Some(&BindingError::IllegalInvocation)
    );
}

#[tokio::test]
async fn nothing_is_mapped_before_the_first_schema() {
    let pipeline = PluginPipeline::new().with_plugin(facade());
    pipeline.engine_ready(Arc::new(TenantEngine));

    // the GraphQL host gets the call and cannot decode it
    assert!(call(&pipeline, get("/rest/me")).await.is_err());
}

#[tokio::test]
async fn schema_changes_rebuild_the_routes() {
    let routes = Arc::new(Mutex::new(Vec::new()));
    let seen = routes.clone();
    let config = RestConfig {
        ignore: vec!["Query.user".to_string()],
        ..Default::default()
    };
    let facade = RestFacade::new(config, Arc::new(TinyRestLibrary))
        .on_route(move |route| seen.lock().push(route.path.clone()));
    let shared = facade.clone();
    let pipeline = ready_pipeline(facade);

    assert_eq!(
        *routes.lock(),
        vec!["/me".to_string(), "/ticks".to_string(), "/forged".to_string()]
    );
    assert!(call(&pipeline, get("/rest/user/1")).await.is_err());

    let next = Schema::new("type Query { me: Int }");
    pipeline.schema_changed(next.clone()).unwrap();
    assert_eq!(shared.schema_id().as_deref(), Some(next.id()));
    assert_eq!(routes.lock().len(), 6);

    // a schema the library refuses keeps the previous mapping in place
    assert!(shared
        .schema_changed(&Arc::new(Schema::new("type Mutation { x: Int }")))
        .is_err());
    assert_eq!(shared.schema_id().as_deref(), Some(next.id()));
    let response = call(&pipeline, get_as("acme", "/rest/me")).await.unwrap();
    assert_eq!(body_json(&response)["data"]["document"], "query me_query { me }");
}
