use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;
use http::header::CONTENT_TYPE;
use router_extensions::Configuration;
use router_extensions::Schema;
use router_extensions::plugin::PluginPipeline;
use router_extensions::plugins::persisted_operations::PersistedOperationStore;
use router_extensions::plugins::persisted_operations::PersistedOperations;
use router_extensions::plugins::rest::RestDocs;
use serde_json::json;

use super::common::TenantEngine;
use super::common::TinyRestLibrary;
use super::common::body_json;
use super::common::call;
use super::common::get;
use super::common::get_as;
use super::common::post_graphql;

const CONFIGURATION: &str = r#"
persisted_operations: {}
rest_docs:
  rest:
    base_path: /api
  info:
    title: Users
    version: 2.0.0
  servers:
    - url: https://users.example.com
"#;

fn pipeline() -> PluginPipeline {
    let configuration = Configuration::from_yaml(CONFIGURATION).unwrap();
    let store: Arc<dyn PersistedOperationStore> = Arc::new(HashMap::<String, String>::new());
    let pipeline = PluginPipeline::new()
        .with_plugin(RestDocs::new(
            configuration.rest_docs.unwrap(),
            Arc::new(TinyRestLibrary),
        ))
        .with_plugin(PersistedOperations::new(
            &configuration.persisted_operations.unwrap(),
            store,
        ));
    pipeline.engine_ready(Arc::new(TenantEngine));
    pipeline
        .schema_changed(Schema::new("type Query { me: String }"))
        .unwrap();
    pipeline
}

#[tokio::test]
async fn document_lists_every_route() {
    let pipeline = pipeline();

    let response = call(&pipeline, get("/swagger.json")).await.unwrap();
    assert_eq!(response.response.status(), StatusCode::OK);
    assert_eq!(
        response.response.headers()[CONTENT_TYPE].to_str().unwrap(),
        "application/json"
    );
    let document = body_json(&response);
    assert_eq!(document["info"], json!({ "title": "Users", "version": "2.0.0" }));
    assert_eq!(document["servers"], json!([{ "url": "https://users.example.com" }]));
    let paths = document["paths"].as_object().unwrap();
    assert_eq!(
        paths.keys().cloned().collect::<Vec<_>>(),
        vec!["/api/me", "/api/user/{id}", "/api/ticks", "/api/forged"]
    );
    assert_eq!(
        document["paths"]["/api/user/{id}"]["get"]["parameters"][0]["name"],
        "id"
    );
}

#[tokio::test]
async fn documentation_page_embeds_the_document() {
    let pipeline = pipeline();

    let response = call(&pipeline, get("/swagger")).await.unwrap();
    assert_eq!(
        response.response.headers()[CONTENT_TYPE].to_str().unwrap(),
        "text/html; charset=utf-8"
    );
    let page = response.body_text();
    assert!(page.contains("<title>Users</title>"));
    assert!(page.contains(r#""/api/user/{id}""#));
}

#[tokio::test]
async fn rest_calls_skip_the_persisted_operations_gate() {
    let pipeline = pipeline();

    let response = call(&pipeline, get_as("acme", "/api/me")).await.unwrap();
    assert_eq!(body_json(&response)["data"]["tenant"], "acme");

    // GraphQL calls still go through the gate
    let response = call(&pipeline, post_graphql(json!({ "query": "{ me }" })))
        .await
        .unwrap();
    assert_eq!(response.response.status(), StatusCode::BAD_REQUEST);
}
