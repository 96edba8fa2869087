use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;
use router_extensions::Configuration;
use router_extensions::plugin::PluginPipeline;
use router_extensions::plugins::persisted_operations::FnStore;
use router_extensions::plugins::persisted_operations::PersistedOperations;
use router_extensions::plugins::persisted_operations::PersistedOperationStore;
use serde_json::json;
use tower::BoxError;

use super::common::body_json;
use super::common::call;
use super::common::post_graphql;

fn operations() -> Arc<dyn PersistedOperationStore> {
    let operations: HashMap<String, String> = [(
        "ecf4edb46db40b5132295c0291d62fb65d6759a9eedfa4d5d612dd5ec54a6b38".to_string(),
        "query Hello { hello }".to_string(),
    )]
    .into_iter()
    .collect();
    Arc::new(operations)
}

fn persisted(hash: &str) -> serde_json::Value {
    json!({
        "variables": { "who": "me" },
        "extensions": { "persistedQuery": { "version": 1, "sha256Hash": hash } },
    })
}

fn pipeline(yaml: &str, store: Arc<dyn PersistedOperationStore>) -> PluginPipeline {
    let configuration = Configuration::from_yaml(yaml).unwrap();
    let config = configuration.persisted_operations.unwrap();
    PluginPipeline::new().with_plugin(PersistedOperations::new(&config, store))
}

#[tokio::test]
async fn registered_operations_run_by_key() {
    let pipeline = pipeline("persisted_operations: {}", operations());

    let response = call(
        &pipeline,
        post_graphql(persisted(
            "ecf4edb46db40b5132295c0291d62fb65d6759a9eedfa4d5d612dd5ec54a6b38",
        )),
    )
    .await
    .unwrap();
    assert_eq!(response.response.status(), StatusCode::OK);
    assert_eq!(
        body_json(&response),
        json!({ "data": { "executed": "query Hello { hello }" } })
    );
}

#[tokio::test]
async fn unknown_keys_ask_for_the_full_operation() {
    let pipeline = pipeline("persisted_operations: {}", operations());

    let response = call(&pipeline, post_graphql(persisted("0000")))
        .await
        .unwrap();
    assert_eq!(response.response.status(), StatusCode::OK);
    assert_eq!(
        body_json(&response),
        json!({
            "errors": [{
                "message": "PersistedQueryNotFound",
                "extensions": { "code": "PERSISTED_QUERY_NOT_FOUND" },
            }]
        })
    );
}

#[tokio::test]
async fn operation_text_follows_the_configured_policy() {
    let strict = pipeline("persisted_operations: {}", operations());
    let response = call(&strict, post_graphql(json!({ "query": "{ everything }" })))
        .await
        .unwrap();
    assert_eq!(response.response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(&response)["errors"][0]["extensions"]["code"],
        "PERSISTED_QUERY_ONLY"
    );

    let permissive = pipeline(
        "persisted_operations:\n  allow_arbitrary_operations: true\n",
        operations(),
    );
    let response = call(&permissive, post_graphql(json!({ "query": "{ everything }" })))
        .await
        .unwrap();
    assert_eq!(
        body_json(&response),
        json!({ "data": { "executed": "{ everything }" } })
    );
}

#[tokio::test]
async fn store_failures_fail_the_call() {
    let store = Arc::new(FnStore::new(|_key: String| async move {
        Err::<Option<String>, BoxError>("store unavailable".into())
    }));
    let pipeline = pipeline("persisted_operations: {}", store);

    let error = call(&pipeline, post_graphql(persisted("abc")))
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "store unavailable");
}
