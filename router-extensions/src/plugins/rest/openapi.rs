//! OpenAPI description of the REST routes.

use std::collections::HashMap;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::Schema;
use crate::plugins::rest::mapping::RouteInfo;

/// Document-level metadata copied into every API document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApiMetadata {
    pub info: Option<Value>,
    pub servers: Vec<Value>,
    pub components: Option<Value>,
    pub security: Vec<Value>,
    pub tags: Vec<Value>,
    /// JSON schema to use for each custom scalar.
    pub custom_scalars: HashMap<String, Value>,
}

/// An API document being assembled for one schema.
pub trait ApiDocument: Send + 'static {
    /// Describe `route`, served under `base_path`.
    fn add_route(&mut self, route: &RouteInfo, base_path: &str);

    /// The document as JSON.
    fn get(&self) -> Value;
}

/// Creates an empty [`ApiDocument`] for each schema.
pub trait ApiDocumentFactory: Send + Sync + 'static {
    fn create(&self, schema: &Schema, metadata: &ApiMetadata) -> Box<dyn ApiDocument>;
}

/// Builds [`OpenApiDocument`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenApiDocumentFactory;

impl ApiDocumentFactory for OpenApiDocumentFactory {
    fn create(&self, schema: &Schema, metadata: &ApiMetadata) -> Box<dyn ApiDocument> {
        Box::new(OpenApiDocument::new(schema, metadata))
    }
}

const OPENAPI_VERSION: &str = "3.0.0";

/// An OpenAPI 3.0 document.
#[derive(Clone, Debug)]
pub struct OpenApiDocument {
    document: Map<String, Value>,
    paths: Map<String, Value>,
}

impl OpenApiDocument {
    pub fn new(schema: &Schema, metadata: &ApiMetadata) -> Self {
        let mut document = Map::new();
        document.insert("openapi".to_string(), json!(OPENAPI_VERSION));
        document.insert(
            "info".to_string(),
            metadata.info.clone().unwrap_or_else(|| {
                json!({
                    "title": "REST API",
                    "version": "1.0.0",
                    "x-schema-id": schema.id(),
                })
            }),
        );
        if !metadata.servers.is_empty() {
            document.insert("servers".to_string(), json!(metadata.servers));
        }
        if let Some(components) = components(metadata) {
            document.insert("components".to_string(), components);
        }
        if !metadata.security.is_empty() {
            document.insert("security".to_string(), json!(metadata.security));
        }
        if !metadata.tags.is_empty() {
            document.insert("tags".to_string(), json!(metadata.tags));
        }

        Self {
            document,
            paths: Map::new(),
        }
    }
}

/// User components, with a schema for each custom scalar the user did not already describe.
fn components(metadata: &ApiMetadata) -> Option<Value> {
    let mut components = match &metadata.components {
        Some(Value::Object(components)) => components.clone(),
        _ if metadata.custom_scalars.is_empty() => return metadata.components.clone(),
        _ => Map::new(),
    };
    if !metadata.custom_scalars.is_empty() {
        let schemas = components
            .entry("schemas")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(schemas) = schemas {
            let mut scalars: Vec<_> = metadata.custom_scalars.iter().collect();
            scalars.sort_by(|(a, _), (b, _)| a.cmp(b));
            for (name, schema) in scalars {
                schemas
                    .entry(name.clone())
                    .or_insert_with(|| schema.clone());
            }
        }
    }
    Some(Value::Object(components))
}

/// Turn `/users/:id` into `/users/{id}`, returning the parameter names.
fn openapi_path(path: &str) -> (String, Vec<String>) {
    let mut parameters = Vec::new();
    let segments: Vec<String> = path
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => {
                parameters.push(name.to_string());
                format!("{{{name}}}")
            }
            _ => segment.to_string(),
        })
        .collect();
    (segments.join("/"), parameters)
}

fn join_paths(base_path: &str, path: &str) -> String {
    let base_path = base_path.trim_end_matches('/');
    match path.strip_prefix('/') {
        Some(path) => format!("{base_path}/{path}"),
        None if path.is_empty() => base_path.to_string(),
        None => format!("{base_path}/{path}"),
    }
}

impl ApiDocument for OpenApiDocument {
    fn add_route(&mut self, route: &RouteInfo, base_path: &str) {
        let (path, parameters) = openapi_path(&join_paths(base_path, &route.path));

        let mut operation = Map::new();
        operation.insert("operationId".to_string(), json!(route.operation_name));
        if let Some(description) = &route.description {
            operation.insert("description".to_string(), json!(description));
        }
        if !route.tags.is_empty() {
            operation.insert("tags".to_string(), json!(route.tags));
        }
        if !parameters.is_empty() {
            let parameters: Vec<Value> = parameters
                .into_iter()
                .map(|name| {
                    json!({
                        "in": "path",
                        "name": name,
                        "required": true,
                        "schema": { "type": "string" },
                    })
                })
                .collect();
            operation.insert("parameters".to_string(), Value::Array(parameters));
        }
        operation.insert(
            "responses".to_string(),
            json!({
                "200": {
                    "description": "Successful response",
                    "content": { "application/json": { "schema": { "type": "object" } } },
                }
            }),
        );

        let item = self
            .paths
            .entry(path)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(item) = item {
            item.insert(
                route.method.as_str().to_ascii_lowercase(),
                Value::Object(operation),
            );
        }
    }

    fn get(&self) -> Value {
        let mut document = self.document.clone();
        document.insert("paths".to_string(), Value::Object(self.paths.clone()));
        Value::Object(document)
    }
}
