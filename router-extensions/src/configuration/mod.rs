//! Logic for loading configuration in to an object model

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::plugins::rest::openapi::ApiMetadata;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not deserialize YAML configuration: {0}
    DeserializeYaml(#[from] serde_yaml::Error),
    /// could not deserialize JSON configuration: {0}
    DeserializeJson(#[from] serde_json::Error),
    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
}

/// The configuration of the extensions.
///
/// Can be created through `serde::Deserialize` from various formats,
/// or inline in Rust code with `serde_json::json!` and `serde_json::from_value`.
/// A missing section leaves the matching plugin out.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// Persisted operations enforcement.
    #[serde(default)]
    pub persisted_operations: Option<PersistedOperationsConfig>,

    /// REST facade without documentation.
    #[serde(default)]
    pub rest: Option<RestConfig>,

    /// REST facade serving its API documentation.
    #[serde(default)]
    pub rest_docs: Option<RestDocsConfig>,
}

impl Configuration {
    /// Parse and validate YAML configuration.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigurationError> {
        serde_yaml::from_str::<Self>(raw)?.validate()
    }

    /// Parse and validate JSON configuration.
    pub fn from_json(raw: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str::<Self>(raw)?.validate()
    }

    /// The JSON schema of the configuration.
    pub fn schema() -> RootSchema {
        schemars::schema_for!(Configuration)
    }

    pub fn validate(self) -> Result<Self, ConfigurationError> {
        if self.rest.is_some() && self.rest_docs.is_some() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "conflicting REST configuration",
                error: "`rest` and `rest_docs` both install a REST facade, configure only one"
                    .to_string(),
            });
        }
        if let Some(rest) = &self.rest {
            rest.validate()?;
        }
        if let Some(rest_docs) = &self.rest_docs {
            rest_docs.validate()?;
        }
        Ok(self)
    }
}

/// Parse configuration from a string in YAML syntax
impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml(s)
    }
}

fn check_path(message: &'static str, path: &str) -> Result<(), ConfigurationError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidConfiguration {
            message,
            error: format!("'{path}' must start with '/'"),
        })
    }
}

/// Persisted operations configuration
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct PersistedOperationsConfig {
    /// Let calls carrying operation text run. Defaults to false.
    pub allow_arbitrary_operations: bool,

    /// Path of a persisted query manifest to serve operations from.
    pub manifest: Option<PathBuf>,

    /// Log rejected calls at `warn`. Defaults to true.
    pub log_rejections: bool,
}

#[buildstructor::buildstructor]
impl PersistedOperationsConfig {
    #[builder(visibility = "pub")]
    fn new(
        allow_arbitrary_operations: Option<bool>,
        manifest: Option<PathBuf>,
        log_rejections: Option<bool>,
    ) -> Self {
        Self {
            allow_arbitrary_operations: allow_arbitrary_operations.unwrap_or_default(),
            manifest,
            log_rejections: log_rejections.unwrap_or(true),
        }
    }
}

impl Default for PersistedOperationsConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_base_path() -> String {
    "/rest".to_string()
}

/// REST facade configuration
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct RestConfig {
    /// Prefix of every REST path. Defaults to `/rest`.
    #[schemars(default = "default_base_path")]
    pub base_path: String,

    /// JSON schema describing each custom scalar, by scalar name.
    pub custom_scalars: HashMap<String, Value>,

    /// `Type.field` coordinates that get no route.
    pub ignore: Vec<String>,

    /// Maximum selection depth of generated operations.
    pub depth_limit: Option<usize>,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            custom_scalars: HashMap::new(),
            ignore: Vec::new(),
            depth_limit: None,
        }
    }
}

impl RestConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        check_path("invalid REST base path", &self.base_path)
    }
}

fn default_swagger_ui_endpoint() -> String {
    "/swagger".to_string()
}

fn default_swagger_json_endpoint() -> String {
    "/swagger.json".to_string()
}

/// REST facade with API documentation configuration
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct RestDocsConfig {
    /// REST facade settings.
    pub rest: RestConfig,

    /// Path of the documentation page. Defaults to `/swagger`.
    #[schemars(default = "default_swagger_ui_endpoint")]
    pub swagger_ui_endpoint: String,

    /// Path of the API document. Defaults to `/swagger.json`.
    #[schemars(default = "default_swagger_json_endpoint")]
    pub swagger_json_endpoint: String,

    /// OpenAPI `info` object.
    pub info: Option<Value>,

    /// OpenAPI `servers`.
    pub servers: Vec<Value>,

    /// OpenAPI `components`.
    pub components: Option<Value>,

    /// OpenAPI `security` requirements.
    pub security: Vec<Value>,

    /// OpenAPI `tags`.
    pub tags: Vec<Value>,
}

impl Default for RestDocsConfig {
    fn default() -> Self {
        Self {
            rest: RestConfig::default(),
            swagger_ui_endpoint: default_swagger_ui_endpoint(),
            swagger_json_endpoint: default_swagger_json_endpoint(),
            info: None,
            servers: Vec::new(),
            components: None,
            security: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl RestDocsConfig {
    /// Document-level metadata for the API document.
    pub fn metadata(&self) -> ApiMetadata {
        ApiMetadata {
            info: self.info.clone(),
            servers: self.servers.clone(),
            components: self.components.clone(),
            security: self.security.clone(),
            tags: self.tags.clone(),
            custom_scalars: self.rest.custom_scalars.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        self.rest.validate()?;
        check_path("invalid swagger UI endpoint", &self.swagger_ui_endpoint)?;
        check_path("invalid swagger JSON endpoint", &self.swagger_json_endpoint)?;
        if self.swagger_ui_endpoint == self.swagger_json_endpoint {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "conflicting documentation endpoints",
                error: format!(
                    "'{}' cannot serve both the page and the document",
                    self.swagger_ui_endpoint
                ),
            });
        }
        Ok(())
    }
}
