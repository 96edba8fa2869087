//! Persisted operations plugin.
//!
//! Installs the persisted operations gate on the supergraph stage. The store is either the
//! manifest named in the configuration or one supplied by the host.

use std::sync::Arc;

use tower::BoxError;
use tower::Layer;
use tower::ServiceExt;

use crate::configuration::ConfigurationError;
use crate::configuration::PersistedOperationsConfig;
use crate::graphql;
use crate::plugin::Plugin;
pub use crate::services::layers::persisted_operations::AllowArbitraryOperations;
pub use crate::services::layers::persisted_operations::ExtractPersistedOperationId;
pub use crate::services::layers::persisted_operations::FnStore;
pub use crate::services::layers::persisted_operations::ManifestOperation;
pub use crate::services::layers::persisted_operations::ManifestStore;
pub use crate::services::layers::persisted_operations::PERSISTED_OPERATION_ID_CONTEXT_KEY;
pub use crate::services::layers::persisted_operations::PersistedOperationStore;
pub use crate::services::layers::persisted_operations::PersistedOperationsLayer;
pub use crate::services::layers::persisted_operations::PersistedQueryManifest;
pub use crate::services::layers::persisted_operations::default_extract_persisted_operation_id;
use crate::services::supergraph;

/// Plugin enforcing persisted operations.
#[derive(Clone)]
pub struct PersistedOperations {
    layer: PersistedOperationsLayer,
}

impl PersistedOperations {
    /// Gate calls against `store`, with the policy and logging of `config`.
    pub fn new(config: &PersistedOperationsConfig, store: Arc<dyn PersistedOperationStore>) -> Self {
        Self {
            layer: PersistedOperationsLayer::new(store)
                .allow_arbitrary_operations(config.allow_arbitrary_operations)
                .log_rejections(config.log_rejections),
        }
    }

    /// Gate calls against the manifest named in `config`.
    pub async fn from_config(config: &PersistedOperationsConfig) -> Result<Self, BoxError> {
        let Some(path) = &config.manifest else {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "persisted operations need a store",
                error: "no manifest configured".to_string(),
            }
            .into());
        };
        let store = ManifestStore::from_file(path).await?;
        Ok(Self::new(config, Arc::new(store)))
    }

    /// Replace the arbitrary operations policy, for instance with a per-call decision.
    pub fn allow_arbitrary_operations(
        mut self,
        policy: impl Into<AllowArbitraryOperations>,
    ) -> Self {
        self.layer = self.layer.allow_arbitrary_operations(policy);
        self
    }

    /// Replace the persisted operation key extractor.
    pub fn extract_persisted_operation_id(
        mut self,
        extract: impl Fn(&graphql::Request) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.layer = self.layer.extract_persisted_operation_id(extract);
        self
    }
}

impl Plugin for PersistedOperations {
    fn supergraph_service(&self, service: supergraph::BoxService) -> supergraph::BoxService {
        self.layer.layer(service).boxed()
    }

    fn name(&self) -> &'static str {
        "persisted_operations"
    }
}
