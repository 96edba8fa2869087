//! Plugin system.
//!
//! Extensions hook into the host pipeline through the [`Plugin`] trait. The host announces its
//! lifecycle events (engine initialization, schema changes) to a [`PluginPipeline`] and lets the
//! pipeline wrap its per-call services.

#[cfg(test)]
pub(crate) mod test;

use std::sync::Arc;

use tower::BoxError;

use crate::Schema;
use crate::services::ExecutionEngine;
use crate::services::router;
use crate::services::supergraph;

/// One extension of the host pipeline. Every hook has a default which does nothing.
pub trait Plugin: Send + Sync + 'static {
    /// The execution engine is initialized. Called again whenever the host replaces it.
    fn engine_ready(&self, _engine: Arc<dyn ExecutionEngine>) {}

    /// A schema became available, or replaced the previous one.
    ///
    /// An error leaves the plugin serving whatever it served before.
    fn schema_changed(&self, _schema: &Arc<Schema>) -> Result<(), BoxError> {
        Ok(())
    }

    /// This service runs at the very beginning and very end of the request lifecycle.
    /// It sees the raw HTTP request and may answer it without involving GraphQL at all.
    /// Define `router_service` if your customization needs to interact with HTTP.
    fn router_service(&self, service: router::BoxService) -> router::BoxService {
        service
    }

    /// This service runs once the call parameters are decoded, before execution.
    /// Define `supergraph_service` if your customization needs to inspect or rewrite the
    /// GraphQL request.
    fn supergraph_service(&self, service: supergraph::BoxService) -> supergraph::BoxService {
        service
    }

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// The ordered set of plugins of a host.
///
/// The first plugin added is the outermost: it sees requests first and responses last.
#[derive(Clone, Default)]
pub struct PluginPipeline {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `plugin` to the pipeline.
    pub fn with_plugin(mut self, plugin: impl Plugin) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Append a shared plugin, which the host may keep a handle to.
    pub fn with_shared_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Announce the execution engine to every plugin.
    pub fn engine_ready(&self, engine: Arc<dyn ExecutionEngine>) {
        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "announcing execution engine");
            plugin.engine_ready(engine.clone());
        }
    }

    /// Announce a new schema to every plugin.
    ///
    /// Every plugin is notified even if an earlier one fails; the first error is returned.
    pub fn schema_changed(&self, schema: Schema) -> Result<(), BoxError> {
        let schema = Arc::new(schema);
        let mut first_error = None;
        for plugin in &self.plugins {
            if let Err(error) = plugin.schema_changed(&schema) {
                tracing::error!(
                    plugin = plugin.name(),
                    schema.id = schema.id(),
                    %error,
                    "plugin failed to apply the new schema"
                );
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Wrap the host's router service with every plugin's `router_service`.
    pub fn router_service(&self, service: router::BoxService) -> router::BoxService {
        self.plugins
            .iter()
            .rev()
            .fold(service, |acc, plugin| plugin.router_service(acc))
    }

    /// Wrap the host's supergraph service with every plugin's `supergraph_service`.
    pub fn supergraph_service(&self, service: supergraph::BoxService) -> supergraph::BoxService {
        self.plugins
            .iter()
            .rev()
            .fold(service, |acc, plugin| plugin.supergraph_service(acc))
    }
}
