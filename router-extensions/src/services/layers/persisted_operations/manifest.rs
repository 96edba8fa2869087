use std::collections::HashMap;
use std::ops::Deref;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tower::BoxError;

use super::store::PersistedOperationStore;
use crate::error::ManifestError;

const MANIFEST_FORMAT: &str = "apollo-persisted-query-manifest";

/// A single operation containing an ID and a body,
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestOperation {
    /// The operation ID (usually a hash).
    pub id: String,
    /// The operation body.
    pub body: String,
}

/// The manifest file as written by client tooling.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ManifestFile {
    format: String,
    version: u64,
    operations: Vec<ManifestOperation>,
}

impl ManifestFile {
    fn validate(self) -> Result<Self, ManifestError> {
        if self.format != MANIFEST_FORMAT {
            return Err(ManifestError::InvalidFormat);
        }

        if self.version != 1 {
            return Err(ManifestError::UnsupportedVersion(self.version));
        }

        Ok(self)
    }
}

/// An in memory map of persisted operations, keyed by operation ID.
#[derive(Debug, Clone, Default)]
pub struct PersistedQueryManifest {
    inner: HashMap<String, String>,
}

impl PersistedQueryManifest {
    /// Parses a manifest and checks its format and version.
    pub fn parse_and_validate(raw_manifest: &str) -> Result<Self, ManifestError> {
        let manifest = serde_json::from_str::<ManifestFile>(raw_manifest)?.validate()?;
        Ok(manifest.operations.into())
    }
}

impl From<Vec<ManifestOperation>> for PersistedQueryManifest {
    fn from(operations: Vec<ManifestOperation>) -> Self {
        Self {
            inner: operations
                .into_iter()
                .map(|operation| (operation.id, operation.body))
                .collect(),
        }
    }
}

impl Deref for PersistedQueryManifest {
    type Target = HashMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A [`PersistedOperationStore`] serving a manifest that can be swapped at runtime.
///
/// Lookups never wait for a reload: they see either the old or the new manifest.
pub struct ManifestStore {
    path: Option<PathBuf>,
    manifest: ArcSwap<PersistedQueryManifest>,
}

impl ManifestStore {
    /// Serve `manifest`. [`ManifestStore::reload`] is a no-op for such stores.
    pub fn new(manifest: PersistedQueryManifest) -> Self {
        Self {
            path: None,
            manifest: ArcSwap::from_pointee(manifest),
        }
    }

    /// Load and validate the manifest at `path`.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref().to_path_buf();
        let manifest = read_manifest(&path).await?;
        tracing::info!(
            path = %path.display(),
            operations = manifest.len(),
            "loaded persisted query manifest"
        );
        Ok(Self {
            path: Some(path),
            manifest: ArcSwap::from_pointee(manifest),
        })
    }

    /// Replace the served manifest.
    pub fn replace(&self, manifest: PersistedQueryManifest) {
        self.manifest.store(Arc::new(manifest));
    }

    /// Read the manifest file again and serve it. On error the current manifest stays in place.
    pub async fn reload(&self) -> Result<(), ManifestError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match read_manifest(path).await {
            Ok(manifest) => {
                tracing::info!(
                    path = %path.display(),
                    operations = manifest.len(),
                    "reloaded persisted query manifest"
                );
                self.replace(manifest);
                Ok(())
            }
            Err(error) => {
                tracing::error!(
                    path = %path.display(),
                    %error,
                    "could not reload persisted query manifest, keeping the previous one"
                );
                Err(error)
            }
        }
    }

    /// The manifest currently served.
    pub fn manifest(&self) -> Arc<PersistedQueryManifest> {
        self.manifest.load_full()
    }
}

async fn read_manifest(path: &Path) -> Result<PersistedQueryManifest, ManifestError> {
    let raw_manifest =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ManifestError::Read {
                path: path.display().to_string(),
                source,
            })?;
    PersistedQueryManifest::parse_and_validate(&raw_manifest)
}

#[async_trait]
impl PersistedOperationStore for ManifestStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        Ok(self.manifest.load().get(key).cloned())
    }
}
