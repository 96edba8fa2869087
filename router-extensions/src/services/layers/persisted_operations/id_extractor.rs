//! Persisted operation ID extractor

use std::sync::Arc;

use crate::graphql;
use crate::json_ext::ValueExt;

/// Extracts the persisted operation key from the call parameters.
///
/// Must be pure: the same parameters always yield the same key.
pub type ExtractPersistedOperationId =
    Arc<dyn Fn(&graphql::Request) -> Option<String> + Send + Sync + 'static>;

/// Reads the key from the `persistedQuery` extension.
///
/// The extension must be an object whose `version` is the number `1` and whose
/// `sha256Hash` is a string; the hash is returned as is, without checking its shape.
pub fn default_extract_persisted_operation_id(request: &graphql::Request) -> Option<String> {
    let persisted_query = request.extensions.get("persistedQuery")?.as_object()?;
    if !persisted_query
        .get("version")
        .is_some_and(|version| version.is_number_eq(1))
    {
        return None;
    }
    persisted_query
        .get("sha256Hash")?
        .as_str()
        .map(ToOwned::to_owned)
}

pub(crate) fn default_extractor() -> ExtractPersistedOperationId {
    Arc::new(default_extract_persisted_operation_id)
}
