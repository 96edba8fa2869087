//! Extension errors.
use displaydoc::Display;
use http::StatusCode;
use thiserror::Error;

pub use crate::configuration::ConfigurationError;
pub use crate::graphql::Error;
use crate::graphql::ErrorExtension;

/// Policy rejections raised by the persisted-operation gate.
///
/// These end the current call with a client-readable GraphQL error and are never
/// fatal to the process.
#[derive(Error, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[ignore_extra_doc_attributes]
#[non_exhaustive]
pub enum PersistedOperationError {
    /// PersistedQueryOnly
    ///
    /// The call carried operation text but arbitrary operations are not allowed.
    PersistedQueryOnly,

    /// PersistedQueryNotFound
    ///
    /// No persisted operation key could be extracted from the call, or the store
    /// does not know the key.
    PersistedQueryNotFound,
}

impl PersistedOperationError {
    /// The HTTP status code of the response that carries this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PersistedOperationError::PersistedQueryOnly => StatusCode::BAD_REQUEST,
            // clients implementing automatic persisted queries retry with the
            // full query text when they see this error on a 200
            PersistedOperationError::PersistedQueryNotFound => StatusCode::OK,
        }
    }
}

impl ErrorExtension for PersistedOperationError {
    fn extension_code(&self) -> String {
        match self {
            PersistedOperationError::PersistedQueryOnly => "PERSISTED_QUERY_ONLY",
            PersistedOperationError::PersistedQueryNotFound => "PERSISTED_QUERY_NOT_FOUND",
        }
        .to_string()
    }
}

impl PersistedOperationError {
    /// Convert the error to a GraphQL error.
    pub fn to_graphql_error(&self) -> Error {
        ErrorExtension::to_graphql_error(self)
    }
}

/// Lifecycle-ordering violations detected by the execution binder.
///
/// The host did not fire its pipeline events in the expected order. Surfaced as
/// service errors.
#[derive(Error, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BindingError {
    /// no execution environment is bound to this request
    ContextBindingMissing,

    /// Illegal invocation: the context value was not produced by this binder
    IllegalInvocation,
}

/// Errors raised while loading a persisted query manifest.
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub enum ManifestError {
    /// could not read persisted query manifest {path}: {source}
    Read {
        /// The manifest location.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// could not parse persisted query manifest: {0}
    Parse(#[from] serde_json::Error),

    /// persisted query manifest format is not 'apollo-persisted-query-manifest'
    InvalidFormat,

    /// persisted query manifest version {0} is not supported, expected 1
    UnsupportedVersion(u64),
}
