use std::fmt;

use sha2::Digest;
use sha2::Sha256;

/// A GraphQL schema as announced by the host.
///
/// The extensions in this crate never validate or interpret the schema: it is
/// handed to the REST mapping and API document collaborators as-is.
#[derive(Clone, PartialEq, Eq)]
pub struct Schema {
    raw_sdl: String,
    schema_id: String,
}

impl Schema {
    /// Wrap schema definition language text.
    pub fn new(raw_sdl: impl Into<String>) -> Self {
        let raw_sdl = raw_sdl.into();
        let schema_id = Self::schema_id(&raw_sdl);
        Self { raw_sdl, schema_id }
    }

    /// Compute the schema id: the hex encoded SHA-256 of the SDL.
    pub fn schema_id(sdl: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(sdl.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// The schema definition language text.
    pub fn raw_sdl(&self) -> &str {
        &self.raw_sdl
    }

    /// The hex encoded SHA-256 of [`Schema::raw_sdl`].
    pub fn id(&self) -> &str {
        &self.schema_id
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("schema_id", &self.schema_id)
            .finish_non_exhaustive()
    }
}
