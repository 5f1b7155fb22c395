use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the fetch and normalization pipeline.
#[derive(Debug, Error)]
pub enum DataError {
    /// A raw record lacks a field declared by the active schema.
    #[error("schema '{schema}' expects field '{field}' but the record does not have it")]
    SchemaMismatch { schema: String, field: String },

    /// The date field is present but does not parse with the schema's date format.
    #[error("schema '{schema}' could not parse '{value}' in field '{field}' with format '{format}'")]
    InvalidDate {
        schema: String,
        field: String,
        value: String,
        format: String,
    },

    /// The upstream kept returning its transient-failure signature.
    #[error("region '{region}' kept failing upstream after {attempts} attempt(s)")]
    TransientUpstream { region: String, attempts: u32 },

    /// No persisted bundle exists.
    #[error("no cached datasets at '{}', run with --refresh first", path.display())]
    CacheMiss { path: PathBuf },

    /// The body is neither the transient signature nor the expected JSON shape.
    #[error("malformed payload from '{url}': {reason}")]
    MalformedPayload { url: String, reason: String },

    /// The HTTP client could not complete the request.
    #[error("request to '{url}' failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The persisted bundle could not be read or written.
    #[error("unable to access cache file '{}'", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted bundle could not be encoded or decoded.
    #[error("unable to decode cache file '{}'", path.display())]
    CacheFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DataError {
    /// Whether this error comes from a schema violation rather than the environment.
    #[must_use]
    pub const fn is_schema_error(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. } | Self::InvalidDate { .. })
    }
}
