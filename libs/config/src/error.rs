//! Error types for configuration resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the management-API transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("request to {path} failed: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("request to {path} returned {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("response from {path} is not valid JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// No canned response was registered (mock client only).
    #[error("no response registered for {0}")]
    Unregistered(String),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// Returns true if the API was reached but answered with an error status.
    pub fn is_status(&self) -> bool {
        matches!(self, ApiError::Status { .. })
    }
}

/// Errors raised by a single resolution step.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Transport failure while talking to the management API.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A required key is absent from a remote document.
    #[error("{document} is missing '{field}'")]
    MissingField {
        document: &'static str,
        field: String,
    },

    /// A remote document does not have the expected shape.
    #[error("{document} has an unexpected shape: {source}")]
    Shape {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A controller node has no `public` network attachment.
    #[error("controller node {fqdn} ({ip}) has no public network")]
    MissingPublicNetwork { fqdn: String, ip: String },

    /// A sequence that must have at least one element is empty.
    #[error("{0} is empty")]
    Empty(&'static str),

    /// A step ran before the step that writes its input.
    #[error("{0} has not been resolved yet")]
    Unresolved(&'static str),
}

impl ResolveError {
    /// Returns true for transport failures, as opposed to data-shape errors.
    pub fn is_transport(&self) -> bool {
        matches!(self, ResolveError::Api(_))
    }
}

/// Errors raised while loading static defaults.
#[derive(Debug, Error)]
pub enum DefaultsError {
    /// The file or an environment override could not be merged or deserialized.
    #[error("failed to load defaults from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    /// Environment overrides could not be applied.
    #[error("failed to apply environment overrides: {0}")]
    Environment(#[source] config::ConfigError),
}

/// Errors raised while reading the cluster identity from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// A required variable is not set.
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}
