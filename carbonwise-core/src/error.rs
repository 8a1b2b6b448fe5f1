//! Error types for the Carbonwise core.
//!
//! Uses `thiserror` for public API error types with structured error variants
//! for the remote API, credentials, configuration, tracking sessions and tool
//! execution.

use std::path::PathBuf;

/// Top-level error type for the Carbonwise core library.
#[derive(Debug, thiserror::Error)]
pub enum CarbonwiseError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the CodeCarbon REST API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to create HTTP client: {message}")]
    ClientBuild { message: String },

    #[error("Invalid API base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("{method} {path} request failed: {message}")]
    Request {
        method: String,
        path: String,
        message: String,
    },

    #[error("{method} {path} failed ({status}): {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("{method} {path} returned an unexpected body: {message}")]
    Decode {
        method: String,
        path: String,
        message: String,
    },
}

/// Errors from loading the `codecarbon login` credentials file.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("No credentials file found at {path}. Please run `codecarbon login` first.")]
    NotFound { path: PathBuf },

    #[error("No access_token found in credentials file {path}. Run `codecarbon login` again.")]
    MissingAccessToken { path: PathBuf },

    #[error("Failed to parse credentials file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to read credentials file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from the local tracking session.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("No active tracking session.")]
    NotTracking,
}

/// Errors from tool registration and execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Tool already registered: {name}")]
    AlreadyRegistered { name: String },

    #[error("Invalid arguments for tool '{name}': {reason}")]
    InvalidArguments { name: String, reason: String },

    #[error("Tool '{name}' execution failed: {message}")]
    ExecutionFailed { name: String, message: String },

    #[error("Tool '{name}' timed out after {timeout_secs}s")]
    Timeout { name: String, timeout_secs: u64 },
}

impl ToolError {
    /// Wrap any displayable failure as an execution failure of `name`.
    pub fn execution(name: &str, err: impl std::fmt::Display) -> Self {
        ToolError::ExecutionFailed {
            name: name.to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for results using the top-level `CarbonwiseError`.
pub type Result<T> = std::result::Result<T, CarbonwiseError>;
