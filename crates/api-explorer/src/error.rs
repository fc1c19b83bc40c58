//! Error types for api-explorer

use openapi_parser::ParseError;
use thiserror::Error;

/// Result type alias for explorer operations
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Explorer error types
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Failed to load API document: {0}")]
    Document(#[from] ParseError),

    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("Request body is not valid JSON: {0}")]
    InvalidBody(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No base URL configured - pass --base-url or set API_EXPLORER_BASE_URL")]
    MissingBaseUrl,

    #[error("No API document loaded - run `reload` to retry")]
    NotLoaded,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
