/*!
 * Error types for the doctwin application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * The split follows how each failure is handled by the pipeline:
 * - `DocumentError` is structural and aborts the document
 * - `ProviderError` is recovered by the orchestrator (fallback to source text)
 * - `FormatError` is recovered per property while cloning formatting
 * - `CacheError` only surfaces from snapshot/restore
 */

use thiserror::Error;

use crate::document::NodeId;

/// Errors that can occur when working with translation providers
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// A batch call returned a different number of translations than it was given
    #[error("Batch length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Number of texts sent
        expected: usize,
        /// Number of translations received
        actual: usize,
    },

    /// The blocking worker running the translation panicked or was cancelled
    #[error("Translation worker failed: {0}")]
    WorkerFailed(String),
}

/// Structural errors in the document model. These are fatal for the document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document file could not be read or written
    #[error("Document I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document file is not a valid serialized document
    #[error("Corrupt document: {0}")]
    Corrupt(String),

    /// A handle does not point to any node of this document
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// A handle points to a node of the wrong kind
    #[error("Node {node} is not a {expected}")]
    WrongNodeKind {
        /// The offending handle
        node: NodeId,
        /// The kind the caller expected
        expected: &'static str,
    },

    /// A node has no container it could be inserted next to
    #[error("Node {0} is not attached to a container")]
    Detached(NodeId),

    /// Table coordinates outside the table grid
    #[error("Cell ({row}, {column}) is outside the table")]
    CellOutOfRange {
        /// Row index
        row: usize,
        /// Column index
        column: usize,
    },
}

/// A single formatting property could not be cloned
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The property value is outside what a document can express
    #[error("Invalid value for {property}: {value}")]
    InvalidValue {
        /// Property name
        property: &'static str,
        /// Offending value, rendered for the log
        value: String,
    },
}

/// Errors raised while persisting or loading the translation cache
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading or writing the snapshot failed
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be serialized or parsed
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The atomic rename of the snapshot failed
    #[error("Failed to persist cache snapshot: {0}")]
    Persist(String),
}

/// Errors that can occur during translation of a document
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API that could not be recovered
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Structural error in the document
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// The whole run exceeded its time budget
    #[error("Translation timed out after {0} seconds")]
    Timeout(u64),

    /// Invalid configuration for the pipeline
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the document model
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the cache
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
