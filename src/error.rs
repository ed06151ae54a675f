//! Error types for the curriculum generation pipeline.

use crate::types::{DocumentId, DocumentType};
use thiserror::Error;

/// Errors raised while producing or deriving documents.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model call timed out after {seconds}s")]
    ModelTimeout { seconds: u64 },

    #[error("Model returned an empty or too-short response")]
    ModelEmptyResponse,

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("Document {id} has type {actual:?}, expected {expected:?}")]
    WrongSourceType {
        id: DocumentId,
        expected: DocumentType,
        actual: DocumentType,
    },

    #[error("No concepts could be extracted from document {0}")]
    NoConceptsFound(DocumentId),

    #[error("Link persistence failed: {0}")]
    LinkPersistence(String),

    #[error("Document store error: {0}")]
    StoreError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::ConfigError(err.to_string())
    }
}

/// Rendering failures are distinct from generation failures: a document that
/// generated fine can still defeat every table parser at print time.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("All table parsers produced zero rows for {doc_type:?}")]
    ParseExhausted { doc_type: DocumentType },

    #[error("Content is empty")]
    EmptyContent,
}
