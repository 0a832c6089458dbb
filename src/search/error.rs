//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A record is missing the fields required to build a document.
    /// Recoverable: skipped in batch context, rejected on single-item paths.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Index creation or schema definition failed. Fatal to the calling
    /// migration or bootstrap flow.
    #[error("Index schema creation failed: {0}")]
    SchemaFailed(String),

    /// Every document in a bulk submission failed.
    #[error("Bulk indexing failed for all {failed} documents")]
    AllDocumentsFailed { failed: usize },

    /// Document indexing failed
    #[error("Document indexing failed: {0}")]
    IndexingFailed(String),

    /// Search execution failed
    #[error("Search execution failed: {0}")]
    SearchFailed(String),

    /// Query construction failed
    #[error("Query construction failed: {0}")]
    QueryFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Storage engine error
    #[error("Storage engine error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidRecord(msg) => AppError::Validation(msg),
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            SearchError::Io(err) => AppError::Internal(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_documents_failed_names_the_count() {
        let err = SearchError::AllDocumentsFailed { failed: 3 };
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_invalid_record_maps_to_validation() {
        let err: AppError = SearchError::InvalidRecord("missing name".to_string()).into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
