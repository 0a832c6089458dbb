//! Search index management
//!
//! Owns the storage engine handle: index lifecycle (destructive recreate
//! for migrations, open-or-create for serving), wholesale document
//! replacement, the bulk submission protocol and index statistics.

use crate::search::analyzer::register_tokenizers;
use crate::search::config::SearchConfig;
use crate::search::document::{build_artist_schema, ArtistDocument, FIELD_ID};
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tantivy::directory::MmapDirectory;
use tantivy::query::AllQuery;
use tantivy::schema::{Field, Schema};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Term};
use tokio::sync::RwLock;

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Index size in bytes (0 for in-memory indexes)
    pub index_size_bytes: u64,

    /// Number of segments
    pub num_segments: usize,
}

/// Manages the Tantivy artist index
pub struct IndexManager {
    index: Index,
    schema: Schema,
    id_field: Field,
    writer: Arc<RwLock<IndexWriter>>,
    reader: IndexReader,
    config: SearchConfig,
}

impl IndexManager {
    /// Open the index at the configured path, creating it if absent.
    pub fn open(config: SearchConfig) -> SearchResult<Self> {
        std::fs::create_dir_all(&config.index_path).map_err(|e| {
            SearchError::SchemaFailed(format!("failed to create index directory: {e}"))
        })?;

        let schema = build_artist_schema();
        let dir = MmapDirectory::open(&config.index_path)
            .map_err(|e| SearchError::SchemaFailed(format!("failed to open index directory: {e}")))?;
        let index = Index::open_or_create(dir, schema)
            .map_err(|e| SearchError::SchemaFailed(format!("failed to open index: {e}")))?;

        Self::from_index(index, config)
    }

    /// Destructively recreate the index: any existing index at the target
    /// path is deleted first (full-rebuild semantics, not an incremental
    /// migration), then a fresh one is created. Errors are fatal to the
    /// calling migration flow.
    pub fn create(config: SearchConfig) -> SearchResult<Self> {
        if config.index_path.exists() {
            std::fs::remove_dir_all(&config.index_path).map_err(|e| {
                SearchError::SchemaFailed(format!("failed to delete existing index: {e}"))
            })?;
            tracing::info!(path = %config.index_path.display(), "Deleted existing index");
        }
        std::fs::create_dir_all(&config.index_path).map_err(|e| {
            SearchError::SchemaFailed(format!("failed to create index directory: {e}"))
        })?;

        let index = Index::create_in_dir(&config.index_path, build_artist_schema())
            .map_err(|e| SearchError::SchemaFailed(format!("failed to create index: {e}")))?;
        tracing::info!(path = %config.index_path.display(), "Index created");

        Self::from_index(index, config)
    }

    /// In-memory index for tests.
    pub fn in_memory(config: SearchConfig) -> SearchResult<Self> {
        let index = Index::create_in_ram(build_artist_schema());
        Self::from_index(index, config)
    }

    fn from_index(index: Index, config: SearchConfig) -> SearchResult<Self> {
        register_tokenizers(&index);

        let schema = index.schema();
        let id_field = schema
            .get_field(FIELD_ID)
            .map_err(|e| SearchError::SchemaFailed(format!("id field missing: {e}")))?;

        let writer = index
            .writer(config.writer_heap_size)
            .map_err(|e| SearchError::SchemaFailed(format!("failed to create writer: {e}")))?;

        // Visibility is driven explicitly: every commit path reloads the
        // reader, so a successful write is observable by the next search.
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::SchemaFailed(format!("failed to create reader: {e}")))?;

        Ok(Self {
            index,
            schema,
            id_field,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            config,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Replace a single document wholesale. Any failure is fatal.
    pub async fn upsert_document(&self, document: &ArtistDocument) -> SearchResult<()> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.id_field, document.document_id()));
        writer
            .add_document(document.to_tantivy_doc(&self.schema))
            .map_err(|e| SearchError::IndexingFailed(format!("failed to add document: {e}")))?;

        if self.config.realtime_indexing {
            writer
                .commit()
                .map_err(|e| SearchError::IndexingFailed(format!("failed to commit: {e}")))?;
            self.reader.reload()?;
        }

        tracing::debug!(artist_id = %document.id, name = %document.name, "Indexed artist");
        Ok(())
    }

    /// Submit a batch of documents as one bulk operation.
    ///
    /// Per-item failures are tallied: if every document fails the batch is
    /// fatal, otherwise the failures are logged and the batch continues.
    /// If the batched commit is rejected, the submission is retried exactly
    /// once in the two-phase (prepared) commit form before failing.
    /// Returns the number of documents submitted — not a success count.
    pub async fn bulk_upsert(&self, documents: &[ArtistDocument]) -> SearchResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let mut writer = self.writer.write().await;
        let mut failed = 0usize;

        for document in documents {
            writer.delete_term(Term::from_field_text(self.id_field, document.document_id()));
            if let Err(e) = writer.add_document(document.to_tantivy_doc(&self.schema)) {
                tracing::warn!(
                    artist_id = %document.id,
                    error = %e,
                    "Failed to add document to bulk submission"
                );
                failed += 1;
            }
        }

        if failed == documents.len() {
            return Err(SearchError::AllDocumentsFailed { failed });
        }
        if failed > 0 {
            tracing::warn!(
                failed,
                total = documents.len(),
                "Bulk submission had per-document failures; continuing"
            );
        }

        if let Err(commit_err) = writer.commit() {
            tracing::warn!(
                error = %commit_err,
                "Bulk commit rejected; retrying once with prepared commit"
            );
            writer.rollback().map_err(|e| {
                SearchError::IndexingFailed(format!("rollback after rejected bulk commit: {e}"))
            })?;
            for document in documents {
                writer.delete_term(Term::from_field_text(self.id_field, document.document_id()));
                if let Err(e) = writer.add_document(document.to_tantivy_doc(&self.schema)) {
                    tracing::warn!(artist_id = %document.id, error = %e, "Retry add failed");
                }
            }
            writer
                .prepare_commit()
                .and_then(|prepared| prepared.commit())
                .map_err(|e| {
                    SearchError::IndexingFailed(format!("bulk fallback submission failed: {e}"))
                })?;
        }

        self.reader.reload()?;
        Ok(documents.len() - failed)
    }

    /// Delete a document by id (when its backing record is deleted).
    pub async fn delete_document(&self, document_id: &str) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        writer.delete_term(Term::from_field_text(self.id_field, document_id));
        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("failed to commit deletion: {e}")))?;
        self.reader.reload()?;
        Ok(())
    }

    /// Commit pending changes and make them visible.
    pub async fn commit(&self) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("failed to commit: {e}")))?;
        self.reader.reload()?;
        Ok(())
    }

    /// Best-effort visibility check after a bulk submission: reload the
    /// reader and run a trivial query to warm it. Failures are logged and
    /// never propagate.
    pub fn warm_up(&self) {
        if let Err(e) = self.reader.reload() {
            tracing::debug!(error = %e, "Warm-up reload failed");
            return;
        }
        let searcher = self.reader.searcher();
        if let Err(e) = searcher.search(
            &AllQuery,
            &tantivy::collector::TopDocs::with_limit(1),
        ) {
            tracing::debug!(error = %e, "Warm-up query failed");
        }
    }

    /// Get index statistics
    pub fn stats(&self) -> SearchResult<IndexStats> {
        let searcher = self.reader.searcher();
        let total_documents = searcher.num_docs();
        let num_segments = searcher.segment_readers().len();

        let index_size_bytes = std::fs::read_dir(&self.config.index_path)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0);

        Ok(IndexStats {
            total_documents,
            index_size_bytes,
            num_segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::document::ArtistRecord;
    use serde_json::json;

    fn manager() -> IndexManager {
        IndexManager::in_memory(SearchConfig::default()).unwrap()
    }

    fn doc(id: &str, name: &str) -> ArtistDocument {
        ArtistDocument::from_record(&ArtistRecord::Fields(json!({ "id": id, "name": name })))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_stats() {
        let manager = manager();

        manager.upsert_document(&doc("1", "The Weeknd")).await.unwrap();

        let stats = manager.stats().unwrap();
        assert_eq!(stats.total_documents, 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let manager = manager();

        manager.upsert_document(&doc("1", "The Weeknd")).await.unwrap();
        manager.upsert_document(&doc("1", "The Weekend")).await.unwrap();

        let stats = manager.stats().unwrap();
        assert_eq!(stats.total_documents, 1);
    }

    #[tokio::test]
    async fn test_bulk_upsert_reports_submitted_count() {
        let manager = manager();

        let documents = vec![doc("1", "Drake"), doc("2", "Rihanna"), doc("3", "Beyonce")];
        let submitted = manager.bulk_upsert(&documents).await.unwrap();

        assert_eq!(submitted, 3);
        assert_eq!(manager.stats().unwrap().total_documents, 3);
    }

    #[tokio::test]
    async fn test_bulk_upsert_empty_is_noop() {
        let manager = manager();
        assert_eq!(manager.bulk_upsert(&[]).await.unwrap(), 0);
        assert_eq!(manager.stats().unwrap().total_documents, 0);
    }

    #[tokio::test]
    async fn test_delete_document() {
        let manager = manager();

        manager.upsert_document(&doc("1", "Drake")).await.unwrap();
        manager.delete_document("1").await.unwrap();

        assert_eq!(manager.stats().unwrap().total_documents, 0);
    }

    #[tokio::test]
    async fn test_warm_up_never_fails() {
        let manager = manager();
        manager.warm_up();
    }
}
