//! Main search service implementation

use crate::search::config::SearchConfig;
use crate::search::document::{
    ArtistDocument, ArtistRecord, FIELD_CREATED_AT, FIELD_GENRES, FIELD_ID, FIELD_NAME,
    FIELD_PROFILE_PICTURE, FIELD_SPOTIFY_ID, FIELD_SPOTIFY_URL, FIELD_UPDATED_AT,
};
use crate::search::error::{SearchError, SearchResult};
use crate::search::index::{IndexManager, IndexStats};
use crate::search::query::QueryBuilder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::schema::Value;
use tantivy::TantivyDocument;

/// A single search result hit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistHit {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub profile_picture: Option<String>,
    pub spotify_url: String,
    pub spotify_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Relevance score
    pub score: f32,

    /// Highlighted fragment of the name, when the query matched it
    pub highlight: Option<String>,
}

/// Search response with ranked hits and metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Ranked hits, up to the requested limit
    pub artists: Vec<ArtistHit>,

    /// True total match count, not capped by the limit
    pub total: usize,

    /// Measured query latency in milliseconds
    pub took_ms: u64,
}

/// Lightweight autocomplete entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSuggestion {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub profile_picture: Option<String>,
    pub spotify_url: String,
    pub score: f32,
}

/// Outcome of a bulk indexing call.
///
/// `submitted` counts documents handed to the storage engine — not
/// documents verified as indexed; callers must not assume 1:1 success.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BulkIndexOutcome {
    pub submitted: usize,
    pub skipped: usize,
}

/// Main search service
pub struct SearchService {
    index_manager: Arc<IndexManager>,
    config: SearchConfig,
}

impl SearchService {
    /// Open (or create) the index at the configured path and serve it.
    pub fn new(config: SearchConfig) -> SearchResult<Self> {
        let index_manager = Arc::new(IndexManager::open(config.clone())?);
        Ok(Self {
            index_manager,
            config,
        })
    }

    /// Serve a pre-built index manager (composition-root injection).
    pub fn with_manager(index_manager: Arc<IndexManager>, config: SearchConfig) -> Self {
        Self {
            index_manager,
            config,
        }
    }

    /// In-memory service for tests.
    pub fn in_memory(config: SearchConfig) -> SearchResult<Self> {
        let index_manager = Arc::new(IndexManager::in_memory(config.clone())?);
        Ok(Self {
            index_manager,
            config,
        })
    }

    /// Free-text artist search.
    ///
    /// Blank text returns an empty response without touching the index.
    /// Storage engine failures propagate — callers must see index
    /// unavailability rather than silently degrade.
    pub async fn search(&self, text: &str, limit: usize) -> SearchResult<SearchResponse> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SearchResponse::default());
        }

        let start = std::time::Instant::now();

        let builder = QueryBuilder::new(
            self.index_manager.schema().clone(),
            self.index_manager.index().clone(),
        );
        let Some(built) = builder.search_query(text)? else {
            return Ok(SearchResponse::default());
        };

        let searcher = self.index_manager.reader().searcher();
        let limit = if limit == 0 {
            self.config.default_search_limit
        } else {
            limit.min(self.config.max_results)
        };

        let top_docs = searcher
            .search(&*built.query, &TopDocs::with_limit(limit))
            .map_err(|e| SearchError::SearchFailed(format!("search execution failed: {e}")))?;
        let total = searcher
            .search(&*built.query, &Count)
            .map_err(|e| SearchError::SearchFailed(format!("count failed: {e}")))?;

        let schema = self.index_manager.schema();
        let mut artists = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| SearchError::SearchFailed(format!("failed to load hit: {e}")))?;
            artists.push(self.to_hit(&doc, schema, score, text));
        }

        let took_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(query = text, total, took_ms, "Search executed");

        Ok(SearchResponse {
            artists,
            total,
            took_ms,
        })
    }

    /// Autocomplete suggestions for a prefix.
    ///
    /// Empty prefixes return an empty list without touching the index.
    /// This is a non-critical UX path: storage engine failures degrade to
    /// an empty list (logged), they do not propagate.
    pub async fn suggest(&self, prefix: &str, limit: usize) -> SearchResult<Vec<ArtistSuggestion>> {
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        let limit = if limit == 0 {
            self.config.default_suggest_limit
        } else {
            limit
        };

        match self.suggest_inner(prefix, limit) {
            Ok(suggestions) => Ok(suggestions),
            Err(e) => {
                tracing::warn!(prefix, error = %e, "Suggestion lookup failed; returning empty");
                Ok(Vec::new())
            }
        }
    }

    fn suggest_inner(&self, prefix: &str, limit: usize) -> SearchResult<Vec<ArtistSuggestion>> {
        let builder = QueryBuilder::new(
            self.index_manager.schema().clone(),
            self.index_manager.index().clone(),
        );
        let Some(query) = builder.suggest_query(prefix)? else {
            return Ok(Vec::new());
        };

        let searcher = self.index_manager.reader().searcher();
        // Over-fetch to survive duplicate suppression.
        let candidates = limit.max(1) * 2;

        let top_docs = searcher
            .search(&*query, &TopDocs::with_limit(candidates))
            .map_err(|e| SearchError::SearchFailed(format!("suggest execution failed: {e}")))?;

        let schema = self.index_manager.schema();
        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();

        for (score, doc_address) in top_docs {
            if suggestions.len() >= limit {
                break;
            }
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| SearchError::SearchFailed(format!("failed to load suggestion: {e}")))?;

            let id = get_text(&doc, schema, FIELD_ID).unwrap_or_default();
            if id.is_empty() || !seen.insert(id.clone()) {
                continue;
            }

            suggestions.push(ArtistSuggestion {
                id,
                name: get_text(&doc, schema, FIELD_NAME).unwrap_or_default(),
                genres: get_all_text(&doc, schema, FIELD_GENRES),
                profile_picture: get_text(&doc, schema, FIELD_PROFILE_PICTURE),
                spotify_url: get_text(&doc, schema, FIELD_SPOTIFY_URL).unwrap_or_default(),
                score,
            });
        }

        Ok(suggestions)
    }

    /// Index a single artist record. Any failure is fatal and propagated.
    pub async fn index_artist(&self, record: &ArtistRecord) -> SearchResult<()> {
        let document = ArtistDocument::from_record(record)?;
        self.index_manager.upsert_document(&document).await
    }

    /// Bulk-index a batch of artist records.
    ///
    /// Empty batches are a no-op. Records failing validation are skipped
    /// (logged); a batch where every record is invalid is fatal. Batch
    /// sizing is the caller's responsibility — the batch is submitted as
    /// one bulk operation.
    pub async fn bulk_index_artists(
        &self,
        records: &[ArtistRecord],
    ) -> SearchResult<BulkIndexOutcome> {
        if records.is_empty() {
            return Ok(BulkIndexOutcome::default());
        }

        let mut documents = Vec::with_capacity(records.len());
        let mut skipped = 0usize;
        for record in records {
            match ArtistDocument::from_record(record) {
                Ok(document) => documents.push(document),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping invalid record in bulk index");
                    skipped += 1;
                }
            }
        }

        if documents.is_empty() {
            return Err(SearchError::AllDocumentsFailed {
                failed: records.len(),
            });
        }

        let submitted = self.index_manager.bulk_upsert(&documents).await?;
        tracing::info!(submitted, skipped, "Bulk indexed artists");

        // Best-effort visibility warm-up; never blocks or fails the call.
        let manager = Arc::clone(&self.index_manager);
        tokio::spawn(async move {
            manager.warm_up();
        });

        Ok(BulkIndexOutcome { submitted, skipped })
    }

    /// Delete an artist's document (when the backing record is deleted).
    pub async fn delete_artist(&self, artist_id: &str) -> SearchResult<()> {
        self.index_manager.delete_document(artist_id).await
    }

    /// Get index statistics
    pub fn stats(&self) -> SearchResult<IndexStats> {
        self.index_manager.stats()
    }

    fn to_hit(
        &self,
        doc: &TantivyDocument,
        schema: &tantivy::schema::Schema,
        score: f32,
        query: &str,
    ) -> ArtistHit {
        let name = get_text(doc, schema, FIELD_NAME).unwrap_or_default();
        let highlight = highlight_name(&name, query);

        ArtistHit {
            id: get_text(doc, schema, FIELD_ID).unwrap_or_default(),
            genres: get_all_text(doc, schema, FIELD_GENRES),
            profile_picture: get_text(doc, schema, FIELD_PROFILE_PICTURE),
            spotify_url: get_text(doc, schema, FIELD_SPOTIFY_URL).unwrap_or_default(),
            spotify_id: get_text(doc, schema, FIELD_SPOTIFY_ID).unwrap_or_default(),
            created_at: get_date(doc, schema, FIELD_CREATED_AT),
            updated_at: get_date(doc, schema, FIELD_UPDATED_AT),
            score,
            highlight,
            name,
        }
    }
}

fn get_text(doc: &TantivyDocument, schema: &tantivy::schema::Schema, name: &str) -> Option<String> {
    schema.get_field(name).ok().and_then(|field| {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    })
}

fn get_all_text(doc: &TantivyDocument, schema: &tantivy::schema::Schema, name: &str) -> Vec<String> {
    schema
        .get_field(name)
        .ok()
        .map(|field| {
            doc.get_all(field)
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn get_date(
    doc: &TantivyDocument,
    schema: &tantivy::schema::Schema,
    name: &str,
) -> Option<DateTime<Utc>> {
    schema.get_field(name).ok().and_then(|field| {
        doc.get_first(field)
            .and_then(|v| v.as_datetime())
            .and_then(|dt| DateTime::from_timestamp(dt.into_timestamp_secs(), 0))
    })
}

/// Wrap the first case-insensitive occurrence of the query in the name.
fn highlight_name(name: &str, query: &str) -> Option<String> {
    let lower_name = name.to_lowercase();
    let lower_query = query.trim().to_lowercase();
    if lower_query.is_empty() {
        return None;
    }
    let start = lower_name.find(&lower_query)?;
    // Byte offsets from the lowercased string are only safe to apply to the
    // original when lowercasing preserved lengths.
    if lower_name.len() != name.len() {
        return None;
    }
    let end = start + lower_query.len();
    if !name.is_char_boundary(start) || !name.is_char_boundary(end) {
        return None;
    }
    Some(format!(
        "{}<em>{}</em>{}",
        &name[..start],
        &name[start..end],
        &name[end..]
    ))
}
