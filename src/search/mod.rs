//! Artist search: fuzzy, typo-tolerant lookup with autocomplete
//!
//! This module turns stored artist records into a searchable, suggestion-
//! capable index and answers free-text queries with ranked, multi-strategy
//! matching:
//!
//! - **Suggestion generation**: pure variant expansion of an artist's name
//!   (typos, phonetics, abbreviations, prefixes, spacing) feeding the
//!   completion field
//! - **Document transformation**: any accepted record shape is normalized
//!   into one canonical [`ArtistDocument`]
//! - **Schema management**: analyzers and field mappings, recreated
//!   destructively on migration
//! - **Bulk indexing**: batched submission with partial-failure tolerance
//!   and a best-effort visibility warm-up
//! - **Query engine**: a weighted disjunctive query (exact, fuzzy, prefix,
//!   phonetic, abbreviation, cross-field, substring) plus a fuzzy prefix
//!   completion suggester
//!
//! ```text
//! records ──▶ ArtistDocument ──▶ IndexManager ──▶ index storage
//! query text ──▶ QueryBuilder ──▶ index storage ──▶ ranked hits
//! ```
//!
//! # Example
//!
//! ```no_run
//! use searchify::search::{SearchConfig, SearchService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = SearchService::new(SearchConfig::default())?;
//!
//!     let results = service.search("the weekend", 20).await?;
//!     println!("{} artists matched", results.total);
//!
//!     let completions = service.suggest("the w", 10).await?;
//!     println!("{} suggestions", completions.len());
//!     Ok(())
//! }
//! ```

mod analyzer;
mod config;
mod document;
mod error;
mod index;
mod query;
mod service;
mod suggestions;

pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::{build_artist_schema, ArtistDocument, ArtistRecord, RawArtistRecord};
pub use error::{SearchError, SearchResult};
pub use index::{IndexManager, IndexStats};
pub use query::{BuiltQuery, ClauseWeight, MatchStrategy, QueryBuilder};
pub use service::{
    ArtistHit, ArtistSuggestion, BulkIndexOutcome, SearchResponse, SearchService,
};
pub use suggestions::{generate_suggestions, phonetic_key};
