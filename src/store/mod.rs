//! Record store collaborator
//!
//! The canonical artist data lives outside the search subsystem. The
//! [`ArtistStore`] trait is the contract the search migration consumes
//! (paginated reads and a count); [`MemoryArtistStore`] is the in-process
//! implementation used for tests and local runs.

mod memory;

use crate::error::Result;
use crate::models::{Artist, CreateArtist};
use async_trait::async_trait;

pub use memory::MemoryArtistStore;

/// Storage abstraction for canonical artist records.
#[async_trait]
pub trait ArtistStore: Send + Sync {
    /// Create a single artist record.
    async fn create(&self, data: CreateArtist) -> Result<Artist>;

    /// Create many artist records, unordered; failures of individual
    /// records do not abort the batch.
    async fn bulk_create(&self, artists: Vec<CreateArtist>) -> Result<Vec<Artist>>;

    /// Fetch a record by id.
    async fn get(&self, id: &str) -> Result<Option<Artist>>;

    /// List records in stable order, paginated.
    async fn list(&self, page: u32, page_size: u32) -> Result<Vec<Artist>>;

    /// Total number of records.
    async fn count(&self) -> Result<u64>;
}
