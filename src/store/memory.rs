use crate::error::Result;
use crate::models::{Artist, CreateArtist};
use crate::store::ArtistStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use validator::Validate;

/// In-memory artist store (for tests and local runs)
#[derive(Clone)]
pub struct MemoryArtistStore {
    artists: Arc<DashMap<String, Artist>>,
}

impl MemoryArtistStore {
    pub fn new() -> Self {
        Self {
            artists: Arc::new(DashMap::new()),
        }
    }
}

impl Default for MemoryArtistStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtistStore for MemoryArtistStore {
    async fn create(&self, data: CreateArtist) -> Result<Artist> {
        data.validate()?;

        let artist = Artist::new(data);
        self.artists.insert(artist.id.clone(), artist.clone());

        tracing::debug!(artist_id = %artist.id, name = %artist.name, "Artist created");
        Ok(artist)
    }

    async fn bulk_create(&self, artists: Vec<CreateArtist>) -> Result<Vec<Artist>> {
        let mut created = Vec::with_capacity(artists.len());

        for data in artists {
            match self.create(data).await {
                Ok(artist) => created.push(artist),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping invalid artist in bulk create");
                }
            }
        }

        tracing::info!(count = created.len(), "Bulk created artists");
        Ok(created)
    }

    async fn get(&self, id: &str) -> Result<Option<Artist>> {
        Ok(self.artists.get(id).map(|entry| entry.clone()))
    }

    async fn list(&self, page: u32, page_size: u32) -> Result<Vec<Artist>> {
        let mut artists: Vec<Artist> = self
            .artists
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        // DashMap iteration order is arbitrary; sort for stable pagination.
        artists.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let start = (page as usize) * (page_size as usize);
        Ok(artists
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.artists.len() as u64)
    }
}
