use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Normalize a display name for matching: trimmed and lower-cased.
///
/// This is the single normalization step shared by the store (on create)
/// and the search document transformer — never an implicit side effect of
/// record construction.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Canonical artist record, owned by the record store.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    /// Unique identifier
    pub id: String,

    /// Display name
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Trimmed, lower-cased form of the name
    pub normalized_name: String,

    /// Genre tags (deduplicated by the caller)
    pub genres: Vec<String>,

    /// Profile image URI
    pub profile_picture: Option<String>,

    /// External reference URL
    pub spotify_url: String,

    /// Upstream catalog identifier
    pub spotify_id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new artist record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArtist {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub genres: Vec<String>,

    #[serde(default)]
    pub profile_picture: Option<String>,

    #[serde(default)]
    pub spotify_url: String,

    #[serde(default)]
    pub spotify_id: String,
}

impl Artist {
    /// Create a new artist record with a fresh identifier and timestamps.
    pub fn new(data: CreateArtist) -> Self {
        let now = Utc::now();
        let normalized_name = normalize_name(&data.name);

        Self {
            id: Uuid::new_v4().to_string(),
            name: data.name.trim().to_string(),
            normalized_name,
            genres: data.genres,
            profile_picture: data.profile_picture,
            spotify_url: data.spotify_url,
            spotify_id: data.spotify_id,
            created_at: now,
            updated_at: now,
        }
    }
}
