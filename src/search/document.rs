//! Search document structures and the record transformer
//!
//! Normalizes the record shapes handed to the indexer into one canonical
//! [`ArtistDocument`] and owns the physical field contract of the index.

use crate::models::{normalize_name, Artist};
use crate::search::analyzer::{TOKENIZER_EDGE_NGRAM, TOKENIZER_KEYWORD, TOKENIZER_WORDS};
use crate::search::error::{SearchError, SearchResult};
use crate::search::suggestions::{abbreviation_variants, generate_suggestions, phonetic_key};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tantivy::schema::{
    IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, STRING,
};
use tantivy::TantivyDocument;

// Index field names. The document-level names are the wire contract;
// autocomplete clients depend on `suggest` semantics and on these names
// staying stable. Derived sub-fields carry a `_`-separated suffix.
pub(crate) const FIELD_ID: &str = "id";
pub(crate) const FIELD_NAME: &str = "name";
pub(crate) const FIELD_NAME_NGRAM: &str = "name_ngram";
pub(crate) const FIELD_NAME_KEYWORD: &str = "name_keyword";
pub(crate) const FIELD_NAME_ABBREVIATION: &str = "name_abbreviation";
pub(crate) const FIELD_NAME_PHONETIC: &str = "name_phonetic";
pub(crate) const FIELD_SUGGEST: &str = "suggest";
pub(crate) const FIELD_NORMALIZED_NAME: &str = "normalizedName";
pub(crate) const FIELD_NORMALIZED_NAME_KEYWORD: &str = "normalizedName_keyword";
pub(crate) const FIELD_GENRES: &str = "genres";
pub(crate) const FIELD_PROFILE_PICTURE: &str = "profilePicture";
pub(crate) const FIELD_SPOTIFY_URL: &str = "spotifyUrl";
pub(crate) const FIELD_SPOTIFY_ID: &str = "spotifyId";
pub(crate) const FIELD_CREATED_AT: &str = "createdAt";
pub(crate) const FIELD_UPDATED_AT: &str = "updatedAt";

/// Completion inputs longer than this are truncated (wire contract).
const MAX_SUGGEST_INPUT_LEN: usize = 50;

/// The record shapes the transformer accepts, resolved in declaration
/// order: rich domain model first, then the storage-driver wrapper's inner
/// document, then direct field access on a plain bag.
#[derive(Debug, Clone)]
pub enum ArtistRecord {
    /// Rich domain object from the record store.
    Model(Artist),
    /// Raw storage-driver wrapper carrying the fields under an inner doc.
    Raw(RawArtistRecord),
    /// Plain field bag, e.g. decoded straight from JSON.
    Fields(Value),
}

impl From<Artist> for ArtistRecord {
    fn from(artist: Artist) -> Self {
        ArtistRecord::Model(artist)
    }
}

impl From<&Artist> for ArtistRecord {
    fn from(artist: &Artist) -> Self {
        ArtistRecord::Model(artist.clone())
    }
}

/// Storage-driver envelope: the record's fields live under `doc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArtistRecord {
    pub doc: Value,
}

/// One indexed, denormalized representation of an artist record.
///
/// Produced fresh on every (re)index and replaced wholesale, never
/// patched. The suggestion set is a deterministic function of the name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistDocument {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
    pub genres: Vec<String>,
    pub profile_picture: Option<String>,
    pub spotify_url: String,
    pub spotify_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Autocomplete inputs, regenerated from the name on every index.
    pub suggest: Vec<String>,

    /// Abbreviation forms backing the `name_abbreviation` sub-field.
    #[serde(skip)]
    pub abbreviations: Vec<String>,

    /// Phonetic key backing the `name_phonetic` sub-field.
    #[serde(skip)]
    pub phonetic: String,
}

impl ArtistDocument {
    /// Transform a record into an indexable document.
    ///
    /// Rejects records missing an identifier or a name; in batch contexts
    /// the caller surfaces this as a per-item failure rather than dropping
    /// the record silently.
    pub fn from_record(record: &ArtistRecord) -> SearchResult<Self> {
        let fields = match record {
            ArtistRecord::Model(artist) => ResolvedFields::from_model(artist),
            ArtistRecord::Raw(raw) => ResolvedFields::from_value(&raw.doc),
            ArtistRecord::Fields(value) => ResolvedFields::from_value(value),
        };

        let id = fields.id.trim().to_string();
        let name = fields.name.trim().to_string();
        if id.is_empty() && name.is_empty() {
            return Err(SearchError::InvalidRecord(
                "record has neither identifier nor name".to_string(),
            ));
        }
        if id.is_empty() {
            return Err(SearchError::InvalidRecord(format!(
                "record {name:?} has no identifier"
            )));
        }
        if name.is_empty() {
            return Err(SearchError::InvalidRecord(format!(
                "record {id} has no name"
            )));
        }

        let normalized_name = fields
            .normalized_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| normalize_name(&name));

        let suggest = generate_suggestions(&name)
            .into_iter()
            .map(|input| truncate_chars(&input, MAX_SUGGEST_INPUT_LEN))
            .collect();

        Ok(Self {
            id,
            abbreviations: abbreviation_variants(&name),
            phonetic: phonetic_key(&name),
            suggest,
            normalized_name,
            name,
            genres: fields.genres,
            profile_picture: fields.profile_picture,
            spotify_url: fields.spotify_url,
            spotify_id: fields.spotify_id,
            created_at: fields.created_at.unwrap_or_else(Utc::now),
            updated_at: fields.updated_at.unwrap_or_else(Utc::now),
        })
    }

    /// Primary key under which this document is indexed.
    pub fn document_id(&self) -> &str {
        &self.id
    }

    /// Convert to a Tantivy document against the artist schema.
    pub fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();

        if let Ok(field) = schema.get_field(FIELD_ID) {
            doc.add_text(field, &self.id);
        }
        if let Ok(field) = schema.get_field(FIELD_NAME) {
            doc.add_text(field, &self.name);
        }
        // The name feeds every analyzed sub-field.
        if let Ok(field) = schema.get_field(FIELD_NAME_NGRAM) {
            doc.add_text(field, &self.name);
        }
        if let Ok(field) = schema.get_field(FIELD_NAME_KEYWORD) {
            doc.add_text(field, &self.name);
        }
        if let Ok(field) = schema.get_field(FIELD_NAME_ABBREVIATION) {
            for abbreviation in &self.abbreviations {
                doc.add_text(field, abbreviation);
            }
        }
        if let Ok(field) = schema.get_field(FIELD_NAME_PHONETIC) {
            doc.add_text(field, &self.phonetic);
        }
        if let Ok(field) = schema.get_field(FIELD_SUGGEST) {
            for input in &self.suggest {
                doc.add_text(field, input);
            }
        }
        if let Ok(field) = schema.get_field(FIELD_NORMALIZED_NAME) {
            doc.add_text(field, &self.normalized_name);
        }
        if let Ok(field) = schema.get_field(FIELD_NORMALIZED_NAME_KEYWORD) {
            doc.add_text(field, &self.normalized_name);
        }
        if let Ok(field) = schema.get_field(FIELD_GENRES) {
            for genre in &self.genres {
                doc.add_text(field, genre);
            }
        }
        if let Some(ref picture) = self.profile_picture {
            if let Ok(field) = schema.get_field(FIELD_PROFILE_PICTURE) {
                doc.add_text(field, picture);
            }
        }
        if let Ok(field) = schema.get_field(FIELD_SPOTIFY_URL) {
            doc.add_text(field, &self.spotify_url);
        }
        if let Ok(field) = schema.get_field(FIELD_SPOTIFY_ID) {
            doc.add_text(field, &self.spotify_id);
        }
        if let Ok(field) = schema.get_field(FIELD_CREATED_AT) {
            doc.add_date(
                field,
                tantivy::DateTime::from_timestamp_secs(self.created_at.timestamp()),
            );
        }
        if let Ok(field) = schema.get_field(FIELD_UPDATED_AT) {
            doc.add_date(
                field,
                tantivy::DateTime::from_timestamp_secs(self.updated_at.timestamp()),
            );
        }

        doc
    }
}

/// Fields pulled out of whichever record shape was handed in.
struct ResolvedFields {
    id: String,
    name: String,
    normalized_name: Option<String>,
    genres: Vec<String>,
    profile_picture: Option<String>,
    spotify_url: String,
    spotify_id: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl ResolvedFields {
    fn from_model(artist: &Artist) -> Self {
        Self {
            id: artist.id.clone(),
            name: artist.name.clone(),
            normalized_name: Some(artist.normalized_name.clone()),
            genres: artist.genres.clone(),
            profile_picture: artist.profile_picture.clone(),
            spotify_url: artist.spotify_url.clone(),
            spotify_id: artist.spotify_id.clone(),
            created_at: Some(artist.created_at),
            updated_at: Some(artist.updated_at),
        }
    }

    fn from_value(value: &Value) -> Self {
        Self {
            id: string_field(value, &["id", "_id"]),
            name: string_field(value, &["name"]),
            normalized_name: opt_string_field(value, "normalizedName"),
            genres: value
                .get("genres")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            profile_picture: opt_string_field(value, "profilePicture"),
            spotify_url: string_field(value, &["spotifyUrl"]),
            spotify_id: string_field(value, &["spotifyId"]),
            created_at: date_field(value, "createdAt"),
            updated_at: date_field(value, "updatedAt"),
        }
    }
}

/// First present key wins; numbers are coerced to their string form so a
/// numeric driver id still yields a stable primary key.
fn string_field(value: &Value, keys: &[&str]) -> String {
    for key in keys {
        match value.get(key) {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    String::new()
}

fn opt_string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn date_field(value: &Value, key: &str) -> Option<DateTime<Utc>> {
    value
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Build the artist index schema.
///
/// Exact-only fields use tantivy's raw `STRING` indexing; analyzed fields
/// reference the analyzers registered in [`crate::search::analyzer`].
pub fn build_artist_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field(FIELD_ID, STRING | STORED);

    builder.add_text_field(FIELD_NAME, text_options(TOKENIZER_WORDS, true));
    builder.add_text_field(FIELD_NAME_NGRAM, text_options(TOKENIZER_EDGE_NGRAM, false));
    builder.add_text_field(FIELD_NAME_KEYWORD, keyword_options(TOKENIZER_KEYWORD));
    builder.add_text_field(FIELD_NAME_ABBREVIATION, keyword_options(TOKENIZER_KEYWORD));
    builder.add_text_field(FIELD_NAME_PHONETIC, text_options(TOKENIZER_WORDS, false));

    builder.add_text_field(FIELD_SUGGEST, keyword_options(TOKENIZER_KEYWORD));

    builder.add_text_field(FIELD_NORMALIZED_NAME, text_options(TOKENIZER_WORDS, true));
    builder.add_text_field(
        FIELD_NORMALIZED_NAME_KEYWORD,
        keyword_options(TOKENIZER_KEYWORD),
    );

    builder.add_text_field(FIELD_GENRES, STRING | STORED);
    builder.add_text_field(FIELD_PROFILE_PICTURE, STRING | STORED);
    builder.add_text_field(FIELD_SPOTIFY_URL, STRING | STORED);
    builder.add_text_field(FIELD_SPOTIFY_ID, STRING | STORED);

    builder.add_date_field(FIELD_CREATED_AT, INDEXED | STORED | FAST);
    builder.add_date_field(FIELD_UPDATED_AT, INDEXED | STORED | FAST);

    builder.build()
}

fn text_options(tokenizer: &str, stored: bool) -> TextOptions {
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(tokenizer)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let options = TextOptions::default().set_indexing_options(indexing);
    if stored {
        options.set_stored()
    } else {
        options
    }
}

fn keyword_options(tokenizer: &str) -> TextOptions {
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(tokenizer)
        .set_index_option(IndexRecordOption::Basic);
    TextOptions::default().set_indexing_options(indexing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_artist() -> Artist {
        Artist {
            id: "artist-1".to_string(),
            name: "The Weeknd".to_string(),
            normalized_name: "the weeknd".to_string(),
            genres: vec!["r&b".to_string(), "pop".to_string()],
            profile_picture: Some("https://img.example/weeknd.jpg".to_string()),
            spotify_url: "https://open.spotify.com/artist/1Xyo".to_string(),
            spotify_id: "1Xyo4u8uXC1ZmMpatF05PJ".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_transform_domain_model() {
        let doc = ArtistDocument::from_record(&sample_artist().into()).unwrap();

        assert_eq!(doc.id, "artist-1");
        assert_eq!(doc.normalized_name, "the weeknd");
        assert!(doc.suggest.contains(&"the weeknd".to_string()));
        assert!(doc.abbreviations.contains(&"tw".to_string()));
    }

    #[test]
    fn test_transform_raw_wrapper() {
        let record = ArtistRecord::Raw(RawArtistRecord {
            doc: json!({
                "_id": "abc123",
                "name": "Daft Punk",
                "genres": ["electronic"],
                "spotifyUrl": "https://open.spotify.com/artist/4tZ",
                "spotifyId": "4tZwfgrHOc3mvqYlEYSvVi",
            }),
        });

        let doc = ArtistDocument::from_record(&record).unwrap();
        assert_eq!(doc.id, "abc123");
        assert_eq!(doc.normalized_name, "daft punk");
        assert_eq!(doc.genres, vec!["electronic".to_string()]);
    }

    #[test]
    fn test_transform_field_bag_with_numeric_id() {
        let record = ArtistRecord::Fields(json!({
            "id": 42,
            "name": "Beyonce",
            "createdAt": "2023-05-01T12:00:00Z",
        }));

        let doc = ArtistDocument::from_record(&record).unwrap();
        assert_eq!(doc.id, "42");
        assert_eq!(doc.created_at.to_rfc3339(), "2023-05-01T12:00:00+00:00");
    }

    #[test]
    fn test_rejects_record_without_id_or_name() {
        let record = ArtistRecord::Fields(json!({ "genres": ["pop"] }));
        let err = ArtistDocument::from_record(&record).unwrap_err();
        assert!(matches!(err, SearchError::InvalidRecord(_)));
    }

    #[test]
    fn test_rejects_record_without_name() {
        let record = ArtistRecord::Fields(json!({ "id": "x1" }));
        let err = ArtistDocument::from_record(&record).unwrap_err();
        assert!(err.to_string().contains("no name"));
    }

    #[test]
    fn test_suggestions_regenerate_identically() {
        let first = ArtistDocument::from_record(&sample_artist().into()).unwrap();
        let second = ArtistDocument::from_record(&sample_artist().into()).unwrap();
        assert_eq!(first.suggest, second.suggest);
    }

    #[test]
    fn test_suggest_inputs_capped_at_fifty_chars() {
        let record = ArtistRecord::Fields(json!({
            "id": "long",
            "name": "An Extremely Long Artist Name That Keeps Going And Going Forever",
        }));

        let doc = ArtistDocument::from_record(&record).unwrap();
        assert!(doc.suggest.iter().all(|s| s.chars().count() <= 50));
    }

    #[test]
    fn test_schema_has_contract_fields() {
        let schema = build_artist_schema();
        for field in [
            FIELD_ID,
            FIELD_NAME,
            FIELD_NAME_NGRAM,
            FIELD_NAME_KEYWORD,
            FIELD_NAME_ABBREVIATION,
            FIELD_NAME_PHONETIC,
            FIELD_SUGGEST,
            FIELD_NORMALIZED_NAME,
            FIELD_NORMALIZED_NAME_KEYWORD,
            FIELD_GENRES,
            FIELD_PROFILE_PICTURE,
            FIELD_SPOTIFY_URL,
            FIELD_SPOTIFY_ID,
            FIELD_CREATED_AT,
            FIELD_UPDATED_AT,
        ] {
            assert!(schema.get_field(field).is_ok(), "missing field {field}");
        }
    }
}
