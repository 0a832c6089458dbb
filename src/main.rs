//! Full-reindex migration: stream every artist record from the store into
//! a freshly recreated search index.

use anyhow::Context;
use clap::Parser;
use searchify::models::CreateArtist;
use searchify::search::{ArtistRecord, IndexManager, SearchService};
use searchify::store::{ArtistStore, MemoryArtistStore};
use searchify::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "searchify-migrate", about = "Rebuild the artist search index")]
struct Args {
    /// JSON seed file (array of artists) loaded into the store first
    #[arg(long, env = "SEARCHIFY_SEED")]
    seed: Option<PathBuf>,

    /// Records per bulk submission (overrides configuration)
    #[arg(long)]
    batch_size: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "searchify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::load().context("failed to load configuration")?;

    tracing::info!("Starting search index migration (searchify v{})", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(MemoryArtistStore::new());
    let seed_path = args.seed.or(config.migration.seed_path.clone());
    if let Some(path) = seed_path {
        seed_store(store.as_ref(), &path).await?;
    }

    let total = store.count().await?;
    if total == 0 {
        tracing::warn!("No artists found. Run collection first.");
        return Ok(());
    }
    tracing::info!(total, "Artists to migrate");

    // Destructive rebuild: schema failures abort the migration.
    let manager = Arc::new(
        IndexManager::create(config.search.clone()).context("index creation failed")?,
    );
    let service = SearchService::with_manager(manager, config.search.clone());

    let batch_size = args.batch_size.unwrap_or(config.migration.batch_size).max(1);
    let mut processed: u64 = 0;
    let mut page = 0u32;

    loop {
        let artists = store.list(page, batch_size).await?;
        if artists.is_empty() {
            break;
        }

        let records: Vec<ArtistRecord> = artists.into_iter().map(ArtistRecord::from).collect();
        let outcome = service
            .bulk_index_artists(&records)
            .await
            .context("bulk indexing failed")?;

        processed += records.len() as u64;
        let progress = (processed as f64 / total as f64) * 100.0;
        tracing::info!(
            submitted = outcome.submitted,
            skipped = outcome.skipped,
            "Migrated {processed}/{total} artists ({progress:.1}%)"
        );

        page += 1;
    }

    let stats = service.stats().context("failed to read index stats")?;
    tracing::info!(
        indexed = stats.total_documents,
        segments = stats.num_segments,
        size_bytes = stats.index_size_bytes,
        "Migration completed: {total} records -> {} documents",
        stats.total_documents
    );

    Ok(())
}

async fn seed_store(store: &dyn ArtistStore, path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let artists: Vec<CreateArtist> =
        serde_json::from_str(&raw).context("seed file is not a JSON array of artists")?;

    let created = store.bulk_create(artists).await?;
    tracing::info!(count = created.len(), path = %path.display(), "Seeded artist store");
    Ok(())
}
