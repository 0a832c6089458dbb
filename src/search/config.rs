//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Search subsystem configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Path to the search index directory
    pub index_path: PathBuf,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Commit (and make visible) every single-document write immediately
    pub realtime_indexing: bool,

    /// Result window: the hard cap on hits any one query may request
    pub max_results: usize,

    /// Default number of hits returned by `search` when the caller
    /// passes no limit
    pub default_search_limit: usize,

    /// Default number of entries returned by `suggest`
    pub default_suggest_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./data/music_artists"),
            writer_heap_size: 50_000_000, // 50MB
            realtime_indexing: true,
            // Sized for a single-node deployment in the tens of thousands
            // of documents.
            max_results: 50_000,
            default_search_limit: 20,
            default_suggest_limit: 10,
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = path;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn realtime_indexing(mut self, enabled: bool) -> Self {
        self.config.realtime_indexing = enabled;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn default_search_limit(mut self, limit: usize) -> Self {
        self.config.default_search_limit = limit;
        self
    }

    pub fn default_suggest_limit(mut self, limit: usize) -> Self {
        self.config.default_suggest_limit = limit;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
