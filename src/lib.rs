//! Searchify: fuzzy, typo-tolerant artist search
//!
//! The crate centers on the search indexing and query engine in
//! [`search`]: suggestion variant generation, document transformation,
//! index schema management, the bulk indexing pipeline and the weighted
//! multi-clause query engine. The record store ([`store`]) holding
//! canonical artist data and the migration binary are thin collaborators
//! around it.

pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
