//! The queryable search projection of the workshop catalog.
//!
//! Documents here are derived and possibly stale; the workshop store is
//! always the source of truth. Writes are idempotent upserts/deletes so a
//! replay can safely repeat them.

mod schema;
mod sqlite_index;

pub use sqlite_index::SqliteSearchIndex;

use crate::workshop::filter::WorkshopFilter;
use crate::workshop::{Workshop, WorkshopCard};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Search index unavailable: {0}")]
    Unavailable(String),
    #[error("Search index rejected the operation: {0}")]
    Rejected(String),
    #[error("Search index database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Denormalized workshop document, the shape the index stores and ranks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopDoc {
    pub id: String,
    pub provider_id: String,
    pub title: String,
    pub provider_title: String,
    pub keywords: String,
    pub min_age: u32,
    pub max_age: u32,
    pub price: f64,
    pub available_seats: u32,
    pub rating: f64,
    pub created_at: i64,
}

impl WorkshopDoc {
    pub fn from_workshop(workshop: &Workshop) -> Self {
        Self {
            id: workshop.id.clone(),
            provider_id: workshop.provider_id.clone(),
            title: workshop.title.clone(),
            provider_title: workshop.provider_title.clone(),
            keywords: workshop.keywords.clone(),
            min_age: workshop.min_age,
            max_age: workshop.max_age,
            price: workshop.price,
            available_seats: workshop.available_seats,
            rating: workshop.rating,
            created_at: workshop.created_at,
        }
    }

    pub fn to_card(&self) -> WorkshopCard {
        WorkshopCard {
            id: self.id.clone(),
            provider_id: self.provider_id.clone(),
            title: self.title.clone(),
            provider_title: self.provider_title.clone(),
            min_age: self.min_age,
            max_age: self.max_age,
            price: self.price,
            available_seats: self.available_seats,
            rating: self.rating,
        }
    }
}

/// One page of ranked search hits plus the total match count.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub hits: Vec<WorkshopCard>,
    pub total: usize,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            total: 0,
        }
    }
}

/// The search-side of the dual write. All operations are asynchronous and
/// callers bound them with timeouts; the index is allowed to be slow or down.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Upsert a document. Indexing the same document twice is a no-op.
    async fn index_document(&self, doc: &WorkshopDoc) -> Result<(), IndexError>;

    /// Remove a document. Deleting an absent document is success.
    async fn delete_document(&self, id: &str) -> Result<(), IndexError>;

    async fn search(&self, filter: &WorkshopFilter) -> Result<SearchPage, IndexError>;

    /// Cheap liveness probe. `true` means "worth trying", not a guarantee
    /// that the next call will succeed.
    async fn is_alive(&self) -> bool;
}
