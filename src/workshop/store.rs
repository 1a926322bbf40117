use crate::workshop::filter::WorkshopFilter;
use crate::workshop::models::Workshop;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Workshop not found: {0}")]
    NotFound(String),
    #[error("Workshop already exists: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Authoritative workshop storage. A failure here is fatal to the
/// triggering call; there is no fallback for the primary store.
pub trait WorkshopStore: Send + Sync {
    /// Insert a new workshop. Fails with [`StoreError::Conflict`] if the id
    /// is already taken.
    fn create(&self, workshop: &Workshop) -> Result<Workshop, StoreError>;

    /// Replace an existing workshop's mutable fields.
    fn update(&self, workshop: &Workshop) -> Result<Workshop, StoreError>;

    /// Remove a workshop row entirely.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Mark a workshop soft-deleted, keeping the row for audit and restore.
    fn soft_delete(&self, id: &str) -> Result<Workshop, StoreError>;

    fn get_by_id(&self, id: &str) -> Result<Option<Workshop>, StoreError>;

    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Workshop>, StoreError>;

    /// Filtered page of active workshops plus the total match count.
    /// This is the fallback read path when the search index is down.
    fn query(&self, filter: &WorkshopFilter) -> Result<(Vec<Workshop>, usize), StoreError>;

    fn count(&self) -> Result<usize, StoreError>;
}
