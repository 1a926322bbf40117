use crate::metrics;
use crate::search_index::{SearchIndex, WorkshopDoc};
use crate::sync::ledger::SyncLedger;
use crate::sync::models::{SyncLedgerEntry, SyncOperation};
use crate::workshop::filter::WorkshopFilter;
use crate::workshop::{StoreError, Workshop, WorkshopCard, WorkshopStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Available seats {requested} is below the {taken} seats already taken")]
    InvalidAvailableSeats { requested: u32, taken: u32 },
    #[error("Sync ledger failure: {0}")]
    Ledger(#[source] anyhow::Error),
}

/// Search result with a degradation flag: `degraded` means the index was
/// unreachable and the page came from the primary store instead.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub cards: Vec<WorkshopCard>,
    pub total: usize,
    pub degraded: bool,
}

/// Write-path orchestrator for the dual write.
///
/// Every mutation lands in the primary store first; the index mirror is
/// best-effort with a bounded timeout, and a failed mirror is recorded in
/// the sync ledger before the call returns. The caller never waits on a
/// slow index and never loses a mirror failure.
pub struct SyncCoordinator {
    primary: Arc<dyn WorkshopStore>,
    index: Arc<dyn SearchIndex>,
    ledger: Arc<dyn SyncLedger>,
    mirror_timeout: Duration,
    probe_timeout: Duration,
}

impl SyncCoordinator {
    pub fn new(
        primary: Arc<dyn WorkshopStore>,
        index: Arc<dyn SearchIndex>,
        ledger: Arc<dyn SyncLedger>,
        mirror_timeout: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            index,
            ledger,
            mirror_timeout,
            probe_timeout,
        }
    }

    pub async fn create(&self, workshop: Workshop) -> Result<Workshop, SyncError> {
        let created = self.primary.create(&workshop)?;
        self.mirror(&created, SyncOperation::Create).await?;
        Ok(created)
    }

    pub async fn update(&self, workshop: Workshop) -> Result<Workshop, SyncError> {
        let current = self
            .primary
            .get_by_id(&workshop.id)?
            .ok_or_else(|| StoreError::NotFound(workshop.id.clone()))?;
        if workshop.available_seats < current.taken_seats {
            return Err(SyncError::InvalidAvailableSeats {
                requested: workshop.available_seats,
                taken: current.taken_seats,
            });
        }
        let updated = self.primary.update(&workshop)?;
        self.mirror(&updated, SyncOperation::Update).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.primary.delete(id)?;
        self.mirror_delete(id, SyncOperation::Delete).await
    }

    /// Soft-delete keeps the primary row but removes the workshop from the
    /// index, so it disappears from search immediately.
    pub async fn soft_delete(&self, id: &str) -> Result<Workshop, SyncError> {
        let updated = self.primary.soft_delete(id)?;
        self.mirror_delete(id, SyncOperation::Delete).await?;
        Ok(updated)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Workshop>, SyncError> {
        Ok(self.primary.get_by_id(id)?)
    }

    /// Rich search through the index when it is healthy, primary-store
    /// fallback when it is not. Index trouble degrades the result, it never
    /// fails the call.
    pub async fn search(&self, filter: &WorkshopFilter) -> Result<SearchOutcome, SyncError> {
        let alive = tokio::time::timeout(self.probe_timeout, self.index.is_alive())
            .await
            .unwrap_or(false);

        if alive {
            match self.index.search(filter).await {
                Ok(page) => {
                    return Ok(SearchOutcome {
                        cards: page.hits,
                        total: page.total,
                        degraded: false,
                    });
                }
                Err(e) => {
                    warn!("Index search failed, falling back to primary store: {}", e);
                }
            }
        }

        metrics::SEARCH_FALLBACKS_TOTAL.inc();
        let (workshops, total) = self.primary.query(filter)?;
        Ok(SearchOutcome {
            cards: workshops.iter().map(WorkshopCard::from_workshop).collect(),
            total,
            degraded: true,
        })
    }

    /// Mirror the state captured at call time. Active workshops upsert their
    /// document; anything else is a delete from the index's point of view.
    async fn mirror(&self, workshop: &Workshop, operation: SyncOperation) -> Result<(), SyncError> {
        if workshop.is_active() {
            let doc = WorkshopDoc::from_workshop(workshop);
            let attempt =
                tokio::time::timeout(self.mirror_timeout, self.index.index_document(&doc)).await;
            match attempt {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => self.ledger_append(&workshop.id, operation, &e.to_string()),
                Err(_) => self.ledger_append(&workshop.id, operation, "mirror timed out"),
            }
        } else {
            self.mirror_delete(&workshop.id, operation).await
        }
    }

    async fn mirror_delete(&self, id: &str, operation: SyncOperation) -> Result<(), SyncError> {
        let attempt = tokio::time::timeout(self.mirror_timeout, self.index.delete_document(id)).await;
        match attempt {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => self.ledger_append(id, operation, &e.to_string()),
            Err(_) => self.ledger_append(id, operation, "mirror timed out"),
        }
    }

    /// A failed mirror must leave a durable trace before the call returns.
    /// If even the ledger write fails, that error is fatal to the call.
    fn ledger_append(
        &self,
        entity_id: &str,
        operation: SyncOperation,
        reason: &str,
    ) -> Result<(), SyncError> {
        warn!(
            "Mirror {} for workshop {} failed ({}), recording in sync ledger",
            operation.as_db_str(),
            entity_id,
            reason
        );
        metrics::MIRROR_FAILURES_TOTAL
            .with_label_values(&[operation.as_db_str()])
            .inc();
        let entry = SyncLedgerEntry::new(entity_id, operation);
        self.ledger.insert(&entry).map_err(SyncError::Ledger)
    }
}
