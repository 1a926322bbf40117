use crate::metrics;
use crate::search_index::{SearchIndex, WorkshopDoc};
use crate::sync::ledger::SyncLedger;
use crate::sync::models::SyncLedgerEntry;
use crate::workshop::WorkshopStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct SyncDrainerSettings {
    pub drain_interval: Duration,
    pub batch_size: usize,
    pub replay_timeout: Duration,
    pub max_attempts: i32,
}

impl Default for SyncDrainerSettings {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(30),
            batch_size: 50,
            replay_timeout: Duration::from_secs(5),
            max_attempts: 10,
        }
    }
}

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub replayed: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

/// Background consumer of the sync ledger.
///
/// Replays never use the state captured when the entry was written; they
/// re-read the current primary row, so stale entries for the same workshop
/// coalesce into idempotent no-ops and racing updates converge on the last
/// primary state.
pub struct SyncDrainer {
    primary: Arc<dyn WorkshopStore>,
    index: Arc<dyn SearchIndex>,
    ledger: Arc<dyn SyncLedger>,
    settings: SyncDrainerSettings,
}

impl SyncDrainer {
    pub fn new(
        primary: Arc<dyn WorkshopStore>,
        index: Arc<dyn SearchIndex>,
        ledger: Arc<dyn SyncLedger>,
        settings: SyncDrainerSettings,
    ) -> Self {
        Self {
            primary,
            index,
            ledger,
            settings,
        }
    }

    pub async fn run(&self, cancellation_token: CancellationToken) {
        info!(
            "Sync drainer started, interval {:?}, batch size {}",
            self.settings.drain_interval, self.settings.batch_size
        );
        let mut interval = tokio::time::interval(self.settings.drain_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately, skip it so the initial
        // drain happens one interval after startup.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Sync drainer stopping");
                    return;
                }
                _ = interval.tick() => {
                    match self.drain_cycle().await {
                        Ok(report) if report.replayed + report.failed > 0 => {
                            info!(
                                "Drain cycle: {} replayed, {} failed, {} dead-lettered",
                                report.replayed, report.failed, report.dead_lettered
                            );
                        }
                        Ok(_) => {}
                        Err(e) => error!("Drain cycle failed: {:#}", e),
                    }
                }
            }
        }
    }

    /// Run one batch of replays. Directly callable so callers can drain on
    /// demand without waiting for the interval.
    pub async fn drain_cycle(&self) -> Result<DrainReport> {
        let batch = self.ledger.oldest_batch(self.settings.batch_size)?;
        let mut report = DrainReport::default();

        for entry in batch {
            match self.replay(&entry).await {
                Ok(()) => {
                    self.ledger.delete(&entry.id)?;
                    metrics::SYNC_REPLAYS_TOTAL.inc();
                    report.replayed += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    let attempts = self.ledger.record_attempt(&entry.id)?;
                    warn!(
                        "Replay of {} for workshop {} failed (attempt {}): {:#}",
                        entry.operation.as_db_str(),
                        entry.entity_id,
                        attempts,
                        e
                    );
                    if attempts >= self.settings.max_attempts {
                        self.ledger.mark_dead_lettered(&entry.id)?;
                        metrics::SYNC_DEAD_LETTERS_TOTAL.inc();
                        report.dead_lettered += 1;
                        error!(
                            "Ledger entry {} for workshop {} dead-lettered after {} attempts",
                            entry.id, entry.entity_id, attempts
                        );
                    }
                }
            }
        }

        metrics::SYNC_LEDGER_PENDING.set(self.ledger.pending_count()? as f64);
        Ok(report)
    }

    /// Replay one entry against the current primary state. A present and
    /// active workshop upserts its document; a missing or soft-deleted one
    /// is removed from the index.
    async fn replay(&self, entry: &SyncLedgerEntry) -> Result<()> {
        let current = self.primary.get_by_id(&entry.entity_id)?;
        match current {
            Some(workshop) if workshop.is_active() => {
                let doc = WorkshopDoc::from_workshop(&workshop);
                tokio::time::timeout(self.settings.replay_timeout, self.index.index_document(&doc))
                    .await
                    .context("Replay upsert timed out")??;
            }
            _ => {
                tokio::time::timeout(
                    self.settings.replay_timeout,
                    self.index.delete_document(&entry.entity_id),
                )
                .await
                .context("Replay delete timed out")??;
            }
        }
        Ok(())
    }
}
