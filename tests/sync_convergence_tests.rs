//! End-to-end convergence scenarios over real on-disk stores: a coordinator
//! taking writes, an index that can be switched unhealthy, and a drainer
//! replaying the ledger until the index matches the primary store.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use workshop_server::search_index::{
    IndexError, SearchIndex, SearchPage, SqliteSearchIndex, WorkshopDoc,
};
use workshop_server::sync::{
    SqliteSyncLedger, SyncCoordinator, SyncDrainer, SyncDrainerSettings, SyncLedger,
    SyncLedgerEntry, SyncOperation,
};
use workshop_server::workshop::filter::WorkshopFilter;
use workshop_server::workshop::{SqliteWorkshopStore, Workshop, WorkshopStore};

/// Real SQLite index behind a health switch, standing in for a search
/// backend that goes down and comes back.
struct FlakyIndex {
    inner: SqliteSearchIndex,
    healthy: AtomicBool,
}

impl FlakyIndex {
    fn new(inner: SqliteSearchIndex) -> Self {
        Self {
            inner,
            healthy: AtomicBool::new(true),
        }
    }

    fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), IndexError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(IndexError::Unavailable("index is down".into()))
        }
    }
}

#[async_trait]
impl SearchIndex for FlakyIndex {
    async fn index_document(&self, doc: &WorkshopDoc) -> Result<(), IndexError> {
        self.check()?;
        self.inner.index_document(doc).await
    }

    async fn delete_document(&self, id: &str) -> Result<(), IndexError> {
        self.check()?;
        self.inner.delete_document(id).await
    }

    async fn search(&self, filter: &WorkshopFilter) -> Result<SearchPage, IndexError> {
        self.check()?;
        self.inner.search(filter).await
    }

    async fn is_alive(&self) -> bool {
        self.healthy.load(Ordering::SeqCst) && self.inner.is_alive().await
    }
}

struct TestHarness {
    // Holds the databases alive for the duration of the test
    _db_dir: TempDir,
    primary: Arc<SqliteWorkshopStore>,
    index: Arc<FlakyIndex>,
    ledger: Arc<SqliteSyncLedger>,
    coordinator: SyncCoordinator,
    drainer: SyncDrainer,
}

fn harness() -> TestHarness {
    harness_with_max_attempts(10)
}

fn harness_with_max_attempts(max_attempts: i32) -> TestHarness {
    let db_dir = TempDir::new().unwrap();
    let primary =
        Arc::new(SqliteWorkshopStore::new(db_dir.path().join("workshops.db")).unwrap());
    let index = Arc::new(FlakyIndex::new(
        SqliteSearchIndex::new(db_dir.path().join("search_index.db")).unwrap(),
    ));
    let ledger =
        Arc::new(SqliteSyncLedger::new(db_dir.path().join("sync_ledger.db")).unwrap());

    let coordinator = SyncCoordinator::new(
        primary.clone(),
        index.clone(),
        ledger.clone(),
        Duration::from_millis(300),
        Duration::from_millis(200),
    );
    let drainer = SyncDrainer::new(
        primary.clone(),
        index.clone(),
        ledger.clone(),
        SyncDrainerSettings {
            max_attempts,
            ..Default::default()
        },
    );

    TestHarness {
        _db_dir: db_dir,
        primary,
        index,
        ledger,
        coordinator,
        drainer,
    }
}

fn sample(title: &str) -> Workshop {
    Workshop::new("provider-1", title)
        .with_provider_title("Sample Provider")
        .with_keywords("sample")
        .with_age_range(6, 12)
        .with_price(50.0)
        .with_seats(10, 0)
        .with_rating(4.0)
}

#[tokio::test]
async fn test_create_during_outage_converges_after_heal() {
    let harness = harness();

    // Index goes down, a workshop is created anyway
    harness.index.set_healthy(false);
    let created = harness.coordinator.create(sample("Chess")).await.unwrap();

    // Primary has it, searches are served degraded from the primary store
    assert!(harness.coordinator.get_by_id(&created.id).unwrap().is_some());
    let outcome = harness
        .coordinator
        .search(&WorkshopFilter::default())
        .await
        .unwrap();
    assert!(outcome.degraded);
    assert_eq!(outcome.total, 1);
    assert_eq!(harness.ledger.pending_count().unwrap(), 1);

    // Index heals, the drain replays the ledger
    harness.index.set_healthy(true);
    let report = harness.drainer.drain_cycle().await.unwrap();
    assert_eq!(report.replayed, 1);
    assert_eq!(harness.ledger.pending_count().unwrap(), 0);

    // Search now comes from the index, same content, not degraded
    let outcome = harness
        .coordinator
        .search(&WorkshopFilter::default())
        .await
        .unwrap();
    assert!(!outcome.degraded);
    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.cards[0].title, "Chess");
}

#[tokio::test]
async fn test_writes_never_block_on_failing_index() {
    let harness = harness();
    harness.index.set_healthy(false);

    // Every kind of write succeeds while the index fails each call
    let mut workshop = harness.coordinator.create(sample("Chess")).await.unwrap();
    workshop.price = 75.0;
    harness.coordinator.update(workshop.clone()).await.unwrap();
    harness.coordinator.soft_delete(&workshop.id).await.unwrap();

    let other = harness.coordinator.create(sample("Painting")).await.unwrap();
    harness.coordinator.delete(&other.id).await.unwrap();

    // Every failed mirror left a ledger entry
    assert_eq!(harness.ledger.pending_count().unwrap(), 5);
}

#[tokio::test]
async fn test_replay_is_idempotent() {
    let harness = harness();
    harness.index.set_healthy(false);
    let created = harness.coordinator.create(sample("Chess")).await.unwrap();

    harness.index.set_healthy(true);
    harness.drainer.drain_cycle().await.unwrap();
    assert_eq!(harness.index.inner.document_count().unwrap(), 1);
    let doc_before = harness.index.inner.get_document(&created.id).unwrap();

    // A crash between the mirror write and the ledger delete would leave the
    // entry behind; a duplicate replay must not change the index.
    harness
        .ledger
        .insert(&SyncLedgerEntry::new(&created.id, SyncOperation::Create))
        .unwrap();
    let report = harness.drainer.drain_cycle().await.unwrap();
    assert_eq!(report.replayed, 1);

    assert_eq!(harness.index.inner.document_count().unwrap(), 1);
    assert_eq!(
        harness.index.inner.get_document(&created.id).unwrap(),
        doc_before
    );
}

#[tokio::test]
async fn test_fallback_search_matches_primary_query() {
    let harness = harness();
    for (title, price) in [("Chess basics", 30.0), ("Chess masters", 90.0), ("Pottery", 40.0)] {
        harness
            .coordinator
            .create(sample(title).with_price(price))
            .await
            .unwrap();
    }

    let filter = WorkshopFilter {
        text: Some("chess".into()),
        max_price: Some(50.0),
        ..Default::default()
    };

    harness.index.set_healthy(false);
    let outcome = harness.coordinator.search(&filter).await.unwrap();
    assert!(outcome.degraded);

    let (expected, expected_total) = harness.primary.query(&filter).unwrap();
    assert_eq!(outcome.total, expected_total);
    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.cards.len(), expected.len());
    assert_eq!(outcome.cards[0].id, expected[0].id);
    assert_eq!(outcome.cards[0].title, "Chess basics");
}

#[tokio::test]
async fn test_racing_updates_converge_to_last_primary_state() {
    let harness = harness();
    let created = harness.coordinator.create(sample("Chess")).await.unwrap();

    harness.index.set_healthy(false);
    let mut first = created.clone();
    first.price = 60.0;
    let mut second = created.clone();
    second.price = 80.0;

    // Two racing updates; both mirrors fail and ledger in some order
    harness.coordinator.update(first).await.unwrap();
    harness.coordinator.update(second).await.unwrap();
    assert_eq!(harness.ledger.pending_count().unwrap(), 2);

    harness.index.set_healthy(true);
    harness.drainer.drain_cycle().await.unwrap();

    // Replays read current truth, so the index holds the last primary state
    // no matter the ledger order
    let doc = harness.index.inner.get_document(&created.id).unwrap().unwrap();
    let current = harness.primary.get_by_id(&created.id).unwrap().unwrap();
    assert_eq!(doc.price, current.price);
    assert_eq!(doc.price, 80.0);
    assert_eq!(harness.ledger.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn test_poisoned_entry_dead_letters_after_budget() {
    let harness = harness_with_max_attempts(3);
    harness.index.set_healthy(false);
    let created = harness.coordinator.create(sample("Chess")).await.unwrap();

    // Index never recovers; the entry burns through its attempt budget
    for _ in 0..3 {
        harness.drainer.drain_cycle().await.unwrap();
    }

    assert_eq!(harness.ledger.pending_count().unwrap(), 0);
    let dead = harness.ledger.dead_lettered(10).unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].entity_id, created.id);

    // Later cycles skip the dead-lettered row entirely
    let report = harness.drainer.drain_cycle().await.unwrap();
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_soft_delete_during_outage_clears_index_on_drain() {
    let harness = harness();
    let created = harness.coordinator.create(sample("Chess")).await.unwrap();
    assert_eq!(harness.index.inner.document_count().unwrap(), 1);

    harness.index.set_healthy(false);
    harness.coordinator.soft_delete(&created.id).await.unwrap();

    // Stale document still visible until the drain runs
    assert_eq!(harness.index.inner.document_count().unwrap(), 1);

    harness.index.set_healthy(true);
    harness.drainer.drain_cycle().await.unwrap();

    assert_eq!(harness.index.inner.document_count().unwrap(), 0);
    // Primary still has the soft-deleted row
    assert!(harness.primary.get_by_id(&created.id).unwrap().is_some());
}
