//! Primary-to-index synchronization: the write-path coordinator, the
//! durable ledger of failed mirror writes, and the background drainer
//! that replays them until the index converges.

mod coordinator;
mod drainer;
mod ledger;
mod models;
mod schema;

pub use coordinator::{SearchOutcome, SyncCoordinator, SyncError};
pub use drainer::{DrainReport, SyncDrainer, SyncDrainerSettings};
pub use ledger::{SqliteSyncLedger, SyncLedger};
pub use models::{SyncEntityKind, SyncLedgerEntry, SyncOperation};
