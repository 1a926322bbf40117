pub mod config;
pub mod metrics;
pub mod search_index;
pub mod sqlite_persistence;
pub mod sync;
pub mod workshop;

pub use config::{AppConfig, CliConfig};
pub use search_index::{SearchIndex, SqliteSearchIndex};
pub use sync::{SyncCoordinator, SyncDrainer, SyncLedger};
pub use workshop::{SqliteWorkshopStore, Workshop, WorkshopStore};
