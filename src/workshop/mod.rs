pub mod filter;
pub mod models;
mod schema;
mod sqlite_store;
mod store;

pub use models::{Workshop, WorkshopCard, WorkshopStatus};
pub use sqlite_store::SqliteWorkshopStore;
pub use store::{StoreError, WorkshopStore};
