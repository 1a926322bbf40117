use crate::sqlite_persistence;
use crate::sync::models::{SyncEntityKind, SyncLedgerEntry, SyncOperation};
use crate::sync::schema::SCHEMAS;
use anyhow::{bail, Result};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const LEDGER_COLUMNS: &str =
    "id, entity_id, entity_kind, operation, operation_date, attempt_count, dead_lettered";

/// Durable outbox of failed mirror writes.
///
/// Only the coordinator inserts and only the drainer consumes; nothing else
/// touches these rows.
pub trait SyncLedger: Send + Sync {
    fn insert(&self, entry: &SyncLedgerEntry) -> Result<()>;

    /// Oldest pending entries first, dead-lettered rows excluded.
    fn oldest_batch(&self, limit: usize) -> Result<Vec<SyncLedgerEntry>>;

    fn delete(&self, entry_id: &str) -> Result<()>;

    /// Increment and return the entry's attempt count.
    fn record_attempt(&self, entry_id: &str) -> Result<i32>;

    fn mark_dead_lettered(&self, entry_id: &str) -> Result<()>;

    fn pending_count(&self) -> Result<usize>;

    /// Dead-lettered rows, newest first, for operator inspection.
    fn dead_lettered(&self, limit: usize) -> Result<Vec<SyncLedgerEntry>>;
}

pub struct SqliteSyncLedger {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSyncLedger {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let connection = sqlite_persistence::open_versioned(db_path, SCHEMAS)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let connection = sqlite_persistence::create_in_memory(SCHEMAS)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn row_to_entry(row: &Row) -> rusqlite::Result<SyncLedgerEntry> {
        let kind_str: String = row.get(2)?;
        let operation_str: String = row.get(3)?;
        let entity_kind = SyncEntityKind::from_db_str(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("Unknown entity kind: {}", kind_str).into(),
            )
        })?;
        let operation = SyncOperation::from_db_str(&operation_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("Unknown sync operation: {}", operation_str).into(),
            )
        })?;
        Ok(SyncLedgerEntry {
            id: row.get(0)?,
            entity_id: row.get(1)?,
            entity_kind,
            operation,
            operation_date: row.get(4)?,
            attempt_count: row.get(5)?,
            dead_lettered: row.get::<_, i32>(6)? != 0,
        })
    }
}

impl SyncLedger for SqliteSyncLedger {
    fn insert(&self, entry: &SyncLedgerEntry) -> Result<()> {
        let connection = self.connection.lock().unwrap();
        connection.execute(
            &format!(
                "INSERT INTO sync_ledger ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                LEDGER_COLUMNS
            ),
            params![
                entry.id,
                entry.entity_id,
                entry.entity_kind.as_db_str(),
                entry.operation.as_db_str(),
                entry.operation_date,
                entry.attempt_count,
                entry.dead_lettered as i32,
            ],
        )?;
        Ok(())
    }

    fn oldest_batch(&self, limit: usize) -> Result<Vec<SyncLedgerEntry>> {
        let connection = self.connection.lock().unwrap();
        let mut stmt = connection.prepare(&format!(
            "SELECT {} FROM sync_ledger WHERE dead_lettered = 0 \
             ORDER BY operation_date ASC, id ASC LIMIT ?1",
            LEDGER_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![limit as i64], Self::row_to_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn delete(&self, entry_id: &str) -> Result<()> {
        let connection = self.connection.lock().unwrap();
        connection.execute("DELETE FROM sync_ledger WHERE id = ?1", params![entry_id])?;
        Ok(())
    }

    fn record_attempt(&self, entry_id: &str) -> Result<i32> {
        let connection = self.connection.lock().unwrap();
        let updated = connection.execute(
            "UPDATE sync_ledger SET attempt_count = attempt_count + 1 WHERE id = ?1",
            params![entry_id],
        )?;
        if updated == 0 {
            bail!("Ledger entry {} not found", entry_id);
        }
        let count: i32 = connection.query_row(
            "SELECT attempt_count FROM sync_ledger WHERE id = ?1",
            params![entry_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn mark_dead_lettered(&self, entry_id: &str) -> Result<()> {
        let connection = self.connection.lock().unwrap();
        let updated = connection.execute(
            "UPDATE sync_ledger SET dead_lettered = 1 WHERE id = ?1",
            params![entry_id],
        )?;
        if updated == 0 {
            bail!("Ledger entry {} not found", entry_id);
        }
        Ok(())
    }

    fn pending_count(&self) -> Result<usize> {
        let connection = self.connection.lock().unwrap();
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM sync_ledger WHERE dead_lettered = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn dead_lettered(&self, limit: usize) -> Result<Vec<SyncLedgerEntry>> {
        let connection = self.connection.lock().unwrap();
        let mut stmt = connection.prepare(&format!(
            "SELECT {} FROM sync_ledger WHERE dead_lettered = 1 \
             ORDER BY operation_date DESC LIMIT ?1",
            LEDGER_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![limit as i64], Self::row_to_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}
