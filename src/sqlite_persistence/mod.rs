//! Shared SQLite persistence machinery.
//!
//! Every database this server owns (workshops, search index, sync ledger)
//! goes through the same open-or-create, validate, migrate flow.

mod versioned_schema;

pub use versioned_schema::{Column, SqlType, Table, VersionedSchema, BASE_DB_VERSION};

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// Open an existing database or create a new one at the latest schema
/// version, then validate and run any pending migrations.
pub fn open_versioned<P: AsRef<Path>>(
    db_path: P,
    schemas: &[VersionedSchema],
) -> Result<Connection> {
    let conn = if db_path.as_ref().exists() {
        Connection::open_with_flags(
            &db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?
    } else {
        let conn = Connection::open(&db_path)?;
        schemas
            .last()
            .context("No schemas defined")?
            .create(&conn)?;
        info!("Created new database at {:?}", db_path.as_ref());
        conn
    };

    let db_version = conn
        .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
        .context("Failed to read database version")?
        - BASE_DB_VERSION as i64;

    if db_version < 0 {
        bail!(
            "Database {:?} version is below base version {}, not one of ours",
            db_path.as_ref(),
            BASE_DB_VERSION
        );
    }
    let version = db_version as usize;

    if version >= schemas.len() {
        bail!(
            "Database {:?} version {} is too new (max supported: {})",
            db_path.as_ref(),
            version,
            schemas.len() - 1
        );
    }

    schemas
        .get(version)
        .context("Failed to get schema")?
        .validate(&conn)?;

    migrate_if_needed(&conn, version, schemas)?;

    Ok(conn)
}

/// Create an in-memory database at the latest schema version, for tests.
pub fn create_in_memory(schemas: &[VersionedSchema]) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    schemas
        .last()
        .context("No schemas defined")?
        .create(&conn)?;
    Ok(conn)
}

fn migrate_if_needed(
    conn: &Connection,
    current_version: usize,
    schemas: &[VersionedSchema],
) -> Result<()> {
    let target_version = schemas.len() - 1;

    if current_version >= target_version {
        return Ok(());
    }

    info!(
        "Migrating database from version {} to {}",
        current_version, target_version
    );

    for schema in schemas.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!("Running migration to version {}", schema.version);
            migration_fn(conn)?;
        }
    }

    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + target_version),
        [],
    )?;

    Ok(())
}
