use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const SYNC_LEDGER_TABLE: Table = Table {
    name: "sync_ledger",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true),
        sqlite_column!("entity_id", SqlType::Text, non_null = true),
        sqlite_column!("entity_kind", SqlType::Text, non_null = true),
        sqlite_column!("operation", SqlType::Text, non_null = true),
        sqlite_column!("operation_date", SqlType::Integer, non_null = true),
        sqlite_column!("attempt_count", SqlType::Integer, non_null = true, default_value = Some("0")),
        sqlite_column!("dead_lettered", SqlType::Integer, non_null = true, default_value = Some("0")),
    ],
    indices: &[
        ("idx_sync_ledger_pending", "dead_lettered, operation_date"),
        ("idx_sync_ledger_entity_id", "entity_id"),
    ],
};

pub const SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[SYNC_LEDGER_TABLE],
    migration: None,
}];
