use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const WORKSHOPS_TABLE: Table = Table {
    name: "workshops",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true),
        sqlite_column!("provider_id", SqlType::Text, non_null = true),
        sqlite_column!("title", SqlType::Text, non_null = true),
        sqlite_column!("provider_title", SqlType::Text, non_null = true),
        sqlite_column!("keywords", SqlType::Text, non_null = true),
        sqlite_column!("min_age", SqlType::Integer, non_null = true),
        sqlite_column!("max_age", SqlType::Integer, non_null = true),
        sqlite_column!("price", SqlType::Real, non_null = true),
        sqlite_column!("available_seats", SqlType::Integer, non_null = true),
        sqlite_column!("taken_seats", SqlType::Integer, non_null = true, default_value = Some("0")),
        sqlite_column!("rating", SqlType::Real, non_null = true, default_value = Some("0")),
        sqlite_column!("status", SqlType::Text, non_null = true),
        sqlite_column!("created_at", SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_workshops_provider_id", "provider_id"),
        ("idx_workshops_status", "status"),
    ],
};

pub const SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[WORKSHOPS_TABLE],
    migration: None,
}];
