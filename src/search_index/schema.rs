use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const WORKSHOP_DOCS_TABLE: Table = Table {
    name: "workshop_docs",
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
        sqlite_column!("rating", SqlType::Real, non_null = true, default_value = Some("0")),
        sqlite_column!("created_at", SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_workshop_docs_provider_id", "provider_id"),
        ("idx_workshop_docs_rating", "rating"),
    ],
};

pub const SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[WORKSHOP_DOCS_TABLE],
    migration: None,
}];
