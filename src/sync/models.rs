use serde::{Deserialize, Serialize};

/// Kind of entity a ledger entry refers to. Only workshops are synchronized
/// today; the tag keeps the ledger format open for further entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncEntityKind {
    Workshop,
}

impl SyncEntityKind {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SyncEntityKind::Workshop => "WORKSHOP",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "WORKSHOP" => Some(SyncEntityKind::Workshop),
            _ => None,
        }
    }
}

/// Primary-store operation whose mirror write failed.
///
/// Create and Update both replay as an idempotent upsert of current state,
/// but the distinction is kept for operator visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl SyncOperation {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SyncOperation::Create => "CREATE",
            SyncOperation::Update => "UPDATE",
            SyncOperation::Delete => "DELETE",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(SyncOperation::Create),
            "UPDATE" => Some(SyncOperation::Update),
            "DELETE" => Some(SyncOperation::Delete),
            _ => None,
        }
    }
}

/// One pending mirror failure. Inserted after a successful primary write
/// whose index write failed; removed once a drain replay succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLedgerEntry {
    pub id: String,
    pub entity_id: String,
    pub entity_kind: SyncEntityKind,
    pub operation: SyncOperation,
    /// When the mirror failure was recorded (Unix timestamp).
    pub operation_date: i64,
    pub attempt_count: i32,
    pub dead_lettered: bool,
}

impl SyncLedgerEntry {
    pub fn new(entity_id: impl Into<String>, operation: SyncOperation) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entity_id: entity_id.into(),
            entity_kind: SyncEntityKind::Workshop,
            operation,
            operation_date: chrono::Utc::now().timestamp(),
            attempt_count: 0,
            dead_lettered: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_db_round_trip() {
        for op in [
            SyncOperation::Create,
            SyncOperation::Update,
            SyncOperation::Delete,
        ] {
            assert_eq!(SyncOperation::from_db_str(op.as_db_str()), Some(op));
        }
        assert_eq!(SyncOperation::from_db_str("UPSERT"), None);
    }

    #[test]
    fn test_entity_kind_db_round_trip() {
        assert_eq!(
            SyncEntityKind::from_db_str(SyncEntityKind::Workshop.as_db_str()),
            Some(SyncEntityKind::Workshop)
        );
        assert_eq!(SyncEntityKind::from_db_str("PROVIDER"), None);
    }

    #[test]
    fn test_new_entry_starts_fresh() {
        let entry = SyncLedgerEntry::new("workshop-1", SyncOperation::Update);
        assert!(!entry.id.is_empty());
        assert_eq!(entry.entity_id, "workshop-1");
        assert_eq!(entry.entity_kind, SyncEntityKind::Workshop);
        assert_eq!(entry.attempt_count, 0);
        assert!(!entry.dead_lettered);
    }
}
