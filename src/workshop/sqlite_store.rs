use crate::sqlite_persistence;
use crate::workshop::filter::{SqlValue, WorkshopFilter};
use crate::workshop::models::{Workshop, WorkshopStatus};
use crate::workshop::schema::SCHEMAS;
use crate::workshop::store::{StoreError, WorkshopStore};
use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const WORKSHOP_COLUMNS: &str = "id, provider_id, title, provider_title, keywords, \
     min_age, max_age, price, available_seats, taken_seats, rating, status, created_at";

pub struct SqliteWorkshopStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteWorkshopStore {
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

    fn row_to_workshop(row: &Row) -> rusqlite::Result<Workshop> {
        let status_str: String = row.get(11)?;
        let status = WorkshopStatus::from_db_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                11,
                rusqlite::types::Type::Text,
                format!("Unknown workshop status: {}", status_str).into(),
            )
        })?;
        Ok(Workshop {
            id: row.get(0)?,
            provider_id: row.get(1)?,
            title: row.get(2)?,
            provider_title: row.get(3)?,
            keywords: row.get(4)?,
            min_age: row.get(5)?,
            max_age: row.get(6)?,
            price: row.get(7)?,
            available_seats: row.get(8)?,
            taken_seats: row.get(9)?,
            rating: row.get(10)?,
            status,
            created_at: row.get(12)?,
        })
    }

    fn exists(connection: &Connection, id: &str) -> Result<bool, StoreError> {
        let found = connection
            .query_row("SELECT 1 FROM workshops WHERE id = ?1", params![id], |_| {
                Ok(true)
            })
            .map(|_| true);
        match found {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl WorkshopStore for SqliteWorkshopStore {
    fn create(&self, workshop: &Workshop) -> Result<Workshop, StoreError> {
        let connection = self.connection.lock().unwrap();
        if Self::exists(&connection, &workshop.id)? {
            return Err(StoreError::Conflict(workshop.id.clone()));
        }
        connection.execute(
            &format!(
                "INSERT INTO workshops ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                WORKSHOP_COLUMNS
            ),
            params![
                workshop.id,
                workshop.provider_id,
                workshop.title,
                workshop.provider_title,
                workshop.keywords,
                workshop.min_age,
                workshop.max_age,
                workshop.price,
                workshop.available_seats,
                workshop.taken_seats,
                workshop.rating,
                workshop.status.as_db_str(),
                workshop.created_at,
            ],
        )?;
        Ok(workshop.clone())
    }

    fn update(&self, workshop: &Workshop) -> Result<Workshop, StoreError> {
        let connection = self.connection.lock().unwrap();
        let updated = connection.execute(
            "UPDATE workshops SET provider_id = ?2, title = ?3, provider_title = ?4, \
             keywords = ?5, min_age = ?6, max_age = ?7, price = ?8, \
             available_seats = ?9, taken_seats = ?10, rating = ?11, status = ?12 \
             WHERE id = ?1",
            params![
                workshop.id,
                workshop.provider_id,
                workshop.title,
                workshop.provider_title,
                workshop.keywords,
                workshop.min_age,
                workshop.max_age,
                workshop.price,
                workshop.available_seats,
                workshop.taken_seats,
                workshop.rating,
                workshop.status.as_db_str(),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(workshop.id.clone()));
        }
        Ok(workshop.clone())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let connection = self.connection.lock().unwrap();
        let deleted = connection.execute("DELETE FROM workshops WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn soft_delete(&self, id: &str) -> Result<Workshop, StoreError> {
        {
            let connection = self.connection.lock().unwrap();
            let updated = connection.execute(
                "UPDATE workshops SET status = ?2 WHERE id = ?1",
                params![id, WorkshopStatus::SoftDeleted.as_db_str()],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        self.get_by_id(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Workshop>, StoreError> {
        let connection = self.connection.lock().unwrap();
        let result = connection.query_row(
            &format!("SELECT {} FROM workshops WHERE id = ?1", WORKSHOP_COLUMNS),
            params![id],
            Self::row_to_workshop,
        );
        match result {
            Ok(workshop) => Ok(Some(workshop)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Workshop>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let connection = self.connection.lock().unwrap();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = connection.prepare(&format!(
            "SELECT {} FROM workshops WHERE id IN ({}) ORDER BY id",
            WORKSHOP_COLUMNS, placeholders
        ))?;
        let workshops = stmt
            .query_map(params_from_iter(ids.iter()), Self::row_to_workshop)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(workshops)
    }

    fn query(&self, filter: &WorkshopFilter) -> Result<(Vec<Workshop>, usize), StoreError> {
        if !filter.is_valid() {
            return Ok((Vec::new(), 0));
        }
        let (clause, criterion_params) = filter.to_criterion().to_sql();
        let connection = self.connection.lock().unwrap();

        // Soft-deleted workshops never surface in queries.
        let where_clause = format!("WHERE status = 'ACTIVE' AND ({})", clause);

        let total: usize = connection.query_row(
            &format!("SELECT COUNT(*) FROM workshops {}", where_clause),
            params_from_iter(criterion_params.iter()),
            |row| row.get::<_, i64>(0).map(|n| n as usize),
        )?;

        let mut page_params: Vec<SqlValue> = criterion_params;
        page_params.push(SqlValue::Integer(filter.size as i64));
        page_params.push(SqlValue::Integer(filter.from as i64));

        let mut stmt = connection.prepare(&format!(
            "SELECT {} FROM workshops {} {} LIMIT ? OFFSET ?",
            WORKSHOP_COLUMNS,
            where_clause,
            filter.order_by.sql_clause()
        ))?;
        let workshops = stmt
            .query_map(params_from_iter(page_params.iter()), Self::row_to_workshop)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((workshops, total))
    }

    fn count(&self) -> Result<usize, StoreError> {
        let connection = self.connection.lock().unwrap();
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM workshops", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
