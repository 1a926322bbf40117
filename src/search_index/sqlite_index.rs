use crate::search_index::schema::SCHEMAS;
use crate::search_index::{IndexError, SearchIndex, SearchPage, WorkshopDoc};
use crate::sqlite_persistence;
use crate::workshop::filter::{SqlValue, WorkshopFilter};
use anyhow::Result;
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const DOC_COLUMNS: &str = "id, provider_id, title, provider_title, keywords, \
     min_age, max_age, price, available_seats, rating, created_at";

/// Search index backed by a second SQLite database.
///
/// It stores only the denormalized projection of active workshops, so the
/// criterion tree applies directly with no status filter.
pub struct SqliteSearchIndex {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSearchIndex {
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

    pub fn document_count(&self) -> Result<usize, IndexError> {
        let connection = self.connection.lock().unwrap();
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM workshop_docs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn get_document(&self, id: &str) -> Result<Option<WorkshopDoc>, IndexError> {
        let connection = self.connection.lock().unwrap();
        let result = connection.query_row(
            &format!("SELECT {} FROM workshop_docs WHERE id = ?1", DOC_COLUMNS),
            params![id],
            Self::row_to_doc,
        );
        match result {
            Ok(doc) => Ok(Some(doc)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn row_to_doc(row: &Row) -> rusqlite::Result<WorkshopDoc> {
        Ok(WorkshopDoc {
            id: row.get(0)?,
            provider_id: row.get(1)?,
            title: row.get(2)?,
            provider_title: row.get(3)?,
            keywords: row.get(4)?,
            min_age: row.get(5)?,
            max_age: row.get(6)?,
            price: row.get(7)?,
            available_seats: row.get(8)?,
            rating: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

#[async_trait]
impl SearchIndex for SqliteSearchIndex {
    async fn index_document(&self, doc: &WorkshopDoc) -> Result<(), IndexError> {
        let connection = self.connection.lock().unwrap();
        connection.execute(
            &format!(
                "INSERT OR REPLACE INTO workshop_docs ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                DOC_COLUMNS
            ),
            params![
                doc.id,
                doc.provider_id,
                doc.title,
                doc.provider_title,
                doc.keywords,
                doc.min_age,
                doc.max_age,
                doc.price,
                doc.available_seats,
                doc.rating,
                doc.created_at,
            ],
        )?;
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<(), IndexError> {
        let connection = self.connection.lock().unwrap();
        // Absent document is success, deletes must be replayable.
        connection.execute("DELETE FROM workshop_docs WHERE id = ?1", params![id])?;
        Ok(())
    }

    async fn search(&self, filter: &WorkshopFilter) -> Result<SearchPage, IndexError> {
        if !filter.is_valid() {
            return Ok(SearchPage::empty());
        }
        let (clause, criterion_params) = filter.to_criterion().to_sql();
        let connection = self.connection.lock().unwrap();

        let total: usize = connection.query_row(
            &format!("SELECT COUNT(*) FROM workshop_docs WHERE {}", clause),
            params_from_iter(criterion_params.iter()),
            |row| row.get::<_, i64>(0).map(|n| n as usize),
        )?;

        let mut page_params: Vec<SqlValue> = criterion_params;
        page_params.push(SqlValue::Integer(filter.size as i64));
        page_params.push(SqlValue::Integer(filter.from as i64));

        let mut stmt = connection.prepare(&format!(
            "SELECT {} FROM workshop_docs WHERE {} {} LIMIT ? OFFSET ?",
            DOC_COLUMNS,
            clause,
            filter.order_by.sql_clause()
        ))?;
        let hits = stmt
            .query_map(params_from_iter(page_params.iter()), Self::row_to_doc)?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .iter()
            .map(WorkshopDoc::to_card)
            .collect();

        Ok(SearchPage { hits, total })
    }

    async fn is_alive(&self) -> bool {
        let connection = self.connection.lock().unwrap();
        connection
            .query_row("SELECT 1", [], |_| Ok(()))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workshop::filter::OrderBy;
    use crate::workshop::Workshop;

    fn doc(title: &str, rating: f64) -> WorkshopDoc {
        WorkshopDoc::from_workshop(
            &Workshop::new("provider-1", title)
                .with_provider_title("Sample Provider")
                .with_keywords("sample")
                .with_age_range(6, 12)
                .with_price(50.0)
                .with_rating(rating),
        )
    }

    #[tokio::test]
    async fn test_index_then_search() {
        let index = SqliteSearchIndex::in_memory().unwrap();
        index.index_document(&doc("Chess", 4.0)).await.unwrap();
        index.index_document(&doc("Painting", 3.0)).await.unwrap();

        let filter = WorkshopFilter {
            text: Some("chess".into()),
            ..Default::default()
        };
        let page = index.search(&filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.hits[0].title, "Chess");
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let index = SqliteSearchIndex::in_memory().unwrap();
        let mut document = doc("Chess", 4.0);

        index.index_document(&document).await.unwrap();
        index.index_document(&document).await.unwrap();
        assert_eq!(index.document_count().unwrap(), 1);

        document.title = "Chess advanced".to_string();
        index.index_document(&document).await.unwrap();
        assert_eq!(index.document_count().unwrap(), 1);
        assert_eq!(
            index.get_document(&document.id).unwrap().unwrap().title,
            "Chess advanced"
        );
    }

    #[tokio::test]
    async fn test_delete_absent_document_is_success() {
        let index = SqliteSearchIndex::in_memory().unwrap();
        index.delete_document("no-such-doc").await.unwrap();

        let document = doc("Chess", 4.0);
        index.index_document(&document).await.unwrap();
        index.delete_document(&document.id).await.unwrap();
        index.delete_document(&document.id).await.unwrap();
        assert_eq!(index.document_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_default_ranking_is_rating_desc() {
        let index = SqliteSearchIndex::in_memory().unwrap();
        index.index_document(&doc("Low", 1.0)).await.unwrap();
        index.index_document(&doc("High", 5.0)).await.unwrap();
        index.index_document(&doc("Mid", 3.0)).await.unwrap();

        let page = index.search(&WorkshopFilter::default()).await.unwrap();
        let titles: Vec<&str> = page.hits.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["High", "Mid", "Low"]);
    }

    #[tokio::test]
    async fn test_price_ordering_and_pagination() {
        let index = SqliteSearchIndex::in_memory().unwrap();
        for (title, price) in [("A", 30.0), ("B", 10.0), ("C", 20.0)] {
            let mut document = doc(title, 0.0);
            document.price = price;
            index.index_document(&document).await.unwrap();
        }

        let filter = WorkshopFilter {
            order_by: OrderBy::PriceAsc,
            size: 2,
            ..Default::default()
        };
        let page = index.search(&filter).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.hits[0].title, "B");
        assert_eq!(page.hits[1].title, "C");
    }

    #[tokio::test]
    async fn test_invalid_filter_yields_empty_page() {
        let index = SqliteSearchIndex::in_memory().unwrap();
        index.index_document(&doc("Chess", 4.0)).await.unwrap();

        let filter = WorkshopFilter {
            min_price: Some(100.0),
            max_price: Some(10.0),
            ..Default::default()
        };
        let page = index.search(&filter).await.unwrap();
        assert_eq!(page, SearchPage::empty());
    }

    #[tokio::test]
    async fn test_is_alive() {
        let index = SqliteSearchIndex::in_memory().unwrap();
        assert!(index.is_alive().await);
    }
}
