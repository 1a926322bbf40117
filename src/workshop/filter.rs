//! Typed filter criteria shared by the primary store and the search index.
//!
//! A [`WorkshopFilter`] compiles to a [`Criterion`] tree, and both SQLite
//! backends translate that same tree to a WHERE clause. Keeping a single
//! translation is what makes the fallback read path return the same rows
//! the index would have matched.

use rusqlite::types::{ToSql, ToSqlOutput, Value};

/// A parameter value bound into a generated SQL clause.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Text(v) => ToSqlOutput::Owned(Value::Text(v.clone())),
        })
    }
}

/// A composable query predicate over workshop columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Column equals a value.
    Equals { column: &'static str, value: SqlValue },
    /// Column contains a substring, case-insensitively.
    Contains { column: &'static str, needle: String },
    /// Column within an inclusive range; either bound may be open.
    Range {
        column: &'static str,
        min: Option<SqlValue>,
        max: Option<SqlValue>,
    },
    /// All sub-criteria must hold.
    All(Vec<Criterion>),
    /// At least one sub-criterion must hold.
    Any(Vec<Criterion>),
}

impl Criterion {
    /// Render this tree to a SQL condition and its bound parameters.
    ///
    /// An empty conjunction renders as `1=1` so callers can always embed the
    /// result after a WHERE without special-casing.
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut params = Vec::new();
        let clause = self.render(&mut params);
        (clause, params)
    }

    fn render(&self, params: &mut Vec<SqlValue>) -> String {
        match self {
            Criterion::Equals { column, value } => {
                params.push(value.clone());
                format!("{} = ?", column)
            }
            Criterion::Contains { column, needle } => {
                params.push(SqlValue::Text(format!("%{}%", needle.to_lowercase())));
                format!("LOWER({}) LIKE ?", column)
            }
            Criterion::Range { column, min, max } => match (min, max) {
                (Some(min), Some(max)) => {
                    params.push(min.clone());
                    params.push(max.clone());
                    format!("{} >= ? AND {} <= ?", column, column)
                }
                (Some(min), None) => {
                    params.push(min.clone());
                    format!("{} >= ?", column)
                }
                (None, Some(max)) => {
                    params.push(max.clone());
                    format!("{} <= ?", column)
                }
                (None, None) => "1=1".to_string(),
            },
            Criterion::All(criteria) => {
                if criteria.is_empty() {
                    return "1=1".to_string();
                }
                let rendered: Vec<String> = criteria
                    .iter()
                    .map(|c| format!("({})", c.render(params)))
                    .collect();
                rendered.join(" AND ")
            }
            Criterion::Any(criteria) => {
                if criteria.is_empty() {
                    return "1=1".to_string();
                }
                let rendered: Vec<String> = criteria
                    .iter()
                    .map(|c| format!("({})", c.render(params)))
                    .collect();
                rendered.join(" OR ")
            }
        }
    }
}

/// Result ordering for workshop queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    /// Best-rated first, the default ranking.
    #[default]
    Rating,
    PriceAsc,
    PriceDesc,
    /// Most recently created first.
    Newest,
}

impl OrderBy {
    pub fn sql_clause(&self) -> &'static str {
        match self {
            OrderBy::Rating => "ORDER BY rating DESC, id ASC",
            OrderBy::PriceAsc => "ORDER BY price ASC, id ASC",
            OrderBy::PriceDesc => "ORDER BY price DESC, id ASC",
            OrderBy::Newest => "ORDER BY created_at DESC, id ASC",
        }
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Parent-facing workshop search filter.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkshopFilter {
    /// Free-text search over title, keywords and provider title.
    pub text: Option<String>,
    /// Restrict to one provider's workshops.
    pub provider_id: Option<String>,
    /// Child age band; a workshop matches if its age range overlaps.
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Pagination offset.
    pub from: usize,
    /// Page size.
    pub size: usize,
    pub order_by: OrderBy,
}

impl Default for WorkshopFilter {
    fn default() -> Self {
        Self {
            text: None,
            provider_id: None,
            min_age: None,
            max_age: None,
            min_price: None,
            max_price: None,
            from: 0,
            size: DEFAULT_PAGE_SIZE,
            order_by: OrderBy::default(),
        }
    }
}

impl WorkshopFilter {
    /// A filter is usable only when every upper bound covers its lower bound
    /// and the page size is positive. Invalid filters yield an empty page
    /// rather than an error.
    pub fn is_valid(&self) -> bool {
        fn pair_ok<T: PartialOrd>(min: &Option<T>, max: &Option<T>) -> bool {
            match (min, max) {
                (Some(min), Some(max)) => max >= min,
                _ => true,
            }
        }
        pair_ok(&self.min_age, &self.max_age)
            && pair_ok(&self.min_price, &self.max_price)
            && self.size > 0
    }

    /// Compile to the criterion tree both backends translate to SQL.
    pub fn to_criterion(&self) -> Criterion {
        let mut criteria = Vec::new();

        if let Some(text) = &self.text {
            if !text.trim().is_empty() {
                let needle = text.trim().to_string();
                criteria.push(Criterion::Any(vec![
                    Criterion::Contains {
                        column: "title",
                        needle: needle.clone(),
                    },
                    Criterion::Contains {
                        column: "keywords",
                        needle: needle.clone(),
                    },
                    Criterion::Contains {
                        column: "provider_title",
                        needle,
                    },
                ]));
            }
        }

        if let Some(provider_id) = &self.provider_id {
            criteria.push(Criterion::Equals {
                column: "provider_id",
                value: SqlValue::Text(provider_id.clone()),
            });
        }

        // Age band overlap: the workshop's [min_age, max_age] must intersect
        // the requested band, so its min_age is at or below the requested max
        // and its max_age at or above the requested min.
        if let Some(max_age) = self.max_age {
            criteria.push(Criterion::Range {
                column: "min_age",
                min: None,
                max: Some(SqlValue::Integer(max_age as i64)),
            });
        }
        if let Some(min_age) = self.min_age {
            criteria.push(Criterion::Range {
                column: "max_age",
                min: Some(SqlValue::Integer(min_age as i64)),
                max: None,
            });
        }

        if self.min_price.is_some() || self.max_price.is_some() {
            criteria.push(Criterion::Range {
                column: "price",
                min: self.min_price.map(SqlValue::Real),
                max: self.max_price.map(SqlValue::Real),
            });
        }

        Criterion::All(criteria)
    }
}
