mod database;
mod rows;

use async_trait::async_trait;
use sea_orm::sqlx;
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use serde_json::{Map, Value};

use crate::entity::gapfill_model;

pub use database::SeaOrmCatalogStore;
pub use rows::{RawResultSet, row_to_mapping};

/// A catalog row keyed by column name, as served by the listing endpoints.
pub type RecordMap = Map<String, Value>;

/// Everything the upload workflow hands to the store for one new row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCatalogRecord {
    /// Left unset when absent so the column constraint reports it.
    pub growth_media: Option<String>,
    pub gapfill_algorithm: Option<String>,
    pub annotation_tool: Option<String>,
    pub biomass_type: Option<String>,
    pub growth_data: Option<String>,
    pub growth_yes_or_no: Option<String>,
    pub file_name: String,
    pub file_link: String,
    pub growth_file: Option<String>,
    pub biomass_file_5mm: Option<String>,
    pub biomass_file_20mm: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("metadata store unavailable: {0}")]
    ConnectionUnavailable(String),
    #[error("missing value for column {}", column.as_deref().unwrap_or("(unknown)"))]
    MissingValue { column: Option<String> },
    #[error("duplicate entry: {0}")]
    Duplicate(String),
    #[error("query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::ConnectionUnavailable(_))
    }
}

/// True for errors that mean the pool could not hand out a working
/// connection, or the connection died under a running statement.
pub fn is_connection_error(err: &DbErr) -> bool {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
        DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e)) => matches!(
            e.as_ref(),
            sqlx::Error::Io(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        ),
        _ => false,
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        if is_connection_error(&err) {
            return StoreError::ConnectionUnavailable(err.to_string());
        }
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return StoreError::Duplicate(detail);
        }

        let text = err.to_string();
        if text.contains("not-null constraint") || text.contains("cannot be null") {
            return StoreError::MissingValue {
                column: not_null_column(&text),
            };
        }
        StoreError::Query(text)
    }
}

/// Pull the offending column out of a not-null violation message.
///
/// Understands PostgreSQL (`null value in column "x" ...`) and MySQL/MariaDB
/// (`Column 'x' cannot be null`) wording.
pub fn not_null_column(message: &str) -> Option<String> {
    let quoted_after = |marker: &str, quote: char| {
        let start = message.find(marker)? + marker.len();
        let rest = &message[start..];
        let end = rest.find(quote)?;
        Some(rest[..end].to_string()).filter(|c| !c.is_empty())
    };

    quoted_after("column \"", '"').or_else(|| quoted_after("Column '", '\''))
}

/// Persistence seam for catalog records.
///
/// Reads return rows newest first.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert one row in its own transaction and return it with its id.
    async fn insert(&self, record: NewCatalogRecord) -> Result<gapfill_model::Model, StoreError>;

    /// All rows, optionally capped at `limit`.
    async fn list(&self, limit: Option<u64>) -> Result<Vec<RecordMap>, StoreError>;

    /// Rows whose `growth_media` contains `term` as a literal substring.
    async fn search_growth_media(&self, term: &str) -> Result<Vec<RecordMap>, StoreError>;
}
