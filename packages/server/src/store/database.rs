use async_trait::async_trait;
use chrono::Utc;
use common::retry::RetryPolicy;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, IdenStatic, Iterable, QueryFilter,
    QueryOrder, QueryResult, QuerySelect, QueryTrait, Select, TransactionTrait,
};
use serde_json::Value;
use tracing::{error, instrument};

use super::{
    CatalogStore, NewCatalogRecord, RawResultSet, RecordMap, StoreError, is_connection_error,
    row_to_mapping,
};
use crate::entity::gapfill_model::{self, Column, Entity};

/// `CatalogStore` backed by a sea-orm connection pool.
#[derive(Clone)]
pub struct SeaOrmCatalogStore {
    db: DatabaseConnection,
    retry: RetryPolicy,
}

impl SeaOrmCatalogStore {
    pub fn new(db: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self { db, retry }
    }

    /// Begin a transaction on a connection that has just answered a ping.
    ///
    /// Connection-level failures are retried under the configured policy;
    /// once it is spent the store reports itself unavailable.
    pub async fn acquire(&self) -> Result<DatabaseTransaction, StoreError> {
        let db = &self.db;
        self.retry
            .run("acquire catalog transaction", is_connection_error, move || async move {
                db.ping().await?;
                db.begin().await
            })
            .await
            .map_err(|exhausted| {
                if is_connection_error(&exhausted.last_error) {
                    error!(
                        attempts = exhausted.attempts,
                        error = %exhausted.last_error,
                        "Metadata store unreachable"
                    );
                }
                StoreError::from(exhausted.last_error)
            })
    }

    /// Liveness probe used ahead of reads, under the same retry policy.
    async fn probe(&self) -> Result<(), StoreError> {
        let db = &self.db;
        self.retry
            .run("probe catalog store", is_connection_error, move || async move {
                db.ping().await
            })
            .await
            .map_err(|exhausted| StoreError::from(exhausted.last_error))
    }

    async fn fetch(&self, select: Select<Entity>) -> Result<Vec<RecordMap>, StoreError> {
        self.probe().await?;

        let statement = select.build(self.db.get_database_backend());
        let rows = self.db.query_all_raw(statement).await?;

        let columns: Vec<Column> = Column::iter().collect();
        let mut result = RawResultSet {
            columns: columns.iter().map(|c| c.as_str().to_string()).collect(),
            rows: Vec::with_capacity(rows.len()),
        };
        for row in &rows {
            let values = columns
                .iter()
                .enumerate()
                .map(|(index, column)| read_value(row, index, *column))
                .collect::<Result<Vec<_>, DbErr>>()?;
            result.rows.push(values);
        }

        Ok(row_to_mapping(result))
    }
}

/// Read the value at `index` as JSON, typed by the column it belongs to.
fn read_value(row: &QueryResult, index: usize, column: Column) -> Result<Value, DbErr> {
    let value = match column {
        Column::Id => Value::from(row.try_get_by_index::<i32>(index)?),
        Column::CreatedAt => {
            let at = row.try_get_by_index::<chrono::DateTime<Utc>>(index)?;
            serde_json::to_value(at)
                .map_err(|e| DbErr::Custom(format!("Failed to encode {}: {e}", column.as_str())))?
        }
        _ => row
            .try_get_by_index::<Option<String>>(index)?
            .map_or(Value::Null, Value::String),
    };
    Ok(value)
}

fn set_or_omit<T>(value: Option<T>) -> ActiveValue<T>
where
    T: Into<sea_orm::Value>,
{
    value.map_or(NotSet, Set)
}

#[async_trait]
impl CatalogStore for SeaOrmCatalogStore {
    #[instrument(skip(self, record), fields(file_name = %record.file_name))]
    async fn insert(&self, record: NewCatalogRecord) -> Result<gapfill_model::Model, StoreError> {
        let txn = self.acquire().await?;

        let model = gapfill_model::ActiveModel {
            growth_media: set_or_omit(record.growth_media),
            gapfill_algorithm: Set(record.gapfill_algorithm),
            annotation_tool: Set(record.annotation_tool),
            biomass_type: Set(record.biomass_type),
            growth_data: Set(record.growth_data),
            growth_yes_or_no: Set(record.growth_yes_or_no),
            file_name: Set(record.file_name),
            file_link: Set(record.file_link),
            growth_file: Set(record.growth_file),
            biomass_file_5mm: Set(record.biomass_file_5mm),
            biomass_file_20mm: Set(record.biomass_file_20mm),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        match model.insert(&txn).await {
            Ok(saved) => {
                txn.commit().await?;
                Ok(saved)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!(error = %rollback_err, "Rollback failed");
                }
                Err(e.into())
            }
        }
    }

    async fn list(&self, limit: Option<u64>) -> Result<Vec<RecordMap>, StoreError> {
        let mut select = Entity::find().order_by_desc(Column::Id);
        if let Some(limit) = limit {
            select = select.limit(limit);
        }
        self.fetch(select).await
    }

    async fn search_growth_media(&self, term: &str) -> Result<Vec<RecordMap>, StoreError> {
        let pattern = format!("%{}%", escape_like(term));
        let select = Entity::find()
            .filter(Column::GrowthMedia.like(LikeExpr::new(pattern).escape('\\')))
            .order_by_desc(Column::Id);
        self.fetch(select).await
    }
}

/// Escape LIKE wildcards so the term matches literally.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
