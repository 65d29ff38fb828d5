use std::sync::Arc;

use tracing::{error, instrument};

use crate::store::{CatalogStore, RecordMap, StoreError};

/// A failed read, carrying the message shown to users.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
    pub source: StoreError,
}

/// Read-only access to the catalog.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn CatalogStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Newest records first, optionally capped at `limit`.
    #[instrument(skip(self))]
    pub async fn list_all(&self, limit: Option<u64>) -> Result<Vec<RecordMap>, QueryError> {
        self.store.list(limit).await.map_err(|e| {
            error!(error = %e, "Failed to list catalog");
            QueryError {
                message: "Could not retrieve models from the database.".into(),
                source: e,
            }
        })
    }

    /// Records whose growth media contains `term`, newest first.
    ///
    /// An empty term matches every record.
    #[instrument(skip(self))]
    pub async fn search_by_growth_media(&self, term: &str) -> Result<Vec<RecordMap>, QueryError> {
        self.store.search_growth_media(term).await.map_err(|e| {
            error!(error = %e, "Failed to search catalog");
            QueryError {
                message: format!("Could not perform search for '{term}'."),
                source: e,
            }
        })
    }
}
