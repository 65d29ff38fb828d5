use std::sync::Arc;

use common::storage::UploadRoot;

use crate::config::AppConfig;
use crate::service::{QueryService, UploadService};
use crate::store::CatalogStore;
use crate::views::{RenderError, Templates};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub uploads: Arc<UploadRoot>,
    pub catalog: Arc<UploadService>,
    pub queries: QueryService,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn CatalogStore>,
        uploads: Arc<UploadRoot>,
    ) -> Result<Self, RenderError> {
        let catalog = Arc::new(UploadService::new(
            store.clone(),
            uploads.clone(),
            config.catalog.clone(),
        ));
        Ok(Self {
            queries: QueryService::new(store),
            templates: Arc::new(Templates::new()?),
            catalog,
            uploads,
            config,
        })
    }
}
