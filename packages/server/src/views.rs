use chrono::{Datelike, Utc};
use minijinja::{Environment, Error as JinjaError, context};
use serde::Serialize;

use crate::store::RecordMap;

const INDEX_TEMPLATE: &str = "index.html";

/// Errors that occur while rendering an HTML page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid template syntax")]
    Template {
        #[source]
        source: JinjaError,
    },
    #[error("failed to render template")]
    Render {
        #[source]
        source: JinjaError,
    },
}

/// Everything the catalog page shows.
#[derive(Debug, Default, Serialize)]
pub struct IndexPage {
    pub records: Vec<RecordMap>,
    /// The term the current results were searched for, if any.
    pub media_search: Option<String>,
    pub error_message: Option<String>,
}

/// Compiled HTML templates. `.html` templates are auto-escaped.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.add_template(INDEX_TEMPLATE, include_str!("../templates/index.html"))
            .map_err(|source| RenderError::Template { source })?;
        Ok(Self { env })
    }

    pub fn render_index(&self, page: &IndexPage) -> Result<String, RenderError> {
        let template = self
            .env
            .get_template(INDEX_TEMPLATE)
            .map_err(|source| RenderError::Template { source })?;

        template
            .render(context! {
                search_results => &page.records,
                media_search => &page.media_search,
                error_message => &page.error_message,
                current_year => Utc::now().year(),
            })
            .map_err(|source| RenderError::Render { source })
    }
}
