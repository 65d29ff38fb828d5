use axum::Form;
use axum::extract::State;
use axum::response::Html;
use tracing::instrument;

use crate::error::AppError;
use crate::models::catalog::SearchForm;
use crate::state::AppState;
use crate::views::IndexPage;

/// Catalog page with the newest records.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let limit = state.config.catalog.index_page_limit;
    let page = match state.queries.list_all(limit).await {
        Ok(records) => IndexPage {
            records,
            ..IndexPage::default()
        },
        Err(e) => IndexPage {
            error_message: Some(e.message),
            ..IndexPage::default()
        },
    };
    render(&state, &page)
}

/// Catalog page filtered by growth media.
#[instrument(skip(state, form), fields(term = %form.media_search))]
pub async fn search(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Html<String>, AppError> {
    let term = form.media_search.trim().to_string();
    let page = match state.queries.search_by_growth_media(&term).await {
        Ok(records) => IndexPage {
            records,
            media_search: Some(term),
            error_message: None,
        },
        Err(e) => IndexPage {
            records: Vec::new(),
            media_search: Some(term),
            error_message: Some(e.message),
        },
    };
    render(&state, &page)
}

fn render(state: &AppState, page: &IndexPage) -> Result<Html<String>, AppError> {
    state
        .templates
        .render_index(page)
        .map(Html)
        .map_err(|e| AppError::Internal(format!("Failed to render catalog page: {e:?}")))
}
