use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::upload::StagedUpload;
use crate::models::catalog::CatalogRecordResponse;
use crate::state::AppState;
use crate::store::RecordMap;

#[utoipa::path(
    get,
    path = "/models",
    tag = "Models",
    operation_id = "listModels",
    summary = "List all registered models",
    description = "Returns every catalog record, newest first. Each element has the same \
        fields as the upload response.",
    responses(
        (status = 200, description = "Catalog records", body = [CatalogRecordResponse]),
        (status = 500, description = "Store failure (STORE_ERROR)", body = ErrorBody),
        (status = 503, description = "Store unreachable (STORE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<RecordMap>>, AppError> {
    Ok(Json(state.queries.list_all(None).await?))
}

#[utoipa::path(
    post,
    path = "/models",
    tag = "Models",
    operation_id = "uploadModel",
    summary = "Upload a model with its metadata",
    description = "Registers a model file. The primary file goes in `modelUpload` (`xmlUpload` \
        is accepted too). Metadata is sent as text fields `growth_media`, `gapfill_algorithm`, \
        `annotation_tool`, `biomass_type`, `growth_data` and `growth_yes_or_no` (`Yes`/`No`). \
        Optional `.tsv` attachments go in `growth_file_upload`, `biomass_5mM_upload` and \
        `biomass_20mM_upload`; an attachment whose name is already stored is reused. \
        A failed upload leaves no record and no new files behind.",
    request_body(content_type = "multipart/form-data", description = "Model file, metadata and optional attachments"),
    responses(
        (status = 201, description = "Model registered", body = CatalogRecordResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "A model with this file name exists (CONFLICT)", body = ErrorBody),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
        (status = 503, description = "Store unreachable (STORE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_model(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let staged =
        StagedUpload::from_multipart(multipart, state.config.storage.max_upload_size).await?;
    let request = staged.to_request().await?;

    let model = state.catalog.upload(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CatalogRecordResponse::from(model)),
    ))
}
