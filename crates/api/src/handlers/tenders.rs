//! Handlers for tender endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use tenders_core::tender::{CreateTender, TenderPatch, TenderStatus};
use tenders_core::types::{DbId, Version};

use crate::error::AppResult;
use crate::extract::{JsonBody, PathParams, QueryParams};
use crate::query::{ActorParams, EditParams, StatusUpdateParams, TenderListParams, UserListParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/tenders
///
/// All tenders, newest first, optionally filtered by `service_type`
/// (comma-separated).
pub async fn list_tenders(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<TenderListParams>,
) -> AppResult<impl IntoResponse> {
    let service_types = params.service_types()?;
    let tenders = state
        .procurement
        .list_tenders(&service_types, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: tenders }))
}

/// GET /api/tenders/my
pub async fn list_user_tenders(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<UserListParams>,
) -> AppResult<impl IntoResponse> {
    let tenders = state
        .procurement
        .list_user_tenders(&params.username, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: tenders }))
}

/// POST /api/tenders/new
pub async fn create_tender(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateTender>,
) -> AppResult<impl IntoResponse> {
    let username = input.creator_username.clone();
    let tender = state.procurement.create_tender(input).await?;

    tracing::info!(
        tender_id = %tender.id,
        organization_id = %tender.organization_id,
        username = %username,
        "Tender created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: tender })))
}

/// GET /api/tenders/{id}/status
pub async fn get_tender_status(
    State(state): State<AppState>,
    PathParams(id): PathParams<DbId>,
) -> AppResult<impl IntoResponse> {
    let status = state.procurement.get_tender_status(id).await?;
    Ok(Json(DataResponse { data: status }))
}

/// PUT /api/tenders/{id}/status
pub async fn update_tender_status(
    State(state): State<AppState>,
    PathParams(id): PathParams<DbId>,
    QueryParams(params): QueryParams<StatusUpdateParams>,
) -> AppResult<impl IntoResponse> {
    let status: TenderStatus = params.status.parse()?;
    let tender = state
        .procurement
        .update_tender_status(id, &params.username, status)
        .await?;

    tracing::info!(tender_id = %id, status = %tender.status, "Tender status updated");

    Ok(Json(DataResponse { data: tender }))
}

/// PATCH /api/tenders/{id}/edit
///
/// Applies the patch as a new version. With `?version=N` the edit only
/// succeeds while the tender is still at version N.
pub async fn edit_tender(
    State(state): State<AppState>,
    PathParams(id): PathParams<DbId>,
    QueryParams(params): QueryParams<EditParams>,
    JsonBody(patch): JsonBody<TenderPatch>,
) -> AppResult<impl IntoResponse> {
    let tender = state
        .procurement
        .edit_tender(id, &params.username, &patch, params.version)
        .await?;

    tracing::info!(tender_id = %id, version = tender.version, "Tender edited");

    Ok(Json(DataResponse { data: tender }))
}

/// PUT /api/tenders/{id}/rollback/{version}
pub async fn rollback_tender(
    State(state): State<AppState>,
    PathParams((id, version)): PathParams<(DbId, Version)>,
    QueryParams(params): QueryParams<ActorParams>,
) -> AppResult<impl IntoResponse> {
    let tender = state
        .procurement
        .rollback_tender(id, &params.username, version)
        .await?;

    tracing::info!(
        tender_id = %id,
        restored_version = version,
        version = tender.version,
        "Tender rolled back"
    );

    Ok(Json(DataResponse { data: tender }))
}

/// GET /api/tenders/{id}/versions
pub async fn tender_history(
    State(state): State<AppState>,
    PathParams(id): PathParams<DbId>,
) -> AppResult<impl IntoResponse> {
    let versions = state.procurement.tender_history(id).await?;
    Ok(Json(DataResponse { data: versions }))
}
