//! Handlers for bid endpoints, including decisions, feedback and reviews.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use tenders_core::bid::{BidPatch, BidStatus, CreateBid, Decision};
use tenders_core::types::{DbId, Version};

use crate::error::AppResult;
use crate::extract::{JsonBody, PathParams, QueryParams};
use crate::query::{
    ActorParams, DecisionParams, EditParams, FeedbackParams, ReviewParams, StatusUpdateParams,
    UserListParams,
};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/bids/new
pub async fn create_bid(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateBid>,
) -> AppResult<impl IntoResponse> {
    let bid = state.procurement.create_bid(input).await?;

    tracing::info!(
        bid_id = %bid.id,
        tender_id = %bid.tender_id,
        author_type = %bid.author_type,
        author_id = %bid.author_id,
        "Bid created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: bid })))
}

/// GET /api/bids/my
pub async fn list_user_bids(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<UserListParams>,
) -> AppResult<impl IntoResponse> {
    let bids = state
        .procurement
        .list_user_bids(&params.username, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: bids }))
}

/// GET /api/bids/{tender_id}/list
pub async fn list_bids_for_tender(
    State(state): State<AppState>,
    PathParams(tender_id): PathParams<DbId>,
    QueryParams(params): QueryParams<UserListParams>,
) -> AppResult<impl IntoResponse> {
    let bids = state
        .procurement
        .list_bids_for_tender(tender_id, &params.username, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: bids }))
}

/// GET /api/bids/{id}/status
pub async fn get_bid_status(
    State(state): State<AppState>,
    PathParams(id): PathParams<DbId>,
) -> AppResult<impl IntoResponse> {
    let status = state.procurement.get_bid_status(id).await?;
    Ok(Json(DataResponse { data: status }))
}

/// PUT /api/bids/{id}/status
pub async fn update_bid_status(
    State(state): State<AppState>,
    PathParams(id): PathParams<DbId>,
    QueryParams(params): QueryParams<StatusUpdateParams>,
) -> AppResult<impl IntoResponse> {
    let status: BidStatus = params.status.parse()?;
    let bid = state
        .procurement
        .update_bid_status(id, &params.username, status)
        .await?;

    tracing::info!(bid_id = %id, status = %bid.status, "Bid status updated");

    Ok(Json(DataResponse { data: bid }))
}

/// PATCH /api/bids/{id}/edit
pub async fn edit_bid(
    State(state): State<AppState>,
    PathParams(id): PathParams<DbId>,
    QueryParams(params): QueryParams<EditParams>,
    JsonBody(patch): JsonBody<BidPatch>,
) -> AppResult<impl IntoResponse> {
    let bid = state
        .procurement
        .edit_bid(id, &params.username, &patch, params.version)
        .await?;

    tracing::info!(bid_id = %id, version = bid.version, "Bid edited");

    Ok(Json(DataResponse { data: bid }))
}

/// PUT /api/bids/{id}/submit_decision
pub async fn submit_decision(
    State(state): State<AppState>,
    PathParams(id): PathParams<DbId>,
    QueryParams(params): QueryParams<DecisionParams>,
) -> AppResult<impl IntoResponse> {
    let decision: Decision = params.decision.parse()?;
    let bid = state
        .procurement
        .submit_bid_decision(id, decision, &params.username)
        .await?;

    tracing::info!(
        bid_id = %id,
        decision = decision.as_str(),
        username = %params.username,
        "Bid decision recorded"
    );

    Ok(Json(DataResponse { data: bid }))
}

/// PUT /api/bids/{id}/feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    PathParams(id): PathParams<DbId>,
    QueryParams(params): QueryParams<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let bid = state
        .procurement
        .submit_bid_feedback(id, &params.bid_feedback, &params.username)
        .await?;

    tracing::info!(bid_id = %id, username = %params.username, "Bid feedback saved");

    Ok(Json(DataResponse { data: bid }))
}

/// PUT /api/bids/{id}/rollback/{version}
pub async fn rollback_bid(
    State(state): State<AppState>,
    PathParams((id, version)): PathParams<(DbId, Version)>,
    QueryParams(params): QueryParams<ActorParams>,
) -> AppResult<impl IntoResponse> {
    let bid = state
        .procurement
        .rollback_bid(id, &params.username, version)
        .await?;

    tracing::info!(
        bid_id = %id,
        restored_version = version,
        version = bid.version,
        "Bid rolled back"
    );

    Ok(Json(DataResponse { data: bid }))
}

/// GET /api/bids/{tender_id}/reviews
///
/// Feedback the tender owner left on any bid by `authorUsername`.
pub async fn list_reviews(
    State(state): State<AppState>,
    PathParams(tender_id): PathParams<DbId>,
    QueryParams(params): QueryParams<ReviewParams>,
) -> AppResult<impl IntoResponse> {
    let reviews = state
        .procurement
        .list_bid_reviews(
            tender_id,
            &params.author_username,
            &params.requester_username,
            params.limit,
            params.offset,
        )
        .await?;
    Ok(Json(DataResponse { data: reviews }))
}

/// GET /api/bids/{id}/versions
pub async fn bid_history(
    State(state): State<AppState>,
    PathParams(id): PathParams<DbId>,
) -> AppResult<impl IntoResponse> {
    let versions = state.procurement.bid_history(id).await?;
    Ok(Json(DataResponse { data: versions }))
}
