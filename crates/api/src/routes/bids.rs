//! Route definitions for bids.
//!
//! `{id}` is a bid id except under `/list` and `/reviews`, where it names
//! the tender.

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::handlers::bids;
use crate::state::AppState;

/// Routes nested under `/bids`.
///
/// ```text
/// POST   /new                       create_bid
/// GET    /my                        list_user_bids
/// GET    /{id}/list                 list_bids_for_tender
/// GET    /{id}/status               get_bid_status
/// PUT    /{id}/status               update_bid_status
/// PATCH  /{id}/edit                 edit_bid
/// PUT    /{id}/submit_decision      submit_decision
/// PUT    /{id}/feedback             submit_feedback
/// PUT    /{id}/rollback/{version}   rollback_bid
/// GET    /{id}/reviews              list_reviews
/// GET    /{id}/versions             bid_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", post(bids::create_bid))
        .route("/my", get(bids::list_user_bids))
        .route("/{id}/list", get(bids::list_bids_for_tender))
        .route(
            "/{id}/status",
            get(bids::get_bid_status).put(bids::update_bid_status),
        )
        .route("/{id}/edit", patch(bids::edit_bid))
        .route("/{id}/submit_decision", put(bids::submit_decision))
        .route("/{id}/feedback", put(bids::submit_feedback))
        .route("/{id}/rollback/{version}", put(bids::rollback_bid))
        .route("/{id}/reviews", get(bids::list_reviews))
        .route("/{id}/versions", get(bids::bid_history))
}
