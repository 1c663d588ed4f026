//! Route definitions for tenders.

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::handlers::tenders;
use crate::state::AppState;

/// Routes nested under `/tenders`.
///
/// ```text
/// GET    /                          list_tenders
/// GET    /my                        list_user_tenders
/// POST   /new                       create_tender
/// GET    /{id}/status               get_tender_status
/// PUT    /{id}/status               update_tender_status
/// PATCH  /{id}/edit                 edit_tender
/// PUT    /{id}/rollback/{version}   rollback_tender
/// GET    /{id}/versions             tender_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tenders::list_tenders))
        .route("/my", get(tenders::list_user_tenders))
        .route("/new", post(tenders::create_tender))
        .route(
            "/{id}/status",
            get(tenders::get_tender_status).put(tenders::update_tender_status),
        )
        .route("/{id}/edit", patch(tenders::edit_tender))
        .route("/{id}/rollback/{version}", put(tenders::rollback_tender))
        .route("/{id}/versions", get(tenders::tender_history))
}
