pub mod bids;
pub mod health;
pub mod tenders;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ping                                  liveness ("ok")
///
/// /tenders                               list (public, filter by service_type)
/// /tenders/my                            tenders of the user's organizations
/// /tenders/new                           create
/// /tenders/{id}/status                   get, update
/// /tenders/{id}/edit                     patch (new version)
/// /tenders/{id}/rollback/{version}       restore (new version)
/// /tenders/{id}/versions                 version history
///
/// /bids/new                              create
/// /bids/my                               bids authored by the user
/// /bids/{id}/list                        bids on tender {id}
/// /bids/{id}/status                      get, update
/// /bids/{id}/edit                        patch (new version)
/// /bids/{id}/submit_decision             approve / reject
/// /bids/{id}/feedback                    leave feedback
/// /bids/{id}/rollback/{version}          restore (new version)
/// /bids/{id}/reviews                     feedback on an author's bids (tender {id})
/// /bids/{id}/versions                    version history
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(health::ping))
        .nest("/tenders", tenders::router())
        .nest("/bids", bids::router())
}
