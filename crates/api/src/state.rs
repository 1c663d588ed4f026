use tenders_core::Procurement;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (the facade holds its store behind an `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Every tender and bid operation, over the configured store.
    pub procurement: Procurement,
}
