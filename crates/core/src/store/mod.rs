//! The entity store capability.
//!
//! [`EntityStore`] is the only seam between the core logic and persistence.
//! Every write method is atomic: it either applies completely or leaves the
//! store untouched. Writes that depend on a prior read take the [`Revision`]
//! that was read and fail with [`StoreError::Conflict`] if storage no longer
//! matches it.
//!
//! Implementations:
//! - [`memory::InMemoryStore`] in this crate (per-entity mutexes).
//! - `PgStore` in `tenders-db` (row locks inside sqlx transactions).

pub mod memory;

use async_trait::async_trait;
use serde::Serialize;

use crate::bid::{AuthorRef, Bid, BidContent, BidDecisionRecord, BidFeedback, BidStatus};
use crate::directory::Employee;
use crate::error::CoreError;
use crate::pagination::Page;
use crate::tender::{ServiceType, Tender, TenderContent, TenderStatus};
use crate::types::{DbId, Timestamp, Version};

pub use memory::InMemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    Missing { entity: &'static str, id: DbId },

    #[error("{0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing { entity, id } => CoreError::not_found(entity, id),
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            StoreError::Unavailable(msg) => CoreError::StorageUnavailable(msg),
            StoreError::Backend(msg) => CoreError::Internal(msg),
        }
    }
}

/// The `(version, status)` pair a write expects to find in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision<S> {
    pub version: Version,
    pub status: S,
}

impl<S: Copy + PartialEq> Revision<S> {
    pub fn new(version: Version, status: S) -> Self {
        Self { version, status }
    }

    /// Whether the stored `(version, status)` still matches this revision.
    pub fn matches(&self, version: Version, status: S) -> bool {
        self.version == version && self.status == status
    }
}

/// Immutable copy of an entity's editable content at a given version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<C> {
    pub entity_id: DbId,
    pub version: Version,
    #[serde(flatten)]
    pub content: C,
    pub created_at: Timestamp,
}

/// Tender listing filter. All present constraints are ANDed.
#[derive(Debug, Clone, Default)]
pub struct TenderFilter {
    /// Restrict to tenders owned by these organizations (`Some(vec![])` matches nothing).
    pub organization_ids: Option<Vec<DbId>>,
    /// Restrict to these service types (empty = no constraint).
    pub service_types: Vec<ServiceType>,
}

impl TenderFilter {
    pub fn matches(&self, tender: &Tender) -> bool {
        let org_ok = self
            .organization_ids
            .as_ref()
            .map_or(true, |ids| ids.contains(&tender.organization_id));
        let type_ok =
            self.service_types.is_empty() || self.service_types.contains(&tender.service_type);
        org_ok && type_ok
    }
}

/// Bid listing filter. All present constraints are ANDed.
#[derive(Debug, Clone, Default)]
pub struct BidFilter {
    pub tender_id: Option<DbId>,
    /// Restrict to bids by these authors (`Some(vec![])` matches nothing).
    pub authors: Option<Vec<AuthorRef>>,
    /// Restrict to these statuses (`None` = any status).
    pub statuses: Option<Vec<BidStatus>>,
}

impl BidFilter {
    pub fn matches(&self, bid: &Bid) -> bool {
        let tender_ok = self.tender_id.map_or(true, |id| id == bid.tender_id);
        let author_ok = self
            .authors
            .as_ref()
            .map_or(true, |authors| authors.contains(&bid.author()));
        let status_ok = self
            .statuses
            .as_ref()
            .map_or(true, |statuses| statuses.contains(&bid.status));
        tender_ok && author_ok && status_ok
    }
}

/// Durable keyed storage for tenders, bids, their snapshots, decisions and
/// feedback, plus read access to the employee directory.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Cheap liveness check.
    async fn ping(&self) -> StoreResult<()>;

    // -- Directory ----------------------------------------------------------

    async fn find_employee(&self, username: &str) -> StoreResult<Option<Employee>>;

    /// Organizations the employee is responsible for.
    async fn responsible_organizations(&self, employee_id: DbId) -> StoreResult<Vec<DbId>>;

    // -- Tenders ------------------------------------------------------------

    async fn insert_tender(&self, tender: &Tender) -> StoreResult<()>;

    async fn get_tender(&self, id: DbId) -> StoreResult<Option<Tender>>;

    /// Tenders ordered by `created_at` descending, ties by id ascending.
    async fn list_tenders(&self, filter: &TenderFilter, page: Page) -> StoreResult<Vec<Tender>>;

    async fn tender_snapshot(
        &self,
        id: DbId,
        version: Version,
    ) -> StoreResult<Option<Snapshot<TenderContent>>>;

    /// All snapshots of a tender, version ascending.
    async fn tender_snapshots(&self, id: DbId) -> StoreResult<Vec<Snapshot<TenderContent>>>;

    /// Snapshot the live content at its current version, replace it with
    /// `content`, and bump the version by one.
    async fn replace_tender_content(
        &self,
        id: DbId,
        expected: Revision<TenderStatus>,
        content: &TenderContent,
    ) -> StoreResult<Tender>;

    /// Change the status; the version is left untouched.
    async fn set_tender_status(
        &self,
        id: DbId,
        expected: Revision<TenderStatus>,
        status: TenderStatus,
    ) -> StoreResult<Tender>;

    // -- Bids ---------------------------------------------------------------

    /// Insert a bid, provided its tender is still in `tender_status`.
    async fn insert_bid(&self, bid: &Bid, tender_status: TenderStatus) -> StoreResult<()>;

    async fn get_bid(&self, id: DbId) -> StoreResult<Option<Bid>>;

    /// Bids ordered by `created_at` descending, ties by id ascending.
    async fn list_bids(&self, filter: &BidFilter, page: Page) -> StoreResult<Vec<Bid>>;

    async fn bid_snapshot(
        &self,
        id: DbId,
        version: Version,
    ) -> StoreResult<Option<Snapshot<BidContent>>>;

    /// All snapshots of a bid, version ascending.
    async fn bid_snapshots(&self, id: DbId) -> StoreResult<Vec<Snapshot<BidContent>>>;

    async fn replace_bid_content(
        &self,
        id: DbId,
        expected: Revision<BidStatus>,
        content: &BidContent,
    ) -> StoreResult<Bid>;

    async fn set_bid_status(
        &self,
        id: DbId,
        expected: Revision<BidStatus>,
        status: BidStatus,
    ) -> StoreResult<Bid>;

    /// Upsert the decision and move the bid to the decided status, provided
    /// the bid still matches `expected` and its tender is still in
    /// `tender_status`.
    async fn record_decision(
        &self,
        decision: &BidDecisionRecord,
        expected: Revision<BidStatus>,
        tender_status: TenderStatus,
    ) -> StoreResult<Bid>;

    async fn get_decision(&self, bid_id: DbId) -> StoreResult<Option<BidDecisionRecord>>;

    /// Replace the bid's feedback. The stored id and `created_at` of an
    /// existing feedback are kept.
    async fn upsert_feedback(&self, feedback: &BidFeedback) -> StoreResult<BidFeedback>;

    /// Feedback on bids by any of `authors`, newest first (ties by id).
    async fn list_feedback(
        &self,
        authors: &[AuthorRef],
        page: Page,
    ) -> StoreResult<Vec<BidFeedback>>;
}
