//! Version management for tenders and bids.
//!
//! Every edit and every rollback produces exactly one new version. The
//! prior live content is snapshotted under its own version number in the
//! same atomic write that replaces it, so version numbers are never reused
//! and a snapshot exists for every version below the live one.

use std::fmt;

use async_trait::async_trait;

use crate::bid::{Bid, BidContent, BidPatch, BidStatus};
use crate::deadline::StoreHandle;
use crate::error::CoreError;
use crate::lifecycle::Lifecycle;
use crate::store::{EntityStore, Revision, Snapshot, StoreResult};
use crate::tender::{Tender, TenderContent, TenderPatch, TenderStatus};
use crate::types::{DbId, EntityKind, Version};

/// An entity with versioned content and a status lifecycle.
///
/// The async associated functions route to the matching [`EntityStore`]
/// methods so the version manager and status machine can stay generic over
/// the entity kind.
#[async_trait]
pub trait Versioned: Clone + Send + Sync + Sized + 'static {
    type Content: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;
    type Patch: Send + Sync;
    type Status: Lifecycle;

    const KIND: EntityKind;

    fn id(&self) -> DbId;
    fn version(&self) -> Version;
    fn status(&self) -> Self::Status;
    fn content(&self) -> Self::Content;

    fn set_content(&mut self, content: Self::Content);
    fn set_version(&mut self, version: Version);

    fn revision(&self) -> Revision<Self::Status> {
        Revision::new(self.version(), self.status())
    }

    /// Validate `patch` and produce the content it results in.
    fn patched(content: &Self::Content, patch: &Self::Patch) -> Result<Self::Content, CoreError>;

    async fn fetch(store: &dyn EntityStore, id: DbId) -> StoreResult<Option<Self>>;

    async fn fetch_snapshot(
        store: &dyn EntityStore,
        id: DbId,
        version: Version,
    ) -> StoreResult<Option<Snapshot<Self::Content>>>;

    async fn fetch_snapshots(
        store: &dyn EntityStore,
        id: DbId,
    ) -> StoreResult<Vec<Snapshot<Self::Content>>>;

    async fn write_content(
        store: &dyn EntityStore,
        id: DbId,
        expected: Revision<Self::Status>,
        content: &Self::Content,
    ) -> StoreResult<Self>;

    async fn write_status(
        store: &dyn EntityStore,
        id: DbId,
        expected: Revision<Self::Status>,
        status: Self::Status,
    ) -> StoreResult<Self>;
}

#[async_trait]
impl Versioned for Tender {
    type Content = TenderContent;
    type Patch = TenderPatch;
    type Status = TenderStatus;

    const KIND: EntityKind = EntityKind::Tender;

    fn id(&self) -> DbId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn status(&self) -> TenderStatus {
        self.status
    }

    fn content(&self) -> TenderContent {
        Tender::content(self)
    }

    fn set_content(&mut self, content: TenderContent) {
        Tender::set_content(self, content);
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn patched(content: &TenderContent, patch: &TenderPatch) -> Result<TenderContent, CoreError> {
        patch.apply(content)
    }

    async fn fetch(store: &dyn EntityStore, id: DbId) -> StoreResult<Option<Self>> {
        store.get_tender(id).await
    }

    async fn fetch_snapshot(
        store: &dyn EntityStore,
        id: DbId,
        version: Version,
    ) -> StoreResult<Option<Snapshot<TenderContent>>> {
        store.tender_snapshot(id, version).await
    }

    async fn fetch_snapshots(
        store: &dyn EntityStore,
        id: DbId,
    ) -> StoreResult<Vec<Snapshot<TenderContent>>> {
        store.tender_snapshots(id).await
    }

    async fn write_content(
        store: &dyn EntityStore,
        id: DbId,
        expected: Revision<TenderStatus>,
        content: &TenderContent,
    ) -> StoreResult<Self> {
        store.replace_tender_content(id, expected, content).await
    }

    async fn write_status(
        store: &dyn EntityStore,
        id: DbId,
        expected: Revision<TenderStatus>,
        status: TenderStatus,
    ) -> StoreResult<Self> {
        store.set_tender_status(id, expected, status).await
    }
}

#[async_trait]
impl Versioned for Bid {
    type Content = BidContent;
    type Patch = BidPatch;
    type Status = BidStatus;

    const KIND: EntityKind = EntityKind::Bid;

    fn id(&self) -> DbId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn status(&self) -> BidStatus {
        self.status
    }

    fn content(&self) -> BidContent {
        Bid::content(self)
    }

    fn set_content(&mut self, content: BidContent) {
        Bid::set_content(self, content);
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn patched(content: &BidContent, patch: &BidPatch) -> Result<BidContent, CoreError> {
        patch.apply(content)
    }

    async fn fetch(store: &dyn EntityStore, id: DbId) -> StoreResult<Option<Self>> {
        store.get_bid(id).await
    }

    async fn fetch_snapshot(
        store: &dyn EntityStore,
        id: DbId,
        version: Version,
    ) -> StoreResult<Option<Snapshot<BidContent>>> {
        store.bid_snapshot(id, version).await
    }

    async fn fetch_snapshots(
        store: &dyn EntityStore,
        id: DbId,
    ) -> StoreResult<Vec<Snapshot<BidContent>>> {
        store.bid_snapshots(id).await
    }

    async fn write_content(
        store: &dyn EntityStore,
        id: DbId,
        expected: Revision<BidStatus>,
        content: &BidContent,
    ) -> StoreResult<Self> {
        store.replace_bid_content(id, expected, content).await
    }

    async fn write_status(
        store: &dyn EntityStore,
        id: DbId,
        expected: Revision<BidStatus>,
        status: BidStatus,
    ) -> StoreResult<Self> {
        store.set_bid_status(id, expected, status).await
    }
}

/// Creates new versions on edit and restores old content on rollback.
pub struct VersionManager<'a> {
    db: StoreHandle<'a>,
}

impl<'a> VersionManager<'a> {
    pub fn new(db: StoreHandle<'a>) -> Self {
        Self { db }
    }

    /// Load the live entity or fail with `NotFound`.
    pub async fn load<E: Versioned>(&self, id: DbId) -> Result<E, CoreError> {
        self.db
            .run(|s| E::fetch(s, id))
            .await?
            .ok_or_else(|| CoreError::not_found(E::KIND.as_str(), id))
    }

    /// Apply `patch` to `current`, producing version `current.version() + 1`.
    ///
    /// `expected_version`, when given, must equal the live version.
    pub async fn edit<E: Versioned>(
        &self,
        current: &E,
        patch: &E::Patch,
        expected_version: Option<Version>,
    ) -> Result<E, CoreError> {
        if let Some(expected) = expected_version {
            if expected != current.version() {
                return Err(CoreError::Conflict(format!(
                    "{} {} is at version {}, not {expected}",
                    E::KIND,
                    current.id(),
                    current.version()
                )));
            }
        }
        ensure_mutable(current)?;

        let content = E::patched(&current.content(), patch)?;
        let id = current.id();
        let expected = current.revision();
        self.db
            .run(|s| E::write_content(s, id, expected, &content))
            .await
    }

    /// Restore the content of `target` as a new version.
    pub async fn rollback<E: Versioned>(&self, current: &E, target: Version) -> Result<E, CoreError> {
        let id = current.id();
        if target < 1 {
            return Err(CoreError::Validation(format!(
                "version must be at least 1, got {target}"
            )));
        }
        if target >= current.version() {
            return Err(CoreError::VersionNotFound {
                entity: E::KIND.as_str(),
                id,
                version: target,
            });
        }
        ensure_mutable(current)?;

        let snapshot = self
            .db
            .run(|s| E::fetch_snapshot(s, id, target))
            .await?
            .ok_or(CoreError::VersionNotFound {
                entity: E::KIND.as_str(),
                id,
                version: target,
            })?;

        let expected = current.revision();
        self.db
            .run(|s| E::write_content(s, id, expected, &snapshot.content))
            .await
    }

    /// All snapshots of an entity, version ascending.
    pub async fn history<E: Versioned>(
        &self,
        id: DbId,
    ) -> Result<Vec<Snapshot<E::Content>>, CoreError> {
        self.db.run(|s| E::fetch_snapshots(s, id)).await
    }
}

fn ensure_mutable<E: Versioned>(current: &E) -> Result<(), CoreError> {
    if current.status().is_terminal() {
        return Err(CoreError::InvalidState(format!(
            "{} {} is {} and can no longer be changed",
            E::KIND,
            current.id(),
            current.status()
        )));
    }
    Ok(())
}
