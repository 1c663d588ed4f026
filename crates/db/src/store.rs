//! PostgreSQL implementation of [`EntityStore`].
//!
//! Every write runs in one transaction: the target row is read with
//! `SELECT ... FOR UPDATE`, compared against the caller's [`Revision`], and
//! only then modified. Dropping the future (deadline elapsed) drops the
//! transaction, which rolls it back.

use async_trait::async_trait;
use chrono::Utc;
use tenders_core::bid::{AuthorRef, Bid, BidContent, BidDecisionRecord, BidFeedback, BidStatus};
use tenders_core::directory::Employee;
use tenders_core::pagination::Page;
use tenders_core::store::{
    BidFilter, EntityStore, Revision, Snapshot, StoreError, StoreResult, TenderFilter,
};
use tenders_core::tender::{Tender, TenderContent, TenderStatus};
use tenders_core::types::{DbId, Version};

use crate::repositories::{
    BidDecisionRepo, BidFeedbackRepo, BidRepo, BidVersionRepo, DirectoryRepo, TenderRepo,
    TenderVersionRepo,
};
use crate::DbPool;

/// Errors raised inside a store method before they are classified.
#[derive(Debug, thiserror::Error)]
enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// SQLSTATE codes that mean "another writer got there first".
const CONFLICT_CODES: [&str; 3] = ["40001", "40P01", "23505"];

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Store(e) => e,
            DbError::Sqlx(e) => classify(e),
        }
    }
}

fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        sqlx::Error::Database(db)
            if db
                .code()
                .is_some_and(|code| CONFLICT_CODES.contains(&code.as_ref())) =>
        {
            StoreError::Conflict(db.message().to_string())
        }
        _ => {
            tracing::error!(error = %err, "Database error");
            StoreError::Backend(err.to_string())
        }
    }
}

fn check<S: Copy + PartialEq + std::fmt::Display>(
    entity: &str,
    id: DbId,
    expected: Revision<S>,
    version: Version,
    status: S,
) -> Result<(), StoreError> {
    if expected.matches(version, status) {
        Ok(())
    } else {
        Err(StoreError::Conflict(format!(
            "{entity} {id} changed concurrently (now version {version}, {status})"
        )))
    }
}

fn require_tender_status(tender: &Tender, required: TenderStatus) -> Result<(), StoreError> {
    if tender.status == required {
        Ok(())
    } else {
        Err(StoreError::Conflict(format!(
            "Tender {} is {}, expected {required}",
            tender.id, tender.status
        )))
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn lock_tender(
        conn: &mut sqlx::PgConnection,
        id: DbId,
    ) -> Result<Tender, DbError> {
        let row = TenderRepo::lock(conn, id)
            .await?
            .ok_or(StoreError::Missing {
                entity: "Tender",
                id,
            })?;
        Ok(Tender::try_from(row)?)
    }

    async fn lock_bid(conn: &mut sqlx::PgConnection, id: DbId) -> Result<Bid, DbError> {
        let row = BidRepo::lock(conn, id)
            .await?
            .ok_or(StoreError::Missing { entity: "Bid", id })?;
        Ok(Bid::try_from(row)?)
    }

    async fn replace_tender_content_tx(
        &self,
        id: DbId,
        expected: Revision<TenderStatus>,
        content: &TenderContent,
    ) -> Result<Tender, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_tender(&mut tx, id).await?;
        check("Tender", id, expected, current.version, current.status)?;

        TenderVersionRepo::create(&mut *tx, id, current.version, &current.content(), Utc::now())
            .await?;
        let row = TenderRepo::update_content(&mut *tx, id, content, current.version + 1).await?;

        tx.commit().await?;
        Ok(Tender::try_from(row)?)
    }

    async fn set_tender_status_tx(
        &self,
        id: DbId,
        expected: Revision<TenderStatus>,
        status: TenderStatus,
    ) -> Result<Tender, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_tender(&mut tx, id).await?;
        check("Tender", id, expected, current.version, current.status)?;
        let row = TenderRepo::update_status(&mut *tx, id, status).await?;

        tx.commit().await?;
        Ok(Tender::try_from(row)?)
    }

    async fn insert_bid_tx(&self, bid: &Bid, tender_status: TenderStatus) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let tender = Self::lock_tender(&mut tx, bid.tender_id).await?;
        require_tender_status(&tender, tender_status)?;
        BidRepo::create(&mut *tx, bid).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn replace_bid_content_tx(
        &self,
        id: DbId,
        expected: Revision<BidStatus>,
        content: &BidContent,
    ) -> Result<Bid, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_bid(&mut tx, id).await?;
        check("Bid", id, expected, current.version, current.status)?;

        BidVersionRepo::create(&mut *tx, id, current.version, &current.content(), Utc::now())
            .await?;
        let row = BidRepo::update_content(&mut *tx, id, content, current.version + 1).await?;

        tx.commit().await?;
        Ok(Bid::try_from(row)?)
    }

    async fn set_bid_status_tx(
        &self,
        id: DbId,
        expected: Revision<BidStatus>,
        status: BidStatus,
    ) -> Result<Bid, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_bid(&mut tx, id).await?;
        check("Bid", id, expected, current.version, current.status)?;
        let row = BidRepo::update_status(&mut *tx, id, status).await?;

        tx.commit().await?;
        Ok(Bid::try_from(row)?)
    }

    /// Locks the tender before the bid, the same order `insert_bid` uses.
    async fn record_decision_tx(
        &self,
        decision: &BidDecisionRecord,
        expected: Revision<BidStatus>,
        tender_status: TenderStatus,
    ) -> Result<Bid, DbError> {
        let mut tx = self.pool.begin().await?;

        let tender_id = BidRepo::find_by_id(&mut *tx, decision.bid_id)
            .await?
            .ok_or(StoreError::Missing {
                entity: "Bid",
                id: decision.bid_id,
            })?
            .tender_id;
        let tender = Self::lock_tender(&mut tx, tender_id).await?;
        require_tender_status(&tender, tender_status)?;

        let current = Self::lock_bid(&mut tx, decision.bid_id).await?;
        check("Bid", current.id, expected, current.version, current.status)?;

        BidDecisionRepo::upsert(&mut *tx, decision).await?;
        let row = BidRepo::update_status(
            &mut *tx,
            decision.bid_id,
            decision.decision.resulting_status(),
        )
        .await?;

        tx.commit().await?;
        Ok(Bid::try_from(row)?)
    }

    async fn upsert_feedback_tx(&self, feedback: &BidFeedback) -> Result<BidFeedback, DbError> {
        let mut tx = self.pool.begin().await?;

        Self::lock_bid(&mut tx, feedback.bid_id).await?;
        let row = BidFeedbackRepo::upsert(&mut *tx, feedback).await?;

        tx.commit().await?;
        Ok(row.into())
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await.map_err(classify)
    }

    async fn find_employee(&self, username: &str) -> StoreResult<Option<Employee>> {
        let row = DirectoryRepo::find_employee_by_username(&self.pool, username)
            .await
            .map_err(classify)?;
        Ok(row.map(Employee::from))
    }

    async fn responsible_organizations(&self, employee_id: DbId) -> StoreResult<Vec<DbId>> {
        DirectoryRepo::responsible_organization_ids(&self.pool, employee_id)
            .await
            .map_err(classify)
    }

    async fn insert_tender(&self, tender: &Tender) -> StoreResult<()> {
        TenderRepo::create(&self.pool, tender)
            .await
            .map_err(classify)
    }

    async fn get_tender(&self, id: DbId) -> StoreResult<Option<Tender>> {
        TenderRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(Tender::try_from)
            .transpose()
    }

    async fn list_tenders(&self, filter: &TenderFilter, page: Page) -> StoreResult<Vec<Tender>> {
        TenderRepo::list(&self.pool, filter, page)
            .await
            .map_err(classify)?
            .into_iter()
            .map(Tender::try_from)
            .collect()
    }

    async fn tender_snapshot(
        &self,
        id: DbId,
        version: Version,
    ) -> StoreResult<Option<Snapshot<TenderContent>>> {
        TenderVersionRepo::find(&self.pool, id, version)
            .await
            .map_err(classify)?
            .map(Snapshot::try_from)
            .transpose()
    }

    async fn tender_snapshots(&self, id: DbId) -> StoreResult<Vec<Snapshot<TenderContent>>> {
        TenderVersionRepo::list_by_tender(&self.pool, id)
            .await
            .map_err(classify)?
            .into_iter()
            .map(Snapshot::try_from)
            .collect()
    }

    async fn replace_tender_content(
        &self,
        id: DbId,
        expected: Revision<TenderStatus>,
        content: &TenderContent,
    ) -> StoreResult<Tender> {
        Ok(self.replace_tender_content_tx(id, expected, content).await?)
    }

    async fn set_tender_status(
        &self,
        id: DbId,
        expected: Revision<TenderStatus>,
        status: TenderStatus,
    ) -> StoreResult<Tender> {
        Ok(self.set_tender_status_tx(id, expected, status).await?)
    }

    async fn insert_bid(&self, bid: &Bid, tender_status: TenderStatus) -> StoreResult<()> {
        Ok(self.insert_bid_tx(bid, tender_status).await?)
    }

    async fn get_bid(&self, id: DbId) -> StoreResult<Option<Bid>> {
        BidRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(Bid::try_from)
            .transpose()
    }

    async fn list_bids(&self, filter: &BidFilter, page: Page) -> StoreResult<Vec<Bid>> {
        BidRepo::list(&self.pool, filter, page)
            .await
            .map_err(classify)?
            .into_iter()
            .map(Bid::try_from)
            .collect()
    }

    async fn bid_snapshot(
        &self,
        id: DbId,
        version: Version,
    ) -> StoreResult<Option<Snapshot<BidContent>>> {
        let row = BidVersionRepo::find(&self.pool, id, version)
            .await
            .map_err(classify)?;
        Ok(row.map(Snapshot::from))
    }

    async fn bid_snapshots(&self, id: DbId) -> StoreResult<Vec<Snapshot<BidContent>>> {
        let rows = BidVersionRepo::list_by_bid(&self.pool, id)
            .await
            .map_err(classify)?;
        Ok(rows.into_iter().map(Snapshot::from).collect())
    }

    async fn replace_bid_content(
        &self,
        id: DbId,
        expected: Revision<BidStatus>,
        content: &BidContent,
    ) -> StoreResult<Bid> {
        Ok(self.replace_bid_content_tx(id, expected, content).await?)
    }

    async fn set_bid_status(
        &self,
        id: DbId,
        expected: Revision<BidStatus>,
        status: BidStatus,
    ) -> StoreResult<Bid> {
        Ok(self.set_bid_status_tx(id, expected, status).await?)
    }

    async fn record_decision(
        &self,
        decision: &BidDecisionRecord,
        expected: Revision<BidStatus>,
        tender_status: TenderStatus,
    ) -> StoreResult<Bid> {
        Ok(self
            .record_decision_tx(decision, expected, tender_status)
            .await?)
    }

    async fn get_decision(&self, bid_id: DbId) -> StoreResult<Option<BidDecisionRecord>> {
        BidDecisionRepo::find(&self.pool, bid_id)
            .await
            .map_err(classify)?
            .map(BidDecisionRecord::try_from)
            .transpose()
    }

    async fn upsert_feedback(&self, feedback: &BidFeedback) -> StoreResult<BidFeedback> {
        Ok(self.upsert_feedback_tx(feedback).await?)
    }

    async fn list_feedback(
        &self,
        authors: &[AuthorRef],
        page: Page,
    ) -> StoreResult<Vec<BidFeedback>> {
        let rows = BidFeedbackRepo::list_by_authors(&self.pool, authors, page)
            .await
            .map_err(classify)?;
        Ok(rows.into_iter().map(BidFeedback::from).collect())
    }
}
