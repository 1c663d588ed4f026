//! The procurement facade: every externally visible operation, one method each.
//!
//! Handlers hold a [`Procurement`] and call straight into it. The facade
//! resolves the acting user, checks ownership, and delegates to the version
//! manager, status machine and query gateway, all over the injected store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use validator::Validate;

use crate::access::resolve_actor;
use crate::bid::{
    validate_feedback, Bid, BidContent, BidFeedback, BidPatch, BidStatus, CreateBid, Decision,
};
use crate::deadline::{StoreHandle, DEFAULT_STORE_TIMEOUT};
use crate::error::CoreError;
use crate::lifecycle::StatusMachine;
use crate::pagination::PagePolicy;
use crate::query::QueryGateway;
use crate::store::{EntityStore, Snapshot};
use crate::tender::{CreateTender, ServiceType, Tender, TenderContent, TenderPatch, TenderStatus};
use crate::types::{new_id, DbId, Version};
use crate::versioning::VersionManager;

/// Tunables of the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Deadline applied to each individual store call.
    pub store_timeout: Duration,
    pub pages: PagePolicy,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            pages: PagePolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct Procurement {
    store: Arc<dyn EntityStore>,
    settings: ServiceSettings,
}

impl Procurement {
    pub fn new(store: Arc<dyn EntityStore>, settings: ServiceSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> ServiceSettings {
        self.settings
    }

    fn db(&self) -> StoreHandle<'_> {
        StoreHandle::new(self.store.as_ref(), self.settings.store_timeout)
    }

    fn versions(&self) -> VersionManager<'_> {
        VersionManager::new(self.db())
    }

    fn statuses(&self) -> StatusMachine<'_> {
        StatusMachine::new(self.db())
    }

    fn queries(&self) -> QueryGateway<'_> {
        QueryGateway::new(self.db(), self.settings.pages)
    }

    /// Succeeds when the store answers within the deadline.
    pub async fn check_health(&self) -> Result<(), CoreError> {
        self.db().run(|s| s.ping()).await
    }

    // -----------------------------------------------------------------------
    // Tenders
    // -----------------------------------------------------------------------

    pub async fn list_tenders(
        &self,
        service_types: &[ServiceType],
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Tender>, CoreError> {
        self.queries()
            .list_tenders(service_types, limit, offset)
            .await
    }

    pub async fn list_user_tenders(
        &self,
        username: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Tender>, CoreError> {
        self.queries()
            .list_user_tenders(username, limit, offset)
            .await
    }

    /// Create a tender at version 1 in status `Created`.
    pub async fn create_tender(&self, input: CreateTender) -> Result<Tender, CoreError> {
        input.validate()?;
        let actor = resolve_actor(self.db(), &input.creator_username).await?;
        if !actor.is_responsible_for(input.organization_id) {
            return Err(CoreError::Forbidden(format!(
                "{} is not responsible for organization {}",
                actor.username(),
                input.organization_id
            )));
        }

        let tender = Tender {
            id: new_id(),
            organization_id: input.organization_id,
            name: input.name,
            description: input.description,
            service_type: input.service_type,
            status: TenderStatus::Created,
            version: 1,
            created_at: Utc::now(),
        };
        self.db().run(|s| s.insert_tender(&tender)).await?;
        Ok(tender)
    }

    pub async fn get_tender_status(&self, id: DbId) -> Result<TenderStatus, CoreError> {
        let tender: Tender = self.versions().load(id).await?;
        Ok(tender.status)
    }

    pub async fn update_tender_status(
        &self,
        id: DbId,
        username: &str,
        status: TenderStatus,
    ) -> Result<Tender, CoreError> {
        let actor = resolve_actor(self.db(), username).await?;
        let tender: Tender = self.versions().load(id).await?;
        actor.ensure_owns_tender(&tender)?;
        self.statuses().update_status(&tender, status).await
    }

    pub async fn edit_tender(
        &self,
        id: DbId,
        username: &str,
        patch: &TenderPatch,
        expected_version: Option<Version>,
    ) -> Result<Tender, CoreError> {
        let actor = resolve_actor(self.db(), username).await?;
        let tender: Tender = self.versions().load(id).await?;
        actor.ensure_owns_tender(&tender)?;
        self.versions().edit(&tender, patch, expected_version).await
    }

    pub async fn rollback_tender(
        &self,
        id: DbId,
        username: &str,
        version: Version,
    ) -> Result<Tender, CoreError> {
        let actor = resolve_actor(self.db(), username).await?;
        let tender: Tender = self.versions().load(id).await?;
        actor.ensure_owns_tender(&tender)?;
        self.versions().rollback(&tender, version).await
    }

    /// Superseded versions of a tender, oldest first.
    pub async fn tender_history(
        &self,
        id: DbId,
    ) -> Result<Vec<Snapshot<TenderContent>>, CoreError> {
        let _: Tender = self.versions().load(id).await?;
        self.versions().history::<Tender>(id).await
    }

    // -----------------------------------------------------------------------
    // Bids
    // -----------------------------------------------------------------------

    /// Create a bid at version 1 in status `Created` on a published tender.
    pub async fn create_bid(&self, input: CreateBid) -> Result<Bid, CoreError> {
        input.validate()?;
        let actor = resolve_actor(self.db(), &input.creator_username).await?;
        let bid = Bid {
            id: new_id(),
            tender_id: input.tender_id,
            author_type: input.author_type,
            author_id: input.author_id,
            name: input.name,
            description: input.description,
            status: BidStatus::Created,
            version: 1,
            created_at: Utc::now(),
        };
        if !actor.may_author_as(bid.author()) {
            return Err(CoreError::Forbidden(format!(
                "{} may not submit bids as {} {}",
                actor.username(),
                bid.author_type,
                bid.author_id
            )));
        }

        let tender: Tender = self.versions().load(bid.tender_id).await?;
        if tender.status != TenderStatus::Published {
            return Err(CoreError::InvalidState(format!(
                "Tender {} is {}; bids need a Published tender",
                tender.id, tender.status
            )));
        }

        self.db()
            .run(|s| s.insert_bid(&bid, TenderStatus::Published))
            .await?;
        Ok(bid)
    }

    pub async fn list_user_bids(
        &self,
        username: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Bid>, CoreError> {
        self.queries().list_user_bids(username, limit, offset).await
    }

    pub async fn list_bids_for_tender(
        &self,
        tender_id: DbId,
        username: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Bid>, CoreError> {
        self.queries()
            .list_bids_for_tender(tender_id, username, limit, offset)
            .await
    }

    pub async fn get_bid_status(&self, id: DbId) -> Result<BidStatus, CoreError> {
        let bid: Bid = self.versions().load(id).await?;
        Ok(bid.status)
    }

    pub async fn update_bid_status(
        &self,
        id: DbId,
        username: &str,
        status: BidStatus,
    ) -> Result<Bid, CoreError> {
        let actor = resolve_actor(self.db(), username).await?;
        let bid: Bid = self.versions().load(id).await?;
        actor.ensure_owns_bid(&bid)?;
        self.statuses().update_status(&bid, status).await
    }

    pub async fn edit_bid(
        &self,
        id: DbId,
        username: &str,
        patch: &BidPatch,
        expected_version: Option<Version>,
    ) -> Result<Bid, CoreError> {
        let actor = resolve_actor(self.db(), username).await?;
        let bid: Bid = self.versions().load(id).await?;
        actor.ensure_owns_bid(&bid)?;
        self.versions().edit(&bid, patch, expected_version).await
    }

    pub async fn rollback_bid(
        &self,
        id: DbId,
        username: &str,
        version: Version,
    ) -> Result<Bid, CoreError> {
        let actor = resolve_actor(self.db(), username).await?;
        let bid: Bid = self.versions().load(id).await?;
        actor.ensure_owns_bid(&bid)?;
        self.versions().rollback(&bid, version).await
    }

    /// Approve or reject a published bid. Only the tender owner may decide.
    pub async fn submit_bid_decision(
        &self,
        id: DbId,
        decision: Decision,
        username: &str,
    ) -> Result<Bid, CoreError> {
        let actor = resolve_actor(self.db(), username).await?;
        let bid: Bid = self.versions().load(id).await?;
        let tender: Tender = self.versions().load(bid.tender_id).await?;
        actor.ensure_owns_tender(&tender)?;
        let (bid, _record) = self
            .statuses()
            .submit_decision(&bid, &tender, &actor.employee, decision)
            .await?;
        Ok(bid)
    }

    /// Leave (or replace) the tender owner's feedback on a bid.
    pub async fn submit_bid_feedback(
        &self,
        id: DbId,
        text: &str,
        username: &str,
    ) -> Result<Bid, CoreError> {
        validate_feedback(text)?;
        let actor = resolve_actor(self.db(), username).await?;
        let bid: Bid = self.versions().load(id).await?;
        let tender: Tender = self.versions().load(bid.tender_id).await?;
        actor.ensure_owns_tender(&tender)?;

        let now = Utc::now();
        let feedback = BidFeedback {
            id: new_id(),
            bid_id: bid.id,
            reviewer_id: actor.id(),
            description: text.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.db().run(|s| s.upsert_feedback(&feedback)).await?;
        Ok(bid)
    }

    pub async fn list_bid_reviews(
        &self,
        tender_id: DbId,
        author_username: &str,
        requester_username: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<BidFeedback>, CoreError> {
        self.queries()
            .list_bid_reviews(tender_id, author_username, requester_username, limit, offset)
            .await
    }

    /// Superseded versions of a bid, oldest first.
    pub async fn bid_history(&self, id: DbId) -> Result<Vec<Snapshot<BidContent>>, CoreError> {
        let _: Bid = self.versions().load(id).await?;
        self.versions().history::<Bid>(id).await
    }
}
