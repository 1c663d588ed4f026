//! Read-side listings with pagination and visibility rules.

use crate::access::{resolve_actor, Actor};
use crate::bid::{Bid, BidFeedback, BidStatus};
use crate::deadline::StoreHandle;
use crate::error::CoreError;
use crate::pagination::{Page, PagePolicy};
use crate::store::{BidFilter, TenderFilter};
use crate::tender::{ServiceType, Tender};
use crate::types::DbId;
use crate::versioning::VersionManager;

/// Bid statuses a tender owner can see. `Created` bids are drafts and stay
/// private to their author.
pub const OWNER_VISIBLE_BID_STATUSES: [BidStatus; 4] = [
    BidStatus::Published,
    BidStatus::Canceled,
    BidStatus::Approved,
    BidStatus::Rejected,
];

pub struct QueryGateway<'a> {
    db: StoreHandle<'a>,
    pages: PagePolicy,
}

impl<'a> QueryGateway<'a> {
    pub fn new(db: StoreHandle<'a>, pages: PagePolicy) -> Self {
        Self { db, pages }
    }

    fn page(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Page, CoreError> {
        self.pages.page(limit, offset)
    }

    /// All tenders, optionally restricted to some service types.
    pub async fn list_tenders(
        &self,
        service_types: &[ServiceType],
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Tender>, CoreError> {
        let page = self.page(limit, offset)?;
        let filter = TenderFilter {
            organization_ids: None,
            service_types: service_types.to_vec(),
        };
        self.db.run(|s| s.list_tenders(&filter, page)).await
    }

    /// Tenders of every organization `username` is responsible for.
    pub async fn list_user_tenders(
        &self,
        username: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Tender>, CoreError> {
        let page = self.page(limit, offset)?;
        let actor = resolve_actor(self.db, username).await?;
        let filter = TenderFilter {
            organization_ids: Some(actor.organizations),
            service_types: Vec::new(),
        };
        self.db.run(|s| s.list_tenders(&filter, page)).await
    }

    /// Bids authored by `username` directly or through their organizations.
    pub async fn list_user_bids(
        &self,
        username: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Bid>, CoreError> {
        let page = self.page(limit, offset)?;
        let actor = resolve_actor(self.db, username).await?;
        let filter = BidFilter {
            authors: Some(actor.author_refs()),
            ..Default::default()
        };
        self.db.run(|s| s.list_bids(&filter, page)).await
    }

    /// Bids on a tender as seen by `username`.
    ///
    /// The tender owner sees every non-draft bid; anyone else sees only the
    /// bids they authored.
    pub async fn list_bids_for_tender(
        &self,
        tender_id: DbId,
        username: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Bid>, CoreError> {
        let page = self.page(limit, offset)?;
        let actor = resolve_actor(self.db, username).await?;
        let tender: Tender = VersionManager::new(self.db).load(tender_id).await?;

        let filter = if actor.owns_tender(&tender) {
            BidFilter {
                tender_id: Some(tender_id),
                authors: None,
                statuses: Some(OWNER_VISIBLE_BID_STATUSES.to_vec()),
            }
        } else {
            BidFilter {
                tender_id: Some(tender_id),
                authors: Some(actor.author_refs()),
                statuses: None,
            }
        };
        self.db.run(|s| s.list_bids(&filter, page)).await
    }

    /// Feedback left on bids by `author_username`, for the owner of a tender
    /// that author has bid on.
    pub async fn list_bid_reviews(
        &self,
        tender_id: DbId,
        author_username: &str,
        requester_username: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<BidFeedback>, CoreError> {
        let page = self.page(limit, offset)?;
        let requester = resolve_actor(self.db, requester_username).await?;
        let tender: Tender = VersionManager::new(self.db).load(tender_id).await?;
        requester.ensure_owns_tender(&tender)?;

        let author = self.find_author(author_username).await?;
        let authors = author.author_refs();

        let on_tender = BidFilter {
            tender_id: Some(tender_id),
            authors: Some(authors.clone()),
            statuses: None,
        };
        let first = Page { limit: 1, offset: 0 };
        let bids = self.db.run(|s| s.list_bids(&on_tender, first)).await?;
        if bids.is_empty() {
            return Err(CoreError::NotFound {
                entity: "Bid",
                id: format!("by {} on tender {tender_id}", author.username()),
            });
        }

        self.db.run(|s| s.list_feedback(&authors, page)).await
    }

    /// Like [`resolve_actor`], but an unknown author is `NotFound`: the
    /// author is a subject of the query, not the caller.
    async fn find_author(&self, username: &str) -> Result<Actor, CoreError> {
        match resolve_actor(self.db, username).await {
            Err(CoreError::Unauthorized(_)) => Err(CoreError::NotFound {
                entity: "Employee",
                id: username.to_string(),
            }),
            other => other,
        }
    }
}
