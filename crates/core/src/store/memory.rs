//! In-memory [`EntityStore`] used by tests and `STORE_BACKEND=memory`.
//!
//! Each tender and bid lives behind its own mutex; the outer maps are only
//! locked long enough to look up or insert an entry. Writes that touch a
//! tender and one of its bids lock the tender first. No lock is ever held
//! across an `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::bid::{AuthorRef, Bid, BidContent, BidDecisionRecord, BidFeedback, BidStatus};
use crate::directory::{Employee, Organization};
use crate::pagination::Page;
use crate::tender::{Tender, TenderContent, TenderStatus};
use crate::types::{DbId, Timestamp, Version};
use crate::versioning::Versioned;

use super::{
    BidFilter, EntityStore, Revision, Snapshot, StoreError, StoreResult, TenderFilter,
};

/// Live record plus every superseded version of it.
struct Entry<E: Versioned> {
    live: E,
    snapshots: BTreeMap<Version, Snapshot<E::Content>>,
}

impl<E: Versioned> Entry<E> {
    fn new(live: E) -> Self {
        Self {
            live,
            snapshots: BTreeMap::new(),
        }
    }

    fn check(&self, expected: Revision<E::Status>) -> StoreResult<()> {
        if expected.matches(self.live.version(), self.live.status()) {
            Ok(())
        } else {
            Err(StoreError::Conflict(format!(
                "{} {} changed concurrently (now version {}, {})",
                E::KIND,
                self.live.id(),
                self.live.version(),
                self.live.status()
            )))
        }
    }

    fn replace_content(&mut self, content: E::Content, now: Timestamp) -> E {
        let version = self.live.version();
        self.snapshots.insert(
            version,
            Snapshot {
                entity_id: self.live.id(),
                version,
                content: self.live.content(),
                created_at: now,
            },
        );
        self.live.set_content(content);
        self.live.set_version(version + 1);
        self.live.clone()
    }

    fn snapshot(&self, version: Version) -> Option<Snapshot<E::Content>> {
        self.snapshots.get(&version).cloned()
    }

    fn history(&self) -> Vec<Snapshot<E::Content>> {
        self.snapshots.values().cloned().collect()
    }
}

struct BidEntry {
    versions: Entry<Bid>,
    decision: Option<BidDecisionRecord>,
    feedback: Option<BidFeedback>,
}

type Shared<T> = Arc<Mutex<T>>;

#[derive(Default)]
pub struct InMemoryStore {
    employees: RwLock<HashMap<DbId, Employee>>,
    organizations: RwLock<HashMap<DbId, Organization>>,
    /// employee id -> organization ids
    responsible: RwLock<HashMap<DbId, Vec<DbId>>>,
    tenders: RwLock<HashMap<DbId, Shared<Entry<Tender>>>>,
    bids: RwLock<HashMap<DbId, Shared<BidEntry>>>,
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".into())
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| poisoned())
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| poisoned())
}

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| poisoned())
}

/// `created_at` descending, then id ascending.
fn newest_first(a: (Timestamp, DbId), b: (Timestamp, DbId)) -> std::cmp::Ordering {
    b.0.cmp(&a.0).then(a.1.cmp(&b.1))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Directory seeding ----------------------------------------------------

    pub fn add_employee(&self, employee: Employee) -> StoreResult<()> {
        let mut employees = write(&self.employees)?;
        if employees.values().any(|e| e.username == employee.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' is already taken",
                employee.username
            )));
        }
        employees.insert(employee.id, employee);
        Ok(())
    }

    pub fn add_organization(&self, organization: Organization) -> StoreResult<()> {
        write(&self.organizations)?.insert(organization.id, organization);
        Ok(())
    }

    /// Make `employee_id` responsible for `organization_id`.
    pub fn assign_responsible(&self, organization_id: DbId, employee_id: DbId) -> StoreResult<()> {
        if !read(&self.organizations)?.contains_key(&organization_id) {
            return Err(StoreError::Missing {
                entity: "Organization",
                id: organization_id,
            });
        }
        if !read(&self.employees)?.contains_key(&employee_id) {
            return Err(StoreError::Missing {
                entity: "Employee",
                id: employee_id,
            });
        }
        let mut responsible = write(&self.responsible)?;
        let orgs = responsible.entry(employee_id).or_default();
        if !orgs.contains(&organization_id) {
            orgs.push(organization_id);
        }
        Ok(())
    }

    // -- Entry lookup ---------------------------------------------------------

    fn tender_entry(&self, id: DbId) -> StoreResult<Shared<Entry<Tender>>> {
        read(&self.tenders)?
            .get(&id)
            .cloned()
            .ok_or(StoreError::Missing {
                entity: "Tender",
                id,
            })
    }

    fn bid_entry(&self, id: DbId) -> StoreResult<Shared<BidEntry>> {
        read(&self.bids)?.get(&id).cloned().ok_or(StoreError::Missing {
            entity: "Bid",
            id,
        })
    }

    fn all_bid_entries(&self) -> StoreResult<Vec<Shared<BidEntry>>> {
        Ok(read(&self.bids)?.values().cloned().collect())
    }

    fn ensure_tender_status(entry: &Entry<Tender>, required: TenderStatus) -> StoreResult<()> {
        if entry.live.status == required {
            Ok(())
        } else {
            Err(StoreError::Conflict(format!(
                "Tender {} is {}, expected {required}",
                entry.live.id, entry.live.status
            )))
        }
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        read(&self.tenders).map(|_| ())
    }

    // -- Directory --------------------------------------------------------------

    async fn find_employee(&self, username: &str) -> StoreResult<Option<Employee>> {
        Ok(read(&self.employees)?
            .values()
            .find(|e| e.username == username)
            .cloned())
    }

    async fn responsible_organizations(&self, employee_id: DbId) -> StoreResult<Vec<DbId>> {
        Ok(read(&self.responsible)?
            .get(&employee_id)
            .cloned()
            .unwrap_or_default())
    }

    // -- Tenders ----------------------------------------------------------------

    async fn insert_tender(&self, tender: &Tender) -> StoreResult<()> {
        let mut tenders = write(&self.tenders)?;
        if tenders.contains_key(&tender.id) {
            return Err(StoreError::Conflict(format!(
                "Tender {} already exists",
                tender.id
            )));
        }
        tenders.insert(tender.id, Arc::new(Mutex::new(Entry::new(tender.clone()))));
        Ok(())
    }

    async fn get_tender(&self, id: DbId) -> StoreResult<Option<Tender>> {
        match self.tender_entry(id) {
            Ok(entry) => Ok(Some(lock(&entry)?.live.clone())),
            Err(StoreError::Missing { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_tenders(&self, filter: &TenderFilter, page: Page) -> StoreResult<Vec<Tender>> {
        let entries: Vec<_> = read(&self.tenders)?.values().cloned().collect();
        let mut tenders = Vec::new();
        for entry in entries {
            let tender = lock(&entry)?.live.clone();
            if filter.matches(&tender) {
                tenders.push(tender);
            }
        }
        tenders.sort_by(|a, b| newest_first((a.created_at, a.id), (b.created_at, b.id)));
        Ok(page.apply(tenders))
    }

    async fn tender_snapshot(
        &self,
        id: DbId,
        version: Version,
    ) -> StoreResult<Option<Snapshot<TenderContent>>> {
        let entry = self.tender_entry(id)?;
        let snapshot = lock(&entry)?.snapshot(version);
        Ok(snapshot)
    }

    async fn tender_snapshots(&self, id: DbId) -> StoreResult<Vec<Snapshot<TenderContent>>> {
        let entry = self.tender_entry(id)?;
        let history = lock(&entry)?.history();
        Ok(history)
    }

    async fn replace_tender_content(
        &self,
        id: DbId,
        expected: Revision<TenderStatus>,
        content: &TenderContent,
    ) -> StoreResult<Tender> {
        let entry = self.tender_entry(id)?;
        let mut entry = lock(&entry)?;
        entry.check(expected)?;
        Ok(entry.replace_content(content.clone(), Utc::now()))
    }

    async fn set_tender_status(
        &self,
        id: DbId,
        expected: Revision<TenderStatus>,
        status: TenderStatus,
    ) -> StoreResult<Tender> {
        let entry = self.tender_entry(id)?;
        let mut entry = lock(&entry)?;
        entry.check(expected)?;
        entry.live.status = status;
        Ok(entry.live.clone())
    }

    // -- Bids -------------------------------------------------------------------

    async fn insert_bid(&self, bid: &Bid, tender_status: TenderStatus) -> StoreResult<()> {
        let tender = self.tender_entry(bid.tender_id)?;
        let tender = lock(&tender)?;
        Self::ensure_tender_status(&tender, tender_status)?;

        let mut bids = write(&self.bids)?;
        if bids.contains_key(&bid.id) {
            return Err(StoreError::Conflict(format!("Bid {} already exists", bid.id)));
        }
        bids.insert(
            bid.id,
            Arc::new(Mutex::new(BidEntry {
                versions: Entry::new(bid.clone()),
                decision: None,
                feedback: None,
            })),
        );
        Ok(())
    }

    async fn get_bid(&self, id: DbId) -> StoreResult<Option<Bid>> {
        match self.bid_entry(id) {
            Ok(entry) => Ok(Some(lock(&entry)?.versions.live.clone())),
            Err(StoreError::Missing { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_bids(&self, filter: &BidFilter, page: Page) -> StoreResult<Vec<Bid>> {
        let mut bids = Vec::new();
        for entry in self.all_bid_entries()? {
            let bid = lock(&entry)?.versions.live.clone();
            if filter.matches(&bid) {
                bids.push(bid);
            }
        }
        bids.sort_by(|a, b| newest_first((a.created_at, a.id), (b.created_at, b.id)));
        Ok(page.apply(bids))
    }

    async fn bid_snapshot(
        &self,
        id: DbId,
        version: Version,
    ) -> StoreResult<Option<Snapshot<BidContent>>> {
        let entry = self.bid_entry(id)?;
        let snapshot = lock(&entry)?.versions.snapshot(version);
        Ok(snapshot)
    }

    async fn bid_snapshots(&self, id: DbId) -> StoreResult<Vec<Snapshot<BidContent>>> {
        let entry = self.bid_entry(id)?;
        let history = lock(&entry)?.versions.history();
        Ok(history)
    }

    async fn replace_bid_content(
        &self,
        id: DbId,
        expected: Revision<BidStatus>,
        content: &BidContent,
    ) -> StoreResult<Bid> {
        let entry = self.bid_entry(id)?;
        let mut entry = lock(&entry)?;
        entry.versions.check(expected)?;
        Ok(entry.versions.replace_content(content.clone(), Utc::now()))
    }

    async fn set_bid_status(
        &self,
        id: DbId,
        expected: Revision<BidStatus>,
        status: BidStatus,
    ) -> StoreResult<Bid> {
        let entry = self.bid_entry(id)?;
        let mut entry = lock(&entry)?;
        entry.versions.check(expected)?;
        entry.versions.live.status = status;
        Ok(entry.versions.live.clone())
    }

    async fn record_decision(
        &self,
        decision: &BidDecisionRecord,
        expected: Revision<BidStatus>,
        tender_status: TenderStatus,
    ) -> StoreResult<Bid> {
        let bid_entry = self.bid_entry(decision.bid_id)?;
        let tender_id = lock(&bid_entry)?.versions.live.tender_id;

        let tender = self.tender_entry(tender_id)?;
        let tender = lock(&tender)?;
        Self::ensure_tender_status(&tender, tender_status)?;

        let mut entry = lock(&bid_entry)?;
        entry.versions.check(expected)?;
        entry.versions.live.status = decision.decision.resulting_status();
        entry.decision = Some(decision.clone());
        Ok(entry.versions.live.clone())
    }

    async fn get_decision(&self, bid_id: DbId) -> StoreResult<Option<BidDecisionRecord>> {
        let entry = self.bid_entry(bid_id)?;
        let decision = lock(&entry)?.decision.clone();
        Ok(decision)
    }

    async fn upsert_feedback(&self, feedback: &BidFeedback) -> StoreResult<BidFeedback> {
        let entry = self.bid_entry(feedback.bid_id)?;
        let mut entry = lock(&entry)?;
        let stored = match &entry.feedback {
            Some(existing) => BidFeedback {
                id: existing.id,
                created_at: existing.created_at,
                ..feedback.clone()
            },
            None => feedback.clone(),
        };
        entry.feedback = Some(stored.clone());
        Ok(stored)
    }

    async fn list_feedback(
        &self,
        authors: &[AuthorRef],
        page: Page,
    ) -> StoreResult<Vec<BidFeedback>> {
        let mut feedback = Vec::new();
        for entry in self.all_bid_entries()? {
            let entry = lock(&entry)?;
            if !authors.contains(&entry.versions.live.author()) {
                continue;
            }
            if let Some(f) = &entry.feedback {
                feedback.push(f.clone());
            }
        }
        feedback.sort_by(|a, b| newest_first((a.created_at, a.id), (b.created_at, b.id)));
        Ok(page.apply(feedback))
    }
}
