//! Integration tests for `PgStore` against a real database.
//!
//! Need `DATABASE_URL` pointing at a Postgres server; each test gets its own
//! database from `#[sqlx::test]`.
//! Exercises:
//! - content replacement snapshots the previous version in one transaction
//! - compare-and-swap rejects stale revisions, including two concurrent writers
//! - bid insertion checks the parent tender status
//! - decisions and feedback upserts
//! - listing order (ties broken by id) and filters

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tenders_core::bid::{
    AuthorRef, AuthorType, Bid, BidDecisionRecord, BidFeedback, BidStatus, Decision,
};
use tenders_core::directory::{Employee, Organization, OrganizationType};
use tenders_core::pagination::Page;
use tenders_core::store::{BidFilter, EntityStore, Revision, StoreError, TenderFilter};
use tenders_core::tender::{ServiceType, Tender, TenderContent, TenderStatus};
use tenders_core::types::{new_id, DbId};
use tenders_db::repositories::DirectoryRepo;
use tenders_db::PgStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_owner(pool: &PgPool, username: &str) -> (DbId, DbId) {
    let employee = Employee {
        id: new_id(),
        username: username.to_string(),
        first_name: None,
        last_name: None,
        created_at: Utc::now(),
    };
    let organization = Organization {
        id: new_id(),
        name: format!("{username} corp"),
        description: None,
        organization_type: OrganizationType::Llc,
        created_at: Utc::now(),
    };
    DirectoryRepo::create_employee(pool, &employee).await.unwrap();
    DirectoryRepo::create_organization(pool, &organization)
        .await
        .unwrap();
    DirectoryRepo::assign_responsible(pool, organization.id, employee.id)
        .await
        .unwrap();
    (employee.id, organization.id)
}

fn new_tender(organization_id: DbId, name: &str, status: TenderStatus) -> Tender {
    Tender {
        id: new_id(),
        organization_id,
        name: name.to_string(),
        description: "desc".to_string(),
        service_type: ServiceType::Delivery,
        status,
        version: 1,
        created_at: Utc::now(),
    }
}

fn new_bid(tender_id: DbId, author_id: DbId) -> Bid {
    Bid {
        id: new_id(),
        tender_id,
        author_type: AuthorType::User,
        author_id,
        name: "Offer".to_string(),
        description: "desc".to_string(),
        status: BidStatus::Published,
        version: 1,
        created_at: Utc::now(),
    }
}

fn page() -> Page {
    Page {
        limit: 50,
        offset: 0,
    }
}

// ---------------------------------------------------------------------------
// Test: content replacement and snapshots
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_replace_content_snapshots_previous(pool: PgPool) {
    let (_employee, org) = seed_owner(&pool, "alice").await;
    let store = PgStore::new(pool);
    let tender = new_tender(org, "Road repair", TenderStatus::Created);
    store.insert_tender(&tender).await.unwrap();

    let content = TenderContent {
        name: "Bridge repair".to_string(),
        ..tender.content()
    };
    let updated = store
        .replace_tender_content(tender.id, Revision::new(1, TenderStatus::Created), &content)
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.name, "Bridge repair");

    let snapshots = store.tender_snapshots(tender.id).await.unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].version, 1);
    assert_eq!(snapshots[0].content.name, "Road repair");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_stale_revision_conflicts(pool: PgPool) {
    let (_employee, org) = seed_owner(&pool, "alice").await;
    let store = PgStore::new(pool);
    let tender = new_tender(org, "Road repair", TenderStatus::Created);
    store.insert_tender(&tender).await.unwrap();
    let stale = Revision::new(1, TenderStatus::Created);

    store
        .set_tender_status(tender.id, stale, TenderStatus::Published)
        .await
        .unwrap();
    let result = store
        .replace_tender_content(tender.id, stale, &tender.content())
        .await;
    assert_matches!(result, Err(StoreError::Conflict(_)));

    let live = store.get_tender(tender.id).await.unwrap().unwrap();
    assert_eq!(live.version, 1);
    assert_eq!(live.status, TenderStatus::Published);
    assert!(store.tender_snapshots(tender.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_missing_tender_write(pool: PgPool) {
    let store = PgStore::new(pool);
    let result = store
        .set_tender_status(
            new_id(),
            Revision::new(1, TenderStatus::Created),
            TenderStatus::Closed,
        )
        .await;
    assert_matches!(result, Err(StoreError::Missing { entity: "Tender", .. }));
}

// ---------------------------------------------------------------------------
// Test: bids, decisions, feedback
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_insert_bid_checks_tender_status(pool: PgPool) {
    let (employee, org) = seed_owner(&pool, "alice").await;
    let store = PgStore::new(pool);
    let tender = new_tender(org, "Road repair", TenderStatus::Created);
    store.insert_tender(&tender).await.unwrap();

    let bid = new_bid(tender.id, employee);
    let result = store.insert_bid(&bid, TenderStatus::Published).await;
    assert_matches!(result, Err(StoreError::Conflict(_)));
    assert!(store.get_bid(bid.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_record_decision_and_feedback(pool: PgPool) {
    let (employee, org) = seed_owner(&pool, "alice").await;
    let store = PgStore::new(pool);
    let tender = new_tender(org, "Road repair", TenderStatus::Published);
    store.insert_tender(&tender).await.unwrap();
    let bid = new_bid(tender.id, employee);
    store
        .insert_bid(&bid, TenderStatus::Published)
        .await
        .unwrap();

    let record = BidDecisionRecord {
        bid_id: bid.id,
        decision: Decision::Rejected,
        decided_by: employee,
        decided_at: Utc::now(),
    };
    let decided = store
        .record_decision(
            &record,
            Revision::new(1, BidStatus::Published),
            TenderStatus::Published,
        )
        .await
        .unwrap();
    assert_eq!(decided.status, BidStatus::Rejected);
    assert_eq!(decided.version, 1);
    let stored = store.get_decision(bid.id).await.unwrap().unwrap();
    assert_eq!(stored.decision, Decision::Rejected);

    let now = Utc::now();
    let first = BidFeedback {
        id: new_id(),
        bid_id: bid.id,
        reviewer_id: employee,
        description: "Too slow".to_string(),
        created_at: now,
        updated_at: now,
    };
    let first = store.upsert_feedback(&first).await.unwrap();
    let second = BidFeedback {
        id: new_id(),
        description: "Much better".to_string(),
        updated_at: now + Duration::seconds(1),
        ..first.clone()
    };
    let second = store.upsert_feedback(&second).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.description, "Much better");

    let listed = store
        .list_feedback(&[AuthorRef::user(employee)], page())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_list_order_and_filters(pool: PgPool) {
    let (employee, org) = seed_owner(&pool, "alice").await;
    let (_other_employee, other_org) = seed_owner(&pool, "bob").await;
    let store = PgStore::new(pool);

    let base = Utc::now();
    for (i, owner) in [org, org, other_org].into_iter().enumerate() {
        let mut tender = new_tender(owner, &format!("T{i}"), TenderStatus::Published);
        tender.created_at = base + Duration::seconds(i as i64);
        store.insert_tender(&tender).await.unwrap();
    }

    let all = store
        .list_tenders(&TenderFilter::default(), page())
        .await
        .unwrap();
    let names: Vec<_> = all.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["T2", "T1", "T0"]);

    let mine = store
        .list_tenders(
            &TenderFilter {
                organization_ids: Some(vec![org]),
                service_types: vec![ServiceType::Delivery],
            },
            page(),
        )
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);

    let bid = new_bid(all[0].id, employee);
    store
        .insert_bid(&bid, TenderStatus::Published)
        .await
        .unwrap();
    let filter = BidFilter {
        tender_id: Some(all[0].id),
        authors: Some(vec![AuthorRef::user(employee)]),
        statuses: Some(vec![BidStatus::Published]),
    };
    assert_eq!(store.list_bids(&filter, page()).await.unwrap().len(), 1);

    let nobody = BidFilter {
        authors: Some(vec![]),
        ..filter
    };
    assert!(store.list_bids(&nobody, page()).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_equal_timestamps_ordered_by_id(pool: PgPool) {
    let (employee, org) = seed_owner(&pool, "alice").await;
    let store = PgStore::new(pool);
    let created_at = Utc::now();

    let mut tender_ids = Vec::new();
    for i in 0..4 {
        let mut tender = new_tender(org, &format!("T{i}"), TenderStatus::Published);
        tender.created_at = created_at;
        store.insert_tender(&tender).await.unwrap();
        tender_ids.push(tender.id);
    }
    tender_ids.sort();
    let listed: Vec<DbId> = store
        .list_tenders(&TenderFilter::default(), page())
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(listed, tender_ids);

    let mut bid_ids = Vec::new();
    for _ in 0..4 {
        let mut bid = new_bid(tender_ids[0], employee);
        bid.created_at = created_at;
        bid_ids.push(bid.id);
        store
            .insert_bid(&bid, TenderStatus::Published)
            .await
            .unwrap();
    }
    bid_ids.sort();
    let filter = BidFilter {
        tender_id: Some(tender_ids[0]),
        ..Default::default()
    };
    let listed: Vec<DbId> = store
        .list_bids(&filter, page())
        .await
        .unwrap()
        .iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(listed, bid_ids);
}

// ---------------------------------------------------------------------------
// Test: concurrent writers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_writes_from_same_revision(pool: PgPool) {
    let (_employee, org) = seed_owner(&pool, "alice").await;
    let store = PgStore::new(pool);
    let tender = new_tender(org, "Road repair", TenderStatus::Created);
    store.insert_tender(&tender).await.unwrap();
    let read_at = Revision::new(1, TenderStatus::Created);

    let write = |name: &str| {
        let store = store.clone();
        let content = TenderContent {
            name: name.to_string(),
            ..tender.content()
        };
        let id = tender.id;
        tokio::spawn(async move { store.replace_tender_content(id, read_at, &content).await })
    };
    let a = write("From A");
    let b = write("From B");
    let results = [a.await.unwrap(), b.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::Conflict(_))))
            .count(),
        1
    );

    let live = store.get_tender(tender.id).await.unwrap().unwrap();
    assert_eq!(live.version, 2);
    let snapshots = store.tender_snapshots(tender.id).await.unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].version, 1);
    assert_eq!(snapshots[0].content.name, "Road repair");
}
