mod common;

use assert_matches::assert_matches;

use common::Fixture;
use tenders_core::bid::{AuthorType, BidStatus, CreateBid, Decision};
use tenders_core::store::EntityStore;
use tenders_core::tender::{TenderPatch, TenderStatus};
use tenders_core::CoreError;

// ---------------------------------------------------------------------------
// Test: tender status graph
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tender_created_published_closed() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    let tender = fx.tender(org, "alice", "Road repair").await;

    let published = fx
        .service
        .update_tender_status(tender.id, "alice", TenderStatus::Published)
        .await
        .unwrap();
    assert_eq!(published.status, TenderStatus::Published);
    assert_eq!(published.version, 1);

    let closed = fx
        .service
        .update_tender_status(tender.id, "alice", TenderStatus::Closed)
        .await
        .unwrap();
    assert_eq!(closed.status, TenderStatus::Closed);
    assert_eq!(closed.version, 1);

    let reopened = fx
        .service
        .update_tender_status(tender.id, "alice", TenderStatus::Published)
        .await;
    assert_matches!(reopened, Err(CoreError::InvalidTransition { entity: "Tender", .. }));
    assert_eq!(
        fx.service.get_tender_status(tender.id).await.unwrap(),
        TenderStatus::Closed
    );
}

#[tokio::test]
async fn requesting_current_status_is_invalid_transition() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    let tender = fx.tender(org, "alice", "Road repair").await;

    let result = fx
        .service
        .update_tender_status(tender.id, "alice", TenderStatus::Created)
        .await;
    assert_matches!(result, Err(CoreError::InvalidTransition { .. }));
}

#[tokio::test]
async fn status_change_requires_ownership() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    fx.organization_with("Other", "mallory");
    let tender = fx.tender(org, "alice", "Road repair").await;

    let result = fx
        .service
        .update_tender_status(tender.id, "mallory", TenderStatus::Published)
        .await;
    assert_matches!(result, Err(CoreError::Forbidden(_)));

    let result = fx
        .service
        .update_tender_status(tender.id, "nobody", TenderStatus::Published)
        .await;
    assert_matches!(result, Err(CoreError::Unauthorized(_)));
}

// ---------------------------------------------------------------------------
// Test: bid creation and status graph
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bid_on_unpublished_tender_is_invalid_state() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    let bob = fx.employee("bob");
    let tender = fx.tender(org, "alice", "Road repair").await;

    let result = fx
        .service
        .create_bid(CreateBid {
            name: "Offer".into(),
            description: String::new(),
            tender_id: tender.id,
            author_type: AuthorType::User,
            author_id: bob,
            creator_username: "bob".into(),
        })
        .await;
    assert_matches!(result, Err(CoreError::InvalidState(_)));
}

#[tokio::test]
async fn bid_author_must_match_creator() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    let bidder_org = fx.organization_with("Builders", "bob");
    fx.employee("carol");
    let tender = fx.published_tender(org, "alice", "Road repair").await;

    let as_org = CreateBid {
        name: "Offer".into(),
        description: String::new(),
        tender_id: tender.id,
        author_type: AuthorType::Organization,
        author_id: bidder_org,
        creator_username: "bob".into(),
    };
    let bid = fx.service.create_bid(as_org.clone()).await.unwrap();
    assert_eq!(bid.author_type, AuthorType::Organization);
    assert_eq!(bid.status, BidStatus::Created);
    assert_eq!(bid.version, 1);

    let impostor = CreateBid {
        creator_username: "carol".into(),
        ..as_org
    };
    assert_matches!(
        fx.service.create_bid(impostor).await,
        Err(CoreError::Forbidden(_))
    );
}

#[tokio::test]
async fn bid_status_graph() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    let bob = fx.employee("bob");
    let tender = fx.published_tender(org, "alice", "Road repair").await;
    let bid = fx.user_bid(tender.id, "bob", bob).await;

    assert_matches!(
        fx.service
            .update_bid_status(bid.id, "bob", BidStatus::Canceled)
            .await,
        Err(CoreError::InvalidTransition { entity: "Bid", .. })
    );
    fx.service
        .update_bid_status(bid.id, "bob", BidStatus::Published)
        .await
        .unwrap();
    assert_matches!(
        fx.service
            .update_bid_status(bid.id, "bob", BidStatus::Approved)
            .await,
        Err(CoreError::InvalidTransition { .. })
    );
    let canceled = fx
        .service
        .update_bid_status(bid.id, "bob", BidStatus::Canceled)
        .await
        .unwrap();
    assert_eq!(canceled.status, BidStatus::Canceled);
    assert_eq!(canceled.version, 1);
}

// ---------------------------------------------------------------------------
// Test: decisions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn decision_on_created_bid_is_invalid_state() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    let bob = fx.employee("bob");
    let tender = fx.published_tender(org, "alice", "Road repair").await;
    let bid = fx.user_bid(tender.id, "bob", bob).await;

    let result = fx
        .service
        .submit_bid_decision(bid.id, Decision::Approved, "alice")
        .await;
    assert_matches!(result, Err(CoreError::InvalidState(_)));
}

#[tokio::test]
async fn owner_approves_published_bid() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    let bob = fx.employee("bob");
    let tender = fx.published_tender(org, "alice", "Road repair").await;
    let bid = fx.user_bid(tender.id, "bob", bob).await;
    fx.service
        .update_bid_status(bid.id, "bob", BidStatus::Published)
        .await
        .unwrap();

    assert_matches!(
        fx.service
            .submit_bid_decision(bid.id, Decision::Approved, "bob")
            .await,
        Err(CoreError::Forbidden(_))
    );

    let approved = fx
        .service
        .submit_bid_decision(bid.id, Decision::Approved, "alice")
        .await
        .unwrap();
    assert_eq!(approved.status, BidStatus::Approved);
    assert_eq!(approved.version, 1);

    let record = fx.store.get_decision(bid.id).await.unwrap().unwrap();
    assert_eq!(record.decision, Decision::Approved);

    // Approved is terminal.
    let patch = tenders_core::bid::BidPatch {
        name: Some("Too late".into()),
        ..Default::default()
    };
    assert_matches!(
        fx.service.edit_bid(bid.id, "bob", &patch, None).await,
        Err(CoreError::InvalidState(_))
    );
}

#[tokio::test]
async fn decision_is_final() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    let bob = fx.employee("bob");
    let tender = fx.published_tender(org, "alice", "Road repair").await;
    let bid = fx.user_bid(tender.id, "bob", bob).await;
    fx.service
        .update_bid_status(bid.id, "bob", BidStatus::Published)
        .await
        .unwrap();
    fx.service
        .submit_bid_decision(bid.id, Decision::Rejected, "alice")
        .await
        .unwrap();

    assert_matches!(
        fx.service
            .submit_bid_decision(bid.id, Decision::Approved, "alice")
            .await,
        Err(CoreError::InvalidState(_))
    );
    assert_eq!(
        fx.service.get_bid_status(bid.id).await.unwrap(),
        BidStatus::Rejected
    );
    let record = fx.store.get_decision(bid.id).await.unwrap().unwrap();
    assert_eq!(record.decision, Decision::Rejected);
}

#[tokio::test]
async fn decision_needs_published_tender() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    let bob = fx.employee("bob");
    let tender = fx.published_tender(org, "alice", "Road repair").await;
    let bid = fx.user_bid(tender.id, "bob", bob).await;
    fx.service
        .update_bid_status(bid.id, "bob", BidStatus::Published)
        .await
        .unwrap();
    fx.service
        .update_tender_status(tender.id, "alice", TenderStatus::Closed)
        .await
        .unwrap();

    let result = fx
        .service
        .submit_bid_decision(bid.id, Decision::Rejected, "alice")
        .await;
    assert_matches!(result, Err(CoreError::InvalidState(_)));
    assert_eq!(
        fx.service.get_bid_status(bid.id).await.unwrap(),
        BidStatus::Published
    );
}

// ---------------------------------------------------------------------------
// Test: feedback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feedback_is_owner_only_and_bounded() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    let bob = fx.employee("bob");
    let tender = fx.published_tender(org, "alice", "Road repair").await;
    let bid = fx.user_bid(tender.id, "bob", bob).await;

    assert_matches!(
        fx.service.submit_bid_feedback(bid.id, "Nice", "bob").await,
        Err(CoreError::Forbidden(_))
    );
    assert_matches!(
        fx.service.submit_bid_feedback(bid.id, "", "alice").await,
        Err(CoreError::Validation(_))
    );
    assert_matches!(
        fx.service
            .submit_bid_feedback(bid.id, &"x".repeat(1001), "alice")
            .await,
        Err(CoreError::Validation(_))
    );

    let returned = fx
        .service
        .submit_bid_feedback(bid.id, "Nice", "alice")
        .await
        .unwrap();
    assert_eq!(returned.id, bid.id);
}

#[tokio::test]
async fn edit_of_unowned_tender_is_forbidden() {
    let fx = Fixture::new();
    let org = fx.organization_with("Acme", "alice");
    fx.employee("bob");
    let tender = fx.tender(org, "alice", "Road repair").await;

    let patch = TenderPatch {
        name: Some("Hijacked".into()),
        ..Default::default()
    };
    assert_matches!(
        fx.service.edit_tender(tender.id, "bob", &patch, None).await,
        Err(CoreError::Forbidden(_))
    );
}
