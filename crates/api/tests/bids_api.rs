//! HTTP-level tests for bid endpoints: creation, visibility, decisions,
//! feedback and reviews.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{
    body_json, create_tender, create_user_bid, get, patch_json, post_json, published_tender, put,
};

fn id_of(value: &serde_json::Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn bid_on_published_tender_starts_created() {
    let app = common::build_test_app();
    let tender = published_tender(&app).await;
    let bid = create_user_bid(&app, &id_of(&tender), "carol", app.carol).await;

    assert_eq!(bid["status"], "Created");
    assert_eq!(bid["version"], 1);
    assert_eq!(bid["authorType"], "User");
    assert_eq!(bid["authorId"], app.carol.to_string());
}

#[tokio::test]
async fn bid_on_unpublished_tender_is_rejected() {
    let app = common::build_test_app();
    let tender = create_tender(&app, app.acme, "alice", "Draft", "Delivery").await;

    let response = post_json(
        app.app(),
        "/api/bids/new",
        json!({
            "name": "Offer",
            "description": "",
            "tenderId": id_of(&tender),
            "authorType": "User",
            "authorId": app.carol,
            "creatorUsername": "carol",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");
}

#[tokio::test]
async fn bid_author_must_match_creator() {
    let app = common::build_test_app();
    let tender = published_tender(&app).await;
    let body = |author_type: &str, author_id: tenders_core::types::DbId| {
        json!({
            "name": "Offer",
            "description": "",
            "tenderId": id_of(&tender),
            "authorType": author_type,
            "authorId": author_id,
            "creatorUsername": "bob",
        })
    };

    let response = post_json(app.app(), "/api/bids/new", body("User", app.carol)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(app.app(), "/api/bids/new", body("Organization", app.acme)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(app.app(), "/api/bids/new", body("Organization", app.globex)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let bid = body_json(response).await["data"].clone();
    assert_eq!(bid["authorType"], "Organization");
}

#[tokio::test]
async fn owner_sees_only_published_bids() {
    let app = common::build_test_app();
    let tender = published_tender(&app).await;
    let tender_id = id_of(&tender);
    let bid = create_user_bid(&app, &tender_id, "carol", app.carol).await;
    let list_uri = format!("/api/bids/{tender_id}/list?username=alice");

    let response = get(app.app(), &list_uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());

    // The author still sees their own draft.
    let response = get(app.app(), &format!("/api/bids/{tender_id}/list?username=carol")).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = put(
        app.app(),
        &format!("/api/bids/{}/status?status=Published&username=carol", id_of(&bid)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app.app(), &list_uri).await;
    let visible = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["status"], "Published");
}

#[tokio::test]
async fn my_bids_lists_authored_bids() {
    let app = common::build_test_app();
    let tender = published_tender(&app).await;
    create_user_bid(&app, &id_of(&tender), "carol", app.carol).await;
    create_user_bid(&app, &id_of(&tender), "bob", app.bob).await;

    let response = get(app.app(), "/api/bids/my?username=carol").await;
    assert_eq!(response.status(), StatusCode::OK);
    let bids = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0]["authorId"], app.carol.to_string());
}

#[tokio::test]
async fn bid_status_follows_the_lifecycle() {
    let app = common::build_test_app();
    let tender = published_tender(&app).await;
    let bid = create_user_bid(&app, &id_of(&tender), "carol", app.carol).await;
    let id = id_of(&bid);

    let response = put(
        app.app(),
        &format!("/api/bids/{id}/status?status=Canceled&username=carol"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");

    let response = put(
        app.app(),
        &format!("/api/bids/{id}/status?status=Approved&username=carol"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put(
        app.app(),
        &format!("/api/bids/{id}/status?status=Published&username=alice"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(app.app(), &format!("/api/bids/{id}/status")).await;
    assert_eq!(body_json(response).await["data"], "Created");
}

#[tokio::test]
async fn bid_edit_and_rollback() {
    let app = common::build_test_app();
    let tender = published_tender(&app).await;
    let bid = create_user_bid(&app, &id_of(&tender), "carol", app.carol).await;
    let id = id_of(&bid);

    let response = patch_json(
        app.app(),
        &format!("/api/bids/{id}/edit?username=carol"),
        json!({ "description": "Cheaper now" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let edited = body_json(response).await["data"].clone();
    assert_eq!(edited["description"], "Cheaper now");
    assert_eq!(edited["name"], bid["name"]);
    assert_eq!(edited["version"], 2);

    let response = patch_json(
        app.app(),
        &format!("/api/bids/{id}/edit?username=bob"),
        json!({ "description": "Hijacked" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put(app.app(), &format!("/api/bids/{id}/rollback/1?username=carol")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let restored = body_json(response).await["data"].clone();
    assert_eq!(restored["description"], "We can do it");
    assert_eq!(restored["version"], 3);

    let response = get(app.app(), &format!("/api/bids/{id}/versions")).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn tender_owner_decides_published_bids() {
    let app = common::build_test_app();
    let tender = published_tender(&app).await;
    let bid = create_user_bid(&app, &id_of(&tender), "carol", app.carol).await;
    let id = id_of(&bid);

    let response = put(
        app.app(),
        &format!("/api/bids/{id}/submit_decision?decision=Approved&username=alice"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");

    put(
        app.app(),
        &format!("/api/bids/{id}/status?status=Published&username=carol"),
    )
    .await;

    let response = put(
        app.app(),
        &format!("/api/bids/{id}/submit_decision?decision=Approved&username=bob"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put(
        app.app(),
        &format!("/api/bids/{id}/submit_decision?decision=Maybe&username=alice"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = put(
        app.app(),
        &format!("/api/bids/{id}/submit_decision?decision=Approved&username=alice"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "Approved");

    let response = put(
        app.app(),
        &format!("/api/bids/{id}/submit_decision?decision=Rejected&username=alice"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn feedback_shows_up_in_reviews() {
    let app = common::build_test_app();
    let tender = published_tender(&app).await;
    let tender_id = id_of(&tender);
    let bid = create_user_bid(&app, &tender_id, "carol", app.carol).await;
    let id = id_of(&bid);

    let response = put(
        app.app(),
        &format!("/api/bids/{id}/feedback?bidFeedback=Too%20expensive&username=carol"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put(
        app.app(),
        &format!("/api/bids/{id}/feedback?bidFeedback=Too%20expensive&username=alice"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], id);

    let response = get(
        app.app(),
        &format!("/api/bids/{tender_id}/reviews?authorUsername=carol&requesterUsername=alice"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let reviews = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["description"], "Too expensive");
    assert_eq!(reviews[0]["bidId"], id);
}

#[tokio::test]
async fn reviews_require_owner_and_known_author() {
    let app = common::build_test_app();
    let tender = published_tender(&app).await;
    let tender_id = id_of(&tender);
    create_user_bid(&app, &tender_id, "carol", app.carol).await;

    let response = get(
        app.app(),
        &format!("/api/bids/{tender_id}/reviews?authorUsername=carol&requesterUsername=bob"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(
        app.app(),
        &format!("/api/bids/{tender_id}/reviews?authorUsername=nobody&requesterUsername=alice"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(
        app.app(),
        &format!("/api/bids/{tender_id}/reviews?authorUsername=bob&requesterUsername=alice"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_feedback_is_rejected() {
    let app = common::build_test_app();
    let tender = published_tender(&app).await;
    let bid = create_user_bid(&app, &id_of(&tender), "carol", app.carol).await;

    let response = put(
        app.app(),
        &format!("/api/bids/{}/feedback?username=alice", id_of(&bid)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}
