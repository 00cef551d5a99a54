use axum::http::StatusCode;
use serde_json::json;

mod support;
use support::{TestApp, error_fields, luna_the_cat, max_the_lab};

#[tokio::test]
async fn first_put_creates_profile() {
    let app = TestApp::new();
    let (status, _) = app.get("/api/profiles/u1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, profile) = app
        .put(
            "/api/profiles/u1",
            json!({ "email": "sam@example.org", "displayName": " Sam " }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["id"], "u1");
    assert_eq!(profile["displayName"], "Sam");
    assert_eq!(profile["role"], "adopter");
    assert_eq!(profile["favorites"], json!([]));

    let (status, fetched) = app.get("/api/profiles/u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, profile);
}

#[tokio::test]
async fn later_puts_merge() {
    let app = TestApp::new();
    app.put("/api/profiles/u1", json!({ "email": "sam@example.org" }))
        .await;
    let (status, profile) = app
        .put("/api/profiles/u1", json!({ "displayName": "Sam" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "sam@example.org");
    assert_eq!(profile["displayName"], "Sam");
}

#[tokio::test]
async fn shelter_role_needs_shelter_name() {
    let app = TestApp::new();
    let (status, body) = app
        .put("/api/profiles/u1", json!({ "role": "shelter" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["shelterName"]);
    assert_eq!(app.store.write_count(), 0);

    let (status, profile) = app
        .put(
            "/api/profiles/u1",
            json!({ "role": "shelter", "shelterName": "Happy Tails" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["role"], "shelter");
}

#[tokio::test]
async fn invalid_profile_fields_are_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .put(
            "/api/profiles/u1",
            json!({ "email": "nope", "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["email", "role"]);
}

#[tokio::test]
async fn favorites_add_dedupe_and_remove() {
    let app = TestApp::new();
    let max = app.create_pet(max_the_lab()).await;
    let luna = app.create_pet(luna_the_cat()).await;
    app.put("/api/profiles/u1", json!({ "displayName": "Sam" }))
        .await;

    let (status, profile) = app
        .post("/api/profiles/u1/favorites", json!({ "petId": max }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["favorites"], json!([max]));

    app.post("/api/profiles/u1/favorites", json!({ "petId": luna }))
        .await;
    let writes = app.store.write_count();
    let (status, profile) = app
        .post("/api/profiles/u1/favorites", json!({ "petId": max }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["favorites"], json!([max, luna]));
    assert_eq!(app.store.write_count(), writes);

    let (status, profile) = app
        .delete(&format!("/api/profiles/u1/favorites/{max}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["favorites"], json!([luna]));

    let (status, profile) = app.delete("/api/profiles/u1/favorites/never-added").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["favorites"], json!([luna]));
}

#[tokio::test]
async fn favorite_requires_known_pet_and_profile() {
    let app = TestApp::new();
    let max = app.create_pet(max_the_lab()).await;

    let (status, _) = app
        .post("/api/profiles/ghost/favorites", json!({ "petId": max }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.put("/api/profiles/u1", json!({})).await;
    let (status, body) = app
        .post("/api/profiles/u1/favorites", json!({ "petId": "no-such-pet" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["petId"]);

    let (status, body) = app.post("/api/profiles/u1/favorites", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["petId"]);

    let (status, _) = app.delete("/api/profiles/ghost/favorites/anything").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
