use axum::http::StatusCode;
use serde_json::json;

mod support;
use support::{TestApp, error_fields, happy_tails, luna_the_cat, max_the_lab};

#[tokio::test]
async fn create_nests_contact_details() {
    let app = TestApp::new();
    let (status, shelter) = app.post("/api/shelters", happy_tails()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(shelter["name"], "Happy Tails");
    assert_eq!(
        shelter["contact"],
        json!({ "email": "hello@happytails.org", "phone": "555-0100" })
    );
    assert!(shelter.get("email").is_none());
    assert!(shelter["id"].is_string());
}

#[tokio::test]
async fn create_validates_email_and_rating() {
    let app = TestApp::new();

    let mut bad_email = happy_tails();
    bad_email["email"] = json!("not-an-email");
    let (status, body) = app.post("/api/shelters", bad_email).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["email"]);

    let mut bad_rating = happy_tails();
    bad_rating["rating"] = json!(5.5);
    let (status, body) = app.post("/api/shelters", bad_rating).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["rating"]);

    let (status, body) = app.post("/api/shelters", json!({ "name": "Solo" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_fields(&body),
        vec!["location", "email", "phone", "description"]
    );

    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn detail_includes_owned_pets() {
    let app = TestApp::new();
    let (_, shelter) = app.post("/api/shelters", happy_tails()).await;
    let shelter_id = shelter["id"].as_str().unwrap();

    let mut owned = max_the_lab();
    owned["shelterId"] = json!(shelter_id);
    app.create_pet(owned).await;
    app.create_pet(luna_the_cat()).await;

    let (status, detail) = app.get(&format!("/api/shelters/{shelter_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Happy Tails");
    let pets = detail["pets"].as_array().unwrap();
    assert_eq!(pets.len(), 1);
    assert_eq!(pets[0]["name"], "Max");
}

#[tokio::test]
async fn list_returns_every_shelter() {
    let app = TestApp::new();
    let (_, empty) = app.get("/api/shelters").await;
    assert_eq!(empty, json!([]));

    app.post("/api/shelters", happy_tails()).await;
    let mut second = happy_tails();
    second["name"] = json!("Whisker Haven");
    app.post("/api/shelters", second).await;

    let (status, all) = app.get("/api/shelters").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_changes_contact_fields() {
    let app = TestApp::new();
    let (_, shelter) = app.post("/api/shelters", happy_tails()).await;
    let id = shelter["id"].as_str().unwrap();

    let (status, updated) = app
        .put(
            &format!("/api/shelters/{id}"),
            json!({ "phone": "555-0199", "rating": 4.5 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["contact"]["phone"], "555-0199");
    assert_eq!(updated["contact"]["email"], "hello@happytails.org");
    assert_eq!(updated["rating"], 4.5);

    let (status, body) = app
        .put(&format!("/api/shelters/{id}"), json!({ "email": "x@" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["email"]);
}

#[tokio::test]
async fn unknown_shelter_is_404() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/shelters/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Shelter not found");

    let (status, _) = app
        .put("/api/shelters/missing", json!({ "name": "New name" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
