use axum::http::StatusCode;
use serde_json::json;

mod support;
use support::{TestApp, error_fields, luna_the_cat, max_the_lab};

#[tokio::test]
async fn create_then_fetch_returns_payload_with_defaults() {
    let app = TestApp::new();
    let (status, created) = app.post("/api/pets", max_the_lab()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "available");
    assert!(created["id"].is_string());

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = app.get(&format!("/api/pets/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
    for (field, expected) in max_the_lab().as_object().unwrap() {
        assert_eq!(&fetched[field], expected, "field {field}");
    }
}

#[tokio::test]
async fn client_cannot_set_status() {
    let app = TestApp::new();
    let mut body = max_the_lab();
    body["status"] = json!("adopted");
    body["ownerNote"] = json!("not a column");
    let (status, created) = app.post("/api/pets", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "available");
    assert!(created.get("ownerNote").is_none());

    let id = created["id"].as_str().unwrap();
    let (status, updated) = app
        .put(&format!("/api/pets/{id}"), json!({ "status": "adopted", "age": 3 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "available");
    assert_eq!(updated["age"], 3);
}

#[tokio::test]
async fn create_reports_every_violation_and_writes_nothing() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/pets",
            json!({ "name": "  ", "species": "bird", "age": -1, "size": "medium" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = error_fields(&body);
    for field in ["name", "species", "breed", "age", "description"] {
        assert!(fields.contains(&field.to_string()), "missing {field} in {fields:?}");
    }
    assert!(!fields.contains(&"size".to_string()));
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn strings_are_trimmed_and_extras_validated() {
    let app = TestApp::new();
    let mut body = max_the_lab();
    body["name"] = json!("  Max  ");
    body["images"] = json!(["https://cdn.example.org/max.jpg"]);
    body["ageMonths"] = json!(6);
    body["medicalHistory"] = json!("vaccinated ");
    let (status, created) = app.post("/api/pets", body).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["name"], "Max");
    assert_eq!(created["medicalHistory"], "vaccinated");
    assert_eq!(created["ageMonths"], 6);

    let mut bad = max_the_lab();
    bad["images"] = json!(["ftp://example.org/max.jpg"]);
    bad["ageMonths"] = json!(12);
    let (status, body) = app.post("/api/pets", bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["ageMonths", "images"]);
}

#[tokio::test]
async fn whole_float_age_is_accepted() {
    let app = TestApp::new();
    let mut body = max_the_lab();
    body["age"] = json!(2.0);
    let (status, created) = app.post("/api/pets", body).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["age"], 2);

    let mut bad = max_the_lab();
    bad["age"] = json!(2.5);
    let (status, body) = app.post("/api/pets", bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["age"]);
}

#[tokio::test]
async fn list_applies_equality_filters() {
    let app = TestApp::new();
    app.create_pet(max_the_lab()).await;
    app.create_pet(luna_the_cat()).await;

    let (status, all) = app.get("/api/pets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, cats) = app.get("/api/pets?species=cat").await;
    let cats = cats.as_array().unwrap();
    assert_eq!(cats.len(), 1);
    assert_eq!(cats[0]["name"], "Luna");

    let (_, two_year_olds) = app.get("/api/pets?age=2&size=medium").await;
    assert_eq!(two_year_olds.as_array().unwrap().len(), 1);

    let (_, empty_filter) = app.get("/api/pets?species=").await;
    assert_eq!(empty_filter.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_filter_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/pets?status=sold").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["status"]);

    let (status, _) = app.get("/api/pets?age=two").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn available_listing_excludes_reserved_pets() {
    let app = TestApp::new();
    let reserved = app.create_pet(max_the_lab()).await;
    app.create_pet(luna_the_cat()).await;
    app.create_application(&reserved, "u1").await;

    let (_, available) = app.get("/api/pets?status=available").await;
    let available = available.as_array().unwrap();
    assert_eq!(available.len(), 1);
    assert!(available.iter().all(|pet| pet["status"] == "available"));
    assert_eq!(available[0]["name"], "Luna");
}

#[tokio::test]
async fn missing_pet_is_404() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/pets/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Pet not found");

    let (status, _) = app
        .put("/api/pets/does-not-exist", json!({ "age": 4 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_validates_present_fields_only() {
    let app = TestApp::new();
    let id = app.create_pet(max_the_lab()).await;

    let (status, body) = app
        .put(&format!("/api/pets/{id}"), json!({ "size": "huge" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&body), vec!["size"]);

    let (status, unchanged) = app.put(&format!("/api/pets/{id}"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["name"], "Max");
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/pets")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_failure_is_500_with_message() {
    let app = TestApp::new();
    app.store.set_unavailable(true);
    let (status, body) = app.get("/api/pets").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "store unavailable");
    assert_eq!(body["code"], "store_failure");
    assert!(body.get("errors").is_none());
}
