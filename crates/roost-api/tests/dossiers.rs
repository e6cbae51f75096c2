mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn rejects_bad_and_unreachable_urls() {
    let app = TestApp::new().await;
    let (_, tenant) = app.register("tenant").await;
    let (landlord, _) = app.register("landlord").await;

    let (status, body) = app
        .json("POST", "/dossiers", Some(&tenant), json!({ "url": "not a url", "owners": [landlord] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid URL");

    let (status, body) = app
        .json(
            "POST",
            "/dossiers",
            Some(&tenant),
            json!({ "url": "https://files.example.com/d.pdf", "owners": [landlord] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "URL is not reachable");

    let (status, _) = app
        .json("POST", "/dossiers", Some(&tenant), json!({ "owners": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn owners_validate_only_their_entry() {
    let app = TestApp::new().await;
    let (tenant_id, tenant) = app.register("tenant").await;
    let (first_id, first) = app.register("first").await;
    let (second_id, second) = app.register("second").await;
    let (_, stranger) = app.register("stranger").await;
    let item = app.publish(&first, 700.0).await;

    let (status, dossier) = app
        .json(
            "POST",
            "/dossiers",
            Some(&tenant),
            json!({
                "url": "https://docs.ok/tenant.pdf",
                "itemId": item,
                "owners": [first_id, second_id, first_id],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{dossier}");
    assert_eq!(dossier["userId"], tenant_id.as_str());
    assert_eq!(dossier["url"], "https://docs.ok/tenant.pdf");
    assert_eq!(
        dossier["owners"],
        json!([
            { "ownerId": first_id, "isValidated": false },
            { "ownerId": second_id, "isValidated": false },
        ])
    );
    let id = dossier["id"].as_str().unwrap();

    let (status, _) = app.get(&format!("/dossiers/{}", id), Some(&stranger)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get(&format!("/dossiers/{}", id), Some(&second)).await;
    assert_eq!(status, StatusCode::OK);

    let validate = format!("/dossiers/{}/validate", id);
    let (status, _) = app.bare("PATCH", &validate, Some(&stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.bare("PATCH", &validate, Some(&tenant)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = app.bare("PATCH", &validate, Some(&second)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["owners"][0]["isValidated"], false);
    assert_eq!(updated["owners"][1]["isValidated"], true);

    let missing = format!("/dossiers/{}/validate", uuid::Uuid::new_v4());
    let (status, _) = app.bare("PATCH", &missing, Some(&second)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lists_by_submitter_and_by_owner() {
    let app = TestApp::new().await;
    let (_, tenant) = app.register("tenant").await;
    let (landlord_id, landlord) = app.register("landlord").await;
    let (_, other) = app.register("other").await;

    let (status, _) = app
        .json("POST", "/dossiers", Some(&tenant), json!({ "owners": [landlord_id] }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, mine) = app.get("/dossiers/user/me", Some(&tenant)).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (_, owned) = app.get("/dossiers/owner/me", Some(&landlord)).await;
    assert_eq!(owned.as_array().unwrap().len(), 1);
    let (_, none) = app.get("/dossiers/owner/me", Some(&other)).await;
    assert!(none.as_array().unwrap().is_empty());

    let (status, _) = app.get("/dossiers/user/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
