mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn signup_never_returns_password() {
    let app = TestApp::new().await;
    let (status, created) = app
        .json(
            "POST",
            "/auth/signup",
            None,
            json!({ "username": "alice", "email": "alice@example.com", "password": "correct horse" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.get("password").is_none());
    assert_eq!(created["premium"], false);

    let id = created["id"].as_str().unwrap();
    let (status, one) = app.get(&format!("/auth/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(one.get("password").is_none());
    assert_eq!(one["username"], "alice");

    let (_, all) = app.get("/auth", None).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].get("password").is_none());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (status, body) = app
        .json(
            "POST",
            "/auth/signup",
            None,
            json!({ "username": "alice", "email": "other@example.com", "password": "another pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["statusCode"], 409);
}

#[tokio::test]
async fn bad_credentials_look_identical() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (wrong_status, wrong_body) = app
        .json("POST", "/auth/signin", None, json!({ "username": "alice", "password": "wrong pass" }))
        .await;
    let (unknown_status, unknown_body) = app
        .json("POST", "/auth/signin", None, json!({ "username": "nobody", "password": "wrong pass" }))
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["message"], "Invalid credentials");
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn invalid_signup_is_rejected() {
    let app = TestApp::new().await;
    let (status, _) = app
        .json(
            "POST",
            "/auth/signup",
            None,
            json!({ "username": "bob", "email": "not-an-email", "password": "correct horse" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_rehashes_password() {
    let app = TestApp::new().await;
    let (id, token) = app.register("alice").await;

    let (status, updated) = app
        .json(
            "PATCH",
            &format!("/auth/{}", id),
            Some(&token),
            json!({ "password": "brand new secret", "email": "alice@new.example" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["email"], "alice@new.example");

    let (old, _) = app
        .json("POST", "/auth/signin", None, json!({ "username": "alice", "password": "correct horse" }))
        .await;
    assert_eq!(old, StatusCode::UNAUTHORIZED);

    let (new, _) = app
        .json("POST", "/auth/signin", None, json!({ "username": "alice", "password": "brand new secret" }))
        .await;
    assert_eq!(new, StatusCode::OK);
}

#[tokio::test]
async fn profile_mutations_are_self_service() {
    let app = TestApp::new().await;
    let (alice, _) = app.register("alice").await;
    let (_, bob_token) = app.register("bob").await;

    let (status, _) = app
        .json("PATCH", &format!("/auth/{}", alice), Some(&bob_token), json!({ "email": "x@example.com" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.bare("DELETE", &format!("/auth/{}", alice), Some(&bob_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.bare("DELETE", &format!("/auth/{}", alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn premium_toggle_and_listing() {
    let app = TestApp::new().await;
    let (alice, token) = app.register("alice").await;
    app.register("bob").await;

    let (status, user) = app
        .json("PATCH", &format!("/auth/{}/premium", alice), Some(&token), json!({ "premium": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["premium"], true);

    let (_, premium) = app.get("/auth/premium", None).await;
    let premium = premium.as_array().unwrap();
    assert_eq!(premium.len(), 1);
    assert_eq!(premium[0]["id"], alice.as_str());
}

#[tokio::test]
async fn remove_then_not_found() {
    let app = TestApp::new().await;
    let (id, token) = app.register("alice").await;

    let (status, _) = app.bare("DELETE", &format!("/auth/{}", id), Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&format!("/auth/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, _) = app.bare("DELETE", &format!("/auth/{}", id), Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_input_gets_json_error_body() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json("POST", "/auth/signup", None, json!({ "username": "carol" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["error"], "Validation Error");
    assert!(body["message"].as_str().unwrap().contains("email"));

    let (status, body) = app.get("/auth/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
}
