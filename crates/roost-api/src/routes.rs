use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::uploads::{MAX_IMAGES, MAX_IMAGE_SIZE};
use crate::{auth, contact, dossiers, filter, items};

/// Every API route. Static image serving, CORS and tracing are layered on by
/// the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(auth::post_signup))
        .route("/auth/signin", post(auth::post_signin))
        .route("/auth", get(auth::get_users))
        .route("/auth/premium", get(auth::get_premium_users))
        .route("/auth/{id}", get(auth::get_user))
        .route("/item", get(items::get_items))
        .route("/item/{id}", get(items::get_item))
        .route("/filter", get(filter::get_filter))
        .route("/filter/{dimension}", get(filter::get_filter_dimension))
        .route("/contact", post(contact::post_contact))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/{id}", patch(auth::patch_user).delete(auth::delete_user))
        .route("/auth/{id}/premium", patch(auth::patch_premium))
        .route("/item", post(items::post_item))
        .route("/item/{id}", put(items::put_item).delete(items::delete_item))
        .route("/item/{id}/like", post(items::post_like).delete(items::delete_like))
        .route("/dossiers", post(dossiers::post_dossier))
        .route("/dossiers/user/me", get(dossiers::get_my_dossiers))
        .route("/dossiers/owner/me", get(dossiers::get_owned_dossiers))
        .route("/dossiers/{id}", get(dossiers::get_dossier))
        .route("/dossiers/{id}/validate", patch(dossiers::patch_validate))
        .layer(DefaultBodyLimit::max(MAX_IMAGES * MAX_IMAGE_SIZE + 1024 * 1024))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
