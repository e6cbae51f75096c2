use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use reqwest::Url;
use tracing::{info, warn};
use uuid::Uuid;

use roost_db::models::{DossierOwnerRow, DossierRow};
use roost_types::api::{Claims, CreateDossierRequest};
use roost_types::models::Dossier;

use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

fn dossier_not_found() -> ApiError {
    ApiError::NotFound("Dossier not found".into())
}

/// Parse a verification link; only absolute http(s) URLs are accepted.
fn parse_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim()).map_err(|_| ApiError::BadRequest("Invalid URL".into()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ApiError::BadRequest("Invalid URL".into())),
    }
}

// -- Dossier service --

pub async fn create(
    state: &AppState,
    req: CreateDossierRequest,
    user_id: Uuid,
) -> Result<Dossier, ApiError> {
    let mut owner_ids: Vec<Uuid> = Vec::with_capacity(req.owners.len());
    for owner in req.owners {
        if !owner_ids.contains(&owner) {
            owner_ids.push(owner);
        }
    }
    if owner_ids.is_empty() {
        return Err(ApiError::Validation("a dossier needs at least one owner".into()));
    }

    let url = match req.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(raw) => {
            let url = parse_url(raw)?;
            if !state.probe.is_reachable(&url).await {
                warn!(%url, "dossier url unreachable");
                return Err(ApiError::BadRequest("URL is not reachable".into()));
            }
            Some(url.to_string())
        }
        None => None,
    };

    let row = DossierRow {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        item_id: req.item_id.map(|i| i.to_string()),
        url,
        owners: owner_ids
            .iter()
            .map(|o| DossierOwnerRow {
                owner_id: o.to_string(),
                is_validated: false,
            })
            .collect(),
        created_at: String::new(),
    };

    let stored = state.with_db(move |db| Ok(db.insert_dossier(&row)?)).await?;
    info!(dossier_id = %stored.id, %user_id, owners = owner_ids.len(), "dossier created");
    Ok(convert::dossier(stored))
}

pub async fn find_one(state: &AppState, id: Uuid) -> Result<Dossier, ApiError> {
    state
        .with_db(move |db| Ok(db.get_dossier(&id.to_string())?))
        .await?
        .map(convert::dossier)
        .ok_or_else(dossier_not_found)
}

pub async fn find_by_user(state: &AppState, user_id: Uuid) -> Result<Vec<Dossier>, ApiError> {
    let rows = state
        .with_db(move |db| Ok(db.list_dossiers_by_user(&user_id.to_string())?))
        .await?;
    Ok(rows.into_iter().map(convert::dossier).collect())
}

pub async fn find_by_owner(state: &AppState, owner_id: Uuid) -> Result<Vec<Dossier>, ApiError> {
    let rows = state
        .with_db(move |db| Ok(db.list_dossiers_by_owner(&owner_id.to_string())?))
        .await?;
    Ok(rows.into_iter().map(convert::dossier).collect())
}

/// Flip `owner_id`'s entry to validated. An unknown dossier and an owner not
/// listed on it are the same not-found outcome.
pub async fn validate_dossier(state: &AppState, id: Uuid, owner_id: Uuid) -> Result<Dossier, ApiError> {
    let dossier = state
        .with_db(move |db| {
            let id = id.to_string();
            if !db.validate_dossier_owner(&id, &owner_id.to_string())? {
                return Err(dossier_not_found());
            }
            db.get_dossier(&id)?.ok_or_else(dossier_not_found)
        })
        .await?;

    info!(dossier_id = %id, %owner_id, "dossier validated by owner");
    Ok(convert::dossier(dossier))
}

// -- Handlers --

pub async fn post_dossier(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateDossierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let dossier = create(&state, req, claims.sub).await?;
    Ok((StatusCode::CREATED, Json(dossier)))
}

/// Readable by the submitter and by listed owners only.
pub async fn get_dossier(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let dossier = find_one(&state, id).await?;
    if !dossier.is_visible_to(claims.sub) {
        return Err(ApiError::Forbidden("You are not allowed to view this dossier".into()));
    }
    Ok(Json(dossier))
}

pub async fn get_my_dossiers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(find_by_user(&state, claims.sub).await?))
}

pub async fn get_owned_dossiers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(find_by_owner(&state, claims.sub).await?))
}

pub async fn patch_validate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(validate_dossier(&state, id, claims.sub).await?))
}
