use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use roost_db::is_unique_violation;
use roost_db::models::UserRow;
use roost_types::api::{
    Claims, PremiumRequest, SignInRequest, SignInResponse, SignUpRequest, UpdateUserRequest,
};
use roost_types::models::User;

use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use crate::validate;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".into())
}

fn username_taken() -> ApiError {
    ApiError::Conflict("Username already exists".into())
}

pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();
    Ok(hash)
}

pub(crate) fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

// -- Account service --

pub async fn sign_up(state: &AppState, req: SignUpRequest) -> Result<User, ApiError> {
    validate::username(&req.username)?;
    validate::email(&req.email)?;
    validate::password(&req.password)?;

    let row = UserRow {
        id: Uuid::new_v4().to_string(),
        username: req.username,
        email: req.email.trim().to_string(),
        password: hash_password(&req.password)?,
        photo: req.photo,
        premium: false,
        created_at: String::new(),
    };

    let stored = state
        .with_db(move |db| {
            db.create_user(&row).map_err(|e| {
                if is_unique_violation(&e) {
                    username_taken()
                } else {
                    e.into()
                }
            })
        })
        .await?;

    info!(user_id = %stored.id, username = %stored.username, "user signed up");
    Ok(convert::user(stored))
}

/// Unknown usernames and wrong passwords produce the same error.
pub async fn sign_in(state: &AppState, req: SignInRequest) -> Result<SignInResponse, ApiError> {
    let username = req.username.clone();
    let user = state
        .with_db(move |db| Ok(db.get_user_by_username(&username)?))
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}': {}", user.id, e)))?;

    let access_token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok(SignInResponse {
        access_token,
        user_id,
    })
}

pub async fn find_one(state: &AppState, id: Uuid) -> Result<User, ApiError> {
    state
        .with_db(move |db| Ok(db.get_user_by_id(&id.to_string())?))
        .await?
        .map(convert::user)
        .ok_or_else(user_not_found)
}

pub async fn find_all(state: &AppState) -> Result<Vec<User>, ApiError> {
    let rows = state.with_db(|db| Ok(db.list_users()?)).await?;
    Ok(rows.into_iter().map(convert::user).collect())
}

pub async fn find_all_premium_users(state: &AppState) -> Result<Vec<User>, ApiError> {
    let rows = state.with_db(|db| Ok(db.list_premium_users()?)).await?;
    Ok(rows.into_iter().map(convert::user).collect())
}

pub async fn update(state: &AppState, id: Uuid, req: UpdateUserRequest) -> Result<User, ApiError> {
    if let Some(username) = &req.username {
        validate::username(username)?;
    }
    if let Some(email) = &req.email {
        validate::email(email)?;
    }
    let new_hash = match &req.password {
        Some(password) => {
            validate::password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    state
        .with_db(move |db| {
            let mut row = db.get_user_by_id(&id.to_string())?.ok_or_else(user_not_found)?;

            if let Some(username) = req.username {
                row.username = username;
            }
            if let Some(email) = req.email {
                row.email = email.trim().to_string();
            }
            if let Some(hash) = new_hash {
                row.password = hash;
            }
            if let Some(photo) = req.photo {
                row.photo = photo;
            }

            match db.update_user(&row) {
                Ok(true) => Ok(convert::user(row)),
                Ok(false) => Err(user_not_found()),
                Err(e) if is_unique_violation(&e) => Err(username_taken()),
                Err(e) => Err(e.into()),
            }
        })
        .await
}

pub async fn remove(state: &AppState, id: Uuid) -> Result<(), ApiError> {
    let deleted = state
        .with_db(move |db| Ok(db.delete_user(&id.to_string())?))
        .await?;
    if !deleted {
        return Err(user_not_found());
    }
    info!(user_id = %id, "user removed");
    Ok(())
}

pub async fn update_premium_status(state: &AppState, id: Uuid, premium: bool) -> Result<User, ApiError> {
    state
        .with_db(move |db| {
            if !db.set_premium(&id.to_string(), premium)? {
                return Err(user_not_found());
            }
            db.get_user_by_id(&id.to_string())?
                .map(convert::user)
                .ok_or_else(user_not_found)
        })
        .await
}

/// Profile mutations are self-service only.
fn ensure_self(claims: &Claims, id: Uuid) -> Result<(), ApiError> {
    if claims.sub != id {
        return Err(ApiError::Forbidden("You can only modify your own account".into()));
    }
    Ok(())
}

// -- Handlers --

pub async fn post_signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = sign_up(&state, req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn post_signin(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(sign_in(&state, req).await?))
}

pub async fn get_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(find_all(&state).await?))
}

pub async fn get_premium_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(find_all_premium_users(&state).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(find_one(&state, id).await?))
}

pub async fn patch_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self(&claims, id)?;
    Ok(Json(update(&state, id, req).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self(&claims, id)?;
    remove(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn patch_premium(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<PremiumRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self(&claims, id)?;
    Ok(Json(update_premium_status(&state, id, req.premium).await?))
}
