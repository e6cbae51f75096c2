use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use roost_db::models::ItemRow;
use roost_types::api::{Claims, CreateItemRequest, ItemQuery, UpdateItemRequest};
use roost_types::models::{Coordinates, Listing};

use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::geocode;
use crate::state::AppState;
use crate::uploads::{self, ItemForm};
use crate::validate;

fn item_not_found() -> ApiError {
    ApiError::NotFound("Item not found".into())
}

fn not_item_owner() -> ApiError {
    ApiError::Forbidden("You are not the owner of this item".into())
}

fn validate_create(req: &CreateItemRequest) -> Result<(), ApiError> {
    validate::price(req.price)?;
    validate::text("address", &req.address, 300)?;
    validate::text("city", &req.city, 120)?;
    validate::text("country", &req.country, 120)?;
    validate::non_negative("rooms", req.rooms)?;
    validate::non_negative("bedrooms", req.bedrooms)?;
    validate::non_negative("area", req.area)?;
    validate::non_negative("annexArea", req.annex_area)?;
    Ok(())
}

fn validate_update(req: &UpdateItemRequest) -> Result<(), ApiError> {
    if let Some(price) = req.price {
        validate::price(price)?;
    }
    if let Some(address) = &req.address {
        validate::text("address", address, 300)?;
    }
    if let Some(city) = &req.city {
        validate::text("city", city, 120)?;
    }
    if let Some(country) = &req.country {
        validate::text("country", country, 120)?;
    }
    validate::non_negative("rooms", req.rooms.flatten())?;
    validate::non_negative("bedrooms", req.bedrooms.flatten())?;
    validate::non_negative("area", req.area.flatten())?;
    validate::non_negative("annexArea", req.annex_area.flatten())?;
    Ok(())
}

/// Merge a partial update onto a stored row. Outer `None` keeps the value.
fn apply_update(row: &mut ItemRow, req: UpdateItemRequest) {
    fn set<T>(slot: &mut T, value: Option<T>) {
        if let Some(v) = value {
            *slot = v;
        }
    }

    set(&mut row.name, req.name);
    set(&mut row.title, req.title);
    set(&mut row.description, req.description);
    set(&mut row.price, req.price);
    set(&mut row.address, req.address);
    set(&mut row.city, req.city);
    set(&mut row.country, req.country);
    set(&mut row.rooms, req.rooms);
    set(&mut row.bedrooms, req.bedrooms);
    set(&mut row.area, req.area);
    set(&mut row.floor, req.floor);
    set(&mut row.annex_area, req.annex_area);
    set(
        &mut row.type_of_housing,
        req.type_of_housing.map(|t| t.map(|t| t.as_str().to_string())),
    );
    set(&mut row.exposure, req.exposure);
    set(&mut row.furnished, req.furnished);
    set(&mut row.accessibility, req.accessibility);
}

// -- Listing service --

/// Persist a new listing for `owner_id`. Coordinates are resolved by the
/// caller beforehand.
pub async fn create(
    state: &AppState,
    req: CreateItemRequest,
    owner_id: Uuid,
    images: Vec<String>,
    coordinates: Option<Coordinates>,
) -> Result<Listing, ApiError> {
    validate_create(&req)?;

    let row = ItemRow {
        id: Uuid::new_v4().to_string(),
        owner_id: Some(owner_id.to_string()),
        name: req.name,
        title: req.title,
        description: req.description,
        price: req.price,
        address: req.address,
        city: req.city,
        country: req.country,
        rooms: req.rooms,
        bedrooms: req.bedrooms,
        area: req.area,
        floor: req.floor,
        annex_area: req.annex_area,
        type_of_housing: req.type_of_housing.map(|t| t.as_str().to_string()),
        exposure: req.exposure,
        furnished: req.furnished,
        accessibility: req.accessibility,
        latitude: coordinates.map(|c| c.latitude),
        longitude: coordinates.map(|c| c.longitude),
        images,
        likes: Vec::new(),
        created_at: String::new(),
    };

    let stored = state.with_db(move |db| Ok(db.insert_item(&row)?)).await?;
    info!(item_id = %stored.id, %owner_id, "listing created");
    Ok(convert::listing(stored))
}

pub async fn find_all(state: &AppState, owner: Option<Uuid>) -> Result<Vec<Listing>, ApiError> {
    let rows = state
        .with_db(move |db| Ok(db.list_items(owner.map(|o| o.to_string()).as_deref())?))
        .await?;
    Ok(rows.into_iter().map(convert::listing).collect())
}

/// With an owner filter, a listing that exists under another owner is
/// reported as forbidden rather than missing.
pub async fn find_one(state: &AppState, id: Uuid, owner: Option<Uuid>) -> Result<Listing, ApiError> {
    let listing = state
        .with_db(move |db| Ok(db.get_item(&id.to_string())?))
        .await?
        .map(convert::listing)
        .ok_or_else(item_not_found)?;

    if let Some(owner) = owner {
        if listing.owner_id != Some(owner) {
            return Err(not_item_owner());
        }
    }
    Ok(listing)
}

/// Load, authorize, merge, persist. A legacy listing without an owner is
/// adopted by the requesting user. Returns the listing and the image names
/// it no longer references.
pub async fn update(
    state: &AppState,
    id: Uuid,
    req: UpdateItemRequest,
    new_images: Option<Vec<String>>,
    requester: Uuid,
) -> Result<(Listing, Vec<String>), ApiError> {
    validate_update(&req)?;

    let mut row = state
        .with_db(move |db| Ok(db.get_item(&id.to_string())?))
        .await?
        .ok_or_else(item_not_found)?;

    let loaded_owner = row.owner_id.clone();
    match row.owner_id.as_deref() {
        None => {
            warn!(item_id = %id, user_id = %requester, "adopting listing without an owner");
            row.owner_id = Some(requester.to_string());
        }
        Some(owner) if owner != requester.to_string() => return Err(not_item_owner()),
        Some(_) => {}
    }

    let relocate = req.touches_location();
    apply_update(&mut row, req);

    if relocate {
        let coords = geocode::locate(state.geocoder.as_ref(), &row.address, &row.city, &row.country).await;
        row.latitude = coords.map(|c| c.latitude);
        row.longitude = coords.map(|c| c.longitude);
    }

    let replaced = match new_images {
        Some(images) => std::mem::replace(&mut row.images, images),
        None => Vec::new(),
    };

    let stored = state
        .with_db(move |db| {
            if !db.update_item(&row, loaded_owner.as_deref())? {
                return Err(ApiError::Conflict("Item changed while updating, please retry".into()));
            }
            db.get_item(&row.id)?.ok_or_else(item_not_found)
        })
        .await?;

    info!(item_id = %id, "listing updated");
    Ok((convert::listing(stored), replaced))
}

/// Deletes only when both id and owner match; anything else is reported as
/// not found. Returns the deleted listing.
pub async fn delete_by_id(state: &AppState, id: Uuid, requester: Uuid) -> Result<Listing, ApiError> {
    let deleted = state
        .with_db(move |db| Ok(db.delete_item_owned(&id.to_string(), &requester.to_string())?))
        .await?
        .ok_or_else(item_not_found)?;

    info!(item_id = %id, "listing deleted");
    Ok(convert::listing(deleted))
}

pub async fn add_like(state: &AppState, item_id: Uuid, user_id: Uuid) -> Result<Listing, ApiError> {
    state
        .with_db(move |db| {
            let id = item_id.to_string();
            if !db.add_like(&id, &user_id.to_string())? {
                return Err(item_not_found());
            }
            db.get_item(&id)?.map(convert::listing).ok_or_else(item_not_found)
        })
        .await
}

pub async fn remove_like(state: &AppState, item_id: Uuid, user_id: Uuid) -> Result<Listing, ApiError> {
    state
        .with_db(move |db| {
            let id = item_id.to_string();
            if !db.remove_like(&id, &user_id.to_string())? {
                return Err(item_not_found());
            }
            db.get_item(&id)?.map(convert::listing).ok_or_else(item_not_found)
        })
        .await
}

// -- Handlers --

pub async fn post_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let ItemForm { data, images } = uploads::read_item_form::<CreateItemRequest>(multipart).await?;
    let req = data.ok_or_else(|| ApiError::Validation("missing listing data".into()))?;
    validate_create(&req)?;

    let coords = geocode::locate(state.geocoder.as_ref(), &req.address, &req.city, &req.country).await;
    let names = state.images.save_all(&images).await?;

    match create(&state, req, claims.sub, names.clone(), coords).await {
        Ok(listing) => Ok((StatusCode::CREATED, Json(listing))),
        Err(e) => {
            state.images.delete_all(&names).await;
            Err(e)
        }
    }
}

pub async fn get_items(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ItemQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(find_all(&state, query.owner).await?))
}

pub async fn get_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ItemQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(find_one(&state, id, query.owner).await?))
}

pub async fn put_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let ItemForm { data, images } = uploads::read_item_form::<UpdateItemRequest>(multipart).await?;
    let req = data.unwrap_or_default();
    validate_update(&req)?;

    let names = state.images.save_all(&images).await?;
    let new_images = (!names.is_empty()).then(|| names.clone());

    match update(&state, id, req, new_images, claims.sub).await {
        Ok((listing, replaced)) => {
            state.images.delete_all(&replaced).await;
            Ok(Json(listing))
        }
        Err(e) => {
            state.images.delete_all(&names).await;
            Err(e)
        }
    }
}

pub async fn delete_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = delete_by_id(&state, id, claims.sub).await?;
    state.images.delete_all(&deleted.images).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn post_like(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(add_like(&state, id, claims.sub).await?))
}

pub async fn delete_like(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(remove_like(&state, id, claims.sub).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_update_leaves_absent_fields() {
        let mut row = ItemRow {
            price: 500.0,
            rooms: Some(3),
            city: "Paris".into(),
            furnished: Some(true),
            ..Default::default()
        };
        let req: UpdateItemRequest =
            serde_json::from_str(r#"{"price": 650, "rooms": null, "typeOfHousing": "loft"}"#).unwrap();

        apply_update(&mut row, req);
        assert_eq!(row.price, 650.0);
        assert_eq!(row.rooms, None);
        assert_eq!(row.city, "Paris");
        assert_eq!(row.furnished, Some(true));
        assert_eq!(row.type_of_housing.as_deref(), Some("loft"));
    }
}
