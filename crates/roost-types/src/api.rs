use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::TypeOfHousing;

// -- JWT Claims --

/// JWT claims issued at signin and checked by the bearer-token middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// -- Accounts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub access_token: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub photo: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PremiumRequest {
    pub premium: bool,
}

// -- Listings --

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub address: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub rooms: Option<i64>,
    #[serde(default)]
    pub bedrooms: Option<i64>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub floor: Option<i64>,
    #[serde(default)]
    pub annex_area: Option<f64>,
    #[serde(default)]
    pub type_of_housing: Option<TypeOfHousing>,
    #[serde(default)]
    pub exposure: Option<String>,
    #[serde(default)]
    pub furnished: Option<bool>,
    #[serde(default)]
    pub accessibility: Option<bool>,
}

/// Partial listing update. Outer `None` leaves the field untouched; for
/// optional attributes `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateItemRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub rooms: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bedrooms: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub area: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub floor: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub annex_area: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub type_of_housing: Option<Option<TypeOfHousing>>,
    #[serde(default, deserialize_with = "double_option")]
    pub exposure: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub furnished: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option")]
    pub accessibility: Option<Option<bool>>,
}

impl UpdateItemRequest {
    /// True when any geocoded field is part of the update.
    pub fn touches_location(&self) -> bool {
        self.address.is_some() || self.city.is_some() || self.country.is_some()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    pub owner: Option<Uuid>,
}

// -- Dossiers --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateDossierRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub item_id: Option<Uuid>,
    pub owners: Vec<Uuid>,
}

// -- Contact --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Contact relay outcome. Always delivered with a 2xx status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}
