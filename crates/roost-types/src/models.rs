use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of an account. The password hash never leaves the DB layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub photo: Option<String>,
    pub premium: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeOfHousing {
    Apartment,
    House,
    Studio,
    Duplex,
    Villa,
    Loft,
}

impl TypeOfHousing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::House => "house",
            Self::Studio => "studio",
            Self::Duplex => "duplex",
            Self::Villa => "villa",
            Self::Loft => "loft",
        }
    }
}

impl fmt::Display for TypeOfHousing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeOfHousing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "apartment" => Ok(Self::Apartment),
            "house" => Ok(Self::House),
            "studio" => Ok(Self::Studio),
            "duplex" => Ok(Self::Duplex),
            "villa" => Ok(Self::Villa),
            "loft" => Ok(Self::Loft),
            other => Err(format!("unknown type of housing '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A published rental property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    /// `None` only for legacy rows imported before ownership was recorded.
    pub owner_id: Option<Uuid>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub address: String,
    pub city: String,
    pub country: String,
    pub rooms: Option<i64>,
    pub bedrooms: Option<i64>,
    pub area: Option<f64>,
    pub floor: Option<i64>,
    pub annex_area: Option<f64>,
    pub type_of_housing: Option<TypeOfHousing>,
    pub exposure: Option<String>,
    pub furnished: Option<bool>,
    pub accessibility: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DossierOwner {
    pub owner_id: Uuid,
    pub is_validated: bool,
}

/// A rental application awaiting approval from each listed owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dossier {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Option<Uuid>,
    pub url: Option<String>,
    pub owners: Vec<DossierOwner>,
    pub created_at: DateTime<Utc>,
}

impl Dossier {
    /// Submitter or any listed owner.
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.owners.iter().any(|o| o.owner_id == user_id)
    }
}
