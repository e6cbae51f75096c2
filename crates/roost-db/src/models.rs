//! Row shapes read from and written to SQLite. Ids and timestamps stay as text.
//! Distinct from roost-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub photo: Option<String>,
    pub premium: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct ItemRow {
    pub id: String,
    pub owner_id: Option<String>,
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
    pub type_of_housing: Option<String>,
    pub exposure: Option<String>,
    pub furnished: Option<bool>,
    pub accessibility: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    /// Filled from `item_likes`, not stored on the row itself.
    pub likes: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct DossierOwnerRow {
    pub owner_id: String,
    pub is_validated: bool,
}

#[derive(Debug, Clone)]
pub struct DossierRow {
    pub id: String,
    pub user_id: String,
    pub item_id: Option<String>,
    pub url: Option<String>,
    pub owners: Vec<DossierOwnerRow>,
    pub created_at: String,
}
