//! Row -> API model conversion. Corrupt columns are logged and defaulted
//! rather than failing the whole response.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use roost_db::models::{DossierRow, ItemRow, UserRow};
use roost_types::models::{Dossier, DossierOwner, Listing, TypeOfHousing, User};

pub fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}

pub fn parse_uuid(raw: &str, field: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on {}: {}", field, raw, context, e);
        Uuid::default()
    })
}

pub fn user(row: UserRow) -> User {
    User {
        id: parse_uuid(&row.id, "id", "user"),
        created_at: parse_timestamp(&row.created_at, &row.id),
        username: row.username,
        email: row.email,
        photo: row.photo,
        premium: row.premium,
    }
}

pub fn listing(row: ItemRow) -> Listing {
    let ctx = format!("item '{}'", row.id);
    Listing {
        id: parse_uuid(&row.id, "id", &ctx),
        owner_id: row.owner_id.as_deref().map(|o| parse_uuid(o, "owner_id", &ctx)),
        type_of_housing: row.type_of_housing.as_deref().and_then(|t| {
            t.parse::<TypeOfHousing>()
                .map_err(|e| warn!("Corrupt type_of_housing on {}: {}", ctx, e))
                .ok()
        }),
        likes: row
            .likes
            .iter()
            .map(|u| parse_uuid(u, "like", &ctx))
            .collect(),
        created_at: parse_timestamp(&row.created_at, &ctx),
        name: row.name,
        title: row.title,
        description: row.description,
        price: row.price,
        address: row.address,
        city: row.city,
        country: row.country,
        rooms: row.rooms,
        bedrooms: row.bedrooms,
        area: row.area,
        floor: row.floor,
        annex_area: row.annex_area,
        exposure: row.exposure,
        furnished: row.furnished,
        accessibility: row.accessibility,
        latitude: row.latitude,
        longitude: row.longitude,
        images: row.images,
    }
}

pub fn dossier(row: DossierRow) -> Dossier {
    let ctx = format!("dossier '{}'", row.id);
    Dossier {
        id: parse_uuid(&row.id, "id", &ctx),
        user_id: parse_uuid(&row.user_id, "user_id", &ctx),
        item_id: row.item_id.as_deref().map(|i| parse_uuid(i, "item_id", &ctx)),
        owners: row
            .owners
            .iter()
            .map(|o| DossierOwner {
                owner_id: parse_uuid(&o.owner_id, "owner_id", &ctx),
                is_validated: o.is_validated,
            })
            .collect(),
        created_at: parse_timestamp(&row.created_at, &ctx),
        url: row.url,
    }
}
