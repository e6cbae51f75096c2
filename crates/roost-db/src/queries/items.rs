use std::collections::HashMap;

use anyhow::Result;
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::Database;
use crate::models::ItemRow;
use crate::queries::{ID_BATCH, filter, placeholders};
use roost_types::filter::ListingFilter;

pub(crate) const ITEM_COLUMNS: &str = "id, owner_id, name, title, description, price, address, city, country,
     rooms, bedrooms, area, floor, annex_area, type_of_housing, exposure, furnished, accessibility,
     latitude, longitude, images, created_at";

impl Database {
    pub fn insert_item(&self, item: &ItemRow) -> Result<ItemRow> {
        let images = serde_json::to_string(&item.images)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO items (id, owner_id, name, title, description, price, address, city, country,
                     rooms, bedrooms, area, floor, annex_area, type_of_housing, exposure, furnished,
                     accessibility, latitude, longitude, images)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                     ?18, ?19, ?20, ?21)",
                params![
                    item.id,
                    item.owner_id,
                    item.name,
                    item.title,
                    item.description,
                    item.price,
                    item.address,
                    item.city,
                    item.country,
                    item.rooms,
                    item.bedrooms,
                    item.area,
                    item.floor,
                    item.annex_area,
                    item.type_of_housing,
                    item.exposure,
                    item.furnished,
                    item.accessibility,
                    item.latitude,
                    item.longitude,
                    images,
                ],
            )?;
            query_item(conn, &item.id)?
                .ok_or_else(|| anyhow::anyhow!("item {} vanished after insert", item.id))
        })
    }

    pub fn get_item(&self, id: &str) -> Result<Option<ItemRow>> {
        self.with_conn(|conn| query_item(conn, id))
    }

    /// Newest first, optionally restricted to one owner.
    pub fn list_items(&self, owner_id: Option<&str>) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| match owner_id {
            Some(owner) => query_items(
                conn,
                "owner_id = ?",
                vec![Value::Text(owner.to_string())],
            ),
            None => query_items(conn, "1 = 1", vec![]),
        })
    }

    pub fn filter_items(&self, filter: &ListingFilter) -> Result<Vec<ItemRow>> {
        let (clause, values) = filter::build(filter);
        self.with_conn(|conn| query_items(conn, &clause, values))
    }

    /// Overwrite every mutable column (likes are untouched). The write only
    /// lands while the stored owner still equals `expected_owner` (`None`
    /// for an unowned row); returns false otherwise or when the id is unknown.
    pub fn update_item(&self, item: &ItemRow, expected_owner: Option<&str>) -> Result<bool> {
        let images = serde_json::to_string(&item.images)?;
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE items SET owner_id = ?2, name = ?3, title = ?4, description = ?5, price = ?6,
                     address = ?7, city = ?8, country = ?9, rooms = ?10, bedrooms = ?11, area = ?12,
                     floor = ?13, annex_area = ?14, type_of_housing = ?15, exposure = ?16,
                     furnished = ?17, accessibility = ?18, latitude = ?19, longitude = ?20, images = ?21
                 WHERE id = ?1 AND owner_id IS ?22",
                params![
                    item.id,
                    item.owner_id,
                    item.name,
                    item.title,
                    item.description,
                    item.price,
                    item.address,
                    item.city,
                    item.country,
                    item.rooms,
                    item.bedrooms,
                    item.area,
                    item.floor,
                    item.annex_area,
                    item.type_of_housing,
                    item.exposure,
                    item.furnished,
                    item.accessibility,
                    item.latitude,
                    item.longitude,
                    images,
                    expected_owner,
                ],
            )?;
            Ok(n > 0)
        })
    }

    /// Delete only when both id and owner match. Returns the deleted row so
    /// the caller can clean up its images.
    pub fn delete_item_owned(&self, id: &str, owner_id: &str) -> Result<Option<ItemRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let existing = query_item(&tx, id)?
                .filter(|item| item.owner_id.as_deref() == Some(owner_id));
            if existing.is_some() {
                tx.execute(
                    "DELETE FROM items WHERE id = ?1 AND owner_id = ?2",
                    params![id, owner_id],
                )?;
            }
            tx.commit()?;
            Ok(existing)
        })
    }

    /// Set-add a like. Returns false when the item does not exist; a repeated
    /// like is a no-op.
    pub fn add_like(&self, item_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            if !item_exists(conn, item_id)? {
                return Ok(false);
            }
            conn.execute(
                "INSERT OR IGNORE INTO item_likes (item_id, user_id) VALUES (?1, ?2)",
                params![item_id, user_id],
            )?;
            Ok(true)
        })
    }

    /// Set-remove a like. Returns false when the item does not exist;
    /// removing a like that was never there is a no-op.
    pub fn remove_like(&self, item_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            if !item_exists(conn, item_id)? {
                return Ok(false);
            }
            conn.execute(
                "DELETE FROM item_likes WHERE item_id = ?1 AND user_id = ?2",
                params![item_id, user_id],
            )?;
            Ok(true)
        })
    }
}

fn item_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM items WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ItemRow> {
    let images_json: String = row.get(20)?;
    let images: Vec<String> = serde_json::from_str(&images_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(20, Type::Text, Box::new(e)))?;

    Ok(ItemRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        price: row.get(5)?,
        address: row.get(6)?,
        city: row.get(7)?,
        country: row.get(8)?,
        rooms: row.get(9)?,
        bedrooms: row.get(10)?,
        area: row.get(11)?,
        floor: row.get(12)?,
        annex_area: row.get(13)?,
        type_of_housing: row.get(14)?,
        exposure: row.get(15)?,
        furnished: row.get(16)?,
        accessibility: row.get(17)?,
        latitude: row.get(18)?,
        longitude: row.get(19)?,
        images,
        likes: Vec::new(),
        created_at: row.get(21)?,
    })
}

fn query_item(conn: &Connection, id: &str) -> Result<Option<ItemRow>> {
    let sql = format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS);
    let item = conn.query_row(&sql, [id], item_from_row).optional()?;

    match item {
        Some(mut item) => {
            let mut likes = query_likes(conn, std::slice::from_ref(&item.id))?;
            item.likes = likes.remove(&item.id).unwrap_or_default();
            Ok(Some(item))
        }
        None => Ok(None),
    }
}

/// `clause` is built from our own column names; every user value is bound.
fn query_items(conn: &Connection, clause: &str, values: Vec<Value>) -> Result<Vec<ItemRow>> {
    let sql = format!(
        "SELECT {} FROM items WHERE {} ORDER BY created_at DESC, rowid DESC",
        ITEM_COLUMNS, clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut items = stmt
        .query_map(params_from_iter(values.iter()), item_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
    let mut likes = query_likes(conn, &ids)?;
    for item in &mut items {
        item.likes = likes.remove(&item.id).unwrap_or_default();
    }

    Ok(items)
}

/// Batch-fetch likes for a set of item IDs, grouped by item.
fn query_likes(conn: &Connection, item_ids: &[String]) -> Result<HashMap<String, Vec<String>>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    if item_ids.is_empty() {
        return Ok(grouped);
    }

    for batch in item_ids.chunks(ID_BATCH) {
        let sql = format!(
            "SELECT item_id, user_id FROM item_likes WHERE item_id IN ({}) ORDER BY created_at, rowid",
            placeholders(batch.len())
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(batch.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (item_id, user_id) = row?;
            grouped.entry(item_id).or_default().push(user_id);
        }
    }

    Ok(grouped)
}
