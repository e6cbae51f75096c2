use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::Database;
use crate::models::{DossierOwnerRow, DossierRow};
use crate::queries::{ID_BATCH, placeholders};

impl Database {
    /// Insert a dossier and its owner entries in one transaction.
    pub fn insert_dossier(&self, dossier: &DossierRow) -> Result<DossierRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO dossiers (id, user_id, item_id, url) VALUES (?1, ?2, ?3, ?4)",
                params![dossier.id, dossier.user_id, dossier.item_id, dossier.url],
            )?;
            for (position, owner) in dossier.owners.iter().enumerate() {
                tx.execute(
                    "INSERT INTO dossier_owners (dossier_id, owner_id, position, is_validated)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![dossier.id, owner.owner_id, position as i64, owner.is_validated],
                )?;
            }
            let stored = query_dossier(&tx, &dossier.id)?
                .ok_or_else(|| anyhow::anyhow!("dossier {} vanished after insert", dossier.id))?;
            tx.commit()?;
            Ok(stored)
        })
    }

    pub fn get_dossier(&self, id: &str) -> Result<Option<DossierRow>> {
        self.with_conn(|conn| query_dossier(conn, id))
    }

    pub fn list_dossiers_by_user(&self, user_id: &str) -> Result<Vec<DossierRow>> {
        self.with_conn(|conn| {
            query_dossiers(
                conn,
                "SELECT id, user_id, item_id, url, created_at FROM dossiers
                 WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
                user_id,
            )
        })
    }

    pub fn list_dossiers_by_owner(&self, owner_id: &str) -> Result<Vec<DossierRow>> {
        self.with_conn(|conn| {
            query_dossiers(
                conn,
                "SELECT d.id, d.user_id, d.item_id, d.url, d.created_at FROM dossiers d
                 JOIN dossier_owners o ON o.dossier_id = d.id
                 WHERE o.owner_id = ?1 ORDER BY d.created_at DESC, d.rowid DESC",
                owner_id,
            )
        })
    }

    /// Flip one owner's flag in a single statement keyed by both the dossier
    /// and the owner. Returns false when no entry matched either condition.
    pub fn validate_dossier_owner(&self, dossier_id: &str, owner_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE dossier_owners SET is_validated = 1 WHERE dossier_id = ?1 AND owner_id = ?2",
                params![dossier_id, owner_id],
            )?;
            Ok(n > 0)
        })
    }
}

fn dossier_from_row(row: &Row<'_>) -> rusqlite::Result<DossierRow> {
    Ok(DossierRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        item_id: row.get(2)?,
        url: row.get(3)?,
        owners: Vec::new(),
        created_at: row.get(4)?,
    })
}

fn query_dossier(conn: &Connection, id: &str) -> Result<Option<DossierRow>> {
    let dossier = conn
        .query_row(
            "SELECT id, user_id, item_id, url, created_at FROM dossiers WHERE id = ?1",
            [id],
            dossier_from_row,
        )
        .optional()?;

    match dossier {
        Some(mut dossier) => {
            let mut owners = query_owners(conn, std::slice::from_ref(&dossier.id))?;
            dossier.owners = owners.remove(&dossier.id).unwrap_or_default();
            Ok(Some(dossier))
        }
        None => Ok(None),
    }
}

fn query_dossiers(conn: &Connection, sql: &str, key: &str) -> Result<Vec<DossierRow>> {
    let mut stmt = conn.prepare(sql)?;
    let mut dossiers = stmt
        .query_map([key], dossier_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let ids: Vec<String> = dossiers.iter().map(|d| d.id.clone()).collect();
    let mut owners = query_owners(conn, &ids)?;
    for dossier in &mut dossiers {
        dossier.owners = owners.remove(&dossier.id).unwrap_or_default();
    }

    Ok(dossiers)
}

fn query_owners(conn: &Connection, dossier_ids: &[String]) -> Result<HashMap<String, Vec<DossierOwnerRow>>> {
    let mut grouped: HashMap<String, Vec<DossierOwnerRow>> = HashMap::new();
    if dossier_ids.is_empty() {
        return Ok(grouped);
    }

    for batch in dossier_ids.chunks(ID_BATCH) {
        let sql = format!(
            "SELECT dossier_id, owner_id, is_validated FROM dossier_owners
             WHERE dossier_id IN ({}) ORDER BY position",
            placeholders(batch.len())
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(batch.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                DossierOwnerRow {
                    owner_id: row.get(1)?,
                    is_validated: row.get(2)?,
                },
            ))
        })?;

        for row in rows {
            let (dossier_id, owner) = row?;
            grouped.entry(dossier_id).or_default().push(owner);
        }
    }

    Ok(grouped)
}
