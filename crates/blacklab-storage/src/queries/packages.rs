// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Package catalog queries.

use blacklab_core::{BlacklabError, Category, Package, PackageId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, column_err, map_tr_err};

const COLUMNS: &str = "id, category, title, price";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Package> {
    let category: String = row.get(1)?;
    Ok(Package {
        id: PackageId(row.get(0)?),
        category: category
            .parse::<Category>()
            .map_err(|e| column_err(1, e))?,
        title: row.get(2)?,
        price: row.get(3)?,
    })
}

pub async fn insert(db: &Database, package: &Package) -> Result<(), BlacklabError> {
    package.validate()?;
    let package = package.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO packages (id, category, title, price) VALUES (?1, ?2, ?3, ?4)",
                params![
                    package.id.as_str(),
                    package.category.to_string(),
                    package.title,
                    package.price
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts every package not already present by id; returns how many were added.
pub async fn insert_missing(db: &Database, packages: Vec<Package>) -> Result<usize, BlacklabError> {
    for package in &packages {
        package.validate()?;
    }
    db.connection()
        .call(move |conn| -> rusqlite::Result<usize> {
            let tx = conn.transaction()?;
            let mut added = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO packages (id, category, title, price)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for p in &packages {
                    added += stmt.execute(params![
                        p.id.as_str(),
                        p.category.to_string(),
                        p.title,
                        p.price
                    ])?;
                }
            }
            tx.commit()?;
            Ok(added)
        })
        .await
        .map_err(map_tr_err)
}

/// Returns `true` if a package was deleted.
pub async fn remove(db: &Database, id: &PackageId) -> Result<bool, BlacklabError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            Ok(conn.execute("DELETE FROM packages WHERE id = ?1", params![id])? > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(db: &Database, id: &PackageId) -> Result<Option<Package>, BlacklabError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<Package>> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM packages WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_by_category(
    db: &Database,
    category: Category,
) -> Result<Vec<Package>, BlacklabError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<Package>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM packages WHERE category = ?1 ORDER BY seq"
            ))?;
            let rows = stmt.query_map(params![category.to_string()], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_all(db: &Database) -> Result<Vec<Package>, BlacklabError> {
    db.connection()
        .call(|conn| -> rusqlite::Result<Vec<Package>> {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM packages ORDER BY seq"))?;
            let rows = stmt.query_map([], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
