// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User directory queries.

use blacklab_core::{BlacklabError, UserId};
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::{Database, map_tr_err, ts};

/// Returns `true` when the user was not known before.
pub async fn record(db: &Database, user: &UserId, seen_at: DateTime<Utc>) -> Result<bool, BlacklabError> {
    let phone = user.0.clone();
    let seen_at = ts(seen_at);
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO users (phone, first_seen_at) VALUES (?1, ?2)",
                params![phone, seen_at],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Users in the order they first appeared.
pub async fn list(db: &Database) -> Result<Vec<UserId>, BlacklabError> {
    db.connection()
        .call(|conn| -> rusqlite::Result<Vec<UserId>> {
            let mut stmt = conn.prepare("SELECT phone FROM users ORDER BY first_seen_at, rowid")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0).map(UserId))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
