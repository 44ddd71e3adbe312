// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session persistence.
//!
//! The whole session is stored as JSON; `state` and `last_activity_at`
//! are duplicated into columns for inspection and eviction.

use blacklab_core::{BlacklabError, ConversationSession, UserId};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, column_err, map_tr_err, ts};

pub async fn load(db: &Database, user: &UserId) -> Result<Option<ConversationSession>, BlacklabError> {
    let user = user.0.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<ConversationSession>> {
            conn.query_row(
                "SELECT data FROM sessions WHERE user_id = ?1",
                params![user],
                |row| {
                    let data: String = row.get(0)?;
                    serde_json::from_str(&data).map_err(|e| column_err(0, e))
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn save(db: &Database, session: &ConversationSession) -> Result<(), BlacklabError> {
    let data = serde_json::to_string(session).map_err(BlacklabError::storage)?;
    let user = session.user_id.0.clone();
    let state = session.state.name();
    let last_activity = ts(session.last_activity_at);
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO sessions (user_id, state, data, last_activity_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                    state = excluded.state,
                    data = excluded.data,
                    last_activity_at = excluded.last_activity_at",
                params![user, state, data, last_activity],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn remove(db: &Database, user: &UserId) -> Result<(), BlacklabError> {
    let user = user.0.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn evict_idle(db: &Database, cutoff: DateTime<Utc>) -> Result<usize, BlacklabError> {
    let cutoff = ts(cutoff);
    db.connection()
        .call(move |conn| -> rusqlite::Result<usize> {
            conn.execute(
                "DELETE FROM sessions WHERE last_activity_at < ?1",
                params![cutoff],
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn clear(db: &Database) -> Result<(), BlacklabError> {
    db.connection()
        .call(|conn| -> rusqlite::Result<()> {
            conn.execute("DELETE FROM sessions", [])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count(db: &Database) -> Result<usize, BlacklabError> {
    db.connection()
        .call(|conn| -> rusqlite::Result<usize> {
            conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)
}
