// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup.
//!
//! Migrations run once on a short-lived blocking connection. Every query
//! after that goes through the single `tokio_rusqlite::Connection`, whose
//! background thread serializes all writes.

use std::path::Path;

use blacklab_core::BlacklabError;
use tracing::debug;

use crate::migrations::run_migrations;

pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and migrates it.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, BlacklabError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(BlacklabError::storage)?;
        }

        let owned = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), BlacklabError> {
            let mut conn = rusqlite::Connection::open(&owned).map_err(BlacklabError::storage)?;
            if wal_mode {
                let mode: String = conn
                    .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
                    .map_err(BlacklabError::storage)?;
                debug!(%mode, "journal mode set");
            }
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| BlacklabError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(BlacklabError::storage)?;
        conn.call(|conn| -> rusqlite::Result<()> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA synchronous = NORMAL;",
            )
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

/// Maps a `tokio-rusqlite` failure onto [`BlacklabError::Storage`].
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error<rusqlite::Error>) -> BlacklabError {
    BlacklabError::storage(err)
}

/// Wraps a parse failure for a stored column as a rusqlite conversion error.
pub(crate) fn column_err(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, err.into())
}

/// Timestamps are stored as fixed-width RFC 3339 UTC so text comparison orders them.
pub(crate) fn ts(value: chrono::DateTime<chrono::Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| column_err(idx, e))
}
