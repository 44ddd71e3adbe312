// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order queries.

use blacklab_core::{
    BlacklabError, Category, Order, OrderId, OrderStatus, Package, PackageId, PhoneNumber,
    UserId,
};
use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, column_err, map_tr_err, parse_ts, ts};

const COLUMNS: &str = "id, buyer, package_id, package_category, package_title, package_price, \
                       payer, recipient, status, created_at";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    let category: String = row.get(3)?;
    let payer: String = row.get(6)?;
    let recipient: String = row.get(7)?;
    let status: String = row.get(8)?;
    let created_at: String = row.get(9)?;
    Ok(Order {
        id: OrderId(row.get(0)?),
        buyer: UserId(row.get(1)?),
        package: Package {
            id: PackageId(row.get(2)?),
            category: category.parse::<Category>().map_err(|e| column_err(3, e))?,
            title: row.get(4)?,
            price: row.get(5)?,
        },
        payer: PhoneNumber::parse(&payer).map_err(|e| column_err(6, e))?,
        recipient: PhoneNumber::parse(&recipient).map_err(|e| column_err(7, e))?,
        status: status.parse::<OrderStatus>().map_err(|e| column_err(8, e))?,
        created_at: parse_ts(9, &created_at)?,
    })
}

pub async fn create(db: &Database, order: &Order) -> Result<(), BlacklabError> {
    let o = order.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            let created = ts(o.created_at);
            conn.execute(
                "INSERT INTO orders (id, buyer, package_id, package_category, package_title,
                                     package_price, payer, recipient, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    o.id.as_str(),
                    o.buyer.as_str(),
                    o.package.id.as_str(),
                    o.package.category.to_string(),
                    o.package.title,
                    o.package.price,
                    o.payer.as_str(),
                    o.recipient.as_str(),
                    o.status.to_string(),
                    created,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(db: &Database, id: &OrderId) -> Result<Option<Order>, BlacklabError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<Order>> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM orders WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Newest orders first.
pub async fn list(db: &Database, limit: usize) -> Result<Vec<Order>, BlacklabError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<Order>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM orders ORDER BY created_at DESC, rowid DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Settles a pending order.
///
/// The `WHERE status = 'pending'` guard makes the check-and-set atomic on
/// the writer thread; a settled or missing order is reported afterwards.
pub async fn update_status(
    db: &Database,
    id: &OrderId,
    status: OrderStatus,
) -> Result<Order, BlacklabError> {
    if !OrderStatus::Pending.can_transition_to(status) {
        return Err(BlacklabError::InvalidOrderTransition {
            from: OrderStatus::Pending,
            to: status,
        });
    }

    let key = id.0.clone();
    let now = ts(Utc::now());
    let updated = db
        .connection()
        .call(move |conn| -> rusqlite::Result<usize> {
            conn.execute(
                "UPDATE orders SET status = ?2, updated_at = ?3
                 WHERE id = ?1 AND status = 'pending'",
                params![key, status.to_string(), now],
            )
        })
        .await
        .map_err(map_tr_err)?;

    match get(db, id).await? {
        Some(order) if updated == 1 => Ok(order),
        Some(order) => Err(BlacklabError::InvalidOrderTransition {
            from: order.status,
            to: status,
        }),
        None => Err(BlacklabError::NotFound {
            kind: "order",
            id: id.to_string(),
        }),
    }
}
