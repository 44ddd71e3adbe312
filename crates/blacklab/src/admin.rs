// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator commands: catalog upkeep, order status, user listing and
//! broadcasts.
//!
//! Each command writes human-readable lines to `out` so the tests can
//! capture what an operator would see.

use std::io::Write;

use blacklab_core::{
    BlacklabError, ChannelAdapter, Order, OrderId, OrderStatus, OrderStore, OutboundIntent,
    Package, PackageCatalog, PackageId, UserDirectory,
};
use blacklab_storage::SqliteStorage;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

fn io_err(e: std::io::Error) -> BlacklabError {
    BlacklabError::Internal(format!("failed to write output: {e}"))
}

pub async fn list_packages(
    catalog: &dyn PackageCatalog,
    out: &mut impl Write,
) -> Result<(), BlacklabError> {
    let packages = catalog.list_all().await?;
    if packages.is_empty() {
        writeln!(out, "catalog is empty; run `blacklab catalog seed`").map_err(io_err)?;
        return Ok(());
    }
    for p in packages {
        writeln!(out, "{:<12} {:<8} {:>6}  {}", p.id, p.category, p.price, p.title)
            .map_err(io_err)?;
    }
    Ok(())
}

pub async fn add_package(
    storage: &SqliteStorage,
    package: Package,
    out: &mut impl Write,
) -> Result<(), BlacklabError> {
    storage.add_package(&package).await?;
    writeln!(out, "added {} ({})", package.id, package.title).map_err(io_err)
}

pub async fn remove_package(
    storage: &SqliteStorage,
    id: &PackageId,
    out: &mut impl Write,
) -> Result<(), BlacklabError> {
    storage.remove_package(id).await?;
    writeln!(out, "removed {id}").map_err(io_err)
}

pub async fn seed_catalog(storage: &SqliteStorage, out: &mut impl Write) -> Result<(), BlacklabError> {
    let added = storage.seed_defaults().await?;
    writeln!(out, "seeded {added} default package(s)").map_err(io_err)
}

fn order_line(order: &Order) -> String {
    format!(
        "{}  {}  {:<9} {:<12} {:>6}  payer={} recipient={} buyer={}",
        order.created_at.format("%Y-%m-%d %H:%M"),
        order.id,
        order.status,
        order.package.id,
        order.package.price,
        order.payer,
        order.recipient,
        order.buyer,
    )
}

pub async fn list_orders(
    orders: &dyn OrderStore,
    limit: usize,
    out: &mut impl Write,
) -> Result<(), BlacklabError> {
    let orders = orders.list(limit).await?;
    if orders.is_empty() {
        writeln!(out, "no orders yet").map_err(io_err)?;
    }
    for order in &orders {
        writeln!(out, "{}", order_line(order)).map_err(io_err)?;
    }
    Ok(())
}

pub async fn set_order_status(
    orders: &dyn OrderStore,
    id: &OrderId,
    status: OrderStatus,
    out: &mut impl Write,
) -> Result<(), BlacklabError> {
    let order = orders.update_status(id, status).await?;
    info!(order_id = %order.id, status = %order.status, "order status updated");
    writeln!(out, "{}", order_line(&order)).map_err(io_err)
}

pub async fn list_users(users: &dyn UserDirectory, out: &mut impl Write) -> Result<(), BlacklabError> {
    for user in users.list().await? {
        writeln!(out, "{user}").map_err(io_err)?;
    }
    Ok(())
}

/// Outcome of a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
}

/// Sends at most this many broadcast messages at once.
const BROADCAST_CONCURRENCY: usize = 8;

/// Sends `text` to every known user. A failed send is logged and the
/// broadcast carries on with the other users.
pub async fn broadcast(
    users: &dyn UserDirectory,
    channel: &dyn ChannelAdapter,
    text: &str,
) -> Result<BroadcastReport, BlacklabError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BlacklabError::Internal("broadcast text must not be empty".into()));
    }

    let intent = OutboundIntent::PlainText(text.to_string());
    let recipients = users.list().await?;
    let intent = &intent;
    let outcomes: Vec<bool> = stream::iter(recipients)
        .map(|user| async move {
            match channel.send(&user, intent).await {
                Ok(_) => true,
                Err(e) => {
                    warn!(user = %user, error = %e, "broadcast send failed");
                    false
                }
            }
        })
        .buffer_unordered(BROADCAST_CONCURRENCY)
        .collect()
        .await;

    let sent = outcomes.iter().filter(|ok| **ok).count();
    let report = BroadcastReport {
        sent,
        failed: outcomes.len() - sent,
    };
    info!(sent = report.sent, failed = report.failed, "broadcast finished");
    Ok(report)
}
