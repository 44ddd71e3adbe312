// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric descriptions and recording helpers (metrics-rs facade).

use metrics::describe_counter;

/// Registers metric descriptions. Call once after a recorder is installed.
pub fn register_metrics() {
    describe_counter!("blacklab_events_total", "Inbound events received");
    describe_counter!(
        "blacklab_events_duplicate_total",
        "Inbound events ignored as redeliveries"
    );
    describe_counter!("blacklab_orders_created_total", "Orders placed");
    describe_counter!(
        "blacklab_send_failures_total",
        "Outbound messages that could not be delivered"
    );
    describe_counter!(
        "blacklab_sessions_evicted_total",
        "Idle sessions removed by the sweeper"
    );
}

pub(crate) fn record_event(kind: &'static str) {
    metrics::counter!("blacklab_events_total", "kind" => kind).increment(1);
}

pub(crate) fn record_duplicate() {
    metrics::counter!("blacklab_events_duplicate_total").increment(1);
}

pub(crate) fn record_order(category: String) {
    metrics::counter!("blacklab_orders_created_total", "category" => category).increment(1);
}

pub(crate) fn record_send_failure(intent: &'static str) {
    metrics::counter!("blacklab_send_failures_total", "intent" => intent).increment(1);
}

pub(crate) fn record_evicted(count: usize) {
    metrics::counter!("blacklab_sessions_evicted_total").increment(count as u64);
}
