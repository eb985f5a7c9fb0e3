// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. Without an installed recorder the calls are
//! no-ops, which keeps tests free of global state.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Nexos metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "nexos_messages_total",
        "Inbound messages routed, by outcome"
    );
    describe_counter!("nexos_commands_total", "Command invocations, by command");
    describe_counter!(
        "nexos_reconnects_total",
        "Scheduled reconnects, by kind (backoff, flap)"
    );
    describe_counter!("nexos_challenges_total", "Login challenges (QR codes) issued");
    describe_gauge!("nexos_connection_open", "1 while the session is open");
    describe_histogram!(
        "nexos_command_duration_seconds",
        "Command handler run time in seconds"
    );
    describe_gauge!("nexos_memory_heap_bytes", "Allocated heap bytes");
    describe_gauge!("nexos_memory_resident_bytes", "Resident allocator bytes");
}

/// Record a routed message.
pub fn record_message(outcome: &str) {
    metrics::counter!("nexos_messages_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a command invocation and how long its handler ran.
pub fn record_command(command: &str, seconds: f64) {
    metrics::counter!("nexos_commands_total", "command" => command.to_string()).increment(1);
    metrics::histogram!("nexos_command_duration_seconds", "command" => command.to_string())
        .record(seconds);
}

/// Record a scheduled reconnect.
pub fn record_reconnect(kind: &str) {
    metrics::counter!("nexos_reconnects_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_challenge() {
    metrics::counter!("nexos_challenges_total").increment(1);
}

pub fn set_connection_open(open: bool) {
    metrics::gauge!("nexos_connection_open").set(if open { 1.0 } else { 0.0 });
}

pub fn set_memory_heap(bytes: f64) {
    metrics::gauge!("nexos_memory_heap_bytes").set(bytes);
}

pub fn set_memory_resident(bytes: f64) {
    metrics::gauge!("nexos_memory_resident_bytes").set(bytes);
}
