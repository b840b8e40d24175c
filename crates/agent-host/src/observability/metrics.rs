//! Metrics definitions for Agent Host.
//!
//! Prometheus naming conventions: `agent_` prefix, `_total` suffix for
//! counters. Labels are bounded to prevent cardinality explosion; the
//! `outcome` label takes one of six values fixed in the access gate.

use metrics::counter;

/// Record an access-gate decision.
///
/// Metric: `agent_auth_decisions_total`
/// Label: `outcome` - one of `bypass_unregistered`, `session_valid`,
/// `header_valid`, `forbidden`, `unauthenticated`, `keyset_unavailable`.
pub fn record_auth_decision(outcome: &'static str) {
    counter!("agent_auth_decisions_total", "outcome" => outcome).increment(1);
}

/// Record a key set fetch attempt.
///
/// Metric: `agent_keyset_fetches_total`
/// Label: `status` - `success` or `error`.
pub fn record_keyset_fetch(status: &'static str) {
    counter!("agent_keyset_fetches_total", "status" => status).increment(1);
}
