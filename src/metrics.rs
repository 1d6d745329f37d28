//! Lightweight export counters
//!
//! Disabled until [`enable`] is called; recording is a no-op before that.

use crate::export::ExportFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tracing::info;

static METRICS: OnceLock<Mutex<MetricsState>> = OnceLock::new();

/// Start collecting export metrics.
pub fn enable() {
    METRICS.get_or_init(|| Mutex::new(MetricsState::default()));
}

pub fn is_enabled() -> bool {
    METRICS.get().is_some()
}

/// Record the outcome of an export attempt.
pub fn record(duration: Duration, success: bool, format: ExportFormat) {
    if let Some(state) = METRICS.get() {
        let mut guard = state.lock().expect("metrics mutex poisoned");
        let state = &mut *guard;
        state.total += 1;
        let entry = state.per_format.entry(format.extension()).or_default();
        if success {
            state.succeeded += 1;
            state.success_duration += duration;
            entry.succeeded += 1;
        } else {
            state.failed += 1;
            entry.failed += 1;
        }
    }
}

/// Record a request dropped because another export was in flight.
pub fn record_rejected() {
    if let Some(state) = METRICS.get() {
        state.lock().expect("metrics mutex poisoned").rejected += 1;
    }
}

/// Current counters, if metrics are enabled
pub fn snapshot() -> Option<Snapshot> {
    METRICS
        .get()
        .map(|state| state.lock().expect("metrics mutex poisoned").snapshot())
}

/// Emit the current counters through tracing.
pub fn log_snapshot() {
    if let Some(snapshot) = snapshot() {
        info!(
            target: "qrsuite::metrics",
            total = snapshot.total,
            succeeded = snapshot.succeeded,
            failed = snapshot.failed,
            rejected = snapshot.rejected,
            avg_success_ms = snapshot.avg_success_ms,
            "export metrics"
        );
    }
}

#[derive(Default)]
struct MetricsState {
    total: u64,
    succeeded: u64,
    failed: u64,
    rejected: u64,
    success_duration: Duration,
    per_format: BTreeMap<&'static str, FormatCounters>,
}

impl MetricsState {
    fn snapshot(&self) -> Snapshot {
        let avg_success_ms = if self.succeeded > 0 {
            Some(self.success_duration.as_secs_f64() * 1000.0 / self.succeeded as f64)
        } else {
            None
        };

        Snapshot {
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            rejected: self.rejected,
            avg_success_ms,
            per_format: self
                .per_format
                .iter()
                .map(|(format, counters)| FormatSnapshot {
                    format: format.to_string(),
                    succeeded: counters.succeeded,
                    failed: counters.failed,
                })
                .collect(),
        }
    }
}

#[derive(Default, Clone, Copy)]
struct FormatCounters {
    succeeded: u64,
    failed: u64,
}

/// Point-in-time view of the export counters
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rejected: u64,
    pub avg_success_ms: Option<f64>,
    pub per_format: Vec<FormatSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormatSnapshot {
    pub format: String,
    pub succeeded: u64,
    pub failed: u64,
}
