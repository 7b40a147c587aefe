//! Pattern usage statistics.
//!
//! Every successful remesh bumps a process-wide counter for the pattern it
//! used. The counts are informational only.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard};

use log::info;

/// Identifies a pattern across both catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternRef {
    /// Entry of the fixed catalog.
    Fixed(usize),
    /// Entry of the disk library: boundary size and index within that size.
    Disk {
        /// Boundary size of the quadrangulation.
        boundary_size: usize,
        /// Index among quadrangulations of that boundary size.
        index: usize,
    },
}

static USAGE: LazyLock<Mutex<HashMap<PatternRef, usize>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn usage_map() -> MutexGuard<'static, HashMap<PatternRef, usize>> {
    // A panic while holding the lock cannot leave a HashMap of counters in a
    // state worse than a missed increment.
    USAGE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Count one use of `pattern`.
pub fn record_usage(pattern: PatternRef) {
    *usage_map().entry(pattern).or_insert(0) += 1;
}

/// How many times `pattern` was used.
pub fn usage_count(pattern: PatternRef) -> usize {
    usage_map().get(&pattern).copied().unwrap_or(0)
}

/// Snapshot of all counters, sorted by pattern.
pub fn usage_snapshot() -> Vec<(PatternRef, usize)> {
    let mut entries: Vec<_> = usage_map().iter().map(|(&k, &v)| (k, v)).collect();
    entries.sort();
    entries
}

/// Log how many distinct patterns were used so far.
pub fn log_usage() {
    let snapshot = usage_snapshot();
    let total: usize = snapshot.iter().map(|(_, n)| n).sum();
    info!(
        "cavity remeshing stats: {} distinct patterns used, {} remeshes",
        snapshot.len(),
        total
    );
}
