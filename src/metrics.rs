//! Process-wide counters for the response cache and interaction routing.
//! Counters only ever grow; callers diff two snapshots to measure an interval.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

static ENTRIES_CREATED: AtomicU64 = AtomicU64::new(0);
static ENTRIES_EVICTED: AtomicU64 = AtomicU64::new(0);
static FOLLOWUPS_PRUNED: AtomicU64 = AtomicU64::new(0);
static INTERACTIONS_HANDLED: AtomicU64 = AtomicU64::new(0);
static INTERACTIONS_REJECTED_BUSY: AtomicU64 = AtomicU64::new(0);
static INTERACTIONS_EXPIRED: AtomicU64 = AtomicU64::new(0);
static COMPONENT_REBUILDS: AtomicU64 = AtomicU64::new(0);
static SEND_FAILURES: AtomicU64 = AtomicU64::new(0);

static ACTION_COUNTERS: OnceLock<Mutex<HashMap<&'static str, u64>>> = OnceLock::new();

pub fn inc_entries_created() {
    ENTRIES_CREATED.fetch_add(1, Ordering::Relaxed);
}
pub fn add_entries_evicted(n: u64) {
    ENTRIES_EVICTED.fetch_add(n, Ordering::Relaxed);
}
pub fn add_followups_pruned(n: u64) {
    FOLLOWUPS_PRUNED.fetch_add(n, Ordering::Relaxed);
}
pub fn inc_interactions_handled() {
    INTERACTIONS_HANDLED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_interactions_rejected_busy() {
    INTERACTIONS_REJECTED_BUSY.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_interactions_expired() {
    INTERACTIONS_EXPIRED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_component_rebuilds() {
    COMPONENT_REBUILDS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_send_failures() {
    SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
}

fn action_lock() -> &'static Mutex<HashMap<&'static str, u64>> {
    ACTION_COUNTERS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Count one applied page action by its kind name (`next`, `select_page`, ...).
pub fn record_action(kind: &'static str) -> u64 {
    let mut guard = action_lock().lock().unwrap_or_else(PoisonError::into_inner);
    let counter = guard.entry(kind).or_default();
    *counter = counter.saturating_add(1);
    *counter
}

pub fn action_counters_snapshot() -> HashMap<&'static str, u64> {
    action_lock()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub entries_created: u64,
    pub entries_evicted: u64,
    pub followups_pruned: u64,
    pub interactions_handled: u64,
    pub interactions_rejected_busy: u64,
    pub interactions_expired: u64,
    pub component_rebuilds: u64,
    pub send_failures: u64,
}

impl Snapshot {
    /// Entries created but not yet evicted.
    pub fn live_entries(&self) -> u64 {
        self.entries_created.saturating_sub(self.entries_evicted)
    }
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        entries_created: ENTRIES_CREATED.load(Ordering::Relaxed),
        entries_evicted: ENTRIES_EVICTED.load(Ordering::Relaxed),
        followups_pruned: FOLLOWUPS_PRUNED.load(Ordering::Relaxed),
        interactions_handled: INTERACTIONS_HANDLED.load(Ordering::Relaxed),
        interactions_rejected_busy: INTERACTIONS_REJECTED_BUSY.load(Ordering::Relaxed),
        interactions_expired: INTERACTIONS_EXPIRED.load(Ordering::Relaxed),
        component_rebuilds: COMPONENT_REBUILDS.load(Ordering::Relaxed),
        send_failures: SEND_FAILURES.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_only_grow() {
        let before = snapshot();
        inc_entries_created();
        inc_component_rebuilds();
        add_entries_evicted(0);
        let after = snapshot();
        assert!(after.entries_created > before.entries_created);
        assert!(after.component_rebuilds > before.component_rebuilds);
        assert!(after.entries_evicted >= before.entries_evicted);
    }

    #[test]
    fn action_counts_accumulate() {
        let first = record_action("unit-test-action");
        let second = record_action("unit-test-action");
        assert_eq!(second, first + 1);
        assert_eq!(
            action_counters_snapshot().get("unit-test-action").copied(),
            Some(second)
        );
    }
}
