//! # Response cache
//!
//! Process-wide registry mapping live messages to their [`Entry`].
//!
//! Each entry sits behind its own `tokio::sync::Mutex`; an interaction must win
//! [`ResponseCache::try_acquire`] before touching it, so two interactions on the same message
//! can never interleave. The registry maps themselves are guarded by short, non-async
//! `std::sync::Mutex` sections.
//!
//! ```text
//! (channel, message) ──> Slot { user, Arc<Mutex<Entry>> }
//! (channel, followup message) ──> FollowupRef { parent key, identifier }
//! ```
//!
//! [`sweeper`] runs [`ResponseCache::sweep`] periodically; [`dispatch`] routes interactions.

pub mod clock;
pub mod dispatch;
pub mod entry;
pub mod sweeper;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::errors::CacheError;
use crate::metrics;
use crate::response::Response;
use crate::snowflake::Snowflake;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{Entry, EntryState, Followup};

pub type SharedEntry = Arc<tokio::sync::Mutex<Entry>>;
pub type EntryGuard = OwnedMutexGuard<Entry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
}

impl EntryKey {
    pub fn new(channel_id: Snowflake, message_id: Snowflake) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }
}

#[derive(Debug)]
struct Slot {
    user_id: Snowflake,
    entry: SharedEntry,
}

#[derive(Debug, Clone)]
struct FollowupRef {
    parent: EntryKey,
    identifier: String,
    user_id: Snowflake,
}

/// A lookup hit: the entry to lock, and the followup the message belongs to, if any.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub key: EntryKey,
    pub entry: SharedEntry,
    pub followup: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: usize,
    pub followups_pruned: usize,
    pub remaining: usize,
    /// Entries skipped because an interaction held them.
    pub in_use: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct ResponseCache {
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<EntryKey, Slot>>,
    followups: Mutex<HashMap<EntryKey, FollowupRef>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slots: Mutex::new(HashMap::new()),
            followups: Mutex::new(HashMap::new()),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a freshly sent message. The new entry starts in `Loading`.
    pub fn create_and_get(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
        message_id: Snowflake,
        response: Response,
    ) -> Result<SharedEntry, CacheError> {
        let key = EntryKey::new(channel_id, message_id);
        let mut slots = lock(&self.slots);
        if slots.contains_key(&key) {
            return Err(CacheError::Duplicate {
                channel: channel_id,
                message: message_id,
            });
        }
        let entry = Entry::new(
            channel_id,
            user_id,
            message_id,
            response,
            Arc::clone(&self.clock),
        );
        let shared: SharedEntry = Arc::new(tokio::sync::Mutex::new(entry));
        slots.insert(
            key,
            Slot {
                user_id,
                entry: Arc::clone(&shared),
            },
        );
        metrics::inc_entries_created();
        debug!(
            target: "cache",
            "entry created channel={} message={} user={} live={}",
            channel_id,
            message_id,
            user_id,
            slots.len()
        );
        Ok(shared)
    }

    pub fn get(&self, channel_id: Snowflake, message_id: Snowflake) -> Option<SharedEntry> {
        lock(&self.slots)
            .get(&EntryKey::new(channel_id, message_id))
            .map(|slot| Arc::clone(&slot.entry))
    }

    /// Locate the entry whose live response carries `unique_id`. Waits for busy entries.
    pub async fn find_by_unique_id(&self, unique_id: Uuid) -> Option<SharedEntry> {
        let candidates: Vec<SharedEntry> = lock(&self.slots)
            .values()
            .map(|slot| Arc::clone(&slot.entry))
            .collect();
        for shared in candidates {
            if shared.lock().await.response().unique_id() == unique_id {
                return Some(shared);
            }
        }
        None
    }

    /// Find the entry an interaction on `message` belongs to, either directly or through
    /// one of its followups. Only the user the message was sent for may interact.
    pub fn resolve(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        user_id: Snowflake,
    ) -> Result<Resolved, CacheError> {
        let key = EntryKey::new(channel_id, message_id);
        let not_found = CacheError::NotFound {
            channel: channel_id,
            message: message_id,
        };
        let slots = lock(&self.slots);
        if let Some(slot) = slots.get(&key) {
            if slot.user_id != user_id {
                return Err(CacheError::NotOwner {
                    message: message_id,
                    user: user_id,
                });
            }
            return Ok(Resolved {
                key,
                entry: Arc::clone(&slot.entry),
                followup: None,
            });
        }
        let reference = lock(&self.followups).get(&key).cloned().ok_or(not_found.clone())?;
        if reference.user_id != user_id {
            return Err(CacheError::NotOwner {
                message: message_id,
                user: user_id,
            });
        }
        let parent = slots.get(&reference.parent).ok_or(not_found)?;
        Ok(Resolved {
            key: reference.parent,
            entry: Arc::clone(&parent.entry),
            followup: Some(reference.identifier),
        })
    }

    /// Claim exclusive use of an entry, failing fast if another interaction holds it.
    pub fn try_acquire(&self, entry: &SharedEntry) -> Result<EntryGuard, CacheError> {
        Arc::clone(entry)
            .try_lock_owned()
            .map_err(|_| CacheError::Busy)
    }

    /// Attach a followup message to a held entry and index it for lookups.
    pub fn add_followup(
        &self,
        entry: &mut Entry,
        identifier: impl Into<String>,
        message_id: Snowflake,
        response: Response,
    ) -> Result<(), CacheError> {
        let identifier = identifier.into();
        let followup = Followup::new(
            identifier.clone(),
            entry.channel_id(),
            entry.user_id(),
            message_id,
            response,
            self.clock.now_millis(),
        );
        entry.push_followup(followup)?;
        lock(&self.followups).insert(
            EntryKey::new(entry.channel_id(), message_id),
            FollowupRef {
                parent: EntryKey::new(entry.channel_id(), entry.message_id()),
                identifier: identifier.clone(),
                user_id: entry.user_id(),
            },
        );
        debug!(
            target: "cache",
            "followup '{}' added to message={} as message={}",
            identifier,
            entry.message_id(),
            message_id
        );
        Ok(())
    }

    pub fn remove_followup(
        &self,
        entry: &mut Entry,
        identifier: &str,
    ) -> Result<Followup, CacheError> {
        let followup = entry
            .take_followup(identifier)
            .ok_or_else(|| CacheError::FollowupNotFound(identifier.to_string()))?;
        lock(&self.followups).remove(&EntryKey::new(followup.channel_id(), followup.message_id()));
        Ok(followup)
    }

    /// Drop an entry and every followup index pointing at it.
    pub fn remove(&self, channel_id: Snowflake, message_id: Snowflake) -> Option<SharedEntry> {
        let key = EntryKey::new(channel_id, message_id);
        let slot = lock(&self.slots).remove(&key)?;
        lock(&self.followups).retain(|_, reference| reference.parent != key);
        Some(slot.entry)
    }

    /// Evict inactive entries and prune expired followups of the ones that stay.
    ///
    /// Entries currently held by an interaction are skipped; they are busy and therefore
    /// active anyway.
    pub fn sweep(&self) -> SweepReport {
        let now = self.clock.now_millis();
        let mut report = SweepReport::default();
        let mut dead_followups: HashSet<EntryKey> = HashSet::new();
        let mut evicted: HashSet<EntryKey> = HashSet::new();
        {
            let mut slots = lock(&self.slots);
            slots.retain(|key, slot| {
                let Ok(mut entry) = slot.entry.try_lock() else {
                    report.in_use += 1;
                    return true;
                };
                if entry.is_active_at(now) {
                    for followup in entry.prune_followups(now) {
                        report.followups_pruned += 1;
                        dead_followups
                            .insert(EntryKey::new(followup.channel_id(), followup.message_id()));
                    }
                    true
                } else {
                    evicted.insert(*key);
                    false
                }
            });
            report.remaining = slots.len();
        }
        report.evicted = evicted.len();
        if !dead_followups.is_empty() || !evicted.is_empty() {
            lock(&self.followups).retain(|key, reference| {
                !dead_followups.contains(key) && !evicted.contains(&reference.parent)
            });
        }
        metrics::add_entries_evicted(report.evicted as u64);
        metrics::add_followups_pruned(report.followups_pruned as u64);
        if report.evicted > 0 || report.followups_pruned > 0 {
            info!(
                target: "cache",
                "sweep evicted={} followups_pruned={} remaining={} in_use={}",
                report.evicted,
                report.followups_pruned,
                report.remaining,
                report.in_use
            );
        } else {
            debug!(target: "cache", "sweep remaining={} in_use={}", report.remaining, report.in_use);
        }
        report
    }
}
