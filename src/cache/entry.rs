use std::sync::Arc;

use log::debug;

use super::clock::Clock;
use crate::errors::CacheError;
use crate::response::Response;
use crate::snowflake::Snowflake;

/// Liveness state of a cached entry.
///
/// `Loading` covers the window between registering a freshly sent message and its first
/// commit. `Busy` is held while an interaction is being processed. Both keep the entry alive
/// regardless of its idle timer; expiry only applies to `Idle` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Loading,
    Busy,
    Idle,
}

fn expires_at(last_interact: i64, response: &Response) -> i64 {
    last_interact.saturating_add(i64::from(response.time_to_live()) * 1000)
}

/// A secondary message spawned from an entry's interaction flow.
#[derive(Debug, Clone)]
pub struct Followup {
    identifier: String,
    channel_id: Snowflake,
    user_id: Snowflake,
    message_id: Snowflake,
    response: Response,
    committed: Response,
    last_interact: i64,
}

impl Followup {
    pub(crate) fn new(
        identifier: String,
        channel_id: Snowflake,
        user_id: Snowflake,
        message_id: Snowflake,
        mut response: Response,
        now: i64,
    ) -> Self {
        response.set_no_cache_update_required();
        Self {
            identifier,
            channel_id,
            user_id,
            message_id,
            committed: response.clone(),
            response,
            last_interact: now,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn channel_id(&self) -> Snowflake {
        self.channel_id
    }

    pub fn user_id(&self) -> Snowflake {
        self.user_id
    }

    pub fn message_id(&self) -> Snowflake {
        self.message_id
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn update_response(&mut self, response: Response) {
        self.response = response;
    }

    pub fn is_modified(&self) -> bool {
        self.response != self.committed || self.response.is_cache_update_required()
    }

    pub fn last_interact(&self) -> i64 {
        self.last_interact
    }

    pub fn is_active_at(&self, now: i64) -> bool {
        now < expires_at(self.last_interact, &self.response)
    }

    pub(crate) fn commit(&mut self, now: i64) {
        self.response.set_no_cache_update_required();
        self.committed = self.response.clone();
        self.last_interact = now;
    }
}

/// The cache record binding one live message to its response.
#[derive(Debug)]
pub struct Entry {
    channel_id: Snowflake,
    user_id: Snowflake,
    message_id: Snowflake,
    response: Response,
    committed: Response,
    state: EntryState,
    deferred: bool,
    last_interact: i64,
    followups: Vec<Followup>,
    active_modal: Option<String>,
    clock: Arc<dyn Clock>,
}

impl Entry {
    pub(crate) fn new(
        channel_id: Snowflake,
        user_id: Snowflake,
        message_id: Snowflake,
        response: Response,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now_millis();
        Self {
            channel_id,
            user_id,
            message_id,
            committed: response.clone(),
            response,
            state: EntryState::Loading,
            deferred: false,
            last_interact: now,
            followups: Vec::new(),
            active_modal: None,
            clock,
        }
    }

    pub fn channel_id(&self) -> Snowflake {
        self.channel_id
    }

    pub fn user_id(&self) -> Snowflake {
        self.user_id
    }

    pub fn message_id(&self) -> Snowflake {
        self.message_id
    }

    /// The live response that interactions mutate.
    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// The response as of the last successful send.
    pub fn committed_response(&self) -> &Response {
        &self.committed
    }

    pub fn update_response(&mut self, response: Response) {
        self.response = response;
    }

    /// The live response differs from the committed one, or has paging rows to rebuild.
    pub fn is_modified(&self) -> bool {
        self.response != self.committed || self.response.is_cache_update_required()
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state != EntryState::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.state == EntryState::Loading
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    pub fn last_interact(&self) -> i64 {
        self.last_interact
    }

    pub fn expires_at(&self) -> i64 {
        expires_at(self.last_interact, &self.response)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(self.clock.now_millis())
    }

    pub fn is_active_at(&self, now: i64) -> bool {
        self.is_busy() || now < self.expires_at()
    }

    /// `Idle -> Busy`. Returns false when the entry was not idle.
    pub fn set_busy(&mut self) -> bool {
        if self.state != EntryState::Idle {
            return false;
        }
        self.state = EntryState::Busy;
        true
    }

    /// `Loading -> Busy`, once the message exists on the platform.
    pub fn set_loaded(&mut self) {
        if self.state == EntryState::Loading {
            self.state = EntryState::Busy;
        }
    }

    /// The platform was told a reply is coming later.
    pub fn set_deferred(&mut self) {
        self.deferred = true;
    }

    /// Commit the live response as the new baseline and go idle.
    pub fn update_last_interact(&mut self) {
        self.response.set_no_cache_update_required();
        self.committed = self.response.clone();
        self.state = EntryState::Idle;
        self.deferred = false;
        self.last_interact = self.clock.now_millis();
        debug!(
            target: "cache",
            "entry channel={} message={} idle until {}",
            self.channel_id,
            self.message_id,
            self.expires_at()
        );
    }

    /// Give the entry back without committing, after a failed send.
    pub fn release(&mut self) {
        if self.state == EntryState::Busy {
            self.state = EntryState::Idle;
        }
        self.deferred = false;
    }

    pub fn followups(&self) -> &[Followup] {
        &self.followups
    }

    pub fn find_followup(&self, identifier: &str) -> Option<&Followup> {
        self.followups.iter().find(|f| f.identifier == identifier)
    }

    pub fn find_followup_by_message(&self, message: Snowflake) -> Option<&Followup> {
        self.followups.iter().find(|f| f.message_id == message)
    }

    pub fn find_followup_mut(&mut self, identifier: &str) -> Option<&mut Followup> {
        self.followups.iter_mut().find(|f| f.identifier == identifier)
    }

    pub fn contains_followup(&self, identifier: &str) -> bool {
        self.find_followup(identifier).is_some()
    }

    pub(crate) fn push_followup(&mut self, followup: Followup) -> Result<(), CacheError> {
        if self.contains_followup(&followup.identifier) {
            return Err(CacheError::FollowupExists(followup.identifier));
        }
        self.followups.push(followup);
        Ok(())
    }

    pub(crate) fn take_followup(&mut self, identifier: &str) -> Option<Followup> {
        let pos = self.followups.iter().position(|f| f.identifier == identifier)?;
        Some(self.followups.remove(pos))
    }

    pub(crate) fn commit_followup(&mut self, identifier: &str) -> Result<(), CacheError> {
        let now = self.clock.now_millis();
        self.find_followup_mut(identifier)
            .ok_or_else(|| CacheError::FollowupNotFound(identifier.to_string()))?
            .commit(now);
        Ok(())
    }

    /// Drop followups whose idle timer ran out; returns what was removed.
    pub(crate) fn prune_followups(&mut self, now: i64) -> Vec<Followup> {
        let (kept, expired): (Vec<Followup>, Vec<Followup>) = std::mem::take(&mut self.followups)
            .into_iter()
            .partition(|f| f.is_active_at(now));
        self.followups = kept;
        expired
    }

    pub fn active_modal(&self) -> Option<&str> {
        self.active_modal.as_deref()
    }

    /// Only one modal may be awaiting submission; clear the previous one first.
    pub fn set_active_modal(&mut self, id: impl Into<String>) -> Result<(), CacheError> {
        if let Some(current) = &self.active_modal {
            return Err(CacheError::ModalInFlight(current.clone()));
        }
        self.active_modal = Some(id.into());
        Ok(())
    }

    pub fn clear_modal(&mut self) -> Option<String> {
        self.active_modal.take()
    }
}
