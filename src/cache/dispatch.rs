//! Interaction routing: from an inbound control event to an edited message.
//!
//! Every interaction runs the same sequence against one entry:
//!
//! ```text
//! resolve -> try_acquire -> set_busy -> apply actions -> render (if modified)
//!         -> edit message -> commit (update_last_interact)
//! ```
//!
//! The commit happens strictly after the outbound edit succeeded. A failed edit releases the
//! entry without committing, so the next interaction still sees it as modified.

use std::future::Future;
use std::ops::{Deref, DerefMut};

use log::{debug, info, warn};

use super::{EntryGuard, EntryState, ResponseCache, SharedEntry};
use crate::errors::{CacheError, DispatchError, NavigationError};
use crate::logutil::escape_log;
use crate::metrics;
use crate::response::component::PagingButton;
use crate::response::{MessagePayload, Modal, PageAction, Response};
use crate::snowflake::Snowflake;

use super::entry::Entry;

/// Outbound side of the chat platform.
pub trait MessageSink: Send + Sync {
    /// Post a new message and return its id.
    fn create_message(
        &self,
        channel: Snowflake,
        payload: &MessagePayload,
    ) -> impl Future<Output = anyhow::Result<Snowflake>> + Send;

    fn edit_message(
        &self,
        channel: Snowflake,
        message: Snowflake,
        payload: &MessagePayload,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Answer the interaction on `message` with a modal popup.
    fn present_modal(
        &self,
        channel: Snowflake,
        message: Snowflake,
        modal: &Modal,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionKind {
    Button { custom_id: String },
    Select { custom_id: String, values: Vec<String> },
    ModalSubmit { custom_id: String, inputs: Vec<(String, String)> },
}

impl InteractionKind {
    pub fn custom_id(&self) -> &str {
        match self {
            InteractionKind::Button { custom_id }
            | InteractionKind::Select { custom_id, .. }
            | InteractionKind::ModalSubmit { custom_id, .. } => custom_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
    pub user_id: Snowflake,
    pub kind: InteractionKind,
}

impl Interaction {
    pub fn button(
        channel_id: Snowflake,
        message_id: Snowflake,
        user_id: Snowflake,
        custom_id: impl Into<String>,
    ) -> Self {
        Self {
            channel_id,
            message_id,
            user_id,
            kind: InteractionKind::Button {
                custom_id: custom_id.into(),
            },
        }
    }

    pub fn select(
        channel_id: Snowflake,
        message_id: Snowflake,
        user_id: Snowflake,
        custom_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            channel_id,
            message_id,
            user_id,
            kind: InteractionKind::Select {
                custom_id: custom_id.into(),
                values: vec![value.into()],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The message was re-rendered and edited.
    Edited,
    /// The interaction changed nothing visible; no request was sent.
    Unchanged,
    ModalPresented,
    /// Not a paging control; left for the caller's own handlers.
    Unhandled(String),
}

fn target_response<'a>(
    entry: &'a mut Entry,
    followup: Option<&str>,
) -> Result<&'a mut Response, CacheError> {
    match followup {
        None => Ok(entry.response_mut()),
        Some(id) => entry
            .find_followup_mut(id)
            .map(|f| f.response_mut())
            .ok_or_else(|| CacheError::FollowupNotFound(id.to_string())),
    }
}

fn is_modified(entry: &Entry, followup: Option<&str>) -> bool {
    match followup.and_then(|id| entry.find_followup(id)) {
        Some(f) => f.is_modified(),
        None => entry.is_modified(),
    }
}

/// A held entry marked `Busy` for the length of one interaction.
///
/// Dropping the claim hands a still-busy entry back as idle without committing, so a
/// dispatch future cancelled mid-send leaves the entry sweepable.
struct BusyClaim(EntryGuard);

impl Deref for BusyClaim {
    type Target = Entry;

    fn deref(&self) -> &Entry {
        &self.0
    }
}

impl DerefMut for BusyClaim {
    fn deref_mut(&mut self) -> &mut Entry {
        &mut self.0
    }
}

impl Drop for BusyClaim {
    fn drop(&mut self) {
        if self.0.state() == EntryState::Busy {
            self.0.release();
        }
    }
}

/// Handle one control interaction against the cache.
pub async fn dispatch<S: MessageSink>(
    cache: &ResponseCache,
    sink: &S,
    interaction: Interaction,
) -> Result<Outcome, DispatchError> {
    let resolved = cache
        .resolve(
            interaction.channel_id,
            interaction.message_id,
            interaction.user_id,
        )
        .map_err(|err| {
            if err.is_expired() {
                metrics::inc_interactions_expired();
                info!(
                    target: "cache",
                    "interaction on expired message channel={} message={}",
                    interaction.channel_id, interaction.message_id
                );
            }
            err
        })?;
    let mut entry = cache.try_acquire(&resolved.entry).map_err(|err| {
        metrics::inc_interactions_rejected_busy();
        debug!(
            target: "cache",
            "rejecting interaction on busy message={}",
            interaction.message_id
        );
        err
    })?;
    if !entry.set_busy() {
        metrics::inc_interactions_rejected_busy();
        debug!(
            target: "cache",
            "rejecting interaction on message={} while {:?}",
            interaction.message_id,
            entry.state()
        );
        return Err(CacheError::Busy.into());
    }
    let mut entry = BusyClaim(entry);

    let followup = resolved.followup.as_deref();
    let result = handle(&mut entry, followup, sink, &interaction).await;
    metrics::inc_interactions_handled();
    result
}

async fn handle<S: MessageSink>(
    entry: &mut Entry,
    followup: Option<&str>,
    sink: &S,
    interaction: &Interaction,
) -> Result<Outcome, DispatchError> {
    let channel = interaction.channel_id;
    let message = interaction.message_id;
    let actions: Vec<PageAction> = match &interaction.kind {
        InteractionKind::Button { custom_id } if custom_id == PagingButton::Search.custom_id() => {
            let modal = target_response(entry, followup)?.search_modal()?;
            if let Some(stale) = entry.clear_modal() {
                debug!(target: "cache", "replacing unanswered modal {}", stale);
            }
            entry.set_active_modal(modal.custom_id.clone())?;
            if let Err(err) = sink.present_modal(channel, message, &modal).await {
                entry.clear_modal();
                metrics::inc_send_failures();
                return Err(DispatchError::send(err));
            }
            entry.update_last_interact();
            return Ok(Outcome::ModalPresented);
        }
        InteractionKind::Button { custom_id } => {
            PageAction::from_button(custom_id).into_iter().collect()
        }
        InteractionKind::Select { custom_id, values } => {
            PageAction::from_selection(custom_id, values).into_iter().collect()
        }
        InteractionKind::ModalSubmit { custom_id, inputs } => {
            if entry.active_modal() != Some(custom_id.as_str()) {
                return Err(DispatchError::StaleModal(custom_id.clone()));
            }
            entry.clear_modal();
            PageAction::from_modal(inputs)
        }
    };
    if actions.is_empty() {
        if let InteractionKind::ModalSubmit { .. } = interaction.kind {
            entry.update_last_interact();
            return Ok(Outcome::Unchanged);
        }
        return Ok(Outcome::Unhandled(interaction.kind.custom_id().to_string()));
    }

    let response = target_response(entry, followup)?;
    for action in actions {
        match response.apply(action) {
            Ok(_) => {}
            Err(err @ NavigationError::StaleHistory { .. }) => {
                warn!(target: "nav", "stale history on message={}: {}", message, err);
                response.history_mut().goto_root()?;
            }
            Err(err) => {
                warn!(
                    target: "nav",
                    "ignoring control on message={}: {}",
                    message,
                    escape_log(&err.to_string())
                );
            }
        }
    }

    if !is_modified(entry, followup) {
        entry.update_last_interact();
        return Ok(Outcome::Unchanged);
    }
    let payload = target_response(entry, followup)?.render()?;
    if let Err(err) = sink.edit_message(channel, message, &payload).await {
        metrics::inc_send_failures();
        warn!(target: "cache", "edit failed for message={}: {:#}", message, err);
        return Err(DispatchError::send(err));
    }
    if let Some(id) = followup {
        entry.commit_followup(id)?;
    }
    entry.update_last_interact();
    Ok(Outcome::Edited)
}

/// Send `response` as a new message and register it. Returns the message id.
pub async fn send_response<S: MessageSink>(
    cache: &ResponseCache,
    sink: &S,
    channel: Snowflake,
    user: Snowflake,
    mut response: Response,
) -> Result<Snowflake, DispatchError> {
    let payload = response.render()?;
    let message = sink.create_message(channel, &payload).await.map_err(|err| {
        metrics::inc_send_failures();
        DispatchError::send(err)
    })?;
    let shared = cache.create_and_get(channel, user, message, response)?;
    let mut entry = shared.lock_owned().await;
    entry.set_loaded();
    entry.update_last_interact();
    info!(
        target: "cache",
        "response sent channel={} message={} user={}",
        channel, message, user
    );
    Ok(message)
}

/// Send `response` as a followup of `parent` under `identifier`. Returns the message id.
pub async fn send_followup<S: MessageSink>(
    cache: &ResponseCache,
    sink: &S,
    parent: &SharedEntry,
    identifier: &str,
    mut response: Response,
) -> Result<Snowflake, DispatchError> {
    let mut entry = cache.try_acquire(parent)?;
    if entry.contains_followup(identifier) {
        return Err(CacheError::FollowupExists(identifier.to_string()).into());
    }
    let payload = response.render()?;
    let message = sink
        .create_message(entry.channel_id(), &payload)
        .await
        .map_err(|err| {
            metrics::inc_send_failures();
            DispatchError::send(err)
        })?;
    cache.add_followup(&mut entry, identifier, message, response)?;
    Ok(message)
}
