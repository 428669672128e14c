use thiserror::Error;

use crate::snowflake::Snowflake;

/// Failures raised by page tree transitions.
///
/// None of these are fatal: the caller can always fall back to the first root page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    /// No root page matches the identifier.
    #[error("unable to locate page identified by '{0}'")]
    PageNotFound(String),

    /// The current page has no child matching the identifier.
    #[error("unable to locate subpage identified by '{0}'")]
    SubPageNotFound(String),

    /// A stored identifier path no longer resolves against the tree.
    #[error("stale history: '{missing}' is no longer reachable along {path:?}")]
    StaleHistory { path: Vec<String>, missing: String },

    /// The tree has no root pages at all.
    #[error("page tree is empty")]
    EmptyTree,
}

/// Raised by `build()` calls when a builder was given an unusable combination of fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A sorter needs at least one comparator.
    #[error("comparators cannot be empty")]
    EmptySorter,

    /// Two sibling pages share the same option value.
    #[error("duplicate page identifier '{0}'")]
    DuplicatePage(String),

    /// A response needs at least one root page.
    #[error("a response requires at least one page")]
    NoPages,

    /// A required builder field was never set.
    #[error("missing required builder field: {0}")]
    MissingField(&'static str),
}

/// Errors produced by the response cache registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// Nothing is cached for the message (never sent, or already evicted).
    #[error("no cached response for channel {channel} message {message}")]
    NotFound { channel: Snowflake, message: Snowflake },

    /// The message belongs to a different user.
    #[error("message {message} is not owned by user {user}")]
    NotOwner { message: Snowflake, user: Snowflake },

    /// Another interaction currently holds the entry.
    #[error("response entry is busy")]
    Busy,

    /// An entry is already registered for the message.
    #[error("an entry already exists for channel {channel} message {message}")]
    Duplicate { channel: Snowflake, message: Snowflake },

    /// A modal is still awaiting submission and must be cleared first.
    #[error("modal '{0}' is still awaiting submission")]
    ModalInFlight(String),

    /// A followup with the identifier already exists on the entry.
    #[error("followup '{0}' already exists")]
    FollowupExists(String),

    /// No followup with the identifier exists on the entry.
    #[error("followup '{0}' not found")]
    FollowupNotFound(String),
}

impl CacheError {
    /// Whether the caller should show the user a "this menu has expired" notice.
    pub fn is_expired(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }
}

/// Errors surfaced while routing an interaction through a cached response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Lookup or locking of the cache entry failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A navigation transition failed and could not be recovered.
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// A modal submission did not match the entry's active modal.
    #[error("modal submission '{0}' does not match the active modal")]
    StaleModal(String),

    /// The outbound create/edit request failed; nothing was committed.
    #[error("failed to deliver message: {0}")]
    Send(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DispatchError {
    pub(crate) fn send(err: anyhow::Error) -> Self {
        DispatchError::Send(err.into())
    }
}
