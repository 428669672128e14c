//! # Chatpager - paginated, navigable chat responses
//!
//! Chatpager turns a tree of pages into a single interactive chat message. Users move through
//! the tree with select menus, page through long item lists with buttons, and search through a
//! modal. Each sent message is tracked in a cache until it has been idle for its time-to-live.
//!
//! ## Features
//!
//! - **Page trees**: root pages with nested subpages, a page selector and a subpage selector
//!   with a Back option, navigated by identifier path.
//! - **Item paging**: sortable, filterable, searchable item lists with a bounded window size and
//!   an optional item editor that opens nested item pages.
//! - **Dirty tracking**: generation counters decide when a message needs to be re-rendered and
//!   when the cached paging controls must be rebuilt.
//! - **Response cache**: one entry per sent message, guarded so two interactions on the same
//!   message never interleave, plus followup messages that share the parent's lifetime.
//! - **Sweeper**: a background task evicting idle entries on a fixed interval.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatpager::response::{Page, Response};
//!
//! # fn main() -> Result<(), chatpager::errors::ConfigurationError> {
//! let mut response = Response::builder()
//!     .with_page(Page::builder().with_value("home").with_content("Hello").build()?)
//!     .build()?;
//! let payload = response.render().expect("root page renders");
//! assert_eq!(payload.content.as_deref(), Some("Hello"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`response`] - pages, items, paging controls and rendering
//! - [`cache`] - live entries, interaction dispatch and the sweeper
//! - [`config`] - TOML configuration
//! - [`errors`] - error types shared across modules
//! - [`metrics`] - process-wide counters
//! - [`demo`] - console driver behind `chatpager demo`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Interaction    │ ← button / select / modal submit
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  ResponseCache  │ ← resolve, acquire, dispatch
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Response tree  │ ← navigate, render
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  MessageSink    │ ← edit the chat message
//! └─────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod demo;
pub mod errors;
pub mod logutil;
pub mod metrics;
pub mod response;
pub mod snowflake;

pub use cache::dispatch::{dispatch, Interaction, MessageSink, Outcome};
pub use cache::ResponseCache;
pub use errors::{CacheError, ConfigurationError, DispatchError, NavigationError};
pub use response::{Page, Response, ResponseBuilder};
pub use snowflake::Snowflake;
