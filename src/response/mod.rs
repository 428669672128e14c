//! # Response model
//!
//! Everything a single interactive message is made of, independent of any transport.
//!
//! ## Components
//!
//! - [`option`] / [`component`] / [`embed`]: the logical UI vocabulary (select options,
//!   buttons, menus, modals, embeds).
//! - [`item`] / [`item_handler`]: the paginated item area of a page, with sorting, filters
//!   and search.
//! - [`history`]: identifier-path navigation over any tree of [`history::Subpages`].
//! - [`page`]: one screen; also owns a second tree over its page items.
//! - [`tree`]: the [`Response`] orchestrator that renders paging controls and payloads.
//! - [`action`]: decoding control interactions into [`PageAction`]s.
//!
//! ## Architecture
//!
//! ```text
//! Response ── HistoryHandler<Page> ──> Page ── ItemHandler (own items)
//!                                        │
//!                                        └── HistoryHandler<Item> ──> Item::Page ── ItemHandler
//! ```
//!
//! Each handler keeps a [`generation::Generation`]; the response memoizes its paging rows
//! against the three generations in play and rebuilds them only when one of them moves.

pub mod action;
pub mod component;
pub mod embed;
pub mod filter;
pub mod generation;
pub mod history;
pub mod item;
pub mod item_handler;
pub mod option;
pub mod page;
pub mod sorter;
pub mod tree;

pub use action::PageAction;
pub use component::{ActionRow, Button, Component, MenuKind, Modal, PagingButton, SelectMenu};
pub use embed::{Embed, Field};
pub use filter::{Filter, Search};
pub use history::{HistoryHandler, Subpages};
pub use item::{Item, ItemKind};
pub use item_handler::{FieldStyle, ItemHandler};
pub use option::{Emoji, SelectOption};
pub use page::Page;
pub use sorter::{SortOrder, Sorter};
pub use tree::{AllowedMentions, Attachment, MessagePayload, Response, ResponseBuilder};
