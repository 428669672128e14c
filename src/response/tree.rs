use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action::PageAction;
use super::component::{
    ActionRow, Button, Component, MenuKind, Modal, PagingButton, SelectMenu, BACK_VALUE,
    MAX_ACTION_ROWS,
};
use super::embed::Embed;
use super::history::HistoryHandler;
use super::item_handler::ItemHandler;
use super::option::{Emoji, SelectOption};
use super::page::Page;
use crate::config::ResponseConfig;
use crate::errors::{ConfigurationError, NavigationError};
use crate::logutil::{escape_log, format_path};
use crate::metrics;
use crate::snowflake::Snowflake;

pub const MIN_TIME_TO_LIVE: u32 = 5;
pub const MAX_TIME_TO_LIVE: u32 = 300;
pub const DEFAULT_TIME_TO_LIVE: u32 = 10;

pub const PAGE_SELECTOR_PLACEHOLDER: &str = "Select a page.";
pub const SUBPAGE_SELECTOR_PLACEHOLDER: &str = "Select a subpage.";
pub const ITEM_EDITOR_PLACEHOLDER: &str = "Select an item to edit.";
/// Modal inputs are capped by the platform.
const MAX_MODAL_INPUTS: usize = 5;

/// A file sent along with the message. Only the name travels in serialised payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    #[serde(default)]
    pub spoiler: bool,
}

impl Attachment {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            spoiler: false,
        }
    }

    pub fn spoiler(mut self) -> Self {
        self.spoiler = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedMentions {
    pub everyone: bool,
    pub users: bool,
    pub roles: bool,
    pub replied_user: bool,
}

impl AllowedMentions {
    pub fn all() -> Self {
        Self {
            everyone: true,
            users: true,
            roles: true,
            replied_user: true,
        }
    }
}

/// Logical outbound message: what the transport layer turns into a create or edit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePayload {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub components: Vec<ActionRow>,
    pub attachments: Vec<Attachment>,
    pub reactions: Vec<Emoji>,
    pub ephemeral: bool,
    pub allowed_mentions: AllowedMentions,
    pub reference_id: Option<Snowflake>,
}

/// Generations the cached paging rows were built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderStamp {
    tree: u64,
    item_tree: u64,
    items: u64,
}

/// A page tree bound to one message, plus everything needed to render it.
///
/// The identity (`unique_id`) survives [`Response::mutate`], so an edited copy still
/// compares as the same response for cache lookups.
#[derive(Debug, Clone)]
pub struct Response {
    unique_id: Uuid,
    build_time: DateTime<Utc>,
    reference_id: Option<Snowflake>,
    allowed_mentions: AllowedMentions,
    time_to_live: u32,
    ephemeral: bool,
    rendering_paging_components: bool,
    attachments: Vec<Attachment>,
    history: HistoryHandler<Page>,
    cached_components: Vec<ActionRow>,
    cached_stamp: Option<RenderStamp>,
}

impl PartialEq for Response {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id == other.unique_id
            && self.reference_id == other.reference_id
            && self.allowed_mentions == other.allowed_mentions
            && self.time_to_live == other.time_to_live
            && self.ephemeral == other.ephemeral
            && self.rendering_paging_components == other.rendering_paging_components
            && self.attachments == other.attachments
            && self.history == other.history
    }
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    /// Copy-on-write editing: a builder seeded with this response's pages, identity,
    /// identifier path and item window.
    pub fn mutate(&self) -> ResponseBuilder {
        ResponseBuilder {
            unique_id: Some(self.unique_id),
            reference_id: self.reference_id,
            allowed_mentions: self.allowed_mentions,
            time_to_live: self.time_to_live,
            ephemeral: self.ephemeral,
            rendering_paging_components: self.rendering_paging_components,
            attachments: self.attachments.clone(),
            pages: self.history.pages().to_vec(),
            default_page: None,
            page_history: self.history.identifier_history(),
            item_page: self
                .current_page()
                .ok()
                .map(|page| page.item_handler().current_index() as i64),
        }
    }

    pub fn unique_id(&self) -> Uuid {
        self.unique_id
    }

    pub fn build_time(&self) -> DateTime<Utc> {
        self.build_time
    }

    pub fn reference_id(&self) -> Option<Snowflake> {
        self.reference_id
    }

    pub fn allowed_mentions(&self) -> AllowedMentions {
        self.allowed_mentions
    }

    /// Idle lifetime in seconds.
    pub fn time_to_live(&self) -> u32 {
        self.time_to_live
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub fn is_rendering_paging_components(&self) -> bool {
        self.rendering_paging_components
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn history(&self) -> &HistoryHandler<Page> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryHandler<Page> {
        &mut self.history
    }

    pub fn current_page(&self) -> Result<&Page, NavigationError> {
        self.history.current_page()
    }

    pub fn current_page_mut(&mut self) -> Result<&mut Page, NavigationError> {
        self.history.current_page_mut()
    }

    /// Replace the current page with an edited copy. The replacement should keep the same
    /// option value, otherwise the path goes stale and the next render falls back to root.
    pub fn edit_current_page<F>(&mut self, edit: F) -> Result<(), NavigationError>
    where
        F: FnOnce(&Page) -> Page,
    {
        let page = self.history.current_page_mut()?;
        *page = edit(page);
        self.history.touch();
        Ok(())
    }

    /// Mutate the current page's own items.
    pub fn edit_current_items<R>(
        &mut self,
        edit: impl FnOnce(&mut ItemHandler) -> R,
    ) -> Result<R, NavigationError> {
        Ok(self.history.current_page_mut()?.edit_items(edit))
    }

    /// Apply one decoded control interaction. Returns whether anything visible changed.
    pub fn apply(&mut self, action: PageAction) -> Result<bool, NavigationError> {
        metrics::record_action(action.kind());
        debug!(
            target: "nav",
            "response={} action={}",
            self.unique_id,
            escape_log(&format!("{:?}", action))
        );
        let changed = match action {
            PageAction::SelectPage(id) => {
                self.history.goto_top_level_page(&id)?;
                true
            }
            PageAction::SelectSubPage(id) => {
                self.history.goto_sub_page(&id)?;
                true
            }
            PageAction::Back => self.go_back()?,
            PageAction::PreviousItems => self.active_items_mut()?.previous_page(),
            PageAction::NextItems => self.active_items_mut()?.next_page(),
            PageAction::FirstItems => self.active_items_mut()?.first_page(),
            PageAction::LastItems => self.active_items_mut()?.last_page(),
            PageAction::GotoItems(page) => self.active_items_mut()?.goto_page(page),
            PageAction::NextSorter => self.active_items_mut()?.next_sorter(),
            PageAction::InvertOrder => {
                self.active_items_mut()?.invert_order();
                true
            }
            PageAction::Search { input, query } => {
                self.active_items_mut()?.search(&input, &query)
            }
            PageAction::SelectItem(id) => {
                self.history.current_page_mut()?.select_item(&id)?;
                true
            }
        };
        Ok(changed)
    }

    /// Pop the item tree first, then the page tree.
    fn go_back(&mut self) -> Result<bool, NavigationError> {
        let page = self.history.current_page_mut()?;
        if page.close_item() {
            return Ok(true);
        }
        Ok(self.history.goto_previous_page())
    }

    fn active_items_mut(&mut self) -> Result<&mut ItemHandler, NavigationError> {
        self.history.current_page_mut()?.active_item_handler_mut()
    }

    /// Fall back to the first root page when the stored path no longer resolves, and to the
    /// page's own items when its item path went stale.
    pub fn recover(&mut self) -> Result<(), NavigationError> {
        let id = self.unique_id;
        if let Err(err) = self.history.validate() {
            warn!(target: "nav", "response={} falling back to root: {}", id, err);
            self.history.goto_root()?;
        }
        let page = self.history.current_page_mut()?;
        if let Err(err) = page.validate_items() {
            warn!(target: "nav", "response={} resetting item tree: {}", id, err);
            page.reset_items();
        }
        Ok(())
    }

    /// True while any generation the paging rows depend on has moved since the last commit.
    pub fn is_cache_update_required(&self) -> bool {
        if self.history.is_cache_update_required() {
            return true;
        }
        self.history
            .current_page()
            .map(Page::is_cache_update_required)
            .unwrap_or(true)
    }

    /// Commit every owned generation. Call only after the outbound edit succeeded.
    pub fn set_no_cache_update_required(&mut self) {
        self.history.set_no_cache_update_required();
        if let Ok(page) = self.history.current_page_mut() {
            page.set_no_cache_update_required();
        }
    }

    fn render_stamp(&self) -> Result<RenderStamp, NavigationError> {
        let page = self.history.current_page()?;
        Ok(RenderStamp {
            tree: self.history.generation(),
            item_tree: page.item_history().generation(),
            items: page.active_item_handler()?.generation(),
        })
    }

    /// Paging rows for the current position, rebuilt only when a generation moved.
    pub fn cached_page_components(&mut self) -> Result<&[ActionRow], NavigationError> {
        let stamp = self.render_stamp()?;
        if self.cached_stamp != Some(stamp) {
            self.cached_components = self.build_components()?;
            self.cached_stamp = Some(stamp);
            metrics::inc_component_rebuilds();
            debug!(
                target: "nav",
                "response={} rebuilt {} paging rows at {}",
                self.unique_id,
                self.cached_components.len(),
                format_path(&self.history.path())
            );
        }
        Ok(&self.cached_components)
    }

    fn build_components(&mut self) -> Result<Vec<ActionRow>, NavigationError> {
        let mut rows = Vec::new();
        if !self.rendering_paging_components {
            return Ok(rows);
        }
        let history = &self.history;
        let has_history = history.has_page_history();
        if history.pages().len() > 1 && !has_history {
            let path = history.path();
            let menu = SelectMenu::paging(MenuKind::PageSelector, PAGE_SELECTOR_PLACEHOLDER)
                .with_options(history.pages().iter().map(|p| p.option().clone()))
                .with_selected(path.first().map(String::as_str));
            rows.push(ActionRow::new(vec![menu.into()]));
        }

        let current = history.current_page()?;
        let item_open = current.item_history().depth() > 0;
        let can_go_back = has_history || item_open;
        if !current.pages().is_empty() || can_go_back {
            let (siblings, selected) = if current.pages().is_empty() {
                let parent = history.previous_page().map(Page::pages).unwrap_or(&[]);
                (parent, Some(current.id()))
            } else {
                (current.pages(), None)
            };
            let mut options = Vec::with_capacity(siblings.len() + 1);
            if can_go_back {
                options.push(
                    SelectOption::builder()
                        .with_value(BACK_VALUE)
                        .with_label("Back")
                        .with_emoji(Emoji::unicode("⬅️"))
                        .build(),
                );
            }
            options.extend(siblings.iter().map(|p| p.option().clone()));
            let menu = SelectMenu::paging(MenuKind::SubPageSelector, SUBPAGE_SELECTOR_PLACEHOLDER)
                .with_options(options)
                .with_selected(selected);
            rows.push(ActionRow::new(vec![menu.into()]));
        }

        let handler = current.active_item_handler()?;
        if handler.has_items() {
            let index = format!("{} / {}", handler.current_index(), handler.total_pages());
            rows.push(ActionRow::new(vec![
                Button::paging(PagingButton::Previous)
                    .with_enabled(handler.has_previous_page())
                    .into(),
                Button::paging(PagingButton::Index).with_label(index).into(),
                Button::paging(PagingButton::Next)
                    .with_enabled(handler.has_next_page())
                    .into(),
                Button::paging(PagingButton::Search).with_enabled(true).into(),
            ]));
            if let Some(sorter) = handler.current_sorter() {
                let order = if handler.is_reversed() { "Reversed" } else { "Normal" };
                rows.push(ActionRow::new(vec![
                    Button::paging(PagingButton::Sort)
                        .with_label(format!("Sort: {}", sorter.option().label))
                        .with_enabled(handler.sorters().len() > 1)
                        .into(),
                    Button::paging(PagingButton::Order)
                        .with_label(format!("Order: {}", order))
                        .with_enabled(true)
                        .into(),
                ]));
            }
        }
        let editor_enabled = handler.editor_enabled();

        if editor_enabled {
            let handler = self.history.current_page_mut()?.active_item_handler_mut()?;
            let mut options: Vec<SelectOption> = handler
                .cached_static_items()
                .iter()
                .filter(|item| item.editable())
                .map(|item| item.option().clone())
                .collect();
            options.extend(
                handler
                    .cached_field_items()
                    .iter()
                    .filter(|item| item.editable() || item.is_page())
                    .map(|item| item.option().clone()),
            );
            let selected = handler.editing().map(str::to_string);
            if !options.is_empty() {
                let menu = SelectMenu::paging(MenuKind::ItemEditor, ITEM_EDITOR_PLACEHOLDER)
                    .with_options(options)
                    .with_selected(selected.as_deref());
                rows.push(ActionRow::new(vec![menu.into()]));
            }
        }
        Ok(rows)
    }

    /// Produce the outbound payload. Paging rows come before the page's own rows and the
    /// total is capped at the platform's row limit.
    pub fn render(&mut self) -> Result<MessagePayload, NavigationError> {
        self.recover()?;
        let mut components = self.cached_page_components()?.to_vec();
        let page = self.history.current_page_mut()?;
        components.extend(page.components().iter().cloned());
        if components.len() > MAX_ACTION_ROWS {
            warn!(
                target: "nav",
                "response={} dropping {} rows beyond the limit of {}",
                self.unique_id,
                components.len() - MAX_ACTION_ROWS,
                MAX_ACTION_ROWS
            );
            components.truncate(MAX_ACTION_ROWS);
        }
        let content = page.content().map(str::to_string);
        let reactions = page.reactions().to_vec();
        let mut embeds = page.embeds().to_vec();
        let handler = page.active_item_handler_mut()?;
        let fields = handler.render_fields();
        let statics = handler.cached_static_items().to_vec();
        let items_embed = Embed::from_items(&statics, fields);
        if !items_embed.is_empty() {
            embeds.push(items_embed);
        }
        Ok(MessagePayload {
            content,
            embeds,
            components,
            attachments: self.attachments.clone(),
            reactions,
            ephemeral: self.ephemeral,
            allowed_mentions: self.allowed_mentions,
            reference_id: self.reference_id,
        })
    }

    pub fn search_modal_id(&self) -> String {
        format!("search:{}", self.unique_id)
    }

    /// The modal opened by the SEARCH button for the active item handler.
    pub fn search_modal(&self) -> Result<Modal, NavigationError> {
        let handler = self.current_page()?.active_item_handler()?;
        Ok(handler
            .search_inputs()
            .into_iter()
            .take(MAX_MODAL_INPUTS)
            .fold(Modal::new(self.search_modal_id(), "Search"), Modal::with_input))
    }

    /// Every row the message would show, paging rows first. Handy for locating a control.
    pub fn find_component(&mut self, custom_id: &str) -> Option<Component> {
        let rows = self.cached_page_components().ok()?.to_vec();
        let page = self.current_page().ok()?;
        rows.iter()
            .chain(page.components())
            .find_map(|row| row.find(custom_id).cloned())
    }
}

/// Builder for [`Response`]; `build()` also performs the initial navigation.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    unique_id: Option<Uuid>,
    reference_id: Option<Snowflake>,
    allowed_mentions: AllowedMentions,
    time_to_live: u32,
    ephemeral: bool,
    rendering_paging_components: bool,
    attachments: Vec<Attachment>,
    pages: Vec<Page>,
    default_page: Option<String>,
    page_history: Vec<String>,
    item_page: Option<i64>,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self {
            unique_id: None,
            reference_id: None,
            allowed_mentions: AllowedMentions::default(),
            time_to_live: DEFAULT_TIME_TO_LIVE,
            ephemeral: false,
            rendering_paging_components: true,
            attachments: Vec::new(),
            pages: Vec::new(),
            default_page: None,
            page_history: Vec::new(),
            item_page: None,
        }
    }
}

impl ResponseBuilder {
    pub fn from_config(cfg: &ResponseConfig) -> Self {
        Self::default()
            .with_time_to_live(cfg.time_to_live_secs)
            .with_paging_components(cfg.render_paging_components)
    }

    pub fn with_unique_id(mut self, id: Uuid) -> Self {
        self.unique_id = Some(id);
        self
    }

    pub fn with_reference(mut self, message: Snowflake) -> Self {
        self.reference_id = Some(message);
        self
    }

    pub fn with_allowed_mentions(mut self, mentions: AllowedMentions) -> Self {
        self.allowed_mentions = mentions;
        self
    }

    /// Idle lifetime in seconds, clamped to 5..=300.
    pub fn with_time_to_live(mut self, secs: u32) -> Self {
        self.time_to_live = secs.clamp(MIN_TIME_TO_LIVE, MAX_TIME_TO_LIVE);
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn with_paging_components(mut self, enabled: bool) -> Self {
        self.rendering_paging_components = enabled;
        self
    }

    /// Attachments are unique by name; a later one replaces an earlier one.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.retain(|a| a.name != attachment.name);
        self.attachments.push(attachment);
        self
    }

    /// Attach the error and its cause chain as a `stacktrace-<timestamp>.log` file.
    pub fn with_error(self, err: &anyhow::Error) -> Self {
        let name = format!("stacktrace-{}.log", Utc::now().format("%Y%m%d-%H%M%S"));
        self.with_attachment(Attachment::new(name, format!("{:?}", err).into_bytes()))
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_pages<I: IntoIterator<Item = Page>>(mut self, pages: I) -> Self {
        self.pages.extend(pages);
        self
    }

    /// Replace the root page with the same option value.
    pub fn edit_page(mut self, page: Page) -> Self {
        if let Some(slot) = self.pages.iter_mut().find(|p| p.id() == page.id()) {
            *slot = page;
        }
        self
    }

    pub fn with_default_page(mut self, id: impl Into<String>) -> Self {
        self.default_page = Some(id.into());
        self
    }

    /// Identifier path persisted from an earlier session.
    pub fn with_page_history<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.page_history = path.into_iter().map(Into::into).collect();
        self
    }

    /// Item window to restore together with the page history.
    pub fn with_item_page(mut self, page: i64) -> Self {
        self.item_page = Some(page);
        self
    }

    pub fn build(self) -> Result<Response, ConfigurationError> {
        if self.pages.is_empty() {
            return Err(ConfigurationError::NoPages);
        }
        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.id()) {
                return Err(ConfigurationError::DuplicatePage(page.id().to_string()));
            }
        }
        let history = HistoryHandler::builder()
            .with_pages(self.pages)
            .with_minimum_depth(1)
            .build();
        let mut response = Response {
            unique_id: self.unique_id.unwrap_or_else(Uuid::new_v4),
            build_time: Utc::now(),
            reference_id: self.reference_id,
            allowed_mentions: self.allowed_mentions,
            time_to_live: self.time_to_live,
            ephemeral: self.ephemeral,
            rendering_paging_components: self.rendering_paging_components,
            attachments: self.attachments,
            history,
            cached_components: Vec::new(),
            cached_stamp: None,
        };

        let default_page = self
            .default_page
            .filter(|id| response.history.page(id).is_some());
        let navigated = match default_page {
            Some(id) => response.history.goto_top_level_page(&id),
            None if !self.page_history.is_empty() => {
                match response.history.replay(&self.page_history) {
                    Ok(()) => {
                        if let (Some(index), Ok(page)) =
                            (self.item_page, response.history.current_page_mut())
                        {
                            page.goto_item_page(index);
                        }
                        Ok(())
                    }
                    Err(err) => {
                        warn!(
                            target: "nav",
                            "discarding persisted path {}: {}",
                            format_path(&self.page_history),
                            err
                        );
                        response.history.goto_root()
                    }
                }
            }
            None => response.history.goto_root(),
        };
        navigated.map_err(|_| ConfigurationError::NoPages)?;
        Ok(response)
    }
}
