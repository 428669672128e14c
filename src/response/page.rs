use std::collections::HashSet;

use super::component::ActionRow;
use super::embed::Embed;
use super::history::{HistoryHandler, Subpages};
use super::item::Item;
use super::item_handler::ItemHandler;
use super::option::{Emoji, SelectOption, SelectOptionBuilder};
use crate::errors::{ConfigurationError, NavigationError};

/// One navigable screen: its own controls and content, a paginated item area, and child pages.
///
/// Pages are built once and then only touched through their item area. Page items inside
/// that area form a second, nested tree (`item_history`) with an empty path meaning "the
/// page's own items".
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    option: SelectOption,
    components: Vec<ActionRow>,
    reactions: Vec<Emoji>,
    content: Option<String>,
    embeds: Vec<Embed>,
    item_handler: ItemHandler,
    item_history: HistoryHandler<Item>,
    pages: Vec<Page>,
}

fn page_items(handler: &ItemHandler) -> Vec<Item> {
    handler.items().iter().filter(|i| i.is_page()).cloned().collect()
}

fn item_tree(handler: &ItemHandler) -> HistoryHandler<Item> {
    HistoryHandler::builder()
        .with_pages(page_items(handler))
        .with_minimum_depth(0)
        .build()
}

impl Page {
    pub fn builder() -> PageBuilder {
        PageBuilder::default()
    }

    pub fn mutate(&self) -> PageBuilder {
        let mut item_handler = self.item_handler.clone();
        item_handler.absorb_page_items(self.item_history.pages());
        PageBuilder {
            option: self.option.mutate(),
            components: self.components.clone(),
            reactions: self.reactions.clone(),
            content: self.content.clone(),
            embeds: self.embeds.clone(),
            item_handler,
            pages: self.pages.clone(),
        }
    }

    pub fn option(&self) -> &SelectOption {
        &self.option
    }

    pub fn id(&self) -> &str {
        &self.option.value
    }

    pub fn components(&self) -> &[ActionRow] {
        &self.components
    }

    pub fn reactions(&self) -> &[Emoji] {
        &self.reactions
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn embeds(&self) -> &[Embed] {
        &self.embeds
    }

    pub fn item_handler(&self) -> &ItemHandler {
        &self.item_handler
    }

    pub fn item_history(&self) -> &HistoryHandler<Item> {
        &self.item_history
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id() == id)
    }

    /// The handler currently shown: the open page item's handler, or the page's own.
    pub fn active_item_handler(&self) -> Result<&ItemHandler, NavigationError> {
        Ok(self
            .item_history
            .path_page()?
            .and_then(Item::page_handler)
            .unwrap_or(&self.item_handler))
    }

    pub fn active_item_handler_mut(&mut self) -> Result<&mut ItemHandler, NavigationError> {
        if self.item_history.depth() == 0 {
            return Ok(&mut self.item_handler);
        }
        match self.item_history.path_page_mut()? {
            Some(item) => {
                let missing = NavigationError::SubPageNotFound(item.id().to_string());
                item.page_handler_mut().ok_or(missing)
            }
            None => Ok(&mut self.item_handler),
        }
    }

    pub fn has_items(&self) -> bool {
        self.active_item_handler()
            .map(ItemHandler::has_items)
            .unwrap_or(false)
    }

    /// Restore the window of the page's own item area.
    pub fn goto_item_page(&mut self, page: i64) -> bool {
        self.item_handler.goto_page(page)
    }

    /// Mutate the page's own items. Page items are re-read into the item tree afterwards,
    /// which can leave its path stale; see [`Page::validate_items`]. Open page items that
    /// survive the edit keep their window, sorter and selection.
    pub fn edit_items<R>(&mut self, edit: impl FnOnce(&mut ItemHandler) -> R) -> R {
        self.item_handler.absorb_page_items(self.item_history.pages());
        let result = edit(&mut self.item_handler);
        self.item_history.rebase(page_items(&self.item_handler));
        result
    }

    pub fn validate_items(&self) -> Result<(), NavigationError> {
        self.item_history.path_page().map(|_| ())
    }

    /// Open a page item (from the top level or inside the open one), or mark a plain editable
    /// item as being edited.
    pub fn select_item(&mut self, id: &str) -> Result<(), NavigationError> {
        let opens_page = match self.item_history.path_page()? {
            None => self.item_history.page(id).is_some(),
            Some(open) => open.subpages().iter().any(|child| child.id() == id),
        };
        if opens_page {
            return if self.item_history.depth() == 0 {
                self.item_history.goto_top_level_page(id)
            } else {
                self.item_history.goto_sub_page(id)
            };
        }
        if self.active_item_handler_mut()?.select_item(id) {
            Ok(())
        } else {
            Err(NavigationError::SubPageNotFound(id.to_string()))
        }
    }

    /// Close the innermost open page item. Returns false when none is open.
    pub fn close_item(&mut self) -> bool {
        self.item_history.goto_previous_page()
    }

    /// Back to the page's own items after the item tree went stale.
    pub fn reset_items(&mut self) {
        self.item_history.clear();
    }

    pub fn is_cache_update_required(&self) -> bool {
        self.item_history.is_cache_update_required()
            || self
                .active_item_handler()
                .map(ItemHandler::is_cache_update_required)
                .unwrap_or(true)
    }

    pub fn set_no_cache_update_required(&mut self) {
        self.item_history.set_no_cache_update_required();
        self.item_handler.set_no_cache_update_required();
        if let Ok(handler) = self.active_item_handler_mut() {
            handler.set_no_cache_update_required();
        }
    }

    fn into_disabled(self, recursive: bool) -> Page {
        let pages = if recursive {
            self.pages
                .into_iter()
                .map(|p| p.into_disabled(true))
                .collect()
        } else {
            self.pages
        };
        Page {
            components: self.components.into_iter().map(ActionRow::disabled).collect(),
            pages,
            ..self
        }
    }
}

impl Subpages for Page {
    fn node_option(&self) -> &SelectOption {
        &self.option
    }

    fn subpages(&self) -> Vec<&Self> {
        self.pages.iter().collect()
    }

    fn subpage_mut(
        &mut self,
        id: &str,
        matcher: &dyn Fn(&Self, &str) -> bool,
    ) -> Option<&mut Self> {
        self.pages.iter_mut().find(|p| matcher(p, id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageBuilder {
    option: SelectOptionBuilder,
    components: Vec<ActionRow>,
    reactions: Vec<Emoji>,
    content: Option<String>,
    embeds: Vec<Embed>,
    item_handler: ItemHandler,
    pages: Vec<Page>,
}

impl PageBuilder {
    pub fn with_option(mut self, option: SelectOption) -> Self {
        self.option = option.mutate();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.option = self.option.with_value(value);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.option = self.option.with_label(label);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.option = self.option.with_description(description);
        self
    }

    pub fn with_emoji(mut self, emoji: Emoji) -> Self {
        self.option = self.option.with_emoji(emoji);
        self
    }

    pub fn with_row(mut self, row: ActionRow) -> Self {
        self.components.push(row);
        self
    }

    pub fn with_components<I: IntoIterator<Item = ActionRow>>(mut self, rows: I) -> Self {
        self.components.extend(rows);
        self
    }

    pub fn with_reactions<I: IntoIterator<Item = Emoji>>(mut self, reactions: I) -> Self {
        self.reactions.extend(reactions);
        self
    }

    pub fn clear_reactions(mut self) -> Self {
        self.reactions.clear();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn with_item_handler(mut self, handler: ItemHandler) -> Self {
        self.item_handler = handler;
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_pages<I: IntoIterator<Item = Page>>(mut self, pages: I) -> Self {
        self.pages.extend(pages);
        self
    }

    /// Replace the child page sharing `page`'s identifier; unknown identifiers are ignored.
    pub fn edit_page(mut self, page: Page) -> Self {
        if let Some(slot) = self.pages.iter_mut().find(|p| p.id() == page.id()) {
            *slot = page;
        }
        self
    }

    /// Disable every component, optionally on all descendants too.
    pub fn disable_components(mut self, recursive: bool) -> Self {
        self.components = self.components.into_iter().map(ActionRow::disabled).collect();
        if recursive {
            self.pages = self
                .pages
                .into_iter()
                .map(|p| p.into_disabled(true))
                .collect();
        }
        self
    }

    pub fn build(self) -> Result<Page, ConfigurationError> {
        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.id()) {
                return Err(ConfigurationError::DuplicatePage(page.id().to_string()));
            }
        }
        let item_history = item_tree(&self.item_handler);
        Ok(Page {
            option: self.option.build(),
            components: self
                .components
                .into_iter()
                .filter(|row| !row.is_empty())
                .collect(),
            reactions: self.reactions,
            content: self.content,
            embeds: self.embeds,
            item_handler: self.item_handler,
            item_history,
            pages: self.pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::component::{Button, Component};

    fn leaf(id: &str) -> Page {
        Page::builder().with_value(id).with_label(id).build().unwrap()
    }

    #[test]
    fn empty_rows_are_pruned() {
        let page = Page::builder()
            .with_row(ActionRow::default())
            .with_row(ActionRow::new(vec![Button::new("x", "X").into()]))
            .build()
            .unwrap();
        assert_eq!(page.components().len(), 1);
    }

    #[test]
    fn duplicate_children_are_rejected() {
        let err = Page::builder()
            .with_page(leaf("a"))
            .with_page(leaf("a"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicatePage("a".into()));
    }

    #[test]
    fn edit_page_replaces_by_identifier() {
        let page = Page::builder()
            .with_page(leaf("a"))
            .edit_page(leaf("a").mutate().with_content("edited").build().unwrap())
            .edit_page(leaf("missing"))
            .build()
            .unwrap();
        assert_eq!(page.pages().len(), 1);
        assert_eq!(page.page("a").unwrap().content(), Some("edited"));
    }

    #[test]
    fn recursive_disable_reaches_children() {
        let child = Page::builder()
            .with_value("child")
            .with_row(ActionRow::new(vec![Button::new("c", "C").into()]))
            .build()
            .unwrap();
        let page = Page::builder()
            .with_row(ActionRow::new(vec![Button::new("p", "P").into()]))
            .with_page(child)
            .disable_components(true)
            .build()
            .unwrap();
        let enabled = |page: &Page| match &page.components()[0].components[0] {
            Component::Button(b) => b.enabled,
            _ => true,
        };
        assert!(!enabled(&page));
        assert!(!enabled(page.page("child").unwrap()));
    }

    #[test]
    fn page_items_open_nested_handlers() {
        let nested = ItemHandler::new(vec![Item::text("n1", "Nested", "value")]);
        let mut page = Page::builder()
            .with_value("inv")
            .with_item_handler(ItemHandler::new(vec![
                Item::text("plain", "Plain", "x"),
                Item::page("bag", "Bag", nested),
            ]))
            .build()
            .unwrap();
        assert_eq!(page.active_item_handler().unwrap().items().len(), 2);
        page.select_item("bag").unwrap();
        assert_eq!(page.item_history().identifier_history(), vec!["bag"]);
        assert_eq!(page.active_item_handler().unwrap().items()[0].id(), "n1");
        assert!(page.close_item());
        assert!(!page.close_item());
        assert_eq!(
            page.select_item("nothing"),
            Err(NavigationError::SubPageNotFound("nothing".into()))
        );
    }

    #[test]
    fn editing_items_can_stale_the_item_tree() {
        let mut page = Page::builder()
            .with_item_handler(ItemHandler::new(vec![Item::page(
                "bag",
                "Bag",
                ItemHandler::default(),
            )]))
            .build()
            .unwrap();
        page.select_item("bag").unwrap();
        let removed = page.edit_items(|items| items.remove_items(|i| i.id() == "bag"));
        assert_eq!(removed, 1);
        assert!(matches!(
            page.validate_items(),
            Err(NavigationError::StaleHistory { .. })
        ));
        assert!(page.is_cache_update_required());
        page.reset_items();
        assert!(page.validate_items().is_ok());
    }
}
