//! Paginated item container owned by a page.
//!
//! Field items are filtered, sorted and cut into fixed-size windows; static items (title,
//! footer, ...) bypass pagination and are always rendered. Every state change bumps the
//! handler's [`Generation`], which is how the owning response knows its cached controls are
//! out of date.

use log::debug;
use std::collections::BTreeMap;

use super::component::TextInput;
use super::embed::Field;
use super::filter::{Filter, Search};
use super::generation::Generation;
use super::item::Item;
use super::sorter::Sorter;
use crate::logutil::escape_log;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 12;
pub const MAX_ITEMS_PER_PAGE: usize = 24;
/// Built-in search input that jumps to a window number.
pub const SEARCH_PAGE_INPUT: &str = "search-page";
/// Built-in search input that jumps to the window holding the n-th item.
pub const SEARCH_INDEX_INPUT: &str = "search-index";

/// How the current window of field items becomes embed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStyle {
    /// Each item decides whether it is inline.
    #[default]
    Default,
    /// One field per item, never inline.
    Field,
    /// One field per item, always inline.
    FieldInline,
    /// A single field listing every item on its own line.
    List,
}

#[derive(Debug, Clone)]
struct Memo {
    stamp: u64,
    static_items: Vec<Item>,
    field_items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub struct ItemHandler {
    items: Vec<Item>,
    items_per_page: usize,
    field_style: FieldStyle,
    list_title: Option<String>,
    editor_enabled: bool,
    sorters: Vec<Sorter>,
    current_sorter: usize,
    reversed: bool,
    filters: Vec<Filter>,
    searches: Vec<Search>,
    current_index: usize,
    editing: Option<String>,
    generation: Generation,
    memo: Option<Memo>,
}

impl Default for ItemHandler {
    fn default() -> Self {
        ItemHandler::builder().build()
    }
}

/// Compares visible state only; change counters and memoized output are ignored.
impl PartialEq for ItemHandler {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
            && self.items_per_page == other.items_per_page
            && self.field_style == other.field_style
            && self.list_title == other.list_title
            && self.editor_enabled == other.editor_enabled
            && self.sorters == other.sorters
            && self.current_sorter == other.current_sorter
            && self.reversed == other.reversed
            && self.filters == other.filters
            && self.searches == other.searches
            && self.current_index == other.current_index
            && self.editing == other.editing
    }
}

impl ItemHandler {
    pub fn builder() -> ItemHandlerBuilder {
        ItemHandlerBuilder::default()
    }

    pub fn new(items: Vec<Item>) -> Self {
        ItemHandler::builder().with_items(items).build()
    }

    pub fn mutate(&self) -> ItemHandlerBuilder {
        ItemHandlerBuilder {
            items: self.items.clone(),
            items_per_page: self.items_per_page,
            field_style: self.field_style,
            list_title: self.list_title.clone(),
            editor_enabled: self.editor_enabled,
            sorters: self.sorters.clone(),
            reversed: self.reversed,
            filters: self.filters.clone(),
            searches: self.searches.clone(),
            current_index: self.current_index,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Mutable access that does not mark the handler dirty. Only nested page items use
    /// this: their own handlers track their changes.
    pub(crate) fn items_mut_untracked(&mut self) -> &mut [Item] {
        &mut self.items
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn field_style(&self) -> FieldStyle {
        self.field_style
    }

    pub fn editor_enabled(&self) -> bool {
        self.editor_enabled
    }

    pub fn sorters(&self) -> &[Sorter] {
        &self.sorters
    }

    pub fn current_sorter(&self) -> Option<&Sorter> {
        self.sorters.get(self.current_sorter)
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn searches(&self) -> &[Search] {
        &self.searches
    }

    /// Identifier of the item picked in the editor, if any.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Whether there are any field items to paginate.
    pub fn has_items(&self) -> bool {
        self.items.iter().any(|i| !i.is_static())
    }

    /// Indices into `items` of the field items that pass every filter, in display order.
    fn visible_indices(&self) -> Vec<usize> {
        let mut visible: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_static())
            .filter(|(_, item)| self.filters.iter().all(|f| f.matches(item)))
            .map(|(idx, _)| idx)
            .collect();
        if let Some(sorter) = self.current_sorter() {
            let mut refs: Vec<(usize, &Item)> =
                visible.iter().map(|&idx| (idx, &self.items[idx])).collect();
            refs.sort_by(|(_, a), (_, b)| {
                let ordering = sorter.compare(a, b);
                if self.reversed {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
            visible = refs.into_iter().map(|(idx, _)| idx).collect();
        } else if self.reversed {
            visible.reverse();
        }
        visible
    }

    /// Number of field items left after filtering.
    pub fn filtered_len(&self) -> usize {
        self.visible_indices().len()
    }

    pub fn total_pages(&self) -> usize {
        Self::pages_for(self.filtered_len(), self.items_per_page)
    }

    fn pages_for(len: usize, per_page: usize) -> usize {
        len.div_ceil(per_page).max(1)
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_index > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.current_index < self.total_pages()
    }

    fn set_index(&mut self, index: usize) -> bool {
        if index == self.current_index {
            return false;
        }
        self.current_index = index;
        self.generation.bump();
        true
    }

    /// Clamp `page` into `[1, total_pages]`. Returns whether the window moved.
    pub fn goto_page(&mut self, page: i64) -> bool {
        let total = self.total_pages() as i64;
        let clamped = page.clamp(1, total) as usize;
        self.set_index(clamped)
    }

    pub fn next_page(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        self.set_index(self.current_index + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        if !self.has_previous_page() {
            return false;
        }
        self.set_index(self.current_index - 1)
    }

    pub fn first_page(&mut self) -> bool {
        self.set_index(1)
    }

    pub fn last_page(&mut self) -> bool {
        self.set_index(self.total_pages())
    }

    fn clamp_index(&mut self) {
        let total = self.total_pages();
        if self.current_index > total {
            self.current_index = total;
        }
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
        self.generation.bump();
    }

    pub fn add_items<I: IntoIterator<Item = Item>>(&mut self, items: I) {
        self.items.extend(items);
        self.generation.bump();
    }

    /// Replace the item sharing `item`'s identifier. Unknown identifiers are ignored.
    pub fn edit_item(&mut self, item: Item) -> bool {
        match self.items.iter_mut().find(|i| i.id() == item.id()) {
            Some(slot) => {
                *slot = item;
                self.generation.bump();
                true
            }
            None => false,
        }
    }

    /// Remove every item matching `predicate`; the window is pulled back if it now lies past
    /// the end. Returns how many items were removed. A predicate matching nothing leaves the
    /// handler clean.
    pub fn remove_items<F: FnMut(&Item) -> bool>(&mut self, mut predicate: F) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        let removed = before - self.items.len();
        if removed > 0 {
            if let Some(editing) = &self.editing {
                if !self.items.iter().any(|i| i.id() == editing) {
                    self.editing = None;
                }
            }
            self.clamp_index();
            self.generation.bump();
        }
        removed
    }

    pub fn set_editor_enabled(&mut self, enabled: bool) {
        if self.editor_enabled != enabled {
            self.editor_enabled = enabled;
            self.generation.bump();
        }
    }

    /// Cycle to the next sorter, wrapping around. Resets to the first window.
    pub fn next_sorter(&mut self) -> bool {
        if self.sorters.len() < 2 {
            return false;
        }
        self.current_sorter = (self.current_sorter + 1) % self.sorters.len();
        self.current_index = 1;
        self.generation.bump();
        true
    }

    pub fn invert_order(&mut self) {
        self.reversed = !self.reversed;
        self.current_index = 1;
        self.generation.bump();
    }

    pub fn toggle_filter(&mut self, id: &str) -> bool {
        let Some(filter) = self.filters.iter_mut().find(|f| f.option().value == id) else {
            return false;
        };
        let enabled = !filter.enabled();
        filter.set_enabled(enabled);
        self.clamp_index();
        self.generation.bump();
        true
    }

    /// Mark an editable field item as the one being edited.
    pub fn select_item(&mut self, id: &str) -> bool {
        let known = self
            .items
            .iter()
            .any(|i| i.id() == id && i.editable() && !i.is_page());
        if known && self.editing.as_deref() != Some(id) {
            self.editing = Some(id.to_string());
            self.generation.bump();
        }
        known
    }

    /// Apply a search submission.
    ///
    /// The built-in inputs jump by window number or item number; any other input is matched
    /// against the configured searches and moves to the window holding the first match.
    /// Returns whether the query could be applied.
    pub fn search(&mut self, input_id: &str, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        match input_id {
            SEARCH_PAGE_INPUT => match query.parse::<i64>() {
                Ok(page) => {
                    self.goto_page(page);
                    true
                }
                Err(_) => false,
            },
            SEARCH_INDEX_INPUT => match query.parse::<i64>() {
                Ok(n) => {
                    let per_page = self.items_per_page as i64;
                    self.goto_page((n.max(1) - 1) / per_page + 1);
                    true
                }
                Err(_) => false,
            },
            _ => {
                let Some(search) = self.searches.iter().find(|s| s.id() == input_id) else {
                    return false;
                };
                let position = self
                    .visible_indices()
                    .into_iter()
                    .position(|idx| search.matches(&self.items[idx], query));
                debug!(
                    target: "nav",
                    "search input={} query={} match={:?}",
                    escape_log(input_id),
                    escape_log(query),
                    position
                );
                match position {
                    Some(pos) => {
                        self.set_index(pos / self.items_per_page + 1);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Text inputs for the search modal: the two built-in jumps, then every configured search.
    pub fn search_inputs(&self) -> Vec<TextInput> {
        let mut inputs = vec![
            TextInput::new(SEARCH_PAGE_INPUT, "Page Number")
                .with_placeholder(format!("1 - {}", self.total_pages())),
            TextInput::new(SEARCH_INDEX_INPUT, "Item Number")
                .with_placeholder(format!("1 - {}", self.filtered_len().max(1))),
        ];
        inputs.extend(self.searches.iter().map(|s| s.input().clone()));
        inputs
    }

    /// Values substituted into `{NAME}` placeholders of static item text.
    pub fn variables(&self) -> BTreeMap<&'static str, String> {
        let filtered = self.filtered_len();
        let start = (self.current_index - 1) * self.items_per_page;
        let end = (start + self.items_per_page).min(filtered);
        let mut vars = BTreeMap::new();
        vars.insert("SIZE", self.items.iter().filter(|i| !i.is_static()).count().to_string());
        vars.insert("FILTERED_SIZE", filtered.to_string());
        let first = if filtered == 0 { 0 } else { start + 1 };
        vars.insert("START_INDEX", first.to_string());
        vars.insert("END_INDEX", end.to_string());
        vars.insert("CURRENT_PAGE", self.current_index.to_string());
        vars.insert("TOTAL_PAGES", self.total_pages().to_string());
        vars
    }

    fn build_memo(&self, stamp: u64) -> Memo {
        let vars = self.variables();
        let start = (self.current_index - 1) * self.items_per_page;
        Memo {
            stamp,
            static_items: self
                .items
                .iter()
                .filter(|i| i.is_static())
                .map(|i| substitute(i, &vars))
                .collect(),
            field_items: self
                .visible_indices()
                .into_iter()
                .skip(start)
                .take(self.items_per_page)
                .map(|idx| self.items[idx].clone())
                .collect(),
        }
    }

    fn refresh_memo(&mut self) -> &Memo {
        let stamp = self.generation.current();
        let memo = match self.memo.take() {
            Some(memo) if memo.stamp == stamp => memo,
            _ => self.build_memo(stamp),
        };
        self.memo.insert(memo)
    }

    /// Static items with variables substituted; recomputed only after a change.
    pub fn cached_static_items(&mut self) -> &[Item] {
        &self.refresh_memo().static_items
    }

    /// The field items in the current window; recomputed only after a change.
    pub fn cached_field_items(&mut self) -> &[Item] {
        &self.refresh_memo().field_items
    }

    pub fn render_fields(&mut self) -> Vec<Field> {
        let style = self.field_style;
        let title = self
            .list_title
            .clone()
            .unwrap_or_else(|| "Items".to_string());
        let window = self.cached_field_items();
        match style {
            FieldStyle::Default => window.iter().map(Item::render_field).collect(),
            FieldStyle::Field | FieldStyle::FieldInline => window
                .iter()
                .map(|item| Field {
                    inline: style == FieldStyle::FieldInline,
                    ..item.render_field()
                })
                .collect(),
            FieldStyle::List if window.is_empty() => Vec::new(),
            FieldStyle::List => {
                let lines: Vec<String> = window
                    .iter()
                    .map(|item| {
                        let field = item.render_field();
                        format!("{}: {}", field.name, field.value)
                    })
                    .collect();
                vec![Field::new(title, lines.join("\n"), false)]
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    pub fn is_cache_update_required(&self) -> bool {
        self.generation.is_dirty()
    }

    pub fn set_no_cache_update_required(&mut self) {
        self.generation.commit();
    }

    /// Overwrite page items with the live copies navigated in an item tree, matched by id.
    /// The nested handlers' state is not part of this handler's view, so nothing is marked dirty.
    pub(crate) fn absorb_page_items(&mut self, live: &[Item]) {
        let mut absorbed = false;
        for slot in self.items.iter_mut().filter(|i| i.is_page()) {
            if let Some(item) = live.iter().find(|i| i.id() == slot.id()) {
                *slot = item.clone();
                absorbed = true;
            }
        }
        if absorbed {
            self.memo = None;
        }
    }
}

fn substitute(item: &Item, vars: &BTreeMap<&'static str, String>) -> Item {
    use super::item::ItemKind;

    let apply = |text: &String| {
        vars.iter().fold(text.clone(), |acc, (key, value)| {
            acc.replace(&format!("{{{}}}", key), value)
        })
    };
    let kind = match item.kind() {
        ItemKind::Title(t) => ItemKind::Title(apply(t)),
        ItemKind::Description(t) => ItemKind::Description(apply(t)),
        ItemKind::Footer(t) => ItemKind::Footer(apply(t)),
        ItemKind::Author { name, icon_url } => ItemKind::Author {
            name: apply(name),
            icon_url: icon_url.clone(),
        },
        other => other.clone(),
    };
    item.mutate().with_kind(kind).build()
}

#[derive(Debug, Clone)]
pub struct ItemHandlerBuilder {
    items: Vec<Item>,
    items_per_page: usize,
    field_style: FieldStyle,
    list_title: Option<String>,
    editor_enabled: bool,
    sorters: Vec<Sorter>,
    reversed: bool,
    filters: Vec<Filter>,
    searches: Vec<Search>,
    current_index: usize,
}

impl Default for ItemHandlerBuilder {
    fn default() -> Self {
        ItemHandlerBuilder {
            items: Vec::new(),
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            field_style: FieldStyle::Default,
            list_title: None,
            editor_enabled: false,
            sorters: Vec::new(),
            reversed: false,
            filters: Vec::new(),
            searches: Vec::new(),
            current_index: 1,
        }
    }
}

impl ItemHandlerBuilder {
    pub fn with_items<I: IntoIterator<Item = Item>>(mut self, items: I) -> Self {
        self.items.extend(items);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Clamped to `1..=24`.
    pub fn with_items_per_page(mut self, n: usize) -> Self {
        self.items_per_page = n.clamp(1, MAX_ITEMS_PER_PAGE);
        self
    }

    pub fn with_field_style(mut self, style: FieldStyle) -> Self {
        self.field_style = style;
        self
    }

    pub fn with_list_title(mut self, title: impl Into<String>) -> Self {
        self.list_title = Some(title.into());
        self
    }

    pub fn with_editor(mut self, enabled: bool) -> Self {
        self.editor_enabled = enabled;
        self
    }

    pub fn with_sorter(mut self, sorter: Sorter) -> Self {
        self.sorters.push(sorter);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_search(mut self, search: Search) -> Self {
        self.searches.push(search);
        self
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn with_current_index(mut self, index: usize) -> Self {
        self.current_index = index;
        self
    }

    pub fn build(self) -> ItemHandler {
        let mut handler = ItemHandler {
            items: self.items,
            items_per_page: self.items_per_page,
            field_style: self.field_style,
            list_title: self.list_title,
            editor_enabled: self.editor_enabled,
            sorters: self.sorters,
            current_sorter: 0,
            reversed: self.reversed,
            filters: self.filters,
            searches: self.searches,
            current_index: 1,
            editing: None,
            generation: Generation::default(),
            memo: None,
        };
        handler.goto_page(self.current_index as i64);
        handler
    }
}
