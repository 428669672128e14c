use chrono::{DateTime, Utc};

use super::embed::Field;
use super::history::Subpages;
use super::item_handler::ItemHandler;
use super::option::{Emoji, SelectOption, SelectOptionBuilder};

/// Rendered value for a field whose data is empty.
pub const NULL_VALUE: &str = "*null*";
/// Rendered value for page items.
pub const PAGE_VALUE: &str = "Goto page.";

/// The payload an [`Item`] carries.
///
/// Field kinds are paginated by their [`ItemHandler`]; static kinds are always rendered into
/// the embed's fixed slots (title, footer, ...) and never paginated.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Text(String),
    Number(f64),
    Toggle(bool),
    Timestamp(DateTime<Utc>),
    /// A navigable container; its own page items become children in the item tree.
    Page(Box<ItemHandler>),
    Title(String),
    Description(String),
    Author {
        name: String,
        icon_url: Option<String>,
    },
    Footer(String),
    Image(String),
    Thumbnail(String),
}

impl ItemKind {
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            ItemKind::Title(_)
                | ItemKind::Description(_)
                | ItemKind::Author { .. }
                | ItemKind::Footer(_)
                | ItemKind::Image(_)
                | ItemKind::Thumbnail(_)
        )
    }

    pub fn is_page(&self) -> bool {
        matches!(self, ItemKind::Page(_))
    }

    /// Short kind name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Text(_) => "text",
            ItemKind::Number(_) => "number",
            ItemKind::Toggle(_) => "toggle",
            ItemKind::Timestamp(_) => "timestamp",
            ItemKind::Page(_) => "page",
            ItemKind::Title(_) => "title",
            ItemKind::Description(_) => "description",
            ItemKind::Author { .. } => "author",
            ItemKind::Footer(_) => "footer",
            ItemKind::Image(_) => "image",
            ItemKind::Thumbnail(_) => "thumbnail",
        }
    }
}

/// A single entry inside a page's item area.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    option: SelectOption,
    editable: bool,
    inline: bool,
    kind: ItemKind,
}

impl Item {
    pub fn builder(kind: ItemKind) -> ItemBuilder {
        ItemBuilder {
            option: SelectOption::builder(),
            editable: false,
            inline: false,
            kind,
        }
    }

    pub fn text(value: impl Into<String>, label: impl Into<String>, text: impl Into<String>) -> Self {
        Item::builder(ItemKind::Text(text.into()))
            .with_value(value)
            .with_label(label)
            .build()
    }

    pub fn page(value: impl Into<String>, label: impl Into<String>, handler: ItemHandler) -> Self {
        Item::builder(ItemKind::Page(Box::new(handler)))
            .with_value(value)
            .with_label(label)
            .build()
    }

    pub fn mutate(&self) -> ItemBuilder {
        ItemBuilder {
            option: self.option.mutate(),
            editable: self.editable,
            inline: self.inline,
            kind: self.kind.clone(),
        }
    }

    pub fn option(&self) -> &SelectOption {
        &self.option
    }

    pub fn id(&self) -> &str {
        &self.option.value
    }

    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn inline(&self) -> bool {
        self.inline
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn is_static(&self) -> bool {
        self.kind.is_static()
    }

    pub fn is_page(&self) -> bool {
        self.kind.is_page()
    }

    pub fn page_handler(&self) -> Option<&ItemHandler> {
        match &self.kind {
            ItemKind::Page(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn page_handler_mut(&mut self) -> Option<&mut ItemHandler> {
        match &mut self.kind {
            ItemKind::Page(handler) => Some(handler),
            _ => None,
        }
    }

    /// Display text for the item's data, `None` when there is nothing to show.
    pub fn render_value(&self) -> Option<String> {
        let value = match &self.kind {
            ItemKind::Text(text)
            | ItemKind::Title(text)
            | ItemKind::Description(text)
            | ItemKind::Footer(text)
            | ItemKind::Image(text)
            | ItemKind::Thumbnail(text) => text.clone(),
            ItemKind::Author { name, .. } => name.clone(),
            ItemKind::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{:.0}", n),
            ItemKind::Number(n) => n.to_string(),
            ItemKind::Toggle(true) => "Enabled".to_string(),
            ItemKind::Toggle(false) => "Disabled".to_string(),
            ItemKind::Timestamp(ts) => format!("<t:{}:R>", ts.timestamp()),
            ItemKind::Page(_) => PAGE_VALUE.to_string(),
        };
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    }

    pub fn render_field(&self) -> Field {
        Field::new(
            self.option.display_label(),
            self.render_value().unwrap_or_else(|| NULL_VALUE.to_string()),
            self.inline,
        )
    }

    /// Lowercased label and value, used by the default search predicate.
    pub fn search_text(&self) -> String {
        format!(
            "{} {}",
            self.option.label,
            self.render_value().unwrap_or_default()
        )
        .to_lowercase()
    }
}

impl Subpages for Item {
    fn node_option(&self) -> &SelectOption {
        &self.option
    }

    fn subpages(&self) -> Vec<&Self> {
        self.page_handler()
            .map(|handler| handler.items().iter().filter(|i| i.is_page()).collect())
            .unwrap_or_default()
    }

    fn subpage_mut(
        &mut self,
        id: &str,
        matcher: &dyn Fn(&Self, &str) -> bool,
    ) -> Option<&mut Self> {
        self.page_handler_mut()?
            .items_mut_untracked()
            .iter_mut()
            .find(|i| i.is_page() && matcher(i, id))
    }
}

/// One builder for every item kind; the kind is the builder's payload.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    option: SelectOptionBuilder,
    editable: bool,
    inline: bool,
    kind: ItemKind,
}

impl ItemBuilder {
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

    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    pub fn build(self) -> Item {
        Item {
            option: self.option.build(),
            editable: self.editable,
            inline: self.inline,
            kind: self.kind,
        }
    }
}
