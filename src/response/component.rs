//! Logical interactive components.
//!
//! These are platform-neutral descriptions of buttons, select menus and text inputs; a
//! transport layer maps them to its own wire format. Paging controls carry fixed custom ids
//! so an inbound interaction can be resolved back into a [`PageAction`](super::PageAction).

use serde::{Deserialize, Serialize};

use super::option::{Emoji, SelectOption};

/// Option value reported by the subpage selector's synthetic back entry.
pub const BACK_VALUE: &str = "BACK";
/// Select menus accept at most this many options.
pub const MAX_SELECT_OPTIONS: usize = 25;
/// Messages accept at most this many action rows.
pub const MAX_ACTION_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

/// The built-in buttons rendered for item pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingButton {
    Previous,
    Index,
    Next,
    Search,
    Sort,
    Order,
}

impl PagingButton {
    pub const ALL: [PagingButton; 6] = [
        PagingButton::Previous,
        PagingButton::Index,
        PagingButton::Next,
        PagingButton::Search,
        PagingButton::Sort,
        PagingButton::Order,
    ];

    pub fn custom_id(self) -> &'static str {
        match self {
            PagingButton::Previous => "paging:previous",
            PagingButton::Index => "paging:index",
            PagingButton::Next => "paging:next",
            PagingButton::Search => "paging:search",
            PagingButton::Sort => "paging:sort",
            PagingButton::Order => "paging:order",
        }
    }

    pub fn from_custom_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.custom_id() == id)
    }

    fn default_label(self) -> &'static str {
        match self {
            PagingButton::Previous => "Previous",
            PagingButton::Index => "1 / 1",
            PagingButton::Next => "Next",
            PagingButton::Search => "Search",
            PagingButton::Sort => "Sort",
            PagingButton::Order => "Order",
        }
    }

    fn style(self) -> ButtonStyle {
        match self {
            PagingButton::Search | PagingButton::Sort | PagingButton::Order => ButtonStyle::Success,
            _ => ButtonStyle::Secondary,
        }
    }
}

/// Which built-in selector a menu is, or `Custom` for page-defined menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuKind {
    Custom,
    PageSelector,
    SubPageSelector,
    ItemEditor,
}

impl MenuKind {
    pub fn custom_id(self) -> Option<&'static str> {
        match self {
            MenuKind::Custom => None,
            MenuKind::PageSelector => Some("paging:page-selector"),
            MenuKind::SubPageSelector => Some("paging:subpage-selector"),
            MenuKind::ItemEditor => Some("paging:item-editor"),
        }
    }

    pub fn from_custom_id(id: &str) -> Option<Self> {
        [
            MenuKind::PageSelector,
            MenuKind::SubPageSelector,
            MenuKind::ItemEditor,
        ]
        .into_iter()
        .find(|kind| kind.custom_id() == Some(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<Emoji>,
    pub style: ButtonStyle,
    pub enabled: bool,
}

impl Button {
    /// A page-defined button, enabled.
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>) -> Self {
        Button {
            custom_id: custom_id.into(),
            label: label.into(),
            emoji: None,
            style: ButtonStyle::Primary,
            enabled: true,
        }
    }

    /// A paging button; disabled until the caller enables it.
    pub fn paging(kind: PagingButton) -> Self {
        Button {
            custom_id: kind.custom_id().to_string(),
            label: kind.default_label().to_string(),
            emoji: None,
            style: kind.style(),
            enabled: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_emoji(mut self, emoji: Emoji) -> Self {
        self.emoji = Some(emoji);
        self
    }

    pub fn with_style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectMenu {
    pub custom_id: String,
    pub kind: MenuKind,
    pub placeholder: String,
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected: Vec<String>,
    pub enabled: bool,
}

impl SelectMenu {
    pub fn new(custom_id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        SelectMenu {
            custom_id: custom_id.into(),
            kind: MenuKind::Custom,
            placeholder: placeholder.into(),
            options: Vec::new(),
            selected: Vec::new(),
            enabled: true,
        }
    }

    /// One of the built-in selectors, with its fixed custom id.
    pub fn paging(kind: MenuKind, placeholder: impl Into<String>) -> Self {
        SelectMenu {
            custom_id: kind.custom_id().unwrap_or("paging:custom").to_string(),
            kind,
            ..SelectMenu::new("", placeholder)
        }
    }

    /// Options past the platform limit are dropped.
    pub fn with_options<I: IntoIterator<Item = SelectOption>>(mut self, options: I) -> Self {
        self.options = options.into_iter().take(MAX_SELECT_OPTIONS).collect();
        self
    }

    /// Marks `value` as selected when one of the options carries it.
    pub fn with_selected(mut self, value: Option<&str>) -> Self {
        self.selected.clear();
        if let Some(value) = value {
            if self.options.iter().any(|o| o.value == value) {
                self.selected.push(value.to_string());
            }
        }
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The label shown when collapsed: the selected option's label, else the placeholder.
    pub fn display_placeholder(&self) -> &str {
        self.selected
            .first()
            .and_then(|v| self.options.iter().find(|o| &o.value == v))
            .map(|o| o.label.as_str())
            .unwrap_or(&self.placeholder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextInputStyle {
    #[default]
    Short,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub style: TextInputStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub required: bool,
}

impl TextInput {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>) -> Self {
        TextInput {
            custom_id: custom_id.into(),
            label: label.into(),
            style: TextInputStyle::Short,
            placeholder: None,
            value: None,
            required: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_style(mut self, style: TextInputStyle) -> Self {
        self.style = style;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Button(Button),
    SelectMenu(SelectMenu),
    TextInput(TextInput),
}

impl Component {
    pub fn custom_id(&self) -> &str {
        match self {
            Component::Button(b) => &b.custom_id,
            Component::SelectMenu(m) => &m.custom_id,
            Component::TextInput(t) => &t.custom_id,
        }
    }

    pub fn disabled(self) -> Self {
        match self {
            Component::Button(b) => Component::Button(b.with_enabled(false)),
            Component::SelectMenu(m) => Component::SelectMenu(m.with_enabled(false)),
            other => other,
        }
    }
}

impl From<Button> for Component {
    fn from(b: Button) -> Self {
        Component::Button(b)
    }
}

impl From<SelectMenu> for Component {
    fn from(m: SelectMenu) -> Self {
        Component::SelectMenu(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    pub components: Vec<Component>,
}

impl ActionRow {
    pub fn new<I: IntoIterator<Item = Component>>(components: I) -> Self {
        ActionRow {
            components: components.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn disabled(self) -> Self {
        ActionRow::new(self.components.into_iter().map(Component::disabled))
    }

    pub fn find(&self, custom_id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.custom_id() == custom_id)
    }
}

/// A popup form; each text input occupies its own row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

impl Modal {
    pub fn new(custom_id: impl Into<String>, title: impl Into<String>) -> Self {
        Modal {
            custom_id: custom_id.into(),
            title: title.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: TextInput) -> Self {
        self.inputs.push(input);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_ids_resolve_back() {
        for button in PagingButton::ALL {
            assert_eq!(PagingButton::from_custom_id(button.custom_id()), Some(button));
        }
        assert_eq!(
            MenuKind::from_custom_id("paging:subpage-selector"),
            Some(MenuKind::SubPageSelector)
        );
        assert_eq!(MenuKind::from_custom_id("custom"), None);
    }

    #[test]
    fn paging_buttons_start_disabled() {
        let b = Button::paging(PagingButton::Next);
        assert!(!b.enabled);
        assert!(Button::new("x", "X").enabled);
    }

    #[test]
    fn selection_requires_known_option() {
        let menu = SelectMenu::paging(MenuKind::PageSelector, "Select a page.")
            .with_options(vec![SelectOption::new("a", "Alpha")])
            .with_selected(Some("zzz"));
        assert!(menu.selected.is_empty());
        assert_eq!(menu.display_placeholder(), "Select a page.");
        let menu = menu.with_selected(Some("a"));
        assert_eq!(menu.display_placeholder(), "Alpha");
    }

    #[test]
    fn options_are_capped() {
        let menu = SelectMenu::new("m", "p").with_options(
            (0..40).map(|i| SelectOption::new(i.to_string(), i.to_string())),
        );
        assert_eq!(menu.options.len(), MAX_SELECT_OPTIONS);
    }

    #[test]
    fn disabling_a_row_disables_every_control() {
        let row = ActionRow::new(vec![
            Button::new("a", "A").into(),
            SelectMenu::new("b", "B").into(),
        ])
        .disabled();
        for component in &row.components {
            match component {
                Component::Button(b) => assert!(!b.enabled),
                Component::SelectMenu(m) => assert!(!m.enabled),
                Component::TextInput(_) => unreachable!(),
            }
        }
    }
}
