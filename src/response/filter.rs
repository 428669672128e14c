use std::fmt;
use std::sync::Arc;

use super::component::TextInput;
use super::item::Item;
use super::option::{SelectOption, SelectOptionBuilder};
use crate::errors::ConfigurationError;

pub type Predicate = Arc<dyn Fn(&Item) -> bool + Send + Sync>;
pub type SearchPredicate = Arc<dyn Fn(&Item, &str) -> bool + Send + Sync>;

/// A named, toggleable predicate narrowing the visible field items.
#[derive(Clone)]
pub struct Filter {
    option: SelectOption,
    predicate: Predicate,
    enabled: bool,
}

impl Filter {
    pub fn builder() -> FilterBuilder {
        FilterBuilder {
            option: SelectOption::builder(),
            predicate: None,
            enabled: true,
        }
    }

    pub fn option(&self) -> &SelectOption {
        &self.option
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Disabled filters let everything through.
    pub fn matches(&self, item: &Item) -> bool {
        !self.enabled || (self.predicate)(item)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("option", &self.option)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.option == other.option
            && self.enabled == other.enabled
            && Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

pub struct FilterBuilder {
    option: SelectOptionBuilder,
    predicate: Option<Predicate>,
    enabled: bool,
}

impl FilterBuilder {
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.option = self.option.with_value(value);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.option = self.option.with_label(label);
        self
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Item) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn build(self) -> Result<Filter, ConfigurationError> {
        let predicate = self
            .predicate
            .ok_or(ConfigurationError::MissingField("predicate"))?;
        Ok(Filter {
            option: self.option.build(),
            predicate,
            enabled: self.enabled,
        })
    }
}

/// A text input offered in the search modal, plus how a query matches an item.
#[derive(Clone)]
pub struct Search {
    input: TextInput,
    predicate: SearchPredicate,
}

impl Search {
    pub fn builder() -> SearchBuilder {
        SearchBuilder::default()
    }

    /// Case-insensitive substring match over label and rendered value.
    pub fn by_text(id: impl Into<String>, label: impl Into<String>) -> Self {
        Search {
            input: TextInput::new(id, label).with_placeholder("Text to find"),
            predicate: Arc::new(|item: &Item, query: &str| {
                item.search_text().contains(&query.to_lowercase())
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.input.custom_id
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn matches(&self, item: &Item, query: &str) -> bool {
        (self.predicate)(item, query)
    }
}

impl fmt::Debug for Search {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Search").field("input", &self.input).finish()
    }
}

impl PartialEq for Search {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input && Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

#[derive(Default)]
pub struct SearchBuilder {
    id: Option<String>,
    label: Option<String>,
    placeholder: Option<String>,
    predicate: Option<SearchPredicate>,
}

impl SearchBuilder {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Item, &str) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn build(self) -> Result<Search, ConfigurationError> {
        let id = self.id.ok_or(ConfigurationError::MissingField("id"))?;
        let predicate = self
            .predicate
            .ok_or(ConfigurationError::MissingField("predicate"))?;
        let mut input = TextInput::new(id.clone(), self.label.unwrap_or(id));
        input.placeholder = self.placeholder;
        Ok(Search { input, predicate })
    }
}
