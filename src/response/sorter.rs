use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::item::Item;
use super::option::{Emoji, SelectOption, SelectOptionBuilder};
use crate::errors::ConfigurationError;

pub type Comparator = Arc<dyn Fn(&Item, &Item) -> Ordering + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn inverted(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Ascending => "Ascending",
            SortOrder::Descending => "Descending",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// A named comparator chain the user can cycle through.
///
/// Comparators are consulted in order until one reports a difference; each carries its own
/// direction.
#[derive(Clone)]
pub struct Sorter {
    option: SelectOption,
    comparators: Vec<(Comparator, SortOrder)>,
}

impl Sorter {
    pub fn builder() -> SorterBuilder {
        SorterBuilder::default()
    }

    pub fn option(&self) -> &SelectOption {
        &self.option
    }

    pub fn len(&self) -> usize {
        self.comparators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comparators.is_empty()
    }

    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        self.comparators
            .iter()
            .map(|(cmp, order)| order.apply(cmp(a, b)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Stable sort; `reversed` flips the whole chain.
    pub fn sort(&self, items: &mut [&Item], reversed: bool) {
        items.sort_by(|a, b| {
            let ordering = self.compare(a, b);
            if reversed {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

impl fmt::Debug for Sorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sorter")
            .field("option", &self.option)
            .field(
                "comparators",
                &self.comparators.iter().map(|(_, o)| *o).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Equal when they share identity and the very same comparator closures.
impl PartialEq for Sorter {
    fn eq(&self, other: &Self) -> bool {
        self.option == other.option
            && self.comparators.len() == other.comparators.len()
            && self
                .comparators
                .iter()
                .zip(&other.comparators)
                .all(|((a, ao), (b, bo))| ao == bo && Arc::ptr_eq(a, b))
    }
}

#[derive(Clone, Default)]
pub struct SorterBuilder {
    option: SelectOptionBuilder,
    comparators: Vec<(Comparator, SortOrder)>,
    order: SortOrder,
}

impl SorterBuilder {
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.option = self.option.with_value(value);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.option = self.option.with_label(label);
        self
    }

    pub fn with_emoji(mut self, emoji: Emoji) -> Self {
        self.option = self.option.with_emoji(emoji);
        self
    }

    /// Direction for comparators added after this call.
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_comparator<F>(mut self, cmp: F) -> Self
    where
        F: Fn(&Item, &Item) -> Ordering + Send + Sync + 'static,
    {
        self.comparators.push((Arc::new(cmp), self.order));
        self
    }

    /// Compare by a derived key.
    pub fn with_key<K, F>(self, key: F) -> Self
    where
        K: PartialOrd,
        F: Fn(&Item) -> K + Send + Sync + 'static,
    {
        self.with_comparator(move |a, b| {
            key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal)
        })
    }

    pub fn build(self) -> Result<Sorter, ConfigurationError> {
        if self.comparators.is_empty() {
            return Err(ConfigurationError::EmptySorter);
        }
        Ok(Sorter {
            option: self.option.build(),
            comparators: self.comparators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::item::ItemKind;

    fn number(label: &str, n: f64) -> Item {
        Item::builder(ItemKind::Number(n))
            .with_value(label)
            .with_label(label)
            .build()
    }

    fn value_of(item: &Item) -> f64 {
        match item.kind() {
            ItemKind::Number(n) => *n,
            _ => 0.0,
        }
    }

    #[test]
    fn empty_sorter_is_rejected() {
        let err = Sorter::builder().with_label("Nothing").build().unwrap_err();
        assert_eq!(err, ConfigurationError::EmptySorter);
    }

    #[test]
    fn chain_falls_through_on_ties() {
        let sorter = Sorter::builder()
            .with_label("Value then name")
            .with_key(value_of)
            .with_order(SortOrder::Ascending)
            .with_key(|i: &Item| i.option().label.clone())
            .build()
            .unwrap();
        let (a, b, c) = (number("b", 1.0), number("a", 1.0), number("c", 5.0));
        let mut items = vec![&a, &b, &c];
        sorter.sort(&mut items, false);
        let labels: Vec<&str> = items.iter().map(|i| i.id()).collect();
        // descending by value, then ascending by label
        assert_eq!(labels, vec!["c", "a", "b"]);
        sorter.sort(&mut items, true);
        let labels: Vec<&str> = items.iter().map(|i| i.id()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
    }

    #[test]
    fn clones_compare_equal() {
        let sorter = Sorter::builder().with_key(value_of).build().unwrap();
        assert_eq!(sorter.clone(), sorter);
        let other = Sorter::builder().with_key(value_of).build().unwrap();
        assert_ne!(sorter, other);
        assert_eq!(SortOrder::Ascending.inverted(), SortOrder::Descending);
    }
}
