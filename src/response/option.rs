use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A unicode emoji or a custom guild emoji.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Emoji {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub animated: bool,
}

impl Emoji {
    pub fn unicode(name: impl Into<String>) -> Self {
        Emoji {
            name: name.into(),
            id: None,
            animated: false,
        }
    }

    pub fn custom(name: impl Into<String>, id: u64, animated: bool) -> Self {
        Emoji {
            name: name.into(),
            id: Some(id),
            animated,
        }
    }
}

impl fmt::Display for Emoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(
                f,
                "<{}:{}:{}>",
                if self.animated { "a" } else { "" },
                self.name,
                id
            ),
            None => f.write_str(&self.name),
        }
    }
}

/// Identity and presentation shared by pages, items, sorters and filters.
///
/// `value` is the navigation key: it must be unique among siblings and is what select
/// menus report back when the user picks the option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<Emoji>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        SelectOption {
            value: value.into(),
            label: label.into(),
            description: None,
            emoji: None,
        }
    }

    pub fn builder() -> SelectOptionBuilder {
        SelectOptionBuilder::default()
    }

    pub fn mutate(&self) -> SelectOptionBuilder {
        SelectOptionBuilder {
            value: Some(self.value.clone()),
            label: Some(self.label.clone()),
            description: self.description.clone(),
            emoji: self.emoji.clone(),
        }
    }

    /// Label prefixed with the emoji, as used for embed field names.
    pub fn display_label(&self) -> String {
        match &self.emoji {
            Some(emoji) => format!("{} {}", emoji, self.label),
            None => self.label.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectOptionBuilder {
    value: Option<String>,
    label: Option<String>,
    description: Option<String>,
    emoji: Option<Emoji>,
}

impl SelectOptionBuilder {
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_emoji(mut self, emoji: Emoji) -> Self {
        self.emoji = Some(emoji);
        self
    }

    /// Unset values become a random UUID; an unset label falls back to the value.
    pub fn build(self) -> SelectOption {
        let value = self
            .value
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let label = self.label.unwrap_or_else(|| value.clone());
        SelectOption {
            value,
            label,
            description: self.description,
            emoji: self.emoji,
        }
    }
}
