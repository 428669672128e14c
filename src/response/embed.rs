use serde::{Deserialize, Serialize};

use super::item::{Item, ItemKind};

/// One name/value pair inside an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

/// A logical rich-content block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

impl Embed {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.author.is_none()
            && self.footer.is_none()
            && self.image_url.is_none()
            && self.thumbnail_url.is_none()
            && self.fields.is_empty()
    }

    /// Fold static items into the embed's slots and append the rendered fields.
    /// A later static item of the same kind replaces an earlier one.
    pub fn from_items(static_items: &[Item], fields: Vec<Field>) -> Self {
        let mut embed = Embed::default();
        for item in static_items {
            match item.kind() {
                ItemKind::Title(text) => embed.title = Some(text.clone()),
                ItemKind::Description(text) => embed.description = Some(text.clone()),
                ItemKind::Author { name, .. } => embed.author = Some(name.clone()),
                ItemKind::Footer(text) => embed.footer = Some(text.clone()),
                ItemKind::Image(url) => embed.image_url = Some(url.clone()),
                ItemKind::Thumbnail(url) => embed.thumbnail_url = Some(url.clone()),
                _ => {}
            }
        }
        embed.fields = fields;
        embed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_items_fill_slots() {
        let items = vec![
            Item::builder(ItemKind::Title("Old".into())).build(),
            Item::builder(ItemKind::Title("Inventory".into())).build(),
            Item::builder(ItemKind::Footer("page 1".into())).build(),
        ];
        let embed = Embed::from_items(&items, vec![Field::new("a", "b", true)]);
        assert_eq!(embed.title.as_deref(), Some("Inventory"));
        assert_eq!(embed.footer.as_deref(), Some("page 1"));
        assert_eq!(embed.fields.len(), 1);
        assert!(!embed.is_empty());
        assert!(Embed::default().is_empty());
    }
}
