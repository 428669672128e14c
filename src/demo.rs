//! Console driver used by `chatpager demo`.
//!
//! A sample response is sent through the cache to a [`ConsoleSink`], and each stdin command is
//! turned into the same [`Interaction`] a chat platform would deliver.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, Result};

use crate::cache::dispatch::{Interaction, InteractionKind, MessageSink};
use crate::config::ResponseConfig;
use crate::errors::ConfigurationError;
use crate::response::component::{BACK_VALUE, PagingButton};
use crate::response::item_handler::SEARCH_PAGE_INPUT;
use crate::response::{
    ActionRow, Component, Embed, Filter, Item, ItemHandler, ItemKind, MenuKind, MessagePayload,
    Modal, Page, Response, ResponseBuilder, Search, SortOrder, Sorter,
};
use crate::snowflake::Snowflake;

const CRATES: &[(&str, &str, bool)] = &[
    ("anyhow", "1.0", true),
    ("atty", "0.2", false),
    ("chrono", "0.4", true),
    ("clap", "4.4", true),
    ("env_logger", "0.10", true),
    ("log", "0.4", true),
    ("rand", "0.8", false),
    ("serde", "1.0", true),
    ("serde_json", "1.0", true),
    ("tempfile", "3.10", false),
    ("thiserror", "1.0", true),
    ("tokio", "1.0", true),
    ("toml", "0.8", true),
    ("uuid", "1.0", true),
];

/// Dotted version split into numeric parts so `0.10` sorts after `0.8`.
fn version_of(item: &Item) -> Vec<u64> {
    match item.kind() {
        ItemKind::Text(version) => version
            .split('.')
            .filter_map(|part| part.parse().ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn is_runtime(item: &Item) -> bool {
    item.is_page() || item.option().description.as_deref() == Some("runtime")
}

fn crate_items(cfg: &ResponseConfig) -> Result<ItemHandler, ConfigurationError> {
    let mut builder = ItemHandler::builder()
        .with_items_per_page(cfg.items_per_page().min(5))
        .with_editor(true)
        .with_item(Item::builder(ItemKind::Title("Dependencies".into())).build())
        .with_item(
            Item::builder(ItemKind::Footer(
                "Showing {START_INDEX}-{END_INDEX} of {FILTERED_SIZE}".into(),
            ))
            .build(),
        )
        .with_sorter(
            Sorter::builder()
                .with_value("name")
                .with_label("Name")
                .with_order(SortOrder::Ascending)
                .with_key(|item: &Item| item.option().label.clone())
                .build()?,
        )
        .with_sorter(
            Sorter::builder()
                .with_value("version")
                .with_label("Version")
                .with_key(version_of)
                .build()?,
        )
        .with_filter(
            Filter::builder()
                .with_value("runtime")
                .with_label("Runtime only")
                .with_predicate(is_runtime)
                .enabled(false)
                .build()?,
        )
        .with_search(Search::by_text("name", "Crate name"));
    for (name, version, runtime) in CRATES {
        builder = builder.with_item(
            Item::builder(ItemKind::Text(version.to_string()))
                .with_value(*name)
                .with_label(*name)
                .with_description(if *runtime { "runtime" } else { "dev" })
                .editable(true)
                .inline(true)
                .build(),
        );
    }
    let features = ItemHandler::builder()
        .with_item(Item::text("full", "tokio/full", "every runtime feature"))
        .with_item(Item::text("derive", "serde/derive", "derive macros"))
        .with_item(Item::text("v4", "uuid/v4", "random identifiers"))
        .build();
    Ok(builder
        .with_item(Item::page("features", "Enabled features", features))
        .build())
}

/// The response driven by the demo: an overview with subpages and a paginated crate list.
pub fn sample_response(cfg: &ResponseConfig) -> Result<Response, ConfigurationError> {
    let about = Page::builder()
        .with_value("about")
        .with_label("About")
        .with_content("Pages form a tree; the subpage menu walks it.")
        .build()?;
    let navigation = Page::builder()
        .with_value("navigation")
        .with_label("Navigation")
        .with_embed(
            Embed::default()
                .with_title("Navigation")
                .with_description("Back pops one level; the page menu jumps between roots."),
        )
        .build()?;
    let overview = Page::builder()
        .with_value("overview")
        .with_label("Overview")
        .with_description("What this demo shows")
        .with_content("Welcome to the chatpager demo.")
        .with_pages([about, navigation])
        .build()?;
    let crates = Page::builder()
        .with_value("crates")
        .with_label("Crates")
        .with_description("A paginated, sortable list")
        .with_item_handler(crate_items(cfg)?)
        .build()?;
    ResponseBuilder::from_config(cfg)
        .with_pages([overview, crates])
        .build()
}

/// One line of demo input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoCommand {
    Page(String),
    Sub(String),
    Back,
    Next,
    Prev,
    Goto(i64),
    Search(String),
    Sort,
    Order,
    Item(String),
    Help,
    Quit,
}

pub const HELP: &str = "commands: page <id> | sub <id> | back | next | prev | goto <n> | \
search <text> | sort | order | item <id> | help | quit";

pub fn parse_command(line: &str) -> Result<DemoCommand> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let arg = |name: &str| -> Result<String> {
        if rest.is_empty() {
            Err(anyhow!("'{}' needs an argument", name))
        } else {
            Ok(rest.to_string())
        }
    };
    match word.to_ascii_lowercase().as_str() {
        "page" => Ok(DemoCommand::Page(arg("page")?)),
        "sub" => Ok(DemoCommand::Sub(arg("sub")?)),
        "back" => Ok(DemoCommand::Back),
        "next" | "n" => Ok(DemoCommand::Next),
        "prev" | "p" => Ok(DemoCommand::Prev),
        "goto" => {
            let n = arg("goto")?
                .parse::<i64>()
                .map_err(|e| anyhow!("goto expects a number: {}", e))?;
            Ok(DemoCommand::Goto(n))
        }
        "search" => Ok(DemoCommand::Search(arg("search")?)),
        "sort" => Ok(DemoCommand::Sort),
        "order" => Ok(DemoCommand::Order),
        "item" => Ok(DemoCommand::Item(arg("item")?)),
        "help" | "?" => Ok(DemoCommand::Help),
        "quit" | "exit" | "q" => Ok(DemoCommand::Quit),
        other => Err(anyhow!("unknown command '{}'; {}", other, HELP)),
    }
}

fn menu_id(kind: MenuKind) -> &'static str {
    kind.custom_id().unwrap_or_default()
}

impl DemoCommand {
    /// The interaction this command stands for. Search-style commands first need the search
    /// modal open; see [`DemoCommand::modal_inputs`].
    pub fn interaction(
        &self,
        channel: Snowflake,
        message: Snowflake,
        user: Snowflake,
    ) -> Option<Interaction> {
        let select = |kind: MenuKind, value: &str| {
            Interaction::select(channel, message, user, menu_id(kind), value)
        };
        let button = |kind: PagingButton| Interaction::button(channel, message, user, kind.custom_id());
        match self {
            DemoCommand::Page(id) => Some(select(MenuKind::PageSelector, id)),
            DemoCommand::Sub(id) => Some(select(MenuKind::SubPageSelector, id)),
            DemoCommand::Back => Some(select(MenuKind::SubPageSelector, BACK_VALUE)),
            DemoCommand::Item(id) => Some(select(MenuKind::ItemEditor, id)),
            DemoCommand::Next => Some(button(PagingButton::Next)),
            DemoCommand::Prev => Some(button(PagingButton::Previous)),
            DemoCommand::Sort => Some(button(PagingButton::Sort)),
            DemoCommand::Order => Some(button(PagingButton::Order)),
            DemoCommand::Goto(_) | DemoCommand::Search(_) => Some(button(PagingButton::Search)),
            DemoCommand::Help | DemoCommand::Quit => None,
        }
    }

    /// Inputs to submit into the search modal after [`DemoCommand::interaction`] opened it.
    pub fn modal_inputs(&self) -> Option<Vec<(String, String)>> {
        match self {
            DemoCommand::Goto(n) => Some(vec![(SEARCH_PAGE_INPUT.to_string(), n.to_string())]),
            DemoCommand::Search(text) => Some(vec![("name".to_string(), text.clone())]),
            _ => None,
        }
    }
}

pub fn modal_submit(
    channel: Snowflake,
    message: Snowflake,
    user: Snowflake,
    modal: &Modal,
    inputs: Vec<(String, String)>,
) -> Interaction {
    Interaction {
        channel_id: channel,
        message_id: message,
        user_id: user,
        kind: InteractionKind::ModalSubmit {
            custom_id: modal.custom_id.clone(),
            inputs,
        },
    }
}

fn render_row(row: &ActionRow) -> String {
    row.components
        .iter()
        .map(|component| match component {
            Component::Button(b) if b.enabled => format!("[{}]", b.label),
            Component::Button(b) => format!("({})", b.label),
            Component::SelectMenu(m) => {
                let options: Vec<&str> = m.options.iter().map(|o| o.value.as_str()).collect();
                let selected = m.selected.first().map(String::as_str).unwrap_or("-");
                format!("<{}: {} | {}>", m.display_placeholder(), selected, options.join(" "))
            }
            Component::TextInput(t) => format!("{{{}}}", t.label),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain-text rendition of a payload for terminals.
pub fn render_text(payload: &MessagePayload) -> String {
    let mut out = Vec::new();
    if let Some(content) = &payload.content {
        out.push(content.clone());
    }
    for embed in &payload.embeds {
        if let Some(title) = &embed.title {
            out.push(format!("== {} ==", title));
        }
        if let Some(description) = &embed.description {
            out.push(description.clone());
        }
        for field in &embed.fields {
            out.push(format!("  {}: {}", field.name, field.value));
        }
        if let Some(footer) = &embed.footer {
            out.push(format!("-- {}", footer));
        }
    }
    out.extend(payload.components.iter().map(render_row));
    out.join("\n")
}

/// Prints every outbound request instead of talking to a platform.
#[derive(Debug)]
pub struct ConsoleSink {
    json: bool,
    next_id: AtomicU64,
    last_modal: Mutex<Option<Modal>>,
}

impl ConsoleSink {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            next_id: AtomicU64::new(1000),
            last_modal: Mutex::new(None),
        }
    }

    pub fn last_modal(&self) -> Option<Modal> {
        self.last_modal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn print(&self, verb: &str, message: Snowflake, payload: &MessagePayload) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(payload)?);
        } else {
            println!("--- {} message {} ---\n{}", verb, message, render_text(payload));
        }
        Ok(())
    }
}

impl MessageSink for ConsoleSink {
    async fn create_message(&self, _channel: Snowflake, payload: &MessagePayload) -> Result<Snowflake> {
        let id = Snowflake(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.print("create", id, payload)?;
        Ok(id)
    }

    async fn edit_message(
        &self,
        _channel: Snowflake,
        message: Snowflake,
        payload: &MessagePayload,
    ) -> Result<()> {
        self.print("edit", message, payload)
    }

    async fn present_modal(&self, _channel: Snowflake, _message: Snowflake, modal: &Modal) -> Result<()> {
        if !self.json {
            let inputs: Vec<&str> = modal.inputs.iter().map(|i| i.label.as_str()).collect();
            println!("--- modal '{}': {} ---", modal.title, inputs.join(", "));
        }
        *self.last_modal.lock().unwrap_or_else(PoisonError::into_inner) = Some(modal.clone());
        Ok(())
    }
}
