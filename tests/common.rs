//! Shared fixtures for the integration tests: small page trees, numbered items and a sink
//! that records outbound requests instead of sending them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use chatpager::cache::dispatch::MessageSink;
use chatpager::response::{Item, ItemHandler, MessagePayload, Modal, Page, Response};
use chatpager::snowflake::Snowflake;

pub const CHANNEL: Snowflake = Snowflake(10);
pub const USER: Snowflake = Snowflake(20);

pub fn leaf(id: &str) -> Page {
    Page::builder()
        .with_value(id)
        .with_label(id)
        .with_content(format!("page {}", id))
        .build()
        .expect("leaf page")
}

pub fn branch(id: &str, children: Vec<Page>) -> Page {
    Page::builder()
        .with_value(id)
        .with_label(id)
        .with_content(format!("page {}", id))
        .with_pages(children)
        .build()
        .expect("branch page")
}

/// Roots `A` and `B`, each with a single child `A1` / `B1`.
pub fn two_roots() -> Vec<Page> {
    vec![
        branch("A", vec![leaf("A1")]),
        branch("B", vec![leaf("B1")]),
    ]
}

/// Three levels deep with a fan-out of two, used by the random walks.
#[allow(dead_code)]
pub fn deep_tree() -> Vec<Page> {
    ["r1", "r2"]
        .iter()
        .map(|root| {
            branch(
                root,
                ["x", "y"]
                    .iter()
                    .map(|mid| {
                        let mid_id = format!("{}-{}", root, mid);
                        let leaves = ["1", "2"]
                            .iter()
                            .map(|l| leaf(&format!("{}-{}", mid_id, l)))
                            .collect();
                        branch(&mid_id, leaves)
                    })
                    .collect(),
            )
        })
        .collect()
}

#[allow(dead_code)]
pub fn numbered_items(n: usize) -> Vec<Item> {
    (1..=n)
        .map(|i| Item::text(format!("item-{}", i), format!("Item {}", i), format!("value {}", i)))
        .collect()
}

#[allow(dead_code)]
pub fn item_page(id: &str, n: usize, per_page: usize) -> Page {
    Page::builder()
        .with_value(id)
        .with_label(id)
        .with_item_handler(
            ItemHandler::builder()
                .with_items(numbered_items(n))
                .with_items_per_page(per_page)
                .build(),
        )
        .build()
        .expect("item page")
}

pub fn response(pages: Vec<Page>) -> Response {
    Response::builder()
        .with_pages(pages)
        .build()
        .expect("response")
}

/// Records every request; edits can be switched to fail or to never complete.
#[derive(Debug, Default)]
pub struct RecordingSink {
    next_id: AtomicU64,
    fail_edits: AtomicBool,
    stall_edits: AtomicBool,
    pub created: Mutex<Vec<(Snowflake, MessagePayload)>>,
    pub edits: Mutex<Vec<(Snowflake, MessagePayload)>>,
    pub modals: Mutex<Vec<Modal>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(500),
            ..Self::default()
        }
    }

    pub fn fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    pub fn stall_edits(&self, stall: bool) {
        self.stall_edits.store(stall, Ordering::SeqCst);
    }

    pub fn edit_count(&self) -> usize {
        self.edits.lock().unwrap().len()
    }

    pub fn last_edit(&self) -> Option<MessagePayload> {
        self.edits.lock().unwrap().last().map(|(_, p)| p.clone())
    }

    pub fn last_modal(&self) -> Option<Modal> {
        self.modals.lock().unwrap().last().cloned()
    }
}

impl MessageSink for RecordingSink {
    async fn create_message(
        &self,
        _channel: Snowflake,
        payload: &MessagePayload,
    ) -> anyhow::Result<Snowflake> {
        let id = Snowflake(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.created.lock().unwrap().push((id, payload.clone()));
        Ok(id)
    }

    async fn edit_message(
        &self,
        _channel: Snowflake,
        message: Snowflake,
        payload: &MessagePayload,
    ) -> anyhow::Result<()> {
        if self.stall_edits.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(anyhow!("edit rejected for {}", message));
        }
        self.edits.lock().unwrap().push((message, payload.clone()));
        Ok(())
    }

    async fn present_modal(
        &self,
        _channel: Snowflake,
        _message: Snowflake,
        modal: &Modal,
    ) -> anyhow::Result<()> {
        self.modals.lock().unwrap().push(modal.clone());
        Ok(())
    }
}
