mod common;

use std::sync::Arc;
use std::time::Duration;

use chatpager::cache::dispatch::{
    dispatch, send_followup, send_response, Interaction, InteractionKind, Outcome,
};
use chatpager::cache::sweeper::{start_sweeper, SweeperConfig};
use chatpager::cache::{EntryState, ManualClock, ResponseCache};
use chatpager::errors::{CacheError, DispatchError};
use chatpager::response::component::{PagingButton, BACK_VALUE};
use chatpager::response::item_handler::SEARCH_PAGE_INPUT;
use chatpager::response::{Component, MenuKind, Response};
use chatpager::snowflake::Snowflake;
use common::{branch, item_page, leaf, RecordingSink, CHANNEL, USER};

fn paged() -> Response {
    Response::builder()
        .with_pages(vec![
            item_page("list", 23, 10),
            branch("info", vec![leaf("about")]),
        ])
        .build()
        .unwrap()
}

fn button(message: Snowflake, kind: PagingButton) -> Interaction {
    Interaction::button(CHANNEL, message, USER, kind.custom_id())
}

fn select(message: Snowflake, kind: MenuKind, value: &str) -> Interaction {
    Interaction::select(CHANNEL, message, USER, kind.custom_id().unwrap(), value)
}

fn index_label(payload: &chatpager::response::MessagePayload) -> Option<String> {
    payload
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|c| match c {
            Component::Button(b) if b.custom_id == PagingButton::Index.custom_id() => {
                Some(b.label.clone())
            }
            _ => None,
        })
}

async fn setup() -> (ResponseCache, RecordingSink, Snowflake) {
    let cache = ResponseCache::new();
    let sink = RecordingSink::new();
    let message = send_response(&cache, &sink, CHANNEL, USER, paged())
        .await
        .unwrap();
    (cache, sink, message)
}

#[tokio::test]
async fn button_press_edits_the_message() {
    let (cache, sink, message) = setup().await;
    let outcome = dispatch(&cache, &sink, button(message, PagingButton::Next))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Edited);
    let (edited, payload) = sink.edits.lock().unwrap().last().cloned().unwrap();
    assert_eq!(edited, message);
    assert_eq!(index_label(&payload).as_deref(), Some("2 / 3"));

    let entry = cache.get(CHANNEL, message).unwrap();
    let entry = entry.lock().await;
    assert!(!entry.is_modified());
    assert!(!entry.is_busy());
}

#[tokio::test]
async fn no_op_press_sends_nothing() {
    let (cache, sink, message) = setup().await;
    let outcome = dispatch(&cache, &sink, button(message, PagingButton::Previous))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Unchanged);
    assert_eq!(sink.edit_count(), 0);
}

#[tokio::test]
async fn menus_navigate_and_back_returns() {
    let (cache, sink, message) = setup().await;
    dispatch(&cache, &sink, select(message, MenuKind::PageSelector, "info"))
        .await
        .unwrap();
    dispatch(&cache, &sink, select(message, MenuKind::SubPageSelector, "about"))
        .await
        .unwrap();
    assert_eq!(
        sink.last_edit().unwrap().content.as_deref(),
        Some("page about")
    );
    dispatch(&cache, &sink, select(message, MenuKind::SubPageSelector, BACK_VALUE))
        .await
        .unwrap();
    assert_eq!(sink.last_edit().unwrap().content.as_deref(), Some("page info"));
    assert_eq!(sink.edit_count(), 3);
}

#[tokio::test]
async fn unknown_controls_are_left_to_the_caller() {
    let (cache, sink, message) = setup().await;
    let outcome = dispatch(
        &cache,
        &sink,
        Interaction::button(CHANNEL, message, USER, "custom:vote"),
    )
    .await
    .unwrap();
    assert_eq!(outcome, Outcome::Unhandled("custom:vote".into()));
}

#[tokio::test]
async fn held_entry_rejects_a_second_interaction() {
    let (cache, sink, message) = setup().await;
    let shared = cache.get(CHANNEL, message).unwrap();
    let guard = cache.try_acquire(&shared).unwrap();
    let err = dispatch(&cache, &sink, button(message, PagingButton::Next))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Cache(CacheError::Busy)));
    drop(guard);
    assert_eq!(
        dispatch(&cache, &sink, button(message, PagingButton::Next))
            .await
            .unwrap(),
        Outcome::Edited
    );
}

#[tokio::test]
async fn failed_edit_keeps_the_change_uncommitted() {
    let (cache, sink, message) = setup().await;
    sink.fail_edits(true);
    let err = dispatch(&cache, &sink, button(message, PagingButton::Next))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Send(_)));
    {
        let shared = cache.get(CHANNEL, message).unwrap();
        let entry = shared.lock().await;
        assert!(entry.is_modified());
        assert!(!entry.is_busy());
        let committed = entry.committed_response().current_page().unwrap();
        assert_eq!(committed.item_handler().current_index(), 1);
    }

    sink.fail_edits(false);
    // An ignored control still flushes the pending change.
    let outcome = dispatch(&cache, &sink, select(message, MenuKind::PageSelector, "missing"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Edited);
    assert_eq!(index_label(&sink.last_edit().unwrap()).as_deref(), Some("2 / 3"));
}

#[tokio::test]
async fn search_goes_through_a_modal() {
    let (cache, sink, message) = setup().await;
    let outcome = dispatch(&cache, &sink, button(message, PagingButton::Search))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::ModalPresented);
    let modal = sink.last_modal().unwrap();
    assert!(modal
        .inputs
        .iter()
        .any(|input| input.custom_id == SEARCH_PAGE_INPUT));

    let submit = |custom_id: String| Interaction {
        channel_id: CHANNEL,
        message_id: message,
        user_id: USER,
        kind: InteractionKind::ModalSubmit {
            custom_id,
            inputs: vec![(SEARCH_PAGE_INPUT.to_string(), "3".to_string())],
        },
    };
    let err = dispatch(&cache, &sink, submit("search:other".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::StaleModal(_)));

    let outcome = dispatch(&cache, &sink, submit(modal.custom_id.clone()))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Edited);
    assert_eq!(index_label(&sink.last_edit().unwrap()).as_deref(), Some("3 / 3"));

    // The modal is spent once answered.
    let err = dispatch(&cache, &sink, submit(modal.custom_id))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::StaleModal(_)));
}

#[tokio::test]
async fn other_users_cannot_drive_the_message() {
    let (cache, sink, message) = setup().await;
    let foreign = Interaction::button(
        CHANNEL,
        message,
        Snowflake(999),
        PagingButton::Next.custom_id(),
    );
    let err = dispatch(&cache, &sink, foreign).await.unwrap_err();
    assert!(matches!(err, DispatchError::Cache(CacheError::NotOwner { .. })));
    assert_eq!(sink.edit_count(), 0);
}

#[tokio::test]
async fn followup_interactions_edit_the_followup() {
    let (cache, sink, message) = setup().await;
    let parent = cache.get(CHANNEL, message).unwrap();
    let followup = send_followup(&cache, &sink, &parent, "extra", paged())
        .await
        .unwrap();
    let outcome = dispatch(&cache, &sink, button(followup, PagingButton::Next))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Edited);
    assert_eq!(sink.edits.lock().unwrap().last().unwrap().0, followup);

    let entry = parent.lock().await;
    let state = entry.find_followup("extra").unwrap();
    assert!(!state.is_modified());
    assert_eq!(
        state.response().current_page().unwrap().item_handler().current_index(),
        2
    );
    assert_eq!(
        entry.response().current_page().unwrap().item_handler().current_index(),
        1
    );
}

#[tokio::test]
async fn swept_messages_report_expiry() {
    let clock = Arc::new(ManualClock::new(0));
    let cache = Arc::new(ResponseCache::with_clock(clock.clone()));
    let sink = RecordingSink::new();
    let message = send_response(&cache, &sink, CHANNEL, USER, paged())
        .await
        .unwrap();
    let sweeper = start_sweeper(
        cache.clone(),
        SweeperConfig {
            interval_ms: 3_600_000,
            stats_interval_ms: 0,
        },
    );

    clock.advance(9_000);
    assert_eq!(sweeper.sweep_now().await.unwrap().evicted, 0);
    dispatch(&cache, &sink, button(message, PagingButton::Next))
        .await
        .unwrap();

    clock.advance(10_001);
    assert_eq!(sweeper.sweep_now().await.unwrap().evicted, 1);
    let err = dispatch(&cache, &sink, button(message, PagingButton::Next))
        .await
        .unwrap_err();
    match err {
        DispatchError::Cache(cache_err) => assert!(cache_err.is_expired()),
        other => panic!("expected a cache error, got {:?}", other),
    }
    sweeper.shutdown().await;
}

#[tokio::test]
async fn cancelled_dispatch_leaves_the_entry_sweepable() {
    let clock = Arc::new(ManualClock::new(0));
    let cache = ResponseCache::with_clock(clock.clone());
    let sink = RecordingSink::new();
    let message = send_response(&cache, &sink, CHANNEL, USER, paged())
        .await
        .unwrap();
    sink.stall_edits(true);
    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        dispatch(&cache, &sink, button(message, PagingButton::Next)),
    )
    .await;
    assert!(timed_out.is_err());
    {
        let shared = cache.get(CHANNEL, message).unwrap();
        let entry = shared.lock().await;
        assert_eq!(entry.state(), EntryState::Idle);
        assert!(entry.is_modified());
    }

    clock.advance(10_000);
    let report = cache.sweep();
    assert_eq!(report.evicted, 1);
    assert_eq!(report.remaining, 0);
}

#[tokio::test]
async fn loading_entry_rejects_interactions() {
    let cache = ResponseCache::new();
    let sink = RecordingSink::new();
    cache
        .create_and_get(CHANNEL, USER, Snowflake(77), paged())
        .unwrap();
    let err = dispatch(&cache, &sink, button(Snowflake(77), PagingButton::Next))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Cache(CacheError::Busy)));
    assert_eq!(sink.edit_count(), 0);
    let shared = cache.get(CHANNEL, Snowflake(77)).unwrap();
    assert_eq!(shared.lock().await.state(), EntryState::Loading);
}
