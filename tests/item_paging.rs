mod common;

use chatpager::response::item_handler::{SEARCH_INDEX_INPUT, SEARCH_PAGE_INPUT};
use chatpager::response::{
    Filter, Item, ItemHandler, ItemKind, PageAction, Search, SortOrder, Sorter,
};
use common::{item_page, numbered_items, response};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn handler(n: usize, per_page: usize) -> ItemHandler {
    ItemHandler::builder()
        .with_items(numbered_items(n))
        .with_items_per_page(per_page)
        .build()
}

#[test]
fn twenty_three_items_in_tens() {
    let mut h = handler(23, 10);
    assert_eq!(h.total_pages(), 3);
    h.goto_page(99);
    assert_eq!(h.current_index(), 3);
    h.goto_page(-5);
    assert_eq!(h.current_index(), 1);
}

#[test]
fn goto_page_always_lands_in_bounds() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let n = rng.gen_range(0..80);
        let k = rng.gen_range(1..=24);
        let mut h = handler(n, k);
        let expected = std::cmp::max(1, (n + k - 1) / k);
        assert_eq!(h.total_pages(), expected, "n={} k={}", n, k);
        let target = match rng.gen_range(0..4) {
            0 => i64::MIN,
            1 => i64::MAX,
            _ => rng.gen_range(-1000..1000),
        };
        h.goto_page(target);
        assert!(
            (1..=expected).contains(&h.current_index()),
            "n={} k={} target={} landed on {}",
            n,
            k,
            target,
            h.current_index()
        );
    }
}

#[test]
fn window_shows_the_current_slice() {
    let mut h = handler(23, 10);
    h.last_page();
    let ids: Vec<String> = h
        .cached_field_items()
        .iter()
        .map(|i| i.id().to_string())
        .collect();
    assert_eq!(ids, vec!["item-21", "item-22", "item-23"]);
    assert!(!h.next_page());
    assert!(h.previous_page());
    assert_eq!(h.cached_field_items().len(), 10);
}

#[test]
fn static_items_are_not_paginated() {
    let mut h = ItemHandler::builder()
        .with_item(Item::builder(ItemKind::Title("Inventory".into())).build())
        .with_item(
            Item::builder(ItemKind::Footer("{START_INDEX}-{END_INDEX} of {SIZE}".into())).build(),
        )
        .with_items(numbered_items(7))
        .with_items_per_page(5)
        .build();
    assert_eq!(h.total_pages(), 2);
    h.next_page();
    let footer = h
        .cached_static_items()
        .iter()
        .find_map(|i| match i.kind() {
            ItemKind::Footer(text) => Some(text.clone()),
            _ => None,
        });
    assert_eq!(footer.as_deref(), Some("6-7 of 7"));
}

#[test]
fn sorters_cycle_and_order_inverts() {
    let by_label = Sorter::builder()
        .with_value("label")
        .with_label("Label")
        .with_order(SortOrder::Ascending)
        .with_key(|i: &Item| i.option().label.clone())
        .build()
        .unwrap();
    let by_number = Sorter::builder()
        .with_value("number")
        .with_label("Number")
        .with_order(SortOrder::Ascending)
        .with_key(|i: &Item| {
            i.id()
                .trim_start_matches("item-")
                .parse::<u32>()
                .unwrap_or(0)
        })
        .build()
        .unwrap();
    let mut h = ItemHandler::builder()
        .with_items(numbered_items(12))
        .with_items_per_page(3)
        .with_sorter(by_label)
        .with_sorter(by_number)
        .build();
    let first = |h: &mut ItemHandler| h.cached_field_items()[0].id().to_string();
    // "Item 1", "Item 10", "Item 11", ...
    assert_eq!(first(&mut h), "item-1");
    assert_eq!(h.cached_field_items()[1].id(), "item-10");
    h.next_page();
    assert!(h.next_sorter());
    assert_eq!(h.current_index(), 1);
    assert_eq!(h.cached_field_items()[1].id(), "item-2");
    h.invert_order();
    assert_eq!(first(&mut h), "item-12");
}

#[test]
fn filters_narrow_the_page_count() {
    let even = Filter::builder()
        .with_value("even")
        .with_label("Even only")
        .with_predicate(|i: &Item| {
            i.id()
                .trim_start_matches("item-")
                .parse::<u32>()
                .map(|n| n % 2 == 0)
                .unwrap_or(false)
        })
        .enabled(false)
        .build()
        .unwrap();
    let mut h = ItemHandler::builder()
        .with_items(numbered_items(20))
        .with_items_per_page(5)
        .with_filter(even)
        .build();
    h.last_page();
    assert_eq!(h.current_index(), 4);
    assert!(h.toggle_filter("even"));
    assert_eq!(h.filtered_len(), 10);
    assert_eq!(h.total_pages(), 2);
    assert_eq!(h.current_index(), 2);
}

#[test]
fn search_inputs_jump_to_the_matching_window() {
    let mut h = ItemHandler::builder()
        .with_items(numbered_items(30))
        .with_items_per_page(4)
        .with_search(Search::by_text("text", "Text"))
        .build();
    let inputs: Vec<String> = h.search_inputs().into_iter().map(|i| i.custom_id).collect();
    assert_eq!(inputs, vec![SEARCH_PAGE_INPUT, SEARCH_INDEX_INPUT, "text"]);

    assert!(h.search(SEARCH_PAGE_INPUT, "5"));
    assert_eq!(h.current_index(), 5);
    assert!(h.search(SEARCH_INDEX_INPUT, "9"));
    assert_eq!(h.current_index(), 3);
    assert!(h.search("text", "VALUE 27"));
    assert_eq!(h.current_index(), 7);
    assert!(!h.search("text", "nothing like this"));
    assert!(!h.search(SEARCH_PAGE_INPUT, "abc"));
    assert_eq!(h.current_index(), 7);
}

#[test]
fn paging_actions_through_the_response() {
    let mut r = response(vec![item_page("list", 23, 10)]);
    assert!(r.apply(PageAction::NextItems).unwrap());
    assert!(r.apply(PageAction::NextItems).unwrap());
    assert!(!r.apply(PageAction::NextItems).unwrap());
    assert!(r.apply(PageAction::GotoItems(-3)).unwrap());
    let handler = r.current_page().unwrap().item_handler();
    assert_eq!(handler.current_index(), 1);
    let payload = r.render().unwrap();
    let embed = payload.embeds.last().expect("items embed");
    assert_eq!(embed.fields.len(), 10);
    assert_eq!(embed.fields[0].name, "Item 1");
}

#[test]
fn opening_a_page_item_pages_its_own_items() {
    let nested = ItemHandler::builder()
        .with_items(numbered_items(9))
        .with_items_per_page(4)
        .build();
    let page = chatpager::response::Page::builder()
        .with_value("root")
        .with_item_handler(
            ItemHandler::builder()
                .with_item(Item::text("plain", "Plain", "text"))
                .with_item(Item::page("more", "More", nested))
                .with_editor(true)
                .build(),
        )
        .build()
        .unwrap();
    let mut r = response(vec![page]);
    assert!(r.apply(PageAction::SelectItem("more".into())).unwrap());
    let active = r.current_page().unwrap().active_item_handler().unwrap();
    assert_eq!(active.total_pages(), 3);
    assert!(r.apply(PageAction::LastItems).unwrap());
    assert!(r.apply(PageAction::Back).unwrap());
    let own = r.current_page().unwrap().active_item_handler().unwrap();
    assert_eq!(own.total_pages(), 1);
    assert_eq!(r.history().identifier_history(), vec!["root"]);
}

#[test]
fn editing_own_items_keeps_the_open_page_item_in_place() {
    let bag = ItemHandler::builder()
        .with_items(numbered_items(30))
        .with_items_per_page(10)
        .build();
    let page = chatpager::response::Page::builder()
        .with_value("root")
        .with_item_handler(
            ItemHandler::builder()
                .with_item(Item::page("bag", "Bag", bag))
                .with_editor(true)
                .build(),
        )
        .build()
        .unwrap();
    let mut r = response(vec![page]);
    assert!(r.apply(PageAction::SelectItem("bag".into())).unwrap());
    assert!(r.apply(PageAction::NextItems).unwrap());
    assert!(r.apply(PageAction::NextItems).unwrap());

    r.edit_current_items(|h| h.add_item(Item::text("coin", "Coin", "gold")))
        .unwrap();
    let page = r.current_page().unwrap();
    assert_eq!(page.item_history().identifier_history(), vec!["bag"]);
    assert_eq!(page.active_item_handler().unwrap().current_index(), 3);
    assert_eq!(page.item_handler().items().len(), 2);

    // Closing and reopening shows the same window.
    assert!(r.apply(PageAction::Back).unwrap());
    assert!(r.apply(PageAction::SelectItem("bag".into())).unwrap());
    let active = r.current_page().unwrap().active_item_handler().unwrap();
    assert_eq!(active.current_index(), 3);
}
