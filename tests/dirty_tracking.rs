mod common;

use chatpager::response::{Item, PageAction, Response};
use common::{branch, item_page, leaf, response};

fn committed(pages: Vec<chatpager::response::Page>) -> Response {
    let mut r = response(pages);
    r.set_no_cache_update_required();
    assert!(!r.is_cache_update_required());
    r
}

fn assert_dirty_until_committed(r: &mut Response) {
    assert!(r.is_cache_update_required());
    assert!(r.is_cache_update_required(), "reading must not clear the flag");
    r.set_no_cache_update_required();
    assert!(!r.is_cache_update_required());
}

#[test]
fn fresh_response_needs_a_render() {
    let r = response(vec![leaf("a")]);
    assert!(r.is_cache_update_required());
}

#[test]
fn tree_moves_mark_dirty() {
    let mut r = committed(vec![branch("a", vec![leaf("a1")]), leaf("b")]);
    r.apply(PageAction::SelectSubPage("a1".into())).unwrap();
    assert_dirty_until_committed(&mut r);
    r.apply(PageAction::Back).unwrap();
    assert_dirty_until_committed(&mut r);
    r.apply(PageAction::SelectPage("b".into())).unwrap();
    assert_dirty_until_committed(&mut r);
}

#[test]
fn item_moves_mark_dirty() {
    let mut r = committed(vec![item_page("list", 30, 5)]);
    r.apply(PageAction::NextItems).unwrap();
    assert_dirty_until_committed(&mut r);
    r.apply(PageAction::LastItems).unwrap();
    assert_dirty_until_committed(&mut r);
    r.apply(PageAction::InvertOrder).unwrap();
    assert_dirty_until_committed(&mut r);
}

#[test]
fn no_op_moves_stay_clean() {
    let mut r = committed(vec![item_page("list", 30, 5)]);
    assert!(!r.apply(PageAction::PreviousItems).unwrap());
    assert!(!r.apply(PageAction::FirstItems).unwrap());
    assert!(!r.is_cache_update_required());
}

#[test]
fn direct_item_edits_mark_dirty() {
    let mut r = committed(vec![item_page("list", 3, 5)]);
    r.edit_current_items(|items| items.add_item(Item::text("new", "New", "fresh")))
        .unwrap();
    assert_dirty_until_committed(&mut r);
    let removed = r
        .edit_current_items(|items| items.remove_items(|i| i.id() == "new"))
        .unwrap();
    assert_eq!(removed, 1);
    assert_dirty_until_committed(&mut r);
}

#[test]
fn page_edits_mark_dirty() {
    let mut r = committed(vec![leaf("a")]);
    r.edit_current_page(|page| page.mutate().with_content("changed").build().unwrap())
        .unwrap();
    assert_dirty_until_committed(&mut r);
    assert_eq!(r.render().unwrap().content.as_deref(), Some("changed"));
}

#[test]
fn components_are_rebuilt_only_after_a_change() {
    let mut r = committed(vec![item_page("list", 30, 5)]);
    let before = chatpager::metrics::snapshot().component_rebuilds;
    let first = r.cached_page_components().unwrap().to_vec();
    let second = r.cached_page_components().unwrap().to_vec();
    assert_eq!(first, second);
    let after_two = chatpager::metrics::snapshot().component_rebuilds;
    // Other tests in this binary may rebuild concurrently, so only bound the count.
    assert!(after_two >= before + 1);
    r.apply(PageAction::NextItems).unwrap();
    let third = r.cached_page_components().unwrap().to_vec();
    assert_ne!(first, third);
}
