//! Integration tests for the item store.

use fabula_foundation::ItemId;
use fabula_storage::ItemStore;

#[test]
fn a_fresh_store_holds_only_the_null_item() {
    let items = ItemStore::new();
    assert_eq!(items.len(), 1);
    assert_eq!(items.count(), 0);
    assert_eq!(items.name(ItemId::NULL), "");
}

#[test]
fn declared_items_number_upward_from_one() {
    let mut items = ItemStore::new();
    let lamp = items.declare("lamp", true, Vec::new()).unwrap();
    let ball = items.declare("a red ball", false, Vec::new()).unwrap();
    assert_eq!(lamp.index(), 1);
    assert_eq!(ball.index(), 2);
    assert!(items.is_bare(lamp));
    assert!(!items.is_bare(ball));
    assert_eq!(items.count(), 2);
}

#[test]
fn duplicate_names_are_rejected() {
    let mut items = ItemStore::new();
    items.declare("lamp", true, Vec::new()).unwrap();
    assert_eq!(items.declare("lamp", true, Vec::new()), None);
}

#[test]
fn lookup_falls_back_to_the_null_item() {
    let mut items = ItemStore::new();
    let lamp = items.declare("lamp", true, Vec::new()).unwrap();
    assert_eq!(items.lookup("lamp"), lamp);
    assert_eq!(items.lookup("torch"), ItemId::NULL);
}

#[test]
fn docs_ride_along_with_the_declaration() {
    let mut items = ItemStore::new();
    let lamp = items
        .declare("lamp", true, vec!["A battered brass lamp.".to_string()])
        .unwrap();
    assert_eq!(items.get(lamp).unwrap().docs, ["A battered brass lamp."]);
}
