//! Integration tests for typed ids and the type store.

use fabula_foundation::{FuncId, ItemId, PropId, TypeId, TypeStore, Value};

// =============================================================================
// Dense ids
// =============================================================================

#[test]
fn id_zero_is_the_null_slot() {
    assert_eq!(ItemId::NULL.index(), 0);
    assert_eq!(PropId::NAME.index(), 0);
    assert_eq!(FuncId::NULL.index(), 0);
}

#[test]
fn ids_round_trip_through_values() {
    let id = ItemId::from_raw(9);
    assert_eq!(ItemId::from_value(id.to_value()), id);
    assert_eq!(id.to_value(), Value::new(9));
}

#[test]
fn negative_values_decode_to_the_null_id() {
    assert_eq!(ItemId::from_value(Value::new(-3)), ItemId::NULL);
}

// =============================================================================
// Builtin types
// =============================================================================

#[test]
fn builtin_types_have_fixed_ids() {
    let types = TypeStore::new();
    assert_eq!(types.name(TypeId::ITEM), "Item");
    assert_eq!(types.name(TypeId::STRING), "String");
    assert_eq!(types.name(TypeId::INT), "Int");
    assert_eq!(types.name(TypeId::BOOL), "Bool");
}

#[test]
fn void_is_never_assignable() {
    let types = TypeStore::new();
    assert!(!types.assignable(TypeId::VOID, TypeId::VOID));
    assert!(!types.assignable(TypeId::INT, TypeId::VOID));
}

#[test]
fn null_assigns_to_every_real_type() {
    let types = TypeStore::new();
    assert!(types.assignable(TypeId::ITEM, TypeId::NULL));
    assert!(types.assignable(TypeId::STRING, TypeId::NULL));
    assert!(types.assignable(TypeId::BOOL, TypeId::NULL));
    assert!(!types.assignable(TypeId::ITEM, TypeId::STRING));
}

#[test]
fn comparability_needs_equal_types_or_null() {
    let types = TypeStore::new();
    assert!(types.comparable(TypeId::INT, TypeId::INT));
    assert!(types.comparable(TypeId::ITEM, TypeId::NULL));
    assert!(!types.comparable(TypeId::INT, TypeId::BOOL));
    assert!(!types.comparable(TypeId::VOID, TypeId::VOID));
}

// =============================================================================
// Enums and delegates
// =============================================================================

#[test]
fn enums_keep_declaration_order() {
    let mut types = TypeStore::new();
    let color = types.declare_enum("Color", vec!["red".into(), "green".into(), "blue".into()]);
    assert!(types.is_enum(color));
    assert_eq!(types.enum_values(color), ["red", "green", "blue"]);
    assert_eq!(types.enum_ordinal(color, "green"), Some(1));
    assert_eq!(types.enum_ordinal(color, "Green"), None);
    assert_eq!(types.enum_ordinal_ci(color, "GREEN"), Some(1));
}

#[test]
fn structurally_equal_delegates_share_one_id() {
    let mut types = TypeStore::new();
    let a = types.delegate(vec![TypeId::ITEM], TypeId::BOOL);
    let b = types.delegate(vec![TypeId::ITEM], TypeId::BOOL);
    let c = types.delegate(vec![TypeId::ITEM], TypeId::INT);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(types.delegate_shape(a), Some(([TypeId::ITEM].as_slice(), TypeId::BOOL)));
}

#[test]
fn named_delegates_alias_their_shape() {
    let mut types = TypeStore::new();
    let shape = types.delegate(vec![TypeId::INT], TypeId::INT);
    let named = types.declare_delegate("Op", vec![TypeId::INT], TypeId::INT);
    assert_eq!(shape, named);
}
