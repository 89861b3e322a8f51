//! Serialization round-trip tests for the persistent collections.

#![cfg(feature = "serde")]

use percol::persistent::{
    OrderStatisticSet, OrderStatisticTreeSet, PersistentLinkedList, PersistentSortedMap,
};
use rstest::rstest;

#[rstest]
fn test_list_serializes_as_sequence() {
    let list: PersistentLinkedList<i32> = [1, 2, 3].into_iter().collect();
    let json = serde_json::to_string(&list).unwrap();
    assert_eq!(json, "[1,2,3]");

    let parsed: PersistentLinkedList<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, list);
}

#[rstest]
fn test_map_serializes_in_key_order() {
    let map = PersistentSortedMap::new()
        .insert("b".to_string(), 2)
        .insert("a".to_string(), 1);
    let json = serde_json::to_string(&map).unwrap();
    assert_eq!(json, "{\"a\":1,\"b\":2}");

    let parsed: PersistentSortedMap<String, i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, map);
    parsed.check_invariants();
}

#[rstest]
fn test_tree_set_serializes_as_sorted_sequence() {
    let set: OrderStatisticTreeSet<i32> = [3, 1, 2].into_iter().collect();
    let json = serde_json::to_string(&set).unwrap();
    assert_eq!(json, "[1,2,3]");

    let parsed: OrderStatisticTreeSet<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.to_vec(), vec![1, 2, 3]);
}
