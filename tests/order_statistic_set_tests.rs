//! Integration tests for the order-statistic set implementations.
//!
//! Every scenario runs against both implementations through the
//! [`OrderStatisticSet`] trait, so the naive baseline and the tree-backed
//! set are held to the same observable behavior.

use percol::persistent::{NaiveOrderStatisticSet, OrderStatisticSet, OrderStatisticTreeSet};
use rstest::rstest;

fn build<S: OrderStatisticSet<i32> + FromIterator<i32>>(elements: &[i32]) -> S {
    elements.iter().copied().collect()
}

fn scenario_rank_queries<S: OrderStatisticSet<i32> + FromIterator<i32>>() {
    let set: S = build(&[5, 1, 4, 2, 3]);
    assert_eq!(set.to_vec(), vec![1, 2, 3, 4, 5]);
    assert_eq!(set.get_by_rank(0), Some(&1));
    assert_eq!(set.get_by_rank(4), Some(&5));
    assert_eq!(set.get_by_rank(5), None);
    assert_eq!(set.rank_of(&3), Some(2));
    assert_eq!(set.rank_of(&6), None);
}

fn scenario_persistent_updates<S: OrderStatisticSet<i32> + FromIterator<i32>>() {
    let set: S = build(&[1, 2, 3]);
    let grown = set.insert(0);
    let shrunk = set.remove(&2);

    assert_eq!(set.to_vec(), vec![1, 2, 3]);
    assert_eq!(grown.to_vec(), vec![0, 1, 2, 3]);
    assert_eq!(shrunk.to_vec(), vec![1, 3]);
}

fn scenario_remove_by_rank<S: OrderStatisticSet<i32> + FromIterator<i32>>() {
    let set: S = build(&[10, 20, 30]);
    let (element, rest) = set.remove_by_rank(1).unwrap();
    assert_eq!(element, 20);
    assert_eq!(rest.to_vec(), vec![10, 30]);
    assert_eq!(set.len(), 3);
    assert!(set.remove_by_rank(3).is_none());
}

fn scenario_restricted_ranges<S: OrderStatisticSet<i32> + FromIterator<i32>>() {
    let set: S = build(&[1, 2, 3, 4, 5]);
    let middle = set.sub_set(2, true, 4, true);

    assert_eq!(middle.to_vec(), vec![2, 3, 4]);
    assert_eq!(middle.get_by_rank(0), Some(&2));
    assert_eq!(middle.rank_of(&4), Some(2));
    assert_eq!(middle.rank_of(&1), None);
    assert!(!middle.contains(&5));

    let inserted = middle.insert(3);
    assert_eq!(inserted.len(), 3);

    // Removing an out-of-range element is a no-op, not an error
    let unchanged = middle.remove(&5);
    assert_eq!(unchanged.to_vec(), vec![2, 3, 4]);
}

fn scenario_descending_ranges<S: OrderStatisticSet<i32> + FromIterator<i32>>() {
    let set: S = build(&[1, 2, 3, 4, 5]);
    let descending = set.descending_set();

    assert_eq!(descending.to_vec(), vec![5, 4, 3, 2, 1]);
    assert_eq!(descending.get_by_rank(1), Some(&4));
    assert_eq!(descending.rank_of(&4), Some(1));
    assert_eq!(descending.head_set(3, true).to_vec(), vec![5, 4, 3]);
    assert_eq!(descending.tail_set(3, false).to_vec(), vec![2, 1]);

    let (element, rest) = descending.remove_by_rank(0).unwrap();
    assert_eq!(element, 5);
    assert_eq!(rest.to_vec(), vec![4, 3, 2, 1]);
}

#[rstest]
fn test_naive_rank_queries() {
    scenario_rank_queries::<NaiveOrderStatisticSet<i32>>();
}

#[rstest]
fn test_tree_rank_queries() {
    scenario_rank_queries::<OrderStatisticTreeSet<i32>>();
}

#[rstest]
fn test_naive_persistent_updates() {
    scenario_persistent_updates::<NaiveOrderStatisticSet<i32>>();
}

#[rstest]
fn test_tree_persistent_updates() {
    scenario_persistent_updates::<OrderStatisticTreeSet<i32>>();
}

#[rstest]
fn test_naive_remove_by_rank() {
    scenario_remove_by_rank::<NaiveOrderStatisticSet<i32>>();
}

#[rstest]
fn test_tree_remove_by_rank() {
    scenario_remove_by_rank::<OrderStatisticTreeSet<i32>>();
}

#[rstest]
fn test_naive_restricted_ranges() {
    scenario_restricted_ranges::<NaiveOrderStatisticSet<i32>>();
}

#[rstest]
fn test_tree_restricted_ranges() {
    scenario_restricted_ranges::<OrderStatisticTreeSet<i32>>();
}

#[rstest]
fn test_naive_descending_ranges() {
    scenario_descending_ranges::<NaiveOrderStatisticSet<i32>>();
}

#[rstest]
fn test_tree_descending_ranges() {
    scenario_descending_ranges::<OrderStatisticTreeSet<i32>>();
}

#[rstest]
#[should_panic(expected = "element out of the set's range")]
fn test_insert_outside_head_set_panics() {
    let set: OrderStatisticTreeSet<i32> = build(&[1, 2, 3]);
    let head = set.head_set(2, true);
    let _ = head.insert(3);
}

#[rstest]
#[should_panic(expected = "cannot widen the upper bound")]
fn test_head_set_of_head_set_cannot_widen() {
    let set: NaiveOrderStatisticSet<i32> = build(&[1, 2, 3]);
    let head = set.head_set(2, true);
    let _ = head.head_set(3, true);
}
