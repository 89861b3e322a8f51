//! Property-based tests for the order-statistic set implementations.
//!
//! The tree-backed set is verified against the naive baseline: any
//! operation sequence must leave both sets observably equal, and rank
//! queries must agree on every rank and element.

use percol::persistent::{NaiveOrderStatisticSet, OrderStatisticSet, OrderStatisticTreeSet};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Operation {
    Insert(i32),
    Remove(i32),
    RemoveByRank(usize),
}

fn arbitrary_operations(max_length: usize) -> impl Strategy<Value = Vec<Operation>> {
    let operation = prop_oneof![
        (-50..50_i32).prop_map(Operation::Insert),
        (-50..50_i32).prop_map(Operation::Remove),
        (0..60_usize).prop_map(Operation::RemoveByRank),
    ];
    prop::collection::vec(operation, 0..max_length)
}

proptest! {
    /// The tree set and the naive set agree after any operation sequence.
    #[test]
    fn prop_tree_set_equivalent_to_naive(operations in arbitrary_operations(60)) {
        let mut naive = NaiveOrderStatisticSet::new();
        let mut tree = OrderStatisticTreeSet::new();

        for operation in operations {
            match operation {
                Operation::Insert(element) => {
                    naive = naive.insert(element);
                    tree = tree.insert(element);
                }
                Operation::Remove(element) => {
                    naive = naive.remove(&element);
                    tree = tree.remove(&element);
                }
                Operation::RemoveByRank(rank) => {
                    let from_naive = naive.remove_by_rank(rank);
                    let from_tree = tree.remove_by_rank(rank);
                    prop_assert_eq!(
                        from_naive.as_ref().map(|(element, _)| *element),
                        from_tree.as_ref().map(|(element, _)| *element)
                    );
                    if let Some((_, rest)) = from_naive {
                        naive = rest;
                    }
                    if let Some((_, rest)) = from_tree {
                        tree = rest;
                    }
                }
            }
            prop_assert_eq!(naive.len(), tree.len());
        }

        prop_assert_eq!(naive.to_vec(), tree.to_vec());
    }

    /// get_by_rank and rank_of are mutually inverse on every element.
    #[test]
    fn prop_rank_round_trip(elements in prop::collection::btree_set(any::<i32>(), 0..40)) {
        let set: OrderStatisticTreeSet<i32> = elements.iter().copied().collect();

        for (rank, element) in elements.iter().enumerate() {
            prop_assert_eq!(set.rank_of(element), Some(rank));
            prop_assert_eq!(set.get_by_rank(rank), Some(element));
        }
        prop_assert_eq!(set.get_by_rank(elements.len()), None);
    }

    /// Descending sets expose the exact reverse of the ascending order.
    #[test]
    fn prop_descending_is_reverse(elements in prop::collection::btree_set(-100..100_i32, 0..40)) {
        let set: OrderStatisticTreeSet<i32> = elements.iter().copied().collect();
        let descending = set.descending_set();

        let mut reversed = set.to_vec();
        reversed.reverse();
        prop_assert_eq!(descending.to_vec(), reversed);

        for (rank, element) in elements.iter().rev().enumerate() {
            prop_assert_eq!(descending.get_by_rank(rank), Some(element));
            prop_assert_eq!(descending.rank_of(element), Some(rank));
        }
    }

    /// Range restriction agrees between both implementations.
    #[test]
    fn prop_sub_set_equivalence(
        elements in prop::collection::btree_set(-100..100_i32, 0..40),
        low in -100..100_i32,
        span in 0..100_i32
    ) {
        let high = low + span;
        let naive: NaiveOrderStatisticSet<i32> = elements.iter().copied().collect();
        let tree: OrderStatisticTreeSet<i32> = elements.iter().copied().collect();

        let naive_sub = naive.sub_set(low, true, high, false);
        let tree_sub = tree.sub_set(low, true, high, false);

        prop_assert_eq!(naive_sub.to_vec(), tree_sub.to_vec());
        prop_assert_eq!(naive_sub.len(), tree_sub.len());
        for rank in 0..naive_sub.len() {
            prop_assert_eq!(naive_sub.get_by_rank(rank), tree_sub.get_by_rank(rank));
        }
    }
}
