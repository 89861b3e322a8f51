//! Integration tests for PersistentLinkedList.

use percol::persistent::PersistentLinkedList;
use rstest::rstest;

// =============================================================================
// Construction Tests
// =============================================================================

#[rstest]
fn test_new_creates_empty_list() {
    let list: PersistentLinkedList<i32> = PersistentLinkedList::new();
    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
    assert_eq!(list.head(), None);
}

#[rstest]
fn test_default_creates_empty_list() {
    let list: PersistentLinkedList<i32> = PersistentLinkedList::default();
    assert!(list.is_empty());
}

#[rstest]
fn test_singleton_creates_list_with_one_element() {
    let list = PersistentLinkedList::singleton(42);
    assert_eq!(list.len(), 1);
    assert_eq!(list.head(), Some(&42));
}

#[rstest]
fn test_from_slice_preserves_order() {
    let list = PersistentLinkedList::from_slice(&[1, 2, 3]);
    assert_eq!(list.len(), 3);
    assert_eq!(list.get(0), Some(&1));
    assert_eq!(list.get(1), Some(&2));
    assert_eq!(list.get(2), Some(&3));
}

#[rstest]
fn test_collect_preserves_order() {
    let list: PersistentLinkedList<i32> = (1..=5).collect();
    let elements: Vec<i32> = list.iter().copied().collect();
    assert_eq!(elements, vec![1, 2, 3, 4, 5]);
}

// =============================================================================
// Cons, Head, and Tail Tests
// =============================================================================

#[rstest]
fn test_cons_prepends_element() {
    let list = PersistentLinkedList::new().cons(3).cons(2).cons(1);
    assert_eq!(list.len(), 3);
    assert_eq!(list.head(), Some(&1));
}

#[rstest]
fn test_cons_leaves_original_unchanged() {
    let original = PersistentLinkedList::new().cons(2).cons(1);
    let extended = original.cons(0);
    assert_eq!(original.len(), 2);
    assert_eq!(original.head(), Some(&1));
    assert_eq!(extended.len(), 3);
    assert_eq!(extended.head(), Some(&0));
}

#[rstest]
fn test_tail_of_empty_list_is_empty() {
    let list: PersistentLinkedList<i32> = PersistentLinkedList::new();
    assert!(list.tail().is_empty());
}

#[rstest]
fn test_uncons_decomposes_list() {
    let list = PersistentLinkedList::new().cons(2).cons(1);
    let (head, tail) = list.uncons().unwrap();
    assert_eq!(*head, 1);
    assert_eq!(tail.len(), 1);
    assert_eq!(tail.head(), Some(&2));
    assert!(PersistentLinkedList::<i32>::new().uncons().is_none());
}

// =============================================================================
// Without and Reverse Tests
// =============================================================================

#[rstest]
fn test_without_removes_first_occurrence_only() {
    let list: PersistentLinkedList<i32> = [1, 2, 3, 2].into_iter().collect();
    let removed = list.without(&2);
    let elements: Vec<i32> = removed.iter().copied().collect();
    assert_eq!(elements, vec![1, 3, 2]);
    assert_eq!(list.len(), 4);
}

#[rstest]
fn test_without_absent_element_returns_equal_list() {
    let list: PersistentLinkedList<i32> = [1, 2, 3].into_iter().collect();
    let removed = list.without(&9);
    assert_eq!(list, removed);
}

#[rstest]
fn test_reverse() {
    let list: PersistentLinkedList<i32> = [1, 2, 3].into_iter().collect();
    let reversed: Vec<i32> = list.reverse().iter().copied().collect();
    assert_eq!(reversed, vec![3, 2, 1]);
    assert_eq!(list.head(), Some(&1));
}

#[rstest]
fn test_extend_front_preserves_argument_order() {
    let list: PersistentLinkedList<i32> = [4, 5].into_iter().collect();
    let extended = list.extend_front([1, 2, 3]);
    let elements: Vec<i32> = extended.iter().copied().collect();
    assert_eq!(elements, vec![1, 2, 3, 4, 5]);
    assert_eq!(list.len(), 2);
}

// =============================================================================
// Equality, Hash, and Display Tests
// =============================================================================

#[rstest]
fn test_equality_is_element_wise() {
    let first: PersistentLinkedList<i32> = [1, 2, 3].into_iter().collect();
    let second = PersistentLinkedList::new().cons(3).cons(2).cons(1);
    assert_eq!(first, second);
    assert_ne!(first, first.tail());
}

#[rstest]
fn test_display_format() {
    let list: PersistentLinkedList<i32> = [2, 3, 4].into_iter().collect();
    assert_eq!(format!("{list}"), "[2, 3, 4]");
    let empty: PersistentLinkedList<i32> = PersistentLinkedList::new();
    assert_eq!(format!("{empty}"), "[]");
}

// =============================================================================
// Iterator Tests
// =============================================================================

#[rstest]
fn test_iterator_is_forward_only() {
    let list: PersistentLinkedList<i32> = [1, 2, 3].into_iter().collect();
    let mut iterator = list.iter();
    assert_eq!(iterator.next(), Some(&1));
    assert_eq!(iterator.next(), Some(&2));
    assert_eq!(iterator.next(), Some(&3));
    assert_eq!(iterator.next(), None);
}

#[rstest]
fn test_into_iterator_yields_owned_elements() {
    let list: PersistentLinkedList<String> =
        ["a".to_string(), "b".to_string()].into_iter().collect();
    let elements: Vec<String> = list.into_iter().collect();
    assert_eq!(elements, vec!["a".to_string(), "b".to_string()]);
}
