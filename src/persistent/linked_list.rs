//! Persistent (immutable) singly-linked list.
//!
//! This module provides [`PersistentLinkedList`], an immutable singly-linked
//! list that uses structural sharing for efficient operations.
//!
//! # Overview
//!
//! `PersistentLinkedList` is a cons-list. It provides:
//!
//! - O(1) prepend (`cons`)
//! - O(1) head and tail access
//! - O(n) index access, removal, and reversal
//!
//! All operations return new lists without modifying the original, and
//! structural sharing ensures memory efficiency: `cons` allocates exactly
//! one node, `without` reallocates only the prefix before the removed
//! element and shares the suffix unchanged.
//!
//! # Examples
//!
//! ```rust
//! use percol::persistent::PersistentLinkedList;
//!
//! let list = PersistentLinkedList::new().cons(4).cons(3).cons(2);
//! assert_eq!(list.head(), Some(&2));
//! assert_eq!(list.len(), 3);
//!
//! // Removing shares the suffix after the removed element
//! let shorter = list.without(&3);
//! assert_eq!(shorter.iter().collect::<Vec<_>>(), vec![&2, &4]);
//!
//! // The original list is untouched
//! assert_eq!(list.iter().collect::<Vec<_>>(), vec![&2, &3, &4]);
//! ```
//!
//! # Structural Sharing
//!
//! When you create a new list by prepending an element with `cons`, the new
//! list shares all nodes with the original list:
//!
//! ```text
//! list1: 2 -> 3 -> 4 -> nil
//! list2 = list1.cons(1): 1 -> [2 -> 3 -> 4 -> nil]  // shares [2, 3, 4] with list1
//! ```
//!
//! `list1.cons(x).tail()` is therefore not merely equal to `list1`, it
//! references the identical node chain.
//!
//! # One-Directional Iteration
//!
//! Nodes carry no back-links, so the list can only be traversed from head
//! to tail. [`PersistentLinkedListIterator`] deliberately does not implement
//! `DoubleEndedIterator`; this is a permanent API limitation, not a missing
//! feature. Use [`reverse`](PersistentLinkedList::reverse) (O(n), no
//! sharing) when the opposite order is needed.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use super::ReferenceCounter;

/// Internal node structure for the persistent list.
///
/// Each node contains an element and an optional reference to the next node.
/// Reference counting enables structural sharing between lists.
struct Node<T> {
    /// The element stored in this node.
    element: T,
    /// Reference to the next node (if any).
    next: Option<ReferenceCounter<Self>>,
}

/// A persistent (immutable) singly-linked list.
///
/// Every instance is immutable once constructed and therefore safe for
/// unsynchronized concurrent reads (with the `arc` feature). A "mutating"
/// operation returns a new list; the receiver is never changed, so any
/// previously held reference keeps observing exactly the same sequence.
///
/// # Time Complexity
///
/// | Operation      | Complexity |
/// |----------------|------------|
/// | `new`          | O(1)       |
/// | `cons`         | O(1)       |
/// | `head`         | O(1)       |
/// | `tail`         | O(1)       |
/// | `len`          | O(1)       |
/// | `get`          | O(n)       |
/// | `without`      | O(n)       |
/// | `reverse`      | O(n)       |
///
/// # Examples
///
/// ```rust
/// use percol::persistent::PersistentLinkedList;
///
/// let list = PersistentLinkedList::singleton(42);
/// assert_eq!(list.head(), Some(&42));
/// ```
#[derive(Clone)]
pub struct PersistentLinkedList<T> {
    /// Reference to the head node (if any).
    head: Option<ReferenceCounter<Node<T>>>,
    /// Cached length for O(1) access.
    length: usize,
}

impl<T> PersistentLinkedList<T> {
    /// Creates a new empty list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list: PersistentLinkedList<i32> = PersistentLinkedList::new();
    /// assert!(list.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            head: None,
            length: 0,
        }
    }

    /// Creates a list containing a single element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list = PersistentLinkedList::singleton(42);
    /// assert_eq!(list.head(), Some(&42));
    /// assert_eq!(list.len(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::new().cons(element)
    }

    /// Builds a list from a Vec efficiently.
    ///
    /// Consumes elements from the end with `Vec::pop()`, so the resulting
    /// list has the same order as the Vec.
    fn build_from_vec(mut elements: Vec<T>) -> Self {
        let length = elements.len();
        if length == 0 {
            return Self::new();
        }

        let mut head: Option<ReferenceCounter<Node<T>>> = None;
        while let Some(element) = elements.pop() {
            head = Some(ReferenceCounter::new(Node {
                element,
                next: head,
            }));
        }

        Self { head, length }
    }

    /// Returns the number of elements in the list.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the list contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Prepends an element to the front of the list.
    ///
    /// The new list shares the entire node chain of the original list;
    /// exactly one new node is allocated.
    ///
    /// # Complexity
    ///
    /// O(1) time and space
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list = PersistentLinkedList::new().cons(3).cons(2).cons(1);
    /// assert_eq!(list.head(), Some(&1));
    /// assert_eq!(list.len(), 3);
    /// ```
    #[inline]
    #[must_use]
    pub fn cons(&self, element: T) -> Self {
        Self {
            head: Some(ReferenceCounter::new(Node {
                element,
                next: self.head.clone(),
            })),
            length: self.length + 1,
        }
    }

    /// Returns a reference to the first element of the list.
    ///
    /// Returns `None` if the list is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list = PersistentLinkedList::new().cons(2).cons(1);
    /// assert_eq!(list.head(), Some(&1));
    ///
    /// let empty: PersistentLinkedList<i32> = PersistentLinkedList::new();
    /// assert_eq!(empty.head(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn head(&self) -> Option<&T> {
        self.head.as_ref().map(|node| &node.element)
    }

    /// Returns the list without its first element.
    ///
    /// If the list is empty, returns an empty list. The result shares its
    /// entire node chain with the original list.
    ///
    /// # Complexity
    ///
    /// O(1) time and space
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list = PersistentLinkedList::new().cons(3).cons(2).cons(1);
    /// let tail = list.tail();
    /// assert_eq!(tail.head(), Some(&2));
    /// assert_eq!(tail.len(), 2);
    /// ```
    #[inline]
    #[must_use]
    pub fn tail(&self) -> Self {
        self.head.as_ref().map_or_else(Self::new, |node| Self {
            head: node.next.clone(),
            length: self.length.saturating_sub(1),
        })
    }

    /// Decomposes the list into its head and tail.
    ///
    /// Returns `None` if the list is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list = PersistentLinkedList::new().cons(2).cons(1);
    /// if let Some((head, tail)) = list.uncons() {
    ///     assert_eq!(*head, 1);
    ///     assert_eq!(tail.head(), Some(&2));
    /// }
    /// ```
    #[inline]
    #[must_use]
    pub fn uncons(&self) -> Option<(&T, Self)> {
        self.head.as_ref().map(|node| {
            let tail = Self {
                head: node.next.clone(),
                length: self.length.saturating_sub(1),
            };
            (&node.element, tail)
        })
    }

    /// Returns a reference to the element at the given index.
    ///
    /// Returns `None` if the index is out of bounds.
    ///
    /// # Complexity
    ///
    /// O(n) where n = index
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list = PersistentLinkedList::new().cons(3).cons(2).cons(1);
    /// assert_eq!(list.get(0), Some(&1));
    /// assert_eq!(list.get(2), Some(&3));
    /// assert_eq!(list.get(10), None);
    /// ```
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let mut current = &self.head;
        let mut remaining = index;

        while let Some(node) = current {
            if remaining == 0 {
                return Some(&node.element);
            }
            remaining -= 1;
            current = &node.next;
        }
        None
    }

    /// Returns an iterator over references to the elements.
    ///
    /// Iteration is head-to-tail only; the iterator does not support
    /// reverse traversal.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> PersistentLinkedListIterator<'_, T> {
        PersistentLinkedListIterator {
            current: self.head.as_ref(),
        }
    }
}

impl<T: Clone> PersistentLinkedList<T> {
    /// Creates a list with the elements of the slice, in the same order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list = PersistentLinkedList::from_slice(&[1, 2, 3]);
    /// assert_eq!(list.head(), Some(&1));
    /// assert_eq!(list.len(), 3);
    /// ```
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self {
        Self::build_from_vec(slice.to_vec())
    }

    /// Prepends all elements to the front of the list, preserving their
    /// relative order.
    ///
    /// The elements are pushed in reverse so that the first element of the
    /// iterator ends up at the head of the result. The original node chain
    /// is shared unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list = PersistentLinkedList::singleton(3);
    /// let extended = list.extend_front([1, 2]);
    /// assert_eq!(extended.iter().collect::<Vec<_>>(), vec![&1, &2, &3]);
    /// ```
    #[must_use]
    pub fn extend_front<I: IntoIterator<Item = T>>(&self, iter: I) -> Self {
        let elements: Vec<T> = iter.into_iter().collect();
        let mut result = self.clone();
        for element in elements.into_iter().rev() {
            result = result.cons(element);
        }
        result
    }

    /// Returns a new list with the first occurrence of `element` removed.
    ///
    /// Matching uses structural equality. The prefix before the match is
    /// rebuilt; the suffix after it is shared with the original list. If
    /// the element does not occur, an equivalent list is returned.
    ///
    /// # Complexity
    ///
    /// O(n)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list = PersistentLinkedList::new().cons(4).cons(3).cons(2);
    /// let removed = list.without(&3);
    /// assert_eq!(removed.iter().collect::<Vec<_>>(), vec![&2, &4]);
    ///
    /// // The original is unchanged
    /// assert_eq!(list.len(), 3);
    /// ```
    #[must_use]
    pub fn without(&self, element: &T) -> Self
    where
        T: PartialEq,
    {
        // Walk to the first match, remembering the prefix seen so far.
        let mut prefix: Vec<&T> = Vec::new();
        let mut current = self.head.as_ref();
        let suffix = loop {
            match current {
                None => return self.clone(),
                Some(node) if node.element == *element => break node.next.clone(),
                Some(node) => {
                    prefix.push(&node.element);
                    current = node.next.as_ref();
                }
            }
        };

        // Rebuild the prefix onto the shared suffix.
        let mut head = suffix;
        for value in prefix.into_iter().rev() {
            head = Some(ReferenceCounter::new(Node {
                element: value.clone(),
                next: head,
            }));
        }

        Self {
            head,
            length: self.length - 1,
        }
    }

    /// Returns a new list with the elements in reverse order.
    ///
    /// Reversal cannot share any nodes, since every `next` link changes
    /// direction; all n nodes are rebuilt.
    ///
    /// # Complexity
    ///
    /// O(n)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentLinkedList;
    ///
    /// let list = PersistentLinkedList::new().cons(3).cons(2).cons(1);
    /// let reversed = list.reverse();
    /// assert_eq!(reversed.iter().collect::<Vec<_>>(), vec![&3, &2, &1]);
    /// ```
    #[must_use]
    pub fn reverse(&self) -> Self {
        let mut result = Self::new();
        for element in self {
            result = result.cons(element.clone());
        }
        result
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// A borrowing iterator over elements of a [`PersistentLinkedList`].
///
/// Traversal is strictly head-to-tail: the underlying nodes have no
/// back-links, so this iterator intentionally does not implement
/// `DoubleEndedIterator`.
pub struct PersistentLinkedListIterator<'a, T> {
    current: Option<&'a ReferenceCounter<Node<T>>>,
}

impl<'a, T> Iterator for PersistentLinkedListIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.current.map(|node| {
            self.current = node.next.as_ref();
            &node.element
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Remaining length is not tracked; only the bounds are known.
        (0, None)
    }
}

/// An owning iterator over elements of a [`PersistentLinkedList`].
pub struct PersistentLinkedListIntoIterator<T> {
    list: PersistentLinkedList<T>,
}

impl<T: Clone> Iterator for PersistentLinkedListIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((head, tail)) = self.list.uncons() {
            let element = head.clone();
            self.list = tail;
            Some(element)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.length, Some(self.list.length))
    }
}

impl<T: Clone> ExactSizeIterator for PersistentLinkedListIntoIterator<T> {
    fn len(&self) -> usize {
        self.list.length
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for PersistentLinkedList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a list from an iterator, preserving iteration order.
impl<T: Clone> FromIterator<T> for PersistentLinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let elements: Vec<T> = iter.into_iter().collect();
        Self::build_from_vec(elements)
    }
}

impl<T: Clone> IntoIterator for PersistentLinkedList<T> {
    type Item = T;
    type IntoIter = PersistentLinkedListIntoIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        PersistentLinkedListIntoIterator { list: self }
    }
}

impl<'a, T> IntoIterator for &'a PersistentLinkedList<T> {
    type Item = &'a T;
    type IntoIter = PersistentLinkedListIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for PersistentLinkedList<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for PersistentLinkedList<T> {}

/// Computes a hash value for this list.
///
/// The hash is computed by first hashing the length, then hashing each
/// element in order, so equal lists produce equal hash values regardless
/// of how they were built.
impl<T: Hash> Hash for PersistentLinkedList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the length first to distinguish lists of different lengths
        self.length.hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentLinkedList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

/// Formats the list as `[v, v, v]` head-to-tail.
impl<T: fmt::Display> fmt::Display for PersistentLinkedList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T> serde::Serialize for PersistentLinkedList<T>
where
    T: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for PersistentLinkedList<T>
where
    T: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let elements = Vec::<T>::deserialize(deserializer)?;
        Ok(Self::build_from_vec(elements))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_new_creates_empty() {
        let list: PersistentLinkedList<i32> = PersistentLinkedList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.head(), None);
    }

    #[rstest]
    fn test_cons_builds_head_to_tail() {
        let list = PersistentLinkedList::new().cons(4).cons(3).cons(2);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![&2, &3, &4]);
    }

    #[rstest]
    fn test_tail_shares_node_chain_identity() {
        let list = PersistentLinkedList::new().cons(3).cons(2).cons(1);
        let extended = list.cons(0);
        let tail = extended.tail();

        // Not merely equal: the same node chain, pointer-identical.
        let tail_head = tail.head.as_ref().expect("non-empty");
        let list_head = list.head.as_ref().expect("non-empty");
        assert!(ReferenceCounter::ptr_eq(tail_head, list_head));
        assert_eq!(tail, list);
    }

    #[rstest]
    fn test_without_shares_suffix() {
        let list = PersistentLinkedList::new().cons(4).cons(3).cons(2);
        let removed = list.without(&3);

        // The node for 4 is shared between both lists.
        let original_last = list
            .head
            .as_ref()
            .and_then(|node| node.next.as_ref())
            .and_then(|node| node.next.as_ref())
            .expect("original has three nodes");
        let removed_last = removed
            .head
            .as_ref()
            .and_then(|node| node.next.as_ref())
            .expect("result has two nodes");
        assert!(ReferenceCounter::ptr_eq(original_last, removed_last));
    }

    #[rstest]
    fn test_without_first_occurrence_only() {
        let list = PersistentLinkedList::from_slice(&[1, 2, 1, 3]);
        let removed = list.without(&1);
        assert_eq!(removed.iter().collect::<Vec<_>>(), vec![&2, &1, &3]);
    }

    #[rstest]
    fn test_without_absent_element_returns_equivalent_list() {
        let list = PersistentLinkedList::from_slice(&[1, 2, 3]);
        let removed = list.without(&99);
        assert_eq!(removed, list);
        assert_eq!(removed.len(), 3);
    }

    #[rstest]
    fn test_without_head() {
        let list = PersistentLinkedList::from_slice(&[1, 2, 3]);
        let removed = list.without(&1);
        assert_eq!(removed.iter().collect::<Vec<_>>(), vec![&2, &3]);
    }

    #[rstest]
    fn test_original_version_survives_later_operations() {
        let original = PersistentLinkedList::new().cons(4).cons(3).cons(2);
        let _shorter = original.without(&3);
        let _longer = original.cons(1);
        let _reversed = original.reverse();

        assert_eq!(original.iter().collect::<Vec<_>>(), vec![&2, &3, &4]);
        assert_eq!(original.len(), 3);
    }

    #[rstest]
    fn test_extend_front_preserves_order() {
        let list = PersistentLinkedList::singleton(5);
        let extended = list.extend_front([1, 2, 3]);
        assert_eq!(
            extended.iter().collect::<Vec<_>>(),
            vec![&1, &2, &3, &5]
        );
        assert_eq!(extended.len(), 4);
    }

    #[rstest]
    fn test_extend_front_with_empty_iterator() {
        let list = PersistentLinkedList::from_slice(&[1, 2]);
        let extended = list.extend_front(std::iter::empty());
        assert_eq!(extended, list);
    }

    #[rstest]
    fn test_reverse() {
        let list = PersistentLinkedList::from_slice(&[1, 2, 3]);
        let reversed = list.reverse();
        assert_eq!(reversed.iter().collect::<Vec<_>>(), vec![&3, &2, &1]);
        // Original unchanged
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![&1, &2, &3]);
    }

    #[rstest]
    fn test_reverse_empty() {
        let list: PersistentLinkedList<i32> = PersistentLinkedList::new();
        assert!(list.reverse().is_empty());
    }

    #[rstest]
    fn test_get() {
        let list = PersistentLinkedList::from_slice(&[10, 20, 30]);
        assert_eq!(list.get(0), Some(&10));
        assert_eq!(list.get(2), Some(&30));
        assert_eq!(list.get(3), None);
    }

    #[rstest]
    fn test_from_iterator_preserves_order() {
        let list: PersistentLinkedList<i32> = (1..=5).collect();
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![&1, &2, &3, &4, &5]);
    }

    #[rstest]
    fn test_display_format() {
        let empty: PersistentLinkedList<i32> = PersistentLinkedList::new();
        assert_eq!(format!("{empty}"), "[]");

        let list = PersistentLinkedList::new().cons(4).cons(3).cons(2);
        assert_eq!(format!("{list}"), "[2, 3, 4]");
    }

    #[rstest]
    fn test_structural_equality_is_identity_independent() {
        let first = PersistentLinkedList::from_slice(&[1, 2, 3]);
        let second = PersistentLinkedList::new().cons(3).cons(2).cons(1);
        assert_eq!(first, second);

        assert_ne!(first, first.tail());
        assert_ne!(first, PersistentLinkedList::from_slice(&[1, 2, 4]));
    }

    #[rstest]
    fn test_hash_consistent_with_eq() {
        use std::collections::HashMap;

        let mut outer: HashMap<PersistentLinkedList<i32>, &str> = HashMap::new();
        let key = PersistentLinkedList::from_slice(&[1, 2, 3]);
        outer.insert(key.clone(), "value");

        let equal_key = PersistentLinkedList::new().cons(3).cons(2).cons(1);
        assert_eq!(outer.get(&equal_key), Some(&"value"));
    }

    #[rstest]
    fn test_into_iterator_owned() {
        let list = PersistentLinkedList::from_slice(&[1, 2, 3]);
        let collected: Vec<i32> = list.into_iter().collect();
        assert_eq!(collected, vec![1, 2, 3]);
    }

    #[rstest]
    fn test_uncons() {
        let list = PersistentLinkedList::from_slice(&[1, 2]);
        let (head, tail) = list.uncons().expect("non-empty");
        assert_eq!(*head, 1);
        assert_eq!(tail.iter().collect::<Vec<_>>(), vec![&2]);

        let empty: PersistentLinkedList<i32> = PersistentLinkedList::new();
        assert!(empty.uncons().is_none());
    }
}
