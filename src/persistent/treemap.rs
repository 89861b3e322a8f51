//! Persistent (immutable) sorted map based on a path-copying
//! weight-balanced tree.
//!
//! This module provides [`PersistentSortedMap`], an immutable ordered map
//! that uses structural sharing for efficient operations, and
//! [`SortedMapView`], a read-only bounded view over one map version.
//!
//! # Overview
//!
//! `PersistentSortedMap` is a persistent weight-balanced binary search
//! tree. Every "mutating" operation copies only the nodes on the path from
//! the root to the affected node (expected O(log N) allocations) and shares
//! every untouched subtree with the previous version. Previously returned
//! versions are never modified.
//!
//! - O(log N) get, insert, remove
//! - O(log N) first/last, floor/ceiling/lower/higher lookups
//! - O(log N) rank queries (`select`, `rank_of_key`)
//! - O(1) len and `is_empty`
//!
//! # Examples
//!
//! ```rust
//! use percol::persistent::PersistentSortedMap;
//!
//! let map = PersistentSortedMap::new()
//!     .insert("a", 1)
//!     .insert("b", 2)
//!     .insert("c", 3);
//!
//! let removed = map.remove(&"b");
//! assert_eq!(format!("{removed}"), "{a=1, c=3}");
//!
//! // The pre-removal version is untouched
//! assert_eq!(format!("{map}"), "{a=1, b=2, c=3}");
//! ```
//!
//! # Internal Structure
//!
//! Each node stores the size of its subtree. The tree maintains the
//! weight-balance invariant of Adams' trees (as in Haskell's `Data.Map`):
//! for every node with more than one descendant, neither subtree is more
//! than `DELTA` times larger than the other. This bounds the height to
//! O(log N), and the same size fields answer order-statistic queries
//! without any extra bookkeeping. [`check_invariants`] re-verifies key
//! order, size consistency, and balance after any operation; tests call it
//! after every mutation.
//!
//! [`check_invariants`]: PersistentSortedMap::check_invariants

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use std::ops::Bound;

use super::ReferenceCounter;
use super::bounds::ViewBounds;

/// Maximum allowed ratio between sibling subtree sizes.
const DELTA: usize = 3;
/// Decides between single and double rotations when rebalancing.
const RATIO: usize = 2;

// =============================================================================
// Node Definition
// =============================================================================

/// Internal node structure for the weight-balanced tree.
struct Node<K, V> {
    key: K,
    value: V,
    /// Number of entries in the subtree rooted here, including this node.
    size: usize,
    left: Option<ReferenceCounter<Self>>,
    right: Option<ReferenceCounter<Self>>,
}

impl<K, V> Node<K, V> {
    /// Creates a new node with no children.
    const fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            size: 1,
            left: None,
            right: None,
        }
    }

    /// Creates a node from children, computing the size field.
    fn join(
        key: K,
        value: V,
        left: Option<ReferenceCounter<Self>>,
        right: Option<ReferenceCounter<Self>>,
    ) -> Self {
        let size = 1 + size(left.as_ref()) + size(right.as_ref());
        Self {
            key,
            value,
            size,
            left,
            right,
        }
    }
}

/// Helper function returning the size of an optional subtree.
fn size<K, V>(node: Option<&ReferenceCounter<Node<K, V>>>) -> usize {
    node.map_or(0, |node_ref| node_ref.size)
}

// =============================================================================
// PersistentSortedMap Definition
// =============================================================================

/// A persistent (immutable) sorted map based on a path-copying
/// weight-balanced tree.
///
/// Keys must implement `Ord`. The map keeps entries in ascending key
/// order, enabling navigable-map lookups, bounded views, and rank queries.
///
/// Every instance is immutable once constructed. A "mutating" operation
/// returns a new map version; the receiver and every older version remain
/// valid and unchanged, sharing all untouched nodes with the new version.
/// Two threads operating on the same version each get back a version
/// reflecting only their own edit.
///
/// # Time Complexity
///
/// | Operation                       | Complexity   |
/// |---------------------------------|--------------|
/// | `new`                           | O(1)         |
/// | `get` / `contains_key`          | O(log N)     |
/// | `insert` / `remove`             | O(log N)     |
/// | `first_entry` / `last_entry`    | O(log N)     |
/// | floor/ceiling/lower/higher      | O(log N)     |
/// | `select` / `rank_of_key`        | O(log N)     |
/// | `len` / `is_empty`              | O(1)         |
///
/// # Examples
///
/// ```rust
/// use percol::persistent::PersistentSortedMap;
///
/// let map = PersistentSortedMap::singleton(42, "answer");
/// assert_eq!(map.get(&42), Some(&"answer"));
///
/// let map = PersistentSortedMap::new()
///     .insert(3, "three")
///     .insert(1, "one")
///     .insert(2, "two");
///
/// let keys: Vec<&i32> = map.keys().collect();
/// assert_eq!(keys, vec![&1, &2, &3]);
/// ```
#[derive(Clone)]
pub struct PersistentSortedMap<K, V> {
    /// Root node of the tree.
    root: Option<ReferenceCounter<Node<K, V>>>,
}

impl<K, V> PersistentSortedMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentSortedMap;
    ///
    /// let map: PersistentSortedMap<i32, String> = PersistentSortedMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        size(self.root.as_ref())
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

impl<K: Clone + Ord, V: Clone> PersistentSortedMap<K, V> {
    /// Creates a map containing a single key-value pair.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::singleton(42, "answer");
    /// assert_eq!(map.len(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the
    /// ordering on the borrowed form must match the ordering on the key type.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new().insert("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::get_from_node(self.root.as_ref(), key)
    }

    /// Recursive helper for get.
    fn get_from_node<'a, Q>(
        node: Option<&'a ReferenceCounter<Node<K, V>>>,
        key: &Q,
    ) -> Option<&'a V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        node.and_then(|node_ref| match key.cmp(node_ref.key.borrow()) {
            Ordering::Less => Self::get_from_node(node_ref.left.as_ref(), key),
            Ordering::Greater => Self::get_from_node(node_ref.right.as_ref(), key),
            Ordering::Equal => Some(&node_ref.value),
        })
    }

    /// Returns `true` if the map contains a value for the specified key.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Inserts a key-value pair, returning the new map version.
    ///
    /// If the map already contains the key, the value is replaced in the
    /// new version. Only the nodes on the root-to-target path are copied;
    /// all other subtrees are shared with the receiver, which is unchanged.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentSortedMap;
    ///
    /// let map1 = PersistentSortedMap::new().insert(1, "one");
    /// let map2 = map1.insert(1, "ONE");
    ///
    /// assert_eq!(map1.get(&1), Some(&"one")); // Original unchanged
    /// assert_eq!(map2.get(&1), Some(&"ONE")); // New version
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        Self {
            root: Some(Self::insert_into_node(self.root.as_ref(), key, value)),
        }
    }

    /// Recursive helper for insert.
    fn insert_into_node(
        node: Option<&ReferenceCounter<Node<K, V>>>,
        key: K,
        value: V,
    ) -> ReferenceCounter<Node<K, V>> {
        match node {
            None => ReferenceCounter::new(Node::leaf(key, value)),
            Some(node_ref) => match key.cmp(&node_ref.key) {
                Ordering::Less => {
                    let new_left = Self::insert_into_node(node_ref.left.as_ref(), key, value);
                    ReferenceCounter::new(Self::balance(
                        node_ref.key.clone(),
                        node_ref.value.clone(),
                        Some(new_left),
                        node_ref.right.clone(),
                    ))
                }
                Ordering::Greater => {
                    let new_right = Self::insert_into_node(node_ref.right.as_ref(), key, value);
                    ReferenceCounter::new(Self::balance(
                        node_ref.key.clone(),
                        node_ref.value.clone(),
                        node_ref.left.clone(),
                        Some(new_right),
                    ))
                }
                Ordering::Equal => ReferenceCounter::new(Node {
                    key,
                    value,
                    size: node_ref.size,
                    left: node_ref.left.clone(),
                    right: node_ref.right.clone(),
                }),
            },
        }
    }

    /// Removes a key, returning the new map version.
    ///
    /// If the key does not exist, an equivalent map is returned. The
    /// receiver is unchanged either way.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new().insert(1, "one").insert(2, "two");
    /// let removed = map.remove(&1);
    ///
    /// assert_eq!(map.len(), 2);     // Original unchanged
    /// assert_eq!(removed.len(), 1); // New version
    /// assert_eq!(removed.get(&1), None);
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if !self.contains_key(key) {
            return self.clone();
        }
        Self {
            root: Self::remove_from_node(self.root.as_ref(), key),
        }
    }

    /// Recursive helper for remove.
    fn remove_from_node<Q>(
        node: Option<&ReferenceCounter<Node<K, V>>>,
        key: &Q,
    ) -> Option<ReferenceCounter<Node<K, V>>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        node.and_then(|node_ref| match key.cmp(node_ref.key.borrow()) {
            Ordering::Less => {
                let new_left = Self::remove_from_node(node_ref.left.as_ref(), key);
                Some(ReferenceCounter::new(Self::balance(
                    node_ref.key.clone(),
                    node_ref.value.clone(),
                    new_left,
                    node_ref.right.clone(),
                )))
            }
            Ordering::Greater => {
                let new_right = Self::remove_from_node(node_ref.right.as_ref(), key);
                Some(ReferenceCounter::new(Self::balance(
                    node_ref.key.clone(),
                    node_ref.value.clone(),
                    node_ref.left.clone(),
                    new_right,
                )))
            }
            Ordering::Equal => Self::glue(node_ref.left.clone(), node_ref.right.clone()),
        })
    }

    /// Joins the two children of a removed node.
    ///
    /// The successor (minimum of the right subtree) replaces the removed
    /// entry so that key order is preserved.
    fn glue(
        left: Option<ReferenceCounter<Node<K, V>>>,
        right: Option<ReferenceCounter<Node<K, V>>>,
    ) -> Option<ReferenceCounter<Node<K, V>>> {
        match (left, right) {
            (None, right) => right,
            (left, None) => left,
            (Some(left_ref), Some(right_ref)) => {
                let (successor_key, successor_value) = Self::find_min_entry(&right_ref);
                let new_right = Self::remove_min(&right_ref);
                Some(ReferenceCounter::new(Self::balance(
                    successor_key,
                    successor_value,
                    Some(left_ref),
                    new_right,
                )))
            }
        }
    }

    /// Finds the minimum key-value pair in a subtree.
    fn find_min_entry(node: &ReferenceCounter<Node<K, V>>) -> (K, V) {
        node.left.as_ref().map_or_else(
            || (node.key.clone(), node.value.clone()),
            |left| Self::find_min_entry(left),
        )
    }

    /// Removes the minimum entry of a subtree, rebalancing the copied path.
    fn remove_min(node: &ReferenceCounter<Node<K, V>>) -> Option<ReferenceCounter<Node<K, V>>> {
        node.left.as_ref().map_or_else(
            || node.right.clone(),
            |left| {
                let new_left = Self::remove_min(left);
                Some(ReferenceCounter::new(Self::balance(
                    node.key.clone(),
                    node.value.clone(),
                    new_left,
                    node.right.clone(),
                )))
            },
        )
    }

    // =========================================================================
    // Balancing
    // =========================================================================

    /// Restores the weight-balance invariant at one node.
    ///
    /// Valid whenever the node was balanced before and one of its subtrees
    /// gained or lost at most one entry, which is exactly the situation
    /// along a copied insert/remove path.
    fn balance(
        key: K,
        value: V,
        left: Option<ReferenceCounter<Node<K, V>>>,
        right: Option<ReferenceCounter<Node<K, V>>>,
    ) -> Node<K, V> {
        let left_size = size(left.as_ref());
        let right_size = size(right.as_ref());

        if left_size + right_size <= 1 {
            return Node::join(key, value, left, right);
        }
        if right_size > DELTA * left_size {
            return Self::rotate_left(key, value, left, right);
        }
        if left_size > DELTA * right_size {
            return Self::rotate_right(key, value, left, right);
        }
        Node::join(key, value, left, right)
    }

    /// Rotates left around the node; the right child becomes the new root
    /// of this subtree.
    fn rotate_left(
        key: K,
        value: V,
        left: Option<ReferenceCounter<Node<K, V>>>,
        right: Option<ReferenceCounter<Node<K, V>>>,
    ) -> Node<K, V> {
        if let Some(right_ref) = right {
            if size(right_ref.left.as_ref()) < RATIO * size(right_ref.right.as_ref()) {
                Self::single_left(key, value, left, &right_ref)
            } else {
                Self::double_left(key, value, left, &right_ref)
            }
        } else {
            Node::join(key, value, left, None)
        }
    }

    /// Rotates right around the node; the left child becomes the new root
    /// of this subtree.
    fn rotate_right(
        key: K,
        value: V,
        left: Option<ReferenceCounter<Node<K, V>>>,
        right: Option<ReferenceCounter<Node<K, V>>>,
    ) -> Node<K, V> {
        if let Some(left_ref) = left {
            if size(left_ref.right.as_ref()) < RATIO * size(left_ref.left.as_ref()) {
                Self::single_right(key, value, &left_ref, right)
            } else {
                Self::double_right(key, value, &left_ref, right)
            }
        } else {
            Node::join(key, value, None, right)
        }
    }

    fn single_left(
        key: K,
        value: V,
        left: Option<ReferenceCounter<Node<K, V>>>,
        right: &ReferenceCounter<Node<K, V>>,
    ) -> Node<K, V> {
        let new_left = Node::join(key, value, left, right.left.clone());
        Node::join(
            right.key.clone(),
            right.value.clone(),
            Some(ReferenceCounter::new(new_left)),
            right.right.clone(),
        )
    }

    fn single_right(
        key: K,
        value: V,
        left: &ReferenceCounter<Node<K, V>>,
        right: Option<ReferenceCounter<Node<K, V>>>,
    ) -> Node<K, V> {
        let new_right = Node::join(key, value, left.right.clone(), right);
        Node::join(
            left.key.clone(),
            left.value.clone(),
            left.left.clone(),
            Some(ReferenceCounter::new(new_right)),
        )
    }

    fn double_left(
        key: K,
        value: V,
        left: Option<ReferenceCounter<Node<K, V>>>,
        right: &ReferenceCounter<Node<K, V>>,
    ) -> Node<K, V> {
        if let Some(right_left) = &right.left {
            let new_left = Node::join(key, value, left, right_left.left.clone());
            let new_right = Node::join(
                right.key.clone(),
                right.value.clone(),
                right_left.right.clone(),
                right.right.clone(),
            );
            Node::join(
                right_left.key.clone(),
                right_left.value.clone(),
                Some(ReferenceCounter::new(new_left)),
                Some(ReferenceCounter::new(new_right)),
            )
        } else {
            Self::single_left(key, value, left, right)
        }
    }

    fn double_right(
        key: K,
        value: V,
        left: &ReferenceCounter<Node<K, V>>,
        right: Option<ReferenceCounter<Node<K, V>>>,
    ) -> Node<K, V> {
        if let Some(left_right) = &left.right {
            let new_left = Node::join(
                left.key.clone(),
                left.value.clone(),
                left.left.clone(),
                left_right.left.clone(),
            );
            let new_right = Node::join(key, value, left_right.right.clone(), right);
            Node::join(
                left_right.key.clone(),
                left_right.value.clone(),
                Some(ReferenceCounter::new(new_left)),
                Some(ReferenceCounter::new(new_right)),
            )
        } else {
            Self::single_right(key, value, left, right)
        }
    }

    // =========================================================================
    // Navigable Lookups
    // =========================================================================

    /// Returns the entry with the minimum key.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new().insert(3, "c").insert(1, "a");
    /// assert_eq!(map.first_entry(), Some((&1, &"a")));
    /// ```
    #[must_use]
    pub fn first_entry(&self) -> Option<(&K, &V)> {
        Self::min_from_node(self.root.as_ref())
    }

    /// Returns the entry with the maximum key.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn last_entry(&self) -> Option<(&K, &V)> {
        Self::max_from_node(self.root.as_ref())
    }

    /// Returns the minimum key.
    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        self.first_entry().map(|(key, _)| key)
    }

    /// Returns the maximum key.
    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        self.last_entry().map(|(key, _)| key)
    }

    fn min_from_node(node: Option<&ReferenceCounter<Node<K, V>>>) -> Option<(&K, &V)> {
        node.and_then(|node_ref| {
            node_ref.left.as_ref().map_or_else(
                || Some((&node_ref.key, &node_ref.value)),
                |left| Self::min_from_node(Some(left)),
            )
        })
    }

    fn max_from_node(node: Option<&ReferenceCounter<Node<K, V>>>) -> Option<(&K, &V)> {
        node.and_then(|node_ref| {
            node_ref.right.as_ref().map_or_else(
                || Some((&node_ref.key, &node_ref.value)),
                |right| Self::max_from_node(Some(right)),
            )
        })
    }

    /// Returns the entry with the greatest key less than or equal to `key`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new().insert(1, "a").insert(3, "c");
    /// assert_eq!(map.floor_entry(&2), Some((&1, &"a")));
    /// assert_eq!(map.floor_entry(&3), Some((&3, &"c")));
    /// assert_eq!(map.floor_entry(&0), None);
    /// ```
    #[must_use]
    pub fn floor_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::floor_from_node(self.root.as_ref(), key)
    }

    /// Returns the entry with the least key greater than or equal to `key`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn ceiling_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::ceiling_from_node(self.root.as_ref(), key)
    }

    /// Returns the entry with the greatest key strictly less than `key`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn lower_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::lower_from_node(self.root.as_ref(), key)
    }

    /// Returns the entry with the least key strictly greater than `key`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn higher_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::higher_from_node(self.root.as_ref(), key)
    }

    /// Returns the greatest key less than or equal to `key`.
    #[must_use]
    pub fn floor_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.floor_entry(key).map(|(found, _)| found)
    }

    /// Returns the least key greater than or equal to `key`.
    #[must_use]
    pub fn ceiling_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.ceiling_entry(key).map(|(found, _)| found)
    }

    /// Returns the greatest key strictly less than `key`.
    #[must_use]
    pub fn lower_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lower_entry(key).map(|(found, _)| found)
    }

    /// Returns the least key strictly greater than `key`.
    #[must_use]
    pub fn higher_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.higher_entry(key).map(|(found, _)| found)
    }

    fn floor_from_node<'a, Q>(
        node: Option<&'a ReferenceCounter<Node<K, V>>>,
        key: &Q,
    ) -> Option<(&'a K, &'a V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        node.and_then(|node_ref| match key.cmp(node_ref.key.borrow()) {
            Ordering::Less => Self::floor_from_node(node_ref.left.as_ref(), key),
            Ordering::Equal => Some((&node_ref.key, &node_ref.value)),
            Ordering::Greater => Self::floor_from_node(node_ref.right.as_ref(), key)
                .or(Some((&node_ref.key, &node_ref.value))),
        })
    }

    fn ceiling_from_node<'a, Q>(
        node: Option<&'a ReferenceCounter<Node<K, V>>>,
        key: &Q,
    ) -> Option<(&'a K, &'a V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        node.and_then(|node_ref| match key.cmp(node_ref.key.borrow()) {
            Ordering::Greater => Self::ceiling_from_node(node_ref.right.as_ref(), key),
            Ordering::Equal => Some((&node_ref.key, &node_ref.value)),
            Ordering::Less => Self::ceiling_from_node(node_ref.left.as_ref(), key)
                .or(Some((&node_ref.key, &node_ref.value))),
        })
    }

    fn lower_from_node<'a, Q>(
        node: Option<&'a ReferenceCounter<Node<K, V>>>,
        key: &Q,
    ) -> Option<(&'a K, &'a V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        node.and_then(|node_ref| match key.cmp(node_ref.key.borrow()) {
            Ordering::Less | Ordering::Equal => Self::lower_from_node(node_ref.left.as_ref(), key),
            Ordering::Greater => Self::lower_from_node(node_ref.right.as_ref(), key)
                .or(Some((&node_ref.key, &node_ref.value))),
        })
    }

    fn higher_from_node<'a, Q>(
        node: Option<&'a ReferenceCounter<Node<K, V>>>,
        key: &Q,
    ) -> Option<(&'a K, &'a V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        node.and_then(|node_ref| match key.cmp(node_ref.key.borrow()) {
            Ordering::Greater | Ordering::Equal => {
                Self::higher_from_node(node_ref.right.as_ref(), key)
            }
            Ordering::Less => Self::higher_from_node(node_ref.left.as_ref(), key)
                .or(Some((&node_ref.key, &node_ref.value))),
        })
    }

    // =========================================================================
    // Order Statistics
    // =========================================================================

    /// Returns the entry with the `rank`-th smallest key (0-based).
    ///
    /// Returns `None` if `rank >= len()`.
    ///
    /// # Complexity
    ///
    /// O(log N), using the subtree size fields
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new()
    ///     .insert(30, "c")
    ///     .insert(10, "a")
    ///     .insert(20, "b");
    /// assert_eq!(map.select(0), Some((&10, &"a")));
    /// assert_eq!(map.select(2), Some((&30, &"c")));
    /// assert_eq!(map.select(3), None);
    /// ```
    #[must_use]
    pub fn select(&self, rank: usize) -> Option<(&K, &V)> {
        Self::select_from_node(self.root.as_ref(), rank)
    }

    fn select_from_node(
        node: Option<&ReferenceCounter<Node<K, V>>>,
        rank: usize,
    ) -> Option<(&K, &V)> {
        node.and_then(|node_ref| {
            let left_size = size(node_ref.left.as_ref());
            match rank.cmp(&left_size) {
                Ordering::Less => Self::select_from_node(node_ref.left.as_ref(), rank),
                Ordering::Equal => Some((&node_ref.key, &node_ref.value)),
                Ordering::Greater => {
                    Self::select_from_node(node_ref.right.as_ref(), rank - left_size - 1)
                }
            }
        })
    }

    /// Returns the rank of `key` (the number of keys smaller than it).
    ///
    /// Returns `None` if the key is absent.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn rank_of_key<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::rank_from_node(self.root.as_ref(), key, 0)
    }

    fn rank_from_node<Q>(
        node: Option<&ReferenceCounter<Node<K, V>>>,
        key: &Q,
        accumulated: usize,
    ) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        node.and_then(|node_ref| {
            let left_size = size(node_ref.left.as_ref());
            match key.cmp(node_ref.key.borrow()) {
                Ordering::Less => Self::rank_from_node(node_ref.left.as_ref(), key, accumulated),
                Ordering::Equal => Some(accumulated + left_size),
                Ordering::Greater => Self::rank_from_node(
                    node_ref.right.as_ref(),
                    key,
                    accumulated + left_size + 1,
                ),
            }
        })
    }

    /// Counts the keys smaller than `key` (or smaller-or-equal when
    /// `inclusive`).
    pub(crate) fn count_before<Q>(&self, key: &Q, inclusive: bool) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::count_before_node(self.root.as_ref(), key, inclusive)
    }

    fn count_before_node<Q>(
        node: Option<&ReferenceCounter<Node<K, V>>>,
        key: &Q,
        inclusive: bool,
    ) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        node.map_or(0, |node_ref| {
            let left_size = size(node_ref.left.as_ref());
            match key.cmp(node_ref.key.borrow()) {
                Ordering::Less => Self::count_before_node(node_ref.left.as_ref(), key, inclusive),
                Ordering::Equal => left_size + usize::from(inclusive),
                Ordering::Greater => {
                    left_size
                        + 1
                        + Self::count_before_node(node_ref.right.as_ref(), key, inclusive)
                }
            }
        })
    }

    /// Translates a bound window into a `[start, end)` rank interval.
    pub(crate) fn rank_window(&self, bounds: &ViewBounds<K>) -> (usize, usize) {
        let start = match bounds.lower() {
            Bound::Unbounded => 0,
            Bound::Included(key) => self.count_before(key, false),
            Bound::Excluded(key) => self.count_before(key, true),
        };
        let end = match bounds.upper() {
            Bound::Unbounded => self.len(),
            Bound::Included(key) => self.count_before(key, true),
            Bound::Excluded(key) => self.count_before(key, false),
        };
        (start, end.max(start))
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Returns an iterator over entries in ascending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new().insert(2, "b").insert(1, "a");
    /// let entries: Vec<(&i32, &&str)> = map.iter().collect();
    /// assert_eq!(entries, vec![(&1, &"a"), (&2, &"b")]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentSortedMapIterator<'_, K, V> {
        let mut entries = Vec::with_capacity(self.len());
        Self::collect_entries_in_order(self.root.as_ref(), &mut entries);
        PersistentSortedMapIterator {
            entries,
            current_index: 0,
        }
    }

    /// Collects all entries in sorted order (in-order traversal).
    fn collect_entries_in_order<'a>(
        node: Option<&'a ReferenceCounter<Node<K, V>>>,
        entries: &mut Vec<(&'a K, &'a V)>,
    ) {
        if let Some(node_ref) = node {
            Self::collect_entries_in_order(node_ref.left.as_ref(), entries);
            entries.push((&node_ref.key, &node_ref.value));
            Self::collect_entries_in_order(node_ref.right.as_ref(), entries);
        }
    }

    /// Collects the entries inside `bounds` in sorted order, pruning
    /// subtrees wholly outside the window.
    pub(crate) fn collect_entries_in_range<'a>(
        &'a self,
        bounds: &ViewBounds<K>,
        entries: &mut Vec<(&'a K, &'a V)>,
    ) {
        Self::collect_range_from_node(self.root.as_ref(), bounds, entries);
    }

    fn collect_range_from_node<'a>(
        node: Option<&'a ReferenceCounter<Node<K, V>>>,
        bounds: &ViewBounds<K>,
        entries: &mut Vec<(&'a K, &'a V)>,
    ) {
        if let Some(node_ref) = node {
            let above_lower = match bounds.lower() {
                Bound::Unbounded => true,
                Bound::Included(key) => node_ref.key >= *key,
                Bound::Excluded(key) => node_ref.key > *key,
            };
            let below_upper = match bounds.upper() {
                Bound::Unbounded => true,
                Bound::Included(key) => node_ref.key <= *key,
                Bound::Excluded(key) => node_ref.key < *key,
            };

            if above_lower {
                Self::collect_range_from_node(node_ref.left.as_ref(), bounds, entries);
            }
            if above_lower && below_upper {
                entries.push((&node_ref.key, &node_ref.value));
            }
            if below_upper {
                Self::collect_range_from_node(node_ref.right.as_ref(), bounds, entries);
            }
        }
    }

    /// Returns an iterator over keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    // =========================================================================
    // Bounded Views
    // =========================================================================

    /// Returns a read-only view of the entries with keys up to `to`.
    ///
    /// The view shares the underlying tree; nothing is copied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use percol::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new()
    ///     .insert(1, "a")
    ///     .insert(2, "b")
    ///     .insert(3, "c");
    /// let head = map.head_map(2, true);
    /// assert_eq!(head.len(), 2);
    /// assert!(!head.contains_key(&3));
    /// ```
    #[must_use]
    pub fn head_map(&self, to: K, inclusive: bool) -> SortedMapView<K, V> {
        let upper = if inclusive {
            Bound::Included(to)
        } else {
            Bound::Excluded(to)
        };
        SortedMapView {
            map: self.clone(),
            bounds: ViewBounds::new(Bound::Unbounded, upper),
        }
    }

    /// Returns a read-only view of the entries with keys from `from` on.
    ///
    /// The view shares the underlying tree; nothing is copied.
    #[must_use]
    pub fn tail_map(&self, from: K, inclusive: bool) -> SortedMapView<K, V> {
        let lower = if inclusive {
            Bound::Included(from)
        } else {
            Bound::Excluded(from)
        };
        SortedMapView {
            map: self.clone(),
            bounds: ViewBounds::new(lower, Bound::Unbounded),
        }
    }

    /// Returns a read-only view of the entries with keys between `from`
    /// and `to`.
    ///
    /// The view shares the underlying tree; nothing is copied.
    ///
    /// # Panics
    ///
    /// Panics if `from > to`.
    #[must_use]
    pub fn sub_map(
        &self,
        from: K,
        from_inclusive: bool,
        to: K,
        to_inclusive: bool,
    ) -> SortedMapView<K, V> {
        let lower = if from_inclusive {
            Bound::Included(from)
        } else {
            Bound::Excluded(from)
        };
        let upper = if to_inclusive {
            Bound::Included(to)
        } else {
            Bound::Excluded(to)
        };
        SortedMapView {
            map: self.clone(),
            bounds: ViewBounds::new(lower, upper),
        }
    }

    // =========================================================================
    // Consistency Checking
    // =========================================================================

    /// Verifies the internal tree invariants, panicking on any violation.
    ///
    /// Checks binary-search-tree key order, the consistency of every
    /// subtree size field, and the weight-balance invariant. A failure
    /// indicates a bug in the balancing algorithm itself, never a user
    /// error, so it is reported as an assertion failure rather than a
    /// recoverable condition. Intended for tests and debugging; runs in
    /// O(N).
    ///
    /// # Panics
    ///
    /// Panics if any structural invariant is violated.
    pub fn check_invariants(&self) {
        Self::check_node(self.root.as_ref(), None, None);
    }

    fn check_node(
        node: Option<&ReferenceCounter<Node<K, V>>>,
        min: Option<&K>,
        max: Option<&K>,
    ) -> usize {
        node.map_or(0, |node_ref| {
            if let Some(min_key) = min {
                assert!(
                    node_ref.key > *min_key,
                    "binary-search-tree order violated"
                );
            }
            if let Some(max_key) = max {
                assert!(
                    node_ref.key < *max_key,
                    "binary-search-tree order violated"
                );
            }

            let left_size = Self::check_node(node_ref.left.as_ref(), min, Some(&node_ref.key));
            let right_size = Self::check_node(node_ref.right.as_ref(), Some(&node_ref.key), max);

            assert_eq!(
                node_ref.size,
                left_size + right_size + 1,
                "subtree size field inconsistent"
            );
            if left_size + right_size > 1 {
                assert!(
                    left_size <= DELTA * right_size && right_size <= DELTA * left_size,
                    "weight-balance invariant violated"
                );
            }

            node_ref.size
        })
    }
}

// =============================================================================
// Iterator Implementations
// =============================================================================

/// Iterator over the entries of a map (or view) in ascending key order.
pub struct PersistentSortedMapIterator<'a, K, V> {
    entries: Vec<(&'a K, &'a V)>,
    current_index: usize,
}

impl<'a, K, V> Iterator for PersistentSortedMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.current_index).copied();
        if entry.is_some() {
            self.current_index += 1;
        }
        entry
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len() - self.current_index;
        (remaining, Some(remaining))
    }
}

impl<K, V> ExactSizeIterator for PersistentSortedMapIterator<'_, K, V> {}

/// Owning iterator over the entries of a map in ascending key order.
pub struct PersistentSortedMapIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for PersistentSortedMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for PersistentSortedMapIntoIterator<K, V> {}

impl<'a, K: Clone + Ord, V: Clone> IntoIterator for &'a PersistentSortedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentSortedMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Clone + Ord, V: Clone> IntoIterator for PersistentSortedMap<K, V> {
    type Item = (K, V);
    type IntoIter = PersistentSortedMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let entries: Vec<(K, V)> = self
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        PersistentSortedMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for PersistentSortedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Ord, V: Clone> FromIterator<(K, V)> for PersistentSortedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iterable: I) -> Self {
        iterable
            .into_iter()
            .fold(Self::new(), |map, (key, value)| map.insert(key, value))
    }
}

impl<K: Clone + Ord, V: Clone + PartialEq> PartialEq for PersistentSortedMap<K, V> {
    /// Two maps are equal when they contain the same key-value pairs,
    /// regardless of internal tree shape.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Clone + Ord, V: Clone + Eq> Eq for PersistentSortedMap<K, V> {}

impl<K: Clone + Ord + Hash, V: Clone + Hash> Hash for PersistentSortedMap<K, V> {
    /// Hashes the length followed by every entry in ascending key order,
    /// consistent with `PartialEq`.
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: Clone + Ord + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug for PersistentSortedMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Clone + Ord + fmt::Display, V: Clone + fmt::Display> fmt::Display
    for PersistentSortedMap<K, V>
{
    /// Formats the map as `{key=value, key=value}` in ascending key order.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("{")?;
        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{key}={value}")?;
        }
        formatter.write_str("}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for PersistentSortedMap<K, V>
where
    K: Clone + Ord + serde::Serialize,
    V: Clone + serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for PersistentSortedMap<K, V>
where
    K: Clone + Ord + serde::Deserialize<'de>,
    V: Clone + serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct MapVisitor<K, V> {
            marker: std::marker::PhantomData<(K, V)>,
        }

        impl<'de, K, V> serde::de::Visitor<'de> for MapVisitor<K, V>
        where
            K: Clone + Ord + serde::Deserialize<'de>,
            V: Clone + serde::Deserialize<'de>,
        {
            type Value = PersistentSortedMap<K, V>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut map = PersistentSortedMap::new();
                while let Some((key, value)) = access.next_entry()? {
                    map = map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(MapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// SortedMapView Definition
// =============================================================================

/// A read-only bounded view over one version of a [`PersistentSortedMap`].
///
/// A view is a window onto the entries of its backing map version whose
/// keys fall between a lower and an upper bound. It shares the backing
/// tree, so creating a view copies nothing, and it pins the version it was
/// created from: later operations on the map produce new versions and
/// never show through an existing view.
///
/// Views can be narrowed further with [`head_map`], [`tail_map`], and
/// [`sub_map`]; the requested bounds are intersected with the view's own
/// in a single step, so derived views do not stack lookups. Attempting to
/// widen a bound panics.
///
/// # Examples
///
/// ```rust
/// use percol::persistent::PersistentSortedMap;
///
/// let map = PersistentSortedMap::new()
///     .insert(1, "a")
///     .insert(2, "b")
///     .insert(3, "c")
///     .insert(4, "d");
///
/// let view = map.sub_map(2, true, 4, false);
/// assert_eq!(view.len(), 2);
/// assert_eq!(view.first_key(), Some(&2));
/// assert_eq!(view.last_key(), Some(&3));
/// ```
///
/// [`head_map`]: SortedMapView::head_map
/// [`tail_map`]: SortedMapView::tail_map
/// [`sub_map`]: SortedMapView::sub_map
#[derive(Clone)]
pub struct SortedMapView<K, V> {
    /// The backing map version this view was created from.
    map: PersistentSortedMap<K, V>,
    /// The key window, always in ascending key order.
    bounds: ViewBounds<K>,
}

impl<K: Clone + Ord, V: Clone> SortedMapView<K, V> {
    /// Returns the number of entries visible through the view.
    ///
    /// # Complexity
    ///
    /// O(log N), via rank arithmetic on the backing tree
    #[must_use]
    pub fn len(&self) -> usize {
        let (start, end) = self.map.rank_window(&self.bounds);
        end - start
    }

    /// Returns `true` if no entries are visible through the view.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the backing map version this view was created from.
    #[must_use]
    pub const fn backing_map(&self) -> &PersistentSortedMap<K, V> {
        &self.map
    }

    /// Returns a reference to the value for `key`, if the key lies inside
    /// the view's bounds and is present in the backing map.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.bounds.contains(key) {
            self.map.get(key)
        } else {
            None
        }
    }

    /// Returns `true` if the view contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns the entry with the minimum key inside the view.
    #[must_use]
    pub fn first_entry(&self) -> Option<(&K, &V)> {
        let (start, end) = self.map.rank_window(&self.bounds);
        if start < end { self.map.select(start) } else { None }
    }

    /// Returns the entry with the maximum key inside the view.
    #[must_use]
    pub fn last_entry(&self) -> Option<(&K, &V)> {
        let (start, end) = self.map.rank_window(&self.bounds);
        if start < end { self.map.select(end - 1) } else { None }
    }

    /// Returns the minimum key inside the view.
    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        self.first_entry().map(|(key, _)| key)
    }

    /// Returns the maximum key inside the view.
    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        self.last_entry().map(|(key, _)| key)
    }

    /// Returns the entry with the greatest key less than or equal to
    /// `key`, restricted to the view's bounds.
    #[must_use]
    pub fn floor_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let within_upper = match self.bounds.upper() {
            Bound::Unbounded => true,
            Bound::Included(high) => key <= high.borrow(),
            Bound::Excluded(high) => key < high.borrow(),
        };
        let candidate = if within_upper {
            self.map.floor_entry(key)
        } else {
            self.last_entry()
        };
        candidate.filter(|(found, _)| match self.bounds.lower() {
            Bound::Unbounded => true,
            Bound::Included(low) => *found >= low,
            Bound::Excluded(low) => *found > low,
        })
    }

    /// Returns the entry with the least key greater than or equal to
    /// `key`, restricted to the view's bounds.
    #[must_use]
    pub fn ceiling_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let within_lower = match self.bounds.lower() {
            Bound::Unbounded => true,
            Bound::Included(low) => key >= low.borrow(),
            Bound::Excluded(low) => key > low.borrow(),
        };
        let candidate = if within_lower {
            self.map.ceiling_entry(key)
        } else {
            self.first_entry()
        };
        candidate.filter(|(found, _)| match self.bounds.upper() {
            Bound::Unbounded => true,
            Bound::Included(high) => *found <= high,
            Bound::Excluded(high) => *found < high,
        })
    }

    /// Returns the entry with the greatest key strictly less than `key`,
    /// restricted to the view's bounds.
    #[must_use]
    pub fn lower_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let clamp_to_last = match self.bounds.upper() {
            Bound::Unbounded => false,
            Bound::Included(high) | Bound::Excluded(high) => key > high.borrow(),
        };
        let candidate = if clamp_to_last {
            self.last_entry()
        } else {
            self.map.lower_entry(key)
        };
        candidate.filter(|(found, _)| match self.bounds.lower() {
            Bound::Unbounded => true,
            Bound::Included(low) => *found >= low,
            Bound::Excluded(low) => *found > low,
        })
    }

    /// Returns the entry with the least key strictly greater than `key`,
    /// restricted to the view's bounds.
    #[must_use]
    pub fn higher_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let clamp_to_first = match self.bounds.lower() {
            Bound::Unbounded => false,
            Bound::Included(low) | Bound::Excluded(low) => key < low.borrow(),
        };
        let candidate = if clamp_to_first {
            self.first_entry()
        } else {
            self.map.higher_entry(key)
        };
        candidate.filter(|(found, _)| match self.bounds.upper() {
            Bound::Unbounded => true,
            Bound::Included(high) => *found <= high,
            Bound::Excluded(high) => *found < high,
        })
    }

    /// Returns the greatest key less than or equal to `key` inside the view.
    #[must_use]
    pub fn floor_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.floor_entry(key).map(|(found, _)| found)
    }

    /// Returns the least key greater than or equal to `key` inside the view.
    #[must_use]
    pub fn ceiling_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.ceiling_entry(key).map(|(found, _)| found)
    }

    /// Returns the greatest key strictly less than `key` inside the view.
    #[must_use]
    pub fn lower_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lower_entry(key).map(|(found, _)| found)
    }

    /// Returns the least key strictly greater than `key` inside the view.
    #[must_use]
    pub fn higher_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.higher_entry(key).map(|(found, _)| found)
    }

    /// Returns an iterator over the view's entries in ascending key order.
    #[must_use]
    pub fn iter(&self) -> PersistentSortedMapIterator<'_, K, V> {
        let mut entries = Vec::new();
        self.map.collect_entries_in_range(&self.bounds, &mut entries);
        PersistentSortedMapIterator {
            entries,
            current_index: 0,
        }
    }

    /// Returns an iterator over the view's keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the view's values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Narrows the view to the entries with keys up to `to`.
    ///
    /// # Panics
    ///
    /// Panics if the requested bound widens the view.
    #[must_use]
    pub fn head_map(&self, to: K, inclusive: bool) -> Self {
        let upper = if inclusive {
            Bound::Included(to)
        } else {
            Bound::Excluded(to)
        };
        let requested = ViewBounds::new(self.bounds.lower().clone(), upper);
        Self {
            map: self.map.clone(),
            bounds: self.bounds.restrict(requested),
        }
    }

    /// Narrows the view to the entries with keys from `from` on.
    ///
    /// # Panics
    ///
    /// Panics if the requested bound widens the view.
    #[must_use]
    pub fn tail_map(&self, from: K, inclusive: bool) -> Self {
        let lower = if inclusive {
            Bound::Included(from)
        } else {
            Bound::Excluded(from)
        };
        let requested = ViewBounds::new(lower, self.bounds.upper().clone());
        Self {
            map: self.map.clone(),
            bounds: self.bounds.restrict(requested),
        }
    }

    /// Narrows the view to the entries with keys between `from` and `to`.
    ///
    /// # Panics
    ///
    /// Panics if `from > to`, or if either requested bound widens the view.
    #[must_use]
    pub fn sub_map(&self, from: K, from_inclusive: bool, to: K, to_inclusive: bool) -> Self {
        let lower = if from_inclusive {
            Bound::Included(from)
        } else {
            Bound::Excluded(from)
        };
        let upper = if to_inclusive {
            Bound::Included(to)
        } else {
            Bound::Excluded(to)
        };
        let requested = ViewBounds::new(lower, upper);
        Self {
            map: self.map.clone(),
            bounds: self.bounds.restrict(requested),
        }
    }
}

impl<'a, K: Clone + Ord, V: Clone> IntoIterator for &'a SortedMapView<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentSortedMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Clone + Ord, V: Clone> IntoIterator for SortedMapView<K, V> {
    type Item = (K, V);
    type IntoIter = PersistentSortedMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let entries: Vec<(K, V)> = self
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        PersistentSortedMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<K: Clone + Ord, V: Clone + PartialEq> PartialEq for SortedMapView<K, V> {
    /// Two views are equal when they expose the same entry sequence,
    /// regardless of backing map or bound representation.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(left, right)| left == right)
    }
}

impl<K: Clone + Ord, V: Clone + Eq> Eq for SortedMapView<K, V> {}

impl<K: Clone + Ord + Hash, V: Clone + Hash> Hash for SortedMapView<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let entries: Vec<(&K, &V)> = self.iter().collect();
        state.write_usize(entries.len());
        for (key, value) in entries {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: Clone + Ord + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug for SortedMapView<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Clone + Ord + fmt::Display, V: Clone + fmt::Display> fmt::Display for SortedMapView<K, V> {
    /// Formats the view as `{key=value, key=value}` in ascending key order.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("{")?;
        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{key}={value}")?;
        }
        formatter.write_str("}")
    }
}

// =============================================================================
// Tests
// =============================================================================
