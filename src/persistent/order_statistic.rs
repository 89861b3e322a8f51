//! Sorted sets with order-statistic queries.
//!
//! An order-statistic set is a sorted set that can additionally answer
//! rank queries: "which element is the i-th smallest?" and "how many
//! elements are smaller than this one?". The capability is captured by
//! the [`OrderStatisticSet`] trait, with two implementations:
//!
//! - [`NaiveOrderStatisticSet`]: wraps a [`BTreeSet`] and answers rank
//!   queries by linear iteration. O(n) ranks, simple enough to serve as
//!   the reference in equivalence tests.
//! - [`OrderStatisticTreeSet`]: backed by a [`PersistentSortedMap`] whose
//!   subtree size fields answer rank queries in O(log n), with persistent
//!   structure-sharing updates.
//!
//! Both implementations support descending and range-restricted variants
//! of themselves, mirroring the view semantics of the map: derived sets
//! may only narrow their element range, never widen it.
//!
//! # Examples
//!
//! ```rust
//! use percol::persistent::{OrderStatisticSet, OrderStatisticTreeSet};
//!
//! let set: OrderStatisticTreeSet<i32> = [30, 10, 20, 40].into_iter().collect();
//! assert_eq!(set.get_by_rank(1), Some(&20));
//! assert_eq!(set.rank_of(&40), Some(3));
//!
//! let (removed, rest) = set.remove_by_rank(0).unwrap();
//! assert_eq!(removed, 10);
//! assert_eq!(rest.len(), 3);
//! assert_eq!(set.len(), 4); // the original version is unchanged
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use std::ops::Bound;

use super::bounds::ViewBounds;
use super::treemap::PersistentSortedMap;

// =============================================================================
// OrderStatisticSet Trait
// =============================================================================

/// A sorted set with rank queries.
///
/// All "mutating" operations are persistent: they return a new set and
/// leave the receiver unchanged. Ranks are 0-based and always relative to
/// the set's own iteration order, so rank 0 of a descending set is its
/// greatest element.
///
/// Range-restricted sets ([`head_set`], [`tail_set`], [`sub_set`]) reject
/// insertion of elements outside their range, and restricting an already
/// restricted set may only narrow the range.
///
/// [`head_set`]: OrderStatisticSet::head_set
/// [`tail_set`]: OrderStatisticSet::tail_set
/// [`sub_set`]: OrderStatisticSet::sub_set
pub trait OrderStatisticSet<E: Clone + Ord>: Sized {
    /// Returns the number of elements in the set.
    fn len(&self) -> usize;

    /// Returns `true` if the set contains no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the set contains `element`.
    fn contains(&self, element: &E) -> bool;

    /// Returns the first element in iteration order.
    fn first(&self) -> Option<&E> {
        self.get_by_rank(0)
    }

    /// Returns the last element in iteration order.
    fn last(&self) -> Option<&E> {
        self.len().checked_sub(1).and_then(|rank| self.get_by_rank(rank))
    }

    /// Returns the element with the given rank (0-based, in iteration
    /// order), or `None` if `rank >= len()`.
    fn get_by_rank(&self, rank: usize) -> Option<&E>;

    /// Returns the rank of `element` in iteration order, or `None` if the
    /// element is absent.
    fn rank_of(&self, element: &E) -> Option<usize>;

    /// Adds an element, returning the new set version.
    ///
    /// # Panics
    ///
    /// Panics if the set is range-restricted and `element` lies outside
    /// its range.
    #[must_use]
    fn insert(&self, element: E) -> Self;

    /// Removes an element, returning the new set version. Removing an
    /// absent element (including one outside a restricted range) returns
    /// an equal set.
    #[must_use]
    fn remove(&self, element: &E) -> Self;

    /// Removes the element with the given rank, returning it together
    /// with the new set version, or `None` if `rank >= len()`.
    #[must_use]
    fn remove_by_rank(&self, rank: usize) -> Option<(E, Self)>;

    /// Returns the same elements in reversed iteration order.
    #[must_use]
    fn descending_set(&self) -> Self;

    /// Restricts the set to the elements up to `to` in iteration order.
    ///
    /// # Panics
    ///
    /// Panics if the requested bound widens an already restricted range.
    #[must_use]
    fn head_set(&self, to: E, inclusive: bool) -> Self;

    /// Restricts the set to the elements from `from` on in iteration
    /// order.
    ///
    /// # Panics
    ///
    /// Panics if the requested bound widens an already restricted range.
    #[must_use]
    fn tail_set(&self, from: E, inclusive: bool) -> Self;

    /// Restricts the set to the elements between `from` and `to` in
    /// iteration order.
    ///
    /// # Panics
    ///
    /// Panics if `from` comes after `to` in iteration order, or if either
    /// requested bound widens an already restricted range.
    #[must_use]
    fn sub_set(&self, from: E, from_inclusive: bool, to: E, to_inclusive: bool) -> Self;

    /// Collects the elements in iteration order.
    fn to_vec(&self) -> Vec<E>;
}

/// Builds ascending-order bounds for a directional range request.
///
/// `head` and `tail` are relative to iteration order, so on a descending
/// set a head request restricts the ascending lower bound.
fn directional_bound<E>(key: E, inclusive: bool) -> Bound<E> {
    if inclusive {
        Bound::Included(key)
    } else {
        Bound::Excluded(key)
    }
}

// =============================================================================
// NaiveOrderStatisticSet
// =============================================================================

/// An [`OrderStatisticSet`] with linear-time rank queries.
///
/// Backed by a [`BTreeSet`] that is copied on every update; rank queries
/// walk the iterator. Useful as a baseline and as the reference
/// implementation in equivalence tests, not for large sets.
#[derive(Clone)]
pub struct NaiveOrderStatisticSet<E> {
    elements: BTreeSet<E>,
    bounds: ViewBounds<E>,
    descending: bool,
}

impl<E: Clone + Ord> NaiveOrderStatisticSet<E> {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: BTreeSet::new(),
            bounds: ViewBounds::unbounded(),
            descending: false,
        }
    }

    /// Returns an iterator over the elements in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        let forward = (!self.descending).then(|| self.elements.iter());
        let backward = self.descending.then(|| self.elements.iter().rev());
        forward
            .into_iter()
            .flatten()
            .chain(backward.into_iter().flatten())
    }

    fn restricted(&self, requested: ViewBounds<E>) -> Self {
        let bounds = self.bounds.restrict(requested);
        let elements = self
            .elements
            .iter()
            .filter(|element| bounds.contains(*element))
            .cloned()
            .collect();
        Self {
            elements,
            bounds,
            descending: self.descending,
        }
    }
}

impl<E: Clone + Ord> OrderStatisticSet<E> for NaiveOrderStatisticSet<E> {
    fn len(&self) -> usize {
        self.elements.len()
    }

    fn contains(&self, element: &E) -> bool {
        self.elements.contains(element)
    }

    fn get_by_rank(&self, rank: usize) -> Option<&E> {
        if self.descending {
            self.elements.iter().rev().nth(rank)
        } else {
            self.elements.iter().nth(rank)
        }
    }

    fn rank_of(&self, element: &E) -> Option<usize> {
        if self.descending {
            self.elements.iter().rev().position(|found| found == element)
        } else {
            self.elements.iter().position(|found| found == element)
        }
    }

    fn insert(&self, element: E) -> Self {
        assert!(
            self.bounds.contains(&element),
            "element out of the set's range"
        );
        let mut elements = self.elements.clone();
        elements.insert(element);
        Self {
            elements,
            bounds: self.bounds.clone(),
            descending: self.descending,
        }
    }

    fn remove(&self, element: &E) -> Self {
        let mut elements = self.elements.clone();
        elements.remove(element);
        Self {
            elements,
            bounds: self.bounds.clone(),
            descending: self.descending,
        }
    }

    fn remove_by_rank(&self, rank: usize) -> Option<(E, Self)> {
        let element = self.get_by_rank(rank)?.clone();
        let mut elements = self.elements.clone();
        let deleted = elements.remove(&element);
        assert!(deleted, "element could be retrieved, but not deleted");
        Some((
            element,
            Self {
                elements,
                bounds: self.bounds.clone(),
                descending: self.descending,
            },
        ))
    }

    fn descending_set(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            bounds: self.bounds.clone(),
            descending: !self.descending,
        }
    }

    fn head_set(&self, to: E, inclusive: bool) -> Self {
        let requested = if self.descending {
            ViewBounds::new(
                directional_bound(to, inclusive),
                self.bounds.upper().clone(),
            )
        } else {
            ViewBounds::new(
                self.bounds.lower().clone(),
                directional_bound(to, inclusive),
            )
        };
        self.restricted(requested)
    }

    fn tail_set(&self, from: E, inclusive: bool) -> Self {
        let requested = if self.descending {
            ViewBounds::new(
                self.bounds.lower().clone(),
                directional_bound(from, inclusive),
            )
        } else {
            ViewBounds::new(
                directional_bound(from, inclusive),
                self.bounds.upper().clone(),
            )
        };
        self.restricted(requested)
    }

    fn sub_set(&self, from: E, from_inclusive: bool, to: E, to_inclusive: bool) -> Self {
        let requested = if self.descending {
            ViewBounds::new(
                directional_bound(to, to_inclusive),
                directional_bound(from, from_inclusive),
            )
        } else {
            ViewBounds::new(
                directional_bound(from, from_inclusive),
                directional_bound(to, to_inclusive),
            )
        };
        self.restricted(requested)
    }

    fn to_vec(&self) -> Vec<E> {
        self.iter().cloned().collect()
    }
}

// =============================================================================
// OrderStatisticTreeSet
// =============================================================================

/// An [`OrderStatisticSet`] with logarithmic rank queries.
///
/// Backed by a [`PersistentSortedMap`] with unit values, so updates are
/// persistent path-copying operations and the map's subtree size fields
/// answer `get_by_rank` and `rank_of` in O(log n). Descending and
/// range-restricted variants share the backing tree; only the direction
/// flag and the range bounds differ.
#[derive(Clone)]
pub struct OrderStatisticTreeSet<E> {
    map: PersistentSortedMap<E, ()>,
    bounds: ViewBounds<E>,
    descending: bool,
}

impl<E: Clone + Ord> OrderStatisticTreeSet<E> {
    /// Creates a new empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map: PersistentSortedMap::new(),
            bounds: ViewBounds::unbounded(),
            descending: false,
        }
    }

    /// The `[start, end)` rank interval of the backing map covered by
    /// this set's range.
    fn rank_window(&self) -> (usize, usize) {
        self.map.rank_window(&self.bounds)
    }

    fn restricted(&self, requested: ViewBounds<E>) -> Self {
        Self {
            map: self.map.clone(),
            bounds: self.bounds.restrict(requested),
            descending: self.descending,
        }
    }
}

impl<E: Clone + Ord> OrderStatisticSet<E> for OrderStatisticTreeSet<E> {
    fn len(&self) -> usize {
        let (start, end) = self.rank_window();
        end - start
    }

    fn contains(&self, element: &E) -> bool {
        self.bounds.contains(element) && self.map.contains_key(element)
    }

    fn get_by_rank(&self, rank: usize) -> Option<&E> {
        let (start, end) = self.rank_window();
        if rank >= end - start {
            return None;
        }
        let absolute = if self.descending {
            end - 1 - rank
        } else {
            start + rank
        };
        self.map.select(absolute).map(|(element, _)| element)
    }

    fn rank_of(&self, element: &E) -> Option<usize> {
        if !self.bounds.contains(element) {
            return None;
        }
        let (start, end) = self.rank_window();
        let absolute = self.map.rank_of_key(element)?;
        Some(if self.descending {
            end - 1 - absolute
        } else {
            absolute - start
        })
    }

    fn insert(&self, element: E) -> Self {
        assert!(
            self.bounds.contains(&element),
            "element out of the set's range"
        );
        Self {
            map: self.map.insert(element, ()),
            bounds: self.bounds.clone(),
            descending: self.descending,
        }
    }

    fn remove(&self, element: &E) -> Self {
        if !self.bounds.contains(element) {
            return self.clone();
        }
        Self {
            map: self.map.remove(element),
            bounds: self.bounds.clone(),
            descending: self.descending,
        }
    }

    fn remove_by_rank(&self, rank: usize) -> Option<(E, Self)> {
        let element = self.get_by_rank(rank)?.clone();
        let removed = self.map.remove(&element);
        assert_eq!(
            removed.len() + 1,
            self.map.len(),
            "element could be retrieved, but not deleted"
        );
        Some((
            element,
            Self {
                map: removed,
                bounds: self.bounds.clone(),
                descending: self.descending,
            },
        ))
    }

    fn descending_set(&self) -> Self {
        Self {
            map: self.map.clone(),
            bounds: self.bounds.clone(),
            descending: !self.descending,
        }
    }

    fn head_set(&self, to: E, inclusive: bool) -> Self {
        let requested = if self.descending {
            ViewBounds::new(
                directional_bound(to, inclusive),
                self.bounds.upper().clone(),
            )
        } else {
            ViewBounds::new(
                self.bounds.lower().clone(),
                directional_bound(to, inclusive),
            )
        };
        self.restricted(requested)
    }

    fn tail_set(&self, from: E, inclusive: bool) -> Self {
        let requested = if self.descending {
            ViewBounds::new(
                self.bounds.lower().clone(),
                directional_bound(from, inclusive),
            )
        } else {
            ViewBounds::new(
                directional_bound(from, inclusive),
                self.bounds.upper().clone(),
            )
        };
        self.restricted(requested)
    }

    fn sub_set(&self, from: E, from_inclusive: bool, to: E, to_inclusive: bool) -> Self {
        let requested = if self.descending {
            ViewBounds::new(
                directional_bound(to, to_inclusive),
                directional_bound(from, from_inclusive),
            )
        } else {
            ViewBounds::new(
                directional_bound(from, from_inclusive),
                directional_bound(to, to_inclusive),
            )
        };
        self.restricted(requested)
    }

    fn to_vec(&self) -> Vec<E> {
        let mut entries = Vec::new();
        self.map.collect_entries_in_range(&self.bounds, &mut entries);
        let mut elements: Vec<E> = entries
            .into_iter()
            .map(|(element, _)| element.clone())
            .collect();
        if self.descending {
            elements.reverse();
        }
        elements
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<E: Clone + Ord> Default for NaiveOrderStatisticSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Ord> Default for OrderStatisticTreeSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Ord> FromIterator<E> for NaiveOrderStatisticSet<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iterable: I) -> Self {
        Self {
            elements: iterable.into_iter().collect(),
            bounds: ViewBounds::unbounded(),
            descending: false,
        }
    }
}

impl<E: Clone + Ord> FromIterator<E> for OrderStatisticTreeSet<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iterable: I) -> Self {
        Self {
            map: iterable
                .into_iter()
                .map(|element| (element, ()))
                .collect(),
            bounds: ViewBounds::unbounded(),
            descending: false,
        }
    }
}

impl<E: Clone + Ord> PartialEq for NaiveOrderStatisticSet<E> {
    /// Two sets are equal when they expose the same element sequence.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(left, right)| left == right)
    }
}

impl<E: Clone + Ord> Eq for NaiveOrderStatisticSet<E> {}

impl<E: Clone + Ord> PartialEq for OrderStatisticTreeSet<E> {
    /// Two sets are equal when they expose the same element sequence.
    fn eq(&self, other: &Self) -> bool {
        self.to_vec() == other.to_vec()
    }
}

impl<E: Clone + Ord> Eq for OrderStatisticTreeSet<E> {}

impl<E: Clone + Ord + Hash> Hash for NaiveOrderStatisticSet<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for element in self.iter() {
            element.hash(state);
        }
    }
}

impl<E: Clone + Ord + Hash> Hash for OrderStatisticTreeSet<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let elements = self.to_vec();
        state.write_usize(elements.len());
        for element in elements {
            element.hash(state);
        }
    }
}

impl<E: Clone + Ord + fmt::Debug> fmt::Debug for NaiveOrderStatisticSet<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<E: Clone + Ord + fmt::Debug> fmt::Debug for OrderStatisticTreeSet<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.to_vec()).finish()
    }
}

impl<E: Clone + Ord + fmt::Display> fmt::Display for NaiveOrderStatisticSet<E> {
    /// Formats the set as `[a, b, c]` in iteration order.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("[")?;
        for (index, element) in self.iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{element}")?;
        }
        formatter.write_str("]")
    }
}

impl<E: Clone + Ord + fmt::Display> fmt::Display for OrderStatisticTreeSet<E> {
    /// Formats the set as `[a, b, c]` in iteration order.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("[")?;
        for (index, element) in self.to_vec().iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{element}")?;
        }
        formatter.write_str("]")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<E> serde::Serialize for OrderStatisticTreeSet<E>
where
    E: Clone + Ord + serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.to_vec())
    }
}

#[cfg(feature = "serde")]
impl<'de, E> serde::Deserialize<'de> for OrderStatisticTreeSet<E>
where
    E: Clone + Ord + serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let elements = Vec::<E>::deserialize(deserializer)?;
        Ok(elements.into_iter().collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
