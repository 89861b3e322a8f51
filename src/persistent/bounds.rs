//! Key-range bounds shared by the map and set views.
//!
//! A view over a sorted collection is represented as a pair of
//! [`Bound`]s plus a reference to the backing version, instead of a chain
//! of recursively wrapped views. Restricting a view therefore intersects
//! bounds in one step, and derived views never widen what their parent
//! allows.

use std::borrow::Borrow;
use std::ops::Bound;

/// A pair of lower and upper key bounds describing a view window.
///
/// Bounds are always expressed in ascending key order, independent of the
/// iteration direction of the view that carries them.
#[derive(Clone, Debug)]
pub(crate) struct ViewBounds<K> {
    lower: Bound<K>,
    upper: Bound<K>,
}

impl<K> ViewBounds<K> {
    /// The unbounded window covering every key.
    pub(crate) const fn unbounded() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    pub(crate) const fn lower(&self) -> &Bound<K> {
        &self.lower
    }

    pub(crate) const fn upper(&self) -> &Bound<K> {
        &self.upper
    }
}

impl<K: Ord> ViewBounds<K> {
    /// Creates a window from explicit bounds.
    ///
    /// # Panics
    ///
    /// Panics if the lower bound key is greater than the upper bound key.
    pub(crate) fn new(lower: Bound<K>, upper: Bound<K>) -> Self {
        if let (Bound::Included(low) | Bound::Excluded(low), Bound::Included(high) | Bound::Excluded(high)) =
            (&lower, &upper)
        {
            assert!(low <= high, "range start is greater than range end");
        }
        Self { lower, upper }
    }

    /// Returns `true` if `key` lies inside the window.
    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let above_lower = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(bound) => key >= bound.borrow(),
            Bound::Excluded(bound) => key > bound.borrow(),
        };
        let below_upper = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(bound) => key <= bound.borrow(),
            Bound::Excluded(bound) => key < bound.borrow(),
        };
        above_lower && below_upper
    }

    /// Intersects this window with a requested sub-window.
    ///
    /// The requested window must lie inside this one: a view derived from
    /// another view may only narrow it.
    ///
    /// # Panics
    ///
    /// Panics if the requested window extends outside this one.
    pub(crate) fn restrict(&self, requested: Self) -> Self {
        assert!(
            lower_within(&requested.lower, &self.lower),
            "cannot widen the lower bound of a restricted view"
        );
        assert!(
            upper_within(&requested.upper, &self.upper),
            "cannot widen the upper bound of a restricted view"
        );
        requested
    }
}

/// Checks that `inner` does not admit any key below what `outer` admits.
fn lower_within<K: Ord>(inner: &Bound<K>, outer: &Bound<K>) -> bool {
    match (inner, outer) {
        (_, Bound::Unbounded) => true,
        (Bound::Unbounded, _) => false,
        (Bound::Included(inner_key), Bound::Excluded(outer_key)) => inner_key > outer_key,
        (
            Bound::Included(inner_key) | Bound::Excluded(inner_key),
            Bound::Included(outer_key),
        )
        | (Bound::Excluded(inner_key), Bound::Excluded(outer_key)) => inner_key >= outer_key,
    }
}

/// Checks that `inner` does not admit any key above what `outer` admits.
fn upper_within<K: Ord>(inner: &Bound<K>, outer: &Bound<K>) -> bool {
    match (inner, outer) {
        (_, Bound::Unbounded) => true,
        (Bound::Unbounded, _) => false,
        (Bound::Included(inner_key), Bound::Excluded(outer_key)) => inner_key < outer_key,
        (
            Bound::Included(inner_key) | Bound::Excluded(inner_key),
            Bound::Included(outer_key),
        )
        | (Bound::Excluded(inner_key), Bound::Excluded(outer_key)) => inner_key <= outer_key,
    }
}

// =============================================================================
// Tests
// =============================================================================
