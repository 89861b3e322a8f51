//! Persistent (immutable) sorted data structures.
//!
//! This module provides the collection types of the crate:
//!
//! - [`PersistentLinkedList`]: persistent singly-linked list
//! - [`PersistentSortedMap`]: persistent sorted map (path-copying
//!   weight-balanced search tree)
//! - [`SortedMapView`]: read-only bounded view over a map version
//! - [`OrderStatisticSet`]: capability trait for rank queries, with
//!   [`NaiveOrderStatisticSet`] and [`OrderStatisticTreeSet`] implementations
//!
//! # Structural Sharing
//!
//! All data structures in this module use structural sharing: a "mutating"
//! operation reallocates only the nodes on the path it touches and reuses
//! every other node of the previous version verbatim. Nodes are never
//! modified after construction, which is what makes sharing across versions
//! (and across threads, with the `arc` feature) safe.
//!
//! # Examples
//!
//! ## `PersistentLinkedList`
//!
//! ```rust
//! use percol::persistent::PersistentLinkedList;
//!
//! let list = PersistentLinkedList::new().cons(4).cons(3).cons(2);
//! assert_eq!(list.head(), Some(&2));
//!
//! // Structural sharing: the original list is preserved
//! let shorter = list.without(&3);
//! assert_eq!(list.len(), 3);    // Original unchanged
//! assert_eq!(shorter.len(), 2); // New list
//! ```
//!
//! ## `PersistentSortedMap`
//!
//! ```rust
//! use percol::persistent::PersistentSortedMap;
//!
//! let map = PersistentSortedMap::new()
//!     .insert(3, "three")
//!     .insert(1, "one")
//!     .insert(2, "two");
//!
//! // Entries are always in sorted key order
//! let keys: Vec<&i32> = map.keys().collect();
//! assert_eq!(keys, vec![&1, &2, &3]);
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert(1, "ONE");
//! assert_eq!(map.get(&1), Some(&"one"));     // Original unchanged
//! assert_eq!(updated.get(&1), Some(&"ONE")); // New version
//! ```
//!
//! ## `OrderStatisticTreeSet`
//!
//! ```rust
//! use percol::persistent::{OrderStatisticSet, OrderStatisticTreeSet};
//!
//! let set: OrderStatisticTreeSet<i32> = [30, 10, 20].into_iter().collect();
//! assert_eq!(set.get_by_rank(0), Some(&10));
//! assert_eq!(set.rank_of(&30), Some(2));
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled (default), this is `std::sync::Arc`,
/// which makes every collection in this crate `Send + Sync` so that
/// versions can be shared freely across threads.
///
/// When the `arc` feature is disabled, this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod bounds;
mod linked_list;
mod order_statistic;
mod treemap;

pub use linked_list::PersistentLinkedList;
pub use linked_list::PersistentLinkedListIntoIterator;
pub use linked_list::PersistentLinkedListIterator;
pub use order_statistic::NaiveOrderStatisticSet;
pub use order_statistic::OrderStatisticSet;
pub use order_statistic::OrderStatisticTreeSet;
pub use treemap::PersistentSortedMap;
pub use treemap::PersistentSortedMapIntoIterator;
pub use treemap::PersistentSortedMapIterator;
pub use treemap::SortedMapView;

// =============================================================================
// Tests
// =============================================================================


#[cfg(all(test, feature = "arc"))]
mod thread_safety_assertions {
    use super::{
        NaiveOrderStatisticSet, OrderStatisticTreeSet, PersistentLinkedList, PersistentSortedMap,
        SortedMapView,
    };
    use static_assertions::assert_impl_all;

    assert_impl_all!(PersistentLinkedList<i32>: Send, Sync);
    assert_impl_all!(PersistentSortedMap<i32, String>: Send, Sync);
    assert_impl_all!(SortedMapView<i32, String>: Send, Sync);
    assert_impl_all!(NaiveOrderStatisticSet<i32>: Send, Sync);
    assert_impl_all!(OrderStatisticTreeSet<i32>: Send, Sync);
}
