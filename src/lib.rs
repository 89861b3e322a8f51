//! # percol
//!
//! Persistent sorted collections with path copying and structural sharing.
//!
//! ## Overview
//!
//! This library provides immutable collections whose "mutating" operations
//! return a new logical version instead of changing the receiver. Older
//! versions stay valid and unchanged, and all versions share untouched
//! structure, so no operation copies the whole collection:
//!
//! - **Persistent linked list**: O(1) prepend with fully shared tails
//! - **Persistent sorted map**: a path-copying weight-balanced search tree
//!   with the complete navigable-map API (floor/ceiling/lower/higher
//!   lookups, bounded head/tail/sub views)
//! - **Order-statistic sets**: sorted sets answering "i-th smallest" and
//!   "rank of element" queries, with a naive O(n) baseline and a tree-backed
//!   O(log n) implementation
//!
//! ## Feature Flags
//!
//! - `arc` (default): share nodes via `Arc` so every collection is
//!   `Send + Sync`; disable for single-threaded `Rc` sharing
//! - `serde`: serialization support for the collections
//!
//! ## Example
//!
//! ```rust
//! use percol::prelude::*;
//!
//! let map = PersistentSortedMap::new()
//!     .insert("a", 1)
//!     .insert("b", 2)
//!     .insert("c", 3);
//!
//! // Every version stays valid after later operations
//! let smaller = map.remove(&"b");
//! assert_eq!(map.len(), 3);
//! assert_eq!(smaller.len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use percol::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
