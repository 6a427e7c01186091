//! Bookmark membership cache with optimistic toggling.

mod bookmark_set;

pub use bookmark_set::*;
