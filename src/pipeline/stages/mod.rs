//! The three pure stages of the row-model pipeline.
//!
//! Each stage maps a list of row indices to a new list and never touches the
//! rows themselves. Filter output is a subsequence of its input, sort output
//! a permutation, pagination output a contiguous slice.

pub mod filter;
pub mod paginate;
pub mod sort;

pub use paginate::{page_count, PageWindow};
pub use sort::CollationKey;
