//! Script text handling.

pub mod splitter;

pub use splitter::find_split_point;
