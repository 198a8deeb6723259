//! Script-to-footage alignment.
//!
//! Turns a narration script plus uploaded footage into timestamped
//! scenes. Long videos go through the chunked controller, which walks
//! analysis windows while trimming consumed script; short ones take the
//! single-pass path.

mod controller;
mod decision;
mod errors;
mod prompt;
mod response;
mod single_pass;

pub use controller::{AlignerConfig, ChunkedAligner};
pub use decision::{decide_trim, TrimOutcome};
pub use errors::AlignmentError;
pub use prompt::build_alignment_prompt;
pub use response::{extract_json, parse_alignment};
pub use single_pass::SinglePassAligner;
