//! CLI module - terminal output
//!
//! Renders transcripts and direct answers for the command-line binary.

pub mod report;

pub use report::{render_direct, render_transcript};
