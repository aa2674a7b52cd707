//! SM Core - timeline composition engine for Short Maker
//!
//! This crate contains all composition logic with zero CLI dependencies:
//! sequencing media into tracks, estimating speech timing, reconciling every
//! time source into one governing duration, mixing audio, and placing
//! entrance/exit effects. External tools are reached through the traits in
//! `engine`.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod mixer;
pub mod models;
pub mod narration;
pub mod orchestrator;
pub mod reconcile;
pub mod sequencer;
pub mod subtitles;
pub mod transitions;

pub use error::{ComposeError, ComposeResult};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
