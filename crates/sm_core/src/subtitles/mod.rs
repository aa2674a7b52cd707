//! Subtitle output from phrase spans.
//!
//! - `ass`: styled script burned into the render
//! - `srt`: plain sidecar export

pub mod ass;
pub mod srt;

pub use ass::{save_ass, write_ass};
pub use srt::{save_srt, write_srt};
