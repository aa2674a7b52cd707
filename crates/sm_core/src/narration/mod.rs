//! Narration: script text, speech timing and synthesis artifacts.

mod artifacts;
mod estimator;
mod text;

pub use artifacts::ArtifactStore;
pub use estimator::{NarrationEstimate, SpeechEstimator};
pub use text::{clean_script, split_phrases};
