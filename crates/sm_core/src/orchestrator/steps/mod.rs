//! Pipeline step implementations.
//!
//! Each step handles one phase of a composition run.

mod mix;
mod narrate;
mod reconcile;
mod render;
mod sequence;
mod transitions;

pub use mix::MixStep;
pub use narrate::NarrateStep;
pub use reconcile::ReconcileStep;
pub use render::RenderStep;
pub use sequence::SequenceStep;
pub use transitions::TransitionsStep;
