// Gameplay tuning, kept separate from runtime/server configuration.

pub mod animation;
pub mod roster;

pub use animation::AnimationTuning;
pub use roster::{PieceTuning, RosterTuning};
