// Use cases layer: match workflows on top of the turn resolver.

pub mod document;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use registry::{MatchEvent, MatchHandle, MatchRegistry, MatchSettings, RegistryError, SubmitReceipt};
pub use session::{LastAction, MatchSession, MatchView, PlayerId, SidePair, SubmitOutcome};
