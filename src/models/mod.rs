//! Core data model: candidates discovered in pass one and the enriched
//! artifacts that flow through passes two and three.

mod artifact;
mod candidate;

pub use artifact::Artifact;
pub use candidate::{CandidateDocument, Origin};
