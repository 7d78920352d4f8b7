pub mod artifacts;
pub mod logging;

pub use artifacts::{ArtifactStore, ContractArtifact, ContractKind};
