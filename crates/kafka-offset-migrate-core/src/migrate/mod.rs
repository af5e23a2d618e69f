//! Offset migration workflow.

pub mod artifact;
pub mod collector;
pub mod filter;
pub mod orchestrator;
pub mod session;

pub use artifact::IntermediateArtifact;
pub use collector::collect;
pub use filter::{prune, topics, ExclusionList, TopicSet};
pub use orchestrator::{ResetOrchestrator, ResetOutcome, ResetRequest, ResetState};
pub use session::{parse_brokers, MigrationSession, SessionSettings};
