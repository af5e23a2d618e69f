//! Kafka Offset Migrate Core Library
//!
//! This crate copies the committed offsets of one Kafka consumer group onto
//! another, so a new group picks up exactly where the old one stopped.

pub mod apply;
pub mod config;
pub mod error;
pub mod kafka;
pub mod migrate;
pub mod prompt;
pub mod snapshot;

pub use apply::{ConsumerGroupsTool, DirectCommitApplier, OffsetApplier, ResetAssignments};
pub use config::{ApplierConfig, KafkaConfig, MigrationConfig, SecurityConfig, SecurityProtocol};
pub use error::{Error, KafkaError, Result};
pub use kafka::{AdminClient, AdminConnector, KafkaAdminConnector};
pub use migrate::{
    ExclusionList, IntermediateArtifact, MigrationSession, ResetOrchestrator, ResetOutcome,
    ResetRequest, ResetState, SessionSettings, TopicSet,
};
pub use prompt::{parse_affirmative, ConsolePrompter, Prompter};
pub use snapshot::{OffsetEntry, OffsetSnapshot, TopicPartition};
