//! Offset appliers.
//!
//! An applier takes the artifact written for a migration and either previews
//! (`validate`) or performs (`apply`) the reset of the target group. The
//! reset orchestrator only talks to this trait, so the default external tool
//! can be swapped for direct OffsetCommit requests without touching it.

mod direct;
mod tool;

pub use direct::DirectCommitApplier;
pub use tool::{ConsumerGroupsTool, ResetMode};

use async_trait::async_trait;
use std::path::Path;

use crate::config::{ApplierConfig, KafkaConfig};
use crate::Result;

/// What to reset: the target group on a cluster, to the offsets in an artifact
#[derive(Debug, Clone, Copy)]
pub struct ResetAssignments<'a> {
    pub bootstrap_servers: &'a [String],
    pub group_id: &'a str,
    pub artifact_path: &'a Path,
}

/// Applies an offset artifact to a consumer group.
///
/// Both operations return the text to show the operator verbatim.
#[async_trait]
pub trait OffsetApplier: Send + Sync {
    /// Preview the reset. Must not change any broker state.
    async fn validate(&self, assignments: &ResetAssignments<'_>) -> Result<String>;

    /// Perform the reset.
    async fn apply(&self, assignments: &ResetAssignments<'_>) -> Result<String>;
}

/// Build the applier selected in configuration.
pub fn from_config(applier: &ApplierConfig, kafka: &KafkaConfig) -> Box<dyn OffsetApplier> {
    match applier {
        ApplierConfig::ConsumerGroupsTool {
            program,
            command_config,
        } => Box::new(
            ConsumerGroupsTool::new(program.clone()).with_command_config(command_config.clone()),
        ),
        ApplierConfig::Direct => Box::new(DirectCommitApplier::new(kafka.clone())),
    }
}
