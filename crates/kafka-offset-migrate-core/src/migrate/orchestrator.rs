//! Reset orchestration.
//!
//! Drives one offset reset of the target group from an artifact:
//!
//! 1. Preview the reset with the applier's `validate` and show the output
//! 2. Ask the operator to confirm the preview
//! 3. Ask a second time before touching the group
//! 4. Run the applier's `apply` and show the output
//!
//! Whatever happens in between, the artifact is deleted before `run`
//! returns. A declined confirmation ends in [`ResetOutcome::Aborted`]; an
//! applier or prompt failure also aborts and its error is returned.

use std::path::Path;
use tracing::{debug, info, warn};

use super::artifact::IntermediateArtifact;
use crate::apply::{OffsetApplier, ResetAssignments};
use crate::prompt::Prompter;
use crate::Result;

const FIRST_CONFIRMATION: &str = "Do the proposed changes look good to you?";
const SECOND_CONFIRMATION: &str = "Are you sure you want to execute these offset changes?";

/// States of one reset run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    Idle,
    DryRunPending,
    AwaitingFirstConfirmation,
    AwaitingSecondConfirmation,
    Executing,
    Cleanup,
    Committed,
    Aborted,
}

/// How a reset run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Committed,
    Aborted,
}

impl ResetOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            ResetOutcome::Committed => 0,
            ResetOutcome::Aborted => 1,
        }
    }
}

/// Target of a reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    pub bootstrap_servers: Vec<String>,
    pub group_id: String,
}

/// Runs the two-confirmation reset state machine
pub struct ResetOrchestrator<'a, P: Prompter> {
    applier: &'a dyn OffsetApplier,
    prompter: &'a mut P,
    history: Vec<ResetState>,
}

impl<'a, P: Prompter> ResetOrchestrator<'a, P> {
    pub fn new(applier: &'a dyn OffsetApplier, prompter: &'a mut P) -> Self {
        Self {
            applier,
            prompter,
            history: vec![ResetState::Idle],
        }
    }

    /// States visited by the last run, in order
    pub fn states(&self) -> &[ResetState] {
        &self.history
    }

    /// Reset `request.group_id` to the offsets in `artifact`, consuming it.
    pub async fn run(
        &mut self,
        request: &ResetRequest,
        artifact: IntermediateArtifact,
    ) -> Result<ResetOutcome> {
        self.history = vec![ResetState::Idle];
        info!(
            "Generating an offset reset operation on {} from {}",
            request.group_id,
            artifact.path().display()
        );

        let result = self.drive(request, artifact.path()).await;

        self.transition(ResetState::Cleanup);
        if matches!(result, Ok(ResetOutcome::Committed)) {
            if let Err(e) = self.prompter.say("\nCleaning up...\n") {
                warn!("Failed to write to the operator: {}", e);
            }
        }
        let removed = artifact.remove();

        match result {
            Ok(outcome) => {
                self.transition(match outcome {
                    ResetOutcome::Committed => ResetState::Committed,
                    ResetOutcome::Aborted => ResetState::Aborted,
                });
                removed?;
                if outcome == ResetOutcome::Committed {
                    self.prompter.say("DONE!")?;
                }
                Ok(outcome)
            }
            Err(e) => {
                self.transition(ResetState::Aborted);
                if let Err(remove_err) = removed {
                    warn!("Failed to remove offset artifact: {}", remove_err);
                }
                Err(e)
            }
        }
    }

    async fn drive(
        &mut self,
        request: &ResetRequest,
        artifact_path: &Path,
    ) -> Result<ResetOutcome> {
        let assignments = ResetAssignments {
            bootstrap_servers: &request.bootstrap_servers,
            group_id: &request.group_id,
            artifact_path,
        };
        let applier = self.applier;

        self.transition(ResetState::DryRunPending);
        let preview = applier.validate(&assignments).await?;
        self.prompter.say(&preview)?;

        self.transition(ResetState::AwaitingFirstConfirmation);
        self.prompter
            .say("\n************************************************")?;
        if !self.prompter.confirm(FIRST_CONFIRMATION)? {
            info!("Reset of {} declined at review", request.group_id);
            return Ok(ResetOutcome::Aborted);
        }
        self.prompter.say("\nProceeding...\n")?;

        self.transition(ResetState::AwaitingSecondConfirmation);
        if !self.prompter.confirm(SECOND_CONFIRMATION)? {
            info!("Reset of {} declined before execution", request.group_id);
            return Ok(ResetOutcome::Aborted);
        }

        self.transition(ResetState::Executing);
        let output = applier.apply(&assignments).await?;
        self.prompter.say(&output)?;

        info!("Offsets of {} have been reset", request.group_id);
        Ok(ResetOutcome::Committed)
    }

    fn transition(&mut self, next: ResetState) {
        debug!("Reset state: {:?}", next);
        self.history.push(next);
    }
}
