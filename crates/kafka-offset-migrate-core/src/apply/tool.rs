//! `kafka-consumer-groups --reset-offsets --from-file` applier.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{OffsetApplier, ResetAssignments};
use crate::{Error, Result};

/// Which pass of the reset tool to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    DryRun,
    Execute,
}

impl ResetMode {
    pub fn flag(&self) -> &'static str {
        match self {
            ResetMode::DryRun => "--dry-run",
            ResetMode::Execute => "--execute",
        }
    }
}

/// Runs the Kafka distribution's consumer group tool
#[derive(Debug, Clone)]
pub struct ConsumerGroupsTool {
    program: PathBuf,
    command_config: Option<PathBuf>,
}

impl ConsumerGroupsTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            command_config: None,
        }
    }

    /// Pass a client properties file with `--command-config`
    pub fn with_command_config(mut self, command_config: Option<PathBuf>) -> Self {
        self.command_config = command_config;
        self
    }

    /// Arguments for one invocation, program excluded
    pub fn command_args(
        &self,
        assignments: &ResetAssignments<'_>,
        mode: ResetMode,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--bootstrap-server".into(),
            assignments.bootstrap_servers.join(",").into(),
        ];

        if let Some(command_config) = &self.command_config {
            args.push("--command-config".into());
            args.push(command_config.into());
        }

        args.extend([
            "--group".into(),
            assignments.group_id.into(),
            "--reset-offsets".into(),
            "--from-file".into(),
            assignments.artifact_path.into(),
            mode.flag().into(),
        ]);

        args
    }

    async fn run(&self, assignments: &ResetAssignments<'_>, mode: ResetMode) -> Result<String> {
        let args = self.command_args(assignments, mode);
        info!(
            "Running {} for group {} ({})",
            self.program.display(),
            assignments.group_id,
            mode.flag()
        );
        debug!("Arguments: {:?}", args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Error::ExternalTool(format!(
                    "failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            if !stdout.trim().is_empty() {
                debug!("{} stdout: {}", self.program.display(), stdout.trim());
            }
            return Err(Error::ExternalTool(format!(
                "{} {} exited with {}: {}",
                self.program.display(),
                mode.flag(),
                output.status,
                stderr.trim()
            )));
        }

        if !stderr.trim().is_empty() {
            warn!("{} stderr: {}", self.program.display(), stderr.trim());
        }

        Ok(stdout)
    }
}

#[async_trait]
impl OffsetApplier for ConsumerGroupsTool {
    async fn validate(&self, assignments: &ResetAssignments<'_>) -> Result<String> {
        self.run(assignments, ResetMode::DryRun).await
    }

    async fn apply(&self, assignments: &ResetAssignments<'_>) -> Result<String> {
        self.run(assignments, ResetMode::Execute).await
    }
}
