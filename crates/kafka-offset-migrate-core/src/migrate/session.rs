//! Interactive migration session.
//!
//! Gathers the brokers and both group names from the operator, shows what the
//! source group is subscribed to, lets the operator exclude topics, writes the
//! artifact and hands it to the [`ResetOrchestrator`]. Every value the operator
//! would type can be supplied up front through [`SessionSettings`]; the yes/no
//! gates are always asked.

use std::path::PathBuf;
use tracing::{info, warn};

use super::artifact::IntermediateArtifact;
use super::collector::collect;
use super::filter::{prune, topics, ExclusionList};
use super::orchestrator::{ResetOrchestrator, ResetOutcome, ResetRequest};
use crate::apply::OffsetApplier;
use crate::config::{MigrationConfig, DEFAULT_ARTIFACT_PATH};
use crate::kafka::AdminConnector;
use crate::prompt::Prompter;
use crate::snapshot::OffsetSnapshot;
use crate::{Error, Result};

const BANNER: &str =
    "\n**************************************************************************************************\n";

/// Values known before the session starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub bootstrap_servers: Option<Vec<String>>,
    pub source_group: Option<String>,
    pub target_group: Option<String>,
    pub exclusions: Option<ExclusionList>,
    pub artifact_path: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            bootstrap_servers: None,
            source_group: None,
            target_group: None,
            exclusions: None,
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
        }
    }
}

impl From<&MigrationConfig> for SessionSettings {
    fn from(config: &MigrationConfig) -> Self {
        let brokers = &config.kafka.bootstrap_servers;
        Self {
            bootstrap_servers: (!brokers.is_empty()).then(|| brokers.clone()),
            source_group: config.source_group.clone(),
            target_group: config.target_group.clone(),
            exclusions: config
                .exclude_topics
                .as_ref()
                .map(|topics| ExclusionList::parse(&topics.join(","))),
            artifact_path: config.artifact_path.clone(),
        }
    }
}

/// One operator-driven migration from a source group to a target group
pub struct MigrationSession<'a, P: Prompter> {
    settings: SessionSettings,
    connector: &'a dyn AdminConnector,
    applier: &'a dyn OffsetApplier,
    prompter: &'a mut P,
}

impl<'a, P: Prompter> MigrationSession<'a, P> {
    pub fn new(
        settings: SessionSettings,
        connector: &'a dyn AdminConnector,
        applier: &'a dyn OffsetApplier,
        prompter: &'a mut P,
    ) -> Self {
        Self {
            settings,
            connector,
            applier,
            prompter,
        }
    }

    /// Run the session to completion.
    ///
    /// Declined gates return [`ResetOutcome::Aborted`]; any artifact written
    /// by then has been removed.
    pub async fn run(mut self) -> Result<ResetOutcome> {
        let brokers = self.bootstrap_servers()?;
        self.prompter
            .say(&format!("\nUsing brokers: {}", brokers.join(",")))?;

        let source_group = self.group(
            self.settings.source_group.clone(),
            "\nPlease enter the old consumer group you are migrating from: ",
        )?;
        self.prompter
            .say(&format!("\nOld consumer group is set as: {}", source_group))?;

        let subscribed = topics(&self.snapshot(&brokers, &source_group).await?);
        self.prompter.say(&format!(
            "\n{} is currently subscribed to the following topics: {}",
            source_group,
            subscribed.join(", ")
        ))?;

        let exclusions = self.exclusions()?;

        self.prompter.say(BANNER)?;
        self.prompter.say(
            "Please note, ALL consumers in this group must be turned off, and the consumer group must be empty!",
        )?;
        self.prompter.say(BANNER)?;
        if !self
            .prompter
            .confirm("Have you confirmed all consumers are out of the group and it is empty?")?
        {
            info!("Migration of {} stopped: group not confirmed empty", source_group);
            return Ok(ResetOutcome::Aborted);
        }

        self.prompter.say("\nGenerating offsets...")?;
        let snapshot = prune(self.snapshot(&brokers, &source_group).await?, &exclusions);
        let artifact =
            IntermediateArtifact::create(&snapshot, self.settings.artifact_path.clone())?;
        info!(
            "Wrote {} offsets of {} to {}",
            snapshot.len(),
            source_group,
            artifact.path().display()
        );

        self.prompter.say(&format!(
            "\nA CSV file containing current offsets for {} has been generated at {}, please verify this looks appropriate.",
            source_group,
            artifact.path().display()
        ))?;
        if !self.prompter.confirm("\nProceed?")? {
            artifact.remove()?;
            return Ok(ResetOutcome::Aborted);
        }

        // The artifact handle deletes the file if anything below fails.
        let target_group = self.group(
            self.settings.target_group.clone(),
            "\nPlease enter the new consumer group you want to set these offsets to: ",
        )?;
        if target_group == source_group {
            return Err(Error::Config(format!(
                "new consumer group must differ from the old one ({})",
                source_group
            )));
        }
        self.prompter
            .say(&format!("\nNew consumer group is set as: {}\n", target_group))?;
        self.prompter.say(&format!(
            "Generating an offset reset operation on {} ....\n",
            target_group
        ))?;

        let request = ResetRequest {
            bootstrap_servers: brokers,
            group_id: target_group,
        };
        let mut orchestrator = ResetOrchestrator::new(self.applier, self.prompter);
        let outcome = orchestrator.run(&request, artifact).await?;
        Ok(outcome)
    }

    fn bootstrap_servers(&mut self) -> Result<Vec<String>> {
        let brokers = match self.settings.bootstrap_servers.clone() {
            Some(brokers) => brokers,
            None => parse_brokers(&self.prompter.ask(
                "\nPlease enter the Kafka broker hostnames in a comma separated list (e.g. kafka1:9092,kafka2:9092,kafka3:9092): ",
            )?),
        };

        if brokers.is_empty() {
            return Err(Error::Config("no Kafka brokers given".to_string()));
        }
        Ok(brokers)
    }

    fn group(&mut self, preset: Option<String>, question: &str) -> Result<String> {
        let group = match preset {
            Some(group) => group,
            None => self.prompter.ask(question)?,
        };

        let group = group.trim();
        if group.is_empty() {
            return Err(Error::Config("consumer group name must not be empty".to_string()));
        }
        Ok(group.to_string())
    }

    fn exclusions(&mut self) -> Result<ExclusionList> {
        if let Some(exclusions) = &self.settings.exclusions {
            return Ok(exclusions.clone());
        }

        let wants_removal = self.prompter.confirm(
            "\nWould you like to remove any of these topics so they are not part of the new consumer group?",
        )?;
        if !wants_removal {
            return Ok(ExclusionList::default());
        }

        let input = self.prompter.ask(
            "\nPlease enter the topic(s) in the above list you want to remove (e.g. topic1, topic2, topic3): ",
        )?;
        Ok(ExclusionList::parse(&input))
    }

    /// Collect the source group, treating an unknown group as empty.
    async fn snapshot(&mut self, brokers: &[String], group_id: &str) -> Result<OffsetSnapshot> {
        match collect(self.connector, brokers, group_id).await {
            Err(Error::GroupNotFound(group)) => {
                warn!("Consumer group {} was not found", group);
                self.prompter.say(&format!(
                    "\nConsumer group {} was not found; continuing with no offsets.",
                    group
                ))?;
                Ok(OffsetSnapshot::new())
            }
            other => other,
        }
    }
}

/// Split a comma separated broker list, dropping blanks.
pub fn parse_brokers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}
