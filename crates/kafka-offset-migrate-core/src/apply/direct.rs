//! Applier that commits the artifact's offsets with OffsetCommit requests.
//!
//! Needs no Kafka distribution on the host. The preview reads the target
//! group's current offsets and prints them next to the new ones.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Write as _;
use tracing::{debug, info};

use super::{OffsetApplier, ResetAssignments};
use crate::config::KafkaConfig;
use crate::error::KafkaError;
use crate::kafka::{commit_offsets, fetch_offsets, KafkaClient};
use crate::migrate::artifact;
use crate::snapshot::{OffsetSnapshot, TopicPartition};
use crate::{Error, Result};

/// Commits offsets through the group coordinator
#[derive(Debug, Clone)]
pub struct DirectCommitApplier {
    kafka: KafkaConfig,
}

impl DirectCommitApplier {
    /// Security and socket settings come from `kafka`; the brokers come from
    /// each request's assignments.
    pub fn new(kafka: KafkaConfig) -> Self {
        Self { kafka }
    }

    async fn coordinator_client(&self, assignments: &ResetAssignments<'_>) -> Result<KafkaClient> {
        if assignments.bootstrap_servers.is_empty() {
            return Err(Error::Config("no bootstrap servers configured".to_string()));
        }

        let config = KafkaConfig {
            bootstrap_servers: assignments.bootstrap_servers.to_vec(),
            ..self.kafka.clone()
        };
        let client = KafkaClient::new(config);

        match client.connect().await {
            Ok(()) => {}
            Err(Error::Kafka(KafkaError::NoBrokersAvailable { last_error })) => {
                return Err(Error::Connection(format!(
                    "none of the brokers [{}] is reachable: {}",
                    assignments.bootstrap_servers.join(","),
                    last_error
                )))
            }
            Err(e) => return Err(e),
        }

        if let Err(e) = client.connect_to_coordinator(assignments.group_id).await {
            let _ = client.close().await;
            return Err(e);
        }

        Ok(client)
    }

    async fn current_offsets(
        client: &KafkaClient,
        group_id: &str,
    ) -> Result<HashMap<TopicPartition, i64>> {
        match fetch_offsets(client, group_id).await {
            Ok(committed) => Ok(committed
                .into_iter()
                .filter(|o| o.is_committed())
                .map(|o| (TopicPartition::new(o.topic, o.partition), o.offset))
                .collect()),
            Err(Error::GroupNotFound(_)) => {
                debug!("Group {} does not exist yet", group_id);
                Ok(HashMap::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl OffsetApplier for DirectCommitApplier {
    async fn validate(&self, assignments: &ResetAssignments<'_>) -> Result<String> {
        let planned = artifact::read(assignments.artifact_path)?;
        let client = self.coordinator_client(assignments).await?;

        let current = Self::current_offsets(&client, assignments.group_id).await;
        client.close().await?;

        Ok(render_preview(assignments.group_id, &planned, &current?))
    }

    async fn apply(&self, assignments: &ResetAssignments<'_>) -> Result<String> {
        let planned = artifact::read(assignments.artifact_path)?;
        let entries: Vec<_> = planned.entries().collect();
        if entries.is_empty() {
            info!("Nothing to commit for group {}", assignments.group_id);
            return Ok(render_preview(assignments.group_id, &planned, &HashMap::new()));
        }

        let client = self.coordinator_client(assignments).await?;
        let committed = commit_offsets(&client, assignments.group_id, &entries).await;
        client.close().await?;
        let results = committed?;

        let failed: Vec<String> = results
            .iter()
            .filter(|r| r.error_code != 0)
            .map(|r| format!("{}:{} (error code {})", r.topic, r.partition, r.error_code))
            .collect();

        if !failed.is_empty() {
            return Err(Error::ExternalTool(format!(
                "OffsetCommit for group {} failed for {} of {} partitions: {}",
                assignments.group_id,
                failed.len(),
                results.len(),
                failed.join(", ")
            )));
        }

        info!(
            "Committed {} offsets for group {}",
            results.len(),
            assignments.group_id
        );
        Ok(render_preview(assignments.group_id, &planned, &HashMap::new()))
    }
}

/// Tabular preview in the layout of the consumer group tool's dry run.
fn render_preview(
    group_id: &str,
    planned: &OffsetSnapshot,
    current: &HashMap<TopicPartition, i64>,
) -> String {
    let topic_width = planned
        .entries()
        .map(|e| e.topic.len())
        .max()
        .unwrap_or(0)
        .max("TOPIC".len());
    let group_width = group_id.len().max("GROUP".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<gw$} {:<tw$} {:>9} {:>14} {:>14}",
        "GROUP",
        "TOPIC",
        "PARTITION",
        "CURRENT-OFFSET",
        "NEW-OFFSET",
        gw = group_width,
        tw = topic_width
    );

    for entry in planned.entries() {
        let previous = current
            .get(&entry.topic_partition())
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<gw$} {:<tw$} {:>9} {:>14} {:>14}",
            group_id,
            entry.topic,
            entry.partition,
            previous,
            entry.offset,
            gw = group_width,
            tw = topic_width
        );
    }

    out
}
