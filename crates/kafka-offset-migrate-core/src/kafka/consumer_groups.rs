//! Consumer group offset requests.
//!
//! - OffsetFetch: read every committed offset of a group
//! - OffsetCommit: write offsets for a group that has no active members
//!
//! Both must be sent over a connection to the group coordinator.

use indexmap::IndexMap;
use kafka_protocol::messages::offset_commit_request::{
    OffsetCommitRequestPartition, OffsetCommitRequestTopic,
};
use kafka_protocol::messages::{
    ApiKey, GroupId, OffsetCommitRequest, OffsetCommitResponse, OffsetFetchRequest,
    OffsetFetchResponse, TopicName,
};
use kafka_protocol::protocol::StrBytes;
use tracing::{debug, warn};

use super::KafkaClient;
use crate::error::KafkaError;
use crate::snapshot::OffsetEntry;
use crate::{Error, Result};

/// INVALID_GROUP_ID
pub const ERROR_INVALID_GROUP_ID: i16 = 24;
/// GROUP_ID_NOT_FOUND
pub const ERROR_GROUP_ID_NOT_FOUND: i16 = 69;

/// Committed offset for a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedOffset {
    /// Topic name
    pub topic: String,
    /// Partition ID
    pub partition: i32,
    /// Committed offset, -1 when nothing is committed
    pub offset: i64,
    /// Error code (0 = success)
    pub error_code: i16,
}

impl CommittedOffset {
    /// Whether this partition carries a usable committed position
    pub fn is_committed(&self) -> bool {
        self.error_code == 0 && self.offset >= 0
    }
}

/// Per-partition outcome of an offset commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    pub topic: String,
    pub partition: i32,
    pub error_code: i16,
}

/// Fetch every committed offset for a consumer group.
pub async fn fetch_offsets(client: &KafkaClient, group_id: &str) -> Result<Vec<CommittedOffset>> {
    let request = OffsetFetchRequest::default()
        .with_group_id(GroupId(StrBytes::from_string(group_id.to_string())))
        .with_topics(None);

    let response: OffsetFetchResponse = client.send_request(ApiKey::OffsetFetch, request).await?;

    check_group_error(group_id, response.error_code)?;

    let mut offsets = Vec::new();
    for topic in response.topics {
        for partition in topic.partitions {
            offsets.push(CommittedOffset {
                topic: topic.name.to_string(),
                partition: partition.partition_index,
                offset: partition.committed_offset,
                error_code: partition.error_code,
            });
        }
    }

    debug!(
        "Fetched {} committed offsets for group {}",
        offsets.len(),
        group_id
    );
    Ok(offsets)
}

/// Commit offsets for a consumer group.
///
/// Returns one result per partition; partition-level failures are reported
/// in the result, not as an error.
pub async fn commit_offsets(
    client: &KafkaClient,
    group_id: &str,
    offsets: &[OffsetEntry],
) -> Result<Vec<CommitResult>> {
    let mut by_topic: IndexMap<&str, Vec<&OffsetEntry>> = IndexMap::new();
    for entry in offsets {
        by_topic.entry(entry.topic.as_str()).or_default().push(entry);
    }

    let topics: Vec<_> = by_topic
        .into_iter()
        .map(|(topic, entries)| {
            let partitions = entries
                .into_iter()
                .map(|e| {
                    OffsetCommitRequestPartition::default()
                        .with_partition_index(e.partition)
                        .with_committed_offset(e.offset)
                })
                .collect();

            OffsetCommitRequestTopic::default()
                .with_name(TopicName(StrBytes::from_string(topic.to_string())))
                .with_partitions(partitions)
        })
        .collect();

    let request = OffsetCommitRequest::default()
        .with_group_id(GroupId(StrBytes::from_string(group_id.to_string())))
        .with_topics(topics);

    let response: OffsetCommitResponse = client.send_request(ApiKey::OffsetCommit, request).await?;

    let mut results = Vec::new();
    for topic in response.topics {
        for partition in topic.partitions {
            if partition.error_code != 0 {
                warn!(
                    "Failed to commit offset for {}:{} - error code {}",
                    topic.name.as_str(),
                    partition.partition_index,
                    partition.error_code
                );
            }
            results.push(CommitResult {
                topic: topic.name.to_string(),
                partition: partition.partition_index,
                error_code: partition.error_code,
            });
        }
    }

    debug!("Committed {} offsets for group {}", results.len(), group_id);
    Ok(results)
}

/// Map a group-level OffsetFetch error code to an error.
fn check_group_error(group_id: &str, error_code: i16) -> Result<()> {
    match error_code {
        0 => Ok(()),
        ERROR_GROUP_ID_NOT_FOUND | ERROR_INVALID_GROUP_ID => {
            Err(Error::GroupNotFound(group_id.to_string()))
        }
        code => Err(KafkaError::BrokerError {
            code,
            message: format!("OffsetFetch for group {} failed", group_id),
        }
        .into()),
    }
}
