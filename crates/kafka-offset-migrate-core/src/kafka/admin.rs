//! Admin query interface used to read a group's committed offsets.
//!
//! [`AdminConnector`] opens an [`AdminClient`]; the client lists offsets and
//! must be closed by whoever opened it. [`KafkaAdminConnector`] is the
//! broker-backed implementation.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{fetch_offsets, KafkaClient};
use crate::config::KafkaConfig;
use crate::error::KafkaError;
use crate::snapshot::OffsetEntry;
use crate::{Error, Result};

/// An open admin connection
#[async_trait]
pub trait AdminClient: Send + Sync {
    /// List the committed offset of every (topic, partition) held by `group_id`.
    async fn list_group_offsets(&self, group_id: &str) -> Result<Vec<OffsetEntry>>;

    /// Release the connection.
    async fn close(&self) -> Result<()>;
}

/// Opens admin connections to a cluster
#[async_trait]
pub trait AdminConnector: Send + Sync {
    /// Connect to the cluster reachable through any of `bootstrap_servers`.
    async fn connect(&self, bootstrap_servers: &[String]) -> Result<Box<dyn AdminClient>>;
}

#[async_trait]
impl AdminClient for KafkaClient {
    async fn list_group_offsets(&self, group_id: &str) -> Result<Vec<OffsetEntry>> {
        self.connect_to_coordinator(group_id).await?;

        let committed = fetch_offsets(self, group_id).await?;
        let mut entries = Vec::with_capacity(committed.len());

        for offset in committed {
            if offset.is_committed() {
                entries.push(OffsetEntry::new(offset.topic, offset.partition, offset.offset));
            } else if offset.error_code != 0 {
                warn!(
                    "Skipping {}:{} for group {} - error code {}",
                    offset.topic, offset.partition, group_id, offset.error_code
                );
            } else {
                debug!(
                    "Skipping {}:{} for group {} - no committed offset",
                    offset.topic, offset.partition, group_id
                );
            }
        }

        Ok(entries)
    }

    async fn close(&self) -> Result<()> {
        KafkaClient::close(self).await
    }
}

/// Connects to a Kafka cluster over the wire protocol.
///
/// Security and socket settings come from the configuration it was built
/// with; the brokers are given per connection.
#[derive(Debug, Clone)]
pub struct KafkaAdminConnector {
    config: KafkaConfig,
}

impl KafkaAdminConnector {
    pub fn new(config: KafkaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AdminConnector for KafkaAdminConnector {
    async fn connect(&self, bootstrap_servers: &[String]) -> Result<Box<dyn AdminClient>> {
        if bootstrap_servers.is_empty() {
            return Err(Error::Config("no bootstrap servers configured".to_string()));
        }

        let client = KafkaClient::new(KafkaConfig {
            bootstrap_servers: bootstrap_servers.to_vec(),
            ..self.config.clone()
        });
        match client.connect().await {
            Ok(()) => Ok(Box::new(client)),
            Err(Error::Kafka(KafkaError::NoBrokersAvailable { last_error })) => {
                Err(Error::Connection(format!(
                    "none of the brokers [{}] is reachable: {}",
                    bootstrap_servers.join(","),
                    last_error
                )))
            }
            Err(e) => Err(e),
        }
    }
}
