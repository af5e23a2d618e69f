//! Offset snapshot collection.

use tracing::{debug, info, warn};

use crate::kafka::AdminConnector;
use crate::snapshot::OffsetSnapshot;
use crate::Result;

/// Collect the committed offsets of `group_id` from the cluster at
/// `bootstrap_servers`.
///
/// Opens one admin connection, issues one listing request and closes the
/// connection before returning, whether or not the listing succeeded. Entries
/// are ordered by (topic, partition) so repeated runs produce the same
/// artifact. A group with no committed offsets yields an empty snapshot.
pub async fn collect(
    connector: &dyn AdminConnector,
    bootstrap_servers: &[String],
    group_id: &str,
) -> Result<OffsetSnapshot> {
    let admin = connector.connect(bootstrap_servers).await?;

    let listed = admin.list_group_offsets(group_id).await;
    let closed = admin.close().await;

    let mut entries = listed?;
    if let Err(e) = closed {
        warn!("Failed to close admin connection: {}", e);
        return Err(e);
    }

    entries.sort_by(|a, b| {
        a.topic
            .cmp(&b.topic)
            .then_with(|| a.partition.cmp(&b.partition))
    });

    let snapshot: OffsetSnapshot = entries.into_iter().collect();

    if snapshot.is_empty() {
        info!("Group {} has no committed offsets", group_id);
    } else {
        debug!(
            "Collected {} committed offsets for group {}",
            snapshot.len(),
            group_id
        );
    }

    Ok(snapshot)
}
