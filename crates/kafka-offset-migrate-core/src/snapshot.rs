//! Offset snapshot data model.
//!
//! An [`OffsetSnapshot`] is the committed read position of every
//! (topic, partition) a consumer group has offsets for, captured at one point
//! in time. Iteration order is insertion order, so whatever order the
//! collector inserts in is the order the artifact is written in.

use indexmap::IndexMap;
use std::fmt;

/// A topic/partition pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicPartition {
    /// Topic name
    pub topic: String,
    /// Partition ID
    pub partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.topic, self.partition)
    }
}

/// One committed read position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OffsetEntry {
    /// Topic name
    pub topic: String,
    /// Partition ID
    pub partition: i32,
    /// Committed offset
    pub offset: i64,
}

impl OffsetEntry {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }

    pub fn topic_partition(&self) -> TopicPartition {
        TopicPartition::new(self.topic.clone(), self.partition)
    }
}

/// Committed offsets of a consumer group, at most one per (topic, partition)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetSnapshot {
    offsets: IndexMap<TopicPartition, i64>,
}

impl OffsetSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the offset for a (topic, partition).
    ///
    /// A replaced entry keeps its original position.
    pub fn insert(&mut self, topic: impl Into<String>, partition: i32, offset: i64) {
        self.offsets
            .insert(TopicPartition::new(topic, partition), offset);
    }

    /// Look up the offset for a (topic, partition)
    pub fn get(&self, topic: &str, partition: i32) -> Option<i64> {
        self.offsets
            .get(&TopicPartition::new(topic, partition))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = OffsetEntry> + '_ {
        self.offsets
            .iter()
            .map(|(tp, offset)| OffsetEntry::new(tp.topic.clone(), tp.partition, *offset))
    }

    /// Keep only the entries for which `keep` returns true, preserving order
    pub fn retain(&mut self, mut keep: impl FnMut(&TopicPartition, i64) -> bool) {
        self.offsets.retain(|tp, offset| keep(tp, *offset));
    }
}

impl FromIterator<OffsetEntry> for OffsetSnapshot {
    fn from_iter<I: IntoIterator<Item = OffsetEntry>>(iter: I) -> Self {
        let mut snapshot = OffsetSnapshot::new();
        for entry in iter {
            snapshot.insert(entry.topic, entry.partition, entry.offset);
        }
        snapshot
    }
}
