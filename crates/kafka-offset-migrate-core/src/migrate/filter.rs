//! Topic listing and exclusion.

use std::collections::HashSet;
use tracing::debug;

use crate::snapshot::OffsetSnapshot;

/// Distinct topic names of a snapshot in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicSet(Vec<String>);

impl TopicSet {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.0.iter().any(|t| t == topic)
    }

    /// Comma-separated rendering used when showing topics to the operator
    pub fn join(&self, sep: &str) -> String {
        self.0.join(sep)
    }
}

/// Topics the operator wants to leave out of the migration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList(HashSet<String>);

impl ExclusionList {
    /// Parse operator input such as `"topic1, topic2,topic3"`.
    ///
    /// All spaces are removed before splitting on `,`; empty items are dropped.
    pub fn parse(input: &str) -> Self {
        input
            .replace(' ', "")
            .split(',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.0.contains(topic)
    }

    /// Exclusions that name no topic in `topics`, sorted
    pub fn unmatched(&self, topics: &TopicSet) -> Vec<&str> {
        let mut unknown: Vec<&str> = self
            .0
            .iter()
            .map(String::as_str)
            .filter(|t| !topics.contains(t))
            .collect();
        unknown.sort_unstable();
        unknown
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Distinct topics of `snapshot`, in the order they first appear.
pub fn topics(snapshot: &OffsetSnapshot) -> TopicSet {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for entry in snapshot.entries() {
        if seen.insert(entry.topic.clone()) {
            ordered.push(entry.topic);
        }
    }
    TopicSet(ordered)
}

/// Remove every entry whose topic is excluded.
///
/// Exclusions that match no topic are ignored. With no exclusions the input
/// is returned as is.
pub fn prune(snapshot: OffsetSnapshot, exclusions: &ExclusionList) -> OffsetSnapshot {
    if exclusions.is_empty() {
        return snapshot;
    }

    let unknown = exclusions.unmatched(&topics(&snapshot));
    if !unknown.is_empty() {
        debug!("Ignoring exclusions with no committed offsets: {:?}", unknown);
    }

    let mut pruned = snapshot;
    pruned.retain(|tp, _| !exclusions.contains(&tp.topic));
    pruned
}
