//! Kafka protocol client implementation.

pub mod admin;
mod client;
pub mod consumer_groups;
mod tls;

pub use admin::{AdminClient, AdminConnector, KafkaAdminConnector};
pub use client::KafkaClient;
pub use consumer_groups::{commit_offsets, fetch_offsets, CommitResult, CommittedOffset};
