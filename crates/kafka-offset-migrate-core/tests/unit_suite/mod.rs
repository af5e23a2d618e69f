//! Unit tests for kafka-offset-migrate-core.
//!
//! These tests use in-memory fakes and temporary directories only.

pub mod artifact;
pub mod properties;
pub mod reset;
pub mod session;
