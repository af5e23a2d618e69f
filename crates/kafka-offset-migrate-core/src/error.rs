//! Error types for the offset migration core library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the offset migration library.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Kafka protocol error
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    /// No broker in the bootstrap list could be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The broker does not know the consumer group
    #[error("Consumer group not found: {0}")]
    GroupNotFound(String),

    /// The intermediate offset artifact could not be written, read or deleted
    #[error("Artifact error at {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The offset applier (external tool or direct commit) failed
    #[error("External tool error: {0}")]
    ExternalTool(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Authentication(String),
}

impl Error {
    /// Build an artifact error for `path`.
    pub fn artifact(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Artifact {
            path: path.into(),
            source,
        }
    }
}

/// Kafka-specific errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum KafkaError {
    /// Connection failed
    #[error("Failed to connect to broker {broker}: {message}")]
    ConnectionFailed { broker: String, message: String },

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Broker error response
    #[error("Broker returned error code {code}: {message}")]
    BrokerError { code: i16, message: String },

    /// Every bootstrap broker failed; carries the last failure seen
    #[error("No available brokers (last error: {last_error})")]
    NoBrokersAvailable { last_error: String },

    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    /// Certificate loading error
    #[error("Failed to load certificate from {path}: {message}")]
    CertificateLoad { path: String, message: String },

    /// Private key loading error
    #[error("Failed to load private key from {path}: {message}")]
    PrivateKeyLoad { path: String, message: String },
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
