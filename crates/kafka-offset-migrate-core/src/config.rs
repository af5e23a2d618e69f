//! Configuration structures for offset migration runs.
//!
//! Every field is optional from the operator's point of view: values missing
//! here (and on the command line) are asked for interactively.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Result;

/// Default location of the intermediate offset artifact.
pub const DEFAULT_ARTIFACT_PATH: &str = "./_generated_offset_reset.csv";

/// Default path of the consumer group reset tool shipped with Kafka packages.
pub const DEFAULT_RESET_TOOL: &str = "/usr/bin/kafka-consumer-groups";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Kafka cluster the groups live on
    #[serde(default)]
    pub kafka: KafkaConfig,

    /// Consumer group to migrate offsets from
    #[serde(default)]
    pub source_group: Option<String>,

    /// Consumer group to migrate offsets to
    #[serde(default)]
    pub target_group: Option<String>,

    /// Topics to leave behind. `None` means ask the operator.
    #[serde(default)]
    pub exclude_topics: Option<Vec<String>>,

    /// Where the intermediate offset artifact is written
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// How offsets are applied to the target group
    #[serde(default)]
    pub applier: ApplierConfig,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            kafka: KafkaConfig::default(),
            source_group: None,
            target_group: None,
            exclude_topics: None,
            artifact_path: default_artifact_path(),
            applier: ApplierConfig::default(),
        }
    }
}

impl MigrationConfig {
    /// Parse a YAML configuration document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_PATH)
}

/// Offset applier selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ApplierConfig {
    /// Shell out to `kafka-consumer-groups --reset-offsets --from-file`
    ConsumerGroupsTool {
        /// Path to the reset tool executable
        #[serde(default = "default_reset_tool")]
        program: PathBuf,

        /// Optional client properties file passed as `--command-config`
        #[serde(default)]
        command_config: Option<PathBuf>,
    },

    /// Commit offsets directly with OffsetCommit requests
    Direct,
}

impl Default for ApplierConfig {
    fn default() -> Self {
        ApplierConfig::ConsumerGroupsTool {
            program: default_reset_tool(),
            command_config: None,
        }
    }
}

fn default_reset_tool() -> PathBuf {
    PathBuf::from(DEFAULT_RESET_TOOL)
}

/// Kafka cluster configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// Bootstrap servers
    #[serde(default)]
    pub bootstrap_servers: Vec<String>,

    /// Security configuration
    #[serde(default)]
    pub security: SecurityConfig,

    /// TCP connection tuning
    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Security configuration for Kafka connections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Security protocol
    #[serde(default)]
    pub security_protocol: SecurityProtocol,

    /// SASL mechanism (if using SASL)
    #[serde(default)]
    pub sasl_mechanism: Option<SaslMechanism>,

    /// SASL username
    #[serde(default)]
    pub sasl_username: Option<String>,

    /// SASL password
    #[serde(default)]
    pub sasl_password: Option<String>,

    /// Path to CA certificate file (for TLS)
    #[serde(default)]
    pub ssl_ca_location: Option<PathBuf>,

    /// Path to client certificate file (for mTLS)
    #[serde(default)]
    pub ssl_certificate_location: Option<PathBuf>,

    /// Path to client key file (for mTLS)
    #[serde(default)]
    pub ssl_key_location: Option<PathBuf>,
}

/// Security protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityProtocol {
    #[default]
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl SecurityProtocol {
    /// Whether the connection must be wrapped in TLS
    pub fn uses_tls(&self) -> bool {
        matches!(self, SecurityProtocol::Ssl | SecurityProtocol::SaslSsl)
    }

    /// Whether the connection must authenticate with SASL
    pub fn uses_sasl(&self) -> bool {
        matches!(
            self,
            SecurityProtocol::SaslPlaintext | SecurityProtocol::SaslSsl
        )
    }
}

impl From<&str> for SecurityProtocol {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SSL" => SecurityProtocol::Ssl,
            "SASL_PLAINTEXT" => SecurityProtocol::SaslPlaintext,
            "SASL_SSL" => SecurityProtocol::SaslSsl,
            _ => SecurityProtocol::Plaintext,
        }
    }
}

/// SASL mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum SaslMechanism {
    Plain,
    ScramSha256,
    ScramSha512,
}

/// TCP socket options applied to every broker connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Enable TCP keepalive probes
    #[serde(default = "default_true")]
    pub tcp_keepalive: bool,

    /// Idle time before the first keepalive probe, in seconds
    #[serde(default = "default_keepalive_time_secs")]
    pub keepalive_time_secs: u64,

    /// Interval between keepalive probes, in seconds
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,

    /// Disable Nagle's algorithm
    #[serde(default = "default_true")]
    pub tcp_nodelay: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            tcp_keepalive: true,
            keepalive_time_secs: default_keepalive_time_secs(),
            keepalive_interval_secs: default_keepalive_interval_secs(),
            tcp_nodelay: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_keepalive_time_secs() -> u64 {
    60
}

fn default_keepalive_interval_secs() -> u64 {
    20
}
