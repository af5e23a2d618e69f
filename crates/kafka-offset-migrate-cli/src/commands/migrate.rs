//! Interactive offset migration command.

use anyhow::{Context, Result};
use kafka_offset_migrate_core::apply;
use kafka_offset_migrate_core::config::{
    ApplierConfig, MigrationConfig, SaslMechanism, SecurityConfig, SecurityProtocol,
};
use kafka_offset_migrate_core::{
    ConsolePrompter, KafkaAdminConnector, MigrationSession, ResetOutcome, SessionSettings,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Exit status for a run stopped with Ctrl+C
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Values given on the command line; each one wins over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bootstrap_servers: Vec<String>,
    pub from_group: Option<String>,
    pub to_group: Option<String>,
    pub exclude: Option<String>,
    pub artifact: Option<PathBuf>,
    pub direct: Option<bool>,
    pub reset_tool: Option<PathBuf>,
    pub command_config: Option<PathBuf>,
    pub security_protocol: Option<String>,
}

pub async fn run(config_path: Option<&Path>, overrides: Overrides) -> Result<ResetOutcome> {
    let mut config = match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            MigrationConfig::from_yaml(&content)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?
        }
        None => MigrationConfig::default(),
    };

    apply_overrides(&mut config, overrides);
    fill_credentials_from_env(&mut config.kafka.security);
    debug!("Applier: {:?}", config.applier);

    watch_for_interrupt(config.artifact_path.clone());

    let connector = KafkaAdminConnector::new(config.kafka.clone());
    let applier = apply::from_config(&config.applier, &config.kafka);
    let mut prompter = ConsolePrompter::stdio();

    let outcome = MigrationSession::new(
        SessionSettings::from(&config),
        &connector,
        applier.as_ref(),
        &mut prompter,
    )
    .run()
    .await?;

    info!("Migration finished: {:?}", outcome);
    Ok(outcome)
}

fn apply_overrides(config: &mut MigrationConfig, overrides: Overrides) {
    if !overrides.bootstrap_servers.is_empty() {
        config.kafka.bootstrap_servers = overrides.bootstrap_servers;
    }
    if overrides.from_group.is_some() {
        config.source_group = overrides.from_group;
    }
    if overrides.to_group.is_some() {
        config.target_group = overrides.to_group;
    }
    if let Some(exclude) = overrides.exclude {
        // Split and trimmed by ExclusionList::parse when the session starts.
        config.exclude_topics = Some(vec![exclude]);
    }
    if let Some(artifact) = overrides.artifact {
        config.artifact_path = artifact;
    }
    if let Some(protocol) = overrides.security_protocol {
        config.kafka.security.security_protocol = SecurityProtocol::from(protocol.as_str());
    }

    if overrides.direct == Some(true) {
        config.applier = ApplierConfig::Direct;
    } else if overrides.direct == Some(false) && config.applier == ApplierConfig::Direct {
        config.applier = ApplierConfig::default();
    }

    if let ApplierConfig::ConsumerGroupsTool {
        program,
        command_config,
    } = &mut config.applier
    {
        if let Some(tool) = overrides.reset_tool {
            *program = tool;
        }
        if overrides.command_config.is_some() {
            *command_config = overrides.command_config;
        }
    }
}

/// Delete the artifact and exit when the operator presses Ctrl+C.
///
/// A prompt blocks in `read_line`, so unwinding never reaches the artifact's
/// `Drop`; the file is removed from here instead.
fn watch_for_interrupt(artifact_path: PathBuf) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl+C: {}", e);
            return;
        }
        eprintln!("\nInterrupted, aborting migration.");
        discard_artifact(&artifact_path);
        std::process::exit(INTERRUPTED_EXIT_CODE);
    });
}

fn discard_artifact(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Take SASL credentials and the CA file from the environment when the
/// configuration leaves them out.
fn fill_credentials_from_env(security: &mut SecurityConfig) {
    if security.security_protocol.uses_sasl() {
        if security.sasl_mechanism.is_none() {
            security.sasl_mechanism = Some(SaslMechanism::Plain);
        }
        if security.sasl_username.is_none() {
            security.sasl_username = std::env::var("KAFKA_USERNAME").ok();
        }
        if security.sasl_password.is_none() {
            security.sasl_password = std::env::var("KAFKA_PASSWORD").ok();
        }
    }

    if security.security_protocol.uses_tls() && security.ssl_ca_location.is_none() {
        security.ssl_ca_location = std::env::var("KAFKA_SSL_CA_CERT").ok().map(PathBuf::from);
    }
}
