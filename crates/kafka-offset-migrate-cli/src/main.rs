use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "kafka-offset-migrate")]
#[command(about = "Migrate committed offsets from one Kafka consumer group to another", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kafka bootstrap servers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    bootstrap_servers: Vec<String>,

    /// Consumer group to migrate offsets from
    #[arg(long)]
    from_group: Option<String>,

    /// Consumer group to migrate offsets to
    #[arg(long)]
    to_group: Option<String>,

    /// Topics to leave out of the migration (comma-separated)
    #[arg(long)]
    exclude: Option<String>,

    /// Where to write the intermediate offset file
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// How offsets are applied to the new group
    #[arg(long, value_enum)]
    applier: Option<ApplierKind>,

    /// Path to the kafka-consumer-groups executable
    #[arg(long)]
    reset_tool: Option<PathBuf>,

    /// Client properties file passed to kafka-consumer-groups
    #[arg(long)]
    command_config: Option<PathBuf>,

    /// Security protocol (PLAINTEXT, SSL, SASL_SSL, SASL_PLAINTEXT)
    #[arg(long)]
    security_protocol: Option<String>,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ApplierKind {
    /// Run kafka-consumer-groups --reset-offsets
    Tool,
    /// Commit offsets directly over the Kafka protocol
    Direct,
}

// Prompts block the main thread; the worker keeps the Ctrl+C handler responsive.
#[tokio::main(flavor = "multi_thread", worker_threads = 1)]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stdout carries the conversation with the operator.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let overrides = commands::migrate::Overrides {
        bootstrap_servers: cli.bootstrap_servers,
        from_group: cli.from_group,
        to_group: cli.to_group,
        exclude: cli.exclude,
        artifact: cli.artifact,
        direct: cli.applier.map(|kind| kind == ApplierKind::Direct),
        reset_tool: cli.reset_tool,
        command_config: cli.command_config,
        security_protocol: cli.security_protocol,
    };

    let outcome = commands::migrate::run(cli.config.as_deref(), overrides).await?;
    if outcome.exit_code() != 0 {
        std::process::exit(outcome.exit_code());
    }

    Ok(())
}
