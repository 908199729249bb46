//! Kube Advisor CLI
//!
//! Audits Kubernetes workloads for containers that do not declare CPU and
//! memory requests and limits, and shows how to fix them.

mod client;
mod commands;
mod config;
mod output;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use advisor_lib::WorkloadKind;
use commands::{audit, nodes, remediation};
use config::AdvisorConfig;
use output::{print_error, OutputFormat};

/// Kube Advisor CLI
#[derive(Parser)]
#[command(name = "kube-advisor")]
#[command(author, version, about = "Audit Kubernetes workloads for missing resource requests and limits", long_about = None)]
pub struct Cli {
    /// Read credentials from the kubeconfig file instead of the in-cluster service account
    #[arg(long, global = true)]
    pub use_kubeconfig: bool,

    /// Path to kubeconfig file (used with --use-kubeconfig)
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<String>,

    /// Only audit workloads in this namespace
    #[arg(long, short, global = true)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log output format (logs go to stderr)
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Configuration file (defaults to ~/.config/kube-advisor/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Audit workloads for missing resource requests and limits
    Audit {
        /// Workload kind to audit (repeatable, defaults to all kinds)
        #[arg(long = "kind", short = 'k')]
        kinds: Vec<KindArg>,

        /// Audit a `kubectl get -o json` document instead of a live cluster
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Skip usage collection from metrics.k8s.io
        #[arg(long)]
        no_metrics: bool,
    },

    /// Show current CPU and memory usage per node
    Nodes,

    /// Show remediation guidance for each issue
    Remediation,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Workload kind as accepted on the command line and in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Pod,
    Deployment,
    #[value(name = "daemonset")]
    DaemonSet,
    #[value(name = "statefulset")]
    StatefulSet,
}

impl From<KindArg> for WorkloadKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Pod => WorkloadKind::Pod,
            KindArg::Deployment => WorkloadKind::Deployment,
            KindArg::DaemonSet => WorkloadKind::DaemonSet,
            KindArg::StatefulSet => WorkloadKind::StatefulSet,
        }
    }
}

/// Effective settings after merging the config file, environment and flags
#[derive(Debug, Clone)]
pub struct Settings {
    pub namespace: Option<String>,
    pub format: OutputFormat,
    pub use_kubeconfig: bool,
    pub kubeconfig: Option<String>,
    pub metrics: bool,
    pub kinds: Vec<WorkloadKind>,
}

impl Settings {
    /// Flags win over configuration values
    fn resolve(cli: &Cli, config: AdvisorConfig) -> Result<Self> {
        let format = match (cli.format, config.format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(value)) => OutputFormat::from_str(value, true)
                .map_err(|_| anyhow!("Invalid output format '{}' in configuration", value))?,
            (None, None) => OutputFormat::default(),
        };

        let kinds = if config.kinds.is_empty() {
            WorkloadKind::ALL.to_vec()
        } else {
            config
                .kinds
                .iter()
                .map(|value| {
                    KindArg::from_str(value, true)
                        .map(WorkloadKind::from)
                        .map_err(|_| anyhow!("Invalid workload kind '{}' in configuration", value))
                })
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            namespace: cli.namespace.clone().or(config.namespace),
            format,
            use_kubeconfig: cli.use_kubeconfig || config.use_kubeconfig,
            kubeconfig: cli.kubeconfig.clone(),
            metrics: config.metrics.unwrap_or(true),
            kinds,
        })
    }
}

fn init_tracing(verbose: bool, log_format: LogFormat) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (text, json) = match log_format {
        LogFormat::Text => (Some(fmt::layer().with_writer(std::io::stderr)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(std::io::stderr))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AdvisorConfig::load_from(path)?,
        None => AdvisorConfig::load()?,
    };
    let settings = Settings::resolve(&cli, config)?;

    match cli.command {
        Commands::Audit {
            kinds,
            manifest,
            no_metrics,
        } => {
            let options = audit::AuditOptions {
                kinds: if kinds.is_empty() {
                    settings.kinds.clone()
                } else {
                    kinds.into_iter().map(WorkloadKind::from).collect()
                },
                manifest,
                metrics: settings.metrics && !no_metrics,
            };
            audit::run_audit(&settings, &options).await
        }
        Commands::Nodes => nodes::show_nodes(&settings).await,
        Commands::Remediation => remediation::show_remediation(settings.format),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let cause = format!("{e:#}");
            error!(error = %cause, "Command failed");
            print_error(&cause);
            ExitCode::FAILURE
        }
    }
}
