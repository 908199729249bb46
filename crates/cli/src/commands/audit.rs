//! Resource declaration audit command

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;
use tracing::{info, warn};

use advisor_lib::{
    Advisor, ManifestSource, MetricsSource, RemediationTable, ReportDocument, WorkloadKind,
};

use super::nodes::NodeTableRow;
use super::remediation::RemediationTableRow;
use crate::client::{connect, KubeMetricsSource, KubeWorkloadSource};
use crate::output::{format_usage, print_heading, print_success, print_table, print_warning, OutputFormat};
use crate::Settings;

/// Row for the issues table
#[derive(Tabled, Serialize)]
struct IssueTableRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Workload")]
    workload: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "CPU/Memory")]
    usage: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Issue")]
    issue: String,
}

/// What to audit
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub kinds: Vec<WorkloadKind>,
    pub manifest: Option<PathBuf>,
    pub metrics: bool,
}

/// Audit workloads for missing resource requests and limits
pub async fn run_audit(settings: &Settings, options: &AuditOptions) -> Result<()> {
    // Fails at startup if the guidance table does not cover every check
    let advisor = Advisor::new(RemediationTable::standard()?);

    let document = match &options.manifest {
        Some(path) => {
            let source = ManifestSource::from_path(path, settings.namespace.as_deref())?;
            if options.metrics {
                info!("Usage metrics are not collected for offline manifests");
            }
            advisor.run(&source, None, &options.kinds).await?
        }
        None => {
            let client = connect(settings.use_kubeconfig, settings.kubeconfig.as_deref()).await?;
            let source = KubeWorkloadSource::new(client.clone(), settings.namespace.clone());

            let metrics = if options.metrics {
                let metrics = KubeMetricsSource::new(client, settings.namespace.clone());
                if metrics.is_available().await {
                    Some(metrics)
                } else {
                    warn!("metrics.k8s.io is not available, continuing without usage data");
                    print_warning("Metrics server not available, usage columns will be empty");
                    None
                }
            } else {
                None
            };

            advisor
                .run(
                    &source,
                    metrics.as_ref().map(|m| m as &dyn MetricsSource),
                    &options.kinds,
                )
                .await?
        }
    };

    render(&document, settings.format)
}

/// Print the report document
pub fn render(document: &ReportDocument, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(document)?);
        return Ok(());
    }

    if document.is_compliant() {
        print_success("All audited containers declare CPU and memory requests and limits");
    } else {
        let rows: Vec<IssueTableRow> = document
            .issues
            .iter()
            .map(|row| IssueTableRow {
                namespace: row.namespace.clone(),
                workload: row.workload.clone(),
                kind: row.kind.to_string(),
                usage: format_usage(row.usage),
                container: row.container.clone(),
                issue: row.check.label().red().to_string(),
            })
            .collect();

        print_heading("Resource Issues");
        print_table(&rows, OutputFormat::Table)?;
        println!(
            "\nTotal: {} issues across {} workloads",
            document.issues.len(),
            document.affected_workloads()
        );
    }

    if !document.nodes.is_empty() {
        let rows: Vec<NodeTableRow> = document.nodes.iter().map(NodeTableRow::from).collect();
        println!();
        print_heading("Node Usage");
        print_table(&rows, OutputFormat::Table)?;
    }

    let rows: Vec<RemediationTableRow> = document
        .remediation
        .iter()
        .map(|row| RemediationTableRow {
            issue: row.issue.clone(),
            remediation: row.remediation.clone(),
        })
        .collect();
    println!();
    print_heading("Remediation");
    print_table(&rows, OutputFormat::Table)
}
