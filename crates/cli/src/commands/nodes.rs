//! Node usage command

use anyhow::{Context, Result};
use serde::Serialize;
use tabled::Tabled;

use advisor_lib::{MetricsSource, NodeUsageRow, UsageSnapshot};

use crate::client::{connect, KubeMetricsSource};
use crate::output::{format_bytes, format_cpu, print_table, OutputFormat};
use crate::Settings;

/// Row for the node usage table
#[derive(Tabled, Serialize)]
pub struct NodeTableRow {
    #[tabled(rename = "Node")]
    pub node: String,
    #[tabled(rename = "Node CPU Usage")]
    pub cpu: String,
    #[tabled(rename = "Node Memory Usage")]
    pub memory: String,
}

impl NodeTableRow {
    fn new(node: &str, usage: UsageSnapshot) -> Self {
        Self {
            node: node.to_string(),
            cpu: format_cpu(usage.cpu_millicores),
            memory: format_bytes(usage.memory_bytes),
        }
    }
}

impl From<&NodeUsageRow> for NodeTableRow {
    fn from(row: &NodeUsageRow) -> Self {
        Self::new(&row.node, row.usage)
    }
}

/// Show current CPU and memory usage per node
pub async fn show_nodes(settings: &Settings) -> Result<()> {
    let client = connect(settings.use_kubeconfig, settings.kubeconfig.as_deref()).await?;
    let metrics = KubeMetricsSource::new(client, None);

    let mut nodes = metrics
        .list_nodes()
        .await
        .context("Failed to read node metrics (is metrics-server installed?)")?;
    nodes.sort_by(|a, b| a.node_name.cmp(&b.node_name));

    let rows: Vec<NodeTableRow> = nodes
        .iter()
        .map(|n| NodeTableRow::new(&n.node_name, n.usage))
        .collect();

    print_table(&rows, settings.format)
}
