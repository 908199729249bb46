//! Report assembly
//!
//! Flattens aggregated findings into one row per violated check and pairs them
//! with the complete remediation table. Rows are sorted by workload identity,
//! then container name, then check, so output is stable across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregatedReports;
use crate::models::{NodeUsage, UsageSnapshot, WorkloadKind};
use crate::policy::Check;
use crate::remediation::RemediationTable;

/// One violated check of one container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRow {
    pub namespace: String,
    pub workload: String,
    pub kind: WorkloadKind,
    pub container: String,
    pub check: Check,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSnapshot>,
}

impl IssueRow {
    fn sort_key(&self) -> (&str, &str, WorkloadKind, &str, Check) {
        (
            self.namespace.as_str(),
            self.workload.as_str(),
            self.kind,
            self.container.as_str(),
            self.check,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationRow {
    pub check: Check,
    pub issue: String,
    pub remediation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeUsageRow {
    pub node: String,
    pub usage: UsageSnapshot,
}

/// Tabular report handed to the renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub generated_at: DateTime<Utc>,
    pub issues: Vec<IssueRow>,
    pub remediation: Vec<RemediationRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeUsageRow>,
}

impl ReportDocument {
    /// Attach node usage rows, sorted by node name
    pub fn with_node_usage(mut self, nodes: Vec<NodeUsage>) -> Self {
        let mut rows: Vec<NodeUsageRow> = nodes
            .into_iter()
            .map(|n| NodeUsageRow {
                node: n.node_name,
                usage: n.usage,
            })
            .collect();
        rows.sort_by(|a, b| a.node.cmp(&b.node));
        self.nodes = rows;
        self
    }

    pub fn is_compliant(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of distinct workloads with at least one issue
    pub fn affected_workloads(&self) -> usize {
        let mut count = 0;
        let mut previous: Option<(&str, &str, WorkloadKind)> = None;
        for row in &self.issues {
            let key = (row.namespace.as_str(), row.workload.as_str(), row.kind);
            if previous != Some(key) {
                count += 1;
                previous = Some(key);
            }
        }
        count
    }
}

/// Build the report document from aggregated reports.
///
/// A finding with N violated checks expands into N issue rows. The remediation
/// section always lists every check, whether or not it fired.
pub fn assemble(reports: AggregatedReports, remediation: &RemediationTable) -> ReportDocument {
    let mut issues: Vec<IssueRow> = reports
        .into_values()
        .flat_map(|report| report.into_findings())
        .flat_map(|finding| {
            finding
                .violated_checks
                .iter()
                .map(|check| IssueRow {
                    namespace: finding.workload.namespace.clone(),
                    workload: finding.workload.name.clone(),
                    kind: finding.workload.kind,
                    container: finding.container_name.clone(),
                    check: *check,
                    usage: finding.usage,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    issues.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let remediation = remediation
        .iter()
        .map(|(check, text)| RemediationRow {
            check,
            issue: check.label().to_string(),
            remediation: text.to_string(),
        })
        .collect();

    ReportDocument {
        generated_at: Utc::now(),
        issues,
        remediation,
        nodes: Vec::new(),
    }
}
