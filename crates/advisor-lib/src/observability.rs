//! Structured logging for audit runs
//!
//! Every event carries an `event` field and the name of the workload source so
//! JSON log output can be filtered per run.

use tracing::{debug, info, warn};

use crate::aggregate::Finding;
use crate::models::WorkloadKind;

/// Structured logger for audit lifecycle events
#[derive(Debug, Clone)]
pub struct AuditLogger {
    source: String,
}

impl AuditLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Log the start of an audit run
    pub fn log_run_started(&self, kinds: &[WorkloadKind], metrics_enabled: bool) {
        let kinds = kinds
            .iter()
            .map(WorkloadKind::as_str)
            .collect::<Vec<_>>()
            .join(",");
        info!(
            event = "audit_started",
            source = %self.source,
            kinds = %kinds,
            metrics_enabled = metrics_enabled,
            "Starting resource audit"
        );
    }

    /// Log a completed listing of one workload kind
    pub fn log_source_listed(&self, kind: WorkloadKind, count: usize) {
        debug!(
            event = "workloads_listed",
            source = %self.source,
            kind = %kind,
            count = count,
            "Listed workloads"
        );
    }

    /// Log a pod skipped because its controller is audited instead
    pub fn log_pod_covered(&self, pod: &str, controller: &str) {
        debug!(
            event = "pod_covered_by_controller",
            source = %self.source,
            pod = %pod,
            controller = %controller,
            "Skipping pod managed by an audited controller"
        );
    }

    /// Log a single finding
    pub fn log_finding(&self, finding: &Finding) {
        let checks = finding
            .violated_checks
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ");
        debug!(
            event = "finding_recorded",
            source = %self.source,
            workload = %finding.workload,
            container = %finding.container_name,
            checks = %checks,
            "Container is missing resource declarations"
        );
    }

    /// Log the usage samples collected for enrichment
    pub fn log_usage_collected(&self, pod_samples: usize, nodes: usize) {
        debug!(
            event = "usage_collected",
            source = %self.source,
            pod_samples = pod_samples,
            nodes = nodes,
            "Collected usage samples"
        );
    }

    /// Log a collaborator failure that aborts the run
    pub fn log_source_failure(&self, collaborator: &str, error: &anyhow::Error) {
        warn!(
            event = "source_unavailable",
            source = %self.source,
            collaborator = %collaborator,
            error = %format!("{error:#}"),
            "Audit aborted, collection could not be obtained"
        );
    }

    /// Log the end of an audit run
    pub fn log_run_completed(&self, workloads: usize, affected: usize, issues: usize) {
        if issues == 0 {
            info!(
                event = "audit_completed",
                source = %self.source,
                workloads = workloads,
                affected_workloads = 0,
                issues = 0,
                "All audited containers declare requests and limits"
            );
        } else {
            info!(
                event = "audit_completed",
                source = %self.source,
                workloads = workloads,
                affected_workloads = affected,
                issues = issues,
                "Resource audit found missing declarations"
            );
        }
    }
}
