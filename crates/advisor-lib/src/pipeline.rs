//! End-to-end audit pipeline
//!
//! Listing, evaluation, aggregation, enrichment and assembly run one after
//! another. Any collaborator failure aborts the run without partial results.

use std::collections::{HashMap, HashSet};

use crate::aggregate::aggregate;
use crate::enrich::{build_usage_index, enrich_reports};
use crate::error::AdvisorError;
use crate::models::{NodeUsage, WorkloadIdentity, WorkloadKind, WorkloadRecord};
use crate::observability::AuditLogger;
use crate::remediation::RemediationTable;
use crate::report::{assemble, ReportDocument};
use crate::source::{MetricsSource, WorkloadSource};

/// Runs audits against a fixed remediation table
#[derive(Debug, Clone)]
pub struct Advisor {
    remediation: RemediationTable,
}

impl Advisor {
    pub fn new(remediation: RemediationTable) -> Self {
        Self { remediation }
    }

    pub fn remediation(&self) -> &RemediationTable {
        &self.remediation
    }

    /// Audit every workload of the requested kinds.
    ///
    /// Pods whose controller was listed in the same run are reported through
    /// that controller only; a pod whose controller is missing from the source
    /// is evaluated on its own. When a metrics source is given, pods are
    /// listed even if not requested so their usage can be rolled up to
    /// controllers.
    pub async fn run(
        &self,
        workloads: &dyn WorkloadSource,
        metrics: Option<&dyn MetricsSource>,
        kinds: &[WorkloadKind],
    ) -> Result<ReportDocument, AdvisorError> {
        let logger = AuditLogger::new(workloads.name());

        let mut requested: Vec<WorkloadKind> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !requested.contains(kind) {
                requested.push(*kind);
            }
        }
        logger.log_run_started(&requested, metrics.is_some());

        let audit_pods = requested.contains(&WorkloadKind::Pod);
        let mut to_list = requested.clone();
        if metrics.is_some() && !audit_pods {
            to_list.push(WorkloadKind::Pod);
        }

        let mut records: Vec<WorkloadRecord> = Vec::new();
        let mut pods: Vec<WorkloadRecord> = Vec::new();

        for kind in to_list {
            let listed = workloads.list(kind).await.map_err(|e| {
                logger.log_source_failure(workloads.name(), &e);
                AdvisorError::source_unavailable(workloads.name(), &e)
            })?;
            logger.log_source_listed(kind, listed.len());

            if kind == WorkloadKind::Pod {
                pods = listed;
            } else {
                records.extend(listed);
            }
        }

        // A pod is covered only by a controller record that was actually listed
        let listed_controllers: HashSet<WorkloadIdentity> =
            records.iter().map(|r| r.identity.clone()).collect();
        let mut controllers: HashMap<WorkloadIdentity, WorkloadIdentity> = HashMap::new();

        for pod in pods {
            if let Some(controller) = &pod.controller {
                controllers.insert(pod.identity.clone(), controller.clone());
                if listed_controllers.contains(controller) {
                    logger.log_pod_covered(&pod.identity.name, &controller.to_string());
                    continue;
                }
            }
            if audit_pods {
                records.push(pod);
            }
        }

        let audited = records.len();
        let mut reports = aggregate(records)?;
        for finding in reports.values().flat_map(|r| r.findings()) {
            logger.log_finding(finding);
        }

        let mut nodes: Vec<NodeUsage> = Vec::new();
        if let Some(metrics) = metrics {
            let unavailable = |e: anyhow::Error| {
                logger.log_source_failure(metrics.name(), &e);
                AdvisorError::source_unavailable(metrics.name(), &e)
            };
            let samples = metrics.list().await.map_err(unavailable)?;
            nodes = metrics.list_nodes().await.map_err(unavailable)?;
            logger.log_usage_collected(samples.len(), nodes.len());

            let usage = build_usage_index(&samples, &controllers);
            reports = enrich_reports(reports, &usage);
        }

        let document = assemble(reports, &self.remediation).with_node_usage(nodes);
        logger.log_run_completed(audited, document.affected_workloads(), document.issues.len());
        Ok(document)
    }
}
