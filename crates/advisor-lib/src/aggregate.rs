//! Grouping of per-container findings by owning workload

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::error::AdvisorError;
use crate::models::{ContainerSpec, UsageSnapshot, WorkloadIdentity, WorkloadRecord};
use crate::policy::{evaluate, CheckSet};

/// Violations recorded for one container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub container_name: String,
    pub workload: WorkloadIdentity,
    /// Never empty
    pub violated_checks: CheckSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSnapshot>,
}

impl Finding {
    /// Evaluate a container; compliant containers produce no finding
    pub fn from_container(workload: &WorkloadIdentity, container: &ContainerSpec) -> Option<Self> {
        let violated_checks = evaluate(container);
        if violated_checks.is_empty() {
            return None;
        }

        Some(Self {
            container_name: container.name.clone(),
            workload: workload.clone(),
            violated_checks,
            usage: None,
        })
    }
}

/// All findings of one workload, in container source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadReport {
    workload: WorkloadIdentity,
    findings: Vec<Finding>,
}

impl WorkloadReport {
    fn new(first: Finding) -> Self {
        Self {
            workload: first.workload.clone(),
            findings: vec![first],
        }
    }

    fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn workload(&self) -> &WorkloadIdentity {
        &self.workload
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    /// Rebuild a report from previously aggregated findings
    pub(crate) fn from_findings(workload: WorkloadIdentity, findings: Vec<Finding>) -> Option<Self> {
        if findings.is_empty() {
            None
        } else {
            Some(Self { workload, findings })
        }
    }
}

/// Reports keyed by workload; iteration order is unspecified
pub type AggregatedReports = HashMap<WorkloadIdentity, WorkloadReport>;

/// Evaluate every container of every workload and group the findings.
///
/// Workloads and containers are processed in source order. A workload without
/// any violating container gets no report. Supplying the same identity twice
/// is rejected rather than merged.
pub fn aggregate<I>(workloads: I) -> Result<AggregatedReports, AdvisorError>
where
    I: IntoIterator<Item = WorkloadRecord>,
{
    let mut seen = HashSet::new();
    let mut reports = AggregatedReports::new();

    for record in workloads {
        if !seen.insert(record.identity.clone()) {
            return Err(AdvisorError::IdentityCollision(record.identity));
        }

        for container in &record.containers {
            let Some(finding) = Finding::from_container(&record.identity, container) else {
                continue;
            };

            match reports.entry(record.identity.clone()) {
                Entry::Occupied(entry) => entry.into_mut().push(finding),
                Entry::Vacant(entry) => {
                    entry.insert(WorkloadReport::new(finding));
                }
            }
        }
    }

    Ok(reports)
}
