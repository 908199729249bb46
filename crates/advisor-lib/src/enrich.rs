//! Annotation of findings with live usage samples
//!
//! Usage never changes which checks a finding carries.

use std::collections::HashMap;

use crate::aggregate::{AggregatedReports, Finding, WorkloadReport};
use crate::models::{UsageSample, UsageSnapshot, WorkloadIdentity};

/// Usage keyed by workload identity
pub type UsageIndex = HashMap<WorkloadIdentity, UsageSnapshot>;

/// Index pod samples by identity and roll them up to their controllers.
///
/// `controllers` maps a pod identity to the controller that manages it; a
/// controller's usage is the sum over its sampled pods.
pub fn build_usage_index(
    samples: &[UsageSample],
    controllers: &HashMap<WorkloadIdentity, WorkloadIdentity>,
) -> UsageIndex {
    let mut index = UsageIndex::new();

    for sample in samples {
        index.insert(sample.identity.clone(), sample.usage);
        if let Some(controller) = controllers.get(&sample.identity) {
            *index.entry(controller.clone()).or_default() += sample.usage;
        }
    }

    index
}

/// Attach usage to every finding whose workload has a sample.
///
/// Findings without a matching sample pass through unchanged.
pub fn enrich(findings: Vec<Finding>, usage: &UsageIndex) -> Vec<Finding> {
    findings
        .into_iter()
        .map(|mut finding| {
            if let Some(snapshot) = usage.get(&finding.workload) {
                finding.usage = Some(*snapshot);
            }
            finding
        })
        .collect()
}

/// Same as [`enrich`], applied to aggregated reports
pub fn enrich_reports(reports: AggregatedReports, usage: &UsageIndex) -> AggregatedReports {
    reports
        .into_iter()
        .filter_map(|(identity, report)| {
            let findings = enrich(report.into_findings(), usage);
            WorkloadReport::from_findings(identity.clone(), findings).map(|r| (identity, r))
        })
        .collect()
}
