//! Error taxonomy for the audit engine

use std::path::PathBuf;
use thiserror::Error;

use crate::models::WorkloadIdentity;
use crate::policy::Check;

/// Failures surfaced by the audit pipeline.
///
/// The caller decides how to report them and whether they are fatal.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// A workload or metrics collection could not be obtained
    #[error("{collaborator} unavailable: {reason}")]
    SourceUnavailable { collaborator: String, reason: String },

    /// Two workload records share the same identity within one run
    #[error("workload identity collision: {0} was supplied more than once")]
    IdentityCollision(WorkloadIdentity),

    /// The remediation table lacks guidance for one or more checks
    #[error("remediation table has no entry for: {}", join_checks(.0))]
    PolicyTableIncomplete(Vec<Check>),

    /// The remediation table names a check twice
    #[error("remediation table lists '{0}' more than once")]
    DuplicateRemediation(Check),

    /// An offline manifest could not be read or decoded
    #[error("failed to load manifest {}: {reason}", .path.display())]
    Manifest { path: PathBuf, reason: String },
}

impl AdvisorError {
    pub fn source_unavailable(collaborator: impl Into<String>, cause: &anyhow::Error) -> Self {
        Self::SourceUnavailable {
            collaborator: collaborator.into(),
            reason: format!("{cause:#}"),
        }
    }
}

fn join_checks(checks: &[Check]) -> String {
    checks
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkloadKind;
    use anyhow::Context;

    #[test]
    fn test_source_unavailable_keeps_cause_chain() {
        let cause = Err::<(), _>(anyhow::anyhow!("connection refused"))
            .context("Failed to list pods")
            .unwrap_err();
        let err = AdvisorError::source_unavailable("cluster", &cause);
        assert_eq!(
            err.to_string(),
            "cluster unavailable: Failed to list pods: connection refused"
        );
    }

    #[test]
    fn test_messages() {
        let id = WorkloadIdentity::new(WorkloadKind::Deployment, "default", "web");
        assert!(AdvisorError::IdentityCollision(id)
            .to_string()
            .contains("Deployment default/web"));

        let err = AdvisorError::PolicyTableIncomplete(vec![
            Check::CpuLimitMissing,
            Check::MemoryRequestMissing,
        ]);
        assert_eq!(
            err.to_string(),
            "remediation table has no entry for: CPU Limit Missing, Memory Request Missing"
        );
    }
}
