//! Resource declaration audit engine
//!
//! This crate provides the core functionality for:
//! - Evaluating containers against the fixed resource policy
//! - Grouping findings by owning workload
//! - Annotating findings with live usage samples
//! - Assembling the issue and remediation report
//! - Reading workloads from Kubernetes objects and offline manifests

pub mod aggregate;
pub mod enrich;
pub mod error;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod policy;
pub mod quantity;
pub mod remediation;
pub mod report;
pub mod source;

pub use aggregate::{aggregate, AggregatedReports, Finding, WorkloadReport};
pub use enrich::{build_usage_index, enrich, enrich_reports, UsageIndex};
pub use error::AdvisorError;
pub use models::*;
pub use observability::AuditLogger;
pub use pipeline::Advisor;
pub use policy::{evaluate, Check, CheckSet};
pub use remediation::RemediationTable;
pub use report::{assemble, IssueRow, NodeUsageRow, RemediationRow, ReportDocument};
pub use source::{ManifestSource, MetricsSource, WorkloadSource};
