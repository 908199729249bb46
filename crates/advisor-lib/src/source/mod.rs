//! Workload and metrics sources
//!
//! Sources return complete, already materialized collections or fail the
//! whole listing. Kubernetes objects are converted by [`convert`]; the
//! offline [`ManifestSource`] reads `kubectl get -o json` output.

pub mod convert;
mod manifest;


pub use manifest::ManifestSource;

use crate::models::{NodeUsage, UsageSample, WorkloadKind, WorkloadRecord};
use anyhow::Result;

pub use async_trait::async_trait;

/// Trait for workload listing implementations
#[async_trait]
pub trait WorkloadSource: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// List every workload of the given kind
    async fn list(&self, kind: WorkloadKind) -> Result<Vec<WorkloadRecord>>;
}

/// Trait for usage metrics implementations
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Current usage per pod
    async fn list(&self) -> Result<Vec<UsageSample>>;

    /// Current usage per node
    async fn list_nodes(&self) -> Result<Vec<NodeUsage>>;
}
