//! Core data models for the resource advisor

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Kind of object that owns a set of containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkloadKind {
    Pod,
    Deployment,
    DaemonSet,
    StatefulSet,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 4] = [
        WorkloadKind::Pod,
        WorkloadKind::Deployment,
        WorkloadKind::DaemonSet,
        WorkloadKind::StatefulSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Pod => "Pod",
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::DaemonSet => "DaemonSet",
            WorkloadKind::StatefulSet => "StatefulSet",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a workload instance, used as the aggregation key
///
/// Field order drives the derived ordering: namespace, then name, then kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkloadIdentity {
    pub namespace: String,
    pub name: String,
    pub kind: WorkloadKind,
}

impl WorkloadIdentity {
    pub fn new(kind: WorkloadKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Declared resource quantities of a single container
///
/// A quantity of zero means the field is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub cpu_limit_millicores: u64,
    pub memory_limit_bytes: u64,
    pub cpu_request_millicores: u64,
    pub memory_request_bytes: u64,
}

impl ContainerSpec {
    /// Container with no resource declarations at all
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_limits(mut self, cpu_millicores: u64, memory_bytes: u64) -> Self {
        self.cpu_limit_millicores = cpu_millicores;
        self.memory_limit_bytes = memory_bytes;
        self
    }

    pub fn with_requests(mut self, cpu_millicores: u64, memory_bytes: u64) -> Self {
        self.cpu_request_millicores = cpu_millicores;
        self.memory_request_bytes = memory_bytes;
        self
    }
}

/// One workload as supplied by a workload source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadRecord {
    pub identity: WorkloadIdentity,
    pub containers: Vec<ContainerSpec>,
    /// Controller that manages this workload (pods only)
    pub controller: Option<WorkloadIdentity>,
}

impl WorkloadRecord {
    pub fn new(identity: WorkloadIdentity, containers: Vec<ContainerSpec>) -> Self {
        Self {
            identity,
            containers,
            controller: None,
        }
    }

    pub fn with_controller(mut self, controller: WorkloadIdentity) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn identity(&self) -> &WorkloadIdentity {
        &self.identity
    }

    pub fn containers(&self) -> &[ContainerSpec] {
        &self.containers
    }
}

/// Point-in-time CPU and memory usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
}

impl UsageSnapshot {
    pub fn new(cpu_millicores: u64, memory_bytes: u64) -> Self {
        Self {
            cpu_millicores,
            memory_bytes,
        }
    }
}

impl AddAssign for UsageSnapshot {
    fn add_assign(&mut self, other: Self) {
        self.cpu_millicores = self.cpu_millicores.saturating_add(other.cpu_millicores);
        self.memory_bytes = self.memory_bytes.saturating_add(other.memory_bytes);
    }
}

/// Usage sample for a single workload from a metrics source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSample {
    pub identity: WorkloadIdentity,
    pub usage: UsageSnapshot,
}

/// Usage sample for a cluster node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeUsage {
    pub node_name: String,
    pub usage: UsageSnapshot,
}
