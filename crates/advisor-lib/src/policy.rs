//! Resource policy evaluation
//!
//! Every container must declare a non-zero CPU limit, memory limit, CPU request
//! and memory request. The set of checks is closed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::models::ContainerSpec;

/// A single resource declaration requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    CpuLimitMissing,
    MemoryLimitMissing,
    CpuRequestMissing,
    MemoryRequestMissing,
}

/// Violated checks for one container, in declaration order
pub type CheckSet = BTreeSet<Check>;

impl Check {
    pub const ALL: [Check; 4] = [
        Check::CpuLimitMissing,
        Check::MemoryLimitMissing,
        Check::CpuRequestMissing,
        Check::MemoryRequestMissing,
    ];

    /// Quantity the check inspects
    fn declared(self, container: &ContainerSpec) -> u64 {
        match self {
            Check::CpuLimitMissing => container.cpu_limit_millicores,
            Check::MemoryLimitMissing => container.memory_limit_bytes,
            Check::CpuRequestMissing => container.cpu_request_millicores,
            Check::MemoryRequestMissing => container.memory_request_bytes,
        }
    }

    /// Zero and absent are the same thing here
    pub fn is_violated_by(self, container: &ContainerSpec) -> bool {
        self.declared(container) == 0
    }

    /// Path of the container field the check refers to
    pub fn field_path(self) -> &'static str {
        match self {
            Check::CpuLimitMissing => "resources.limits.cpu",
            Check::MemoryLimitMissing => "resources.limits.memory",
            Check::CpuRequestMissing => "resources.requests.cpu",
            Check::MemoryRequestMissing => "resources.requests.memory",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Check::CpuLimitMissing => "CPU Limit Missing",
            Check::MemoryLimitMissing => "Memory Limit Missing",
            Check::CpuRequestMissing => "CPU Request Missing",
            Check::MemoryRequestMissing => "Memory Request Missing",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Evaluate one container and return the checks it violates.
///
/// An empty set means the container is fully compliant.
pub fn evaluate(container: &ContainerSpec) -> CheckSet {
    Check::ALL
        .into_iter()
        .filter(|check| check.is_violated_by(container))
        .collect()
}
