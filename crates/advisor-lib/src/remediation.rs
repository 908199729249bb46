//! Static remediation guidance, one entry per check

use std::collections::BTreeMap;

use crate::error::AdvisorError;
use crate::policy::Check;

/// Guidance shipped with the advisor
pub const DEFAULT_GUIDANCE: [(Check, &str); 4] = [
    (
        Check::CpuLimitMissing,
        "Set resources.limits.cpu so a busy container cannot starve its neighbours of CPU: \
         https://kubernetes.io/docs/concepts/configuration/manage-resources-containers/",
    ),
    (
        Check::MemoryLimitMissing,
        "Set resources.limits.memory so a leaking container is OOM-killed before the node is: \
         https://kubernetes.io/docs/concepts/configuration/manage-resources-containers/",
    ),
    (
        Check::CpuRequestMissing,
        "Set resources.requests.cpu so the scheduler reserves CPU for the container: \
         https://kubernetes.io/docs/concepts/configuration/manage-resources-containers/",
    ),
    (
        Check::MemoryRequestMissing,
        "Set resources.requests.memory so the scheduler reserves memory for the container: \
         https://kubernetes.io/docs/concepts/configuration/manage-resources-containers/",
    ),
];

/// Immutable mapping from check to advisory text
///
/// Construction fails unless every check has exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationTable {
    entries: BTreeMap<Check, String>,
}

impl RemediationTable {
    /// Build a table, rejecting missing or duplicated checks
    pub fn new<I, S>(entries: I) -> Result<Self, AdvisorError>
    where
        I: IntoIterator<Item = (Check, S)>,
        S: Into<String>,
    {
        let mut table = BTreeMap::new();
        for (check, text) in entries {
            if table.insert(check, text.into()).is_some() {
                return Err(AdvisorError::DuplicateRemediation(check));
            }
        }

        let missing: Vec<Check> = Check::ALL
            .into_iter()
            .filter(|check| !table.contains_key(check))
            .collect();
        if !missing.is_empty() {
            return Err(AdvisorError::PolicyTableIncomplete(missing));
        }

        Ok(Self { entries: table })
    }

    /// The built-in guidance table
    pub fn standard() -> Result<Self, AdvisorError> {
        Self::new(DEFAULT_GUIDANCE)
    }

    pub fn guidance(&self, check: Check) -> &str {
        // Every check is present once construction succeeds
        &self.entries[&check]
    }

    /// Entries in check order
    pub fn iter(&self) -> impl Iterator<Item = (Check, &str)> + '_ {
        self.entries.iter().map(|(check, text)| (*check, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
