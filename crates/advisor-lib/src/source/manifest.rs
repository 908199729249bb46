//! Offline workload source backed by `kubectl get -o json` output

use anyhow::Result;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::Pod;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use super::convert::{daemon_set_record, deployment_record, pod_record, stateful_set_record};
use super::{async_trait, WorkloadSource};
use crate::error::AdvisorError;
use crate::models::{WorkloadKind, WorkloadRecord};

/// Workload source reading a JSON manifest from disk
///
/// Accepts a `List` document (`items: [...]`) or a single object. Objects of
/// kinds other than Pod, Deployment, DaemonSet and StatefulSet are skipped.
#[derive(Debug)]
pub struct ManifestSource {
    records: Vec<WorkloadRecord>,
}

impl ManifestSource {
    /// Load a manifest file, keeping only objects in `namespace` when given
    pub fn from_path(path: impl AsRef<Path>, namespace: Option<&str>) -> Result<Self, AdvisorError> {
        let path = path.as_ref().to_path_buf();
        let manifest_error = |reason: String| AdvisorError::Manifest {
            path: path.clone(),
            reason,
        };

        let content = std::fs::read_to_string(&path).map_err(|e| manifest_error(e.to_string()))?;
        let document: Value =
            serde_json::from_str(&content).map_err(|e| manifest_error(e.to_string()))?;
        let records = Self::parse_document(document, namespace).map_err(manifest_error)?;

        info!(
            path = %path.display(),
            workloads = records.len(),
            "Loaded workload manifest"
        );
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn parse_document(
        document: Value,
        namespace: Option<&str>,
    ) -> std::result::Result<Vec<WorkloadRecord>, String> {
        let items = match document {
            Value::Object(mut map) if map.get("items").is_some_and(Value::is_array) => {
                match map.remove("items") {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                }
            }
            Value::Object(map) => vec![Value::Object(map)],
            Value::Array(items) => items,
            _ => return Err("expected a JSON object or list of objects".to_string()),
        };

        let mut records = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let kind = item
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            let record = match kind.as_str() {
                "Pod" => decode::<Pod>(item, index).map(|p| pod_record(&p))?,
                "Deployment" => decode::<Deployment>(item, index).map(|d| deployment_record(&d))?,
                "DaemonSet" => decode::<DaemonSet>(item, index).map(|d| daemon_set_record(&d))?,
                "StatefulSet" => {
                    decode::<StatefulSet>(item, index).map(|s| stateful_set_record(&s))?
                }
                other => {
                    debug!(index = index, kind = %other, "Skipping unsupported manifest item");
                    continue;
                }
            };

            if namespace.is_some_and(|ns| record.identity.namespace != ns) {
                continue;
            }
            records.push(record);
        }

        Ok(records)
    }
}

fn decode<T: DeserializeOwned>(item: Value, index: usize) -> std::result::Result<T, String> {
    serde_json::from_value(item).map_err(|e| format!("item {index}: {e}"))
}

#[async_trait]
impl WorkloadSource for ManifestSource {
    fn name(&self) -> &str {
        "manifest"
    }

    async fn list(&self, kind: WorkloadKind) -> Result<Vec<WorkloadRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.identity.kind == kind)
            .cloned()
            .collect())
    }
}
