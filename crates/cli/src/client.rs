//! Kubernetes API client for workload and usage collection

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, Resource};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt::Debug;
use tracing::{debug, info};

use advisor_lib::quantity::{parse_cpu_quantity, parse_memory_quantity};
use advisor_lib::source::convert::{
    daemon_set_record, deployment_record, pod_record, stateful_set_record, DEFAULT_NAMESPACE,
};
use advisor_lib::{
    MetricsSource, NodeUsage, UsageSample, UsageSnapshot, WorkloadIdentity, WorkloadKind,
    WorkloadRecord, WorkloadSource,
};

use crate::config::kubeconfig_path;

const METRICS_API: &str = "/apis/metrics.k8s.io/v1beta1";

/// Create a Kubernetes client.
///
/// With `use_kubeconfig` the kubeconfig file is read; otherwise the pod's
/// service account credentials are used.
pub async fn connect(use_kubeconfig: bool, kubeconfig: Option<&str>) -> Result<Client> {
    let config = if use_kubeconfig {
        let path = kubeconfig_path(kubeconfig)?;
        info!(path = %path.display(), "Using kubeconfig file");
        let kubeconfig = Kubeconfig::read_from(&path)
            .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
        Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context("Invalid kubeconfig")?
    } else {
        debug!("Using in-cluster service account configuration");
        Config::incluster().context(
            "Failed to load in-cluster configuration (use --use-kubeconfig outside a cluster)",
        )?
    };

    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Workload source backed by the Kubernetes API
pub struct KubeWorkloadSource {
    client: Client,
    namespace: Option<String>,
}

impl KubeWorkloadSource {
    pub fn new(client: Client, namespace: Option<String>) -> Self {
        Self { client, namespace }
    }

    async fn list_objects<K>(&self) -> Result<Vec<K>>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = match &self.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }
}

#[async_trait]
impl WorkloadSource for KubeWorkloadSource {
    fn name(&self) -> &str {
        "cluster"
    }

    async fn list(&self, kind: WorkloadKind) -> Result<Vec<WorkloadRecord>> {
        let records: Vec<WorkloadRecord> = match kind {
            WorkloadKind::Pod => self
                .list_objects::<Pod>()
                .await
                .context("Failed to list pods")?
                .iter()
                .map(pod_record)
                .collect(),
            WorkloadKind::Deployment => self
                .list_objects::<Deployment>()
                .await
                .context("Failed to list deployments")?
                .iter()
                .map(deployment_record)
                .collect(),
            WorkloadKind::DaemonSet => self
                .list_objects::<DaemonSet>()
                .await
                .context("Failed to list daemon sets")?
                .iter()
                .map(daemon_set_record)
                .collect(),
            WorkloadKind::StatefulSet => self
                .list_objects::<StatefulSet>()
                .await
                .context("Failed to list stateful sets")?
                .iter()
                .map(stateful_set_record)
                .collect(),
        };
        Ok(records)
    }
}

/// Usage source backed by the metrics.k8s.io API
///
/// The metrics API is an aggregated API without generated types, so responses
/// are fetched with raw requests.
pub struct KubeMetricsSource {
    client: Client,
    namespace: Option<String>,
}

impl KubeMetricsSource {
    pub fn new(client: Client, namespace: Option<String>) -> Self {
        Self { client, namespace }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = http::Request::builder()
            .method("GET")
            .uri(path)
            .body(Vec::new())
            .context("Failed to build metrics request")?;

        self.client
            .request::<T>(request)
            .await
            .with_context(|| format!("Metrics API request failed: {}", path))
    }

    /// Check if metrics-server is available
    pub async fn is_available(&self) -> bool {
        self.get::<serde_json::Value>(METRICS_API).await.is_ok()
    }
}

#[async_trait]
impl MetricsSource for KubeMetricsSource {
    fn name(&self) -> &str {
        "metrics-server"
    }

    async fn list(&self) -> Result<Vec<UsageSample>> {
        let path = match &self.namespace {
            Some(ns) => format!("{}/namespaces/{}/pods", METRICS_API, ns),
            None => format!("{}/pods", METRICS_API),
        };
        let list: PodMetricsList = self.get(&path).await?;

        Ok(list
            .items
            .into_iter()
            .map(|pm| {
                let mut usage = UsageSnapshot::default();
                for container in &pm.containers {
                    usage += container.usage.snapshot();
                }
                UsageSample {
                    identity: WorkloadIdentity::new(
                        WorkloadKind::Pod,
                        pm.metadata
                            .namespace
                            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
                        pm.metadata.name,
                    ),
                    usage,
                }
            })
            .collect())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeUsage>> {
        let list: NodeMetricsList = self.get(&format!("{}/nodes", METRICS_API)).await?;

        Ok(list
            .items
            .into_iter()
            .map(|nm| NodeUsage {
                node_name: nm.metadata.name,
                usage: nm.usage.snapshot(),
            })
            .collect())
    }
}

// Response types for the metrics API

#[derive(Debug, Deserialize)]
struct PodMetricsList {
    items: Vec<PodMetricsItem>,
}

#[derive(Debug, Deserialize)]
struct PodMetricsItem {
    metadata: MetricsMetadata,
    #[serde(default)]
    containers: Vec<ContainerMetricsItem>,
}

#[derive(Debug, Deserialize)]
struct NodeMetricsList {
    items: Vec<NodeMetricsItem>,
}

#[derive(Debug, Deserialize)]
struct NodeMetricsItem {
    metadata: MetricsMetadata,
    usage: ResourceUsage,
}

#[derive(Debug, Deserialize)]
struct MetricsMetadata {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContainerMetricsItem {
    usage: ResourceUsage,
}

#[derive(Debug, Deserialize)]
struct ResourceUsage {
    #[serde(default)]
    cpu: String,
    #[serde(default)]
    memory: String,
}

impl ResourceUsage {
    fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot::new(
            parse_cpu_quantity(&self.cpu).unwrap_or(0),
            parse_memory_quantity(&self.memory).unwrap_or(0),
        )
    }
}
