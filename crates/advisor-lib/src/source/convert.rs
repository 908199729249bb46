//! Conversion from Kubernetes API objects to workload records

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Container, Pod, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::warn;

use crate::models::{ContainerSpec, WorkloadIdentity, WorkloadKind, WorkloadRecord};
use crate::quantity::{parse_cpu_quantity, parse_memory_quantity};

/// Label set on pods created from a Deployment's ReplicaSet
const POD_TEMPLATE_HASH_LABEL: &str = "pod-template-hash";

/// Namespace assumed for objects that do not carry one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Convert a container spec to declared quantities
pub fn container_spec(container: &Container) -> ContainerSpec {
    let resources = container.resources.as_ref();
    let limits = resources.and_then(|r| r.limits.as_ref());
    let requests = resources.and_then(|r| r.requests.as_ref());

    ContainerSpec {
        name: container.name.clone(),
        cpu_limit_millicores: declared(limits, "cpu", &container.name, parse_cpu_quantity),
        memory_limit_bytes: declared(limits, "memory", &container.name, parse_memory_quantity),
        cpu_request_millicores: declared(requests, "cpu", &container.name, parse_cpu_quantity),
        memory_request_bytes: declared(requests, "memory", &container.name, parse_memory_quantity),
    }
}

/// Read one quantity; absent or unparseable counts as unset
fn declared(
    quantities: Option<&BTreeMap<String, Quantity>>,
    resource: &str,
    container: &str,
    parse: fn(&str) -> Option<u64>,
) -> u64 {
    let Some(quantity) = quantities.and_then(|q| q.get(resource)) else {
        return 0;
    };

    match parse(&quantity.0) {
        Some(value) => value,
        None => {
            warn!(
                container = %container,
                resource = %resource,
                quantity = %quantity.0,
                "Unparseable resource quantity, treating as unset"
            );
            0
        }
    }
}

fn identity(kind: WorkloadKind, meta: &ObjectMeta) -> WorkloadIdentity {
    WorkloadIdentity::new(
        kind,
        meta.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE),
        meta.name.as_deref().unwrap_or_default(),
    )
}

fn template_containers(template: &PodTemplateSpec) -> Vec<ContainerSpec> {
    template
        .spec
        .as_ref()
        .map(|spec| spec.containers.iter().map(container_spec).collect())
        .unwrap_or_default()
}

/// Convert a pod, resolving its controlling workload
pub fn pod_record(pod: &Pod) -> WorkloadRecord {
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.iter().map(container_spec).collect())
        .unwrap_or_default();

    let record = WorkloadRecord::new(identity(WorkloadKind::Pod, &pod.metadata), containers);
    match resolve_controller(&pod.metadata) {
        Some(controller) => record.with_controller(controller),
        None => record,
    }
}

pub fn deployment_record(deployment: &Deployment) -> WorkloadRecord {
    let containers = deployment
        .spec
        .as_ref()
        .map(|spec| template_containers(&spec.template))
        .unwrap_or_default();
    WorkloadRecord::new(
        identity(WorkloadKind::Deployment, &deployment.metadata),
        containers,
    )
}

pub fn daemon_set_record(daemon_set: &DaemonSet) -> WorkloadRecord {
    let containers = daemon_set
        .spec
        .as_ref()
        .map(|spec| template_containers(&spec.template))
        .unwrap_or_default();
    WorkloadRecord::new(
        identity(WorkloadKind::DaemonSet, &daemon_set.metadata),
        containers,
    )
}

pub fn stateful_set_record(stateful_set: &StatefulSet) -> WorkloadRecord {
    let containers = stateful_set
        .spec
        .as_ref()
        .map(|spec| template_containers(&spec.template))
        .unwrap_or_default();
    WorkloadRecord::new(
        identity(WorkloadKind::StatefulSet, &stateful_set.metadata),
        containers,
    )
}

/// Resolve the workload that controls a pod.
///
/// ReplicaSet owners are mapped to their Deployment by stripping the
/// `-<pod-template-hash>` suffix. Other owner kinds (Jobs, bare ReplicaSets)
/// leave the pod unmanaged.
pub fn resolve_controller(meta: &ObjectMeta) -> Option<WorkloadIdentity> {
    let owner = meta
        .owner_references
        .as_ref()?
        .iter()
        .find(|owner| owner.controller == Some(true))?;
    let namespace = meta.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);

    match owner.kind.as_str() {
        "DaemonSet" => Some(WorkloadIdentity::new(
            WorkloadKind::DaemonSet,
            namespace,
            owner.name.as_str(),
        )),
        "StatefulSet" => Some(WorkloadIdentity::new(
            WorkloadKind::StatefulSet,
            namespace,
            owner.name.as_str(),
        )),
        "ReplicaSet" => {
            let hash = meta.labels.as_ref()?.get(POD_TEMPLATE_HASH_LABEL)?;
            let deployment = owner
                .name
                .strip_suffix(hash.as_str())?
                .strip_suffix('-')?;
            if deployment.is_empty() {
                return None;
            }
            Some(WorkloadIdentity::new(
                WorkloadKind::Deployment,
                namespace,
                deployment,
            ))
        }
        _ => None,
    }
}
