//! Audit pipeline integration tests
//!
//! Workload and metrics sources are replaced by in-memory fakes so the whole
//! pipeline runs without a cluster.

use advisor_lib::{
    Advisor, AdvisorError, Check, ContainerSpec, MetricsSource, NodeUsage, RemediationTable,
    UsageSample, UsageSnapshot, WorkloadIdentity, WorkloadKind, WorkloadRecord, WorkloadSource,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory workload source that records which kinds were listed
struct FakeWorkloads {
    records: Vec<WorkloadRecord>,
    listed: Mutex<Vec<WorkloadKind>>,
    fail_on: Option<WorkloadKind>,
}

impl FakeWorkloads {
    fn new(records: Vec<WorkloadRecord>) -> Self {
        Self {
            records,
            listed: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    fn failing_on(mut self, kind: WorkloadKind) -> Self {
        self.fail_on = Some(kind);
        self
    }

    fn listed(&self) -> Vec<WorkloadKind> {
        self.listed.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkloadSource for FakeWorkloads {
    fn name(&self) -> &str {
        "fake-cluster"
    }

    async fn list(&self, kind: WorkloadKind) -> Result<Vec<WorkloadRecord>> {
        self.listed.lock().unwrap().push(kind);
        if self.fail_on == Some(kind) {
            anyhow::bail!("forbidden: cannot list {kind}");
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.identity.kind == kind)
            .cloned()
            .collect())
    }
}

struct FakeMetrics {
    pods: Vec<UsageSample>,
    nodes: Vec<NodeUsage>,
    fail: bool,
}

#[async_trait]
impl MetricsSource for FakeMetrics {
    fn name(&self) -> &str {
        "fake-metrics"
    }

    async fn list(&self) -> Result<Vec<UsageSample>> {
        if self.fail {
            anyhow::bail!("the server could not find the requested resource");
        }
        Ok(self.pods.clone())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeUsage>> {
        Ok(self.nodes.clone())
    }
}

fn advisor() -> Advisor {
    Advisor::new(RemediationTable::standard().unwrap())
}

fn id(kind: WorkloadKind, name: &str) -> WorkloadIdentity {
    WorkloadIdentity::new(kind, "default", name)
}

fn compliant(name: &str) -> ContainerSpec {
    ContainerSpec::new(name)
        .with_limits(500, 256 * 1024 * 1024)
        .with_requests(250, 128 * 1024 * 1024)
}

#[tokio::test]
async fn test_end_to_end_single_violation() {
    let app = ContainerSpec::new("app").with_limits(0, 100).with_requests(10, 0);
    let source = FakeWorkloads::new(vec![WorkloadRecord::new(
        id(WorkloadKind::Deployment, "web"),
        vec![app],
    )]);

    let doc = advisor()
        .run(&source, None, &[WorkloadKind::Deployment])
        .await
        .unwrap();

    assert_eq!(doc.issues.len(), 2);
    assert_eq!(doc.remediation.len(), 4);
    assert!(doc.issues.iter().all(|r| r.workload == "web" && r.container == "app"));
    let checks: Vec<Check> = doc.issues.iter().map(|r| r.check).collect();
    assert_eq!(checks, vec![Check::CpuLimitMissing, Check::MemoryRequestMissing]);
    assert!(doc.nodes.is_empty());
}

#[tokio::test]
async fn test_fully_compliant_workload_is_absent() {
    let source = FakeWorkloads::new(vec![
        WorkloadRecord::new(
            id(WorkloadKind::Deployment, "api"),
            vec![compliant("server"), compliant("sidecar")],
        ),
        WorkloadRecord::new(id(WorkloadKind::Deployment, "worker"), vec![ContainerSpec::new("job")]),
    ]);

    let doc = advisor()
        .run(&source, None, &[WorkloadKind::Deployment])
        .await
        .unwrap();

    assert_eq!(doc.issues.len(), 4);
    assert!(doc.issues.iter().all(|r| r.workload == "worker"));
    assert_eq!(doc.affected_workloads(), 1);
}

#[tokio::test]
async fn test_identity_collision_fails_the_run() {
    let source = FakeWorkloads::new(vec![
        WorkloadRecord::new(id(WorkloadKind::StatefulSet, "db"), vec![ContainerSpec::new("a")]),
        WorkloadRecord::new(id(WorkloadKind::StatefulSet, "db"), vec![ContainerSpec::new("b")]),
    ]);

    let err = advisor()
        .run(&source, None, &[WorkloadKind::StatefulSet])
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::IdentityCollision(ref i) if i.name == "db"));
}

#[tokio::test]
async fn test_source_failure_is_source_unavailable() {
    let source = FakeWorkloads::new(Vec::new()).failing_on(WorkloadKind::DaemonSet);

    let err = advisor()
        .run(&source, None, &WorkloadKind::ALL)
        .await
        .unwrap_err();

    match err {
        AdvisorError::SourceUnavailable { collaborator, reason } => {
            assert_eq!(collaborator, "fake-cluster");
            assert!(reason.contains("cannot list DaemonSet"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Listing stops at the first failure
    assert_eq!(
        source.listed(),
        vec![WorkloadKind::Pod, WorkloadKind::Deployment, WorkloadKind::DaemonSet]
    );
}

#[tokio::test]
async fn test_duplicate_kinds_are_listed_once() {
    let source = FakeWorkloads::new(Vec::new());
    let doc = advisor()
        .run(
            &source,
            None,
            &[WorkloadKind::Deployment, WorkloadKind::Deployment],
        )
        .await
        .unwrap();

    assert!(doc.is_compliant());
    assert_eq!(source.listed(), vec![WorkloadKind::Deployment]);
}

#[tokio::test]
async fn test_controlled_pods_are_reported_through_controller() {
    let deploy = id(WorkloadKind::Deployment, "web");
    let source = FakeWorkloads::new(vec![
        WorkloadRecord::new(deploy.clone(), vec![ContainerSpec::new("app")]),
        WorkloadRecord::new(id(WorkloadKind::Pod, "web-abc-1"), vec![ContainerSpec::new("app")])
            .with_controller(deploy.clone()),
        WorkloadRecord::new(id(WorkloadKind::Pod, "debug"), vec![ContainerSpec::new("shell")]),
    ]);

    let doc = advisor()
        .run(&source, None, &[WorkloadKind::Pod, WorkloadKind::Deployment])
        .await
        .unwrap();

    let workloads: Vec<(&str, WorkloadKind)> = doc
        .issues
        .iter()
        .map(|r| (r.workload.as_str(), r.kind))
        .collect();
    assert!(workloads.contains(&("web", WorkloadKind::Deployment)));
    assert!(workloads.contains(&("debug", WorkloadKind::Pod)));
    assert!(!workloads.iter().any(|(name, _)| *name == "web-abc-1"));
    assert_eq!(doc.affected_workloads(), 2);
}

#[tokio::test]
async fn test_pod_only_audit_reports_every_pod() {
    let deploy = id(WorkloadKind::Deployment, "web");
    let source = FakeWorkloads::new(vec![
        WorkloadRecord::new(id(WorkloadKind::Pod, "web-abc-1"), vec![ContainerSpec::new("app")])
            .with_controller(deploy),
        WorkloadRecord::new(id(WorkloadKind::Pod, "debug"), vec![ContainerSpec::new("shell")]),
    ]);

    let doc = advisor()
        .run(&source, None, &[WorkloadKind::Pod])
        .await
        .unwrap();
    assert_eq!(doc.affected_workloads(), 2);
}

#[tokio::test]
async fn test_pod_with_unlisted_controller_is_evaluated() {
    let source = FakeWorkloads::new(vec![WorkloadRecord::new(
        id(WorkloadKind::Pod, "web-7d9f-x2kq"),
        vec![ContainerSpec::new("app")],
    )
    .with_controller(id(WorkloadKind::Deployment, "web"))]);

    let doc = advisor()
        .run(&source, None, &WorkloadKind::ALL)
        .await
        .unwrap();

    assert!(!doc.is_compliant());
    assert_eq!(doc.issues.len(), 4);
    assert!(doc
        .issues
        .iter()
        .all(|r| r.workload == "web-7d9f-x2kq" && r.kind == WorkloadKind::Pod));
}

#[tokio::test]
async fn test_pod_listed_before_its_controller_is_still_covered() {
    let deploy = id(WorkloadKind::Deployment, "web");
    let source = FakeWorkloads::new(vec![
        WorkloadRecord::new(id(WorkloadKind::Pod, "web-abc-1"), vec![ContainerSpec::new("app")])
            .with_controller(deploy.clone()),
        WorkloadRecord::new(deploy, vec![compliant("app")]),
    ]);

    // Pod is listed first in this order
    let doc = advisor()
        .run(&source, None, &[WorkloadKind::Pod, WorkloadKind::Deployment])
        .await
        .unwrap();

    assert!(doc.is_compliant());
}

#[tokio::test]
async fn test_metrics_enrich_pods_and_controllers() {
    let deploy = id(WorkloadKind::Deployment, "web");
    let pod_a = id(WorkloadKind::Pod, "web-abc-1");
    let pod_b = id(WorkloadKind::Pod, "web-abc-2");
    let source = FakeWorkloads::new(vec![
        WorkloadRecord::new(deploy.clone(), vec![ContainerSpec::new("app")]),
        WorkloadRecord::new(pod_a.clone(), vec![ContainerSpec::new("app")])
            .with_controller(deploy.clone()),
        WorkloadRecord::new(pod_b.clone(), vec![ContainerSpec::new("app")])
            .with_controller(deploy.clone()),
    ]);
    let metrics = FakeMetrics {
        pods: vec![
            UsageSample {
                identity: pod_a,
                usage: UsageSnapshot::new(100, 1000),
            },
            UsageSample {
                identity: pod_b,
                usage: UsageSnapshot::new(30, 500),
            },
        ],
        nodes: vec![NodeUsage {
            node_name: "node-1".into(),
            usage: UsageSnapshot::new(1200, 4096),
        }],
        fail: false,
    };

    let doc = advisor()
        .run(&source, Some(&metrics), &[WorkloadKind::Deployment])
        .await
        .unwrap();

    // Pods are listed for ownership even though only deployments are audited
    assert_eq!(source.listed(), vec![WorkloadKind::Deployment, WorkloadKind::Pod]);
    assert_eq!(doc.issues.len(), 4);
    assert!(doc
        .issues
        .iter()
        .all(|r| r.usage == Some(UsageSnapshot::new(130, 1500))));
    assert_eq!(doc.nodes.len(), 1);
    assert_eq!(doc.nodes[0].node, "node-1");
}

#[tokio::test]
async fn test_metrics_failure_is_source_unavailable() {
    let source = FakeWorkloads::new(vec![WorkloadRecord::new(
        id(WorkloadKind::Pod, "debug"),
        vec![ContainerSpec::new("shell")],
    )]);
    let metrics = FakeMetrics {
        pods: Vec::new(),
        nodes: Vec::new(),
        fail: true,
    };

    let err = advisor()
        .run(&source, Some(&metrics), &[WorkloadKind::Pod])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdvisorError::SourceUnavailable { ref collaborator, .. } if collaborator == "fake-metrics"
    ));
}

#[tokio::test]
async fn test_runs_are_reproducible() {
    let records = vec![
        WorkloadRecord::new(id(WorkloadKind::Deployment, "b"), vec![ContainerSpec::new("x")]),
        WorkloadRecord::new(
            id(WorkloadKind::DaemonSet, "a"),
            vec![ContainerSpec::new("y").with_limits(1, 1)],
        ),
        WorkloadRecord::new(id(WorkloadKind::Pod, "c"), vec![ContainerSpec::new("z")]),
    ];

    let first = advisor()
        .run(&FakeWorkloads::new(records.clone()), None, &WorkloadKind::ALL)
        .await
        .unwrap();
    let second = advisor()
        .run(&FakeWorkloads::new(records), None, &WorkloadKind::ALL)
        .await
        .unwrap();

    assert_eq!(first.issues, second.issues);
    assert_eq!(first.remediation, second.remediation);
}
