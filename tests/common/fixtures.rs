use std::collections::BTreeMap;

use aws_sdk_eks::types::{Cluster, ClusterStatus, Nodegroup, NodegroupStatus};

use eks_versions::k8s::{FargatePod, Node};

use super::mock_aws::MockAwsClients;
use super::mock_k8s::MockK8sClients;

pub fn cluster(name: &str, version: &str) -> Cluster {
  Cluster::builder()
    .name(name)
    .version(version)
    .status(ClusterStatus::Active)
    .platform_version("eks.5")
    .build()
}

pub fn nodegroup(name: &str, version: &str) -> Nodegroup {
  Nodegroup::builder()
    .nodegroup_name(name)
    .version(version)
    .status(NodegroupStatus::Active)
    .instance_types("m5.large")
    .build()
}

/// Region with a single cluster whose node group matches the control plane
pub fn healthy_aws(name: &str, version: &str) -> MockAwsClients {
  MockAwsClients::default().with_cluster(cluster(name, version), vec![nodegroup("ng-1", version)])
}

/// Ready EC2 node reporting the given kubelet version
pub fn make_node(name: &str, kubelet_version: &str) -> Node {
  Node {
    name: name.into(),
    labels: BTreeMap::from([("node.kubernetes.io/instance-type".to_string(), "m5.large".to_string())]),
    kubelet_version: kubelet_version.into(),
    ready: Some(true),
    ..Node::default()
  }
}

pub fn make_fargate_node(name: &str, kubelet_version: &str) -> Node {
  Node {
    name: name.into(),
    labels: BTreeMap::from([("eks.amazonaws.com/compute-type".to_string(), "fargate".to_string())]),
    kubelet_version: kubelet_version.into(),
    ready: Some(true),
    ..Node::default()
  }
}

pub fn make_fargate_pod(name: &str, namespace: &str, node_name: &str) -> FargatePod {
  FargatePod {
    name: name.into(),
    namespace: namespace.into(),
    phase: Some("Running".into()),
    node_name: Some(node_name.into()),
    ..FargatePod::default()
  }
}

/// One EC2 node at `kubelet_version` plus a Fargate pod on a node at the same version
pub fn k8s_with_fargate(kubelet_version: &str) -> MockK8sClients {
  MockK8sClients {
    nodes: vec![
      make_node("ip-10-0-1-10.ec2.internal", kubelet_version),
      make_fargate_node("fargate-ip-10-0-2-20.ec2.internal", kubelet_version),
    ],
    fargate_pods: vec![make_fargate_pod(
      "coredns-6d8f",
      "kube-system",
      "fargate-ip-10-0-2-20.ec2.internal",
    )],
  }
}
