use std::{cmp::Ordering, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use crate::version::VersionToken;

/// Point-in-time view of one EKS cluster and the compute attached to it
///
/// Node groups, nodes and Fargate pods keep the order in which they were received
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
  pub name: String,
  pub region: String,
  pub control_plane_version: VersionToken,
  pub control_plane_status: String,
  /// EKS platform version (e.g. `eks.5`); display metadata only, never compared
  pub platform_version: String,
  pub endpoint: Option<String>,
  pub tags: BTreeMap<String, String>,
  pub nodegroups: Vec<NodeGroupInfo>,
  pub nodes: Vec<NodeInfo>,
  pub fargate_pods: Vec<PodInfo>,
}

impl ClusterSnapshot {
  /// A cluster with a control plane and no compute
  pub fn new(name: &str, region: &str, control_plane_version: VersionToken) -> Self {
    Self {
      name: name.to_owned(),
      region: region.to_owned(),
      control_plane_version,
      control_plane_status: "ACTIVE".to_owned(),
      platform_version: "N/A".to_owned(),
      endpoint: None,
      tags: BTreeMap::new(),
      nodegroups: Vec::new(),
      nodes: Vec::new(),
      fargate_pods: Vec::new(),
    }
  }

  /// Returns true when a node group or node disagrees with the control plane version
  pub fn is_outdated(&self) -> bool {
    is_outdated(self)
  }
}

/// EKS managed node group
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeGroupInfo {
  pub name: String,
  #[serde(rename = "k8s_version")]
  pub version: VersionToken,
  pub status: String,
  pub instance_types: Vec<String>,
  /// AMI release version of the node group
  pub ami_version: Option<String>,
  pub scaling: Option<Scaling>,
  pub tags: BTreeMap<String, String>,
}

impl NodeGroupInfo {
  pub fn new(name: &str, version: VersionToken, status: &str) -> Self {
    Self {
      name: name.to_owned(),
      version,
      status: status.to_owned(),
      instance_types: Vec::new(),
      ami_version: None,
      scaling: None,
      tags: BTreeMap::new(),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaling {
  pub desired: i32,
  pub min: i32,
  pub max: i32,
}

/// Node registered with the cluster API server, as reported by its kubelet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
  pub name: String,
  #[serde(rename = "k8s_version")]
  pub version: VersionToken,
  pub status: String,
  pub instance_type: Option<String>,
  pub capacity: BTreeMap<String, String>,
  pub labels: BTreeMap<String, String>,
}

impl NodeInfo {
  pub fn new(name: &str, version: VersionToken, status: &str) -> Self {
    Self {
      name: name.to_owned(),
      version,
      status: status.to_owned(),
      instance_type: None,
      capacity: BTreeMap::new(),
      labels: BTreeMap::new(),
    }
  }
}

/// Pod scheduled onto Fargate
///
/// `version` is the kubelet version of the Fargate node running the pod, or the
/// control plane version when that node was not listed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PodInfo {
  pub name: String,
  pub namespace: String,
  pub status: String,
  pub node_name: Option<String>,
  #[serde(rename = "k8s_version")]
  pub version: Option<VersionToken>,
  pub labels: BTreeMap<String, String>,
}

impl PodInfo {
  pub fn new(name: &str, namespace: &str, status: &str) -> Self {
    Self {
      name: name.to_owned(),
      namespace: namespace.to_owned(),
      status: status.to_owned(),
      node_name: None,
      version: None,
      labels: BTreeMap::new(),
    }
  }
}

/// Orders a compute version relative to the control plane version
///
/// EKS reports the control plane as `major.minor`, while kubelets report a full
/// build such as `v1.27.3-eks-a5565ad`. When the control plane carries no patch,
/// valid compute versions are compared on their release only
pub fn compare_to_control_plane(version: &VersionToken, control_plane: &VersionToken) -> Ordering {
  if control_plane.is_valid() && control_plane.patch().is_none() && version.is_valid() {
    version.release().cmp(control_plane)
  } else {
    version.cmp(control_plane)
  }
}

/// Returns true when any node group or node version differs from the control plane
///
/// Fargate pods are not considered; their nodes are managed by the platform.
/// A cluster without node groups and nodes is never outdated
pub fn is_outdated(snapshot: &ClusterSnapshot) -> bool {
  let control_plane = &snapshot.control_plane_version;

  snapshot
    .nodegroups
    .iter()
    .map(|nodegroup| &nodegroup.version)
    .chain(snapshot.nodes.iter().map(|node| &node.version))
    .any(|version| compare_to_control_plane(version, control_plane) != Ordering::Equal)
}
