use std::collections::BTreeMap;

use anyhow::{Context, Result};
use aws_sdk_eks::types::Cluster;
use k8s_openapi::api::core::v1;
use kube::{
  Client,
  api::{Api, ListParams},
  config::{KubeConfigOptions, Kubeconfig},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

const COMPUTE_TYPE_LABEL: &str = "eks.amazonaws.com/compute-type";
const INSTANCE_TYPE_LABEL: &str = "node.kubernetes.io/instance-type";
const FARGATE_SCHEDULER: &str = "fargate-scheduler";

/// Node details as viewed from the Kubernetes API
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Node {
  pub name: String,
  pub labels: BTreeMap<String, String>,
  /// Raw kubelet version, e.g. `v1.27.3-eks-a5565ad`
  pub kubelet_version: String,
  /// Status of the `Ready` condition, if reported
  pub ready: Option<bool>,
  pub capacity: BTreeMap<String, String>,
}

impl Node {
  /// Fargate capacity registers one node per pod, labelled with its compute type
  pub fn is_fargate(&self) -> bool {
    self.labels.get(COMPUTE_TYPE_LABEL).map(String::as_str) == Some("fargate")
  }

  pub fn instance_type(&self) -> Option<&str> {
    self.labels.get(INSTANCE_TYPE_LABEL).map(String::as_str)
  }

  pub fn status(&self) -> &'static str {
    match self.ready {
      Some(true) => "Ready",
      Some(false) => "NotReady",
      None => "Unknown",
    }
  }
}

impl From<v1::Node> for Node {
  fn from(node: v1::Node) -> Self {
    let status = node.status.unwrap_or_default();

    Node {
      name: node.metadata.name.unwrap_or_default(),
      labels: node.metadata.labels.unwrap_or_default(),
      kubelet_version: status
        .node_info
        .map(|info| info.kubelet_version)
        .unwrap_or_default(),
      ready: status
        .conditions
        .unwrap_or_default()
        .iter()
        .find(|condition| condition.type_ == "Ready")
        .map(|condition| condition.status == "True"),
      capacity: status
        .capacity
        .unwrap_or_default()
        .into_iter()
        .map(|(resource, quantity)| (resource, quantity.0))
        .collect(),
    }
  }
}

/// Pod scheduled by the Fargate scheduler
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FargatePod {
  pub name: String,
  pub namespace: String,
  pub phase: Option<String>,
  pub node_name: Option<String>,
  pub labels: BTreeMap<String, String>,
}

impl FargatePod {
  /// Returns `None` for pods not placed by the Fargate scheduler
  pub fn from_pod(pod: v1::Pod) -> Option<Self> {
    let spec = pod.spec?;
    if spec.scheduler_name.as_deref() != Some(FARGATE_SCHEDULER) {
      return None;
    }

    Some(FargatePod {
      name: pod.metadata.name.unwrap_or_default(),
      namespace: pod.metadata.namespace.unwrap_or_default(),
      phase: pod.status.and_then(|status| status.phase),
      node_name: spec.node_name,
      labels: pod.metadata.labels.unwrap_or_default(),
    })
  }
}

/// Build a client for the cluster without touching the local kubeconfig file
///
/// Authentication uses `aws eks get-token`, the same exec plugin that
/// `aws eks update-kubeconfig` would configure
pub async fn client_for_cluster(cluster: &Cluster, region: &str) -> Result<Client> {
  let name = cluster.name().context("Cluster name not found")?;
  let endpoint = cluster
    .endpoint()
    .with_context(|| format!("Cluster {name} has no API server endpoint"))?;
  let certificate = cluster
    .certificate_authority()
    .and_then(|ca| ca.data())
    .with_context(|| format!("Cluster {name} has no certificate authority data"))?;

  let kubeconfig: Kubeconfig = serde_json::from_value(json!({
    "apiVersion": "v1",
    "kind": "Config",
    "clusters": [{
      "name": name,
      "cluster": { "server": endpoint, "certificate-authority-data": certificate },
    }],
    "users": [{
      "name": name,
      "user": {
        "exec": {
          "apiVersion": "client.authentication.k8s.io/v1beta1",
          "command": "aws",
          "args": ["eks", "get-token", "--cluster-name", name, "--region", region],
        },
      },
    }],
    "contexts": [{
      "name": name,
      "context": { "cluster": name, "user": name },
    }],
    "current-context": name,
  }))?;

  let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
    .await
    .with_context(|| format!("Unable to build Kubernetes client configuration for cluster {name}"))?;

  Ok(Client::try_from(config)?)
}

pub async fn get_nodes(client: &Client) -> Result<Vec<Node>> {
  let api: Api<v1::Node> = Api::all(client.clone());
  let node_list = api.list(&ListParams::default()).await?;

  Ok(node_list.items.into_iter().map(Node::from).collect())
}

pub async fn get_fargate_pods(client: &Client) -> Result<Vec<FargatePod>> {
  let api: Api<v1::Pod> = Api::all(client.clone());
  let params = ListParams::default().fields("spec.nodeName!=");
  let pod_list = api.list(&params).await?;

  Ok(pod_list.items.into_iter().filter_map(FargatePod::from_pod).collect())
}
