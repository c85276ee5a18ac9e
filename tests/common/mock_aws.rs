use std::collections::HashMap;

use anyhow::{Result, bail};
use aws_sdk_eks::types::{Cluster, Nodegroup};

use eks_versions::clients::AwsClients;

/// Mock AWS client for one region. Clusters are listed in insertion order;
/// node groups are keyed by cluster name.
#[derive(Clone, Default)]
pub struct MockAwsClients {
  pub clusters: Vec<Cluster>,
  pub nodegroups: HashMap<String, Vec<Nodegroup>>,
  /// Clusters whose node groups cannot be listed
  pub failing_nodegroups: Vec<String>,
}

impl MockAwsClients {
  pub fn with_cluster(mut self, cluster: Cluster, nodegroups: Vec<Nodegroup>) -> Self {
    let name = cluster.name().unwrap_or_default().to_owned();
    self.clusters.push(cluster);
    self.nodegroups.insert(name, nodegroups);
    self
  }
}

impl AwsClients for MockAwsClients {
  async fn list_clusters(&self) -> Result<Vec<String>> {
    Ok(
      self
        .clusters
        .iter()
        .filter_map(|cluster| cluster.name().map(str::to_owned))
        .collect(),
    )
  }

  async fn get_cluster(&self, name: &str) -> Result<Cluster> {
    match self.clusters.iter().find(|cluster| cluster.name() == Some(name)) {
      Some(cluster) => Ok(cluster.clone()),
      None => bail!("ResourceNotFoundException: No cluster found for name: {name}"),
    }
  }

  async fn get_nodegroups(&self, cluster_name: &str) -> Result<Vec<Nodegroup>> {
    if self.failing_nodegroups.iter().any(|name| name == cluster_name) {
      bail!("mock AWS error");
    }
    Ok(self.nodegroups.get(cluster_name).cloned().unwrap_or_default())
  }
}

/// Mock that returns errors for all methods
pub struct MockAwsClientsError;

impl AwsClients for MockAwsClientsError {
  async fn list_clusters(&self) -> Result<Vec<String>> { bail!("mock AWS error") }
  async fn get_cluster(&self, _name: &str) -> Result<Cluster> { bail!("mock AWS error") }
  async fn get_nodegroups(&self, _cluster_name: &str) -> Result<Vec<Nodegroup>> { bail!("mock AWS error") }
}
