use anyhow::{Result, bail};
use aws_sdk_eks::types::Cluster;

use eks_versions::clients::{K8sClients, K8sConnector};
use eks_versions::k8s::{FargatePod, Node};

/// Mock K8s client for testing; also serves as its own connector
#[derive(Clone, Default)]
pub struct MockK8sClients {
  pub nodes: Vec<Node>,
  pub fargate_pods: Vec<FargatePod>,
}

impl K8sClients for MockK8sClients {
  async fn get_nodes(&self) -> Result<Vec<Node>> {
    Ok(self.nodes.clone())
  }

  async fn get_fargate_pods(&self) -> Result<Vec<FargatePod>> {
    Ok(self.fargate_pods.clone())
  }
}

impl K8sConnector for MockK8sClients {
  type Clients = MockK8sClients;

  async fn connect(&self, _cluster: &Cluster, _region: &str) -> Result<MockK8sClients> {
    Ok(self.clone())
  }
}

/// Mock that connects but returns errors for all methods
#[derive(Clone)]
pub struct MockK8sClientsError;

impl K8sClients for MockK8sClientsError {
  async fn get_nodes(&self) -> Result<Vec<Node>> { bail!("mock K8s error") }
  async fn get_fargate_pods(&self) -> Result<Vec<FargatePod>> { bail!("mock K8s error") }
}

impl K8sConnector for MockK8sClientsError {
  type Clients = MockK8sClientsError;

  async fn connect(&self, _cluster: &Cluster, _region: &str) -> Result<MockK8sClientsError> {
    Ok(MockK8sClientsError)
  }
}

/// Mock connector for a cluster that cannot be reached
pub struct MockUnreachable;

impl K8sConnector for MockUnreachable {
  type Clients = MockK8sClients;

  async fn connect(&self, cluster: &Cluster, _region: &str) -> Result<MockK8sClients> {
    bail!("Unable to connect to cluster {}", cluster.name().unwrap_or_default())
  }
}
