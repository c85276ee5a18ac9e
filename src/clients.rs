use anyhow::Result;
use aws_sdk_eks::types::{Cluster, Nodegroup};

use crate::{
  eks,
  k8s::{self, FargatePod, Node},
};

/// Trait abstracting the AWS API operations used within one region
pub trait AwsClients {
  fn list_clusters(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
  fn get_cluster(&self, name: &str) -> impl std::future::Future<Output = Result<Cluster>> + Send;
  fn get_nodegroups(&self, cluster_name: &str) -> impl std::future::Future<Output = Result<Vec<Nodegroup>>> + Send;
}

/// Trait abstracting the Kubernetes API operations used against one cluster
pub trait K8sClients {
  fn get_nodes(&self) -> impl std::future::Future<Output = Result<Vec<Node>>> + Send;
  fn get_fargate_pods(&self) -> impl std::future::Future<Output = Result<Vec<FargatePod>>> + Send;
}

/// Opens Kubernetes clients for a cluster described by the EKS API
pub trait K8sConnector {
  type Clients: K8sClients;

  fn connect(&self, cluster: &Cluster, region: &str) -> impl std::future::Future<Output = Result<Self::Clients>> + Send;
}

/// Real AWS client implementation wrapping the SDK clients for one region
pub struct RealAwsClients {
  eks: aws_sdk_eks::Client,
}

impl RealAwsClients {
  pub fn new(config: &aws_config::SdkConfig) -> Self {
    Self {
      eks: aws_sdk_eks::Client::new(config),
    }
  }
}

impl AwsClients for RealAwsClients {
  async fn list_clusters(&self) -> Result<Vec<String>> {
    eks::list_clusters(&self.eks).await
  }

  async fn get_cluster(&self, name: &str) -> Result<Cluster> {
    eks::get_cluster(&self.eks, name).await
  }

  async fn get_nodegroups(&self, cluster_name: &str) -> Result<Vec<Nodegroup>> {
    eks::get_nodegroups(&self.eks, cluster_name).await
  }
}

/// Real Kubernetes client implementation wrapping kube-rs
pub struct RealK8sClients {
  client: kube::Client,
}

impl K8sClients for RealK8sClients {
  async fn get_nodes(&self) -> Result<Vec<Node>> {
    k8s::get_nodes(&self.client).await
  }

  async fn get_fargate_pods(&self) -> Result<Vec<FargatePod>> {
    k8s::get_fargate_pods(&self.client).await
  }
}

pub struct RealK8sConnector;

impl K8sConnector for RealK8sConnector {
  type Clients = RealK8sClients;

  async fn connect(&self, cluster: &Cluster, region: &str) -> Result<RealK8sClients> {
    match k8s::client_for_cluster(cluster, region).await {
      Ok(client) => Ok(RealK8sClients { client }),
      Err(e) => {
        let name = cluster.name().unwrap_or_default();
        anyhow::bail!(
          "Unable to connect to cluster {name}: {e}\n\n\
          Ensure the AWS CLI is installed and the current credentials can access the cluster.\n\
          Try: aws eks update-kubeconfig --name {name} --region {region}"
        );
      }
    }
  }
}
