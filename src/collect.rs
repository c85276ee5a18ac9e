use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use aws_sdk_eks::types::{Cluster, Nodegroup};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::{
  clients::{AwsClients, K8sClients, K8sConnector},
  k8s::{FargatePod, Node},
  snapshot::{ClusterSnapshot, NodeGroupInfo, NodeInfo, PodInfo, Scaling},
  version::{VersionCache, VersionToken},
};

/// Placeholder for values the APIs did not report
pub const NOT_AVAILABLE: &str = "N/A";

/// Collect every region concurrently, building the AWS clients of each region with `clients_for`
///
/// Snapshots are returned grouped in the order of `regions`
pub async fn collect_regions<A, C, F, Fut>(
  regions: &[String],
  clients_for: F,
  connector: Option<&C>,
  cluster_name: Option<&str>,
) -> Vec<ClusterSnapshot>
where
  A: AwsClients,
  C: K8sConnector,
  F: Fn(String) -> Fut,
  Fut: Future<Output = A>,
{
  let tasks = regions.iter().map(|region| {
    let clients = clients_for(region.clone());
    async move {
      let aws = clients.await;
      collect_region(&aws, connector, region, cluster_name).await
    }
  });

  join_all(tasks).await.into_iter().flatten().collect()
}

/// Collect snapshots for every cluster in the region, or only `cluster_name` when given
///
/// Failures are logged and skipped: a region that cannot be listed yields no clusters,
/// and a cluster that cannot be described is left out
pub async fn collect_region<A, C>(
  aws: &A,
  connector: Option<&C>,
  region: &str,
  cluster_name: Option<&str>,
) -> Vec<ClusterSnapshot>
where
  A: AwsClients,
  C: K8sConnector,
{
  let names = match cluster_name {
    Some(name) => vec![name.to_owned()],
    None => match aws.list_clusters().await {
      Ok(names) => names,
      Err(err) => {
        warn!("Unable to list clusters in region {region}: {err:#}");
        return Vec::new();
      }
    },
  };
  debug!("Collecting {} clusters in region {region}", names.len());

  let mut cache = VersionCache::new();
  let mut snapshots = Vec::with_capacity(names.len());

  for name in &names {
    match collect_cluster(aws, connector, region, name, &mut cache).await {
      Ok(snapshot) => snapshots.push(snapshot),
      Err(err) => warn!("Unable to collect cluster {name} in region {region}: {err:#}"),
    }
  }

  snapshots
}

/// Collect the control plane, node groups and, when a connector is given, the nodes
/// and Fargate pods of one cluster
pub async fn collect_cluster<A, C>(
  aws: &A,
  connector: Option<&C>,
  region: &str,
  name: &str,
  cache: &mut VersionCache,
) -> Result<ClusterSnapshot>
where
  A: AwsClients,
  C: K8sConnector,
{
  let cluster = aws.get_cluster(name).await?;
  let mut snapshot = cluster_snapshot(&cluster, region, cache);

  match aws.get_nodegroups(name).await {
    Ok(nodegroups) => {
      snapshot.nodegroups = nodegroups.iter().map(|nodegroup| nodegroup_info(nodegroup, cache)).collect();
    }
    Err(err) => warn!("Unable to list nodegroups of cluster {name}: {err:#}"),
  }

  if let Some(connector) = connector {
    match connector.connect(&cluster, region).await {
      Ok(clients) => {
        let (nodes, mut pods) = kubernetes_compute(&clients, name, cache).await;
        // Pods without a listed Fargate node inherit the control plane version
        for pod in &mut pods {
          pod
            .version
            .get_or_insert_with(|| snapshot.control_plane_version.clone());
        }
        snapshot.nodes = nodes;
        snapshot.fargate_pods = pods;
      }
      Err(err) => warn!("{err:#}"),
    }
  }

  Ok(snapshot)
}

async fn kubernetes_compute<K: K8sClients>(
  clients: &K,
  cluster_name: &str,
  cache: &mut VersionCache,
) -> (Vec<NodeInfo>, Vec<PodInfo>) {
  let nodes = clients.get_nodes().await.unwrap_or_else(|err| {
    warn!("Unable to list nodes of cluster {cluster_name}: {err:#}");
    Vec::new()
  });
  let pods = clients.get_fargate_pods().await.unwrap_or_else(|err| {
    warn!("Unable to list Fargate pods of cluster {cluster_name}: {err:#}");
    Vec::new()
  });

  compute_from_kubernetes(nodes, pods, cache)
}

/// Snapshot of the control plane; compute is filled in separately
pub fn cluster_snapshot(cluster: &Cluster, region: &str, cache: &mut VersionCache) -> ClusterSnapshot {
  ClusterSnapshot {
    name: cluster.name().unwrap_or_default().to_owned(),
    region: region.to_owned(),
    control_plane_version: cache.parse(cluster.version().unwrap_or(NOT_AVAILABLE)),
    control_plane_status: cluster
      .status()
      .map(|status| status.as_str().to_owned())
      .unwrap_or_else(|| "UNKNOWN".to_owned()),
    platform_version: cluster.platform_version().unwrap_or(NOT_AVAILABLE).to_owned(),
    endpoint: cluster.endpoint().map(str::to_owned),
    tags: to_btree(cluster.tags()),
    nodegroups: Vec::new(),
    nodes: Vec::new(),
    fargate_pods: Vec::new(),
  }
}

pub fn nodegroup_info(nodegroup: &Nodegroup, cache: &mut VersionCache) -> NodeGroupInfo {
  NodeGroupInfo {
    name: nodegroup.nodegroup_name().unwrap_or_default().to_owned(),
    version: cache.parse(nodegroup.version().unwrap_or(NOT_AVAILABLE)),
    status: nodegroup
      .status()
      .map(|status| status.as_str().to_owned())
      .unwrap_or_else(|| "UNKNOWN".to_owned()),
    instance_types: nodegroup.instance_types().to_vec(),
    ami_version: nodegroup.release_version().map(str::to_owned),
    scaling: nodegroup.scaling_config().map(|scaling| Scaling {
      desired: scaling.desired_size().unwrap_or_default(),
      min: scaling.min_size().unwrap_or_default(),
      max: scaling.max_size().unwrap_or_default(),
    }),
    tags: to_btree(nodegroup.tags()),
  }
}

/// Split Kubernetes nodes into standalone nodes and Fargate capacity
///
/// Fargate nodes are not reported as nodes; their kubelet version is attached to the
/// pods scheduled on them
pub fn compute_from_kubernetes(
  nodes: Vec<Node>,
  pods: Vec<FargatePod>,
  cache: &mut VersionCache,
) -> (Vec<NodeInfo>, Vec<PodInfo>) {
  let mut fargate_versions: HashMap<String, VersionToken> = HashMap::new();
  let mut node_infos = Vec::new();

  for node in nodes {
    let version = if node.kubelet_version.is_empty() {
      cache.parse(NOT_AVAILABLE)
    } else {
      cache.parse(&node.kubelet_version)
    };

    if node.is_fargate() {
      fargate_versions.insert(node.name, version);
      continue;
    }

    let status = node.status().to_owned();
    let instance_type = node.instance_type().map(str::to_owned);
    node_infos.push(NodeInfo {
      name: node.name,
      version,
      status,
      instance_type,
      capacity: node.capacity,
      labels: node.labels,
    });
  }

  let pod_infos = pods
    .into_iter()
    .map(|pod| PodInfo {
      version: pod
        .node_name
        .as_ref()
        .and_then(|node_name| fargate_versions.get(node_name))
        .cloned(),
      name: pod.name,
      namespace: pod.namespace,
      status: pod.phase.unwrap_or_else(|| "Unknown".to_owned()),
      node_name: pod.node_name,
      labels: pod.labels,
    })
    .collect();

  (node_infos, pod_infos)
}

fn to_btree(tags: Option<&HashMap<String, String>>) -> BTreeMap<String, String> {
  tags
    .map(|tags| tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    .unwrap_or_default()
}
