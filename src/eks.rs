use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, meta::region::RegionProviderChain};
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_eks::{
  Client as EksClient,
  types::{Cluster, Nodegroup},
};
use aws_types::region::Region;
use tracing::{debug, warn};

/// Get the configuration to authn/authz with AWS that will be used across AWS clients
///
/// An explicit region wins over `AWS_REGION`, which wins over the default provider chain
pub async fn get_config(region: Option<&str>) -> aws_config::SdkConfig {
  let aws_region = match region {
    Some(region) => Some(Region::new(region.to_owned())),
    None => std::env::var("AWS_REGION").ok().map(Region::new),
  };

  let region_provider = RegionProviderChain::first_try(aws_region).or_default_provider();

  aws_config::defaults(BehaviorVersion::latest())
    .region(region_provider)
    .load()
    .await
}

/// List the regions enabled for the account
pub async fn list_regions(client: &Ec2Client) -> Result<Vec<String>> {
  let response = client
    .describe_regions()
    .send()
    .await
    .context("Unable to describe AWS regions")?;

  let regions: Vec<String> = response
    .regions()
    .iter()
    .filter_map(|region| region.region_name().map(str::to_owned))
    .collect();
  debug!("Found {} enabled regions", regions.len());

  Ok(regions)
}

pub async fn list_clusters(client: &EksClient) -> Result<Vec<String>> {
  let names = client.list_clusters().into_paginator().items().send().try_collect().await?;

  Ok(names)
}

/// Describe the cluster to get its full details
pub async fn get_cluster(client: &EksClient, name: &str) -> Result<Cluster> {
  let response = client
    .describe_cluster()
    .name(name)
    .send()
    .await
    .with_context(|| format!("Unable to describe cluster {name}"))?;

  response.cluster.context(format!("Cluster {name} not found"))
}

/// Describe every EKS managed node group of the cluster, in listing order
pub async fn get_nodegroups(client: &EksClient, cluster_name: &str) -> Result<Vec<Nodegroup>> {
  let nodegroup_names: Vec<String> = client
    .list_nodegroups()
    .cluster_name(cluster_name)
    .into_paginator()
    .items()
    .send()
    .try_collect()
    .await?;

  let mut nodegroups = Vec::new();

  for nodegroup_name in nodegroup_names {
    let response = client
      .describe_nodegroup()
      .cluster_name(cluster_name)
      .nodegroup_name(&nodegroup_name)
      .send()
      .await;

    match response {
      Ok(output) => nodegroups.extend(output.nodegroup),
      Err(err) => warn!("Unable to describe nodegroup {nodegroup_name} of cluster {cluster_name}: {err}"),
    }
  }

  Ok(nodegroups)
}
