use std::{collections::BTreeMap, fmt::Write as _, fs::File, io::prelude::*};

use anyhow::Result;
use serde::{Serialize, Serializer};
use tabled::{
  Table, Tabled,
  settings::{Margin, Style},
};

use crate::{
  drift,
  snapshot::{ClusterSnapshot, NodeGroupInfo, NodeInfo, PodInfo},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
  /// JSON format used for logging or writing to a *.json file
  Json,
  /// YAML format
  Yaml,
  /// Text format used for writing to stdout
  #[default]
  Text,
}

impl Format {
  pub fn from_flags(json: bool, yaml: bool) -> Self {
    match (json, yaml) {
      (true, _) => Format::Json,
      (_, true) => Format::Yaml,
      _ => Format::Text,
    }
  }
}

/// Audited clusters grouped by region
///
/// Every scanned region is present, including regions where nothing matched
#[derive(Debug, Default)]
pub struct Report {
  regions: BTreeMap<String, Vec<ClusterSnapshot>>,
}

impl Report {
  pub fn new(regions: &[String], snapshots: Vec<ClusterSnapshot>) -> Self {
    let mut grouped: BTreeMap<String, Vec<ClusterSnapshot>> =
      regions.iter().map(|region| (region.to_owned(), Vec::new())).collect();

    for snapshot in snapshots {
      grouped.entry(snapshot.region.clone()).or_default().push(snapshot);
    }

    Self { regions: grouped }
  }

  pub fn clusters(&self, region: &str) -> &[ClusterSnapshot] {
    self.regions.get(region).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn total(&self) -> usize {
    self.regions.values().map(Vec::len).sum()
  }

  /// Human readable report
  ///
  /// Regions without clusters are only listed when `show_empty` is set
  pub fn to_stdout_text(&self, show_empty: bool) -> Result<String> {
    let mut output = String::new();

    for (region, clusters) in &self.regions {
      if clusters.is_empty() {
        if show_empty {
          writeln!(output, "\nNo matching clusters found in region: {region}")?;
        }
        continue;
      }

      writeln!(output, "\nRegion: {region}")?;
      writeln!(output, "Number of clusters: {}", clusters.len())?;

      for cluster in clusters {
        write_cluster(&mut output, cluster)?;
      }
    }

    Ok(output)
  }
}

impl Serialize for Report {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let view: BTreeMap<&str, RegionView> = self
      .regions
      .iter()
      .map(|(region, clusters)| {
        let clusters = clusters.iter().map(ClusterView::from).collect();
        (region.as_str(), RegionView { clusters })
      })
      .collect();

    view.serialize(serializer)
  }
}

#[derive(Serialize)]
struct RegionView<'a> {
  clusters: Vec<ClusterView<'a>>,
}

#[derive(Serialize)]
struct ClusterView<'a> {
  name: &'a str,
  control_plane: ControlPlaneView<'a>,
  outdated: bool,
  tags: &'a BTreeMap<String, String>,
  compute: ComputeView<'a>,
}

#[derive(Serialize)]
struct ControlPlaneView<'a> {
  version: String,
  status: &'a str,
  platform_version: &'a str,
  endpoint: Option<&'a str>,
}

#[derive(Serialize)]
struct ComputeView<'a> {
  managed_nodegroups: &'a [NodeGroupInfo],
  nodes: &'a [NodeInfo],
  fargate: FargateView<'a>,
}

#[derive(Serialize)]
struct FargateView<'a> {
  pods: &'a [PodInfo],
}

impl<'a> From<&'a ClusterSnapshot> for ClusterView<'a> {
  fn from(snapshot: &'a ClusterSnapshot) -> Self {
    ClusterView {
      name: &snapshot.name,
      control_plane: ControlPlaneView {
        version: snapshot.control_plane_version.to_string(),
        status: &snapshot.control_plane_status,
        platform_version: &snapshot.platform_version,
        endpoint: snapshot.endpoint.as_deref(),
      },
      outdated: snapshot.is_outdated(),
      tags: &snapshot.tags,
      compute: ComputeView {
        managed_nodegroups: &snapshot.nodegroups,
        nodes: &snapshot.nodes,
        fargate: FargateView {
          pods: &snapshot.fargate_pods,
        },
      },
    }
  }
}

#[derive(Tabled)]
#[tabled(rename_all = "UpperCase")]
struct NodegroupRow {
  name: String,
  status: String,
  #[tabled(rename = "K8S VERSION")]
  version: String,
  #[tabled(rename = "INSTANCE TYPES")]
  instance_types: String,
  #[tabled(rename = "DESIRED/MIN/MAX")]
  scaling: String,
}

impl From<&NodeGroupInfo> for NodegroupRow {
  fn from(nodegroup: &NodeGroupInfo) -> Self {
    NodegroupRow {
      name: nodegroup.name.to_owned(),
      status: nodegroup.status.to_owned(),
      version: nodegroup.version.to_string(),
      instance_types: tabled_vec_to_string(&nodegroup.instance_types),
      scaling: match nodegroup.scaling {
        Some(s) => format!("{}/{}/{}", s.desired, s.min, s.max),
        None => "N/A".to_owned(),
      },
    }
  }
}

#[derive(Tabled)]
#[tabled(rename_all = "UpperCase")]
struct NodeRow {
  name: String,
  status: String,
  #[tabled(rename = "INSTANCE TYPE")]
  instance_type: String,
  #[tabled(rename = "K8S VERSION")]
  version: String,
}

impl From<&NodeInfo> for NodeRow {
  fn from(node: &NodeInfo) -> Self {
    NodeRow {
      name: node.name.to_owned(),
      status: node.status.to_owned(),
      instance_type: node.instance_type.clone().unwrap_or_else(|| "N/A".to_owned()),
      version: node.version.to_string(),
    }
  }
}

#[derive(Tabled)]
#[tabled(rename_all = "UpperCase")]
struct PodRow {
  name: String,
  namespace: String,
  status: String,
  #[tabled(rename = "K8S VERSION")]
  version: String,
}

impl From<&PodInfo> for PodRow {
  fn from(pod: &PodInfo) -> Self {
    PodRow {
      name: pod.name.to_owned(),
      namespace: pod.namespace.to_owned(),
      status: pod.status.to_owned(),
      version: pod
        .version
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "N/A".to_owned()),
    }
  }
}

/// Converts vec into comma separated string for tabled output
fn tabled_vec_to_string(v: &[String]) -> String {
  v.join(", ")
}

fn to_table<T: Tabled>(rows: Vec<T>) -> String {
  let mut table = Table::new(rows);
  table.with(Style::sharp()).with(Margin::new(4, 0, 0, 0));

  table.to_string()
}

fn write_cluster(output: &mut String, cluster: &ClusterSnapshot) -> std::fmt::Result {
  writeln!(output, "\n  Cluster: {}", cluster.name)?;
  writeln!(output, "  Control Plane:")?;
  writeln!(output, "    Version: {}", cluster.control_plane_version)?;
  writeln!(output, "    Status: {}", cluster.control_plane_status)?;
  writeln!(output, "    Platform Version: {}", cluster.platform_version)?;

  if !cluster.tags.is_empty() {
    writeln!(output, "\n  Tags:")?;
    for (key, value) in &cluster.tags {
      writeln!(output, "    {key}: {value}")?;
    }
  }

  if cluster.nodegroups.is_empty() {
    writeln!(output, "\n  No EKS managed nodegroups found")?;
  } else {
    writeln!(output, "\n  EKS Managed Nodegroups:")?;
    writeln!(output, "{}", to_table(cluster.nodegroups.iter().map(NodegroupRow::from).collect()))?;
  }

  if cluster.nodes.is_empty() {
    writeln!(output, "\n  No Kubernetes nodes found")?;
  } else {
    writeln!(output, "\n  Kubernetes Nodes:")?;
    writeln!(output, "{}", to_table(cluster.nodes.iter().map(NodeRow::from).collect()))?;
  }

  if cluster.fargate_pods.is_empty() {
    writeln!(output, "\n  No Fargate pods found")?;
  } else {
    writeln!(output, "\n  Fargate Pods:")?;
    writeln!(output, "{}", to_table(cluster.fargate_pods.iter().map(PodRow::from).collect()))?;
  }

  let findings = drift::findings(cluster);
  if findings.is_empty() {
    writeln!(output, "\n  ✅ - Node groups and nodes match the control plane version")?;
  } else {
    writeln!(output, "\n  Version Drift:")?;
    writeln!(output, "{}", to_table(findings))?;
  }

  Ok(())
}

pub fn render(report: &Report, format: Format, show_empty: bool) -> Result<String> {
  let rendered = match format {
    Format::Json => serde_json::to_string_pretty(report)?,
    Format::Yaml => serde_yaml::to_string(report)?,
    Format::Text => report.to_stdout_text(show_empty)?,
  };

  Ok(rendered)
}

pub fn output(report: &Report, format: Format, filename: Option<&str>, show_empty: bool) -> Result<()> {
  let output = render(report, format, show_empty)?;

  match filename {
    Some(filename) => {
      let mut file = File::create(filename)?;
      file.write_all(output.as_bytes())?;
    }
    None => {
      println!("{output}");
    }
  }

  Ok(())
}
