use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{
  snapshot::{self, ClusterSnapshot},
  version::VersionToken,
};

/// Kind of compute that drifted from the control plane
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
  Nodegroup,
  Node,
}

impl fmt::Display for Component {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      Component::Nodegroup => write!(f, "Node group"),
      Component::Node => write!(f, "Node"),
    }
  }
}

/// Where the component sits relative to the control plane
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
  Behind,
  Ahead,
  /// Either version could not be parsed
  Unparsable,
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      Direction::Behind => write!(f, "Behind"),
      Direction::Ahead => write!(f, "Ahead"),
      Direction::Unparsable => write!(f, "Unparsable"),
    }
  }
}

/// A node group or node whose version disagrees with the control plane
#[derive(Clone, Debug, Serialize, Deserialize, Tabled)]
#[tabled(rename_all = "UpperCase")]
pub struct Drift {
  pub component: Component,
  pub name: String,
  #[tabled(rename = "VERSION")]
  pub version: VersionToken,
  #[tabled(rename = "CONTROL PLANE")]
  pub control_plane_version: VersionToken,
  pub direction: Direction,
}

/// Returns drift findings for the node groups and then the nodes of the cluster
///
/// Uses the same rule as [`snapshot::is_outdated`], so the result is empty exactly
/// when the cluster is not outdated
pub fn findings(snapshot: &ClusterSnapshot) -> Vec<Drift> {
  let control_plane = &snapshot.control_plane_version;

  let nodegroups = snapshot
    .nodegroups
    .iter()
    .map(|nodegroup| (Component::Nodegroup, &nodegroup.name, &nodegroup.version));
  let nodes = snapshot
    .nodes
    .iter()
    .map(|node| (Component::Node, &node.name, &node.version));

  nodegroups
    .chain(nodes)
    .filter_map(|(component, name, version)| {
      let direction = match snapshot::compare_to_control_plane(version, control_plane) {
        Ordering::Equal => return None,
        _ if !version.is_valid() || !control_plane.is_valid() => Direction::Unparsable,
        Ordering::Less => Direction::Behind,
        Ordering::Greater => Direction::Ahead,
      };

      Some(Drift {
        component,
        name: name.to_owned(),
        version: version.clone(),
        control_plane_version: control_plane.clone(),
        direction,
      })
    })
    .collect()
}
