use std::cmp::Ordering;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  snapshot::{self, ClusterSnapshot},
  version::VersionToken,
};

/// Filter input that is rejected before any snapshot is evaluated
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
  #[error("--cluster requires --region to be specified")]
  ClusterWithoutRegion,

  #[error("Invalid version '{raw}' for --{flag}, expected 'X.Y[.Z]'")]
  MalformedVersion { flag: &'static str, raw: String },
}

/// Predicates used to narrow the audited clusters
///
/// All set predicates must hold for a cluster to be kept. An empty set keeps everything
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSet {
  /// Keep clusters whose control plane is at or above this version
  pub min_version: Option<VersionToken>,
  /// Keep clusters whose control plane is at or below this version
  pub max_version: Option<VersionToken>,
  /// Keep clusters whose control plane equals this version; `min_version` and
  /// `max_version` are ignored when set
  pub exact_version: Option<VersionToken>,
  /// Keep clusters where compute disagrees with the control plane
  pub outdated_only: bool,
  pub region: Option<String>,
  /// Requires `region`, cluster names are only unique within a region
  pub cluster_name: Option<String>,
}

impl FilterSet {
  /// Build the version predicates from user supplied strings
  pub fn from_bounds(min: Option<&str>, max: Option<&str>, exact: Option<&str>) -> Result<Self, FilterError> {
    Ok(Self {
      min_version: parse_bound("min-version", min)?,
      max_version: parse_bound("max-version", max)?,
      exact_version: parse_bound("exact-version", exact)?,
      ..Self::default()
    })
  }

  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  /// Reject filter sets that cannot be applied unambiguously
  ///
  /// Version bounds are never rejected here: an inverted range or an unparsable bound
  /// is applied through the total version ordering and may simply match nothing
  pub fn validate(&self) -> Result<(), FilterError> {
    if self.cluster_name.is_some() && self.region.is_none() {
      return Err(FilterError::ClusterWithoutRegion);
    }

    if self.exact_version.is_some() {
      if self.min_version.is_some() || self.max_version.is_some() {
        warn!("--exact-version is set, ignoring --min-version and --max-version");
      }
    } else if let (Some(min), Some(max)) = (&self.min_version, &self.max_version)
      && min > max
    {
      warn!("--min-version {min} is greater than --max-version {max}, no cluster can match");
    }

    Ok(())
  }

  /// Returns true when the snapshot satisfies every predicate in the set
  ///
  /// Location filters are checked first, then the control plane version, then drift
  pub fn matches(&self, snapshot: &ClusterSnapshot) -> bool {
    if let Some(region) = &self.region
      && snapshot.region != *region
    {
      return false;
    }
    if let Some(name) = &self.cluster_name
      && snapshot.name != *name
    {
      return false;
    }

    let version = &snapshot.control_plane_version;
    match &self.exact_version {
      Some(exact) => {
        if version.cmp(exact) != Ordering::Equal {
          return false;
        }
      }
      None => {
        if let Some(min) = &self.min_version
          && version.cmp(min) == Ordering::Less
        {
          return false;
        }
        if let Some(max) = &self.max_version
          && version.cmp(max) == Ordering::Greater
        {
          return false;
        }
      }
    }

    !self.outdated_only || snapshot::is_outdated(snapshot)
  }
}

fn parse_bound(flag: &'static str, raw: Option<&str>) -> Result<Option<VersionToken>, FilterError> {
  match raw {
    Some(raw) => {
      let token = VersionToken::parse(raw);
      if !token.is_valid() {
        return Err(FilterError::MalformedVersion {
          flag,
          raw: raw.to_owned(),
        });
      }
      Ok(Some(token))
    }
    None => Ok(None),
  }
}

/// Keep the snapshots matching the filter set, preserving their order
///
/// The filter set is validated first; on error no snapshot is evaluated
pub fn evaluate(snapshots: Vec<ClusterSnapshot>, filters: &FilterSet) -> Result<Vec<ClusterSnapshot>, FilterError> {
  filters.validate()?;

  if filters.is_empty() {
    return Ok(snapshots);
  }

  let total = snapshots.len();
  let kept: Vec<ClusterSnapshot> = snapshots.into_iter().filter(|s| filters.matches(s)).collect();
  debug!("{} of {total} clusters matched the filters", kept.len());

  Ok(kept)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::snapshot::NodeGroupInfo;

  fn v(raw: &str) -> VersionToken {
    VersionToken::parse(raw)
  }

  fn cluster(name: &str, region: &str, version: &str) -> ClusterSnapshot {
    ClusterSnapshot::new(name, region, v(version))
  }

  fn fleet() -> Vec<ClusterSnapshot> {
    vec![
      cluster("a", "us-east-1", "1.24"),
      cluster("b", "us-east-1", "1.25"),
      cluster("c", "us-west-2", "1.27"),
    ]
  }

  fn names(snapshots: &[ClusterSnapshot]) -> Vec<&str> {
    snapshots.iter().map(|s| s.name.as_str()).collect()
  }

  fn assert_send_sync<T: Send + Sync>() {}

  #[test]
  fn filter_inputs_are_thread_safe() {
    assert_send_sync::<VersionToken>();
    assert_send_sync::<ClusterSnapshot>();
    assert_send_sync::<FilterSet>();
    assert_send_sync::<FilterError>();
  }

  #[test]
  fn evaluate_from_many_threads() {
    let snapshots = fleet();
    let filters = FilterSet::from_bounds(Some("1.25"), None, None).unwrap();

    std::thread::scope(|scope| {
      let handles: Vec<_> = (0..4)
        .map(|_| scope.spawn(|| evaluate(snapshots.clone(), &filters).unwrap()))
        .collect();
      for handle in handles {
        assert_eq!(names(&handle.join().unwrap()), vec!["b", "c"]);
      }
    });
  }

  #[test]
  fn empty_filter_set_is_identity() {
    let filters = FilterSet::default();
    assert!(filters.is_empty());
    let result = evaluate(fleet(), &filters).unwrap();
    assert_eq!(result, fleet());
  }

  #[test]
  fn min_and_max_compose() {
    let filters = FilterSet::from_bounds(Some("1.25"), Some("1.27"), None).unwrap();
    let result = evaluate(fleet(), &filters).unwrap();
    assert_eq!(names(&result), vec!["b", "c"]);
  }

  #[test]
  fn min_only() {
    let filters = FilterSet::from_bounds(Some("1.25"), None, None).unwrap();
    assert_eq!(names(&evaluate(fleet(), &filters).unwrap()), vec!["b", "c"]);
  }

  #[test]
  fn max_only() {
    let filters = FilterSet::from_bounds(None, Some("1.25"), None).unwrap();
    assert_eq!(names(&evaluate(fleet(), &filters).unwrap()), vec!["a", "b"]);
  }

  #[test]
  fn exact_takes_precedence() {
    let filters = FilterSet::from_bounds(Some("1.27"), None, Some("1.25")).unwrap();
    assert_eq!(names(&evaluate(fleet(), &filters).unwrap()), vec!["b"]);
  }

  #[test]
  fn exact_with_patch_tolerance() {
    let mut snapshots = fleet();
    snapshots.push(cluster("d", "eu-west-1", "1.25.0"));
    let filters = FilterSet::from_bounds(None, None, Some("1.25")).unwrap();
    assert_eq!(names(&evaluate(snapshots, &filters).unwrap()), vec!["b", "d"]);
  }

  #[test]
  fn exact_ignores_inverted_range() {
    let filters = FilterSet::from_bounds(Some("1.30"), Some("1.20"), Some("1.24")).unwrap();
    assert_eq!(names(&evaluate(fleet(), &filters).unwrap()), vec!["a"]);
  }

  #[test]
  fn outdated_only() {
    let mut snapshots = fleet();
    snapshots[1].nodegroups.push(NodeGroupInfo::new("ng-1", v("1.24"), "ACTIVE"));
    snapshots[2].nodegroups.push(NodeGroupInfo::new("ng-1", v("1.27"), "ACTIVE"));

    let filters = FilterSet {
      outdated_only: true,
      ..Default::default()
    };
    assert_eq!(names(&evaluate(snapshots, &filters).unwrap()), vec!["b"]);
  }

  #[test]
  fn outdated_and_version_combine() {
    let mut snapshots = fleet();
    snapshots[0].nodegroups.push(NodeGroupInfo::new("ng-1", v("1.23"), "ACTIVE"));
    snapshots[1].nodegroups.push(NodeGroupInfo::new("ng-1", v("1.24"), "ACTIVE"));

    let mut filters = FilterSet::from_bounds(Some("1.25"), None, None).unwrap();
    filters.outdated_only = true;
    assert_eq!(names(&evaluate(snapshots, &filters).unwrap()), vec!["b"]);
  }

  #[test]
  fn region_and_cluster() {
    let filters = FilterSet {
      region: Some("us-east-1".to_owned()),
      ..Default::default()
    };
    assert_eq!(names(&evaluate(fleet(), &filters).unwrap()), vec!["a", "b"]);

    let filters = FilterSet {
      region: Some("us-east-1".to_owned()),
      cluster_name: Some("b".to_owned()),
      ..Default::default()
    };
    assert_eq!(names(&evaluate(fleet(), &filters).unwrap()), vec!["b"]);
  }

  #[test]
  fn cluster_without_region_rejected() {
    let filters = FilterSet {
      cluster_name: Some("b".to_owned()),
      ..Default::default()
    };
    assert_eq!(evaluate(fleet(), &filters), Err(FilterError::ClusterWithoutRegion));
  }

  #[test]
  fn malformed_bound_rejected() {
    let result = FilterSet::from_bounds(Some("latest"), None, None);
    assert_eq!(
      result,
      Err(FilterError::MalformedVersion {
        flag: "min-version",
        raw: "latest".to_owned()
      })
    );
  }

  #[test]
  fn inverted_range_matches_nothing() {
    let filters = FilterSet::from_bounds(Some("1.28"), Some("1.25"), None).unwrap();
    assert!(filters.validate().is_ok());
    assert!(evaluate(fleet(), &filters).unwrap().is_empty());
  }

  #[test]
  fn exact_ignores_unparsable_bounds() {
    let filters = FilterSet {
      exact_version: Some(v("1.27")),
      min_version: Some(v("garbage")),
      max_version: Some(v("bogus")),
      ..Default::default()
    };
    assert_eq!(names(&evaluate(fleet(), &filters).unwrap()), vec!["c"]);
  }

  #[test]
  fn unparsable_bounds_use_version_ordering() {
    // Invalid tokens sort below valid ones and compare by raw text among themselves
    let snapshots = vec![cluster("bad", "us-east-1", "broken"), cluster("ok", "us-east-1", "1.27")];

    let filters = FilterSet {
      min_version: Some(v("garbage")),
      ..Default::default()
    };
    assert_eq!(names(&evaluate(snapshots.clone(), &filters).unwrap()), vec!["ok"]);

    let filters = FilterSet {
      max_version: Some(v("garbage")),
      ..Default::default()
    };
    assert_eq!(names(&evaluate(snapshots.clone(), &filters).unwrap()), vec!["bad"]);

    let filters = FilterSet {
      exact_version: Some(v("garbage")),
      ..Default::default()
    };
    assert!(evaluate(snapshots, &filters).unwrap().is_empty());
  }

  #[test]
  fn no_match_is_empty_not_error() {
    let filters = FilterSet::from_bounds(None, None, Some("1.30")).unwrap();
    assert!(evaluate(fleet(), &filters).unwrap().is_empty());
  }

  #[test]
  fn evaluate_is_idempotent() {
    let mut snapshots = fleet();
    snapshots[2].nodegroups.push(NodeGroupInfo::new("ng-1", v("1.26"), "ACTIVE"));

    let filter_sets = vec![
      FilterSet::default(),
      FilterSet::from_bounds(Some("1.25"), Some("1.27"), None).unwrap(),
      FilterSet::from_bounds(Some("1.27"), None, Some("1.25")).unwrap(),
      FilterSet {
        outdated_only: true,
        ..Default::default()
      },
      FilterSet {
        region: Some("us-west-2".to_owned()),
        ..Default::default()
      },
    ];

    for filters in filter_sets {
      let once = evaluate(snapshots.clone(), &filters).unwrap();
      let twice = evaluate(once.clone(), &filters).unwrap();
      assert_eq!(once, twice, "{filters:?}");
    }
  }

  #[test]
  fn malformed_control_plane_below_min() {
    let snapshots = vec![cluster("bad", "us-east-1", "unknown"), cluster("ok", "us-east-1", "1.27")];
    let filters = FilterSet::from_bounds(Some("1.0"), None, None).unwrap();
    assert_eq!(names(&evaluate(snapshots.clone(), &filters).unwrap()), vec!["ok"]);

    let filters = FilterSet::from_bounds(None, Some("1.26"), None).unwrap();
    assert_eq!(names(&evaluate(snapshots, &filters).unwrap()), vec!["bad"]);
  }
}
