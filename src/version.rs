use std::{cmp::Ordering, collections::HashMap, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A Kubernetes version as reported by the control plane, a node group or a kubelet
///
/// Parsing never fails: input that cannot be read as `major.minor[.patch]` becomes
/// an `Invalid` token that keeps the raw text for display and sorts below every
/// valid version
#[derive(Clone, Debug)]
pub enum VersionToken {
  Valid {
    raw: String,
    major: u64,
    minor: u64,
    patch: Option<u64>,
  },
  Invalid {
    raw: String,
  },
}

impl VersionToken {
  /// Parse a raw version string
  ///
  /// Accepted forms are `1.27`, `1.27.3`, a single leading label such as `v1.27.3`,
  /// and a trailing build suffix such as `v1.27.3-eks-a5565ad`. The suffix is kept
  /// in the raw text only and does not take part in ordering
  pub fn parse(raw: &str) -> Self {
    match parse_numeric(raw.trim()) {
      Some((major, minor, patch)) => VersionToken::Valid {
        raw: raw.to_owned(),
        major,
        minor,
        patch,
      },
      None => VersionToken::Invalid { raw: raw.to_owned() },
    }
  }

  pub fn raw(&self) -> &str {
    match self {
      VersionToken::Valid { raw, .. } | VersionToken::Invalid { raw } => raw,
    }
  }

  pub fn is_valid(&self) -> bool {
    matches!(self, VersionToken::Valid { .. })
  }

  /// Major component, `0` for an invalid token
  pub fn major(&self) -> u64 {
    match self {
      VersionToken::Valid { major, .. } => *major,
      VersionToken::Invalid { .. } => 0,
    }
  }

  /// Minor component, `0` for an invalid token
  pub fn minor(&self) -> u64 {
    match self {
      VersionToken::Valid { minor, .. } => *minor,
      VersionToken::Invalid { .. } => 0,
    }
  }

  pub fn patch(&self) -> Option<u64> {
    match self {
      VersionToken::Valid { patch, .. } => *patch,
      VersionToken::Invalid { .. } => None,
    }
  }

  /// The `major.minor` release this version belongs to
  ///
  /// For example, `v1.27.3-eks-a5565ad` returns `1.27`. Invalid tokens are returned unchanged
  pub fn release(&self) -> Self {
    match self {
      VersionToken::Valid { major, minor, .. } => VersionToken::Valid {
        raw: format!("{major}.{minor}"),
        major: *major,
        minor: *minor,
        patch: None,
      },
      VersionToken::Invalid { .. } => self.clone(),
    }
  }
}

/// Compare two versions; equivalent to `a.cmp(b)`
pub fn compare(a: &VersionToken, b: &VersionToken) -> Ordering {
  a.cmp(b)
}

impl Ord for VersionToken {
  fn cmp(&self, other: &Self) -> Ordering {
    match (self, other) {
      (
        VersionToken::Valid {
          major: a_major,
          minor: a_minor,
          patch: a_patch,
          ..
        },
        VersionToken::Valid {
          major: b_major,
          minor: b_minor,
          patch: b_patch,
          ..
        },
      ) => (a_major, a_minor, a_patch.unwrap_or(0)).cmp(&(b_major, b_minor, b_patch.unwrap_or(0))),
      (VersionToken::Invalid { .. }, VersionToken::Valid { .. }) => Ordering::Less,
      (VersionToken::Valid { .. }, VersionToken::Invalid { .. }) => Ordering::Greater,
      (VersionToken::Invalid { raw: a }, VersionToken::Invalid { raw: b }) => a.cmp(b),
    }
  }
}

impl PartialOrd for VersionToken {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for VersionToken {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for VersionToken {}

impl fmt::Display for VersionToken {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.raw())
  }
}

impl Serialize for VersionToken {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.raw())
  }
}

impl<'de> Deserialize<'de> for VersionToken {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(VersionToken::parse(&raw))
  }
}

fn parse_numeric(input: &str) -> Option<(u64, u64, Option<u64>)> {
  let start = input.find(|c: char| c.is_ascii_digit())?;
  let (label, rest) = input.split_at(start);
  if !is_label(label) {
    return None;
  }

  let core = match rest.find(['-', '+']) {
    Some(idx) => &rest[..idx],
    None => rest,
  };

  let mut parts = core.split('.');
  let major = parse_component(parts.next()?)?;
  let minor = parse_component(parts.next()?)?;
  let patch = match parts.next() {
    Some(part) => Some(parse_component(part)?),
    None => None,
  };
  if parts.next().is_some() {
    return None;
  }

  Some((major, minor, patch))
}

/// A prefix such as `v` or `eks.` ahead of the numeric version
fn is_label(label: &str) -> bool {
  if label.is_empty() {
    return true;
  }
  let body = label.strip_suffix(['.', '-', '_']).unwrap_or(label);
  !body.is_empty() && body.chars().all(|c| c.is_ascii_alphabetic())
}

fn parse_component(part: &str) -> Option<u64> {
  if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  part.parse().ok()
}

/// Memoizes parsed versions for a single collection run
///
/// Fleets report the same kubelet version for most nodes, so the collector keeps one
/// of these per run. It is owned by the caller and never shared with the comparison
/// or filtering code
#[derive(Debug, Default)]
pub struct VersionCache {
  tokens: HashMap<String, VersionToken>,
}

impl VersionCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn parse(&mut self, raw: &str) -> VersionToken {
    self
      .tokens
      .entry(raw.to_owned())
      .or_insert_with(|| VersionToken::parse(raw))
      .clone()
  }

  pub fn len(&self) -> usize {
    self.tokens.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tokens.is_empty()
  }
}
