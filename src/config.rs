use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::version::VersionToken;

/// Top-level configuration loaded from `.eks-versions.yaml` or an explicit path.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
  /// Regions to scan when `--region` is not given; empty scans every enabled region.
  #[serde(default)]
  pub regions: Vec<String>,

  /// Only query the EKS APIs; nodes and Fargate pods are not collected.
  #[serde(default)]
  pub skip_kubernetes: bool,

  #[serde(default)]
  pub filters: FiltersConfig,
}

/// Default filters, each overridden by the matching command line flag.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FiltersConfig {
  pub min_version: Option<VersionToken>,
  pub max_version: Option<VersionToken>,
  pub exact_version: Option<VersionToken>,
  #[serde(default)]
  pub outdated: bool,
}

const DEFAULT_CONFIG_FILE: &str = ".eks-versions.yaml";

/// Configuration from `--config`, else `.eks-versions.yaml` in the working directory, else defaults
pub fn load(path: Option<&str>) -> Result<Config> {
  load_from(path.map(Path::new), std::env::current_dir().ok().as_deref())
}

fn load_from(path: Option<&Path>, base_dir: Option<&Path>) -> Result<Config> {
  match (path, base_dir.map(|dir| dir.join(DEFAULT_CONFIG_FILE))) {
    (Some(path), _) => read_config(path),
    (None, Some(default_path)) if default_path.exists() => read_config(&default_path),
    _ => Ok(Config::default()),
  }
}

fn read_config(path: &Path) -> Result<Config> {
  let contents =
    fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

  serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse config file: {}", path.display()))
}
