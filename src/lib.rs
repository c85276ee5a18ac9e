pub mod clients;
pub mod collect;
pub mod config;
pub mod drift;
pub mod eks;
pub mod filter;
pub mod k8s;
pub mod output;
pub mod snapshot;
pub mod version;

use anstyle::{AnsiColor, Effects};
use anyhow::Result;
use clap::{Parser, builder::Styles};
use clap_verbosity_flag::Verbosity;
use tracing::{debug, info};

use crate::{
  clients::{RealAwsClients, RealK8sConnector},
  config::Config,
  filter::{FilterError, FilterSet},
  output::{Format, Report},
  version::VersionToken,
};

const EXAMPLES: &str = "\
Examples:
  # Show all clusters
  eks-versions

  # Show clusters in specific region
  eks-versions --region us-west-2

  # Show clusters running version 1.25 or newer
  eks-versions --min-version 1.25

  # Show clusters with version mismatches
  eks-versions --outdated

  # Output as YAML
  eks-versions --yaml";

fn styles() -> Styles {
  Styles::styled()
    .header(AnsiColor::Green.on_default() | Effects::BOLD)
    .usage(AnsiColor::Green.on_default() | Effects::BOLD)
    .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
    .placeholder(AnsiColor::Cyan.on_default())
}

/// Report Kubernetes versions of Amazon EKS control planes, node groups, nodes and Fargate pods across regions
#[derive(Parser, Debug)]
#[command(author, about, version)]
#[command(styles = styles(), after_help = EXAMPLES)]
pub struct Cli {
  /// Specific AWS region to check
  #[arg(short, long)]
  pub region: Option<String>,

  /// Specific cluster name to check (requires --region)
  #[arg(short, long)]
  pub cluster: Option<String>,

  /// Output in JSON format
  #[arg(long, conflicts_with = "yaml")]
  pub json: bool,

  /// Output in YAML format
  #[arg(long)]
  pub yaml: bool,

  /// Write to file instead of stdout
  #[arg(short, long)]
  pub output: Option<String>,

  /// Show only clusters with version >= specified (e.g., 1.24)
  #[arg(long, value_name = "VERSION", help_heading = "Version filtering")]
  pub min_version: Option<String>,

  /// Show only clusters with version <= specified (e.g., 1.27)
  #[arg(long, value_name = "VERSION", help_heading = "Version filtering")]
  pub max_version: Option<String>,

  /// Show only clusters matching exact version
  #[arg(long, value_name = "VERSION", help_heading = "Version filtering")]
  pub exact_version: Option<String>,

  /// Show only clusters where control plane and node versions mismatch
  #[arg(long, help_heading = "Version filtering")]
  pub outdated: bool,

  /// Path to a configuration file; defaults to .eks-versions.yaml when present
  #[arg(long)]
  pub config: Option<String>,

  /// Only query the EKS APIs, without listing nodes and Fargate pods from the cluster
  #[arg(long)]
  pub skip_kubernetes: bool,

  /// Enable debug output
  #[arg(long)]
  pub debug: bool,

  #[clap(flatten)]
  pub verbose: Verbosity,
}

impl Cli {
  pub fn format(&self) -> Format {
    Format::from_flags(self.json, self.yaml)
  }

  /// Merge command line filters over the configured defaults
  pub fn filter_set(&self, config: &Config) -> Result<FilterSet, FilterError> {
    let configured = &config.filters;
    let mut filters = FilterSet::from_bounds(
      self.min_version.as_deref().or(configured.min_version.as_ref().map(VersionToken::raw)),
      self.max_version.as_deref().or(configured.max_version.as_ref().map(VersionToken::raw)),
      self.exact_version.as_deref().or(configured.exact_version.as_ref().map(VersionToken::raw)),
    )?;

    filters.outdated_only = self.outdated || config.filters.outdated;
    filters.region = self.region.clone();
    filters.cluster_name = self.cluster.clone();

    Ok(filters)
  }
}

/// Regions to scan: the `--region` flag, the configured regions, or every enabled region
async fn resolve_regions(region: Option<&str>, configured: &[String]) -> Result<Vec<String>> {
  if let Some(region) = region {
    return Ok(vec![region.to_owned()]);
  }
  if !configured.is_empty() {
    return Ok(configured.to_vec());
  }

  let aws_config = eks::get_config(None).await;
  let ec2_client = aws_sdk_ec2::Client::new(&aws_config);
  eks::list_regions(&ec2_client).await
}

/// Collect, filter and render the audit
pub async fn audit(cli: &Cli) -> Result<()> {
  let config = config::load(cli.config.as_deref())?;

  // All checks and validations on input should happen above/before collecting from AWS
  let filters = cli.filter_set(&config)?;
  filters.validate()?;

  let regions = resolve_regions(cli.region.as_deref(), &config.regions).await?;
  debug!("Scanning regions: {}", regions.join(", "));

  let connector = (!(cli.skip_kubernetes || config.skip_kubernetes)).then_some(RealK8sConnector);
  let snapshots = collect::collect_regions(
    &regions,
    |region| async move { RealAwsClients::new(&eks::get_config(Some(&region)).await) },
    connector.as_ref(),
    cli.cluster.as_deref(),
  )
  .await;
  info!("Collected {} clusters across {} regions", snapshots.len(), regions.len());

  let matched = filter::evaluate(snapshots, &filters)?;
  let report = Report::new(&regions, matched);
  output::output(&report, cli.format(), cli.output.as_deref(), cli.debug)?;

  Ok(())
}
