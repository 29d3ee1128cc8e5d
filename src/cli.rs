//! CLI interface for cloudcost
//!
//! This module defines the command-line interface using clap. Global flags
//! select the snapshot, the rate catalog, and the output format; each
//! subcommand runs one report against the loaded snapshot.
//!
//! # Example
//!
//! ```bash
//! # Cost summary for January 2024
//! cloudcost summary --since 2024-01-01 --until 2024-01-31
//!
//! # High severity recommendations as JSON
//! cloudcost recommendations --severity high --json
//!
//! # Full analysis of one region with a 10% idle threshold
//! cloudcost analyze --region us-east-1 --cpu-threshold 10
//!
//! # Serve the HTTP API
//! cloudcost serve --port 8000
//! ```

use clap::{Args, Parser, Subcommand};
use cloudcost_core::types::{RecommendationType, ResourceType, Severity};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Summarize cloud costs and find savings in resource snapshots
#[derive(Parser, Debug, Clone)]
#[command(name = "cloudcost")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Snapshot file or directory of snapshot files
    #[arg(long, env = "CLOUDCOST_SNAPSHOT", global = true)]
    pub snapshot: Option<PathBuf>,

    /// Rate catalog file or URL (defaults to the user config, then the embedded catalog)
    #[arg(long, env = "CLOUDCOST_RATES", global = true)]
    pub rates: Option<String>,

    /// Never fetch rate catalogs over the network
    #[arg(long, global = true)]
    pub offline: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Only show warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// CPU utilization percentage below which a running instance is idle
    #[arg(long, global = true)]
    pub cpu_threshold: Option<f64>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Arguments for the costs report
#[derive(Args, Debug, Clone, Default)]
pub struct CostsArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,

    /// Last day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,

    /// Only records in this region
    #[arg(long)]
    pub region: Option<String>,

    /// Only records for this service (case-insensitive)
    #[arg(long)]
    pub service: Option<String>,
}

/// Arguments for the cost summary
#[derive(Args, Debug, Clone, Default)]
pub struct SummaryArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,

    /// Last day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,
}

/// Arguments for the resource listing
#[derive(Args, Debug, Clone, Default)]
pub struct ResourcesArgs {
    /// Only this resource type (ec2 or ebs)
    #[arg(long = "type")]
    pub resource_type: Option<ResourceType>,

    #[arg(long)]
    pub region: Option<String>,

    /// Instance or volume state, e.g. running or available
    #[arg(long)]
    pub state: Option<String>,

    /// Only instances with this idle flag
    #[arg(long)]
    pub idle: Option<bool>,

    /// Only volumes with this attachment flag
    #[arg(long)]
    pub attached: Option<bool>,
}

/// Arguments for the inventory scan
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Region to include (repeatable, default all)
    #[arg(long = "region")]
    pub regions: Vec<String>,

    /// Resource type to count, EC2 or EBS (repeatable, default both)
    #[arg(long = "resource-type")]
    pub resource_types: Vec<String>,
}

/// Arguments for the recommendations report
#[derive(Args, Debug, Clone, Default)]
pub struct RecommendationsArgs {
    #[arg(long)]
    pub severity: Option<Severity>,

    /// IDLE_INSTANCE or UNATTACHED_VOLUME
    #[arg(long)]
    pub recommendation_type: Option<RecommendationType>,

    #[arg(long)]
    pub region: Option<String>,

    /// Only recommendations saving at least this much per month
    #[arg(long)]
    pub min_savings: Option<Decimal>,
}

/// Arguments for the idle instance report
#[derive(Args, Debug, Clone, Default)]
pub struct IdleArgs {
    #[arg(long)]
    pub region: Option<String>,
}

/// Arguments for the unattached volume report
#[derive(Args, Debug, Clone, Default)]
pub struct VolumesArgs {
    #[arg(long)]
    pub region: Option<String>,

    /// Only volumes of at least this many GB
    #[arg(long)]
    pub min_size: Option<i64>,
}

/// Arguments for the full analysis
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Region to analyze (repeatable, default all)
    #[arg(long = "region")]
    pub regions: Vec<String>,

    /// Skip the cost breakdown
    #[arg(long)]
    pub no_cost_data: bool,

    /// Days of cost history to include, ending today
    #[arg(long, default_value_t = cloudcost_analysis::DEFAULT_LOOKBACK_DAYS)]
    pub lookback_days: u32,
}

/// Arguments for the HTTP server
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1", env = "CLOUDCOST_HOST")]
    pub host: String,

    #[arg(long, default_value_t = 8000, env = "CLOUDCOST_PORT")]
    pub port: u16,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List cost records with a per-service breakdown
    Costs(CostsArgs),

    /// Summarize costs by service and region
    Summary(SummaryArgs),

    /// List EC2 instances and EBS volumes
    Resources(ResourcesArgs),

    /// Count resources by region and type
    Scan(ScanArgs),

    /// Show cost optimization recommendations
    Recommendations(RecommendationsArgs),

    /// Show idle EC2 instances
    Idle(IdleArgs),

    /// Show unattached EBS volumes
    Volumes(VolumesArgs),

    /// Show total potential savings
    Savings,

    /// Run a full analysis
    Analyze(AnalyzeArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parsing() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "cloudcost",
            "idle",
            "--region",
            "us-east-1",
            "--cpu-threshold",
            "10",
            "--json",
        ]);
        assert!(cli.json);
        assert_eq!(cli.cpu_threshold, Some(10.0));
        match cli.command {
            Command::Idle(args) => assert_eq!(args.region.as_deref(), Some("us-east-1")),
            _ => panic!("Expected Idle command"),
        }
    }

    #[test]
    fn test_resources_filters() {
        let cli = Cli::parse_from([
            "cloudcost",
            "resources",
            "--type",
            "EBS",
            "--attached",
            "false",
        ]);
        match cli.command {
            Command::Resources(args) => {
                assert_eq!(args.resource_type, Some(ResourceType::Ebs));
                assert_eq!(args.attached, Some(false));
                assert!(args.idle.is_none());
            }
            _ => panic!("Expected Resources command"),
        }

        assert!(Cli::try_parse_from(["cloudcost", "resources", "--type", "rds"]).is_err());
    }

    #[test]
    fn test_recommendations_filters() {
        let cli = Cli::parse_from([
            "cloudcost",
            "recommendations",
            "--severity",
            "critical",
            "--min-savings",
            "25.50",
        ]);
        match cli.command {
            Command::Recommendations(args) => {
                assert_eq!(args.severity, Some(Severity::Critical));
                assert_eq!(args.min_savings, Some(Decimal::new(2550, 2)));
            }
            _ => panic!("Expected Recommendations command"),
        }
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::parse_from(["cloudcost", "analyze", "--region", "a", "--region", "b"]);
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.regions, vec!["a", "b"]);
                assert!(!args.no_cost_data);
                assert_eq!(args.lookback_days, 30);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::parse_from(["cloudcost", "serve"]);
        match cli.command {
            Command::Serve(args) => assert_eq!(args.port, 8000),
            _ => panic!("Expected Serve command"),
        }
    }
}
