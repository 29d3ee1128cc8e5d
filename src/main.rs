//! cloudcost - Summarize cloud costs and find savings in resource snapshots

use chrono::Utc;
use cloudcost::cli::{Cli, Command};
use cloudcost_analysis::{AnalysisRequest, Analyzer, RecommendationFilter, ScanRequest};
use cloudcost_api::AppState;
use cloudcost_core::error::{CloudcostError, Result};
use cloudcost_core::filters::{CostFilter, ResourceFilter, parse_optional_date};
use cloudcost_core::{Snapshot, SnapshotSource};
use cloudcost_pricing::{CostCalculator, RateLoader, RateSource};
use cloudcost_provider_file::FileSnapshotLoader;
use cloudcost_terminal::get_formatter;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Resolve and load the rate catalog, then build the analyzer on it
async fn create_analyzer(cli: &Cli) -> Result<Analyzer> {
    let source = RateSource::resolve(cli.rates.as_deref());
    info!("Using rates from {source}");
    let catalog = RateLoader::new(cli.offline).load(&source).await?;
    let analyzer = Analyzer::new(CostCalculator::new(Arc::new(catalog)));

    match cli.cpu_threshold {
        Some(threshold) => analyzer.with_cpu_threshold(threshold),
        None => Ok(analyzer),
    }
}

/// Snapshot loader whose idle flags follow the analyzer's threshold
fn create_loader(cli: &Cli, analyzer: &Analyzer) -> Result<FileSnapshotLoader> {
    Ok(FileSnapshotLoader::from_path_or_default(cli.snapshot.clone())?
        .with_idle_threshold(analyzer.cpu_threshold()))
}

async fn load_snapshot(cli: &Cli, analyzer: &Analyzer) -> Result<Snapshot> {
    create_loader(cli, analyzer)?.load().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // --quiet overrides RUST_LOG
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cloudcost=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if !is_terminal::is_terminal(std::io::stdout()) {
        colored::control::set_override(false);
    }

    let analyzer = create_analyzer(&cli).await?;
    let formatter = get_formatter(cli.json);

    match &cli.command {
        Command::Costs(args) => {
            info!("Running cost report");
            let mut filter = CostFilter::new();
            if let Some(since) = parse_optional_date("since", args.since.as_deref())? {
                filter = filter.with_start_date(since);
            }
            if let Some(until) = parse_optional_date("until", args.until.as_deref())? {
                filter = filter.with_end_date(until);
            }
            if let Some(region) = &args.region {
                filter = filter.with_region(region.clone());
            }
            if let Some(service) = &args.service {
                filter = filter.with_service_name(service.clone());
            }

            let snapshot = load_snapshot(&cli, &analyzer).await?;
            let report = analyzer.costs(&snapshot, &filter)?;
            println!("{}", formatter.format_costs(&report));
        }

        Command::Summary(args) => {
            info!("Running cost summary");
            let since = parse_optional_date("since", args.since.as_deref())?;
            let until = parse_optional_date("until", args.until.as_deref())?;

            let snapshot = load_snapshot(&cli, &analyzer).await?;
            let summary = analyzer.cost_summary(&snapshot, since, until)?;
            println!("{}", formatter.format_summary(&summary));
        }

        Command::Resources(args) => {
            let filter = ResourceFilter {
                resource_type: args.resource_type,
                region: args.region.clone(),
                state: args.state.clone(),
                is_idle: args.idle,
                is_attached: args.attached,
            };

            let snapshot = load_snapshot(&cli, &analyzer).await?;
            let listing = analyzer.resources(&snapshot, &filter);
            println!("{}", formatter.format_resources(&listing));
        }

        Command::Scan(args) => {
            let request = ScanRequest {
                regions: args.regions.clone(),
                resource_types: (!args.resource_types.is_empty())
                    .then(|| args.resource_types.clone()),
            };

            let snapshot = load_snapshot(&cli, &analyzer).await?;
            let report = analyzer.scan(&snapshot, &request, Utc::now())?;
            println!("{}", formatter.format_scan(&report));
        }

        Command::Recommendations(args) => {
            let filter = RecommendationFilter {
                severity: args.severity,
                recommendation_type: args.recommendation_type,
                region: args.region.clone(),
                min_savings: args.min_savings,
            };

            let snapshot = load_snapshot(&cli, &analyzer).await?;
            let set = analyzer.recommendations(&snapshot, &filter, Utc::now())?;
            println!("{}", formatter.format_recommendations(&set));
        }

        Command::Idle(args) => {
            let snapshot = load_snapshot(&cli, &analyzer).await?;
            let report = analyzer.idle_instances(&snapshot, None, args.region.as_deref())?;
            println!("{}", formatter.format_idle_instances(&report));
        }

        Command::Volumes(args) => {
            let snapshot = load_snapshot(&cli, &analyzer).await?;
            let report =
                analyzer.unattached_volumes(&snapshot, args.min_size, args.region.as_deref())?;
            println!("{}", formatter.format_unattached_volumes(&report));
        }

        Command::Savings => {
            let snapshot = load_snapshot(&cli, &analyzer).await?;
            let summary = analyzer.savings(&snapshot, Utc::now())?;
            println!("{}", formatter.format_savings(&summary));
        }

        Command::Analyze(args) => {
            info!("Running full analysis");
            let mut request = AnalysisRequest::default()
                .with_cpu_threshold(analyzer.cpu_threshold())
                .with_cost_data(!args.no_cost_data)
                .with_lookback_days(args.lookback_days);
            if !args.regions.is_empty() {
                request = request.with_regions(args.regions.iter().cloned());
            }

            let snapshot = load_snapshot(&cli, &analyzer).await?;
            let report = analyzer.analyze(&snapshot, &request, Utc::now())?;
            println!("{}", formatter.format_analysis(&report));
        }

        Command::Serve(args) => {
            let addr: SocketAddr = format!("{}:{}", args.host, args.port)
                .parse()
                .map_err(|e| {
                    CloudcostError::Config(format!(
                        "invalid listen address {}:{}: {e}",
                        args.host, args.port
                    ))
                })?;

            let source: Arc<dyn SnapshotSource> = Arc::new(create_loader(&cli, &analyzer)?);
            let state = Arc::new(AppState::new(source, analyzer));
            cloudcost_api::serve(addr, state).await?;
        }
    }

    Ok(())
}
