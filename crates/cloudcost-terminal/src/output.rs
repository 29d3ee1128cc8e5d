//! Output formatting module for cloudcost
//!
//! This module provides formatters for displaying reports in different formats:
//! - Table format for human-readable terminal output
//! - JSON format with the same shapes the HTTP API returns
//!
//! # Examples
//!
//! ```
//! use cloudcost_core::aggregation_types::IdleInstancesReport;
//! use cloudcost_terminal::get_formatter;
//!
//! let report = IdleInstancesReport::new(Vec::new());
//!
//! // Table formatter for human-readable output
//! let formatter = get_formatter(false);
//! assert!(formatter.format_idle_instances(&report).contains("No idle instances"));
//!
//! // JSON formatter for machine-readable output
//! let json_formatter = get_formatter(true);
//! assert!(json_formatter.format_idle_instances(&report).contains("\"total_idle_instances\""));
//! ```

use chrono::{DateTime, Utc};
use cloudcost_core::aggregation_types::{
    AnalysisReport, CostPeriod, CostReport, CostSummary, IdleInstancesReport, RecommendationSet,
    RegionSummary, ResourceListing, SavingsSummary, ScanReport, ServiceSummary,
    UnattachedVolumesReport,
};
use cloudcost_core::money::{round_currency, round_percentage};
use cloudcost_core::types::Severity;
use colored::Colorize;
use prettytable::{Cell, Row, Table, format, row};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

/// Trait for output formatters
///
/// One method per report. Implementations can provide different output
/// formats (table, JSON, CSV, etc.).
pub trait OutputFormatter {
    /// Format a filtered raw cost listing
    fn format_costs(&self, report: &CostReport) -> String;

    /// Format a cost summary by service and region
    fn format_summary(&self, summary: &CostSummary) -> String;

    /// Format a resource listing
    fn format_resources(&self, listing: &ResourceListing) -> String;

    /// Format an inventory scan result
    fn format_scan(&self, report: &ScanReport) -> String;

    /// Format aggregated recommendations
    fn format_recommendations(&self, set: &RecommendationSet) -> String;

    /// Format idle instance recommendations
    fn format_idle_instances(&self, report: &IdleInstancesReport) -> String;

    /// Format unattached volume recommendations
    fn format_unattached_volumes(&self, report: &UnattachedVolumesReport) -> String;

    /// Format the savings summary
    fn format_savings(&self, summary: &SavingsSummary) -> String;

    /// Format a full analysis report
    fn format_analysis(&self, report: &AnalysisReport) -> String;
}

/// Table formatter for human-readable output
///
/// Produces ASCII tables suitable for terminal display. Counts are
/// formatted with thousands separators and costs with a dollar sign.
pub struct TableFormatter;

impl TableFormatter {
    /// Create a new TableFormatter
    pub fn new() -> Self {
        Self
    }

    /// Format a number with thousands separators
    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    /// Format currency with dollar sign
    fn format_currency(amount: Decimal) -> String {
        format!("${:.2}", round_currency(amount))
    }

    fn format_percentage(value: Decimal) -> String {
        format!("{:.1}%", round_percentage(value))
    }

    fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
        timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    fn format_period(period: &CostPeriod) -> String {
        let bound = |date: Option<chrono::NaiveDate>| {
            date.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        format!("{} to {}", bound(period.start_date), bound(period.end_date))
    }

    /// Style spec for a severity cell
    fn severity_style(severity: Severity) -> &'static str {
        match severity {
            Severity::Critical => "Frb",
            Severity::High => "Fr",
            Severity::Medium => "Fy",
            Severity::Low => "Fg",
        }
    }

    fn severity_cell(severity: Severity) -> Cell {
        Cell::new(&severity.to_string()).style_spec(Self::severity_style(severity))
    }

    fn new_table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }

    fn service_table(rows: &[ServiceSummary]) -> Table {
        let mut table = Self::new_table();
        table.set_titles(row![b -> "Service", b -> "Cost", b -> "Share"]);
        for service in rows {
            table.add_row(row![
                service.service_name,
                r -> Self::format_currency(service.total_cost),
                r -> Self::format_percentage(service.percentage)
            ]);
        }
        table
    }

    fn region_table(rows: &[RegionSummary]) -> Table {
        let mut table = Self::new_table();
        table.set_titles(row![b -> "Region", b -> "Cost", b -> "Share"]);
        for region in rows {
            table.add_row(row![
                region.region,
                r -> Self::format_currency(region.total_cost),
                r -> Self::format_percentage(region.percentage)
            ]);
        }
        table
    }

    fn total_line(label: &str, amount: Decimal) -> String {
        format!("{label}: {}", Self::format_currency(amount))
            .green()
            .bold()
            .to_string()
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TableFormatter {
    fn format_costs(&self, report: &CostReport) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", "Costs".bold()));

        let filters = &report.filters;
        let mut applied = Vec::new();
        if let Some(start) = filters.start_date {
            applied.push(format!("from {start}"));
        }
        if let Some(end) = filters.end_date {
            applied.push(format!("until {end}"));
        }
        if let Some(region) = &filters.region {
            applied.push(format!("region {region}"));
        }
        if let Some(service) = &filters.service_name {
            applied.push(format!("service {service}"));
        }
        if !applied.is_empty() {
            output.push_str(&format!("Filters: {}\n", applied.join(", ")));
        }
        output.push('\n');

        if report.breakdown.is_empty() {
            output.push_str("No cost records match the filters.\n");
            return output;
        }

        let mut table = Self::new_table();
        table.set_titles(row![b -> "Service", b -> format!("Cost ({})", report.currency)]);
        for item in &report.breakdown {
            table.add_row(row![item.service, r -> Self::format_currency(item.cost)]);
        }
        table.add_row(row![b -> "TOTAL", rb -> Self::format_currency(report.total_cost)]);

        output.push_str(&table.to_string());
        output
    }

    fn format_summary(&self, summary: &CostSummary) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} ({})\n\n",
            "Cost Summary".bold(),
            Self::format_period(&summary.period)
        ));

        if summary.by_service.is_empty() {
            output.push_str("No cost records in this period.\n");
            return output;
        }

        output.push_str(&format!("{}\n", "By service".underline()));
        output.push_str(&Self::service_table(&summary.by_service).to_string());
        output.push('\n');
        output.push_str(&format!("{}\n", "By region".underline()));
        output.push_str(&Self::region_table(&summary.by_region).to_string());
        output.push('\n');
        output.push_str(&Self::total_line("Total cost", summary.total_cost));
        output.push('\n');
        output
    }

    fn format_resources(&self, listing: &ResourceListing) -> String {
        let mut output = String::new();

        if let Some(instances) = &listing.resources.ec2_instances {
            output.push_str(&format!(
                "{} ({})\n",
                "EC2 Instances".bold(),
                Self::format_number(instances.len())
            ));
            let mut table = Self::new_table();
            table.set_titles(row![
                b -> "Instance ID",
                b -> "Name",
                b -> "Type",
                b -> "State",
                b -> "Zone",
                b -> "CPU %",
                b -> "Idle"
            ]);
            for instance in instances {
                table.add_row(row![
                    instance.instance_id,
                    instance.tag("Name").unwrap_or("-"),
                    instance.instance_type,
                    instance.state,
                    instance.availability_zone,
                    r -> format!("{:.1}", instance.cpu_utilization),
                    if instance.is_idle { "yes" } else { "no" }
                ]);
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        if let Some(volumes) = &listing.resources.ebs_volumes {
            output.push_str(&format!(
                "{} ({})\n",
                "EBS Volumes".bold(),
                Self::format_number(volumes.len())
            ));
            let mut table = Self::new_table();
            table.set_titles(row![
                b -> "Volume ID",
                b -> "Size (GB)",
                b -> "Type",
                b -> "State",
                b -> "Attached To",
                b -> "Zone"
            ]);
            for volume in volumes {
                table.add_row(row![
                    volume.volume_id,
                    r -> Self::format_number(volume.size as usize),
                    volume.volume_type,
                    volume.state,
                    volume.instance_id.as_deref().unwrap_or("-"),
                    volume.availability_zone
                ]);
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output.push_str(&format!(
            "Total resources: {}\n",
            Self::format_number(listing.total_count)
        ));
        output
    }

    fn format_scan(&self, report: &ScanReport) -> String {
        let regions = if report.regions_scanned.is_empty() {
            "none".to_string()
        } else {
            report.regions_scanned.join(", ")
        };
        format!(
            "{} {} ({})\n  Regions:       {}\n  EC2 instances: {}\n  EBS volumes:   {}\n  Completed at:  {}\n",
            "Scan".bold(),
            report.scan_id,
            report.status,
            regions,
            Self::format_number(report.resources_found.ec2_instances),
            Self::format_number(report.resources_found.ebs_volumes),
            Self::format_timestamp(&report.timestamp)
        )
    }

    fn format_recommendations(&self, set: &RecommendationSet) -> String {
        if set.recommendations.is_empty() {
            return "No recommendations match the filters.\n".to_string();
        }

        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "#",
            b -> "Resource",
            b -> "Type",
            b -> "Recommendation",
            b -> "Severity",
            b -> "Region",
            b -> "Savings/mo",
            b -> "Description"
        ]);
        for rec in &set.recommendations {
            table.add_row(Row::new(vec![
                Cell::new(&rec.id.to_string()).style_spec("r"),
                Cell::new(&rec.resource_id),
                Cell::new(&rec.resource_type.to_string()),
                Cell::new(&rec.recommendation_type.to_string()),
                Self::severity_cell(rec.severity),
                Cell::new(&rec.region),
                Cell::new(&Self::format_currency(rec.potential_savings)).style_spec("r"),
                Cell::new(&rec.description),
            ]));
        }

        let mut output = table.to_string();
        output.push('\n');
        output.push_str(&format!(
            "{} recommendations\n",
            Self::format_number(set.total_recommendations)
        ));
        output.push_str(&Self::total_line(
            "Total potential savings",
            set.total_potential_savings,
        ));
        output.push('\n');
        output
    }

    fn format_idle_instances(&self, report: &IdleInstancesReport) -> String {
        if report.idle_instances.is_empty() {
            return "No idle instances found.\n".to_string();
        }

        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Instance ID",
            b -> "Type",
            b -> "Region",
            b -> "CPU %",
            b -> "Savings/mo"
        ]);
        for idle in &report.idle_instances {
            table.add_row(row![
                idle.instance_id,
                idle.instance_type,
                idle.region,
                r -> format!("{:.1}", idle.cpu_utilization),
                r -> Self::format_currency(idle.potential_savings)
            ]);
        }
        table.add_row(row![
            b -> "TOTAL",
            "",
            "",
            "",
            rb -> Self::format_currency(report.total_potential_savings)
        ]);

        let mut output = table.to_string();
        output.push('\n');
        output.push_str(&format!(
            "{} idle instances. Consider stopping or downsizing them.\n",
            Self::format_number(report.total_idle_instances)
        ));
        output
    }

    fn format_unattached_volumes(&self, report: &UnattachedVolumesReport) -> String {
        if report.unattached_volumes.is_empty() {
            return "No unattached volumes found.\n".to_string();
        }

        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Volume ID",
            b -> "Size (GB)",
            b -> "Type",
            b -> "Region",
            b -> "Zone",
            b -> "Cost/mo"
        ]);
        for volume in &report.unattached_volumes {
            table.add_row(row![
                volume.volume_id,
                r -> Self::format_number(volume.size as usize),
                volume.volume_type,
                volume.region,
                volume.availability_zone,
                r -> Self::format_currency(volume.monthly_cost)
            ]);
        }
        table.add_row(row![
            b -> "TOTAL",
            "",
            "",
            "",
            "",
            rb -> Self::format_currency(report.total_potential_savings)
        ]);

        let mut output = table.to_string();
        output.push('\n');
        output.push_str(&format!(
            "{} unattached volumes\n",
            Self::format_number(report.total_unattached_volumes)
        ));
        output
    }

    fn format_savings(&self, summary: &SavingsSummary) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} (as of {})\n\n",
            "Potential Savings".bold(),
            Self::format_timestamp(&summary.last_analysis)
        ));

        let mut table = Self::new_table();
        table.set_titles(row![b -> "Source", b -> "Savings/mo"]);
        table.add_row(row![
            "Idle instances",
            r -> Self::format_currency(summary.breakdown.idle_instances_savings)
        ]);
        table.add_row(row![
            "Unattached volumes",
            r -> Self::format_currency(summary.breakdown.unattached_volumes_savings)
        ]);
        table.add_row(row![
            b -> "TOTAL",
            rb -> Self::format_currency(summary.total_potential_savings)
        ]);
        output.push_str(&table.to_string());
        output.push('\n');

        let mut counts = Self::new_table();
        counts.set_titles(row![b -> "Severity", b -> "Recommendations"]);
        for (severity, count) in summary.recommendations_count.by_severity.iter().rev() {
            counts.add_row(Row::new(vec![
                Self::severity_cell(*severity),
                Cell::new(&Self::format_number(*count)).style_spec("r"),
            ]));
        }
        counts.add_row(row![
            b -> "TOTAL",
            rb -> Self::format_number(summary.recommendations_count.total)
        ]);
        output.push_str(&counts.to_string());
        output
    }

    fn format_analysis(&self, report: &AnalysisReport) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {} at {}\n",
            "Analysis".bold(),
            report.analysis_id,
            Self::format_timestamp(&report.timestamp)
        ));
        let regions = if report.regions_analyzed.is_empty() {
            "none".to_string()
        } else {
            report.regions_analyzed.join(", ")
        };
        output.push_str(&format!("Regions: {regions}\n\n"));

        let summary = &report.summary;
        let mut table = Self::new_table();
        table.set_titles(row![b -> "Metric", b -> "Count"]);
        table.add_row(row!["Instances", r -> Self::format_number(summary.total_instances)]);
        table.add_row(row!["Running", r -> Self::format_number(summary.running_instances)]);
        table.add_row(row!["Idle", r -> Self::format_number(summary.idle_instances)]);
        table.add_row(row![
            "Unattached volumes",
            r -> Self::format_number(summary.unattached_volumes)
        ]);
        table.add_row(row!["Cost records", r -> Self::format_number(summary.cost_records)]);
        output.push_str(&table.to_string());
        output.push('\n');

        if let Some(cost_data) = &report.cost_data {
            output.push_str(&format!(
                "{} last {} days ({})\n",
                "Costs".underline(),
                cost_data.lookback_days,
                Self::format_period(&cost_data.period)
            ));
            output.push_str(&format!(
                "  Total: {}   Daily average: {}\n",
                Self::format_currency(cost_data.total_cost),
                Self::format_currency(cost_data.average_daily_cost)
            ));
            if !cost_data.by_service.is_empty() {
                output.push_str(&Self::service_table(&cost_data.by_service).to_string());
            }
            output.push('\n');
        }

        if report.top_recommendations.is_empty() {
            output.push_str("No recommendations.\n");
        } else {
            output.push_str(&format!("{}\n", "Top recommendations".underline()));
            let mut top = Self::new_table();
            top.set_titles(row![b -> "Resource", b -> "Type", b -> "Severity", b -> "Savings/mo"]);
            for rec in &report.top_recommendations {
                top.add_row(Row::new(vec![
                    Cell::new(&rec.resource_id),
                    Cell::new(&rec.resource_type.to_string()),
                    Self::severity_cell(rec.severity),
                    Cell::new(&Self::format_currency(rec.potential_savings)).style_spec("r"),
                ]));
            }
            output.push_str(&top.to_string());
        }

        output.push('\n');
        output.push_str(&Self::total_line(
            "Total potential savings",
            report.total_potential_savings,
        ));
        output.push('\n');
        output
    }
}

/// JSON formatter for machine-readable output
///
/// Serializes each report unchanged, so CLI output matches the HTTP API.
pub struct JsonFormatter;

impl JsonFormatter {
    fn render<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| {
            json!({ "error": { "code": "SERIALIZATION_ERROR", "message": e.to_string() } })
                .to_string()
        })
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_costs(&self, report: &CostReport) -> String {
        Self::render(report)
    }

    fn format_summary(&self, summary: &CostSummary) -> String {
        Self::render(summary)
    }

    fn format_resources(&self, listing: &ResourceListing) -> String {
        Self::render(listing)
    }

    fn format_scan(&self, report: &ScanReport) -> String {
        Self::render(report)
    }

    fn format_recommendations(&self, set: &RecommendationSet) -> String {
        Self::render(set)
    }

    fn format_idle_instances(&self, report: &IdleInstancesReport) -> String {
        Self::render(report)
    }

    fn format_unattached_volumes(&self, report: &UnattachedVolumesReport) -> String {
        Self::render(report)
    }

    fn format_savings(&self, summary: &SavingsSummary) -> String {
        Self::render(summary)
    }

    fn format_analysis(&self, report: &AnalysisReport) -> String {
        Self::render(report)
    }
}

/// Create an output formatter based on the requested format
///
/// # Arguments
///
/// * `json` - If true, returns a JSON formatter; otherwise returns a table formatter
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter::new())
    }
}
