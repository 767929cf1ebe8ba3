//! Export command implementation
//!
//! This module implements the `export` command: query the tracker server,
//! backfill dependencies, and write the result as a zip archive or JSON.

use crate::adapters::tracker::TrackerClient;
use crate::config::{load_config, FerryConfig, OutputFormat};
use crate::core::archive::read_archive;
use crate::core::export::{EventExporter, ExportSummary};
use crate::domain::ids::parse_id_list;
use crate::domain::window::{parse_date, parse_timestamp};
use crate::domain::{OrgUnitId, ProgramId, ResultBundle, TimeWindow};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{ArgGroup, Args};
use std::sync::Arc;

/// Arguments for the export command
#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("window")
        .required(true)
        .args(["start_date", "last_updated"])
))]
pub struct ExportArgs {
    /// First event date of the period (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date, requires = "end_date")]
    pub start_date: Option<NaiveDate>,

    /// Last event date of the period (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date, requires = "start_date")]
    pub end_date: Option<NaiveDate>,

    /// Export records changed since this date or timestamp
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_timestamp)]
    pub last_updated: Option<DateTime<Utc>>,

    /// Override org unit(s) to export (comma-separated)
    #[arg(long, value_name = "IDS")]
    pub org_unit: Option<String>,

    /// Override program(s) to export (comma-separated)
    #[arg(long, value_name = "IDS")]
    pub program: Option<String>,

    /// Override output format (zip or json)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Override output file path
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Everything one export run needs, after CLI overrides
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    /// Time filter
    pub window: TimeWindow,
    /// Root org units
    pub org_units: Vec<OrgUnitId>,
    /// Program restriction, empty for any program
    pub programs: Vec<ProgramId>,
    /// Output format
    pub format: OutputFormat,
    /// Output file
    pub output_path: String,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let plan = match self.plan(&config) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!(error = %e, "Invalid export arguments");
                eprintln!("Invalid export arguments: {e}");
                return Ok(2);
            }
        };

        if plan.org_units.is_empty() {
            tracing::warn!("No org units given; the export will be empty");
        }

        let client = match TrackerClient::new(config.server.clone()) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create tracker client");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4); // Connection error exit code
            }
        };
        let exporter = EventExporter::new(Arc::new(client));

        println!("🚀 Starting export ({})...", plan.window);

        let (bundle, summary) = match exporter
            .export(plan.window, &plan.org_units, &plan.programs)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(5); // Fatal error exit code
            }
        };
        summary.log_summary();

        if let Err(e) = write_output(&exporter, &bundle, &plan) {
            tracing::error!(error = %e, output = %plan.output_path, "Failed to write export");
            eprintln!("Failed to write export: {e}");
            return Ok(5);
        }

        print_summary(&summary, &plan);
        Ok(0)
    }

    /// Merge the CLI arguments over the `[export]` section
    ///
    /// # Errors
    ///
    /// Returns a message for an inverted period, a missing window, or an
    /// invalid id.
    pub fn plan(&self, config: &FerryConfig) -> Result<ExportPlan, String> {
        let window = match (self.start_date, self.end_date, self.last_updated) {
            (Some(start), Some(end), None) => {
                if start > end {
                    return Err(format!("start date {start} is after end date {end}"));
                }
                TimeWindow::period(start, end)
            }
            (None, None, Some(cutoff)) => TimeWindow::last_updated(cutoff),
            _ => {
                return Err(
                    "give either --start-date and --end-date, or --last-updated".to_string(),
                )
            }
        };

        let org_units = match &self.org_unit {
            Some(list) => parse_id_list(list)?,
            None => config
                .export
                .org_units
                .iter()
                .map(|id| OrgUnitId::new(id.as_str()))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let programs = match &self.program {
            Some(list) => parse_id_list(list)?,
            None => config
                .export
                .programs
                .iter()
                .map(|id| ProgramId::new(id.as_str()))
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(ExportPlan {
            window,
            org_units,
            programs,
            format: self.format.unwrap_or(config.export.format),
            output_path: self
                .output
                .clone()
                .unwrap_or_else(|| config.export.output_path.clone()),
        })
    }
}

fn write_output(
    exporter: &EventExporter,
    bundle: &ResultBundle,
    plan: &ExportPlan,
) -> anyhow::Result<()> {
    let bytes = match plan.format {
        OutputFormat::Zip => {
            let archive = exporter.archive(bundle)?;
            let check = read_archive(&archive)?;
            tracing::debug!(
                events = check.events.len(),
                tracked_entity_instances = check.tracked_entity_instances.len(),
                enrollments = check.enrollments.len(),
                "Archive verified"
            );
            archive
        }
        OutputFormat::Json => serde_json::to_vec_pretty(bundle)?,
    };

    std::fs::write(&plan.output_path, &bytes)?;
    tracing::info!(
        output = %plan.output_path,
        format = %plan.format,
        bytes = bytes.len(),
        "Export written"
    );
    Ok(())
}

fn print_summary(summary: &ExportSummary, plan: &ExportPlan) {
    println!();
    println!("📊 Export Summary:");
    println!("  Window: {}", summary.window);
    println!("  Org unit/program combinations: {}", summary.combinations);
    println!("  Events: {}", summary.events);
    println!(
        "  Tracked entity instances: {} ({} backfilled)",
        summary.tracked_entity_instances, summary.backfilled_tracked_entity_instances
    );
    println!(
        "  Enrollments: {} ({} backfilled)",
        summary.enrollments, summary.backfilled_enrollments
    );
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Output: {} ({})", plan.output_path, plan.format);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn export_args(args: &[&str]) -> ExportArgs {
        let mut argv = vec!["ferry", "export"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Export(args) => args,
            other => panic!("expected export, got {other:?}"),
        }
    }

    fn config() -> FerryConfig {
        let mut config: FerryConfig = toml::from_str(
            r#"
            [server]
            base_url = "https://play.example.org/dhis"
            "#,
        )
        .unwrap();
        config.export.org_units = vec!["A".to_string()];
        config.export.programs = vec!["P1".to_string()];
        config
    }

    #[test]
    fn test_plan_uses_config_defaults() {
        let plan = export_args(&["--last-updated", "2024-05-01T08:00:00Z"])
            .plan(&config())
            .unwrap();

        assert!(matches!(plan.window, TimeWindow::LastUpdated(_)));
        assert_eq!(plan.org_units, vec![OrgUnitId::new("A").unwrap()]);
        assert_eq!(plan.programs, vec![ProgramId::new("P1").unwrap()]);
        assert_eq!(plan.format, OutputFormat::Zip);
        assert_eq!(plan.output_path, "export.zip");
    }

    #[test]
    fn test_plan_cli_overrides() {
        let plan = export_args(&[
            "--start-date",
            "2024-01-01",
            "--end-date",
            "2024-01-31",
            "--org-unit",
            "B, C",
            "--program",
            "",
            "--format",
            "json",
            "--output",
            "out.json",
        ])
        .plan(&config())
        .unwrap();

        assert_eq!(
            plan.window,
            TimeWindow::period(
                parse_date("2024-01-01").unwrap(),
                parse_date("2024-01-31").unwrap()
            )
        );
        assert_eq!(plan.org_units.len(), 2);
        assert!(plan.programs.is_empty());
        assert_eq!(plan.format, OutputFormat::Json);
        assert_eq!(plan.output_path, "out.json");
    }

    #[test]
    fn test_plan_rejects_inverted_period() {
        let result = export_args(&["--start-date", "2024-02-01", "--end-date", "2024-01-01"])
            .plan(&config());
        assert!(result.is_err());
    }

    #[test]
    fn test_period_and_last_updated_conflict() {
        let result = Cli::try_parse_from([
            "ferry",
            "export",
            "--start-date",
            "2024-01-01",
            "--end-date",
            "2024-01-31",
            "--last-updated",
            "2024-01-01",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_start_date_requires_end_date() {
        assert!(Cli::try_parse_from(["ferry", "export", "--start-date", "2024-01-01"]).is_err());
    }
}
