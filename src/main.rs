// Application entry point: command line front end and desktop window

// Import the GUI module containing the main application state
mod gui;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use sys_health::collectors::{self, PlatformCollectors};
use sys_health::config::Config;
use sys_health::models::CollectionProgress;
use sys_health::{CancellationToken, CollectionError, ConfigError, ReportError, logging, report};
use tracing::error;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = r#"Examples:
  # Open the desktop window
  sys-health

  # Collect and write both reports, looking back a week in the event log
  sys-health collect --days 7 --json report.json --html report.html

  # Re-render a saved report
  sys-health render --input report.json --html report.html"#
)]
struct Cli {
    /// Configuration file path (defaults to ./sys_health.toml when present)
    #[arg(long, value_name = "CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the desktop window (default)
    Gui,
    /// Run a collection and print the health summary
    Collect(CollectArgs),
    /// Render a saved JSON report as HTML
    Render(RenderArgs),
    /// Print one live sensor sample
    Sensors,
}

#[derive(Args, Debug)]
struct CollectArgs {
    /// Event-log lookback in days (overrides the config file)
    #[arg(long)]
    days: Option<u32>,
    /// Write the JSON interchange document here
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
    /// Write the HTML report here
    #[arg(long, value_name = "PATH")]
    html: Option<PathBuf>,
    /// Cap on event rows in the HTML report
    #[arg(long)]
    max_events: Option<usize>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// JSON document to render
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Output HTML path
    #[arg(long, value_name = "PATH")]
    html: PathBuf,
    /// Lookback shown in the event table title
    #[arg(long)]
    days: Option<u32>,
    /// Cap on event rows
    #[arg(long)]
    max_events: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error("desktop window failed: {0}")]
    Gui(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init_tracing(&config.logging.filter);

    let result = match cli.command.unwrap_or(Command::Gui) {
        Command::Gui => run_gui(config),
        Command::Collect(args) => run_collect(&config, args),
        Command::Render(args) => run_render(&config, args),
        Command::Sensors => {
            run_sensors();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the eframe window and launches the GUI.
fn run_gui(config: Config) -> Result<(), AppError> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 760.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "System Health",
        options,
        Box::new(|cc| Ok(Box::new(gui::AppState::new(cc, config)))),
    )
    .map_err(|e| AppError::Gui(e.to_string()))
}

fn run_collect(config: &Config, args: CollectArgs) -> Result<(), AppError> {
    let days = args.days.unwrap_or(config.collection.lookback_days);
    let max_events = args.max_events.unwrap_or(config.report.max_event_rows);

    let collectors = PlatformCollectors::default();
    let progress = |p: CollectionProgress| {
        println!("[{}/{}] {}", p.step_index, p.step_count, p.message);
    };
    let outcome = collectors
        .collector(config.step_timeout())
        .collect(days, &progress, &CancellationToken::new())?;

    let perf = &outcome.document.performance;
    let tier = perf.tier();
    println!();
    println!("System health: {:.1}/100 ({})", perf.system_health_score, tier.label());
    println!(
        "  stability {:.0}  performance {:.0}  memory {:.0}  disk {:.0}",
        perf.stability_score, perf.performance_score, perf.memory_usage_score, perf.disk_health_score
    );
    println!(
        "  critical issues {}  warnings {}  events {}  reliability records {}",
        perf.critical_issues_count,
        perf.warnings_count,
        outcome.document.events.len(),
        outcome.document.reliability.len()
    );
    if !perf.recommendations.is_empty() {
        println!("Recommendations:");
        for rec in &perf.recommendations {
            println!("  - {rec}");
        }
    }
    if outcome.has_warnings() {
        println!("Warnings:");
        for warning in &outcome.warnings {
            println!("  ! {warning}");
        }
    }

    if let Some(path) = &args.json {
        report::export_json(&outcome.document, path)?;
        println!("JSON report: {}", path.display());
    }
    if let Some(path) = &args.html {
        report::export_html(&outcome.document, days, max_events, path)?;
        println!("HTML report: {}", path.display());
    }
    Ok(())
}

fn run_render(config: &Config, args: RenderArgs) -> Result<(), AppError> {
    let doc = report::import_json(&args.input)?;
    report::export_html(
        &doc,
        args.days.unwrap_or(config.collection.lookback_days),
        args.max_events.unwrap_or(config.report.max_event_rows),
        &args.html,
    )?;
    println!("HTML report: {}", args.html.display());
    Ok(())
}

fn run_sensors() {
    let reading = collectors::read_sensors();
    let show = |v: Option<f32>, unit: &str| v.map(|v| format!("{v:.1}{unit}")).unwrap_or("--".into());
    println!("CPU load: {}", show(reading.cpu_load_percent, "%"));
    println!("CPU temp: {}", show(reading.cpu_temperature_c, "°C"));
    println!("GPU temp: {}", show(reading.gpu_temperature_c, "°C"));
    println!("GPU load: {}", show(reading.gpu_load_percent, "%"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn collect_flags_parse() {
        let cli = Cli::try_parse_from([
            "sys-health", "collect", "--days", "7", "--json", "out.json", "--max-events", "20",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Collect(args)) => {
                assert_eq!(args.days, Some(7));
                assert_eq!(args.json, Some(PathBuf::from("out.json")));
                assert_eq!(args.max_events, Some(20));
                assert!(args.html.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_gui() {
        let cli = Cli::try_parse_from(["sys-health", "--config", "custom.toml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }
}
