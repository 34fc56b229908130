use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use latency_configurator::{ConfiguratorConfig, LatencyConfigurator};

/// Set EXTRA_LATENCY for a service in the media microservices Helm charts
#[derive(Parser, Debug)]
#[command(name = "set-extra-latency")]
#[command(version, about, long_about = None, allow_negative_numbers = true)]
struct Args {
    /// Name of the service directory in the charts (e.g., movie-id-service)
    #[arg(required_unless_present_any = ["reset_all", "show"])]
    service_name: Option<String>,

    /// The extra latency in milliseconds
    #[arg(required_unless_present_any = ["reset_all", "show"])]
    latency_ms: Option<i64>,

    /// Reset EXTRA_LATENCY to 0 for every service
    #[arg(long)]
    reset_all: bool,

    /// Show the latency each service currently applies
    #[arg(long, conflicts_with = "reset_all")]
    show: bool,

    /// Also write the legacy container.extraLatencyMs field
    #[arg(long)]
    legacy_field: bool,

    /// Directory containing one chart per service
    #[arg(long, value_name = "PATH")]
    charts_dir: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => Args::command()
            .error(ErrorKind::InvalidValue, format!("{e:#}"))
            .exit(),
    };
    tracing::debug!(?config, "Resolved configuration");

    let configurator = LatencyConfigurator::new(config);
    match run(&args, &configurator) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("latency_configurator=debug,set_extra_latency=debug")
        } else {
            EnvFilter::new("error")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// CLI flags win over the config file, which wins over the defaults
fn resolve_config(args: &Args) -> anyhow::Result<ConfiguratorConfig> {
    let mut config = match &args.config {
        Some(path) => ConfiguratorConfig::from_file(path)
            .with_context(|| format!("loading --config {}", path.display()))?,
        None => ConfiguratorConfig::default(),
    };

    if let Some(charts_dir) = &args.charts_dir {
        config.charts_dir.clone_from(charts_dir);
    }
    if args.legacy_field {
        config.legacy_field = true;
    }

    Ok(config)
}

/// Only output failures surface here; per-service problems are rendered and
/// do not change the exit status.
fn run(args: &Args, configurator: &LatencyConfigurator) -> io::Result<()> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    if args.show {
        match configurator.show_services() {
            Ok(readings) => {
                for reading in &readings {
                    reading.render(&mut out, &mut err)?;
                }
            }
            Err(e) => writeln!(err, "{} {}", "Error:".red().bold(), e)?,
        }
        return Ok(());
    }

    if args.reset_all {
        return match configurator.reset_all_services() {
            Ok(report) => report.render(&mut out, &mut err),
            Err(e) => writeln!(err, "{} {}", "Error:".red().bold(), e),
        };
    }

    // clap guarantees both positionals when neither batch flag is set
    if let (Some(service_name), Some(latency_ms)) = (&args.service_name, args.latency_ms) {
        configurator
            .update_extra_latency(service_name, latency_ms)
            .render(&mut out, &mut err)?;
    }

    Ok(())
}
