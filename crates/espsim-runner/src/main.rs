//! # espsim
//!
//! Command-line entry point of the ESP32 project simulator.

use clap::{Args, Parser, Subcommand};
use espsim_common::Capability;
use espsim_model::{load_request, schema, ModelError};
use espsim_runner::config::MAX_TICKS_LIMIT;
use espsim_runner::{server, ConfigError, RunnerError, ServiceConfig, DEFAULT_MAX_TICKS};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// CLI Configuration
// ============================================================================

/// espsim - ESP32 project simulator
#[derive(Parser, Debug)]
#[command(name = "espsim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Simulate a project described in a YAML or JSON request file
    Simulate(SimulateArgs),
    /// Serve the simulation HTTP API
    Serve(ServeArgs),
    /// List capabilities and their parameters
    Capabilities,
    /// List all metrics with descriptions and labels
    Metrics,
}

/// Arguments of `espsim simulate`
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Request file (YAML or JSON)
    pub file: PathBuf,

    /// Tick bound
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    pub max_ticks: u32,

    /// Print a plain-text summary and log instead of JSON
    #[arg(long)]
    pub text: bool,
}

/// Arguments of `espsim serve`
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Service configuration file (YAML)
    #[arg(short, long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory of generated projects
    #[arg(long)]
    pub projects_path: Option<PathBuf>,

    /// Tick bound applied to every simulation
    #[arg(long)]
    pub max_ticks: Option<u32>,
}

impl ServeArgs {
    /// Merge the config file (if any) with command-line overrides.
    pub fn resolve(&self) -> Result<ServiceConfig, RunnerError> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::load(path)?,
            None => ServiceConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = &self.projects_path {
            config.projects_path = path.clone();
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Commands
// ============================================================================

fn simulate_command(args: SimulateArgs) -> Result<(), RunnerError> {
    if !(1..=MAX_TICKS_LIMIT).contains(&args.max_ticks) {
        return Err(ConfigError::Invalid(format!(
            "--max-ticks must be between 1 and {}",
            MAX_TICKS_LIMIT
        ))
        .into());
    }

    let request = load_request(&args.file)?;
    let report = espsim_runner::simulate(&request, args.max_ticks).map_err(ModelError::from)?;

    if args.text {
        print!("{}", report.to_text());
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn serve_command(args: ServeArgs) -> Result<(), RunnerError> {
    let config = args.resolve()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(config))
}

/// Print every capability with its parameter table
fn print_capabilities() {
    println!("espsim Capabilities");
    println!("===================\n");
    println!("wifi_ap and wifi_sta are mutually exclusive.");
    println!("tcp_server, http_server and mqtt_client need one of them to come up.\n");

    for capability in Capability::ALL {
        println!("## {}\n", capability);
        for def in schema(capability) {
            println!("  {} ({})", def.key, def.kind);
            if !def.description.is_empty() {
                println!("    {}", def.description);
            }
            if !def.rule.is_empty() {
                println!("    Accepts: {}", def.rule);
            }
            println!("    Default: {}", def.default);
        }
        println!();
    }
}

/// Print information about all available metrics
fn print_metrics_info() {
    use espsim_metrics::metric_defs;

    println!("espsim Available Metrics");
    println!("========================\n");

    let categories = [
        ("Simulation Engine", "espsim.simulation."),
        ("Peripherals", "espsim.peripheral."),
        ("Validation", "espsim.validation."),
        ("HTTP Service", "espsim.http."),
    ];

    for (category_name, prefix) in categories {
        println!("## {}\n", category_name);

        for metric in metric_defs::ALL {
            if metric.name.starts_with(prefix) {
                println!("  {}", metric.name);
                println!("    Type: {}", metric.kind);
                let unit_str = metric.unit_str();
                if !unit_str.is_empty() {
                    println!("    Unit: {}", unit_str);
                }
                if !metric.description.is_empty() {
                    println!("    Description: {}", metric.description);
                }
                if !metric.labels.is_empty() {
                    println!("    Labels: {}", metric.labels.join(", "));
                }
                println!();
            }
        }
    }
}

fn main() -> Result<(), RunnerError> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the service logs at info and one-shot commands at warn.
    let default_level = match cli.command {
        Commands::Serve(_) => "info",
        _ => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    espsim_metrics::describe_metrics();

    match cli.command {
        Commands::Simulate(args) => simulate_command(args)?,
        Commands::Serve(args) => serve_command(args)?,
        Commands::Capabilities => print_capabilities(),
        Commands::Metrics => print_metrics_info(),
    }

    Ok(())
}
