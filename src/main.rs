//! PV-system calculation service entry point: CLI wiring and config-driven
//! scheduler construction.

use std::path::{Path, PathBuf};
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pvsystem_service::config::ServiceConfig;
use pvsystem_service::io::export::export_csv;
use pvsystem_service::model::EnergySystem;
use pvsystem_service::params::EntityId;
use pvsystem_service::sim::engine::Engine;
use pvsystem_service::sim::kpi::RunSummary;
use pvsystem_service::sim::types::StepResult;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    model_path: Option<String>,
    entity_ids: Vec<String>,
    results_out: Option<String>,
}

fn print_help() {
    eprintln!("pvsystem-service: PV-system irradiance to power calculation service");
    eprintln!();
    eprintln!("Usage: pvsystem-service [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load configuration from TOML file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ServiceConfig::PRESETS.join(", ")
    );
    eprintln!("  --model <path>           Override the energy-system model JSON");
    eprintln!("  --entity <id>            Installation to serve (repeatable, overrides config)");
    eprintln!("  --results-out <path>     Export step results to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        model_path: None,
        entity_ids: Vec::new(),
        results_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--model" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --model requires a path argument");
                    process::exit(1);
                }
                cli.model_path = Some(args[i].clone());
            }
            "--entity" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --entity requires an id argument");
                    process::exit(1);
                }
                cli.entity_ids.push(args[i].clone());
            }
            "--results-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --results-out requires a path argument");
                    process::exit(1);
                }
                cli.results_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Initializes the service against the configured model and runs every
/// scheduled tick.
fn run_service(cfg: &ServiceConfig) -> pvsystem_service::Result<Vec<StepResult>> {
    let model = EnergySystem::from_json_file(&cfg.model.path)?;
    info!(path = %cfg.model.path.display(), system = %model.id, "loaded energy system model");

    let mut service = cfg.service();
    service.init_calculation_service(&cfg.model.entity_ids, &model)?;

    let profile = cfg.build_profile()?;
    let mut engine = Engine::new(
        cfg.sim_config(),
        service,
        profile,
        cfg.model.entity_ids.clone(),
    );
    engine.run()
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    // --config takes priority, then --preset, then baseline default
    let mut config = if let Some(ref path) = cli.config_path {
        match ServiceConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ServiceConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ServiceConfig::baseline()
    };

    if let Some(path) = cli.model_path {
        config.model.path = PathBuf::from(path);
    }
    if !cli.entity_ids.is_empty() {
        config.model.entity_ids = cli.entity_ids.into_iter().map(EntityId::from).collect();
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let results = match run_service(&config) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    for r in &results {
        println!("{r}");
    }

    let summary = RunSummary::from_results(&results);
    println!("\n{summary}");

    if let Some(ref path) = cli.results_out {
        if let Err(e) = export_csv(&results, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Results written to {path}");
    }
}
