//! dhw-sim entry point: CLI wiring and config-driven engine construction.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dhw_sim::cli::{Cli, Command, ScenarioSource};
use dhw_sim::config::ScenarioConfig;
use dhw_sim::devices::exchanger::{LmtdCoil, size_coil};
use dhw_sim::io::export::export_csv;
use dhw_sim::physics::WATTS_PER_KILOWATT;
use dhw_sim::report::{self, OutputFormat};
use dhw_sim::sim::engine::Engine;
use dhw_sim::sweep::{SweepParam, run_sweep};

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the scenario: `--scenario` first, then `--preset`, then the baseline.
fn load_scenario(source: &ScenarioSource) -> Result<(String, ScenarioConfig)> {
    if let Some(path) = &source.scenario {
        let cfg = ScenarioConfig::from_toml_file(path)?;
        Ok((path.display().to_string(), cfg))
    } else if let Some(name) = &source.preset {
        Ok((name.clone(), ScenarioConfig::from_preset(name)?))
    } else {
        Ok(("baseline".to_string(), ScenarioConfig::baseline()))
    }
}

fn run(
    source: &ScenarioSource,
    telemetry_out: Option<&Path>,
    format: OutputFormat,
    steps: bool,
) -> Result<()> {
    let (label, scenario) = load_scenario(source)?;
    let config = scenario.build()?;

    let mut engine = Engine::new(config);
    let result = engine.run();

    println!("{}", report::render(&label, &result, format, steps)?);

    if let Some(path) = telemetry_out {
        export_csv(&result.steps, path)
            .with_context(|| format!("failed to write CSV to {}", path.display()))?;
        info!(path = %path.display(), "telemetry written");
    }
    Ok(())
}

fn sweep(
    source: &ScenarioSource,
    param: SweepParam,
    values: &[f64],
    format: OutputFormat,
) -> Result<()> {
    let (label, scenario) = load_scenario(source)?;
    if !param.applies_to(&scenario) {
        warn!(%param, scenario = %label, "parameter has no effect on this scenario");
    }
    let points = run_sweep(&scenario, param, values)?;

    match format {
        OutputFormat::Text => {
            println!("Sweep of {param} over {label}");
            for p in &points {
                println!("{p}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&points)?),
    }
    Ok(())
}

fn size(
    supply_c: f64,
    tank_c: f64,
    coil: LmtdCoil,
    nominal_kw: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let nominal_w = nominal_kw.map(|kw| kw * WATTS_PER_KILOWATT);
    let sizing = size_coil(&coil, supply_c, tank_c, nominal_w)?;

    match format {
        OutputFormat::Text => {
            println!("--- Coil Sizing ---");
            println!("LMTD:                  {:.2} K", sizing.lmtd_k);
            println!(
                "Theoretical power:     {:.2} kW",
                sizing.theoretical_w / WATTS_PER_KILOWATT
            );
            println!(
                "Delivered power:       {:.2} kW{}",
                sizing.delivered_w / WATTS_PER_KILOWATT,
                if sizing.coil_limited { " (coil-limited)" } else { "" }
            );
            println!("Return temperature:    {:.1} °C", sizing.return_temp_c);
            println!("Primary flow:          {:.2} m3/h", sizing.primary_flow_m3_h);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sizing)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run {
            source,
            telemetry_out,
            format,
            steps,
        } => run(&source, telemetry_out.as_deref(), format, steps),
        Command::Sweep {
            source,
            param,
            values,
            format,
        } => sweep(&source, param, &values, format),
        Command::Size {
            supply_c,
            tank_c,
            primary_delta_c,
            area_m2,
            u,
            nominal_kw,
            format,
        } => size(
            supply_c,
            tank_c,
            LmtdCoil::new(u, area_m2, primary_delta_c),
            nominal_kw,
            format,
        ),
    }
}
