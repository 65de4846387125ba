use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::report::OutputFormat;
use crate::sweep::SweepParam;

#[derive(Debug, Parser)]
#[command(
    name = "dhw-sim",
    about = "Hot-water tank simulation with heat pump, backup boiler and coil exchangers",
    long_about = None
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Simulate one scenario and print its energy report
    Run {
        #[command(flatten)]
        source: ScenarioSource,

        /// Export step records to CSV
        #[arg(long, value_name = "FILE")]
        telemetry_out: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Include every step in the report
        #[arg(long)]
        steps: bool,
    },
    /// Run a scenario once per value of one parameter
    Sweep {
        #[command(flatten)]
        source: ScenarioSource,

        /// Parameter to vary
        #[arg(long, value_enum)]
        param: SweepParam,

        /// Comma-separated values
        #[arg(long, value_delimiter = ',', required = true, num_args = 1..)]
        values: Vec<f64>,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Rate an immersed coil at one operating point
    Size {
        /// Primary supply temperature (°C)
        #[arg(long)]
        supply_c: f64,

        /// Tank temperature (°C)
        #[arg(long)]
        tank_c: f64,

        /// Primary supply/return drop (K)
        #[arg(long, default_value_t = 7.0)]
        primary_delta_c: f64,

        /// Coil surface (m²)
        #[arg(long)]
        area_m2: f64,

        /// Heat-transfer coefficient (W/(m²·K))
        #[arg(long, default_value_t = 800.0)]
        u: f64,

        /// Source nominal power capping the delivered power (kW)
        #[arg(long)]
        nominal_kw: Option<f64>,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Where the scenario comes from. Defaults to the `baseline` preset.
#[derive(Debug, Clone, Args)]
#[group(multiple = false)]
pub struct ScenarioSource {
    /// Load scenario from TOML config file
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,
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
    fn supports_scenario_cli() {
        let cli = Cli::try_parse_from(["dhw-sim", "run", "--scenario", "scenario.toml"]).ok();
        let scenario = cli.and_then(|c| match c.command {
            Command::Run { source, .. } => source.scenario,
            _ => None,
        });
        assert_eq!(scenario.as_deref().and_then(|p| p.to_str()), Some("scenario.toml"));
    }

    #[test]
    fn scenario_and_preset_are_exclusive() {
        let cli = Cli::try_parse_from([
            "dhw-sim", "run", "--scenario", "a.toml", "--preset", "baseline",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn sweep_values_split_on_commas() {
        let cli = Cli::try_parse_from([
            "dhw-sim", "-v", "sweep", "--preset", "ua_coil", "--param", "coil_area", "--values",
            "2,3.5,5",
        ])
        .ok();
        assert_eq!(cli.as_ref().map(|c| c.verbose), Some(1));
        let values = cli.and_then(|c| match c.command {
            Command::Sweep { values, param, .. } => Some((param, values)),
            _ => None,
        });
        assert_eq!(values, Some((SweepParam::CoilArea, vec![2.0, 3.5, 5.0])));
    }

    #[test]
    fn size_requires_temperatures() {
        assert!(Cli::try_parse_from(["dhw-sim", "size", "--area-m2", "4"]).is_err());
        let cli = Cli::try_parse_from([
            "dhw-sim", "size", "--supply-c", "70", "--tank-c", "55", "--area-m2", "4",
        ]);
        assert!(cli.is_ok());
    }
}
