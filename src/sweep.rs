//! Parallel one-parameter sweeps over a base scenario.

use std::fmt;

use clap::ValueEnum;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::{ConfigurationError, ExchangerModel, ScenarioConfig, SupplyMode};
use crate::sim::engine::Engine;
use crate::sim::kpi::{RunMetrics, format_duration};

/// Scenario parameter varied by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SweepParam {
    /// Heat-pump exchanger area (m²).
    CoilArea,
    /// Heat-pump exchanger U-value (W/(m²·K)).
    CoilU,
    /// Heat-pump nominal power (kW).
    HeatPumpKw,
    /// Backup activation delay (min).
    BackupDelayMin,
    /// Tank volume (L).
    TankVolumeL,
    /// Fixed heat-pump flow temperature (°C).
    SupplyTempC,
}

impl SweepParam {
    /// Returns a copy of `base` with this parameter set to `value`.
    pub fn apply(self, base: &ScenarioConfig, value: f64) -> ScenarioConfig {
        let mut cfg = base.clone();
        match self {
            Self::CoilArea => cfg.exchanger.area_m2 = value,
            Self::CoilU => cfg.exchanger.u_w_per_m2k = value,
            Self::HeatPumpKw => cfg.heat_pump.nominal_kw = value,
            Self::BackupDelayMin => cfg.control.backup_delay_min = value,
            Self::TankVolumeL => cfg.tank.volume_l = value,
            Self::SupplyTempC => {
                cfg.heat_pump.supply = SupplyMode::Fixed;
                cfg.heat_pump.supply_temp_c = value;
            }
        }
        cfg
    }

    /// Whether the parameter has any effect on `base`.
    pub fn applies_to(self, base: &ScenarioConfig) -> bool {
        match self {
            Self::CoilArea | Self::CoilU => base.exchanger.model != ExchangerModel::Direct,
            _ => true,
        }
    }
}

impl fmt::Display for SweepParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CoilArea => "coil_area",
            Self::CoilU => "coil_u",
            Self::HeatPumpKw => "heat_pump_kw",
            Self::BackupDelayMin => "backup_delay_min",
            Self::TankVolumeL => "tank_volume_l",
            Self::SupplyTempC => "supply_temp_c",
        };
        f.write_str(s)
    }
}

/// Metrics of one sweep run.
#[derive(Debug, Clone, Serialize)]
pub struct SweepPoint {
    pub param: SweepParam,
    pub value: f64,
    pub reached_setpoint: bool,
    pub metrics: RunMetrics,
}

impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heat_up = self
            .metrics
            .heat_up_time_s
            .map_or_else(|| "-".to_string(), format_duration);
        write!(
            f,
            "{}={:<10} heat-up={:<10} hp={:>8.2} kWh  backup={:>8.2} kWh ({:>5.1}%)  starts={:<4} limited={}",
            self.param,
            self.value,
            heat_up,
            self.metrics.heat_pump_thermal_kwh,
            self.metrics.backup_kwh,
            self.metrics.backup_share_pct,
            self.metrics.heat_pump_starts,
            self.metrics.exchanger_limited,
        )
    }
}

/// Runs `base` once per value of `param`, in parallel.
///
/// Every variant is validated before any run starts, so either all points
/// are produced or none. Results keep the order of `values`.
///
/// # Errors
///
/// Returns the first [`ConfigurationError`] raised by an invalid variant.
pub fn run_sweep(
    base: &ScenarioConfig,
    param: SweepParam,
    values: &[f64],
) -> Result<Vec<SweepPoint>, ConfigurationError> {
    let configs = values
        .iter()
        .map(|&v| param.apply(base, v).build().map(|cfg| (v, cfg)))
        .collect::<Result<Vec<_>, _>>()?;

    info!(%param, points = configs.len(), "sweep start");
    let points = configs
        .into_par_iter()
        .map(|(value, cfg)| {
            let result = Engine::new(cfg).run();
            SweepPoint {
                param,
                value,
                reached_setpoint: result.reached_setpoint,
                metrics: result.metrics,
            }
        })
        .collect();
    Ok(points)
}
