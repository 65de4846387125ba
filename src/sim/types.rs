//! Core simulation types: validated configuration, step records, and run results.

use std::fmt;

use serde::Serialize;

use crate::devices::{Boiler, DrawOffProfile, HeatPump, Tank};
use crate::physics::{SECONDS_PER_HOUR, WATTS_PER_KILOWATT};

use super::controller::{ControlParams, HeatPumpMode};
use super::kpi::RunMetrics;

/// Validated simulation configuration in SI units (s, W, °C).
///
/// Only obtainable through [`crate::config::ScenarioConfig::build`], which
/// rejects invalid inputs, so the engine never has to check them mid-run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub(crate) dt_s: f64,
    pub(crate) horizon_s: f64,
    pub(crate) stop_at_setpoint: bool,
    pub(crate) initial_tank_c: f64,
    pub(crate) tank: Tank,
    pub(crate) heat_pump: HeatPump,
    pub(crate) boiler: Boiler,
    pub(crate) control: ControlParams,
    pub(crate) draw_off: DrawOffProfile,
}

impl SimConfig {
    /// Time step (s).
    pub fn dt_s(&self) -> f64 {
        self.dt_s
    }

    /// Simulated horizon, or safety cutoff when stopping at setpoint (s).
    pub fn horizon_s(&self) -> f64 {
        self.horizon_s
    }

    pub fn stop_at_setpoint(&self) -> bool {
        self.stop_at_setpoint
    }

    pub fn initial_tank_c(&self) -> f64 {
        self.initial_tank_c
    }

    pub fn tank(&self) -> &Tank {
        &self.tank
    }

    pub fn heat_pump(&self) -> &HeatPump {
        &self.heat_pump
    }

    pub fn boiler(&self) -> &Boiler {
        &self.boiler
    }

    pub fn control(&self) -> &ControlParams {
        &self.control
    }

    pub fn draw_off(&self) -> &DrawOffProfile {
        &self.draw_off
    }

    /// Number of steps covering the horizon, `floor(horizon / dt)`.
    pub fn total_steps(&self) -> usize {
        (self.horizon_s / self.dt_s).floor() as usize
    }
}

/// Complete record of one simulation step.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStep {
    /// Step index, starting at 1.
    pub step: usize,
    /// Time at the end of the step (s).
    pub time_s: f64,
    /// Tank temperature after the step (°C).
    pub tank_c: f64,
    pub mode: HeatPumpMode,
    /// Heat-pump flow temperature (°C).
    pub supply_c: f64,
    pub heat_pump_w: f64,
    pub backup_w: f64,
    pub draw_off_w: f64,
    /// Shell loss at the start-of-step temperature (W).
    pub tank_loss_w: f64,
    pub loop_loss_w: f64,
    /// Heat-pump exchanger capacity (W), `None` for an unlimited coupling.
    pub exchanger_capacity_w: Option<f64>,
    /// Primary flow while the coil carries heat (m³/h).
    pub primary_flow_m3_h: Option<f64>,
    /// The exchanger, not the heat pump, bounded the delivered power.
    pub exchanger_limited: bool,
}

impl SimulationStep {
    pub fn time_h(&self) -> f64 {
        self.time_s / SECONDS_PER_HOUR
    }
}

impl fmt::Display for SimulationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "k={:>5} ({:>6.2}h) | T={:>5.2} °C  {:<8} supply={:>5.1} °C | \
             hp={:>6.2} kW  backup={:>6.2} kW | draw={:>5.2} kW  loss={:.2}+{:.2} kW{}",
            self.step,
            self.time_h(),
            self.tank_c,
            self.mode,
            self.supply_c,
            self.heat_pump_w / WATTS_PER_KILOWATT,
            self.backup_w / WATTS_PER_KILOWATT,
            self.draw_off_w / WATTS_PER_KILOWATT,
            self.tank_loss_w / WATTS_PER_KILOWATT,
            self.loop_loss_w / WATTS_PER_KILOWATT,
            if self.exchanger_limited { "  [exchanger-limited]" } else { "" },
        )
    }
}

/// Outcome of a full engine run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub initial_tank_c: f64,
    pub steps: Vec<SimulationStep>,
    /// The tank reached setpoint at some point (or started there).
    pub reached_setpoint: bool,
    /// A stop-at-setpoint run hit the horizon cutoff first.
    pub did_not_reach_setpoint: bool,
    pub metrics: RunMetrics,
}

impl SimulationResult {
    pub fn final_tank_c(&self) -> f64 {
        self.steps.last().map_or(self.initial_tank_c, |s| s.tank_c)
    }
}
