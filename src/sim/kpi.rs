//! Post-hoc energy and operation metrics from simulation steps.

use std::fmt;

use serde::Serialize;

use crate::physics::{SECONDS_PER_HOUR, joules_to_kwh};

use super::types::{SimConfig, SimulationStep};

/// Starts per simulated hour above which short-cycling is flagged.
pub const SHORT_CYCLE_RUNS_PER_HOUR: f64 = 3.0;

/// Aggregate metrics derived from a complete simulation run.
///
/// Computed post-hoc from the step records to ensure consistency between
/// step data and reported metrics. Energies are in kWh, durations in seconds.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub heat_pump_thermal_kwh: f64,
    /// Thermal energy over COP.
    pub heat_pump_electric_kwh: f64,
    /// Free energy captured by the heat pump (thermal − electric).
    pub renewable_kwh: f64,
    pub backup_kwh: f64,
    pub total_generated_kwh: f64,
    /// Backup share of generated energy (%).
    pub backup_share_pct: f64,
    pub draw_off_kwh: f64,
    pub tank_loss_kwh: f64,
    pub loop_loss_kwh: f64,
    pub total_demand_kwh: f64,
    /// Change of stored energy between the initial and final tank temperature.
    pub stored_kwh: f64,
    /// Generated − demand − stored; non-zero only when the cold-inlet floor clips.
    pub balance_residual_kwh: f64,
    /// Rising edges of heat-pump power.
    pub heat_pump_starts: usize,
    /// Duration of each heat-pump run, in order.
    pub run_durations_s: Vec<f64>,
    pub heat_pump_runtime_s: f64,
    pub boiler_runtime_s: f64,
    pub simulated_s: f64,
    pub runs_per_hour: f64,
    pub short_cycle_risk: bool,
    /// Time at which the tank first reached setpoint.
    pub heat_up_time_s: Option<f64>,
    pub final_tank_c: f64,
    pub min_tank_c: f64,
    pub max_tank_c: f64,
    /// The exchanger bounded heat-pump power on at least one step.
    pub exchanger_limited: bool,
    /// Mean primary flow over heating steps, coil model only (m³/h).
    pub mean_primary_flow_m3_h: Option<f64>,
    /// `(hp thermal + backup) / (hp electric + backup)`.
    pub system_cop: Option<f64>,
}

impl RunMetrics {
    /// Computes all metrics from the step records of a run of `config`.
    ///
    /// # Arguments
    ///
    /// * `steps` - Complete simulation step records
    /// * `config` - Configuration the steps were produced with
    pub fn from_steps(steps: &[SimulationStep], config: &SimConfig) -> Self {
        let dt = config.dt_s();
        let initial_c = config.initial_tank_c();
        let control = config.control();

        let mut hp_j = 0.0;
        let mut backup_j = 0.0;
        let mut draw_j = 0.0;
        let mut tank_loss_j = 0.0;
        let mut loop_loss_j = 0.0;
        let mut hp_steps = 0_usize;
        let mut boiler_steps = 0_usize;
        let mut run_durations_s = Vec::new();
        let mut current_run = 0_usize;
        let mut exchanger_limited = false;
        let mut flow_sum = 0.0;
        let mut flow_count = 0_usize;
        let mut min_c = initial_c;
        let mut max_c = initial_c;
        let mut heat_up_time_s = control.at_setpoint(initial_c).then_some(0.0);

        for s in steps {
            hp_j += s.heat_pump_w * dt;
            backup_j += s.backup_w * dt;
            draw_j += s.draw_off_w * dt;
            tank_loss_j += s.tank_loss_w * dt;
            loop_loss_j += s.loop_loss_w * dt;

            if s.heat_pump_w > 0.0 {
                hp_steps += 1;
                current_run += 1;
                if let Some(flow) = s.primary_flow_m3_h {
                    flow_sum += flow;
                    flow_count += 1;
                }
            } else if current_run > 0 {
                run_durations_s.push(current_run as f64 * dt);
                current_run = 0;
            }
            if s.backup_w > 0.0 {
                boiler_steps += 1;
            }
            exchanger_limited |= s.exchanger_limited;

            min_c = min_c.min(s.tank_c);
            max_c = max_c.max(s.tank_c);
            if heat_up_time_s.is_none() && control.at_setpoint(s.tank_c) {
                heat_up_time_s = Some(s.time_s);
            }
        }
        if current_run > 0 {
            run_durations_s.push(current_run as f64 * dt);
        }

        let final_c = steps.last().map_or(initial_c, |s| s.tank_c);
        let heat_pump_thermal_kwh = joules_to_kwh(hp_j);
        let heat_pump_electric_kwh = heat_pump_thermal_kwh / config.heat_pump().cop;
        let backup_kwh = joules_to_kwh(backup_j);
        let total_generated_kwh = heat_pump_thermal_kwh + backup_kwh;
        let draw_off_kwh = joules_to_kwh(draw_j);
        let tank_loss_kwh = joules_to_kwh(tank_loss_j);
        let loop_loss_kwh = joules_to_kwh(loop_loss_j);
        let total_demand_kwh = draw_off_kwh + tank_loss_kwh + loop_loss_kwh;
        let stored_kwh = joules_to_kwh(config.tank().stored_energy_j(initial_c, final_c));

        let simulated_s = steps.len() as f64 * dt;
        let heat_pump_starts = run_durations_s.len();
        let runs_per_hour = if simulated_s > 0.0 {
            heat_pump_starts as f64 / (simulated_s / SECONDS_PER_HOUR)
        } else {
            0.0
        };

        let backup_share_pct = if total_generated_kwh > 0.0 {
            100.0 * backup_kwh / total_generated_kwh
        } else {
            0.0
        };
        let input_kwh = heat_pump_electric_kwh + backup_kwh;
        let system_cop = (input_kwh > 0.0).then(|| total_generated_kwh / input_kwh);

        Self {
            heat_pump_thermal_kwh,
            heat_pump_electric_kwh,
            renewable_kwh: heat_pump_thermal_kwh - heat_pump_electric_kwh,
            backup_kwh,
            total_generated_kwh,
            backup_share_pct,
            draw_off_kwh,
            tank_loss_kwh,
            loop_loss_kwh,
            total_demand_kwh,
            stored_kwh,
            balance_residual_kwh: total_generated_kwh - total_demand_kwh - stored_kwh,
            heat_pump_starts,
            run_durations_s,
            heat_pump_runtime_s: hp_steps as f64 * dt,
            boiler_runtime_s: boiler_steps as f64 * dt,
            simulated_s,
            runs_per_hour,
            short_cycle_risk: runs_per_hour > SHORT_CYCLE_RUNS_PER_HOUR,
            heat_up_time_s,
            final_tank_c: final_c,
            min_tank_c: min_c,
            max_tank_c: max_c,
            exchanger_limited,
            mean_primary_flow_m3_h: (flow_count > 0).then(|| flow_sum / flow_count as f64),
            system_cop,
        }
    }
}

/// Formats seconds as `"{h}h {mm}min"`.
pub fn format_duration(seconds: f64) -> String {
    let total_min = (seconds / 60.0).floor() as u64;
    format!("{}h {:02}min", total_min / 60, total_min % 60)
}

impl fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Energy Report ---")?;
        match self.heat_up_time_s {
            Some(t) => writeln!(f, "Heat-up time:          {}", format_duration(t))?,
            None => writeln!(f, "Heat-up time:          not reached")?,
        }
        writeln!(f, "Heat pump thermal:     {:.2} kWh", self.heat_pump_thermal_kwh)?;
        writeln!(f, "Heat pump electric:    {:.2} kWh", self.heat_pump_electric_kwh)?;
        writeln!(f, "Renewable (EnR):       {:.2} kWh", self.renewable_kwh)?;
        writeln!(f, "Backup boiler:         {:.2} kWh", self.backup_kwh)?;
        writeln!(f, "Backup share:          {:.1}%", self.backup_share_pct)?;
        writeln!(f, "Draw-off:              {:.2} kWh", self.draw_off_kwh)?;
        writeln!(
            f,
            "Losses:                {:.2} kWh (tank {:.2}, loop {:.2})",
            self.tank_loss_kwh + self.loop_loss_kwh,
            self.tank_loss_kwh,
            self.loop_loss_kwh
        )?;
        writeln!(f, "Balance residual:      {:.4} kWh", self.balance_residual_kwh)?;
        writeln!(f, "Heat pump starts:      {}", self.heat_pump_starts)?;
        writeln!(
            f,
            "Heat pump runtime:     {}",
            format_duration(self.heat_pump_runtime_s)
        )?;
        writeln!(
            f,
            "Boiler runtime:        {}",
            format_duration(self.boiler_runtime_s)
        )?;
        writeln!(
            f,
            "Runs per hour:         {:.2}{}",
            self.runs_per_hour,
            if self.short_cycle_risk { " (short-cycle risk)" } else { "" }
        )?;
        writeln!(
            f,
            "Tank temperature:      final {:.2} °C, min {:.2} °C, max {:.2} °C",
            self.final_tank_c, self.min_tank_c, self.max_tank_c
        )?;
        if let Some(flow) = self.mean_primary_flow_m3_h {
            writeln!(f, "Mean primary flow:     {flow:.2} m3/h")?;
        }
        if let Some(cop) = self.system_cop {
            writeln!(f, "System COP:            {cop:.2}")?;
        }
        write!(
            f,
            "Exchanger limited:     {}",
            if self.exchanger_limited { "yes" } else { "no" }
        )
    }
}
