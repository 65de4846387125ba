//! Simulation engine that orchestrates draw-off, controller, and tank balance.

use tracing::{info, warn};

use crate::devices::{DrawOffProfile, Tank};

use super::controller::HeatSourceController;
use super::kpi::RunMetrics;
use super::power_balance::tank_net_w;
use super::types::{SimConfig, SimulationResult, SimulationStep};

/// Upper bound on the step buffer reserved up front; one day at a 1 s step.
///
/// With `stop_at_setpoint` the horizon is only a cutoff and may be far longer
/// than the run actually lasts.
const MAX_RESERVED_STEPS: usize = 86_400;

/// Simulation engine owning the tank state, the controller, and configuration.
///
/// Holds typed components rather than trait objects since the set of
/// components is fixed.
pub struct Engine {
    config: SimConfig,
    tank: Tank,
    draw_off: DrawOffProfile,
    controller: HeatSourceController,
    tank_temp_c: f64,
}

impl Engine {
    /// Creates a new simulation engine with the tank at its initial temperature
    /// and the controller `Off`.
    pub fn new(config: SimConfig) -> Self {
        let controller = HeatSourceController::new(
            config.control,
            config.heat_pump.clone(),
            config.boiler.clone(),
        );
        Self {
            tank: config.tank.clone(),
            draw_off: config.draw_off.clone(),
            tank_temp_c: config.initial_tank_c,
            controller,
            config,
        }
    }

    /// Executes one simulation step and returns its record.
    ///
    /// # Arguments
    ///
    /// * `k` - Step index; the step ends at `k * dt`
    pub fn step(&mut self, k: usize) -> SimulationStep {
        let dt_s = self.config.dt_s;
        let time_s = k as f64 * dt_s;
        let prev_c = self.tank_temp_c;

        // 1. Draw-off at the end-of-step time
        let draw_off_w = self.draw_off.power_w(time_s);

        // 2. Controller dispatch on the start-of-step temperature
        let dispatch = self.controller.step(prev_c, dt_s);

        // 3. Static losses
        let tank_loss_w = self.tank.shell_loss_w(prev_c);
        let loop_loss_w = self.tank.loop_loss_w;

        // 4-5. Balance and integration
        let net_w = tank_net_w(
            dispatch.heat_pump.power_w,
            dispatch.backup_w,
            tank_loss_w,
            loop_loss_w,
            draw_off_w,
        );
        self.tank_temp_c = self.tank.advance(prev_c, net_w, dt_s);

        SimulationStep {
            step: k,
            time_s,
            tank_c: self.tank_temp_c,
            mode: dispatch.mode,
            supply_c: dispatch.supply_temp_c,
            heat_pump_w: dispatch.heat_pump.power_w,
            backup_w: dispatch.backup_w,
            draw_off_w,
            tank_loss_w,
            loop_loss_w,
            exchanger_capacity_w: dispatch.exchanger_capacity_w,
            primary_flow_m3_h: dispatch.heat_pump.primary_flow_m3_h,
            exchanger_limited: dispatch.heat_pump.power_w > 0.0
                && dispatch.heat_pump.exchanger_limited(),
        }
    }

    /// Executes all steps and returns the complete result.
    ///
    /// With `stop_at_setpoint` the run ends after the first step that brings
    /// the tank to setpoint; the horizon then only acts as a cutoff.
    pub fn run(&mut self) -> SimulationResult {
        let total = self.config.total_steps();
        let setpoint_c = self.config.control.setpoint_c;
        let stop_at_setpoint = self.config.stop_at_setpoint;
        info!(
            steps = total,
            dt_s = self.config.dt_s,
            initial_c = self.config.initial_tank_c,
            setpoint_c,
            stop_at_setpoint,
            "simulation start"
        );

        let control = self.config.control;
        let mut steps = Vec::with_capacity(total.min(MAX_RESERVED_STEPS));
        let mut reached_setpoint = control.at_setpoint(self.tank_temp_c);
        if !(stop_at_setpoint && reached_setpoint) {
            for k in 1..=total {
                let step = self.step(k);
                let at_setpoint = control.at_setpoint(step.tank_c);
                steps.push(step);
                if at_setpoint {
                    reached_setpoint = true;
                    if stop_at_setpoint {
                        break;
                    }
                }
            }
        }

        let did_not_reach_setpoint = stop_at_setpoint && !reached_setpoint;
        if did_not_reach_setpoint {
            warn!(
                horizon_s = self.config.horizon_s,
                final_c = self.tank_temp_c,
                setpoint_c,
                "setpoint not reached before the horizon cutoff"
            );
        }

        let metrics = RunMetrics::from_steps(&steps, &self.config);
        if metrics.short_cycle_risk {
            warn!(
                starts = metrics.heat_pump_starts,
                runs_per_hour = metrics.runs_per_hour,
                "heat pump short-cycling risk"
            );
        }
        info!(
            steps = steps.len(),
            final_c = self.tank_temp_c,
            heat_pump_kwh = metrics.heat_pump_thermal_kwh,
            backup_kwh = metrics.backup_kwh,
            "simulation complete"
        );

        SimulationResult {
            initial_tank_c: self.config.initial_tank_c,
            steps,
            reached_setpoint,
            did_not_reach_setpoint,
            metrics,
        }
    }

    /// Current tank temperature (°C).
    pub fn tank_temp_c(&self) -> f64 {
        self.tank_temp_c
    }

    /// Returns a reference to the controller (for state inspection).
    pub fn controller(&self) -> &HeatSourceController {
        &self.controller
    }

    /// Returns a reference to the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::exchanger::Exchanger;
    use crate::devices::heat_pump::SupplyTemperature;
    use crate::devices::{Boiler, HeatPump};
    use crate::sim::controller::{ControlParams, HeatPumpMode};

    fn config(initial_tank_c: f64, stop_at_setpoint: bool) -> SimConfig {
        SimConfig {
            dt_s: 10.0,
            horizon_s: 3_600.0,
            stop_at_setpoint,
            initial_tank_c,
            tank: Tank {
                volume_l: 300.0,
                ua_w_per_k: 0.0,
                loop_loss_w: 0.0,
                ambient_c: 15.0,
                cold_inlet_c: 10.0,
            },
            heat_pump: HeatPump {
                nominal_w: 20_000.0,
                cop: 3.0,
                supply: SupplyTemperature::Fixed { temp_c: 70.0 },
                modulation: None,
                exchanger: Exchanger::default(),
            },
            boiler: Boiler::absent(),
            control: ControlParams {
                setpoint_c: 55.0,
                restart_delta_k: 5.0,
                startup_delay_s: 0.0,
                anti_short_cycle_s: 0.0,
                backup_delay_s: 0.0,
                source_guard_k: 0.1,
                backup_during_startup: true,
                strict_thresholds: false,
            },
            draw_off: DrawOffProfile::none(10.0),
        }
    }

    #[test]
    fn fixed_horizon_runs_every_step() {
        let mut engine = Engine::new(config(20.0, false));
        let result = engine.run();
        assert_eq!(result.steps.len(), 360);
        assert_eq!(result.steps[0].step, 1);
        assert_eq!(result.steps[0].time_s, 10.0);
        assert!(result.reached_setpoint);
        assert!(!result.did_not_reach_setpoint);
    }

    #[test]
    fn stops_after_first_step_at_setpoint() {
        let mut engine = Engine::new(config(20.0, true));
        let result = engine.run();
        let last = result.steps.last().map(|s| s.tank_c).unwrap_or(0.0);
        assert!(last >= 55.0);
        assert!(result.steps[..result.steps.len() - 1].iter().all(|s| s.tank_c < 55.0));
        assert!(result.reached_setpoint);
    }

    #[test]
    fn already_at_setpoint_stops_immediately() {
        let mut engine = Engine::new(config(56.0, true));
        let result = engine.run();
        assert!(result.steps.is_empty());
        assert!(result.reached_setpoint);
        assert!(!result.did_not_reach_setpoint);
        assert_eq!(result.final_tank_c(), 56.0);
    }

    #[test]
    fn long_cutoff_does_not_preallocate_horizon() {
        let mut cfg = config(20.0, true);
        cfg.horizon_s = 1.0e13;
        let mut engine = Engine::new(cfg);
        let result = engine.run();
        assert!(result.reached_setpoint);
        assert!(result.steps.len() < 1_000);
    }

    #[test]
    fn strict_thresholds_apply_to_termination() {
        let mut cfg = config(55.0, true);
        cfg.control.strict_thresholds = true;
        let result = Engine::new(cfg).run();
        // 55.0 is not strictly above setpoint and not strictly below the restart threshold
        assert_eq!(result.steps.len(), 360);
        assert!(!result.reached_setpoint);
        assert!(result.did_not_reach_setpoint);
        assert_eq!(result.metrics.heat_up_time_s, None);

        let result = Engine::new(config(55.0, true)).run();
        assert!(result.steps.is_empty());
        assert_eq!(result.metrics.heat_up_time_s, Some(0.0));
    }

    #[test]
    fn horizon_cutoff_flags_non_convergence() {
        let mut cfg = config(20.0, true);
        cfg.heat_pump.nominal_w = 1_000.0;
        let mut engine = Engine::new(cfg);
        let result = engine.run();
        assert_eq!(result.steps.len(), 360);
        assert!(result.did_not_reach_setpoint);
        assert!(!result.reached_setpoint);
    }

    #[test]
    fn first_steps_follow_startup_sequence() {
        let mut engine = Engine::new(config(20.0, false));
        let s1 = engine.step(1);
        let s2 = engine.step(2);
        let s3 = engine.step(3);
        assert_eq!(s1.mode, HeatPumpMode::Starting);
        assert_eq!(s2.mode, HeatPumpMode::Heating);
        assert_eq!(s1.heat_pump_w, 0.0);
        assert_eq!(s2.heat_pump_w, 0.0);
        assert_eq!(s3.heat_pump_w, 20_000.0);
        assert!(s3.tank_c > s2.tank_c);
    }
}
