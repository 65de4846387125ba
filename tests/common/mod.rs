//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use dhw_sim::config::{BoilerConfig, DrawOffConfig, ExchangerConfig, ScenarioConfig};
use dhw_sim::sim::engine::Engine;
use dhw_sim::sim::types::SimulationResult;

/// Single heat-up through a non-limiting coupling: no losses, no draw-off,
/// no backup, no startup delay or hold-off.
pub fn heat_up_scenario(volume_l: f64, from_c: f64, to_c: f64, heat_pump_kw: f64) -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.simulation.dt_s = 10.0;
    cfg.simulation.horizon_h = 24.0;
    cfg.simulation.stop_at_setpoint = true;
    cfg.tank.volume_l = volume_l;
    cfg.tank.ua_w_per_k = 0.0;
    cfg.tank.loop_loss_kw = 0.0;
    cfg.tank.cold_inlet_c = from_c.min(10.0);
    cfg.tank.initial_c = from_c;
    cfg.control.setpoint_c = to_c;
    cfg.control.startup_delay_min = 0.0;
    cfg.control.anti_short_cycle_min = 0.0;
    cfg.heat_pump.nominal_kw = heat_pump_kw;
    cfg.exchanger = ExchangerConfig::default();
    cfg.boiler = BoilerConfig {
        nominal_kw: 0.0,
        ..BoilerConfig::default()
    };
    cfg.draw_off = DrawOffConfig {
        daily_volume_l: 0.0,
        ..DrawOffConfig::default()
    };
    cfg
}

/// Builds and runs `cfg`, panicking with the configuration error if invalid.
pub fn run(cfg: &ScenarioConfig) -> SimulationResult {
    match cfg.build() {
        Ok(sim) => Engine::new(sim).run(),
        Err(e) => panic!("scenario should be valid: {e}"),
    }
}

/// Runs a built-in preset.
pub fn run_preset(name: &str) -> SimulationResult {
    match ScenarioConfig::from_preset(name) {
        Ok(cfg) => run(&cfg),
        Err(e) => panic!("preset should load: {e}"),
    }
}
