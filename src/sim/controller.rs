//! Heat-source control: heat-pump state machine and backup-boiler dispatch.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::devices::exchanger::{Exchange, HeatExchange};
use crate::devices::{Boiler, HeatPump};

/// Operating mode of the heat pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatPumpMode {
    /// Idle, waiting for the tank to cool below the restart threshold.
    Off,
    /// Compressor starting; no heat delivered yet.
    Starting,
    /// Delivering heat to the tank.
    Heating,
}

impl fmt::Display for HeatPumpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Off => "off",
            Self::Starting => "starting",
            Self::Heating => "heating",
        };
        f.write_str(s)
    }
}

/// Mode and timers carried from one step to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    pub mode: HeatPumpMode,
    /// Time spent in `Starting` (s).
    pub wait_timer_s: f64,
    /// Time since the backup-eligibility clock started (s).
    pub backup_timer_s: f64,
    /// Time since the last `Heating -> Off` transition (s).
    pub since_stop_s: f64,
}

impl Default for ControllerState {
    /// `Off`, with `since_stop_s` large enough that the first start is never held off.
    fn default() -> Self {
        Self {
            mode: HeatPumpMode::Off,
            wait_timer_s: 0.0,
            backup_timer_s: 0.0,
            since_stop_s: f64::MAX,
        }
    }
}

/// Thresholds and delays of the control law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlParams {
    /// Tank target temperature (°C).
    pub setpoint_c: f64,
    /// Restart when the tank falls this far below setpoint (K, > 0).
    pub restart_delta_k: f64,
    /// Time between a start request and heat delivery (s).
    pub startup_delay_s: f64,
    /// Minimum off-time after a stop (s).
    pub anti_short_cycle_s: f64,
    /// Backup is permitted once its timer exceeds this (s).
    pub backup_delay_s: f64,
    /// Heating stops when the supply is no more than this above the tank (K).
    pub source_guard_k: f64,
    /// Whether the backup may fire while the heat pump is still starting.
    pub backup_during_startup: bool,
    /// Use `<`/`>` instead of `≤`/`≥` for the restart and setpoint thresholds.
    pub strict_thresholds: bool,
}

impl ControlParams {
    pub fn restart_threshold_c(&self) -> f64 {
        self.setpoint_c - self.restart_delta_k
    }

    /// Whether the tank is cold enough to request a start.
    pub fn needs_restart(&self, tank_temp_c: f64) -> bool {
        if self.strict_thresholds {
            tank_temp_c < self.restart_threshold_c()
        } else {
            tank_temp_c <= self.restart_threshold_c()
        }
    }

    /// Whether the tank has reached setpoint.
    pub fn at_setpoint(&self, tank_temp_c: f64) -> bool {
        if self.strict_thresholds {
            tank_temp_c > self.setpoint_c
        } else {
            tank_temp_c >= self.setpoint_c
        }
    }
}

/// What the controller sees at the start of a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Tank temperature at the start of the step (°C).
    pub tank_temp_c: f64,
    /// Heat-pump flow temperature for that tank temperature (°C).
    pub supply_temp_c: f64,
}

/// Which sources may deliver during the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    pub heat_pump_on: bool,
    pub backup_permitted: bool,
}

/// Advances the state machine by one step of `dt_s` seconds.
///
/// Pure: the same inputs always produce the same next state and decision.
pub fn transition(
    state: &ControllerState,
    params: &ControlParams,
    obs: Observation,
    dt_s: f64,
) -> (ControllerState, Decision) {
    let mut next = *state;
    let mut decision = Decision::default();

    match state.mode {
        HeatPumpMode::Off => {
            next.since_stop_s += dt_s;
            if params.needs_restart(obs.tank_temp_c) && next.since_stop_s >= params.anti_short_cycle_s
            {
                next.mode = HeatPumpMode::Starting;
                next.wait_timer_s = 0.0;
                next.backup_timer_s = 0.0;
            }
        }
        HeatPumpMode::Starting => {
            next.wait_timer_s += dt_s;
            next.backup_timer_s += dt_s;
            decision.backup_permitted =
                params.backup_during_startup && next.backup_timer_s > params.backup_delay_s;
            if next.wait_timer_s >= params.startup_delay_s {
                next.mode = HeatPumpMode::Heating;
            }
        }
        HeatPumpMode::Heating => {
            let source_exhausted = obs.supply_temp_c <= obs.tank_temp_c + params.source_guard_k;
            if params.at_setpoint(obs.tank_temp_c) || source_exhausted {
                next.mode = HeatPumpMode::Off;
                next.since_stop_s = 0.0;
                next.backup_timer_s = 0.0;
            } else {
                next.backup_timer_s += dt_s;
                decision.heat_pump_on = true;
                decision.backup_permitted = next.backup_timer_s > params.backup_delay_s;
            }
        }
    }

    (next, decision)
}

/// Power dispatched by the controller for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispatch {
    /// Mode after the transition.
    pub mode: HeatPumpMode,
    /// Heat-pump flow temperature (°C).
    pub supply_temp_c: f64,
    /// Heat-pump exchange; idle unless heating.
    pub heat_pump: Exchange,
    /// Backup power delivered to the tank (W).
    pub backup_w: f64,
    /// Heat-pump exchanger capacity at the current temperatures (W), `None` when unlimited.
    pub exchanger_capacity_w: Option<f64>,
}

/// Coordinates the heat pump and the backup boiler.
///
/// Owns the only mutable control state; advanced exactly once per engine step.
#[derive(Debug, Clone)]
pub struct HeatSourceController {
    params: ControlParams,
    heat_pump: HeatPump,
    boiler: Boiler,
    state: ControllerState,
}

impl HeatSourceController {
    pub fn new(params: ControlParams, heat_pump: HeatPump, boiler: Boiler) -> Self {
        Self {
            params,
            heat_pump,
            boiler,
            state: ControllerState::default(),
        }
    }

    /// Evaluates one step with the tank at `tank_temp_c` and returns the powers to apply.
    pub fn step(&mut self, tank_temp_c: f64, dt_s: f64) -> Dispatch {
        let setpoint_c = self.params.setpoint_c;
        let supply_temp_c = self.heat_pump.supply_temp_c(tank_temp_c, setpoint_c);
        let obs = Observation {
            tank_temp_c,
            supply_temp_c,
        };

        let (next, decision) = transition(&self.state, &self.params, obs, dt_s);
        if next.mode != self.state.mode {
            debug!(
                from = %self.state.mode,
                to = %next.mode,
                tank_c = tank_temp_c,
                "heat pump mode change"
            );
        }
        self.state = next;

        let capacity_w = self
            .heat_pump
            .exchanger
            .capacity_w(supply_temp_c, tank_temp_c);

        let heat_pump = if decision.heat_pump_on {
            self.heat_pump
                .deliver(supply_temp_c, tank_temp_c, setpoint_c)
        } else {
            Exchange::idle()
        };

        let backup_w = if !decision.backup_permitted {
            0.0
        } else if self.boiler.shares_exchanger {
            self.boiler.shared_power_w(capacity_w, heat_pump.power_w)
        } else {
            self.boiler.dedicated_power(tank_temp_c).power_w
        };

        Dispatch {
            mode: next.mode,
            supply_temp_c,
            heat_pump,
            backup_w,
            exchanger_capacity_w: capacity_w.is_finite().then_some(capacity_w),
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn params(&self) -> &ControlParams {
        &self.params
    }

    pub fn heat_pump(&self) -> &HeatPump {
        &self.heat_pump
    }
}
