use serde::{Deserialize, Serialize};

use crate::devices::exchanger::{Exchange, Exchanger, HeatExchange};

/// How the heat pump chooses its flow temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyTemperature {
    /// Constant flow temperature (°C).
    Fixed { temp_c: f64 },
    /// Flow follows the tank at a fixed offset, never exceeding `setpoint + offset`.
    Tracking { offset_k: f64 },
}

impl SupplyTemperature {
    /// Flow temperature for the current tank state (°C).
    pub fn temp_c(&self, tank_temp_c: f64, setpoint_c: f64) -> f64 {
        match *self {
            Self::Fixed { temp_c } => temp_c,
            Self::Tracking { offset_k } => (tank_temp_c + offset_k).min(setpoint_c + offset_k),
        }
    }
}

/// Linear power modulation over a heat-up.
///
/// The requested power falls from nominal at the start of a heat-up to
/// `min_ratio` of nominal as the tank approaches setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulation {
    /// Lowest fraction of nominal power the compressor runs at (0, 1].
    pub min_ratio: f64,
    /// Temperature span over which the ratio falls from 1 (K, > 0).
    pub span_k: f64,
}

impl Modulation {
    /// Fraction of nominal power requested with the tank at `tank_temp_c`.
    pub fn factor(&self, tank_temp_c: f64, setpoint_c: f64) -> f64 {
        let ratio = (setpoint_c - tank_temp_c) / self.span_k;
        ratio.max(self.min_ratio).min(1.0)
    }
}

/// Air/water heat pump charging the tank through an exchanger.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatPump {
    /// Nominal thermal output (W).
    pub nominal_w: f64,
    /// Coefficient of performance, thermal over electrical (> 0).
    pub cop: f64,
    pub supply: SupplyTemperature,
    pub modulation: Option<Modulation>,
    pub exchanger: Exchanger,
}

impl HeatPump {
    pub fn supply_temp_c(&self, tank_temp_c: f64, setpoint_c: f64) -> f64 {
        self.supply.temp_c(tank_temp_c, setpoint_c)
    }

    /// Thermal power the compressor asks for before any exchanger limit (W).
    pub fn requested_w(&self, tank_temp_c: f64, setpoint_c: f64) -> f64 {
        let factor = self
            .modulation
            .map_or(1.0, |m| m.factor(tank_temp_c, setpoint_c));
        self.nominal_w * factor
    }

    /// Power delivered into the tank while running at flow temperature `supply_c`.
    pub fn deliver(&self, supply_c: f64, tank_temp_c: f64, setpoint_c: f64) -> Exchange {
        let requested_w = self.requested_w(tank_temp_c, setpoint_c);
        self.exchanger
            .deliverable_power(supply_c, tank_temp_c, requested_w)
    }

    /// Electrical input for a given thermal output (W).
    pub fn electrical_w(&self, thermal_w: f64) -> f64 {
        thermal_w / self.cop
    }
}
