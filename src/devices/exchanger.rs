//! Heat-exchanger models turning a source supply temperature into deliverable tank power.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physics::{LMTD_CONVERGENCE_K, LMTD_EPSILON_K, flow_m3_per_h};

/// Which constraint bounded the delivered power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    /// The exchanger could not transfer the source's nominal power.
    Exchanger,
    /// The source delivered its nominal power; the exchanger had headroom.
    Source,
}

/// Outcome of one exchanger evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exchange {
    /// Power transferred into the tank (W, >= 0).
    pub power_w: f64,
    /// Theoretical exchanger power before the nominal cap (W, may be infinite).
    pub capacity_w: f64,
    /// Binding constraint.
    pub limit: Limit,
    /// Effective log-mean temperature difference (K), coil model only.
    pub lmtd_k: Option<f64>,
    /// Primary return temperature (°C), coil model only.
    pub return_temp_c: Option<f64>,
    /// Primary flow needed to carry `power_w` (m³/h), coil model only.
    pub primary_flow_m3_h: Option<f64>,
}

impl Exchange {
    /// A zero-power evaluation, used when a source is not running.
    pub fn idle() -> Self {
        Self {
            power_w: 0.0,
            capacity_w: 0.0,
            limit: Limit::Source,
            lmtd_k: None,
            return_temp_c: None,
            primary_flow_m3_h: None,
        }
    }

    /// Returns `true` when the exchanger, not the source, was the binding constraint.
    pub fn exchanger_limited(&self) -> bool {
        self.limit == Limit::Exchanger
    }
}

/// Common contract of every exchanger policy.
///
/// Implementations are stateless: the same temperatures always yield the same
/// power, and the result is always finite (except `capacity_w` for an
/// unlimited coupling) and non-negative.
pub trait HeatExchange {
    /// Theoretical power the exchanger can move from `source_temp_c` into a
    /// tank at `tank_temp_c`, ignoring any source limit (W).
    fn capacity_w(&self, source_temp_c: f64, tank_temp_c: f64) -> f64;

    /// Power actually delivered by a source of `nominal_w` through this exchanger.
    fn deliverable_power(&self, source_temp_c: f64, tank_temp_c: f64, nominal_w: f64) -> Exchange;

    /// Human-readable model name.
    fn model_name(&self) -> &'static str;
}

/// Caps `capacity_w` at `nominal_w`, floors at zero and records which side bound.
fn cap(capacity_w: f64, nominal_w: f64) -> (f64, Limit) {
    let nominal_w = nominal_w.max(0.0);
    if capacity_w < nominal_w {
        (capacity_w.max(0.0), Limit::Exchanger)
    } else {
        (nominal_w, Limit::Source)
    }
}

/// Source coupled to the tank without any exchanger limit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Direct;

impl HeatExchange for Direct {
    fn capacity_w(&self, _source_temp_c: f64, _tank_temp_c: f64) -> f64 {
        f64::INFINITY
    }

    fn deliverable_power(&self, _source_temp_c: f64, _tank_temp_c: f64, nominal_w: f64) -> Exchange {
        Exchange {
            power_w: nominal_w.max(0.0),
            capacity_w: f64::INFINITY,
            limit: Limit::Source,
            lmtd_k: None,
            return_temp_c: None,
            primary_flow_m3_h: None,
        }
    }

    fn model_name(&self) -> &'static str {
        "direct"
    }
}

/// High-flow coil whose capacity is linear in the source/tank temperature difference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UaLinear {
    /// Overall conductance U·A (W/K).
    pub ua_w_per_k: f64,
}

impl UaLinear {
    pub fn new(ua_w_per_k: f64) -> Self {
        Self { ua_w_per_k }
    }

    /// Builds the conductance from a coil's U-value and area.
    pub fn from_coil(u_w_per_m2k: f64, area_m2: f64) -> Self {
        Self::new(u_w_per_m2k * area_m2)
    }
}

impl HeatExchange for UaLinear {
    fn capacity_w(&self, source_temp_c: f64, tank_temp_c: f64) -> f64 {
        (self.ua_w_per_k * (source_temp_c - tank_temp_c)).max(0.0)
    }

    fn deliverable_power(&self, source_temp_c: f64, tank_temp_c: f64, nominal_w: f64) -> Exchange {
        let capacity_w = self.capacity_w(source_temp_c, tank_temp_c);
        let (power_w, limit) = cap(capacity_w, nominal_w);
        Exchange {
            power_w,
            capacity_w,
            limit,
            lmtd_k: None,
            return_temp_c: None,
            primary_flow_m3_h: None,
        }
    }

    fn model_name(&self) -> &'static str {
        "ua_linear"
    }
}

/// Immersed coil (serpentin) rated by its log-mean temperature difference.
///
/// The primary loop runs at a fixed temperature drop `primary_delta_k`; the
/// return leg can never be colder than the tank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmtdCoil {
    /// Heat-transfer coefficient (W/(m²·K)).
    pub u_w_per_m2k: f64,
    /// Exchange surface (m²).
    pub area_m2: f64,
    /// Supply-to-return temperature drop on the primary side (K).
    pub primary_delta_k: f64,
}

impl LmtdCoil {
    pub fn new(u_w_per_m2k: f64, area_m2: f64, primary_delta_k: f64) -> Self {
        Self {
            u_w_per_m2k,
            area_m2,
            primary_delta_k,
        }
    }

    pub fn ua_w_per_k(&self) -> f64 {
        self.u_w_per_m2k * self.area_m2
    }

    /// Primary return temperature for a given supply and tank temperature (°C).
    pub fn return_temp_c(&self, supply_temp_c: f64, tank_temp_c: f64) -> f64 {
        (supply_temp_c - self.primary_delta_k).max(tank_temp_c)
    }

    /// Effective LMTD between the primary loop and the tank (K).
    pub fn lmtd_k(&self, supply_temp_c: f64, tank_temp_c: f64) -> f64 {
        let return_temp_c = self.return_temp_c(supply_temp_c, tank_temp_c);
        log_mean_delta(supply_temp_c - tank_temp_c, return_temp_c - tank_temp_c)
    }
}

impl HeatExchange for LmtdCoil {
    fn capacity_w(&self, source_temp_c: f64, tank_temp_c: f64) -> f64 {
        self.ua_w_per_k() * self.lmtd_k(source_temp_c, tank_temp_c)
    }

    fn deliverable_power(&self, source_temp_c: f64, tank_temp_c: f64, nominal_w: f64) -> Exchange {
        let lmtd_k = self.lmtd_k(source_temp_c, tank_temp_c);
        let capacity_w = self.ua_w_per_k() * lmtd_k;
        let (power_w, limit) = cap(capacity_w, nominal_w);
        Exchange {
            power_w,
            capacity_w,
            limit,
            lmtd_k: Some(lmtd_k),
            return_temp_c: Some(self.return_temp_c(source_temp_c, tank_temp_c)),
            primary_flow_m3_h: Some(flow_m3_per_h(power_w, self.primary_delta_k)),
        }
    }

    fn model_name(&self) -> &'static str {
        "lmtd_coil"
    }
}

/// Numerically stable log-mean temperature difference.
///
/// Both differences are floored at [`LMTD_EPSILON_K`]. When they are closer
/// than [`LMTD_CONVERGENCE_K`] the limit value `delta_1` is returned as-is.
pub fn log_mean_delta(delta_1: f64, delta_2: f64) -> f64 {
    let delta_1 = delta_1.max(LMTD_EPSILON_K);
    let delta_2 = delta_2.max(LMTD_EPSILON_K);

    if (delta_1 - delta_2).abs() < LMTD_CONVERGENCE_K {
        return delta_1;
    }
    (delta_1 - delta_2) / (delta_1 / delta_2).ln()
}

/// Exchanger policy selected by configuration.
///
/// Static dispatch over the closed set of models, mirroring how the engine
/// holds typed components rather than trait objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exchanger {
    Direct(Direct),
    UaLinear(UaLinear),
    LmtdCoil(LmtdCoil),
}

impl Default for Exchanger {
    fn default() -> Self {
        Self::Direct(Direct)
    }
}

impl HeatExchange for Exchanger {
    fn capacity_w(&self, source_temp_c: f64, tank_temp_c: f64) -> f64 {
        match self {
            Self::Direct(x) => x.capacity_w(source_temp_c, tank_temp_c),
            Self::UaLinear(x) => x.capacity_w(source_temp_c, tank_temp_c),
            Self::LmtdCoil(x) => x.capacity_w(source_temp_c, tank_temp_c),
        }
    }

    fn deliverable_power(&self, source_temp_c: f64, tank_temp_c: f64, nominal_w: f64) -> Exchange {
        match self {
            Self::Direct(x) => x.deliverable_power(source_temp_c, tank_temp_c, nominal_w),
            Self::UaLinear(x) => x.deliverable_power(source_temp_c, tank_temp_c, nominal_w),
            Self::LmtdCoil(x) => x.deliverable_power(source_temp_c, tank_temp_c, nominal_w),
        }
    }

    fn model_name(&self) -> &'static str {
        match self {
            Self::Direct(x) => x.model_name(),
            Self::UaLinear(x) => x.model_name(),
            Self::LmtdCoil(x) => x.model_name(),
        }
    }
}

/// Temperatures that cannot drive any exchange through a coil.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error(
    "no heat exchange possible: supply {supply_c:.1} °C, return {return_c:.1} °C, tank {tank_c:.1} °C"
)]
pub struct NoExchange {
    pub supply_c: f64,
    pub return_c: f64,
    pub tank_c: f64,
}

/// Why a coil could not be rated.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SizingError {
    #[error("{field} {constraint}, got {value}")]
    InvalidParameter {
        field: &'static str,
        constraint: &'static str,
        value: f64,
    },
    #[error(transparent)]
    NoExchange(#[from] NoExchange),
}

fn check_positive(field: &'static str, value: f64) -> Result<(), SizingError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SizingError::InvalidParameter {
            field,
            constraint: "must be a finite value > 0",
            value,
        })
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), SizingError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SizingError::InvalidParameter {
            field,
            constraint: "must be finite",
            value,
        })
    }
}

/// Single-point coil rating at fixed temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoilSizing {
    /// Log-mean temperature difference (K).
    pub lmtd_k: f64,
    /// Power the coil can transfer at these temperatures (W).
    pub theoretical_w: f64,
    /// Power after the optional source cap (W).
    pub delivered_w: f64,
    /// Primary return temperature (°C).
    pub return_temp_c: f64,
    /// Primary flow required to carry `delivered_w` (m³/h).
    pub primary_flow_m3_h: f64,
    /// Whether the coil rather than the source bounds the delivered power.
    pub coil_limited: bool,
}

/// Rates `coil` at a steady operating point.
///
/// Unlike the time-stepped model, the return temperature is not clamped to
/// the tank temperature: a point where either leg is at or below the tank
/// temperature is reported as [`NoExchange`].
///
/// # Errors
///
/// Returns [`SizingError::InvalidParameter`] for a non-positive or non-finite
/// coil coefficient, a non-finite temperature or a negative nominal power, and
/// [`SizingError::NoExchange`] when `supply − tank ≤ 0` or `return − tank ≤ 0`.
pub fn size_coil(
    coil: &LmtdCoil,
    supply_temp_c: f64,
    tank_temp_c: f64,
    nominal_w: Option<f64>,
) -> Result<CoilSizing, SizingError> {
    check_positive("u_w_per_m2k", coil.u_w_per_m2k)?;
    check_positive("area_m2", coil.area_m2)?;
    check_positive("primary_delta_k", coil.primary_delta_k)?;
    check_finite("supply_temp_c", supply_temp_c)?;
    check_finite("tank_temp_c", tank_temp_c)?;
    if let Some(nominal) = nominal_w {
        if !(nominal >= 0.0 && nominal.is_finite()) {
            return Err(SizingError::InvalidParameter {
                field: "nominal_w",
                constraint: "must be a finite value >= 0",
                value: nominal,
            });
        }
    }

    let return_temp_c = supply_temp_c - coil.primary_delta_k;
    let delta_1 = supply_temp_c - tank_temp_c;
    let delta_2 = return_temp_c - tank_temp_c;

    if delta_1 <= 0.0 || delta_2 <= 0.0 {
        return Err(NoExchange {
            supply_c: supply_temp_c,
            return_c: return_temp_c,
            tank_c: tank_temp_c,
        }
        .into());
    }

    let lmtd_k = log_mean_delta(delta_1, delta_2);
    let theoretical_w = coil.ua_w_per_k() * lmtd_k;
    let (delivered_w, coil_limited) = match nominal_w {
        Some(nominal) => {
            let (power, limit) = cap(theoretical_w, nominal);
            (power, limit == Limit::Exchanger)
        }
        None => (theoretical_w, false),
    };

    Ok(CoilSizing {
        lmtd_k,
        theoretical_w,
        delivered_w,
        return_temp_c,
        primary_flow_m3_h: flow_m3_per_h(delivered_w, coil.primary_delta_k),
        coil_limited,
    })
}
