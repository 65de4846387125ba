//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::devices::draw_off::{DEFAULT_HOURLY_PCT, HOURS_PER_DAY};
use crate::devices::exchanger::{Direct, Exchanger, LmtdCoil, UaLinear};
use crate::devices::heat_pump::{Modulation, SupplyTemperature};
use crate::devices::{Boiler, DrawOffProfile, HeatPump, Tank};
use crate::physics::{SECONDS_PER_HOUR, SECONDS_PER_MINUTE, WATTS_PER_KILOWATT};
use crate::sim::controller::ControlParams;
use crate::sim::types::SimConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default, then turn it into
/// a validated [`SimConfig`] with [`ScenarioConfig::build`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Time step, horizon and termination.
    pub simulation: SimulationConfig,
    /// Storage tank and its losses.
    pub tank: TankConfig,
    /// Control thresholds and delays.
    pub control: ControlConfig,
    /// Heat pump parameters.
    pub heat_pump: HeatPumpConfig,
    /// Heat-pump exchanger.
    pub exchanger: ExchangerConfig,
    /// Backup boiler parameters.
    pub boiler: BoilerConfig,
    /// Hot-water consumption.
    pub draw_off: DrawOffConfig,
}

/// Time step, horizon and termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Integration time step (s, > 0).
    pub dt_s: f64,
    /// Simulated horizon (h, > 0). Acts as a cutoff with `stop_at_setpoint`.
    pub horizon_h: f64,
    /// End the run at the first step that reaches setpoint.
    pub stop_at_setpoint: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt_s: 10.0,
            horizon_h: 24.0,
            stop_at_setpoint: false,
        }
    }
}

/// Storage tank and its losses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TankConfig {
    /// Stored volume (L, > 0).
    pub volume_l: f64,
    /// Shell loss coefficient (W/K, >= 0).
    pub ua_w_per_k: f64,
    /// Recirculation-loop loss (kW, >= 0).
    pub loop_loss_kw: f64,
    /// Plant-room temperature (°C).
    pub ambient_c: f64,
    /// Cold mains temperature (°C).
    pub cold_inlet_c: f64,
    /// Tank temperature at `t = 0` (°C).
    pub initial_c: f64,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            volume_l: 900.0,
            ua_w_per_k: 1.0,
            loop_loss_kw: 0.5,
            ambient_c: 15.0,
            cold_inlet_c: 10.0,
            initial_c: 55.0,
        }
    }
}

/// Control thresholds and delays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    /// Tank target temperature (°C).
    pub setpoint_c: f64,
    /// Restart hysteresis below setpoint (K, > 0).
    pub restart_delta_c: f64,
    /// Heat-pump startup delay (min, >= 0).
    pub startup_delay_min: f64,
    /// Minimum off-time between runs (min, >= 0).
    pub anti_short_cycle_min: f64,
    /// Backup activation delay (min, >= 0).
    pub backup_delay_min: f64,
    /// Stop heating when the supply is within this of the tank (K, >= 0).
    pub source_guard_c: f64,
    /// Allow the backup to fire while the heat pump is starting.
    pub backup_during_startup: bool,
    /// Strict `<`/`>` comparisons for the restart and setpoint thresholds.
    pub strict_thresholds: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            setpoint_c: 60.0,
            restart_delta_c: 7.0,
            startup_delay_min: 3.0,
            anti_short_cycle_min: 10.0,
            backup_delay_min: 15.0,
            source_guard_c: 0.1,
            backup_during_startup: true,
            strict_thresholds: false,
        }
    }
}

/// Heat-pump flow temperature policy: `"fixed"` or `"tracking"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyMode {
    Fixed,
    Tracking,
}

/// Heat pump parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatPumpConfig {
    /// Nominal thermal power (kW, >= 0).
    pub nominal_kw: f64,
    /// Coefficient of performance (> 0).
    pub cop: f64,
    pub supply: SupplyMode,
    /// Flow temperature in `fixed` mode (°C).
    pub supply_temp_c: f64,
    /// Flow offset above the tank in `tracking` mode (K, > 0).
    pub supply_offset_c: f64,
    /// Enables modulation down to this fraction of nominal power, in (0, 1].
    pub min_modulation: Option<f64>,
}

impl Default for HeatPumpConfig {
    fn default() -> Self {
        Self {
            nominal_kw: 15.0,
            cop: 2.0,
            supply: SupplyMode::Fixed,
            supply_temp_c: 70.0,
            supply_offset_c: 10.0,
            min_modulation: None,
        }
    }
}

/// Exchanger model: `"direct"`, `"ua_linear"` or `"lmtd_coil"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangerModel {
    Direct,
    UaLinear,
    LmtdCoil,
}

/// Exchanger geometry. Unused coefficients are ignored by `direct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExchangerConfig {
    pub model: ExchangerModel,
    /// Heat-transfer coefficient (W/(m²·K), > 0).
    pub u_w_per_m2k: f64,
    /// Exchange surface (m², > 0).
    pub area_m2: f64,
    /// Primary supply/return drop, coil model only (K, > 0).
    pub primary_delta_c: f64,
}

impl Default for ExchangerConfig {
    fn default() -> Self {
        Self {
            model: ExchangerModel::Direct,
            u_w_per_m2k: 600.0,
            area_m2: 3.5,
            primary_delta_c: 7.0,
        }
    }
}

impl ExchangerConfig {
    /// UA-linear exchanger with `UA = u · area`.
    pub fn ua_linear(u_w_per_m2k: f64, area_m2: f64) -> Self {
        Self {
            model: ExchangerModel::UaLinear,
            u_w_per_m2k,
            area_m2,
            ..Self::default()
        }
    }

    pub fn lmtd_coil(u_w_per_m2k: f64, area_m2: f64, primary_delta_c: f64) -> Self {
        Self {
            model: ExchangerModel::LmtdCoil,
            u_w_per_m2k,
            area_m2,
            primary_delta_c,
        }
    }

    fn to_exchanger(&self) -> Exchanger {
        match self.model {
            ExchangerModel::Direct => Exchanger::Direct(Direct),
            ExchangerModel::UaLinear => {
                Exchanger::UaLinear(UaLinear::from_coil(self.u_w_per_m2k, self.area_m2))
            }
            ExchangerModel::LmtdCoil => Exchanger::LmtdCoil(LmtdCoil::new(
                self.u_w_per_m2k,
                self.area_m2,
                self.primary_delta_c,
            )),
        }
    }

    fn validate_into(&self, prefix: &str, errors: &mut Vec<FieldError>) {
        if self.model == ExchangerModel::Direct {
            return;
        }
        require_positive(errors, &format!("{prefix}.u_w_per_m2k"), self.u_w_per_m2k);
        require_positive(errors, &format!("{prefix}.area_m2"), self.area_m2);
        if self.model == ExchangerModel::LmtdCoil {
            require_positive(
                errors,
                &format!("{prefix}.primary_delta_c"),
                self.primary_delta_c,
            );
        }
    }
}

/// Backup boiler parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoilerConfig {
    /// Nominal thermal power (kW, >= 0; 0 disables the backup).
    pub nominal_kw: f64,
    /// Boiler flow temperature (°C).
    pub supply_temp_c: f64,
    /// Feed the heat pump's exchanger instead of a dedicated one.
    pub shares_exchanger: bool,
    /// Dedicated exchanger, used when `shares_exchanger` is false.
    pub exchanger: ExchangerConfig,
}

impl Default for BoilerConfig {
    fn default() -> Self {
        Self {
            nominal_kw: 50.0,
            supply_temp_c: 80.0,
            shares_exchanger: false,
            exchanger: ExchangerConfig::default(),
        }
    }
}

/// Hot-water consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrawOffConfig {
    /// Daily volume at 60 °C (L, >= 0).
    pub daily_volume_l: f64,
    /// 24 hourly shares of the daily volume (%, >= 0). Used as given.
    pub hourly_pct: Vec<f64>,
}

impl Default for DrawOffConfig {
    fn default() -> Self {
        Self {
            daily_volume_l: 1000.0,
            hourly_pct: DEFAULT_HOURLY_PCT.to_vec(),
        }
    }
}

impl DrawOffConfig {
    fn none() -> Self {
        Self {
            daily_volume_l: 0.0,
            ..Self::default()
        }
    }
}

/// Validation failure for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// Dotted field path (e.g., `"tank.volume_l"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

/// Any failure to obtain a valid configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid configuration:\n{}", format_field_errors(.0))]
    Invalid(Vec<FieldError>),
    #[error("cannot read \"{}\": {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scenario TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown preset \"{name}\", available: {available}")]
    UnknownPreset { name: String, available: String },
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// Negated comparisons so NaN is rejected too.
fn require_positive(errors: &mut Vec<FieldError>, field: &str, value: f64) {
    if !(value > 0.0 && value.is_finite()) {
        errors.push(FieldError::new(field, "must be a finite value > 0"));
    }
}

fn require_non_negative(errors: &mut Vec<FieldError>, field: &str, value: f64) {
    if !(value >= 0.0 && value.is_finite()) {
        errors.push(FieldError::new(field, "must be a finite value >= 0"));
    }
}

fn require_finite(errors: &mut Vec<FieldError>, field: &str, value: f64) {
    if !value.is_finite() {
        errors.push(FieldError::new(field, "must be finite"));
    }
}

impl ScenarioConfig {
    /// Hybrid installation with a direct-coupled heat pump over one day.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Heat pump behind a UA-limited coil, independent backup boiler.
    pub fn ua_coil() -> Self {
        Self {
            tank: TankConfig {
                volume_l: 1000.0,
                ua_w_per_k: 1.5,
                ..TankConfig::default()
            },
            control: ControlConfig {
                restart_delta_c: 5.0,
                backup_delay_min: 20.0,
                ..ControlConfig::default()
            },
            heat_pump: HeatPumpConfig {
                cop: 3.0,
                ..HeatPumpConfig::default()
            },
            exchanger: ExchangerConfig::ua_linear(600.0, 3.5),
            draw_off: DrawOffConfig {
                daily_volume_l: 1500.0,
                ..DrawOffConfig::default()
            },
            ..Self::default()
        }
    }

    /// Heat pump and boiler sharing one UA-limited coil.
    pub fn shared_coil() -> Self {
        Self {
            tank: TankConfig {
                volume_l: 1000.0,
                ua_w_per_k: 1.5,
                loop_loss_kw: 0.4,
                initial_c: 50.0,
                ..TankConfig::default()
            },
            control: ControlConfig {
                restart_delta_c: 5.0,
                backup_delay_min: 20.0,
                ..ControlConfig::default()
            },
            heat_pump: HeatPumpConfig {
                cop: 3.0,
                supply_temp_c: 65.0,
                ..HeatPumpConfig::default()
            },
            exchanger: ExchangerConfig::ua_linear(600.0, 2.5),
            boiler: BoilerConfig {
                nominal_kw: 25.0,
                shares_exchanger: true,
                ..BoilerConfig::default()
            },
            draw_off: DrawOffConfig {
                daily_volume_l: 1500.0,
                ..DrawOffConfig::default()
            },
            ..Self::default()
        }
    }

    /// Single heat-up from cold with a modulating heat pump and tracking flow.
    pub fn modulated_heat_up() -> Self {
        Self {
            simulation: SimulationConfig {
                stop_at_setpoint: true,
                ..SimulationConfig::default()
            },
            tank: TankConfig {
                volume_l: 1000.0,
                ua_w_per_k: 0.0,
                loop_loss_kw: 0.0,
                initial_c: 10.0,
                ..TankConfig::default()
            },
            control: ControlConfig {
                startup_delay_min: 0.0,
                anti_short_cycle_min: 0.0,
                ..ControlConfig::default()
            },
            heat_pump: HeatPumpConfig {
                nominal_kw: 6.0,
                cop: 3.0,
                supply: SupplyMode::Tracking,
                supply_offset_c: 10.0,
                min_modulation: Some(0.3),
                ..HeatPumpConfig::default()
            },
            exchanger: ExchangerConfig::lmtd_coil(600.0, 5.5, 7.0),
            boiler: BoilerConfig {
                nominal_kw: 0.0,
                ..BoilerConfig::default()
            },
            draw_off: DrawOffConfig::none(),
        }
    }

    /// Single heat-up through a coil at a fixed 62 °C flow.
    pub fn fixed_supply_heat_up() -> Self {
        Self {
            simulation: SimulationConfig {
                horizon_h: 6.0,
                stop_at_setpoint: true,
                ..SimulationConfig::default()
            },
            tank: TankConfig {
                volume_l: 300.0,
                ua_w_per_k: 0.0,
                loop_loss_kw: 0.0,
                initial_c: 20.0,
                ..TankConfig::default()
            },
            control: ControlConfig {
                setpoint_c: 55.0,
                startup_delay_min: 0.0,
                anti_short_cycle_min: 0.0,
                ..ControlConfig::default()
            },
            heat_pump: HeatPumpConfig {
                nominal_kw: 20.0,
                cop: 3.0,
                supply_temp_c: 62.0,
                ..HeatPumpConfig::default()
            },
            exchanger: ExchangerConfig::lmtd_coil(800.0, 5.5, 7.0),
            boiler: BoilerConfig {
                nominal_kw: 0.0,
                ..BoilerConfig::default()
            },
            draw_off: DrawOffConfig::none(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &[
        "baseline",
        "ua_coil",
        "shared_coil",
        "modulated_heat_up",
        "fixed_supply_heat_up",
    ];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownPreset`] if the name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigurationError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "ua_coil" => Ok(Self::ua_coil()),
            "shared_coil" => Ok(Self::shared_coil()),
            "modulated_heat_up" => Ok(Self::modulated_heat_up()),
            "fixed_supply_heat_up" => Ok(Self::fixed_supply_heat_up()),
            _ => Err(ConfigurationError::UnknownPreset {
                name: name.to_string(),
                available: Self::PRESETS.join(", "),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(s)?)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        require_positive(&mut errors, "simulation.dt_s", s.dt_s);
        require_positive(&mut errors, "simulation.horizon_h", s.horizon_h);
        if s.dt_s > 0.0 && s.horizon_h * SECONDS_PER_HOUR < s.dt_s {
            errors.push(FieldError::new(
                "simulation.horizon_h",
                "must cover at least one time step",
            ));
        }

        let t = &self.tank;
        require_positive(&mut errors, "tank.volume_l", t.volume_l);
        require_non_negative(&mut errors, "tank.ua_w_per_k", t.ua_w_per_k);
        require_non_negative(&mut errors, "tank.loop_loss_kw", t.loop_loss_kw);
        require_finite(&mut errors, "tank.ambient_c", t.ambient_c);
        require_finite(&mut errors, "tank.cold_inlet_c", t.cold_inlet_c);
        require_finite(&mut errors, "tank.initial_c", t.initial_c);

        let c = &self.control;
        if !c.setpoint_c.is_finite() {
            errors.push(FieldError::new("control.setpoint_c", "must be finite"));
        } else if !(c.setpoint_c > t.cold_inlet_c) {
            errors.push(FieldError::new(
                "control.setpoint_c",
                "must be > tank.cold_inlet_c",
            ));
        }
        require_positive(&mut errors, "control.restart_delta_c", c.restart_delta_c);
        for (field, value) in [
            ("control.startup_delay_min", c.startup_delay_min),
            ("control.anti_short_cycle_min", c.anti_short_cycle_min),
            ("control.backup_delay_min", c.backup_delay_min),
            ("control.source_guard_c", c.source_guard_c),
        ] {
            require_non_negative(&mut errors, field, value);
        }

        let hp = &self.heat_pump;
        require_non_negative(&mut errors, "heat_pump.nominal_kw", hp.nominal_kw);
        require_positive(&mut errors, "heat_pump.cop", hp.cop);
        match hp.supply {
            SupplyMode::Fixed => {
                require_finite(&mut errors, "heat_pump.supply_temp_c", hp.supply_temp_c);
            }
            SupplyMode::Tracking => {
                require_positive(&mut errors, "heat_pump.supply_offset_c", hp.supply_offset_c);
            }
        }
        if let Some(ratio) = hp.min_modulation {
            if !(ratio > 0.0 && ratio <= 1.0) {
                errors.push(FieldError::new(
                    "heat_pump.min_modulation",
                    "must be in (0.0, 1.0]",
                ));
            }
        }

        self.exchanger.validate_into("exchanger", &mut errors);

        let b = &self.boiler;
        require_non_negative(&mut errors, "boiler.nominal_kw", b.nominal_kw);
        require_finite(&mut errors, "boiler.supply_temp_c", b.supply_temp_c);
        if !b.shares_exchanger {
            b.exchanger.validate_into("boiler.exchanger", &mut errors);
        }

        let d = &self.draw_off;
        require_non_negative(&mut errors, "draw_off.daily_volume_l", d.daily_volume_l);
        if d.hourly_pct.len() != HOURS_PER_DAY {
            errors.push(FieldError::new(
                "draw_off.hourly_pct",
                format!(
                    "must have exactly {HOURS_PER_DAY} entries, got {}",
                    d.hourly_pct.len()
                ),
            ));
        }
        if let Some(hour) = d
            .hourly_pct
            .iter()
            .position(|p| !(*p >= 0.0 && p.is_finite()))
        {
            errors.push(FieldError::new(
                format!("draw_off.hourly_pct[{hour}]"),
                "must be a finite value >= 0",
            ));
        }

        errors
    }

    /// Validates the scenario and converts it into SI units.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Invalid`] with every failing field.
    pub fn build(&self) -> Result<SimConfig, ConfigurationError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(ConfigurationError::Invalid(errors));
        }

        let s = &self.simulation;
        let t = &self.tank;
        let c = &self.control;
        let hp = &self.heat_pump;
        let b = &self.boiler;

        let supply = match hp.supply {
            SupplyMode::Fixed => SupplyTemperature::Fixed {
                temp_c: hp.supply_temp_c,
            },
            SupplyMode::Tracking => SupplyTemperature::Tracking {
                offset_k: hp.supply_offset_c,
            },
        };
        // Span of a heat-up from the initial temperature; a tank starting at or
        // above setpoint falls back to the restart hysteresis.
        let heat_up_span = c.setpoint_c - t.initial_c;
        let span_k = if heat_up_span > 0.0 {
            heat_up_span
        } else {
            c.restart_delta_c
        };
        let modulation = hp
            .min_modulation
            .map(|min_ratio| Modulation { min_ratio, span_k });

        let mut hourly_pct = [0.0; HOURS_PER_DAY];
        hourly_pct.copy_from_slice(&self.draw_off.hourly_pct);

        Ok(SimConfig {
            dt_s: s.dt_s,
            horizon_s: s.horizon_h * SECONDS_PER_HOUR,
            stop_at_setpoint: s.stop_at_setpoint,
            initial_tank_c: t.initial_c,
            tank: Tank {
                volume_l: t.volume_l,
                ua_w_per_k: t.ua_w_per_k,
                loop_loss_w: t.loop_loss_kw * WATTS_PER_KILOWATT,
                ambient_c: t.ambient_c,
                cold_inlet_c: t.cold_inlet_c,
            },
            heat_pump: HeatPump {
                nominal_w: hp.nominal_kw * WATTS_PER_KILOWATT,
                cop: hp.cop,
                supply,
                modulation,
                exchanger: self.exchanger.to_exchanger(),
            },
            boiler: Boiler {
                nominal_w: b.nominal_kw * WATTS_PER_KILOWATT,
                supply_temp_c: b.supply_temp_c,
                shares_exchanger: b.shares_exchanger,
                exchanger: b.exchanger.to_exchanger(),
            },
            control: ControlParams {
                setpoint_c: c.setpoint_c,
                restart_delta_k: c.restart_delta_c,
                startup_delay_s: c.startup_delay_min * SECONDS_PER_MINUTE,
                anti_short_cycle_s: c.anti_short_cycle_min * SECONDS_PER_MINUTE,
                backup_delay_s: c.backup_delay_min * SECONDS_PER_MINUTE,
                source_guard_k: c.source_guard_c,
                backup_during_startup: c.backup_during_startup,
                strict_thresholds: c.strict_thresholds,
            },
            draw_off: DrawOffProfile::new(hourly_pct, self.draw_off.daily_volume_l, t.cold_inlet_c),
        })
    }
}

impl TryFrom<&ScenarioConfig> for SimConfig {
    type Error = ConfigurationError;

    fn try_from(scenario: &ScenarioConfig) -> Result<Self, Self::Error> {
        scenario.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::exchanger::HeatExchange;
    use rstest::rstest;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(matches!(
            err,
            Err(ConfigurationError::UnknownPreset { ref name, .. }) if name == "nonexistent"
        ));
        let msg = err.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(msg.contains("shared_coil"));
    }

    #[test]
    fn all_presets_build() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let built = cfg.as_ref().map(ScenarioConfig::build);
            assert!(
                matches!(built, Ok(Ok(_))),
                "preset \"{name}\" should build: {built:?}"
            );
        }
    }

    #[test]
    fn build_converts_units() {
        let sim = ScenarioConfig::shared_coil().build().ok();
        let sim = sim.as_ref();
        assert_eq!(sim.map(|s| s.heat_pump().nominal_w), Some(15_000.0));
        assert_eq!(sim.map(|s| s.boiler().nominal_w), Some(25_000.0));
        assert_eq!(sim.map(|s| s.tank().loop_loss_w), Some(400.0));
        assert_eq!(sim.map(|s| s.control().backup_delay_s), Some(1_200.0));
        assert_eq!(sim.map(|s| s.horizon_s()), Some(86_400.0));
        assert_eq!(sim.map(|s| s.total_steps()), Some(8_640));
        assert_eq!(
            sim.map(|s| s.heat_pump().exchanger.model_name()),
            Some("ua_linear")
        );
    }

    #[test]
    fn modulation_span_from_heat_up() {
        let sim = ScenarioConfig::modulated_heat_up().build().ok();
        let modulation = sim.and_then(|s| s.heat_pump().modulation);
        assert_eq!(
            modulation,
            Some(Modulation {
                min_ratio: 0.3,
                span_k: 50.0
            })
        );
    }

    #[test]
    fn modulation_span_falls_back_to_restart_delta() {
        let mut cfg = ScenarioConfig::modulated_heat_up();
        cfg.tank.initial_c = 65.0;
        let span = cfg
            .build()
            .ok()
            .and_then(|s| s.heat_pump().modulation)
            .map(|m| m.span_k);
        assert_eq!(span, Some(7.0));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
dt_s = 5.0
horizon_h = 12.0
stop_at_setpoint = true

[tank]
volume_l = 500.0
initial_c = 20.0

[control]
setpoint_c = 55.0
strict_thresholds = true

[heat_pump]
nominal_kw = 8.0
supply = "tracking"
supply_offset_c = 8.0
min_modulation = 0.4

[exchanger]
model = "lmtd_coil"
u_w_per_m2k = 700.0
area_m2 = 4.0
primary_delta_c = 5.0

[boiler]
nominal_kw = 0.0

[boiler.exchanger]
model = "ua_linear"

[draw_off]
daily_volume_l = 0.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.dt_s), Some(5.0));
        assert_eq!(
            cfg.as_ref().map(|c| c.heat_pump.supply),
            Some(SupplyMode::Tracking)
        );
        assert_eq!(
            cfg.as_ref().map(|c| c.exchanger.model),
            Some(ExchangerModel::LmtdCoil)
        );
        assert_eq!(
            cfg.as_ref().map(|c| c.boiler.exchanger.model),
            Some(ExchangerModel::UaLinear)
        );
        // untouched sections keep baseline values
        assert_eq!(cfg.as_ref().map(|c| c.tank.cold_inlet_c), Some(10.0));
        assert_eq!(cfg.as_ref().map(|c| c.draw_off.hourly_pct.len()), Some(24));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[tank]
volume_l = 300.0
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(matches!(result, Err(ConfigurationError::Parse(_))));
    }

    #[test]
    fn unknown_exchanger_model_rejected() {
        let toml = r#"
[exchanger]
model = "plate"
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_zero_volume() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.tank.volume_l = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "tank.volume_l"));
    }

    #[test]
    fn validation_catches_setpoint_below_cold_inlet() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.control.setpoint_c = 10.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "control.setpoint_c"));
    }

    #[test]
    fn validation_catches_bad_time_step() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.dt_s = 0.0;
        cfg.control.restart_delta_c = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.dt_s"));
        assert!(errors.iter().any(|e| e.field == "control.restart_delta_c"));
    }

    #[test]
    fn validation_catches_bad_profile() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.draw_off.hourly_pct = vec![5.0; 23];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "draw_off.hourly_pct"));

        cfg.draw_off.hourly_pct = vec![5.0; 24];
        cfg.draw_off.hourly_pct[7] = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "draw_off.hourly_pct[7]"));
    }

    #[test]
    fn validation_catches_bad_exchanger_and_cop() {
        let mut cfg = ScenarioConfig::fixed_supply_heat_up();
        cfg.exchanger.area_m2 = 0.0;
        cfg.exchanger.primary_delta_c = -1.0;
        cfg.heat_pump.cop = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "exchanger.area_m2"));
        assert!(errors.iter().any(|e| e.field == "exchanger.primary_delta_c"));
        assert!(errors.iter().any(|e| e.field == "heat_pump.cop"));
    }

    #[rstest]
    #[case("[simulation]\ndt_s = nan", "simulation.dt_s")]
    #[case("[simulation]\nhorizon_h = inf", "simulation.horizon_h")]
    #[case("[simulation]\nhorizon_h = nan", "simulation.horizon_h")]
    #[case("[tank]\nvolume_l = nan", "tank.volume_l")]
    #[case("[tank]\nua_w_per_k = nan", "tank.ua_w_per_k")]
    #[case("[tank]\ninitial_c = inf", "tank.initial_c")]
    #[case("[tank]\ncold_inlet_c = nan", "tank.cold_inlet_c")]
    #[case("[control]\nsetpoint_c = nan", "control.setpoint_c")]
    #[case("[control]\nbackup_delay_min = nan", "control.backup_delay_min")]
    #[case("[heat_pump]\ncop = nan", "heat_pump.cop")]
    #[case("[heat_pump]\nnominal_kw = inf", "heat_pump.nominal_kw")]
    #[case("[heat_pump]\nsupply_temp_c = nan", "heat_pump.supply_temp_c")]
    #[case("[heat_pump]\nmin_modulation = nan", "heat_pump.min_modulation")]
    #[case(
        "[exchanger]\nmodel = \"lmtd_coil\"\nprimary_delta_c = nan",
        "exchanger.primary_delta_c"
    )]
    #[case("[exchanger]\nmodel = \"ua_linear\"\narea_m2 = inf", "exchanger.area_m2")]
    #[case("[boiler]\nnominal_kw = nan", "boiler.nominal_kw")]
    #[case("[draw_off]\ndaily_volume_l = inf", "draw_off.daily_volume_l")]
    fn non_finite_values_rejected(#[case] toml: &str, #[case] field: &str) {
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "TOML should parse: {:?}", cfg.err());
        let errors = cfg.map(|c| c.validate()).unwrap_or_default();
        assert!(
            errors.iter().any(|e| e.field == field),
            "expected error on {field}, got {errors:?}"
        );
    }

    #[test]
    fn non_finite_hourly_share_rejected() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.draw_off.hourly_pct[3] = f64::NAN;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "draw_off.hourly_pct[3]"));
        assert!(matches!(cfg.build(), Err(ConfigurationError::Invalid(_))));
    }

    #[test]
    fn direct_exchanger_ignores_geometry() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.exchanger.area_m2 = 0.0;
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn build_reports_every_error() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.tank.volume_l = -1.0;
        cfg.heat_pump.min_modulation = Some(1.5);
        let err = cfg.build().err();
        let fields: Vec<String> = match err {
            Some(ConfigurationError::Invalid(errors)) => {
                errors.into_iter().map(|e| e.field).collect()
            }
            _ => Vec::new(),
        };
        assert_eq!(fields, vec!["tank.volume_l", "heat_pump.min_modulation"]);
    }

    #[test]
    fn field_error_display_names_path() {
        let e = FieldError::new("tank.volume_l", "must be > 0");
        assert_eq!(e.to_string(), "config error: tank.volume_l: must be > 0");
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[heat_pump]
cop = 3.5
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.heat_pump.cop), Some(3.5));
        assert_eq!(cfg.as_ref().map(|c| c.heat_pump.nominal_kw), Some(15.0));
        assert_eq!(cfg.as_ref().map(|c| c.tank.volume_l), Some(900.0));
    }
}
