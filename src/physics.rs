//! Physical constants and unit conversions shared by every model.

/// Specific heat capacity of water (J/(kg·K)).
pub const CP_WATER: f64 = 4180.0;

/// Density of water (kg/m³).
pub const RHO_WATER: f64 = 1000.0;

/// Temperature at which hot water is delivered to the user (°C).
///
/// Draw-off volumes are expressed as litres at this temperature.
pub const DRAW_OFF_DELIVERY_C: f64 = 60.0;

/// Floor applied to exchanger temperature differences before taking a logarithm (K).
pub const LMTD_EPSILON_K: f64 = 1e-6;

/// Below this gap between the two exchanger ΔTs the LMTD collapses to `ΔT1` (K).
pub const LMTD_CONVERGENCE_K: f64 = 1e-3;

pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const WATTS_PER_KILOWATT: f64 = 1000.0;
pub const JOULES_PER_KWH: f64 = 3.6e6;
pub const LITRES_PER_M3: f64 = 1000.0;

/// Mass of water held in `volume_l` litres (kg).
pub fn water_mass_kg(volume_l: f64) -> f64 {
    volume_l / LITRES_PER_M3 * RHO_WATER
}

/// Converts an energy in joules to kWh.
pub fn joules_to_kwh(joules: f64) -> f64 {
    joules / JOULES_PER_KWH
}

/// Volumetric flow (m³/h) of water carrying `power_w` across a temperature drop `delta_k`.
///
/// Returns `0.0` for a non-positive `delta_k`.
pub fn flow_m3_per_h(power_w: f64, delta_k: f64) -> f64 {
    if delta_k <= 0.0 {
        return 0.0;
    }
    let mass_flow_kg_s = power_w / (CP_WATER * delta_k);
    mass_flow_kg_s * SECONDS_PER_HOUR / RHO_WATER
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn thousand_litres_weigh_a_tonne() {
        assert_eq!(water_mass_kg(1000.0), 1000.0);
        assert_eq!(water_mass_kg(300.0), 300.0);
    }

    #[test]
    fn kwh_conversion() {
        assert_relative_eq!(joules_to_kwh(3.6e6), 1.0);
    }

    #[test]
    fn flow_for_seven_kelvin_drop() {
        // 23.4 kW over 7 K -> 0.8 kg/s -> 2.88 m3/h
        let flow = flow_m3_per_h(23_408.0, 7.0);
        assert_relative_eq!(flow, 2.88, epsilon = 1e-9);
    }

    #[test]
    fn flow_is_zero_without_temperature_drop() {
        assert_eq!(flow_m3_per_h(10_000.0, 0.0), 0.0);
    }
}
