use crate::physics::{CP_WATER, water_mass_kg};

/// Fully mixed hot-water storage tank.
///
/// Integrates net power into a single tank temperature with an explicit
/// Euler step. The tank can never cool below the cold-inlet temperature: a
/// draw-off large enough to push it lower is clipped at the inlet temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    /// Stored volume (L).
    pub volume_l: f64,
    /// Insulation loss coefficient towards the plant room (W/K).
    pub ua_w_per_k: f64,
    /// Constant recirculation-loop loss (W).
    pub loop_loss_w: f64,
    /// Plant-room temperature (°C).
    pub ambient_c: f64,
    /// Cold mains temperature, also the temperature floor (°C).
    pub cold_inlet_c: f64,
}

impl Tank {
    pub fn mass_kg(&self) -> f64 {
        water_mass_kg(self.volume_l)
    }

    /// Energy needed to raise the whole tank by one kelvin (J/K).
    pub fn heat_capacity_j_per_k(&self) -> f64 {
        self.mass_kg() * CP_WATER
    }

    /// Loss through the tank shell at `temp_c` (W). Negative when the room is warmer.
    pub fn shell_loss_w(&self, temp_c: f64) -> f64 {
        self.ua_w_per_k * (temp_c - self.ambient_c)
    }

    /// Shell loss plus the recirculation loop (W).
    pub fn static_loss_w(&self, temp_c: f64) -> f64 {
        self.shell_loss_w(temp_c) + self.loop_loss_w
    }

    /// Temperature after applying `net_power_w` for `dt_s` seconds (°C).
    pub fn advance(&self, temp_c: f64, net_power_w: f64, dt_s: f64) -> f64 {
        let next = temp_c + net_power_w * dt_s / self.heat_capacity_j_per_k();
        next.max(self.cold_inlet_c)
    }

    /// Energy that lifts the tank from `from_c` to `to_c` (J).
    pub fn stored_energy_j(&self, from_c: f64, to_c: f64) -> f64 {
        self.heat_capacity_j_per_k() * (to_c - from_c)
    }
}
