use crate::physics::{CP_WATER, DRAW_OFF_DELIVERY_C, SECONDS_PER_HOUR, water_mass_kg};

/// Number of hourly buckets in a daily profile.
pub const HOURS_PER_DAY: usize = 24;

/// Hourly share (%) of the daily volume used when none is configured.
pub const DEFAULT_HOURLY_PCT: [f64; HOURS_PER_DAY] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 15.0, 10.0, 5.0, 2.0, 2.0, 3.0, 2.0, 2.0, 2.0, 3.0, 5.0,
    10.0, 15.0, 10.0, 4.0, 0.0, 0.0,
];

/// Daily hot-water consumption spread over 24 hourly buckets.
///
/// Each hour's volume is assumed to be drawn uniformly over that hour at
/// [`DRAW_OFF_DELIVERY_C`], replaced by water at the cold-inlet temperature.
/// The instantaneous demand is therefore the hour's average; this is a known
/// simplification, not a stochastic draw model.
///
/// # Examples
///
/// ```
/// use dhw_sim::devices::draw_off::{DrawOffProfile, DEFAULT_HOURLY_PCT};
///
/// let profile = DrawOffProfile::new(DEFAULT_HOURLY_PCT, 1000.0, 10.0);
/// assert_eq!(profile.power_w(3.0 * 3600.0), 0.0);
/// assert!(profile.power_w(7.5 * 3600.0) > 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOffProfile {
    /// Share of the daily volume drawn in each hour (%). Need not sum to 100.
    hourly_pct: [f64; HOURS_PER_DAY],
    /// Total daily volume at delivery temperature (L).
    daily_volume_l: f64,
    /// Cold mains temperature (°C).
    cold_inlet_c: f64,
}

impl DrawOffProfile {
    /// Creates a profile; percentages are used exactly as given.
    pub fn new(hourly_pct: [f64; HOURS_PER_DAY], daily_volume_l: f64, cold_inlet_c: f64) -> Self {
        Self {
            hourly_pct,
            daily_volume_l,
            cold_inlet_c,
        }
    }

    /// A profile that never draws any water.
    pub fn none(cold_inlet_c: f64) -> Self {
        Self::new([0.0; HOURS_PER_DAY], 0.0, cold_inlet_c)
    }

    /// Hour-of-day bucket for a simulated time, wrapping every 24 h.
    pub fn hour_of_day(time_s: f64) -> usize {
        let hour = (time_s / SECONDS_PER_HOUR).floor() as i64;
        hour.rem_euclid(HOURS_PER_DAY as i64) as usize
    }

    /// Volume drawn during `hour` (L).
    pub fn hourly_volume_l(&self, hour: usize) -> f64 {
        self.hourly_pct[hour % HOURS_PER_DAY] / 100.0 * self.daily_volume_l
    }

    /// Thermal power extracted by the draw-off at `time_s` (W).
    pub fn power_w(&self, time_s: f64) -> f64 {
        let volume_l = self.hourly_volume_l(Self::hour_of_day(time_s));
        volume_l / SECONDS_PER_HOUR * CP_WATER * (DRAW_OFF_DELIVERY_C - self.cold_inlet_c)
    }

    /// Energy drawn over one full day (J).
    pub fn daily_energy_j(&self) -> f64 {
        let total_l: f64 = (0..HOURS_PER_DAY).map(|h| self.hourly_volume_l(h)).sum();
        water_mass_kg(total_l) * CP_WATER * (DRAW_OFF_DELIVERY_C - self.cold_inlet_c)
    }

    pub fn daily_volume_l(&self) -> f64 {
        self.daily_volume_l
    }

    pub fn hourly_pct(&self) -> &[f64; HOURS_PER_DAY] {
        &self.hourly_pct
    }
}
