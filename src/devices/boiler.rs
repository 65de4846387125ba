use crate::devices::exchanger::{Exchange, Exchanger, HeatExchange};

/// Auxiliary boiler backing up the heat pump.
#[derive(Debug, Clone, PartialEq)]
pub struct Boiler {
    /// Nominal thermal output (W).
    pub nominal_w: f64,
    /// Boiler flow temperature (°C).
    pub supply_temp_c: f64,
    /// When `true` the boiler feeds the heat pump's exchanger and may only use
    /// the capacity the heat pump leaves unused.
    pub shares_exchanger: bool,
    /// The boiler's own exchanger, used when `shares_exchanger` is `false`.
    pub exchanger: Exchanger,
}

impl Boiler {
    /// A boiler with no output, for heat-pump-only installations.
    pub fn absent() -> Self {
        Self {
            nominal_w: 0.0,
            supply_temp_c: 0.0,
            shares_exchanger: false,
            exchanger: Exchanger::default(),
        }
    }

    /// Output through the boiler's own exchanger (W).
    pub fn dedicated_power(&self, tank_temp_c: f64) -> Exchange {
        self.exchanger
            .deliverable_power(self.supply_temp_c, tank_temp_c, self.nominal_w)
    }

    /// Output through a shared exchanger with `capacity_w` total capacity, of
    /// which the heat pump already uses `heat_pump_w` (W).
    pub fn shared_power_w(&self, capacity_w: f64, heat_pump_w: f64) -> f64 {
        (capacity_w - heat_pump_w).max(0.0).min(self.nominal_w.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::exchanger::UaLinear;

    fn boiler(shares_exchanger: bool) -> Boiler {
        Boiler {
            nominal_w: 25_000.0,
            supply_temp_c: 80.0,
            shares_exchanger,
            exchanger: Exchanger::default(),
        }
    }

    #[test]
    fn shared_boiler_takes_remaining_capacity() {
        let b = boiler(true);
        assert_eq!(b.shared_power_w(30_000.0, 15_000.0), 15_000.0);
        assert_eq!(b.shared_power_w(60_000.0, 15_000.0), 25_000.0);
        assert_eq!(b.shared_power_w(10_000.0, 15_000.0), 0.0);
    }

    #[test]
    fn shared_boiler_with_unlimited_exchanger_runs_at_nominal() {
        let b = boiler(true);
        assert_eq!(b.shared_power_w(f64::INFINITY, 15_000.0), 25_000.0);
    }

    #[test]
    fn dedicated_direct_boiler_delivers_nominal() {
        assert_eq!(boiler(false).dedicated_power(59.0).power_w, 25_000.0);
    }

    #[test]
    fn dedicated_coil_limits_boiler() {
        let b = Boiler {
            exchanger: Exchanger::UaLinear(UaLinear::new(1000.0)),
            ..boiler(false)
        };
        let exchange = b.dedicated_power(60.0);
        assert_eq!(exchange.power_w, 20_000.0);
        assert!(exchange.exchanger_limited());
    }

    #[test]
    fn absent_boiler_delivers_nothing() {
        let b = Boiler::absent();
        assert_eq!(b.dedicated_power(20.0).power_w, 0.0);
        assert_eq!(b.shared_power_w(50_000.0, 0.0), 0.0);
    }
}
