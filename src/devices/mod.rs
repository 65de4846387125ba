//! Physical components of the hot-water installation.

/// Auxiliary boiler.
pub mod boiler;
/// Hourly draw-off profile.
pub mod draw_off;
pub mod exchanger;
/// Heat pump with supply-temperature and modulation policies.
pub mod heat_pump;
pub mod tank;

// Re-export the main types for convenience
pub use boiler::Boiler;
pub use draw_off::DrawOffProfile;
pub use exchanger::{Direct, Exchange, Exchanger, HeatExchange, LmtdCoil, UaLinear};
pub use heat_pump::{HeatPump, Modulation, SupplyTemperature};
pub use tank::Tank;
