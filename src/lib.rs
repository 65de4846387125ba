//! Domestic hot-water tank simulator: heat pump, backup boiler and coil exchangers.

/// Command-line interface definition.
pub mod cli;
pub mod config;
pub mod devices;
pub mod io;
pub mod physics;
pub mod report;
/// Simulation engine, controller, and metrics modules.
pub mod sim;
pub mod sweep;
