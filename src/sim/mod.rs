/// Heat-source state machine and dispatch.
pub mod controller;
pub mod engine;
pub mod kpi;
pub mod power_balance;
pub mod types;
