//! Text and JSON rendering of simulation results.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::sim::kpi::RunMetrics;
use crate::sim::types::{SimulationResult, SimulationStep};

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    scenario: &'a str,
    initial_tank_c: f64,
    reached_setpoint: bool,
    did_not_reach_setpoint: bool,
    metrics: &'a RunMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps: Option<&'a [SimulationStep]>,
}

/// Renders a run as human-readable text or pretty JSON.
///
/// # Arguments
///
/// * `scenario` - Label of the scenario that produced `result`
/// * `result` - Completed run
/// * `format` - Output format
/// * `include_steps` - Also emit every step record
///
/// # Errors
///
/// Returns a `serde_json::Error` if JSON serialization fails.
pub fn render(
    scenario: &str,
    result: &SimulationResult,
    format: OutputFormat,
    include_steps: bool,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(scenario, result, include_steps)),
        OutputFormat::Json => serde_json::to_string_pretty(&JsonReport {
            scenario,
            initial_tank_c: result.initial_tank_c,
            reached_setpoint: result.reached_setpoint,
            did_not_reach_setpoint: result.did_not_reach_setpoint,
            metrics: &result.metrics,
            steps: include_steps.then_some(result.steps.as_slice()),
        }),
    }
}

/// Plain-text report: optional step listing, run summary, then the metrics.
struct TextReport<'a> {
    scenario: &'a str,
    result: &'a SimulationResult,
    include_steps: bool,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        if self.include_steps {
            for s in &result.steps {
                writeln!(f, "{s}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Scenario: {}", self.scenario)?;
        writeln!(
            f,
            "Tank: {:.2} °C -> {:.2} °C over {} steps",
            result.initial_tank_c,
            result.final_tank_c(),
            result.steps.len()
        )?;
        if result.did_not_reach_setpoint {
            writeln!(f, "WARNING: setpoint not reached before the horizon cutoff")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", result.metrics)
    }
}

fn render_text(scenario: &str, result: &SimulationResult, include_steps: bool) -> String {
    TextReport {
        scenario,
        result,
        include_steps,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::sim::engine::Engine;

    fn heat_up_result() -> Option<SimulationResult> {
        let cfg = ScenarioConfig::fixed_supply_heat_up().build().ok()?;
        Some(Engine::new(cfg).run())
    }

    #[test]
    fn text_report_contains_energy_section() {
        let result = heat_up_result();
        assert!(result.is_some());
        let text = result
            .map(|r| render_text("fixed_supply_heat_up", &r, false))
            .unwrap_or_default();
        assert!(text.contains("--- Energy Report ---"));
        assert!(text.contains("Scenario: fixed_supply_heat_up"));
        assert!(text.contains("Exchanger limited:     yes"));
    }

    #[test]
    fn text_report_lists_steps_before_summary() {
        let result = heat_up_result();
        assert!(result.is_some());
        let (text, steps) = result
            .map(|r| (render_text("x", &r, true), r.steps))
            .unwrap_or_default();
        let first = steps.first().map(ToString::to_string).unwrap_or_default();
        let last = steps.last().map(ToString::to_string).unwrap_or_default();
        assert!(text.starts_with(&first), "report should open with step 0");
        let summary = text.find("Scenario: x");
        assert!(summary.is_some_and(|at| text[..at].contains(&last)));
        assert!(text.contains("--- Energy Report ---"));
    }

    #[test]
    fn cutoff_warning_only_when_flagged() {
        let result = heat_up_result();
        assert!(result.is_some());
        let Some(mut result) = result else { return };
        assert!(!render_text("x", &result, false).contains("WARNING"));
        result.did_not_reach_setpoint = true;
        assert!(render_text("x", &result, false).contains("WARNING: setpoint not reached"));
    }

    #[test]
    fn json_report_parses_and_omits_steps_by_default() {
        let result = heat_up_result();
        let json = result
            .as_ref()
            .and_then(|r| render("x", r, OutputFormat::Json, false).ok())
            .unwrap_or_default();
        let value: Option<serde_json::Value> = serde_json::from_str(&json).ok();
        assert!(value.is_some(), "report should be valid JSON: {json}");
        let value = value.unwrap_or_default();
        assert_eq!(value["reached_setpoint"], serde_json::Value::Bool(true));
        assert!(value["metrics"]["heat_pump_thermal_kwh"].as_f64().is_some());
        assert!(value.get("steps").is_none());
    }

    #[test]
    fn json_report_can_include_steps() {
        let result = heat_up_result();
        let n = result.as_ref().map_or(0, |r| r.steps.len());
        let json = result
            .as_ref()
            .and_then(|r| render("x", r, OutputFormat::Json, true).ok())
            .unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(value["steps"].as_array().map(Vec::len), Some(n));
        assert_eq!(value["steps"][0]["mode"], "starting");
    }
}
