//! CSV export for simulation step records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::physics::WATTS_PER_KILOWATT;
use crate::sim::types::SimulationStep;

/// Column header for CSV telemetry export.
pub const HEADER: &str = "step,time_h,tank_c,mode,supply_c,heat_pump_kw,backup_kw,\
                          draw_off_kw,tank_loss_kw,loop_loss_kw,exchanger_capacity_kw,\
                          primary_flow_m3_h,exchanger_limited";

/// Exports step records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `steps` - Complete simulation step records
/// * `path` - Output file path
///
/// # Errors
///
/// Returns a `csv::Error` if file creation or writing fails.
pub fn export_csv(steps: &[SimulationStep], path: &Path) -> Result<(), csv::Error> {
    let file = File::create(path)?;
    write_csv(steps, io::BufWriter::new(file))
}

/// Writes step records as CSV to any writer.
///
/// Powers are written in kW. Optional columns are left empty when the
/// exchanger model does not provide them.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_csv(steps: &[SimulationStep], writer: impl Write) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    let kw = |w: f64| format!("{:.4}", w / WATTS_PER_KILOWATT);
    for s in steps {
        wtr.write_record(&[
            s.step.to_string(),
            format!("{:.4}", s.time_h()),
            format!("{:.4}", s.tank_c),
            s.mode.to_string(),
            format!("{:.2}", s.supply_c),
            kw(s.heat_pump_w),
            kw(s.backup_w),
            kw(s.draw_off_w),
            kw(s.tank_loss_w),
            kw(s.loop_loss_w),
            s.exchanger_capacity_w.map(kw).unwrap_or_default(),
            s.primary_flow_m3_h
                .map(|f| format!("{f:.4}"))
                .unwrap_or_default(),
            s.exchanger_limited.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::controller::HeatPumpMode;

    fn make_step(k: usize) -> SimulationStep {
        SimulationStep {
            step: k,
            time_s: k as f64 * 10.0,
            tank_c: 54.2,
            mode: HeatPumpMode::Heating,
            supply_c: 70.0,
            heat_pump_w: 15_000.0,
            backup_w: 0.0,
            draw_off_w: 8_708.3,
            tank_loss_w: 39.2,
            loop_loss_w: 500.0,
            exchanger_capacity_w: if k % 2 == 0 { Some(22_500.0) } else { None },
            primary_flow_m3_h: None,
            exchanger_limited: false,
        }
    }

    #[test]
    fn header_matches_columns() {
        let mut buf = Vec::new();
        write_csv(&[make_step(1)], &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "step,time_h,tank_c,mode,supply_c,heat_pump_kw,backup_kw,draw_off_kw,\
             tank_loss_kw,loop_loss_kw,exchanger_capacity_kw,primary_flow_m3_h,exchanger_limited"
        );
    }

    #[test]
    fn row_count_matches_step_count() {
        let steps: Vec<SimulationStep> = (1..=24).map(make_step).collect();
        let mut buf = Vec::new();
        write_csv(&steps, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        // 1 header + 24 data rows
        assert_eq!(lines.len(), 25);
    }

    #[test]
    fn deterministic_output() {
        let steps: Vec<SimulationStep> = (1..=5).map(make_step).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&steps, &mut buf1).ok();
        write_csv(&steps, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn rows_parse_back() {
        let steps: Vec<SimulationStep> = (1..=3).map(make_step).collect();
        let mut buf = Vec::new();
        write_csv(&steps, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(13));

        let records: Vec<csv::StringRecord> = rdr.records().filter_map(Result::ok).collect();
        assert_eq!(records.len(), 3);
        for rec in &records {
            assert_eq!(&rec[3], "heating");
            assert_eq!(rec[5].parse::<f64>().ok(), Some(15.0));
            assert!(rec[12].parse::<bool>().is_ok());
        }
        // unlimited exchanger leaves the capacity column empty
        assert_eq!(&records[0][10], "");
        assert_eq!(records[1][10].parse::<f64>().ok(), Some(22.5));
    }
}
