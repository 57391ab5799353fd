//! CSV export for scheduler step results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::{StepOutcome, StepResult};

/// Column header for CSV result export.
const HEADER: &str = "time,step,calculation,entity_id,sample,irradiance_wm2,power_w,published";

/// Exports scheduler results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per irradiance sample of
/// every record. Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `results` - Complete scheduler step results
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[StepResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes scheduler results as CSV to any writer.
///
/// Records without power values (compute-only or failed) still emit one
/// row per input sample with an empty `power_w` cell, and a single row
/// with empty sample cells when the input itself was empty.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[StepResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for r in results {
        let time = r.time.to_rfc3339();
        let step = r.step.to_string();
        let published = (r.outcome == StepOutcome::Published).to_string();

        if r.irradiance_wm2.is_empty() {
            wtr.write_record([
                time.as_str(),
                &step,
                r.calculation,
                r.entity_id.as_str(),
                "",
                "",
                "",
                &published,
            ])?;
            continue;
        }

        for (i, irradiance) in r.irradiance_wm2.iter().enumerate() {
            let power = r.power_w.get(i).map(f64::to_string).unwrap_or_default();
            wtr.write_record([
                time.as_str(),
                &step,
                r.calculation,
                r.entity_id.as_str(),
                &i.to_string(),
                &irradiance.to_string(),
                &power,
                &published,
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
