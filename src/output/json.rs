//! JSON report output

use crate::stats::aggregator::RunReport;
use crate::Result;

/// Print the full report to stdout as pretty-printed JSON
///
/// Includes the raw per-worker records alongside the aggregates, so the
/// output is suitable for scripted post-processing.
pub fn print_report(report: &RunReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
