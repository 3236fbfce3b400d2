//! Human-readable text output

use crate::stats::aggregator::RunReport;
use crate::util::time::format_number;

/// Print the final report to stdout
///
/// Two sections: per-kind throughput totals summed across workers, and
/// per-kind IOPS min/max/average over nonzero one-second buckets.
pub fn print_report(report: &RunReport) {
    println!();
    println!("═══════════════════════════════════════════════════════════");
    println!("                     BENCHMARK RESULTS");
    println!("═══════════════════════════════════════════════════════════");

    if report.barrier_broken {
        println!();
        println!("WARNING: run did not complete; results cover a partial run");
    }

    println!();
    println!("Throughput (all workers):");
    if report.throughput.is_empty() {
        println!("  no completed operations");
    }
    for (kind, total) in &report.throughput {
        println!("  {:<12} {:.2} MB/sec", kind.to_string(), total);
    }

    println!();
    println!("IOPS (per one-second bucket):");
    if report.iops.is_empty() {
        println!("  no completed operations");
    }
    for (kind, summary) in &report.iops {
        println!(
            "  {:<12} min: {}, max: {}, average: {:.1} ({} busy seconds)",
            kind.to_string(),
            format_number(summary.min),
            format_number(summary.max),
            summary.average,
            summary.seconds
        );
    }

    println!();
    println!("═══════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregator::{aggregate_iops, aggregate_throughput};
    use crate::stats::{OpKind, ThroughputRecord};
    use std::collections::HashMap;

    #[test]
    fn test_print_report_handles_empty_run() {
        let report = RunReport {
            throughput: aggregate_throughput(&[]),
            iops: aggregate_iops(&HashMap::new()),
            records: vec![],
            barrier_broken: true,
        };
        // Degraded reports must render without panicking.
        print_report(&report);
    }

    #[test]
    fn test_print_report_handles_full_run() {
        let records = vec![
            ThroughputRecord::measure(OpKind::Write, 0, 0, 2000, 2 * 1024 * 1024),
            ThroughputRecord::measure(OpKind::Read, 0, 2000, 3000, 2 * 1024 * 1024),
        ];
        let mut snapshot = HashMap::new();
        snapshot.insert(OpKind::Write, [(0u64, 512u64), (1, 480)].into_iter().collect());

        let report = RunReport {
            throughput: aggregate_throughput(&records),
            iops: aggregate_iops(&snapshot),
            records,
            barrier_broken: false,
        };
        print_report(&report);
    }
}
