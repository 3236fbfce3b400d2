//! Final report aggregation
//!
//! Runs exactly once, after the finish barrier, over the throughput record
//! map and the IOPS counter snapshot. Throughput totals are a naive per-kind
//! sum of per-worker MB/s; that approximates aggregate throughput because
//! workers running the same kind do so concurrently over comparable
//! wall-clock windows. IOPS min/max/average are computed independently per
//! kind over nonzero buckets only.

use crate::stats::iops::IopsSnapshot;
use crate::stats::{OpKind, ThroughputRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-kind IOPS statistics over nonzero per-second buckets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IopsSummary {
    pub min: u64,
    pub max: u64,
    pub average: f64,
    /// Number of nonzero one-second buckets the statistics cover
    pub seconds: u64,
}

/// The final, externally consumed artifact of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Per-kind total MB/s, summed across workers
    pub throughput: BTreeMap<OpKind, f64>,
    /// Per-kind IOPS min/max/average
    pub iops: BTreeMap<OpKind, IopsSummary>,
    /// Raw per-worker phase records
    pub records: Vec<ThroughputRecord>,
    /// Set when a barrier broke and the report covers a partial run
    pub barrier_broken: bool,
}

/// Sum per-worker MB/s into a per-kind total
pub fn aggregate_throughput(records: &[ThroughputRecord]) -> BTreeMap<OpKind, f64> {
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(record.kind).or_insert(0.0) += record.mb_per_sec;
    }
    totals
}

/// Compute min/max/average per kind, ignoring zero buckets
///
/// State is reset for every kind; nothing accumulates across kinds.
pub fn aggregate_iops(snapshot: &IopsSnapshot) -> BTreeMap<OpKind, IopsSummary> {
    let mut summaries = BTreeMap::new();

    for (kind, buckets) in snapshot {
        let mut min = u64::MAX;
        let mut max = u64::MIN;
        let mut sum = 0u64;
        let mut count = 0u64;

        for &value in buckets.values() {
            if value == 0 {
                continue;
            }
            min = min.min(value);
            max = max.max(value);
            sum += value;
            count += 1;
        }

        if count == 0 {
            continue;
        }
        summaries.insert(
            *kind,
            IopsSummary {
                min,
                max,
                average: sum as f64 / count as f64,
                seconds: count,
            },
        );
    }

    summaries
}
