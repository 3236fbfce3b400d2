//! Statistics collection
//!
//! Per-phase throughput records and the shared structures workers write them
//! into. The only structure mutated concurrently at high frequency is the
//! [`iops::IopsCounter`]; the throughput record map is touched three times
//! per worker for the whole run, so a plain mutex is enough there.

pub mod aggregator;
pub mod iops;

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Operation kind measured by the benchmark
///
/// The workload set is fixed: one write pass (file creation), one sequential
/// read pass, one random read pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OpKind {
    /// File creation (the write phase)
    Write,
    /// Sequential read in buffer-sized chunks
    Read,
    /// Random buffer-aligned reads
    ReadRandom,
}

impl OpKind {
    /// Human-readable label used in the report
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Write => "WRITE",
            OpKind::Read => "READ",
            OpKind::ReadRandom => "READRANDOM",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache-line aligned atomic counter to prevent false sharing
///
/// Adjacent counters updated by different threads would otherwise share a
/// cache line and invalidate each other on every increment. Padding each
/// counter to 64 bytes gives it a line of its own.
#[repr(align(64))]
#[derive(Debug)]
pub struct AlignedCounter {
    value: AtomicU64,
    _padding: [u8; 56],
}

impl Default for AlignedCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl AlignedCounter {
    /// Create a new counter with initial value 0
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
            _padding: [0; 56],
        }
    }

    /// Increment the counter by `val`
    ///
    /// Relaxed ordering: no ordering guarantees are needed between counters,
    /// and the final read happens after a barrier establishes happens-before.
    #[inline]
    pub fn add(&self, val: u64) {
        self.value.fetch_add(val, Ordering::Relaxed);
    }

    /// Read the current value
    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Throughput measurement for one worker phase
///
/// Produced once per worker per phase from the phase's start/end timestamps
/// and byte count, then never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThroughputRecord {
    pub kind: OpKind,
    pub worker: usize,
    /// Phase start, milliseconds since the Unix epoch
    pub start_ms: u64,
    /// Phase end, milliseconds since the Unix epoch
    pub end_ms: u64,
    /// Literal bytes transferred during the phase
    pub bytes: u64,
    /// Whole elapsed seconds, clamped to a minimum of 1
    pub seconds: u64,
    pub mb_per_sec: f64,
}

impl ThroughputRecord {
    /// Derive a record from a raw sample
    ///
    /// Elapsed whole seconds are clamped to a minimum of 1 so a phase that
    /// completes within a single wall-clock second still yields a finite
    /// rate instead of dividing by zero.
    pub fn measure(kind: OpKind, worker: usize, start_ms: u64, end_ms: u64, bytes: u64) -> Self {
        let seconds = (end_ms.saturating_sub(start_ms) / 1000).max(1);
        let mb_per_sec = (bytes as f64 / 1024.0 / 1024.0) / seconds as f64;
        Self {
            kind,
            worker,
            start_ms,
            end_ms,
            bytes,
            seconds,
            mb_per_sec,
        }
    }
}

/// Shared map of throughput records, keyed by (kind, worker)
///
/// Each record is written by exactly one worker; the map is read once, after
/// the finish barrier, for aggregation.
#[derive(Debug, Default)]
pub struct RecordMap {
    inner: Mutex<HashMap<(OpKind, usize), ThroughputRecord>>,
}

impl RecordMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a completed phase record
    pub fn insert(&self, record: ThroughputRecord) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.insert((record.kind, record.worker), record);
    }

    /// Copy out all records, ordered by kind then worker
    pub fn snapshot(&self) -> Vec<ThroughputRecord> {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut records: Vec<_> = map.values().cloned().collect();
        records.sort_by_key(|r| (r.kind, r.worker));
        records
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_two_seconds_two_mib() {
        let rec = ThroughputRecord::measure(OpKind::Write, 0, 1000, 3000, 2 * 1024 * 1024);
        assert_eq!(rec.seconds, 2);
        assert_eq!(rec.mb_per_sec, 1.0);
    }

    #[test]
    fn test_measure_sub_second_clamps_to_one() {
        let rec = ThroughputRecord::measure(OpKind::Read, 0, 1000, 1400, 4 * 1024 * 1024);
        assert_eq!(rec.seconds, 1);
        assert_eq!(rec.mb_per_sec, 4.0);
        assert!(rec.mb_per_sec.is_finite());
    }

    #[test]
    fn test_measure_clock_skew_does_not_underflow() {
        let rec = ThroughputRecord::measure(OpKind::Read, 0, 2000, 1000, 1024);
        assert_eq!(rec.seconds, 1);
    }

    #[test]
    fn test_aligned_counter_add_and_get() {
        let counter = AlignedCounter::new();
        assert_eq!(counter.get(), 0);
        counter.add(3);
        counter.add(4);
        assert_eq!(counter.get(), 7);
    }

    #[test]
    fn test_aligned_counter_occupies_full_cache_line() {
        assert_eq!(std::mem::size_of::<AlignedCounter>(), 64);
        assert_eq!(std::mem::align_of::<AlignedCounter>(), 64);
    }

    #[test]
    fn test_record_map_keys_by_kind_and_worker() {
        let map = RecordMap::new();
        map.insert(ThroughputRecord::measure(OpKind::Write, 0, 0, 1000, 1024));
        map.insert(ThroughputRecord::measure(OpKind::Write, 1, 0, 1000, 1024));
        map.insert(ThroughputRecord::measure(OpKind::Read, 0, 0, 1000, 1024));
        assert_eq!(map.len(), 3);

        // Same key overwrites rather than duplicating.
        map.insert(ThroughputRecord::measure(OpKind::Read, 0, 0, 2000, 2048));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_record_map_snapshot_is_sorted() {
        let map = RecordMap::new();
        map.insert(ThroughputRecord::measure(OpKind::ReadRandom, 1, 0, 1000, 1));
        map.insert(ThroughputRecord::measure(OpKind::Write, 1, 0, 1000, 1));
        map.insert(ThroughputRecord::measure(OpKind::Write, 0, 0, 1000, 1));

        let records = map.snapshot();
        let keys: Vec<_> = records.iter().map(|r| (r.kind, r.worker)).collect();
        assert_eq!(
            keys,
            vec![
                (OpKind::Write, 0),
                (OpKind::Write, 1),
                (OpKind::ReadRandom, 1)
            ]
        );
    }

    #[test]
    fn test_op_kind_labels() {
        assert_eq!(OpKind::Write.to_string(), "WRITE");
        assert_eq!(OpKind::Read.to_string(), "READ");
        assert_eq!(OpKind::ReadRandom.to_string(), "READRANDOM");
    }
}
