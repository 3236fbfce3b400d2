//! Shared per-second IOPS counter
//!
//! Maps (operation kind, wall-clock second) to a monotonically increasing
//! count, updated at high frequency by every worker. Two-level locking keeps
//! contention off the hot path:
//!
//! - the outer lock guards the set of known kinds and is written at most once
//!   per kind, on first touch
//! - the inner per-kind lock guards that kind's second map and is written at
//!   most once per second, on first touch
//! - the increment itself is a relaxed atomic add on the bucket, so the
//!   common case (bucket already exists) takes two read locks and no write
//!   lock
//!
//! Buckets are created exactly once per key (`entry().or_insert_with` under
//! the write lock) and never removed. `snapshot` must only be called after
//! all workers have finished; the finish barrier establishes the required
//! happens-before edge.

use crate::stats::{AlignedCounter, OpKind};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Read-only copy of the counter, kind -> second -> count
pub type IopsSnapshot = HashMap<OpKind, BTreeMap<u64, u64>>;

#[derive(Debug, Default)]
struct KindBuckets {
    seconds: RwLock<HashMap<u64, Arc<AlignedCounter>>>,
}

impl KindBuckets {
    fn bucket(&self, second: u64) -> Arc<AlignedCounter> {
        {
            let seconds = self.seconds.read().unwrap_or_else(|e| e.into_inner());
            if let Some(counter) = seconds.get(&second) {
                return Arc::clone(counter);
            }
        }
        let mut seconds = self.seconds.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            seconds
                .entry(second)
                .or_insert_with(|| Arc::new(AlignedCounter::new())),
        )
    }
}

/// Concurrently writable (kind, second) -> count structure
#[derive(Debug, Default)]
pub struct IopsCounter {
    kinds: RwLock<HashMap<OpKind, Arc<KindBuckets>>>,
}

impl IopsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one operation of `kind` in the bucket for `second`
    ///
    /// Safe for unbounded concurrent calls; no update is ever lost and each
    /// bucket is created exactly once even under concurrent first touch.
    pub fn increment(&self, kind: OpKind, second: u64) {
        let buckets = {
            let kinds = self.kinds.read().unwrap_or_else(|e| e.into_inner());
            kinds.get(&kind).map(Arc::clone)
        };
        let buckets = match buckets {
            Some(buckets) => buckets,
            None => {
                let mut kinds = self.kinds.write().unwrap_or_else(|e| e.into_inner());
                Arc::clone(kinds.entry(kind).or_default())
            }
        };

        buckets.bucket(second).add(1);
    }

    /// Copy out the full structure for aggregation
    ///
    /// Only meaningful once no further writers exist.
    pub fn snapshot(&self) -> IopsSnapshot {
        let kinds = self.kinds.read().unwrap_or_else(|e| e.into_inner());
        kinds
            .iter()
            .map(|(kind, buckets)| {
                let seconds = buckets.seconds.read().unwrap_or_else(|e| e.into_inner());
                let counts = seconds
                    .iter()
                    .map(|(second, counter)| (*second, counter.get()))
                    .collect();
                (*kind, counts)
            })
            .collect()
    }
}
