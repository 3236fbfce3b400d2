//! Worker thread implementation
//!
//! Each worker owns one test file and runs the fixed three-phase sequence:
//! create the file, then (after every worker has finished creating) a
//! sequential read pass and a random read pass. The two barriers keep all
//! workers in lockstep so no read test overlaps another worker's write-heavy
//! creation phase.
//!
//! Errors are caught at the worker boundary: an IO failure is logged and
//! degrades this worker's contribution to the report, but the worker still
//! arrives at both barriers so its peers are never left blocked.

use crate::config::Config;
use crate::error::MeterError;
use crate::stats::iops::IopsCounter;
use crate::stats::{OpKind, RecordMap, ThroughputRecord};
use crate::sync::Barrier;
use crate::util::log::log;
use crate::util::time::{epoch_millis, epoch_second, format_bytes};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Handles to the run-wide shared structures, injected at construction
///
/// The fill block is read-only; the IOPS counter is the only structure
/// mutated concurrently at high frequency; the record map sees three inserts
/// per worker; the cleanup list collects file paths for exit-time removal.
#[derive(Clone)]
pub struct SharedState {
    pub fill_block: Arc<Vec<u8>>,
    pub iops: Arc<IopsCounter>,
    pub records: Arc<RecordMap>,
    pub cleanup: Arc<Mutex<Vec<PathBuf>>>,
}

/// One benchmark worker, bound to its test file and the two run barriers
pub struct Worker {
    id: usize,
    config: Arc<Config>,
    shared: SharedState,
    create_barrier: Arc<Barrier>,
    finish_barrier: Arc<Barrier>,
    rng: Xoshiro256PlusPlus,
    path: PathBuf,
}

impl Worker {
    pub fn new(
        id: usize,
        config: Arc<Config>,
        shared: SharedState,
        create_barrier: Arc<Barrier>,
        finish_barrier: Arc<Barrier>,
    ) -> Self {
        let path = config.file_path(id);
        Self {
            id,
            config,
            shared,
            create_barrier,
            finish_barrier,
            rng: Xoshiro256PlusPlus::from_entropy(),
            path,
        }
    }

    /// Run the three-phase sequence to completion
    ///
    /// Arrives at the creation barrier whether or not phase 1 succeeded, and
    /// at the finish barrier whether or not the read phases succeeded. Only a
    /// broken creation barrier aborts early, and then the finish barrier is
    /// abandoned so the orchestrator fails fast instead of hanging.
    pub fn run(mut self) {
        let created = match self.create_file() {
            Ok(()) => true,
            Err(e) => {
                log(&format!("failed to create test file: {}", e));
                false
            }
        };

        if self.create_barrier.wait().is_err() {
            log("file-creation barrier broken, abandoning run");
            self.finish_barrier.abandon();
            return;
        }

        if created && self.file_ready() {
            log("starting sequential read test");
            if let Err(e) = self.sequential_read() {
                log(&format!("sequential read test failed: {}", e));
            }
            log("starting random read test");
            if let Err(e) = self.random_read() {
                log(&format!("random read test failed: {}", e));
            }
            log("worker done");
        } else {
            log("test file missing or not writable, skipping read tests");
        }

        if self.finish_barrier.wait().is_err() {
            log("io-test barrier broken");
        }
    }

    /// Phase 1: build the test file from the shared fill block
    fn create_file(&mut self) -> Result<(), MeterError> {
        // Register for exit-time removal up front: a partially written file
        // from a failed phase still needs cleaning up.
        self.shared
            .cleanup
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(self.path.clone());

        log(&format!(
            "creating a file of {} using a {} byte buffer",
            format_bytes(self.config.file_size),
            self.config.buffer_size
        ));

        let start = epoch_millis();
        let file =
            File::create(&self.path).map_err(|e| MeterError::io("file creation", e))?;
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, file);

        let mut written = 0u64;
        while written < self.config.file_size {
            writer
                .write_all(&self.shared.fill_block)
                .map_err(|e| MeterError::io("file creation", e))?;
            self.shared.iops.increment(OpKind::Write, epoch_second());
            written += self.shared.fill_block.len() as u64;
        }
        writer
            .flush()
            .map_err(|e| MeterError::io("file creation", e))?;
        let end = epoch_millis();

        self.shared.records.insert(ThroughputRecord::measure(
            OpKind::Write,
            self.id,
            start,
            end,
            written,
        ));
        Ok(())
    }

    /// Defensive check before the read phases: phase 1 may have failed
    fn file_ready(&self) -> bool {
        match fs::metadata(&self.path) {
            Ok(meta) => meta.is_file() && !meta.permissions().readonly(),
            Err(_) => false,
        }
    }

    /// Phase 2: stream the whole file in buffer-sized chunks
    fn sequential_read(&self) -> Result<(), MeterError> {
        let start = epoch_millis();
        let mut file = File::open(&self.path).map_err(|e| MeterError::io("sequential read", e))?;
        let mut buf = vec![0u8; self.config.buffer_size];

        let mut total = 0u64;
        loop {
            let n = file
                .read(&mut buf)
                .map_err(|e| MeterError::io("sequential read", e))?;
            if n == 0 {
                break;
            }
            total += n as u64;
            self.shared.iops.increment(OpKind::Read, epoch_second());
        }
        let end = epoch_millis();

        self.shared.records.insert(ThroughputRecord::measure(
            OpKind::Read,
            self.id,
            start,
            end,
            total,
        ));
        Ok(())
    }

    /// Phase 3: buffer-aligned reads at uniformly random slots
    fn random_read(&mut self) -> Result<(), MeterError> {
        let slots = self.config.available_slots();
        let seeks = self.config.seeks_per_worker();
        let buffer_size = self.config.buffer_size as u64;

        let start = epoch_millis();
        let mut file = File::open(&self.path).map_err(|e| MeterError::io("random read", e))?;
        let mut buf = vec![0u8; self.config.buffer_size];

        let mut total = 0u64;
        for _ in 0..seeks {
            let slot = self.rng.gen_range(0..slots);
            file.seek(SeekFrom::Start(slot * buffer_size))
                .map_err(|e| MeterError::io("random read", e))?;
            let n = file
                .read(&mut buf)
                .map_err(|e| MeterError::io("random read", e))?;
            total += n as u64;
            self.shared.iops.increment(OpKind::ReadRandom, epoch_second());
        }
        let end = epoch_millis();

        self.shared.records.insert(ThroughputRecord::measure(
            OpKind::ReadRandom,
            self.id,
            start,
            end,
            total,
        ));
        Ok(())
    }
}
