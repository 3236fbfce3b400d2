//! Run orchestration
//!
//! The coordinator validates configuration, pre-generates the shared fill
//! block, owns the two barriers, spawns one worker per configured thread and
//! waits for the finish rendezvous. Aggregation and report output live in a
//! guard created before the workers start: its `Drop` runs on normal
//! completion and when the run unwinds early, so a report covering whatever
//! statistics exist is produced either way. A broken barrier degrades the
//! report instead of discarding it.

use crate::config::validator::validate_config;
use crate::config::Config;
use crate::error::MeterError;
use crate::output;
use crate::stats::aggregator::{aggregate_iops, aggregate_throughput, RunReport};
use crate::stats::iops::IopsCounter;
use crate::stats::RecordMap;
use crate::sync::Barrier;
use crate::util::fill;
use crate::util::log::log;
use crate::util::time::format_bytes;
use crate::worker::{SharedState, Worker};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Orchestrates one benchmark run
pub struct Coordinator {
    config: Arc<Config>,
}

impl Coordinator {
    /// Validate the configuration and build a coordinator
    pub fn new(config: Config) -> Result<Self, MeterError> {
        validate_config(&config)?;

        log(&format!(
            "configured with {} threads, {} test file size, {} byte buffer",
            config.threads,
            format_bytes(config.file_size),
            config.buffer_size
        ));
        log(&format!(
            "will create temporary files totalling {}",
            format_bytes(config.file_size * config.threads as u64)
        ));
        log("WARNING: if the machine has more memory than this, the test may be invalid");
        log(&format!(
            "out of {} slots, will try {} in each generated file",
            config.available_slots(),
            config.seeks_per_worker()
        ));

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Run the benchmark and return the final report
    ///
    /// The report is also printed by the guard, which is the authoritative
    /// user-visible output; the returned value serves callers and tests.
    pub fn run(&self) -> crate::Result<RunReport> {
        let threads = self.config.threads;
        let shared = SharedState {
            fill_block: Arc::new(fill::generate_block(self.config.buffer_size)),
            iops: Arc::new(IopsCounter::new()),
            records: Arc::new(RecordMap::new()),
            cleanup: Arc::new(Mutex::new(Vec::new())),
        };

        // All workers rendezvous here after creating their files.
        let create_barrier = Arc::new(Barrier::new(threads));
        // Workers plus the coordinator rendezvous here after the read tests.
        let finish_barrier = Arc::new(Barrier::new(threads + 1));

        let mut guard = ReportGuard {
            config: Arc::clone(&self.config),
            records: Arc::clone(&shared.records),
            iops: Arc::clone(&shared.iops),
            cleanup: Arc::clone(&shared.cleanup),
            done: false,
        };

        let scope_result = crossbeam::thread::scope(|s| -> Result<bool, MeterError> {
            for id in 0..threads {
                let worker = Worker::new(
                    id,
                    Arc::clone(&self.config),
                    shared.clone(),
                    Arc::clone(&create_barrier),
                    Arc::clone(&finish_barrier),
                );
                let spawned = s
                    .builder()
                    .name(format!("worker-{}", id))
                    .spawn(move |_| worker.run());
                if let Err(e) = spawned {
                    // Peers already spawned would block on the barriers
                    // forever; fail them fast before bailing out.
                    create_barrier.abandon();
                    finish_barrier.abandon();
                    return Err(MeterError::io("worker spawn", e));
                }
            }

            match finish_barrier.wait() {
                Ok(_) => {
                    log("test complete, workers exited");
                    log(&format!("statistics map: {:?}", shared.records.snapshot()));
                    Ok(false)
                }
                Err(_) => {
                    log(&format!("{}", MeterError::BarrierBroken("io test")));
                    Ok(true)
                }
            }
        });

        let barrier_broken = match scope_result {
            Ok(result) => result?,
            Err(_) => {
                log("a worker thread panicked, reporting partial results");
                true
            }
        };

        Ok(guard.emit(barrier_broken))
    }
}

/// Deferred aggregation and cleanup scope around the run
///
/// `emit` is the normal path; `Drop` covers unwinding, so the report is
/// produced on completion or termination alike. Neither survives an
/// unconditional kill.
struct ReportGuard {
    config: Arc<Config>,
    records: Arc<RecordMap>,
    iops: Arc<IopsCounter>,
    cleanup: Arc<Mutex<Vec<PathBuf>>>,
    done: bool,
}

impl ReportGuard {
    /// Aggregate, print the report, and remove the test files
    fn emit(&mut self, barrier_broken: bool) -> RunReport {
        self.done = true;

        let records = self.records.snapshot();
        let report = RunReport {
            throughput: aggregate_throughput(&records),
            iops: aggregate_iops(&self.iops.snapshot()),
            records,
            barrier_broken,
        };

        if self.config.json {
            if let Err(e) = output::json::print_report(&report) {
                log(&format!("failed to render JSON report: {}", e));
            }
        } else {
            output::text::print_report(&report);
        }

        self.remove_files();
        report
    }

    /// Best-effort removal of every registered test file
    fn remove_files(&self) {
        if self.config.keep_files {
            return;
        }
        let cleanup = self.cleanup.lock().unwrap_or_else(|e| e.into_inner());
        for path in cleanup.iter() {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != io::ErrorKind::NotFound {
                    log(&format!("failed to remove {}: {}", path.display(), e));
                }
            }
        }
    }
}

impl Drop for ReportGuard {
    fn drop(&mut self) {
        if !self.done {
            // Unwinding out of the run: still report whatever exists.
            let _ = self.emit(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::OpKind;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, threads: usize) -> Config {
        Config {
            threads,
            file_size: 4096 * 16,
            buffer_size: 4096,
            dir: dir.path().to_path_buf(),
            json: false,
            keep_files: false,
        }
    }

    #[test]
    fn test_invalid_config_rejected_before_spawn() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir, 2);
        config.file_size = config.buffer_size as u64;

        assert!(matches!(
            Coordinator::new(config),
            Err(MeterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_run_produces_one_write_record_per_worker() {
        let dir = TempDir::new().unwrap();
        let threads = 2;
        let coordinator = Coordinator::new(test_config(&dir, threads)).unwrap();

        let report = coordinator.run().unwrap();
        assert!(!report.barrier_broken);

        let writes = report
            .records
            .iter()
            .filter(|r| r.kind == OpKind::Write)
            .count();
        assert_eq!(writes, threads);
        assert_eq!(report.records.len(), threads * 3);
        assert_eq!(report.throughput.len(), 3);
        assert_eq!(report.iops.len(), 3);
    }

    #[test]
    fn test_no_read_phase_starts_before_all_creation_ends() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(test_config(&dir, 4)).unwrap();

        let report = coordinator.run().unwrap();

        let last_write_end = report
            .records
            .iter()
            .filter(|r| r.kind == OpKind::Write)
            .map(|r| r.end_ms)
            .max()
            .unwrap();
        let first_read_start = report
            .records
            .iter()
            .filter(|r| r.kind == OpKind::Read)
            .map(|r| r.start_ms)
            .min()
            .unwrap();

        // The creation barrier orders every phase 1 before every phase 2.
        assert!(last_write_end <= first_read_start);
    }

    #[test]
    fn test_files_removed_after_run() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, 2);
        let paths: Vec<_> = (0..config.threads).map(|id| config.file_path(id)).collect();

        Coordinator::new(config).unwrap().run().unwrap();

        for path in paths {
            assert!(!path.exists(), "{} should have been removed", path.display());
        }
    }

    #[test]
    fn test_keep_files_leaves_files_on_disk() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir, 1);
        config.keep_files = true;
        let path = config.file_path(0);

        Coordinator::new(config).unwrap().run().unwrap();

        assert!(path.exists());
    }
}
