//! Poisonable rendezvous barrier
//!
//! A fixed number of parties must all arrive before any proceeds. Unlike
//! `std::sync::Barrier`, this one can be *abandoned*: a party that knows it
//! will never arrive calls [`Barrier::abandon`], which fails every current
//! and future waiter with [`BrokenBarrier`] instead of leaving them blocked
//! forever. The run protocol uses two of these: one for "all files created"
//! and one for "all testing finished".
//!
//! The barrier is generation-counted, so a waiter that was released by a
//! completed rendezvous is unaffected by a later abandon.

use std::sync::{Condvar, Mutex};

/// Error returned to all waiters when a party abandons the barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokenBarrier;

impl std::fmt::Display for BrokenBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "barrier broken: a party failed to arrive")
    }
}

impl std::error::Error for BrokenBarrier {}

#[derive(Debug)]
struct BarrierState {
    /// Parties currently blocked in `wait` for this generation
    arrived: usize,
    /// Incremented each time a full rendezvous completes
    generation: u64,
    /// Set once by `abandon`; the barrier never recovers
    broken: bool,
}

/// Rendezvous point for a fixed number of parties
#[derive(Debug)]
pub struct Barrier {
    parties: usize,
    state: Mutex<BarrierState>,
    condvar: Condvar,
}

impl Barrier {
    /// Create a barrier for `parties` participants
    ///
    /// `parties` must be at least 1; a one-party barrier trips immediately.
    pub fn new(parties: usize) -> Self {
        assert!(parties >= 1, "barrier needs at least one party");
        Self {
            parties,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                broken: false,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Number of parties required to trip the barrier
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Arrive at the barrier and block until all parties have arrived
    ///
    /// Returns `Ok(true)` for exactly one caller per rendezvous (the last to
    /// arrive), `Ok(false)` for the rest. Returns `Err(BrokenBarrier)` if the
    /// barrier was abandoned before this rendezvous completed.
    pub fn wait(&self) -> Result<bool, BrokenBarrier> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.broken {
            return Err(BrokenBarrier);
        }

        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation += 1;
            self.condvar.notify_all();
            return Ok(true);
        }

        let generation = state.generation;
        while state.generation == generation && !state.broken {
            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }

        if state.generation == generation {
            // Woken by abandon, not by a completed rendezvous.
            Err(BrokenBarrier)
        } else {
            Ok(false)
        }
    }

    /// Mark the barrier as broken and wake all waiters
    ///
    /// Called by a party that cannot arrive. Idempotent; once broken the
    /// barrier stays broken and every subsequent `wait` fails immediately.
    pub fn abandon(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.broken = true;
        self.condvar.notify_all();
    }

    /// Whether the barrier has been abandoned
    pub fn is_broken(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .broken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_single_party_trips_immediately() {
        let barrier = Barrier::new(1);
        assert_eq!(barrier.wait(), Ok(true));
        // Cyclic: a second rendezvous works the same way.
        assert_eq!(barrier.wait(), Ok(true));
    }

    #[test]
    fn test_all_parties_released_with_one_leader() {
        let parties = 4;
        let barrier = Arc::new(Barrier::new(parties));
        let leaders = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..parties)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                let leaders = Arc::clone(&leaders);
                thread::spawn(move || {
                    let result = barrier.wait().unwrap();
                    if result {
                        leaders.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(leaders.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_waiter_does_not_pass_early() {
        let barrier = Arc::new(Barrier::new(2));
        let passed = Arc::new(AtomicUsize::new(0));

        let waiter = {
            let barrier = Arc::clone(&barrier);
            let passed = Arc::clone(&passed);
            thread::spawn(move || {
                barrier.wait().unwrap();
                passed.fetch_add(1, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(passed.load(Ordering::SeqCst), 0);

        barrier.wait().unwrap();
        waiter.join().unwrap();
        assert_eq!(passed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_abandon_fails_blocked_waiters() {
        let barrier = Arc::new(Barrier::new(3));

        let waiters: Vec<_> = (0..2)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || barrier.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        barrier.abandon();

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), Err(BrokenBarrier));
        }
    }

    #[test]
    fn test_wait_after_abandon_fails_immediately() {
        let barrier = Barrier::new(2);
        barrier.abandon();
        assert!(barrier.is_broken());
        assert_eq!(barrier.wait(), Err(BrokenBarrier));
    }

    #[test]
    fn test_completed_rendezvous_unaffected_by_later_abandon() {
        let barrier = Arc::new(Barrier::new(2));

        let waiter = {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || barrier.wait())
        };
        assert!(barrier.wait().is_ok());
        assert!(waiter.join().unwrap().is_ok());

        // Breaking the barrier afterwards only affects new arrivals.
        barrier.abandon();
        assert_eq!(barrier.wait(), Err(BrokenBarrier));
    }
}
