//! Bounded-concurrency fan-out of comparison units to the oracle.
//!
//! A fixed pool of scoped worker threads shares one queue (the unit slice
//! plus an atomic cursor) and one results channel. A worker claims the next
//! unit, calls the oracle, extracts a result and sends it back. Failures of
//! any kind are absorbed per unit; the run never aborts early.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use crate::extract::extract;
use crate::model::{ComparisonUnit, DispatchStats, OracleResult};
use crate::oracle::{call_oracle, MatchOracle};

pub const DEFAULT_POOL_SIZE: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Usable results, in arrival order.
    pub results: Vec<OracleResult>,
    pub stats: DispatchStats,
}

/// Shared work queue. `fetch_add` on the cursor is an exclusive claim.
struct UnitQueue<'a> {
    units: &'a [ComparisonUnit],
    cursor: AtomicUsize,
}

impl<'a> UnitQueue<'a> {
    fn new(units: &'a [ComparisonUnit]) -> Self {
        Self {
            units,
            cursor: AtomicUsize::new(0),
        }
    }

    fn claim(&self) -> Option<&'a ComparisonUnit> {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.units.get(idx)
    }
}

#[derive(Default)]
struct Counters {
    failed: AtomicUsize,
    unusable: AtomicUsize,
}

/// Run every unit through the oracle with at most `pool_size` calls in flight.
///
/// Returns once the queue is drained. A `pool_size` of zero is treated as one.
pub fn dispatch(
    units: &[ComparisonUnit],
    oracle: &dyn MatchOracle,
    pool_size: usize,
    date_window_days: u32,
) -> DispatchOutcome {
    let planned = units.len();
    if planned == 0 {
        return DispatchOutcome::default();
    }

    let workers = pool_size.max(1).min(planned);
    log::debug!("dispatching {planned} unit(s) across {workers} worker(s)");

    let queue = UnitQueue::new(units);
    let counters = Counters::default();
    let (tx, rx) = mpsc::channel::<OracleResult>();

    thread::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let counters = &counters;
            scope.spawn(move || {
                while let Some(unit) = queue.claim() {
                    if let Some(result) = run_unit(worker, unit, oracle, date_window_days, counters) {
                        // Receiver outlives the scope; a send can only fail if it was dropped.
                        let _ = tx.send(result);
                    }
                }
            });
        }
    });
    drop(tx);

    let results: Vec<OracleResult> = rx.into_iter().collect();
    let stats = DispatchStats {
        planned,
        succeeded: results.len(),
        failed: counters.failed.load(Ordering::Relaxed),
        unusable: counters.unusable.load(Ordering::Relaxed),
    };

    if stats.failed > 0 || stats.unusable > 0 {
        log::warn!(
            "{} of {} unit(s) produced no result ({} failed, {} unusable)",
            stats.failed + stats.unusable,
            planned,
            stats.failed,
            stats.unusable
        );
    }

    DispatchOutcome { results, stats }
}

fn run_unit(
    worker: usize,
    unit: &ComparisonUnit,
    oracle: &dyn MatchOracle,
    date_window_days: u32,
    counters: &Counters,
) -> Option<OracleResult> {
    log::debug!(
        "worker {worker}: unit {} ({} x {} records)",
        unit.index,
        unit.side_a.len(),
        unit.side_b.len()
    );

    let call = panic::catch_unwind(AssertUnwindSafe(|| {
        call_oracle(oracle, unit, date_window_days)
    }));

    let raw = match call {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            log::warn!("unit {}: oracle call failed: {e}", unit.index);
            counters.failed.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        Err(_) => {
            log::warn!("unit {}: oracle call panicked", unit.index);
            counters.failed.fetch_add(1, Ordering::Relaxed);
            return None;
        }
    };

    match extract(&raw) {
        Some(result) => Some(result),
        None => {
            log::warn!("unit {}: oracle output could not be decoded", unit.index);
            counters.unusable.fetch_add(1, Ordering::Relaxed);
            None
        }
    }
}
