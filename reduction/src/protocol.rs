// Shared layout + the three gates. One `SharedState` per run, visible to
// every participant through the region mapping.

use crate::error::Result;
use crate::sem::Semaphore;

/// Fixed worker count (N). The gate release/wait counts below are tied to
/// this constant; it is the only place N appears.
pub const WORKERS: usize = 4;

#[repr(C)]
pub struct SharedState {
    /// Written once by the coordinator, strictly before the first start
    /// release. Workers read it only after passing the start gate.
    pub input_value: f64,
    /// Written once by the coordinator, under `lock`, after all N done
    /// signals. Read by the lifecycle manager after the coordinator exits.
    pub result: f64,
    /// Slot `i` is written exactly once, by worker `i`, under `lock`.
    pub partial_sums: [f64; WORKERS],
}

/// The three named synchronization objects. Field order is teardown order:
/// the mutual-exclusion lock is released first, then the gates; the region
/// itself goes after the whole bundle.
pub struct Gates {
    /// Binary, starts available. Guards `partial_sums` and `result`.
    pub lock: Semaphore,
    /// Counting, starts 0. Released N times by the coordinator.
    pub start: Semaphore,
    /// Counting, starts 0. Posted once per worker, waited N times.
    pub done: Semaphore,
}

impl Gates {
    pub fn create(session: &str) -> Result<Self> {
        Ok(Gates {
            lock: Semaphore::create(&format!("{}_lock", session), 1)?,
            start: Semaphore::create(&format!("{}_start", session), 0)?,
            done: Semaphore::create(&format!("{}_done", session), 0)?,
        })
    }
}
