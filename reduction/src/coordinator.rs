// The coordinator publishes the input, releases the start gate N times,
// joins on the done gate N times, then aggregates under the lock.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::protocol::{Gates, SharedState, WORKERS};

/// One floating-point value from a text file. Anything short of that is
/// `InputUnavailable`.
pub fn read_input(path: &Path) -> Result<f64> {
    let text = fs::read_to_string(path).map_err(|e| Error::InputUnavailable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::InputUnavailable {
            path: path.to_path_buf(),
            detail: format!("not a number: {:?}", text.trim()),
        })
}

pub fn run(input: &Path, state: *mut SharedState, gates: &Gates) -> Result<()> {
    // Bail out before any start release: workers must never observe an
    // uninitialized input value.
    let x = read_input(input)?;

    // No lock needed; this write happens-before every start post below by
    // program order, and workers read only after passing the gate.
    unsafe {
        (*state).input_value = x;
    }

    for _ in 0..WORKERS {
        gates.start.post()?;
    }
    for _ in 0..WORKERS {
        gates.done.wait()?;
    }

    let _section = gates.lock.lock()?;
    unsafe {
        (*state).result = (*state).partial_sums.iter().sum();
    }
    Ok(())
}
