// One worker process. Blocks on the start gate, computes its stride of the
// series fully in parallel with the others, then serializes its single
// slot write and signals completion.

use crate::error::Result;
use crate::protocol::{Gates, SharedState, WORKERS};
use crate::series::{self, TOTAL_TERMS};

pub fn run(id: usize, state: *mut SharedState, gates: &Gates) -> Result<()> {
    // Suspended until the coordinator has published the input and released
    // a permit. The gate's wait/post pair is what makes the input read
    // below safe.
    gates.start.wait()?;
    let x = unsafe { (*state).input_value };

    // Pure computation, no shared-state access.
    let sum = series::partial_sum(x, id, WORKERS, TOTAL_TERMS);

    {
        let _section = gates.lock.lock()?;
        unsafe {
            (*state).partial_sums[id] = sum;
        }
    }
    gates.done.post()?;
    Ok(())
}
