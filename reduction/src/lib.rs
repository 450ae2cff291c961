//! Fan-out/fan-in parallel reduction of the Mercator series over POSIX
//! shared memory and named semaphores.
//!
//! A fixed pool of worker processes each sums a strided share of the
//! series terms; a coordinator process publishes the input, releases the
//! start gate N times, joins on the done gate N times, and aggregates the
//! partial sums under a mutual-exclusion lock. The lifecycle manager owns
//! allocation and teardown of every kernel object.

pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod protocol;
pub mod sem;
pub mod series;
pub mod shm;
pub mod worker;

pub use error::{Error, Result};
pub use lifecycle::{Config, Summary, EXIT_NO_INPUT};
pub use protocol::{Gates, SharedState, WORKERS};
pub use sem::Semaphore;
pub use series::TOTAL_TERMS;
pub use shm::ShmRegion;
