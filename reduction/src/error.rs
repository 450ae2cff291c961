use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The input source is missing, unreadable, or not a number. Reported
    /// before any start-gate release; no computation happens on this path.
    #[error("input unavailable: {}: {detail}", path.display())]
    InputUnavailable { path: PathBuf, detail: String },

    /// A syscall failed. `name` is the kernel object it was aimed at.
    #[error("{op}({name}): {source}")]
    Sys {
        op: &'static str,
        name: String,
        source: std::io::Error,
    },

    #[error("worker {id} exited abnormally (wait status {status:#x})")]
    WorkerFailed { id: usize, status: i32 },

    #[error("coordinator exited abnormally (wait status {status:#x})")]
    CoordinatorFailed { status: i32 },
}

impl Error {
    /// Capture errno for a failed syscall.
    pub(crate) fn sys(op: &'static str, name: &str) -> Self {
        Error::Sys {
            op,
            name: name.to_string(),
            source: std::io::Error::last_os_error(),
        }
    }
}
