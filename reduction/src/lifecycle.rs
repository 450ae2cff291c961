// Sole owner of the region and the gates. Forks N workers plus one
// coordinator, joins them, reports, and tears everything down on every
// path via drop order.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::coordinator;
use crate::error::{Error, Result};
use crate::protocol::{Gates, SharedState, WORKERS};
use crate::series::TOTAL_TERMS;
use crate::shm::ShmRegion;
use crate::worker;

/// Exit code the coordinator uses when the input source is unavailable.
/// A named signal, checked through WIFEXITED/WEXITSTATUS rather than a raw
/// wait-status constant.
pub const EXIT_NO_INPUT: i32 = 66;

pub struct Config {
    /// Namespace for the kernel object names; unique per run so repeated
    /// or concurrent runs cannot collide.
    pub session: String,
    /// Path of the text file holding the input value.
    pub input: PathBuf,
}

#[derive(Debug)]
pub struct Summary {
    pub workers: usize,
    pub terms: u64,
    pub input: f64,
    pub result: f64,
    /// `ln(1+x)` from the standard library, for eyeballing only.
    pub reference: f64,
    pub elapsed: Duration,
}

// Drop order: gates first (lock, start, done), then the region.
struct Harness {
    gates: Gates,
    state: ShmRegion<SharedState>,
}

pub fn run(cfg: &Config) -> Result<Summary> {
    let state = ShmRegion::<SharedState>::create(&format!("{}_state", cfg.session))?;
    let gates = Gates::create(&cfg.session)?;
    let harness = Harness { gates, state };
    let shared = harness.state.get();

    let started = Instant::now();

    let mut workers = Vec::with_capacity(WORKERS);
    for id in 0..WORKERS {
        match spawn(|| match worker::run(id, shared, &harness.gates) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("worker {}: {}", id, e);
                1
            }
        }) {
            Ok(pid) => workers.push(pid),
            Err(e) => {
                kill_and_reap(&workers);
                return Err(e);
            }
        }
    }

    let coordinator = match spawn(|| match coordinator::run(&cfg.input, shared, &harness.gates) {
        Ok(()) => 0,
        Err(e @ Error::InputUnavailable { .. }) => {
            eprintln!("coordinator: {}", e);
            EXIT_NO_INPUT
        }
        Err(e) => {
            eprintln!("coordinator: {}", e);
            1
        }
    }) {
        Ok(pid) => pid,
        Err(e) => {
            kill_and_reap(&workers);
            return Err(e);
        }
    };

    // Join the coordinator first: on the input-failure path it never
    // released the start gate, so the workers are still blocked and must
    // be reaped here.
    let status = wait_for(coordinator)?;
    match exit_code(status) {
        Some(0) => {}
        Some(EXIT_NO_INPUT) => {
            kill_and_reap(&workers);
            return Err(Error::InputUnavailable {
                path: cfg.input.clone(),
                detail: "coordinator reported missing or unreadable input".to_string(),
            });
        }
        _ => {
            kill_and_reap(&workers);
            return Err(Error::CoordinatorFailed { status });
        }
    }

    reap_workers(&workers)?;

    let elapsed = started.elapsed();
    // All participants have exited; the region is quiescent.
    let (input, result) = unsafe { ((*shared).input_value, (*shared).result) };
    Ok(Summary {
        workers: WORKERS,
        terms: TOTAL_TERMS,
        input,
        result,
        reference: (1.0 + input).ln(),
        elapsed,
    })
}

// Fork; the child runs its role and _exits without unwinding, so it never
// drops (and never unlinks) the inherited region or gates.
fn spawn(role: impl FnOnce() -> i32) -> Result<libc::pid_t> {
    match unsafe { libc::fork() } {
        -1 => Err(Error::sys("fork", "reduction")),
        0 => {
            let code = role();
            unsafe { libc::_exit(code) }
        }
        pid => Ok(pid),
    }
}

// Drain every worker before reporting; returning on the first bad status
// would leave the rest as zombies until process exit.
fn reap_workers(workers: &[libc::pid_t]) -> Result<()> {
    let mut failure = None;
    for (id, &pid) in workers.iter().enumerate() {
        match wait_for(pid) {
            Ok(status) if exit_code(status) == Some(0) => {}
            Ok(status) => {
                if failure.is_none() {
                    failure = Some(Error::WorkerFailed { id, status });
                }
            }
            Err(e) => {
                if failure.is_none() {
                    failure = Some(e);
                }
            }
        }
    }
    failure.map_or(Ok(()), Err)
}

fn wait_for(pid: libc::pid_t) -> Result<i32> {
    let mut status = 0;
    loop {
        let r = unsafe { libc::waitpid(pid, &mut status, 0) };
        if r == pid {
            return Ok(status);
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(Error::Sys {
                op: "waitpid",
                name: pid.to_string(),
                source: err,
            });
        }
    }
}

fn exit_code(status: i32) -> Option<i32> {
    if libc::WIFEXITED(status) {
        Some(libc::WEXITSTATUS(status))
    } else {
        None
    }
}

fn kill_and_reap(pids: &[libc::pid_t]) {
    for &pid in pids {
        unsafe { libc::kill(pid, libc::SIGKILL) };
    }
    for &pid in pids {
        let _ = wait_for(pid);
    }
}
