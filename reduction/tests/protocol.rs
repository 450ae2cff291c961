// Protocol-level tests that fork real child processes against the shared
// region and gates, plus end-to-end runs through the lifecycle manager.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;

use reduction::{lifecycle, Config, Error, Gates, SharedState, ShmRegion, WORKERS};

fn session(tag: &str) -> String {
    format!("reduction_test_{}_{}", tag, std::process::id())
}

fn scratch_input(tag: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "reduction_test_{}_{}.txt",
        tag,
        std::process::id()
    ));
    fs::write(&path, contents).unwrap();
    path
}

fn fork_child(role: impl FnOnce() -> i32) -> libc::pid_t {
    match unsafe { libc::fork() } {
        -1 => panic!("fork: {}", std::io::Error::last_os_error()),
        0 => {
            let code = role();
            unsafe { libc::_exit(code) }
        }
        pid => pid,
    }
}

fn reap_ok(pid: libc::pid_t) {
    let mut status = 0;
    let r = unsafe { libc::waitpid(pid, &mut status, 0) };
    assert_eq!(r, pid, "waitpid: {}", std::io::Error::last_os_error());
    assert!(libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0);
}

// N=4 workers over 200000 terms at x=0.5 reduce to ln(1.5) within
// summation tolerance.
#[test]
fn full_run_matches_reference() {
    let input = scratch_input("full", "0.5\n");
    let summary = lifecycle::run(&Config {
        session: session("full"),
        input: input.clone(),
    })
    .unwrap();

    assert_eq!(summary.workers, WORKERS);
    assert_eq!(summary.input, 0.5);
    assert!((summary.result - 1.5f64.ln()).abs() < 1e-6, "result {}", summary.result);
    assert_eq!(summary.reference, 1.5f64.ln());
    fs::remove_file(&input).unwrap();
}

// Back-to-back runs reuse nothing stale; each run creates fresh objects.
#[test]
fn repeated_runs_are_independent() {
    let input = scratch_input("repeat", "0.25\n");
    for _ in 0..3 {
        let summary = lifecycle::run(&Config {
            session: session("repeat"),
            input: input.clone(),
        })
        .unwrap();
        assert!((summary.result - 1.25f64.ln()).abs() < 1e-6);
    }
    fs::remove_file(&input).unwrap();
}

// Missing input aborts with the distinguished error, the start gate is
// never released, and the blocked workers are reaped (run() returning at
// all proves that).
#[test]
fn missing_input_aborts_without_computing() {
    let err = lifecycle::run(&Config {
        session: session("noinput"),
        input: PathBuf::from("/nonexistent/reduction-input.txt"),
    })
    .unwrap_err();
    assert!(matches!(err, Error::InputUnavailable { .. }), "got {}", err);
}

#[test]
fn malformed_input_aborts_without_computing() {
    let input = scratch_input("malformed", "zero point five\n");
    let err = lifecycle::run(&Config {
        session: session("malformed"),
        input: input.clone(),
    })
    .unwrap_err();
    assert!(matches!(err, Error::InputUnavailable { .. }), "got {}", err);
    fs::remove_file(&input).unwrap();
}

// Ordering invariant: a worker passing the start gate always sees the
// coordinator's written input, never the zeroed initial value. Children
// snapshot input_value immediately after the gate and park it in their
// slot for the parent to check.
#[test]
fn start_gate_publishes_input_before_any_worker_runs() {
    let state = ShmRegion::<SharedState>::create(&session("order_state")).unwrap();
    let gates = Gates::create(&session("order")).unwrap();
    let shared = state.get();

    let mut children = Vec::new();
    for id in 0..WORKERS {
        children.push(fork_child(|| {
            if gates.start.wait().is_err() {
                return 1;
            }
            let snapshot = unsafe { (*shared).input_value };
            let Ok(_section) = gates.lock.lock() else {
                return 1;
            };
            unsafe {
                (*shared).partial_sums[id] = snapshot;
            }
            drop(_section);
            if gates.done.post().is_err() {
                return 1;
            }
            0
        }));
    }

    unsafe {
        (*shared).input_value = 42.0;
    }
    for _ in 0..WORKERS {
        gates.start.post().unwrap();
    }
    for _ in 0..WORKERS {
        gates.done.wait().unwrap();
    }

    for pid in children {
        reap_ok(pid);
    }
    let _section = gates.lock.lock().unwrap();
    for id in 0..WORKERS {
        let snapshot = unsafe { (*shared).partial_sums[id] };
        assert_eq!(snapshot, 42.0, "worker {} raced the input write", id);
    }
}

// Join invariant: even with each worker sleeping a randomized delay
// before signaling, the parent's N done-waits always see every slot
// written; the aggregate is never missing a contribution.
#[test]
fn done_gate_joins_all_workers_before_aggregation() {
    let state = ShmRegion::<SharedState>::create(&session("join_state")).unwrap();
    let gates = Gates::create(&session("join")).unwrap();
    let shared = state.get();

    for round in 0..5 {
        unsafe {
            (*shared).partial_sums = [0.0; WORKERS];
        }

        let mut children = Vec::new();
        for id in 0..WORKERS {
            children.push(fork_child(|| {
                if gates.start.wait().is_err() {
                    return 1;
                }
                let jitter = rand::thread_rng().gen_range(0..20);
                std::thread::sleep(Duration::from_millis(jitter));
                {
                    let Ok(_section) = gates.lock.lock() else {
                        return 1;
                    };
                    unsafe {
                        (*shared).partial_sums[id] = 1.0;
                    }
                }
                if gates.done.post().is_err() {
                    return 1;
                }
                0
            }));
        }

        for _ in 0..WORKERS {
            gates.start.post().unwrap();
        }
        for _ in 0..WORKERS {
            gates.done.wait().unwrap();
        }

        let total: f64 = {
            let _section = gates.lock.lock().unwrap();
            unsafe { (*shared).partial_sums.iter().sum() }
        };
        assert_eq!(total, WORKERS as f64, "round {} lost a contribution", round);

        for pid in children {
            reap_ok(pid);
        }
    }
}
