//! Mercator series: `x - x²/2 + x³/3 - … = ln(1+x)`, split into strided
//! per-worker partial sums. Pure arithmetic, no shared state.

/// Fixed total term count (T).
pub const TOTAL_TERMS: u64 = 200_000;

/// The signed term `(-1)^(n+1) * x^n / n` for `n >= 1`. Non-finite values
/// from pathological inputs propagate; nothing is clamped.
pub fn term(x: f64, n: u64) -> f64 {
    let sign = if n % 2 == 1 { 1.0 } else { -1.0 };
    sign * x.powi(n as i32) / n as f64
}

/// Worker `id`'s share: terms `{id+1, id+1+workers, id+1+2*workers, …}` up
/// to `total_terms`. Over `id` in `0..workers` the strides cover every
/// index in `1..=total_terms` exactly once.
pub fn partial_sum(x: f64, id: usize, workers: usize, total_terms: u64) -> f64 {
    let mut acc = 0.0;
    let mut n = id as u64 + 1;
    while n <= total_terms {
        acc += term(x, n);
        n += workers as u64;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_is_deterministic() {
        for n in [1, 2, 17, 1000, TOTAL_TERMS] {
            assert_eq!(term(0.5, n), term(0.5, n));
        }
    }

    #[test]
    fn term_alternates_sign() {
        assert_eq!(term(0.5, 1), 0.5);
        assert_eq!(term(0.5, 2), -0.125);
        assert!(term(0.5, 3) > 0.0);
        assert!(term(0.5, 4) < 0.0);
    }

    #[test]
    fn strides_partition_every_index_once() {
        let total = 1000;
        for workers in 1..=6 {
            let mut hits = vec![0u32; total as usize + 1];
            for id in 0..workers {
                let mut n = id as u64 + 1;
                while n <= total {
                    hits[n as usize] += 1;
                    n += workers as u64;
                }
            }
            for n in 1..=total as usize {
                assert_eq!(hits[n], 1, "index {} with {} workers", n, workers);
            }
        }
    }

    #[test]
    fn partial_sums_recombine_to_sequential_sum() {
        let x = 0.5;
        let total = 5000;
        let sequential: f64 = (1..=total).map(|n| term(x, n)).sum();
        for workers in 1..=5 {
            let split: f64 = (0..workers).map(|id| partial_sum(x, id, workers, total)).sum();
            assert!(
                (split - sequential).abs() < 1e-12,
                "workers={} split={} sequential={}",
                workers,
                split,
                sequential
            );
        }
    }

    #[test]
    fn full_series_approximates_ln_1_plus_x() {
        let x = 0.5;
        let split: f64 = (0..4).map(|id| partial_sum(x, id, 4, TOTAL_TERMS)).sum();
        assert!((split - 1.5f64.ln()).abs() < 1e-6, "got {}", split);
    }

    #[test]
    fn non_finite_input_propagates() {
        assert!(partial_sum(f64::NAN, 0, 1, 10).is_nan());
    }
}
