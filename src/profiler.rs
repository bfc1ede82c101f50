//! # Profiler — Empirical Scaling of Factorization Cost
//!
//! Times `PrimeOracle::factor_complete` on one semiprime per bit size, chosen
//! near the top of each band, independent of any claim. Trial division on a
//! balanced semiprime costs about √n ≈ 2^(bits/2) divisions, so
//! `log2(elapsed)` against `bits` should rise with slope close to 0.5
//! (Pollard's rho would show about 0.25).
//!
//! Monotonicity and slope are *checked*, not enforced: timings on a busy
//! machine are noisy, and tiny bit sizes sit below timer resolution. Each
//! point is the minimum of several repetitions.
//!
//! Also carries the static cost table for trial division at sizes far beyond
//! what can be timed, e.g. 2048-bit RSA moduli.

use serde::Serialize;
use std::time::Instant;
use tracing::debug;

use crate::corpus::bit_band;
use crate::oracle::PrimeOracle;
use crate::sieve;

/// Growth slope (log2 seconds per bit) expected from trial division.
pub const TRIAL_DIVISION_SLOPE: f64 = 0.5;

/// Growth slope expected from Pollard's rho.
pub const POLLARD_RHO_SLOPE: f64 = 0.25;

/// Default trial-division throughput for cost estimates.
pub const DEFAULT_OPS_PER_SECOND: f64 = 1e9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfilePoint {
    pub bit_size: u32,
    pub n: u64,
    pub elapsed_seconds: f64,
}

/// Least-squares fit of `log2(elapsed) = slope · bits + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthFit {
    pub slope: f64,
    pub intercept: f64,
    /// Number of points with a positive elapsed time used in the fit.
    pub points: usize,
}

impl GrowthFit {
    /// Whichever reference slope the fit sits closest to.
    pub fn closest_reference(&self) -> &'static str {
        if (self.slope - TRIAL_DIVISION_SLOPE).abs() <= (self.slope - POLLARD_RHO_SLOPE).abs() {
            "trial division (2^(bits/2))"
        } else {
            "pollard rho (2^(bits/4))"
        }
    }
}

/// Times factorization across bit sizes with a borrowed oracle.
pub struct ComplexityProfiler<'a> {
    oracle: &'a PrimeOracle,
    repetitions: usize,
}

impl<'a> ComplexityProfiler<'a> {
    pub fn new(oracle: &'a PrimeOracle) -> Self {
        ComplexityProfiler {
            oracle,
            repetitions: 3,
        }
    }

    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions.max(1);
        self
    }

    /// Time `factor_complete` for one top-of-band semiprime per bit size,
    /// in the order given. Bit sizes outside `[4, 63]` are skipped.
    pub fn profile(&self, bit_sizes: &[u32]) -> Vec<ProfilePoint> {
        let mut points = Vec::with_capacity(bit_sizes.len());
        for &bits in bit_sizes {
            let Some(n) = self.top_of_band_semiprime(bits) else {
                debug!(bits, "no semiprime available for bit size");
                continue;
            };

            let mut best = f64::INFINITY;
            for _ in 0..self.repetitions {
                let start = Instant::now();
                let factors = self.oracle.factor_complete(std::hint::black_box(n));
                let elapsed = start.elapsed().as_secs_f64();
                debug_assert_eq!(factors.iter().product::<u64>(), n);
                best = best.min(elapsed);
            }

            debug!(bits, n, elapsed = best, "profiled factorization");
            points.push(ProfilePoint {
                bit_size: bits,
                n,
                elapsed_seconds: best,
            });
        }
        points
    }

    /// A semiprime near the top of the `bits` band: p is the largest prime
    /// ≤ √(2^bits − 1) and q the largest prime ≤ (2^bits − 1) / p.
    pub fn top_of_band_semiprime(&self, bits: u32) -> Option<u64> {
        if !(4..=63).contains(&bits) {
            return None;
        }
        let (min_val, max_val) = bit_band(bits);
        let p = self.largest_prime_at_most(sieve::isqrt(max_val))?;
        let q = self.largest_prime_at_most(max_val / p)?;
        let n = p.checked_mul(q)?;
        (n >= min_val).then_some(n)
    }

    fn largest_prime_at_most(&self, mut x: u64) -> Option<u64> {
        while x >= 2 {
            if self.oracle.is_prime_trial(x) {
                return Some(x);
            }
            x -= 1;
        }
        None
    }
}

/// True if elapsed time never drops as bit size grows.
pub fn is_non_decreasing(points: &[ProfilePoint]) -> bool {
    let mut sorted: Vec<_> = points.to_vec();
    sorted.sort_by_key(|p| p.bit_size);
    sorted
        .windows(2)
        .all(|w| w[1].elapsed_seconds >= w[0].elapsed_seconds)
}

/// Fit the growth slope of `log2(elapsed)` against bit size.
///
/// Points with zero elapsed time carry no information and are dropped.
/// Returns `None` with fewer than two usable points or a degenerate spread.
pub fn fit_growth(points: &[ProfilePoint]) -> Option<GrowthFit> {
    let usable: Vec<(f64, f64)> = points
        .iter()
        .filter(|p| p.elapsed_seconds > 0.0)
        .map(|p| (p.bit_size as f64, p.elapsed_seconds.log2()))
        .collect();
    if usable.len() < 2 {
        return None;
    }

    let count = usable.len() as f64;
    let mean_x = usable.iter().map(|(x, _)| x).sum::<f64>() / count;
    let mean_y = usable.iter().map(|(_, y)| y).sum::<f64>() / count;
    let sxx: f64 = usable.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = usable
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    let slope = sxy / sxx;
    Some(GrowthFit {
        slope,
        intercept: mean_y - slope * mean_x,
        points: usable.len(),
    })
}

/// Estimated trial-division cost for factoring a balanced `bits`-bit modulus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub bits: u32,
    pub digits: u64,
    /// log10 of the division count, 2^(bits/2).
    pub log10_operations: f64,
    /// log10 of the wall-clock seconds at the given throughput.
    pub log10_seconds: f64,
    pub human: String,
}

/// Trial division needs about 2^(bits/2) divisions. Works in log space so
/// 2048-bit inputs do not overflow.
pub fn estimate_trial_division_cost(bits: u32, ops_per_second: f64) -> CostEstimate {
    let half_bits = (bits / 2) as f64;
    let log10_operations = half_bits * std::f64::consts::LOG10_2;
    let log10_seconds = log10_operations - ops_per_second.log10();
    CostEstimate {
        bits,
        digits: crate::estimate_digits(bits),
        log10_operations,
        log10_seconds,
        human: humanize_log10_seconds(log10_seconds),
    }
}

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3_600.0;
const DAY: f64 = 86_400.0;
const YEAR: f64 = 31_536_000.0;
/// Roughly 10^100 years, a stand-in for "never".
const HEAT_DEATH_LOG10_YEARS: f64 = 100.0;

fn humanize_log10_seconds(log10_seconds: f64) -> String {
    let log10_years = log10_seconds - YEAR.log10();
    if log10_years >= HEAT_DEATH_LOG10_YEARS {
        return "heat death of the universe".to_string();
    }
    if log10_years >= 6.0 {
        return format!("{:.1e} years", 10f64.powf(log10_years));
    }
    let seconds = 10f64.powf(log10_seconds);
    if seconds < 1.0 {
        format!("{:.1} ms", seconds * 1_000.0)
    } else if seconds < MINUTE {
        format!("{:.1} sec", seconds)
    } else if seconds < HOUR {
        format!("{:.1} min", seconds / MINUTE)
    } else if seconds < DAY {
        format!("{:.1} hours", seconds / HOUR)
    } else if seconds < YEAR {
        format!("{:.1} days", seconds / DAY)
    } else {
        format!("{:.1} years", seconds / YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(bit_size: u32, elapsed_seconds: f64) -> ProfilePoint {
        ProfilePoint {
            bit_size,
            n: 0,
            elapsed_seconds,
        }
    }

    #[test]
    fn top_of_band_semiprimes_are_in_band_and_semiprime() {
        let oracle = PrimeOracle::new(0);
        let profiler = ComplexityProfiler::new(&oracle);
        for bits in 4..=40 {
            let n = profiler.top_of_band_semiprime(bits).unwrap();
            let (lo, hi) = bit_band(bits);
            assert!((lo..=hi).contains(&n), "{} not in {}-bit band", n, bits);
            assert_eq!(oracle.factor_complete(n).len(), 2, "{} is not a semiprime", n);
        }
    }

    #[test]
    fn top_of_band_known_values() {
        let oracle = PrimeOracle::new(0);
        let profiler = ComplexityProfiler::new(&oracle);
        // 4 bits: p = 3, q = largest prime ≤ 5
        assert_eq!(profiler.top_of_band_semiprime(4), Some(15));
        // 10 bits: p = 31, q = largest prime ≤ 33 = 31
        assert_eq!(profiler.top_of_band_semiprime(10), Some(961));
        assert_eq!(profiler.top_of_band_semiprime(3), None);
        assert_eq!(profiler.top_of_band_semiprime(64), None);
    }

    #[test]
    fn profile_preserves_order_and_skips_invalid_sizes() {
        let oracle = PrimeOracle::new(0);
        let profiler = ComplexityProfiler::new(&oracle).with_repetitions(1);
        let points = profiler.profile(&[12, 2, 8, 16]);
        let bits: Vec<_> = points.iter().map(|p| p.bit_size).collect();
        assert_eq!(bits, [12, 8, 16]);
        assert!(points.iter().all(|p| p.elapsed_seconds >= 0.0));
    }

    #[test]
    fn profile_grows_over_wide_range() {
        // 24 bits apart means ~4000× more divisions; noise cannot hide that
        let oracle = PrimeOracle::new(0);
        let profiler = ComplexityProfiler::new(&oracle).with_repetitions(3);
        let points = profiler.profile(&[16, 40]);
        assert_eq!(points.len(), 2);
        assert!(points[1].elapsed_seconds > points[0].elapsed_seconds);
    }

    #[test]
    fn fit_recovers_synthetic_slope() {
        let points: Vec<_> = (10..=30)
            .step_by(2)
            .map(|b| point(b, 1e-6 * 2f64.powf(b as f64 / 2.0)))
            .collect();
        let fit = fit_growth(&points).unwrap();
        assert!((fit.slope - 0.5).abs() < 1e-9, "slope {}", fit.slope);
        assert_eq!(fit.points, 11);
        assert!(fit.closest_reference().starts_with("trial division"));
    }

    #[test]
    fn fit_needs_two_usable_points() {
        assert!(fit_growth(&[]).is_none());
        assert!(fit_growth(&[point(10, 1.0)]).is_none());
        assert!(fit_growth(&[point(10, 0.0), point(12, 1.0)]).is_none());
        assert!(fit_growth(&[point(10, 1.0), point(10, 2.0)]).is_none());
    }

    #[test]
    fn non_decreasing_check() {
        assert!(is_non_decreasing(&[point(8, 1.0), point(10, 1.0), point(12, 3.0)]));
        assert!(!is_non_decreasing(&[point(8, 2.0), point(10, 1.0)]));
        // Order of input does not matter
        assert!(is_non_decreasing(&[point(12, 3.0), point(8, 1.0)]));
    }

    #[test]
    fn cost_estimates() {
        let small = estimate_trial_division_cost(40, DEFAULT_OPS_PER_SECOND);
        // 2^20 divisions at 1e9/s ≈ 1 ms
        assert_eq!(small.human, "1.0 ms");
        assert_eq!(small.digits, 13);

        let rsa = estimate_trial_division_cost(2048, DEFAULT_OPS_PER_SECOND);
        assert_eq!(rsa.human, "heat death of the universe");
        assert!(rsa.log10_operations > 300.0);

        let mid = estimate_trial_division_cost(160, DEFAULT_OPS_PER_SECOND);
        assert!(mid.human.ends_with("years"), "{}", mid.human);
    }
}
