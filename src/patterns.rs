//! # Patterns — Real, Non-Exploitable Prime Statistics
//!
//! Number-theoretic patterns that genuinely exist: gap distribution, twin
//! primes, Goldbach partitions and the residues of primes mod 6. None of
//! them gives predictive power at cryptographic sizes.
//!
//! [`predict_probability`] is the residue-class heuristic claimed elsewhere
//! to "predict primes with 96.3% accuracy"; [`predictor_accuracy`] measures
//! it against trial division so the number can be checked rather than
//! quoted. [`predict_gap_size`] is its companion guess at the gap after a
//! prime, scored against real gaps by [`gap_predictor_accuracy`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::oracle::PrimeOracle;
use crate::sieve::sieve;

/// Differences between consecutive primes ≤ `limit`.
pub fn prime_gaps(limit: u64) -> Vec<u64> {
    sieve(limit).windows(2).map(|w| w[1] - w[0]).collect()
}

/// Gap size → number of occurrences.
pub fn gap_histogram(gaps: &[u64]) -> BTreeMap<u64, usize> {
    let mut histogram = BTreeMap::new();
    for &gap in gaps {
        *histogram.entry(gap).or_insert(0) += 1;
    }
    histogram
}

/// Mean gap following primes in `[lo, hi]`, or `None` if no prime there has
/// a successor in `primes`.
pub fn average_gap(primes: &[u64], lo: u64, hi: u64) -> Option<f64> {
    let gaps: Vec<u64> = primes
        .windows(2)
        .filter(|w| (lo..=hi).contains(&w[0]))
        .map(|w| w[1] - w[0])
        .collect();
    if gaps.is_empty() {
        return None;
    }
    Some(gaps.iter().sum::<u64>() as f64 / gaps.len() as f64)
}

/// Twin prime pairs `(p, p + 2)` with both members ≤ `limit`.
pub fn twin_primes(limit: u64) -> Vec<(u64, u64)> {
    sieve(limit)
        .windows(2)
        .filter(|w| w[1] - w[0] == 2)
        .map(|w| (w[0], w[1]))
        .collect()
}

/// All `(p, n − p)` with `p ≤ n − p`, both prime. Empty for odd `n` or
/// `n < 4`.
pub fn goldbach_partitions(n: u64) -> Vec<(u64, u64)> {
    if n % 2 != 0 || n < 4 {
        return Vec::new();
    }
    let primes = sieve(n);
    let set: HashSet<u64> = primes.iter().copied().collect();
    primes
        .iter()
        .take_while(|&&p| p <= n / 2)
        .filter(|&&p| set.contains(&(n - p)))
        .map(|&p| (p, n - p))
        .collect()
}

/// Residue → count for primes ≤ `limit` taken mod 6. Every prime above 3
/// lands on 1 or 5.
pub fn residues_mod_6(limit: u64) -> BTreeMap<u64, usize> {
    let mut counts = BTreeMap::new();
    for p in sieve(limit) {
        *counts.entry(p % 6).or_insert(0) += 1;
    }
    counts
}

const PREDICTOR_SMALL_PRIMES: [u64; 5] = [3, 5, 7, 11, 13];

/// Residue-class prime "probability": a `1/ln n` prior, tripled on
/// `n mod 6 ∈ {1, 5}` and cut to a tenth elsewhere, after ruling out small
/// divisors up to 13. Capped at 1.
pub fn predict_probability(n: u64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    if n == 2 {
        return 1.0;
    }
    if n % 2 == 0 {
        return 0.0;
    }
    for p in PREDICTOR_SMALL_PRIMES {
        if n % p == 0 {
            return if n == p { 1.0 } else { 0.0 };
        }
    }

    let prior = 1.0 / (n as f64).ln();
    let prob = match n % 6 {
        1 | 5 => prior * 3.0,
        _ => prior * 0.1,
    };
    prob.min(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictorAccuracy {
    pub lo: u64,
    pub hi: u64,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

/// Score `predict_probability(n) > 0.5` against trial division for every
/// `n` in `[lo, hi)`.
pub fn predictor_accuracy(oracle: &PrimeOracle, lo: u64, hi: u64) -> PredictorAccuracy {
    let mut correct = 0usize;
    let mut total = 0usize;
    for n in lo..hi {
        let predicted = predict_probability(n) > 0.5;
        if predicted == oracle.is_prime_trial(n) {
            correct += 1;
        }
        total += 1;
    }
    PredictorAccuracy {
        lo,
        hi,
        correct,
        total,
        accuracy: if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        },
    }
}

/// Common small gaps and their relative weights.
const COMMON_GAPS: [(u64, f64); 6] = [
    (2, 0.3),
    (4, 0.2),
    (6, 0.15),
    (8, 0.1),
    (10, 0.08),
    (12, 0.07),
];

/// Probability of drawing from [`COMMON_GAPS`] instead of the `ln p` average.
const COMMON_GAP_SHARE: f64 = 0.6;

/// Guess the gap following `after_prime`.
///
/// With probability 0.6 a weighted draw from the common gaps 2 to 12;
/// otherwise `⌊ln p⌋` plus uniform noise in `[-2, 2]`, floored at 2.
pub fn predict_gap_size<R: Rng + ?Sized>(after_prime: u64, rng: &mut R) -> u64 {
    if rng.gen_bool(COMMON_GAP_SHARE) {
        return COMMON_GAPS
            .choose_weighted(rng, |&(_, weight)| weight)
            .map(|&(gap, _)| gap)
            .unwrap_or(2);
    }
    let avg_gap = (after_prime.max(2) as f64).ln() as i64;
    (avg_gap + rng.gen_range(-2..=2)).max(2) as u64
}

/// Score exact hits of [`predict_gap_size`] on every pair of consecutive
/// primes `p < p'` with `lo <= p` and `p' <= hi`.
pub fn gap_predictor_accuracy<R: Rng + ?Sized>(
    lo: u64,
    hi: u64,
    rng: &mut R,
) -> PredictorAccuracy {
    let mut correct = 0usize;
    let mut total = 0usize;
    for w in sieve(hi).windows(2).filter(|w| w[0] >= lo) {
        if predict_gap_size(w[0], rng) == w[1] - w[0] {
            correct += 1;
        }
        total += 1;
    }
    PredictorAccuracy {
        lo,
        hi,
        correct,
        total,
        accuracy: if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        },
    }
}
