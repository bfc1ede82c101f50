//! # Sieve — Prime Generation and Modular Arithmetic Utilities
//!
//! Number-theoretic building blocks shared by the oracle, the corpus
//! generator and the profiler:
//!
//! 1. **Prime generation** via the sieve of Eratosthenes. Composites are
//!    struck starting at each prime's square, so the cost is
//!    O(limit · log log limit) time and O(limit) bytes of working buffer.
//! 2. **Modular arithmetic** (`mul_mod`, `pow_mod`) with u128 intermediates,
//!    exact for every u64 modulus.
//! 3. **Integer square root** and **gcd** helpers used by trial division and
//!    Pollard's rho.
//!
//! Everything here is pure: no hidden state survives a call beyond the
//! returned value.

use std::fmt;

/// Largest limit [`try_sieve`] accepts. The flag buffer alone is 4 GiB here;
/// the prime cache never needs more than ⌊√(2^63)⌋.
pub const MAX_SIEVE_LIMIT: u64 = 1 << 32;

/// A sieve limit whose flag buffer cannot be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SieveLimitError {
    pub limit: u64,
}

impl fmt::Display for SieveLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sieve limit {} exceeds the maximum of {}",
            self.limit, MAX_SIEVE_LIMIT
        )
    }
}

impl std::error::Error for SieveLimitError {}

pub fn check_limit(limit: u64) -> Result<(), SieveLimitError> {
    if limit > MAX_SIEVE_LIMIT || usize::try_from(limit).is_err() {
        return Err(SieveLimitError { limit });
    }
    Ok(())
}

/// [`sieve`] for limits that come from user input.
pub fn try_sieve(limit: u64) -> Result<Vec<u64>, SieveLimitError> {
    check_limit(limit)?;
    Ok(sieve(limit))
}

/// Generate all primes `<= limit` in ascending order.
///
/// Standard Eratosthenes elimination over a byte buffer of `limit + 1`
/// flags. Marking for prime `p` starts at `p * p`; smaller multiples were
/// already struck by a smaller prime factor. Callers holding an unchecked
/// limit go through [`try_sieve`].
pub fn sieve(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return vec![];
    }

    let limit = limit as usize;
    let mut composite = vec![false; limit + 1];
    let root = isqrt(limit as u64) as usize;

    for i in 2..=root {
        if composite[i] {
            continue;
        }
        let mut j = i * i;
        while j <= limit {
            composite[j] = true;
            j += i;
        }
    }

    let mut primes = Vec::with_capacity(estimate_prime_count(limit));
    primes.extend(
        composite
            .iter()
            .enumerate()
            .skip(2)
            .filter(|(_, &c)| !c)
            .map(|(n, _)| n as u64),
    );
    primes
}

/// Upper-leaning estimate of π(n) for pre-sizing the output vector.
fn estimate_prime_count(n: usize) -> usize {
    if n < 10 {
        return 4;
    }
    let nf = n as f64;
    (1.3 * nf / nf.ln()) as usize
}

/// Floor of the square root of `n`, exact for all u64.
pub fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    // f64 gets within one of the answer; fix up the rounding in both directions.
    let mut r = (n as f64).sqrt() as u64;
    while r.checked_mul(r).map_or(true, |sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).map_or(false, |sq| sq <= n) {
        r += 1;
    }
    r
}

/// Modular multiplication `a * b mod m` via a u128 intermediate.
#[inline]
pub fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

/// Modular exponentiation: base^exp mod modulus.
/// Uses u128 intermediates so every u64 modulus is exact.
pub fn pow_mod(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut result: u64 = 1;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, modulus);
        }
        exp >>= 1;
        base = mul_mod(base, base, modulus);
    }
    result
}

/// Greatest common divisor.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Sieve ───────────────────────────────────────────────────────

    #[test]
    fn sieve_thirty() {
        assert_eq!(sieve(30), vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
    }

    #[test]
    fn sieve_tiny_limits() {
        assert!(sieve(0).is_empty());
        assert!(sieve(1).is_empty());
        assert_eq!(sieve(2), vec![2]);
        assert_eq!(sieve(3), vec![2, 3]);
        assert_eq!(sieve(4), vec![2, 3]);
    }

    #[test]
    fn sieve_limit_is_inclusive() {
        assert_eq!(*sieve(97).last().unwrap(), 97);
        assert_eq!(*sieve(100).last().unwrap(), 97);
    }

    #[test]
    fn sieve_counts_match_pi() {
        // π(10^k) for k = 2..6
        assert_eq!(sieve(100).len(), 25);
        assert_eq!(sieve(1_000).len(), 168);
        assert_eq!(sieve(10_000).len(), 1_229);
        assert_eq!(sieve(100_000).len(), 9_592);
        assert_eq!(sieve(1_000_000).len(), 78_498);
    }

    #[test]
    fn sieve_is_strictly_ascending() {
        let primes = sieve(5_000);
        assert!(primes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn oversized_limits_are_rejected_not_allocated() {
        assert_eq!(
            try_sieve(u64::MAX),
            Err(SieveLimitError { limit: u64::MAX })
        );
        assert!(try_sieve(MAX_SIEVE_LIMIT + 1).is_err());
        assert!(check_limit(MAX_SIEVE_LIMIT).is_ok());
        assert_eq!(try_sieve(30).unwrap().len(), 10);
        let msg = SieveLimitError { limit: u64::MAX }.to_string();
        assert!(msg.contains("exceeds"), "{}", msg);
    }

    // ── Arithmetic Helpers ──────────────────────────────────────────

    #[test]
    fn isqrt_exact_around_squares() {
        for r in [1u64, 2, 3, 10, 255, 65_535, 4_294_967_295] {
            let sq = r * r;
            assert_eq!(isqrt(sq), r, "isqrt({})", sq);
            assert_eq!(isqrt(sq - 1), r - 1, "isqrt({})", sq - 1);
            assert_eq!(isqrt(sq + 1), r, "isqrt({})", sq + 1);
        }
        assert_eq!(isqrt(u64::MAX), 4_294_967_295);
    }

    #[test]
    fn pow_mod_known_values() {
        assert_eq!(pow_mod(2, 10, 1_000), 24);
        assert_eq!(pow_mod(3, 0, 7), 1);
        assert_eq!(pow_mod(5, 3, 1), 0);
        // Fermat: a^(p-1) ≡ 1 (mod p)
        assert_eq!(pow_mod(2, 1_000_000_006, 1_000_000_007), 1);
    }

    #[test]
    fn mul_mod_does_not_overflow() {
        let m = u64::MAX - 58; // largest prime below 2^64
        assert_eq!(mul_mod(m - 1, m - 1, m), 1);
    }

    #[test]
    fn gcd_basics() {
        assert_eq!(gcd(0, 7), 7);
        assert_eq!(gcd(7, 0), 7);
        assert_eq!(gcd(8051, 83), 83);
        assert_eq!(gcd(17, 19), 1);
    }
}
