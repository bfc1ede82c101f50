//! # Oracle — Ground-Truth Primality and Factorization
//!
//! `PrimeOracle` is the single source of truth every other component leans
//! on: the corpus generator draws candidate primes from its cache, the
//! validator checks returned factors with `is_prime_trial`, and the profiler
//! times `factor_complete`.
//!
//! ## Ownership
//!
//! The oracle owns one [`PrimeCache`]. The cache only grows, and growing it
//! takes `&mut PrimeOracle`; every query takes `&self`. A caller that wants to
//! share one oracle across worker threads therefore pre-seeds it to the
//! largest limit it will need and then hands out shared references. The
//! trial-division memo is the only interior state and sits behind a mutex.
//!
//! ## Randomness
//!
//! Miller-Rabin witnesses and Pollard's rho starting points come from a
//! caller-supplied `rand::Rng`, so seeded runs are reproducible.
//!
//! ## Algorithms
//!
//! | Operation | Method | Cost |
//! |-----------|--------|------|
//! | `is_prime_trial` | odd trial division to ⌊√n⌋, memoized | O(√n) |
//! | `miller_rabin` | k random-witness rounds | O(k log³ n), error ≤ 4^-k |
//! | `pollard_rho` | Floyd cycle detection on x² + c | expected O(n^¼) |
//! | `factor_complete` | small-prime fast path, then trial division | O(√n) |

use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::sieve;
use crate::SMALL_PRIMES;

/// Iteration cap for a single Pollard's rho attempt.
pub const RHO_MAX_ITERATIONS: u64 = 1_000_000;

/// Default number of Pollard's rho attempts before giving up.
pub const DEFAULT_RHO_ATTEMPTS: u32 = 20;

/// Default Miller-Rabin round count.
pub const DEFAULT_MR_ROUNDS: u32 = 5;

/// Ordered, gap-free list of every prime up to `limit`.
///
/// Built by sieving and extended only by re-sieving to a larger limit; it is
/// never edited element-wise and never shrinks.
#[derive(Debug, Clone, Default)]
pub struct PrimeCache {
    primes: Vec<u64>,
    limit: u64,
}

impl PrimeCache {
    /// Sieve all primes up to `limit`.
    pub fn new(limit: u64) -> Self {
        PrimeCache {
            primes: sieve::sieve(limit),
            limit,
        }
    }

    /// Grow the cache to cover `limit`. No-op when already covered.
    ///
    /// Returns true if the cache was re-sieved.
    pub fn extend_to(&mut self, limit: u64) -> bool {
        if limit <= self.limit {
            return false;
        }
        self.primes = sieve::sieve(limit);
        self.limit = limit;
        true
    }

    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    /// Membership by binary search. Only meaningful for `n <= limit`.
    pub fn contains(&self, n: u64) -> bool {
        self.primes.binary_search(&n).is_ok()
    }

    /// Primes in the inclusive range `[lo, hi]`.
    pub fn range(&self, lo: u64, hi: u64) -> &[u64] {
        let start = self.primes.partition_point(|&p| p < lo);
        let end = self.primes.partition_point(|&p| p <= hi);
        &self.primes[start..end.max(start)]
    }
}

/// Deterministic and probabilistic primality/factorization primitives.
#[derive(Debug, Default)]
pub struct PrimeOracle {
    cache: PrimeCache,
    memo: Mutex<HashMap<u64, bool>>,
}

impl Clone for PrimeOracle {
    fn clone(&self) -> Self {
        PrimeOracle {
            cache: self.cache.clone(),
            memo: Mutex::new(self.memo.lock().map(|m| m.clone()).unwrap_or_default()),
        }
    }
}

impl PrimeOracle {
    /// Create an oracle whose cache covers every prime up to `cache_limit`.
    pub fn new(cache_limit: u64) -> Self {
        PrimeOracle {
            cache: PrimeCache::new(cache_limit),
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &PrimeCache {
        &self.cache
    }

    /// Grow the prime cache to `limit` (single writer).
    pub fn extend_cache(&mut self, limit: u64) -> bool {
        let grew = self.cache.extend_to(limit);
        if grew {
            tracing::debug!(limit, primes = self.cache.len(), "prime cache extended");
        }
        grew
    }

    /// Grow the cache far enough to supply candidate primes for semiprimes
    /// of `bit_size` bits, i.e. up to ⌊√(2^bit_size − 1)⌋.
    pub fn ensure_bits(&mut self, bit_size: u32) -> bool {
        let max_val = if bit_size >= 64 {
            u64::MAX
        } else {
            (1u64 << bit_size) - 1
        };
        self.extend_cache(sieve::isqrt(max_val))
    }

    /// Number of memoized trial-division verdicts.
    pub fn memo_len(&self) -> usize {
        self.memo.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Sieve primes up to `limit` without touching the oracle's cache.
    /// Limits above [`sieve::MAX_SIEVE_LIMIT`] are refused.
    pub fn sieve(&self, limit: u64) -> Result<Vec<u64>, sieve::SieveLimitError> {
        if limit <= self.cache.limit() {
            return Ok(self.cache.range(0, limit).to_vec());
        }
        sieve::try_sieve(limit)
    }

    /// Deterministic primality by trial division up to ⌊√n⌋.
    ///
    /// Even numbers are rejected up front and only odd divisors are tried.
    /// Verdicts are memoized for the lifetime of the oracle.
    pub fn is_prime_trial(&self, n: u64) -> bool {
        if let Some(known) = self.memo.lock().ok().and_then(|m| m.get(&n).copied()) {
            return known;
        }

        let result = if n < 2 {
            false
        } else if n < 4 {
            true
        } else if n % 2 == 0 {
            false
        } else {
            let root = sieve::isqrt(n);
            let mut d = 3u64;
            let mut prime = true;
            while d <= root {
                if n % d == 0 {
                    prime = false;
                    break;
                }
                d += 2;
            }
            prime
        };

        if let Ok(mut memo) = self.memo.lock() {
            memo.insert(n, result);
        }
        result
    }

    /// Miller-Rabin probabilistic primality test with `k` random witnesses.
    ///
    /// Decomposes n − 1 = 2^r · d and, for each round, draws a base
    /// `a ∈ [2, n − 2]` from `rng`. A round passes if a^d ≡ ±1 or some
    /// a^(d·2^i) ≡ −1 for i < r. Any failing round proves n composite.
    /// Never rejects a prime; accepts a composite with probability ≤ 4^-k.
    pub fn miller_rabin<R: Rng + ?Sized>(&self, n: u64, k: u32, rng: &mut R) -> bool {
        if n < 2 {
            return false;
        }
        if n == 2 || n == 3 {
            return true;
        }
        if n % 2 == 0 {
            return false;
        }

        let mut d = n - 1;
        let mut r = 0u32;
        while d % 2 == 0 {
            d /= 2;
            r += 1;
        }

        'witness: for _ in 0..k {
            let a = rng.gen_range(2..=n - 2);
            let mut x = sieve::pow_mod(a, d, n);
            if x == 1 || x == n - 1 {
                continue;
            }
            for _ in 1..r {
                x = sieve::mul_mod(x, x, n);
                if x == n - 1 {
                    continue 'witness;
                }
            }
            return false;
        }
        true
    }

    /// One randomized Pollard's rho attempt (Floyd's tortoise and hare).
    ///
    /// Iterates x ← x² + c (mod n) from a random start, with the hare moving
    /// twice per step, and returns gcd(|x − y|, n) once it exceeds 1. Returns
    /// `None` when that gcd is n itself (the cycle closed without splitting)
    /// or after `RHO_MAX_ITERATIONS` steps. Even n short-circuits to 2.
    pub fn pollard_rho<R: Rng + ?Sized>(&self, n: u64, rng: &mut R) -> Option<u64> {
        if n < 4 {
            return None;
        }
        if n % 2 == 0 {
            return Some(2);
        }

        let step = |v: u64, c: u64| -> u64 {
            ((v as u128 * v as u128 + c as u128) % n as u128) as u64
        };

        let mut x = rng.gen_range(2..n);
        let mut y = x;
        let c = rng.gen_range(1..n);

        for _ in 0..RHO_MAX_ITERATIONS {
            x = step(x, c);
            y = step(step(y, c), c);
            let d = sieve::gcd(x.abs_diff(y), n);
            if d == 1 {
                continue;
            }
            return if d == n { None } else { Some(d) };
        }
        None
    }

    /// Pollard's rho with a retry budget; each attempt draws a fresh start
    /// and constant.
    pub fn pollard_rho_with_retries<R: Rng + ?Sized>(
        &self,
        n: u64,
        attempts: u32,
        rng: &mut R,
    ) -> Option<u64> {
        (0..attempts).find_map(|_| self.pollard_rho(n, rng))
    }

    /// Full prime factorization, ascending, with multiplicity.
    ///
    /// Divides out the fixed small-prime table first, then continues trial
    /// division with odd divisors from 37 up to √(remainder). Whatever is
    /// left above 1 is itself prime. The product of the result equals `n`.
    pub fn factor_complete(&self, n: u64) -> Vec<u64> {
        if n < 2 {
            return vec![];
        }

        let mut factors = Vec::new();
        let mut rest = n;

        for &p in &SMALL_PRIMES {
            while rest % p == 0 {
                factors.push(p);
                rest /= p;
            }
        }

        let mut d = 37u64;
        while d <= rest / d {
            while rest % d == 0 {
                factors.push(d);
                rest /= d;
            }
            d += 2;
        }

        if rest > 1 {
            factors.push(rest);
        }
        factors
    }

    /// Split `n` into `(p, n / p)` where p is the smallest divisor ≥ 2.
    ///
    /// Returns `None` for n < 4 and for primes, which have no such split.
    pub fn factor_pair(&self, n: u64) -> Option<(u64, u64)> {
        if n < 4 {
            return None;
        }
        if n % 2 == 0 {
            return Some((2, n / 2));
        }
        let root = sieve::isqrt(n);
        let mut d = 3u64;
        while d <= root {
            if n % d == 0 {
                return Some((d, n / d));
            }
            d += 2;
        }
        None
    }

    /// True if `(p, q)` is a valid prime factorization of `n`.
    pub fn verify_pair(&self, n: u64, p: u64, q: u64) -> bool {
        (p as u128) * (q as u128) == n as u128 && self.is_prime_trial(p) && self.is_prime_trial(q)
    }
}
