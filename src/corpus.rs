//! # Corpus — Reproducible Semiprime Test Sets
//!
//! Builds bounded sets of semiprimes `n = p · q` inside a bit band
//! `[2^(b−1), 2^b − 1]` for the claim validator.
//!
//! Candidate primes are the primes in the oracle's cache whose square lies in
//! the band. Pairs are drawn uniformly with replacement from that set using a
//! caller-supplied RNG, so the same seed always produces the same corpus.
//!
//! ## Termination
//!
//! Sampling stops after `count` distinct semiprimes or `2 × count` draws,
//! whichever comes first. Narrow bands hold very few products (a 10-bit band
//! has three candidate primes and six distinct products), so a corpus may be
//! smaller than requested. When fewer than two candidates exist, or nothing
//! at all was accepted, the corpus carries [`CorpusError::Insufficient`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;

use crate::oracle::PrimeOracle;
use crate::sieve;

/// A product of two primes with its known factorization.
///
/// Invariants: `p <= q`, `p * q == n`, both prime, and `n` inside the band
/// the corpus was generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Semiprime {
    pub n: u64,
    pub p: u64,
    pub q: u64,
    pub bit_length: u32,
}

impl Semiprime {
    /// Build from two primes, ordering them so `p <= q`.
    pub fn new(a: u64, b: u64) -> Self {
        let (p, q) = if a <= b { (a, b) } else { (b, a) };
        let n = p * q;
        Semiprime {
            n,
            p,
            q,
            bit_length: crate::bit_length(n),
        }
    }
}

/// Why a corpus could not be filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusError {
    /// The band yields too few candidate primes or no semiprimes at all.
    Insufficient {
        bit_size: u32,
        candidates: usize,
        generated: usize,
        requested: usize,
    },
}

impl std::fmt::Display for CorpusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorpusError::Insufficient {
                bit_size,
                candidates,
                generated,
                requested,
            } => write!(
                f,
                "insufficient corpus for {}-bit semiprimes: {} candidate primes, {} of {} generated",
                bit_size, candidates, generated, requested
            ),
        }
    }
}

impl std::error::Error for CorpusError {}

/// Output of one generation run.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub bit_size: u32,
    pub requested: usize,
    /// Distinct semiprimes in the order they were accepted.
    pub semiprimes: Vec<Semiprime>,
    /// Set when the band cannot supply a usable corpus.
    pub shortfall: Option<CorpusError>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.semiprimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.semiprimes.is_empty()
    }

    pub fn is_insufficient(&self) -> bool {
        self.shortfall.is_some()
    }

    /// Non-empty but smaller than requested.
    pub fn is_partial(&self) -> bool {
        !self.is_empty() && self.len() < self.requested
    }
}

/// Inclusive value band `[2^(bits−1), 2^bits − 1]` for a bit size.
pub fn bit_band(bit_size: u32) -> (u64, u64) {
    let bit_size = bit_size.clamp(1, 64);
    let min_val = 1u64 << (bit_size - 1);
    let max_val = if bit_size == 64 {
        u64::MAX
    } else {
        (1u64 << bit_size) - 1
    };
    (min_val, max_val)
}

/// Draws semiprime corpora from a borrowed oracle's prime cache.
pub struct SemiprimeCorpusGenerator<'a> {
    oracle: &'a PrimeOracle,
}

impl<'a> SemiprimeCorpusGenerator<'a> {
    pub fn new(oracle: &'a PrimeOracle) -> Self {
        SemiprimeCorpusGenerator { oracle }
    }

    /// Cached primes p with p² inside the band for `bit_size`.
    ///
    /// The oracle's cache must already reach ⌊√(2^bit_size − 1)⌋
    /// (see [`PrimeOracle::ensure_bits`]); primes beyond the cache are not
    /// considered.
    pub fn candidates(&self, bit_size: u32) -> &'a [u64] {
        let (min_val, max_val) = bit_band(bit_size);
        let lo = sieve::isqrt(min_val - 1) + 1; // smallest p with p² >= min_val
        let hi = sieve::isqrt(max_val);
        self.oracle.cache().range(lo, hi)
    }

    /// Generate up to `count` distinct semiprimes of `bit_size` bits.
    pub fn generate<R: Rng + ?Sized>(&self, bit_size: u32, count: usize, rng: &mut R) -> Corpus {
        let (min_val, max_val) = bit_band(bit_size);
        let candidates = self.candidates(bit_size);

        let mut corpus = Corpus {
            bit_size,
            requested: count,
            semiprimes: Vec::new(),
            shortfall: None,
        };

        if candidates.len() < 2 {
            tracing::warn!(
                bit_size,
                candidates = candidates.len(),
                "too few candidate primes for semiprime band"
            );
            corpus.shortfall = Some(CorpusError::Insufficient {
                bit_size,
                candidates: candidates.len(),
                generated: 0,
                requested: count,
            });
            return corpus;
        }

        let budget = count.saturating_mul(2);
        let mut seen = HashSet::with_capacity(count);
        let mut attempts = 0usize;

        while corpus.semiprimes.len() < count && attempts < budget {
            attempts += 1;
            let (Some(&a), Some(&b)) = (candidates.choose(rng), candidates.choose(rng)) else {
                break;
            };
            let Some(n) = a.checked_mul(b) else {
                continue;
            };
            if n < min_val || n > max_val || !seen.insert(n) {
                continue;
            }
            corpus.semiprimes.push(Semiprime::new(a, b));
        }

        if corpus.is_empty() {
            corpus.shortfall = Some(CorpusError::Insufficient {
                bit_size,
                candidates: candidates.len(),
                generated: 0,
                requested: count,
            });
        } else if corpus.is_partial() {
            tracing::debug!(
                bit_size,
                generated = corpus.len(),
                requested = count,
                attempts,
                "attempt budget exhausted before corpus was full"
            );
        }
        corpus
    }
}
