//! # Validator — Statistical Verdicts on Claimed Success Rates
//!
//! Turns a [`Claim`] into a [`ValidationResult`]:
//!
//! 1. Generate a seeded semiprime corpus for the claim's bit size.
//! 2. Run the test function on every semiprime under a wall-clock timer.
//! 3. Count a sample as a success only if it returns `(p, q)` with
//!    `p · q = n` and both factors prime by trial division. Errors, panics,
//!    missing factors and wrong factors are all [`SampleFailure`]s; none of
//!    them stops the batch.
//! 4. Compare the measured rate against the claim:
//!    `VALIDATED` iff `|actual − expected| < 0.1`.
//!
//! The tolerance is a fixed absolute band, not a confidence interval. It is
//! a coarse sanity filter and is kept exactly as is for compatibility with
//! earlier reports.
//!
//! ## Results mapping
//!
//! Each validation writes one entry keyed by claim id. Entries stay in the
//! order their ids were first validated; re-validating an id replaces the
//! entry in place. Every path through `validate`, including an insufficient
//! corpus, writes a well-formed entry.
//!
//! ## Parallel runs
//!
//! `validate_all_parallel` pre-seeds the oracle's cache for the largest bit
//! size, then evaluates claims on the rayon pool against the shared
//! read-only oracle. Each claim gets its own `StdRng` derived from the run
//! seed and the claim's position, so sequential and parallel runs agree.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::claim::{Algorithm, Claim, ClaimError};
use crate::corpus::{bit_band, SemiprimeCorpusGenerator};
use crate::oracle::{PrimeOracle, DEFAULT_MR_ROUNDS, DEFAULT_RHO_ATTEMPTS};
use crate::progress::Progress;
use crate::sieve;

/// Absolute tolerance between expected and measured success rate.
pub const VERDICT_TOLERANCE: f64 = 0.1;

/// Outcome of comparing a measured rate with a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Validated,
    Failed,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Validated => write!(f, "VALIDATED"),
            Verdict::Failed => write!(f, "FAILED"),
        }
    }
}

/// Apply the fixed-tolerance verdict rule.
pub fn verdict_for(expected_rate: f64, actual_rate: f64) -> Verdict {
    if (actual_rate - expected_rate).abs() < VERDICT_TOLERANCE {
        Verdict::Validated
    } else {
        Verdict::Failed
    }
}

/// Why a single sample did not count as a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleFailure {
    /// The test function returned an error.
    Error(String),
    /// The test function panicked.
    Panicked(String),
    /// The test function returned no factor pair.
    NoFactors,
    /// The returned pair does not multiply to n or is not prime.
    InvalidFactors { p: u64, q: u64 },
}

impl std::fmt::Display for SampleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleFailure::Error(msg) => write!(f, "test function error: {}", msg),
            SampleFailure::Panicked(msg) => write!(f, "test function panicked: {}", msg),
            SampleFailure::NoFactors => write!(f, "no factors returned"),
            SampleFailure::InvalidFactors { p, q } => {
                write!(f, "invalid factorization {} x {}", p, q)
            }
        }
    }
}

impl std::error::Error for SampleFailure {}

/// One entry of the results mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub claim_id: String,
    pub title: String,
    pub algorithm: Algorithm,
    pub bit_size: u32,
    pub expected_rate: f64,
    pub actual_rate: f64,
    pub avg_time_seconds: f64,
    pub samples: usize,
    pub successes: usize,
    pub failures: usize,
    pub verdict: Verdict,
    /// The corpus could not be built; `actual_rate` is 0 and the verdict is
    /// FAILED regardless of the expected rate.
    pub insufficient_corpus: bool,
}

impl ValidationResult {
    fn insufficient(claim: &Claim) -> Self {
        ValidationResult {
            claim_id: claim.id().to_string(),
            title: claim.title().to_string(),
            algorithm: claim.algorithm(),
            bit_size: claim.bit_size(),
            expected_rate: claim.expected_rate(),
            actual_rate: 0.0,
            avg_time_seconds: 0.0,
            samples: 0,
            successes: 0,
            failures: 0,
            verdict: Verdict::Failed,
            insufficient_corpus: true,
        }
    }

    /// Same measurement, ignoring wall-clock timing.
    pub fn same_outcome(&self, other: &ValidationResult) -> bool {
        self.claim_id == other.claim_id
            && self.actual_rate == other.actual_rate
            && self.samples == other.samples
            && self.successes == other.successes
            && self.failures == other.failures
            && self.verdict == other.verdict
            && self.insufficient_corpus == other.insufficient_corpus
    }
}

/// Tunables for the built-in algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorSettings {
    pub mr_rounds: u32,
    pub rho_attempts: u32,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        ValidatorSettings {
            mr_rounds: DEFAULT_MR_ROUNDS,
            rho_attempts: DEFAULT_RHO_ATTEMPTS,
        }
    }
}

/// Derive the RNG seed for the claim at `index` in a batch.
pub fn claim_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Runs claims against corpora and keeps the results mapping.
pub struct ClaimValidator {
    oracle: PrimeOracle,
    settings: ValidatorSettings,
    results: Vec<ValidationResult>,
    progress: Option<Arc<Progress>>,
}

impl ClaimValidator {
    pub fn new(oracle: PrimeOracle) -> Self {
        Self::with_settings(oracle, ValidatorSettings::default())
    }

    pub fn with_settings(oracle: PrimeOracle, settings: ValidatorSettings) -> Self {
        ClaimValidator {
            oracle,
            settings,
            results: Vec::new(),
            progress: None,
        }
    }

    /// Attach shared progress counters updated per sample.
    pub fn with_progress(mut self, progress: Arc<Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn oracle(&self) -> &PrimeOracle {
        &self.oracle
    }

    pub fn settings(&self) -> ValidatorSettings {
        self.settings
    }

    /// Measure `test_fn` against a corpus for `claim` without recording.
    ///
    /// The oracle's cache must already cover the claim's bit size; `validate`
    /// and the batch entry points take care of that.
    pub fn evaluate<R, F>(&self, claim: &Claim, rng: &mut R, mut test_fn: F) -> ValidationResult
    where
        R: Rng + ?Sized,
        F: FnMut(u64) -> anyhow::Result<Option<(u64, u64)>>,
    {
        let (_, max_val) = bit_band(claim.bit_size());
        if self.oracle.cache().limit() < sieve::isqrt(max_val) {
            warn!(
                claim = claim.id(),
                cache_limit = self.oracle.cache().limit(),
                bit_size = claim.bit_size(),
                "prime cache does not cover the claim's bit size; corpus will be thin"
            );
        }

        if let Some(progress) = &self.progress {
            if let Ok(mut current) = progress.current.lock() {
                *current = claim.id().to_string();
            }
        }

        let generator = SemiprimeCorpusGenerator::new(&self.oracle);
        let corpus = generator.generate(claim.bit_size(), claim.sample_count(), rng);

        if let Some(shortfall) = &corpus.shortfall {
            warn!(claim = claim.id(), reason = %shortfall, "claim cannot be validated");
            if let Some(progress) = &self.progress {
                progress.claims.fetch_add(1, Ordering::Relaxed);
            }
            return ValidationResult::insufficient(claim);
        }
        if corpus.is_partial() {
            warn!(
                claim = claim.id(),
                generated = corpus.len(),
                requested = claim.sample_count(),
                "partial corpus; validating on the semiprimes available"
            );
        }

        let mut successes = 0usize;
        let mut failures = 0usize;
        let mut total_time = 0.0f64;

        for semiprime in &corpus.semiprimes {
            let n = semiprime.n;
            let start = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| test_fn(n)));
            total_time += start.elapsed().as_secs_f64();

            match self.check_sample(n, outcome) {
                Ok(()) => successes += 1,
                Err(failure) => {
                    debug!(claim = claim.id(), n, %failure, "sample failed");
                    failures += 1;
                }
            }

            if let Some(progress) = &self.progress {
                progress.samples.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Some(progress) = &self.progress {
            progress.successes.fetch_add(successes as u64, Ordering::Relaxed);
            progress.claims.fetch_add(1, Ordering::Relaxed);
        }

        let samples = successes + failures;
        let actual_rate = if samples > 0 {
            successes as f64 / samples as f64
        } else {
            0.0
        };
        let avg_time_seconds = if samples > 0 {
            total_time / samples as f64
        } else {
            0.0
        };
        let verdict = verdict_for(claim.expected_rate(), actual_rate);

        info!(
            claim = claim.id(),
            algorithm = %claim.algorithm(),
            bit_size = claim.bit_size(),
            samples,
            expected = format_args!("{:.3}", claim.expected_rate()),
            actual = format_args!("{:.3}", actual_rate),
            avg_time = format_args!("{:.6}s", avg_time_seconds),
            %verdict,
            "claim evaluated"
        );

        ValidationResult {
            claim_id: claim.id().to_string(),
            title: claim.title().to_string(),
            algorithm: claim.algorithm(),
            bit_size: claim.bit_size(),
            expected_rate: claim.expected_rate(),
            actual_rate,
            avg_time_seconds,
            samples,
            successes,
            failures,
            verdict,
            insufficient_corpus: false,
        }
    }

    fn check_sample(
        &self,
        n: u64,
        outcome: std::thread::Result<anyhow::Result<Option<(u64, u64)>>>,
    ) -> Result<(), SampleFailure> {
        match outcome {
            Err(payload) => Err(SampleFailure::Panicked(panic_message(payload.as_ref()))),
            Ok(Err(e)) => Err(SampleFailure::Error(format!("{:#}", e))),
            Ok(Ok(None)) => Err(SampleFailure::NoFactors),
            Ok(Ok(Some((p, q)))) => {
                if self.oracle.verify_pair(n, p, q) {
                    Ok(())
                } else {
                    Err(SampleFailure::InvalidFactors { p, q })
                }
            }
        }
    }

    /// Validate `claim` with a caller-supplied test function and record the
    /// result.
    pub fn validate<R, F>(&mut self, claim: &Claim, rng: &mut R, test_fn: F) -> ValidationResult
    where
        R: Rng + ?Sized,
        F: FnMut(u64) -> anyhow::Result<Option<(u64, u64)>>,
    {
        self.oracle.ensure_bits(claim.bit_size());
        let result = self.evaluate(claim, rng, test_fn);
        self.record(result.clone());
        result
    }

    /// Evaluate `claim` with its tagged built-in algorithm, without recording.
    ///
    /// Algorithm randomness comes from a separate stream seeded off `rng`
    /// before the corpus is drawn.
    pub fn evaluate_builtin<R: Rng + ?Sized>(
        &self,
        claim: &Claim,
        rng: &mut R,
    ) -> Result<ValidationResult, ClaimError> {
        let oracle = &self.oracle;
        let settings = self.settings;
        let mut algo_rng = StdRng::seed_from_u64(rng.gen());

        let result = match claim.algorithm() {
            Algorithm::TrialDivision => self.evaluate(claim, rng, |n| Ok(oracle.factor_pair(n))),
            Algorithm::PollardRho => self.evaluate(claim, rng, |n| {
                Ok(oracle
                    .pollard_rho_with_retries(n, settings.rho_attempts, &mut algo_rng)
                    .map(|d| (d, n / d)))
            }),
            Algorithm::MillerRabinFactorStub => self.evaluate(claim, rng, |n| {
                if oracle.miller_rabin(n, settings.mr_rounds, &mut algo_rng) {
                    anyhow::bail!("{} reported probably prime", n);
                }
                // Compositeness is established but no factor is ever produced.
                Ok(None)
            }),
            Algorithm::Custom => {
                return Err(ClaimError::MissingCustomAlgorithm {
                    id: claim.id().to_string(),
                })
            }
        };
        Ok(result)
    }

    /// Validate `claim` with its tagged built-in algorithm and record it.
    pub fn validate_builtin<R: Rng + ?Sized>(
        &mut self,
        claim: &Claim,
        rng: &mut R,
    ) -> Result<ValidationResult, ClaimError> {
        if claim.algorithm() == Algorithm::Custom {
            return Err(ClaimError::MissingCustomAlgorithm {
                id: claim.id().to_string(),
            });
        }
        self.oracle.ensure_bits(claim.bit_size());
        let result = self.evaluate_builtin(claim, rng)?;
        self.record(result.clone());
        Ok(result)
    }

    /// Validate a batch sequentially, one seeded stream per claim.
    pub fn validate_all(
        &mut self,
        claims: &[Claim],
        seed: u64,
    ) -> Result<Vec<ValidationResult>, ClaimError> {
        self.prepare_batch(claims)?;
        let mut results = Vec::with_capacity(claims.len());
        for (i, claim) in claims.iter().enumerate() {
            let mut rng = StdRng::seed_from_u64(claim_seed(seed, i));
            let result = self.evaluate_builtin(claim, &mut rng)?;
            self.record(result.clone());
            results.push(result);
        }
        Ok(results)
    }

    /// Validate a batch on the rayon pool. Results are recorded in input
    /// order and match `validate_all` for the same seed, timing aside.
    pub fn validate_all_parallel(
        &mut self,
        claims: &[Claim],
        seed: u64,
    ) -> Result<Vec<ValidationResult>, ClaimError> {
        self.prepare_batch(claims)?;
        let this = &*self;
        let results = claims
            .par_iter()
            .enumerate()
            .map(|(i, claim)| {
                let mut rng = StdRng::seed_from_u64(claim_seed(seed, i));
                this.evaluate_builtin(claim, &mut rng)
            })
            .collect::<Result<Vec<_>, _>>()?;
        for result in &results {
            self.record(result.clone());
        }
        Ok(results)
    }

    /// Reject CUSTOM claims and grow the cache once for the whole batch.
    fn prepare_batch(&mut self, claims: &[Claim]) -> Result<(), ClaimError> {
        if let Some(claim) = claims.iter().find(|c| c.algorithm() == Algorithm::Custom) {
            return Err(ClaimError::MissingCustomAlgorithm {
                id: claim.id().to_string(),
            });
        }
        if let Some(max_bits) = claims.iter().map(|c| c.bit_size()).max() {
            self.oracle.ensure_bits(max_bits);
        }
        Ok(())
    }

    /// Insert or overwrite the entry for `result.claim_id`.
    pub fn record(&mut self, result: ValidationResult) {
        match self
            .results
            .iter_mut()
            .find(|r| r.claim_id == result.claim_id)
        {
            Some(slot) => *slot = result,
            None => self.results.push(result),
        }
    }

    /// All recorded results in first-validation order.
    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn result(&self, claim_id: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.claim_id == claim_id)
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
