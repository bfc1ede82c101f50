//! # CLI Execution Functions
//!
//! Kept out of `main.rs` so the entry point stays slim. One `run_*` function
//! per subcommand, plus rayon configuration. Results go to stdout; logs go
//! through `tracing` to stderr (or JSON).

use anyhow::{bail, Result};
use primeaudit::config::{self, Settings};
use primeaudit::oracle::PrimeOracle;
use primeaudit::profiler::{self, ComplexityProfiler};
use primeaudit::progress::Progress;
use primeaudit::{patterns, report, sieve, ClaimValidator, ValidationReport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::Cli;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(30);

/// Settings given on the command line or through `PRIMEAUDIT_*`.
fn cli_settings(cli: &Cli) -> Settings {
    Settings {
        seed: cli.seed,
        mr_rounds: cli.mr_rounds,
        rho_attempts: cli.rho_attempts,
    }
}

// ── Validation ──────────────────────────────────────────────────

pub fn run_validate(
    cli: &Cli,
    claims_path: &Path,
    output: Option<&Path>,
    parallel: bool,
    json: bool,
) -> Result<()> {
    let file = config::parse_file(claims_path)?;
    let settings = file.settings.overridden_by(cli_settings(cli));
    let claims = file.claims()?;
    let seed = settings.seed_or_default();
    let validator_settings = settings.validator_settings()?;

    info!(
        claims = claims.len(),
        seed,
        mr_rounds = validator_settings.mr_rounds,
        rho_attempts = validator_settings.rho_attempts,
        parallel,
        threads = rayon::current_num_threads(),
        "validation starting"
    );

    let progress = Progress::new();
    let reporter = progress.start_reporter(PROGRESS_INTERVAL);
    let mut validator = ClaimValidator::with_settings(PrimeOracle::new(0), validator_settings)
        .with_progress(Arc::clone(&progress));

    let outcome = if parallel {
        validator.validate_all_parallel(&claims, seed)
    } else {
        validator.validate_all(&claims, seed)
    };

    progress.stop();
    let _ = reporter.join();
    progress.print_status();
    outcome?;

    let report = ValidationReport::from_results(validator.results(), seed);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report::render_text(&report));
    }

    if let Some(path) = output {
        report::save(path, &report)?;
    }

    info!(
        validated = report.summary.validated,
        failed = report.summary.failed,
        insufficient = report.summary.insufficient,
        "validation complete"
    );
    Ok(())
}

// ── Profiling ───────────────────────────────────────────────────

pub fn run_profile(bits: &[u32], repetitions: usize) -> Result<()> {
    if bits.is_empty() {
        bail!("--bits needs at least one bit size");
    }
    if let Some(&b) = bits.iter().find(|&&b| !(4..=63).contains(&b)) {
        bail!("bit size {} is outside [4, 63]", b);
    }

    let oracle = PrimeOracle::new(0);
    let profiler = ComplexityProfiler::new(&oracle).with_repetitions(repetitions);
    let points = profiler.profile(bits);

    println!("{:>4}  {:>20}  {:>14}", "BITS", "N", "SECONDS");
    for p in &points {
        println!("{:>4}  {:>20}  {:>14.9}", p.bit_size, p.n, p.elapsed_seconds);
    }

    match profiler::fit_growth(&points) {
        Some(fit) => println!(
            "growth slope {:.3} log2(s)/bit over {} points, closest to {}",
            fit.slope,
            fit.points,
            fit.closest_reference()
        ),
        None => println!("not enough timed points to fit a growth slope"),
    }
    if !profiler::is_non_decreasing(&points) {
        warn!("elapsed time decreased with bit size; timings are noisy at this scale");
    }
    Ok(())
}

// ── Oracle Primitives ───────────────────────────────────────────

pub fn run_factor(n: u64) -> Result<()> {
    let oracle = PrimeOracle::new(0);
    let factors = oracle.factor_complete(n);
    if factors.is_empty() {
        println!("{} has no prime factors", n);
    } else {
        let parts: Vec<String> = factors.iter().map(|f| f.to_string()).collect();
        println!("{} = {}", n, parts.join(" × "));
    }
    Ok(())
}

pub fn run_is_prime(cli: &Cli, n: u64) -> Result<()> {
    let oracle = PrimeOracle::new(0);
    let settings = cli_settings(cli);
    let rounds = settings.validator_settings()?.mr_rounds;
    let seed = settings.seed_or_default();
    let mut rng = StdRng::seed_from_u64(seed);

    let trial = oracle.is_prime_trial(n);
    let mr = oracle.miller_rabin(n, rounds, &mut rng);
    if trial != mr {
        warn!(n, trial, miller_rabin = mr, rounds, "primality tests disagree");
    }

    println!("{} is {}", n, if trial { "prime" } else { "composite" });
    println!(
        "miller-rabin ({} rounds): {}",
        rounds,
        if mr { "probably prime" } else { "composite" }
    );
    Ok(())
}

pub fn run_sieve(limit: u64, list: bool) -> Result<()> {
    let primes = PrimeOracle::new(0).sieve(limit)?;
    println!("{} primes ≤ {}", primes.len(), limit);
    if list {
        for p in &primes {
            println!("{}", p);
        }
    }
    Ok(())
}

// ── Patterns and Cost ───────────────────────────────────────────

pub fn run_patterns(cli: &Cli, limit: u64) -> Result<()> {
    sieve::check_limit(limit)?;
    let gaps = patterns::prime_gaps(limit);
    let histogram = patterns::gap_histogram(&gaps);

    println!("Prime gaps up to {} ({} gaps)", limit, gaps.len());
    let mut common: Vec<_> = histogram.iter().collect();
    common.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (gap, count) in common.into_iter().take(10) {
        println!(
            "  gap {:>3}: {:>6} ({:>5.1}%)",
            gap,
            count,
            *count as f64 / gaps.len() as f64 * 100.0
        );
    }

    let primes = sieve::sieve(limit);
    let mut lo: u64 = 100;
    while lo < limit {
        let hi = lo.saturating_mul(10).min(limit);
        if let Some(avg) = patterns::average_gap(&primes, lo, hi) {
            println!("  average gap in [{}, {}]: {:.2}", lo, hi, avg);
        }
        lo = lo.saturating_mul(10);
    }

    let twins = patterns::twin_primes(limit);
    println!("Twin prime pairs up to {}: {}", limit, twins.len());

    println!("Primes mod 6:");
    for (residue, count) in patterns::residues_mod_6(limit) {
        println!("  {} mod 6: {}", residue, count);
    }

    println!("Goldbach partitions:");
    for n in [10u64, 20, 30, 50, 100] {
        let parts = patterns::goldbach_partitions(n);
        if let Some((p, q)) = parts.first() {
            println!("  {} = {} + {} ({} ways)", n, p, q, parts.len());
        }
    }

    let oracle = PrimeOracle::new(0);
    let accuracy = patterns::predictor_accuracy(&oracle, 100, 500);
    println!(
        "Residue-class predictor accuracy on [{}, {}): {:.1}% ({}/{})",
        accuracy.lo,
        accuracy.hi,
        accuracy.accuracy * 100.0,
        accuracy.correct,
        accuracy.total
    );

    let seed = cli_settings(cli).seed_or_default();
    let mut rng = StdRng::seed_from_u64(seed);
    let gap_hits = patterns::gap_predictor_accuracy(2, limit, &mut rng);
    println!(
        "Gap-size predictor exact hits on [{}, {}]: {:.1}% ({}/{})",
        gap_hits.lo,
        gap_hits.hi,
        gap_hits.accuracy * 100.0,
        gap_hits.correct,
        gap_hits.total
    );
    Ok(())
}

pub fn run_cost(bits: &[u32], ops_per_second: f64) -> Result<()> {
    if !(ops_per_second > 0.0) {
        bail!("--ops-per-second must be positive");
    }
    println!(
        "Trial division at {:.0e} divisions/s (2^(bits/2) divisions):",
        ops_per_second
    );
    println!("{:>6}  {:>7}  {:>12}  {}", "BITS", "DIGITS", "LOG10(OPS)", "TIME");
    for &b in bits {
        let est = profiler::estimate_trial_division_cost(b, ops_per_second);
        println!(
            "{:>6}  {:>7}  {:>12.1}  {}",
            est.bits, est.digits, est.log10_operations, est.human
        );
    }
    Ok(())
}

// ── Rayon Configuration ─────────────────────────────────────────

/// Size the global rayon pool. `None` or `0` keeps rayon's default of one
/// thread per logical core.
pub fn configure_rayon(threads: Option<usize>) {
    let num_threads = threads.unwrap_or(0);
    if num_threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
        {
            warn!(error = %e, "Could not configure rayon thread pool");
        }
    }
}
