//! # Main — CLI Entry Point
//!
//! Routes subcommands to the validation engine and the number-theory
//! utilities. Shared concerns live here: `.env` loading, structured logging,
//! and the rayon thread pool.
//!
//! ## Subcommands
//!
//! - `validate`: run a claim file and print (optionally save) the report.
//! - `profile`: time factorization across bit sizes and fit the growth slope.
//! - `factor`, `is-prime`, `sieve`: direct access to the oracle primitives.
//! - `patterns`: gap, twin, Goldbach and residue statistics, and the two
//!   prime predictors scored against them.
//! - `cost`: trial-division cost estimates for large moduli.
//!
//! ## Global Options
//!
//! - `--seed` / `PRIMEAUDIT_SEED`: RNG seed for corpora and randomized tests.
//! - `--mr-rounds` / `PRIMEAUDIT_MR_ROUNDS`: Miller–Rabin witness rounds.
//! - `--rho-attempts`: Pollard's rho retry budget per sample.
//! - `--threads`: Rayon thread pool size (defaults to all cores).
//!
//! Values given here override the `[settings]` table of a claim file.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "primeaudit",
    about = "Validate claimed prime-algorithm success rates against seeded semiprime corpora"
)]
struct Cli {
    /// RNG seed for corpus sampling and randomized primitives
    #[arg(long, global = true, env = "PRIMEAUDIT_SEED")]
    seed: Option<u64>,

    /// Miller-Rabin witness rounds (default 5)
    #[arg(long, global = true, env = "PRIMEAUDIT_MR_ROUNDS")]
    mr_rounds: Option<u32>,

    /// Pollard's rho attempts per sample before giving up (default 20)
    #[arg(long, global = true)]
    rho_attempts: Option<u32>,

    /// Number of rayon worker threads (defaults to all logical cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every claim in a TOML or JSON claim file
    Validate {
        /// Path to the claim file
        #[arg(long)]
        claims: PathBuf,
        /// Write the checksummed JSON report here
        #[arg(long)]
        output: Option<PathBuf>,
        /// Evaluate claims concurrently on the rayon pool
        #[arg(long)]
        parallel: bool,
        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Time complete factorization of top-of-band semiprimes
    Profile {
        /// Comma-separated bit sizes
        #[arg(long, value_delimiter = ',', default_values_t = [8u32, 12, 16, 20, 24, 28, 32])]
        bits: Vec<u32>,
        /// Timed runs per bit size; the fastest is kept
        #[arg(long, default_value_t = 3)]
        repetitions: usize,
    },
    /// Print the prime factorization of N
    Factor {
        n: u64,
    },
    /// Test N with trial division and Miller-Rabin
    IsPrime {
        n: u64,
    },
    /// Count (and optionally list) the primes up to a limit
    Sieve {
        #[arg(long)]
        limit: u64,
        /// Print every prime, one per line
        #[arg(long)]
        list: bool,
    },
    /// Gap, twin-prime, Goldbach and mod-6 statistics up to a limit, plus
    /// measured accuracy of the residue-class and gap-size predictors
    Patterns {
        #[arg(long, default_value_t = 10_000)]
        limit: u64,
    },
    /// Estimated trial-division time for balanced moduli of the given sizes
    Cost {
        /// Comma-separated modulus sizes in bits
        #[arg(long, value_delimiter = ',', default_values_t = [64u32, 128, 256, 512, 1024, 2048])]
        bits: Vec<u32>,
        /// Assumed trial divisions per second
        #[arg(long, default_value_t = primeaudit::profiler::DEFAULT_OPS_PER_SECOND)]
        ops_per_second: f64,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for log shippers, human-readable on stderr otherwise
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    cli::configure_rayon(cli.threads);

    match &cli.command {
        Commands::Validate {
            claims,
            output,
            parallel,
            json,
        } => cli::run_validate(&cli, claims, output.as_deref(), *parallel, *json),
        Commands::Profile { bits, repetitions } => cli::run_profile(bits, *repetitions),
        Commands::Factor { n } => cli::run_factor(*n),
        Commands::IsPrime { n } => cli::run_is_prime(&cli, *n),
        Commands::Sieve { limit, list } => cli::run_sieve(*limit, *list),
        Commands::Patterns { limit } => cli::run_patterns(&cli, *limit),
        Commands::Cost {
            bits,
            ops_per_second,
        } => cli::run_cost(bits, *ops_per_second),
    }
}
