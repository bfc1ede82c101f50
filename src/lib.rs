pub mod claim;
pub mod config;
pub mod corpus;
pub mod oracle;
pub mod patterns;
pub mod profiler;
pub mod progress;
pub mod report;
pub mod sieve;
pub mod validator;

pub use claim::{Algorithm, Claim, ClaimError, ClaimSpec};
pub use corpus::{Corpus, CorpusError, Semiprime, SemiprimeCorpusGenerator};
pub use oracle::{PrimeCache, PrimeOracle};
pub use profiler::{ComplexityProfiler, ProfilePoint};
pub use report::{ReportStatus, ValidationReport};
pub use validator::{ClaimValidator, SampleFailure, ValidationResult, Verdict};

/// Small primes divided out before general trial division in
/// `PrimeOracle::factor_complete`.
pub const SMALL_PRIMES: [u64; 11] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31];

/// Smallest claim bit size the corpus generator accepts.
pub const MIN_BIT_SIZE: u32 = 4;

/// Largest claim bit size. Candidate primes come from a cache sieved to
/// 2^(bit_size/2), which stays at a few megabytes up to here.
pub const MAX_BIT_SIZE: u32 = 48;

/// Estimate decimal digit count from bit length.
pub fn estimate_digits(bits: u32) -> u64 {
    if bits == 0 {
        return 1;
    }
    (bits as f64 * std::f64::consts::LOG10_2) as u64 + 1
}

/// Number of significant bits in `n` (0 for 0).
pub fn bit_length(n: u64) -> u32 {
    u64::BITS - n.leading_zeros()
}
