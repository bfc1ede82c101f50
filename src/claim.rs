//! # Claim — Externally Supplied Performance Assertions
//!
//! A [`Claim`] states that some algorithm factors `bit_size`-bit semiprimes
//! with a given success rate. Claims arrive as loosely typed [`ClaimSpec`]
//! records (from a TOML/JSON claim file or a caller) and are checked into an
//! immutable `Claim` before any corpus is generated. The algorithm under
//! test is an explicit tag chosen by whoever builds the claim; nothing is
//! inferred from the claim's free-text title.

use serde::{Deserialize, Serialize};

use crate::{MAX_BIT_SIZE, MIN_BIT_SIZE};

/// Which factoring routine a claim is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    /// Smallest-divisor trial division. Always succeeds on semiprimes.
    TrialDivision,
    /// Miller-Rabin compositeness check that never produces factors. Stands
    /// in for claimed "breakthrough" methods that have no working factoring
    /// step behind them.
    MillerRabinFactorStub,
    /// Pollard's rho with a bounded retry budget.
    PollardRho,
    /// Caller-supplied test function.
    Custom,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::TrialDivision => write!(f, "TRIAL_DIVISION"),
            Algorithm::MillerRabinFactorStub => write!(f, "MILLER_RABIN_FACTOR_STUB"),
            Algorithm::PollardRho => write!(f, "POLLARD_RHO"),
            Algorithm::Custom => write!(f, "CUSTOM"),
        }
    }
}

/// Configuration errors, reported before any work starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimError {
    EmptyId,
    ExpectedRateOutOfRange { id: String, rate: f64 },
    BitSizeOutOfRange { id: String, bit_size: u32 },
    ZeroSampleCount { id: String },
    DuplicateId { id: String },
    /// A CUSTOM claim was run without a test function.
    MissingCustomAlgorithm { id: String },
}

impl std::fmt::Display for ClaimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimError::EmptyId => write!(f, "claim id must not be empty"),
            ClaimError::ExpectedRateOutOfRange { id, rate } => {
                write!(f, "claim '{}': expected_rate {} is outside [0, 1]", id, rate)
            }
            ClaimError::BitSizeOutOfRange { id, bit_size } => write!(
                f,
                "claim '{}': bit_size {} is outside [{}, {}]",
                id, bit_size, MIN_BIT_SIZE, MAX_BIT_SIZE
            ),
            ClaimError::ZeroSampleCount { id } => {
                write!(f, "claim '{}': sample_count must be at least 1", id)
            }
            ClaimError::DuplicateId { id } => write!(f, "duplicate claim id '{}'", id),
            ClaimError::MissingCustomAlgorithm { id } => write!(
                f,
                "claim '{}' uses the CUSTOM algorithm but no test function was supplied",
                id
            ),
        }
    }
}

impl std::error::Error for ClaimError {}

/// Unchecked claim record as it appears in claim files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSpec {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub expected_rate: f64,
    pub bit_size: u32,
    pub sample_count: usize,
    pub algorithm: Algorithm,
}

impl ClaimSpec {
    /// Check the record and turn it into an immutable [`Claim`].
    pub fn into_claim(self) -> Result<Claim, ClaimError> {
        Claim::new(
            self.id,
            self.title,
            self.algorithm,
            self.expected_rate,
            self.bit_size,
            self.sample_count,
        )
    }
}

/// A checked, immutable claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Claim {
    id: String,
    title: String,
    algorithm: Algorithm,
    expected_rate: f64,
    bit_size: u32,
    sample_count: usize,
}

impl Claim {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        algorithm: Algorithm,
        expected_rate: f64,
        bit_size: u32,
        sample_count: usize,
    ) -> Result<Self, ClaimError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ClaimError::EmptyId);
        }
        // NaN fails the range check too
        if !(0.0..=1.0).contains(&expected_rate) {
            return Err(ClaimError::ExpectedRateOutOfRange {
                id,
                rate: expected_rate,
            });
        }
        if !(MIN_BIT_SIZE..=MAX_BIT_SIZE).contains(&bit_size) {
            return Err(ClaimError::BitSizeOutOfRange { id, bit_size });
        }
        if sample_count == 0 {
            return Err(ClaimError::ZeroSampleCount { id });
        }
        Ok(Claim {
            id,
            title: title.into(),
            algorithm,
            expected_rate,
            bit_size,
            sample_count,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn expected_rate(&self) -> f64 {
        self.expected_rate
    }

    pub fn bit_size(&self) -> u32 {
        self.bit_size
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }
}

/// Check a batch of specs, rejecting duplicate ids. Fails on the first bad
/// record so nothing runs against a half-valid claim set.
pub fn check_all(specs: Vec<ClaimSpec>) -> Result<Vec<Claim>, ClaimError> {
    let mut seen = std::collections::HashSet::new();
    let mut claims = Vec::with_capacity(specs.len());
    for spec in specs {
        if !seen.insert(spec.id.clone()) {
            return Err(ClaimError::DuplicateId { id: spec.id });
        }
        claims.push(spec.into_claim()?);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str) -> ClaimSpec {
        ClaimSpec {
            id: id.to_string(),
            title: "trial division on 10-bit semiprimes".to_string(),
            expected_rate: 1.0,
            bit_size: 10,
            sample_count: 20,
            algorithm: Algorithm::TrialDivision,
        }
    }

    #[test]
    fn valid_spec_becomes_claim() {
        let claim = spec("td-10").into_claim().unwrap();
        assert_eq!(claim.id(), "td-10");
        assert_eq!(claim.algorithm(), Algorithm::TrialDivision);
        assert_eq!(claim.bit_size(), 10);
        assert_eq!(claim.sample_count(), 20);
        assert_eq!(claim.expected_rate(), 1.0);
    }

    #[test]
    fn rate_bounds_are_inclusive() {
        assert!(Claim::new("a", "", Algorithm::TrialDivision, 0.0, 10, 1).is_ok());
        assert!(Claim::new("a", "", Algorithm::TrialDivision, 1.0, 10, 1).is_ok());
    }

    #[test]
    fn rejects_rate_outside_unit_interval() {
        for rate in [-0.01, 1.01, f64::NAN, f64::INFINITY] {
            let err = Claim::new("r", "", Algorithm::TrialDivision, rate, 10, 1).unwrap_err();
            assert!(matches!(err, ClaimError::ExpectedRateOutOfRange { .. }), "{}", rate);
        }
    }

    #[test]
    fn rejects_bad_bit_size_and_sample_count() {
        assert!(matches!(
            Claim::new("b", "", Algorithm::PollardRho, 0.5, 3, 1),
            Err(ClaimError::BitSizeOutOfRange { bit_size: 3, .. })
        ));
        assert!(matches!(
            Claim::new("b", "", Algorithm::PollardRho, 0.5, MAX_BIT_SIZE + 1, 1),
            Err(ClaimError::BitSizeOutOfRange { .. })
        ));
        assert!(matches!(
            Claim::new("s", "", Algorithm::PollardRho, 0.5, 10, 0),
            Err(ClaimError::ZeroSampleCount { .. })
        ));
        assert_eq!(
            Claim::new("  ", "", Algorithm::PollardRho, 0.5, 10, 1),
            Err(ClaimError::EmptyId)
        );
    }

    #[test]
    fn check_all_rejects_duplicates() {
        let err = check_all(vec![spec("x"), spec("y"), spec("x")]).unwrap_err();
        assert_eq!(err, ClaimError::DuplicateId { id: "x".into() });
    }

    #[test]
    fn check_all_preserves_order() {
        let claims = check_all(vec![spec("b"), spec("a"), spec("c")]).unwrap();
        let ids: Vec<_> = claims.iter().map(|c| c.id()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn algorithm_serde_names() {
        let json = serde_json::to_string(&Algorithm::MillerRabinFactorStub).unwrap();
        assert_eq!(json, "\"MILLER_RABIN_FACTOR_STUB\"");
        let parsed: Algorithm = serde_json::from_str("\"POLLARD_RHO\"").unwrap();
        assert_eq!(parsed, Algorithm::PollardRho);
        assert_eq!(Algorithm::TrialDivision.to_string(), "TRIAL_DIVISION");
    }

    #[test]
    fn error_messages_name_the_claim() {
        let err = Claim::new("q-99", "", Algorithm::Custom, 2.0, 10, 1).unwrap_err();
        assert!(err.to_string().contains("q-99"));
        assert!(err.to_string().contains("expected_rate"));
    }
}
