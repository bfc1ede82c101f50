//! # Config — Claim Files
//!
//! Claims are kept in version-controlled files, TOML or JSON by extension:
//!
//! ```toml
//! [settings]
//! seed = 42
//! mr_rounds = 5
//! rho_attempts = 20
//!
//! [[claims]]
//! id = "td-16"
//! title = "Trial division always factors 16-bit semiprimes"
//! expected_rate = 1.0
//! bit_size = 16
//! sample_count = 50
//! algorithm = "TRIAL_DIVISION"
//! ```
//!
//! Every record is checked before any corpus is generated. Settings given on
//! the command line (or via `PRIMEAUDIT_*` env vars) override the file, which
//! overrides the built-in defaults.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::claim::{check_all, Claim, ClaimSpec};
use crate::validator::ValidatorSettings;

pub const DEFAULT_SEED: u64 = 42;

/// The optional `[settings]` table. Unset fields fall through to the next
/// layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub seed: Option<u64>,
    pub mr_rounds: Option<u32>,
    pub rho_attempts: Option<u32>,
}

impl Settings {
    /// Fields set in `overrides` win over fields set here.
    pub fn overridden_by(self, overrides: Settings) -> Settings {
        Settings {
            seed: overrides.seed.or(self.seed),
            mr_rounds: overrides.mr_rounds.or(self.mr_rounds),
            rho_attempts: overrides.rho_attempts.or(self.rho_attempts),
        }
    }

    pub fn seed_or_default(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Reject explicit zeros. Zero Miller-Rabin rounds calls every odd n
    /// probably prime; zero rho attempts never runs rho at all.
    pub fn check(&self) -> Result<()> {
        if self.mr_rounds == Some(0) {
            bail!("mr_rounds must be at least 1");
        }
        if self.rho_attempts == Some(0) {
            bail!("rho_attempts must be at least 1");
        }
        Ok(())
    }

    /// Resolve against the built-in defaults. Fails on settings that
    /// [`Settings::check`] rejects, wherever they came from.
    pub fn validator_settings(&self) -> Result<ValidatorSettings> {
        self.check()?;
        let defaults = ValidatorSettings::default();
        Ok(ValidatorSettings {
            mr_rounds: self.mr_rounds.unwrap_or(defaults.mr_rounds),
            rho_attempts: self.rho_attempts.unwrap_or(defaults.rho_attempts),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimFile {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub claims: Vec<ClaimSpec>,
}

impl ClaimFile {
    /// The checked claims, in file order.
    pub fn claims(&self) -> Result<Vec<Claim>> {
        Ok(check_all(self.claims.clone())?)
    }
}

pub fn parse_toml(content: &str) -> Result<ClaimFile> {
    let file: ClaimFile = toml::from_str(content)?;
    validate_file(&file)?;
    Ok(file)
}

pub fn parse_json(content: &str) -> Result<ClaimFile> {
    let file: ClaimFile = serde_json::from_str(content)?;
    validate_file(&file)?;
    Ok(file)
}

/// Parse a claim file, picking the format from the extension.
pub fn parse_file(path: &Path) -> Result<ClaimFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading claim file {}", path.display()))?;
    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_toml(&content),
        Some("json") => parse_json(&content),
        other => bail!(
            "unsupported claim file extension {:?} for {} (expected .toml or .json)",
            other.unwrap_or(""),
            path.display()
        ),
    };
    parsed.with_context(|| format!("invalid claim file {}", path.display()))
}

fn validate_file(file: &ClaimFile) -> Result<()> {
    if file.claims.is_empty() {
        bail!("claim file defines no [[claims]]");
    }
    file.settings.check().context("invalid [settings]")?;
    check_all(file.claims.clone())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{Algorithm, ClaimError};

    const SAMPLE: &str = r#"
[settings]
seed = 7
rho_attempts = 10

[[claims]]
id = "td-16"
title = "trial division"
expected_rate = 1.0
bit_size = 16
sample_count = 50
algorithm = "TRIAL_DIVISION"

[[claims]]
id = "stub-10"
expected_rate = 0.992
bit_size = 10
sample_count = 100
algorithm = "MILLER_RABIN_FACTOR_STUB"
"#;

    #[test]
    fn parses_toml_claims_and_settings() {
        let file = parse_toml(SAMPLE).unwrap();
        assert_eq!(file.settings.seed, Some(7));
        assert_eq!(file.settings.mr_rounds, None);
        let claims = file.claims().unwrap();
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[1].algorithm(), Algorithm::MillerRabinFactorStub);
        assert_eq!(claims[1].title(), "");
    }

    #[test]
    fn parses_json_claims() {
        let json = r#"{"claims": [{"id": "rho", "expected_rate": 0.9, "bit_size": 20,
            "sample_count": 5, "algorithm": "POLLARD_RHO"}]}"#;
        let file = parse_json(json).unwrap();
        assert_eq!(file.settings, Settings::default());
        assert_eq!(file.claims[0].algorithm, Algorithm::PollardRho);
    }

    #[test]
    fn invalid_claim_is_rejected_with_its_id() {
        let bad = SAMPLE.replace("expected_rate = 0.992", "expected_rate = 99.2");
        let err = parse_toml(&bad).unwrap_err();
        let claim_err = err.downcast_ref::<ClaimError>().unwrap();
        assert!(matches!(
            claim_err,
            ClaimError::ExpectedRateOutOfRange { id, .. } if id == "stub-10"
        ));
    }

    #[test]
    fn unknown_algorithm_and_empty_files_are_rejected() {
        let bad = SAMPLE.replace("\"TRIAL_DIVISION\"", "\"QUANTUM_HYBRID\"");
        assert!(parse_toml(&bad).is_err());
        assert!(parse_toml("[settings]\nseed = 1\n").is_err());
        let zero = SAMPLE.replace("rho_attempts = 10", "rho_attempts = 0");
        assert!(parse_toml(&zero).is_err());
    }

    #[test]
    fn overrides_take_precedence() {
        let file = Settings {
            seed: Some(7),
            mr_rounds: Some(3),
            rho_attempts: None,
        };
        let cli = Settings {
            seed: Some(99),
            mr_rounds: None,
            rho_attempts: None,
        };
        let merged = file.overridden_by(cli);
        assert_eq!(merged.seed_or_default(), 99);
        let vs = merged.validator_settings().unwrap();
        assert_eq!(vs.mr_rounds, 3);
        assert_eq!(vs.rho_attempts, ValidatorSettings::default().rho_attempts);
        assert_eq!(Settings::default().seed_or_default(), DEFAULT_SEED);
    }

    #[test]
    fn zero_rounds_rejected_after_merge() {
        let file = Settings {
            seed: None,
            mr_rounds: Some(5),
            rho_attempts: Some(20),
        };
        let cli = Settings {
            seed: None,
            mr_rounds: Some(0),
            rho_attempts: None,
        };
        let err = file.overridden_by(cli).validator_settings().unwrap_err();
        assert!(err.to_string().contains("mr_rounds"), "{}", err);

        let cli = Settings {
            rho_attempts: Some(0),
            ..Settings::default()
        };
        let err = file.overridden_by(cli).validator_settings().unwrap_err();
        assert!(err.to_string().contains("rho_attempts"), "{}", err);

        assert!(Settings::default().validator_settings().is_ok());
    }

    #[test]
    fn parse_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("claims.toml");
        std::fs::write(&toml_path, SAMPLE).unwrap();
        assert_eq!(parse_file(&toml_path).unwrap().claims.len(), 2);

        let yaml_path = dir.path().join("claims.yaml");
        std::fs::write(&yaml_path, SAMPLE).unwrap();
        assert!(parse_file(&yaml_path).is_err());
    }

    #[test]
    fn shipped_claim_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("claims/default.toml");
        let file = parse_file(&path).unwrap();
        assert!(file.claims().unwrap().len() >= 4);
    }
}
