//! CLI integration tests using assert_cmd.
//!
//! Every test runs the real binary; nothing needs network or external tools.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn primeaudit() -> Command {
    let mut cmd = Command::cargo_bin("primeaudit").unwrap();
    cmd.env_remove("PRIMEAUDIT_SEED")
        .env_remove("PRIMEAUDIT_MR_ROUNDS")
        .env("RUST_LOG", "warn");
    cmd
}

fn default_claims() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("claims/default.toml")
}

// --- Help and arg validation ---

#[test]
fn help_shows_all_subcommands() {
    primeaudit().arg("--help").assert().success().stdout(
        predicate::str::contains("validate")
            .and(predicate::str::contains("profile"))
            .and(predicate::str::contains("factor"))
            .and(predicate::str::contains("is-prime"))
            .and(predicate::str::contains("sieve"))
            .and(predicate::str::contains("patterns"))
            .and(predicate::str::contains("cost")),
    );
}

#[test]
fn help_validate_shows_args() {
    primeaudit()
        .args(["validate", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--claims")
                .and(predicate::str::contains("--output"))
                .and(predicate::str::contains("--parallel"))
                .and(predicate::str::contains("--seed")),
        );
}

#[test]
fn validate_requires_claims() {
    primeaudit()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--claims"));
}

#[test]
fn factor_rejects_non_numeric() {
    primeaudit().args(["factor", "abc"]).assert().failure();
}

#[test]
fn unknown_subcommand_fails() {
    primeaudit().arg("quantum-factor").assert().failure();
}

// --- Primitives ---

#[test]
fn factor_prints_factorization() {
    primeaudit()
        .args(["factor", "8051"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8051 = 83 × 97"));
}

#[test]
fn factor_of_one_has_no_factors() {
    primeaudit()
        .args(["factor", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no prime factors"));
}

#[test]
fn is_prime_reports_both_tests() {
    primeaudit()
        .args(["is-prime", "97"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("97 is prime")
                .and(predicate::str::contains("probably prime")),
        );

    primeaudit()
        .args(["is-prime", "561", "--mr-rounds", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("561 is composite"));
}

#[test]
fn sieve_counts_and_lists() {
    primeaudit()
        .args(["sieve", "--limit", "30", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10 primes ≤ 30").and(predicate::str::contains("29")));
}

#[test]
fn patterns_prints_sections() {
    primeaudit()
        .args(["patterns", "--limit", "1000"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Twin prime pairs up to 1000: 35")
                .and(predicate::str::contains("10 = 3 + 7"))
                .and(predicate::str::contains("95.0%"))
                .and(predicate::str::contains("Gap-size predictor exact hits on [2, 1000]")),
        );
}

#[test]
fn oversized_sieve_limits_fail_cleanly() {
    primeaudit()
        .args(["sieve", "--limit", "18446744073709551615"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("exceeds the maximum"));

    primeaudit()
        .args(["patterns", "--limit", "18446744073709551615"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("exceeds the maximum"));
}

#[test]
fn zero_miller_rabin_rounds_rejected() {
    primeaudit()
        .args(["is-prime", "561", "--mr-rounds", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mr_rounds must be at least 1"));

    primeaudit()
        .env("PRIMEAUDIT_MR_ROUNDS", "0")
        .args(["validate", "--claims"])
        .arg(default_claims())
        .assert()
        .failure()
        .stderr(predicate::str::contains("mr_rounds must be at least 1"));
}

#[test]
fn zero_rho_attempts_rejected() {
    primeaudit()
        .args(["--rho-attempts", "0", "validate", "--claims"])
        .arg(default_claims())
        .assert()
        .failure()
        .stderr(predicate::str::contains("rho_attempts must be at least 1"));
}

#[test]
fn cost_reaches_heat_death() {
    primeaudit()
        .args(["cost", "--bits", "40,2048"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.0 ms").and(predicate::str::contains("heat death")));
}

#[test]
fn profile_small_sizes() {
    primeaudit()
        .args(["profile", "--bits", "8,12,16", "--repetitions", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BITS").and(predicate::str::contains("4087")));
}

#[test]
fn profile_rejects_oversized_bits() {
    primeaudit()
        .args(["profile", "--bits", "80"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside"));
}

// --- Validation ---

#[test]
fn validate_default_claims() {
    primeaudit()
        .args(["validate", "--claims"])
        .arg(default_claims())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("trial-division-16")
                .and(predicate::str::contains("VALIDATED"))
                .and(predicate::str::contains("FAILED"))
                .and(predicate::str::contains("INSUFFICIENT_CORPUS"))
                .and(predicate::str::contains("2 validated, 3 failed, 1 insufficient corpus")),
        );
}

#[test]
fn validate_writes_loadable_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("report.json");
    primeaudit()
        .args(["validate", "--parallel", "--json", "--claims"])
        .arg(default_claims())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"INSUFFICIENT_CORPUS\""));

    let report = primeaudit::report::load(&output).unwrap();
    assert_eq!(report.seed, 42);
    assert_eq!(report.claims.len(), 6);
    assert_eq!(report.summary.validated, 2);
}

#[test]
fn seed_flag_overrides_claim_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("report.json");
    primeaudit()
        .args(["validate", "--seed", "7", "--claims"])
        .arg(default_claims())
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    assert_eq!(primeaudit::report::load(&output).unwrap().seed, 7);
}

#[test]
fn seed_env_var_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("report.json");
    primeaudit()
        .env("PRIMEAUDIT_SEED", "1234")
        .args(["validate", "--claims"])
        .arg(default_claims())
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    assert_eq!(primeaudit::report::load(&output).unwrap().seed, 1234);
}

#[test]
fn invalid_claim_file_fails_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[[claims]]
id = "overclaimed"
expected_rate = 99.2
bit_size = 10
sample_count = 10
algorithm = "MILLER_RABIN_FACTOR_STUB"
"#,
    )
    .unwrap();
    primeaudit()
        .args(["validate", "--claims"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("overclaimed"));
}

#[test]
fn custom_claims_are_rejected_by_the_cli() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.json");
    std::fs::write(
        &path,
        r#"{"claims": [{"id": "mine", "expected_rate": 0.5, "bit_size": 12,
            "sample_count": 5, "algorithm": "CUSTOM"}]}"#,
    )
    .unwrap();
    primeaudit()
        .args(["validate", "--claims"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("CUSTOM"));
}
