//! # Report — Validation Report Persistence
//!
//! Turns recorded [`ValidationResult`]s into the document handed to external
//! renderers, and saves/loads it as JSON on disk.
//!
//! ## Atomic Writes
//!
//! Reports are written to a `.tmp` sibling and renamed into place, so a
//! reader never sees a half-written file.
//!
//! ## Integrity
//!
//! The report is wrapped in an envelope `{checksum, data}` where `checksum`
//! is the SHA-256 of the pretty-printed `data`. `load` recomputes it and
//! refuses files whose contents were altered after writing.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::claim::Algorithm;
use crate::validator::{ValidationResult, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Validated,
    Failed,
    InsufficientCorpus,
}

impl ReportStatus {
    fn from_result(result: &ValidationResult) -> Self {
        if result.insufficient_corpus {
            ReportStatus::InsufficientCorpus
        } else {
            match result.verdict {
                Verdict::Validated => ReportStatus::Validated,
                Verdict::Failed => ReportStatus::Failed,
            }
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Validated => write!(f, "VALIDATED"),
            ReportStatus::Failed => write!(f, "FAILED"),
            ReportStatus::InsufficientCorpus => write!(f, "INSUFFICIENT_CORPUS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimReport {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub algorithm: Algorithm,
    pub bit_size: u32,
    pub status: ReportStatus,
    pub expected_rate: f64,
    pub actual_rate: f64,
    pub avg_time_seconds: f64,
    pub samples: usize,
    pub successes: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub validated: usize,
    pub failed: usize,
    pub insufficient: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub claims: Vec<ClaimReport>,
    pub summary: Summary,
}

impl ValidationReport {
    /// Build a report from results in their recorded order.
    pub fn from_results(results: &[ValidationResult], seed: u64) -> Self {
        let mut summary = Summary::default();
        let claims = results
            .iter()
            .map(|r| {
                let status = ReportStatus::from_result(r);
                match status {
                    ReportStatus::Validated => summary.validated += 1,
                    ReportStatus::Failed => summary.failed += 1,
                    ReportStatus::InsufficientCorpus => summary.insufficient += 1,
                }
                ClaimReport {
                    id: r.claim_id.clone(),
                    title: r.title.clone(),
                    algorithm: r.algorithm,
                    bit_size: r.bit_size,
                    status,
                    expected_rate: r.expected_rate,
                    actual_rate: r.actual_rate,
                    avg_time_seconds: r.avg_time_seconds,
                    samples: r.samples,
                    successes: r.successes,
                }
            })
            .collect();
        ValidationReport {
            generated_at: Utc::now(),
            seed,
            claims,
            summary,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ReportEnvelope {
    checksum: String,
    data: serde_json::Value,
}

fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Write `report` to `path` atomically, wrapped in a checksummed envelope.
pub fn save(path: &Path, report: &ValidationReport) -> Result<()> {
    let data = serde_json::to_value(report)?;
    let data_str = serde_json::to_string_pretty(&data)?;
    let checksum = sha256_hex(&data_str);

    let envelope = ReportEnvelope { checksum, data };
    let json = serde_json::to_string_pretty(&envelope)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    tracing::info!(path = %path.display(), claims = report.claims.len(), "report saved");
    Ok(())
}

/// Read and verify a report written by [`save`].
pub fn load(path: &Path) -> Result<ValidationReport> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let envelope: ReportEnvelope = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a report envelope", path.display()))?;

    let data_str = serde_json::to_string_pretty(&envelope.data)?;
    let expected = sha256_hex(&data_str);
    if expected != envelope.checksum {
        bail!(
            "report integrity check failed: {} (expected {}, got {})",
            path.display(),
            &expected[..12],
            &envelope.checksum[..12.min(envelope.checksum.len())]
        );
    }

    Ok(serde_json::from_value(envelope.data)?)
}

/// Plain-text table for terminal output.
pub fn render_text(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Validation report ({}, seed {})",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.seed
    );
    let _ = writeln!(
        out,
        "{:<24} {:<26} {:>4} {:>9} {:>9} {:>12}  {}",
        "CLAIM", "ALGORITHM", "BITS", "EXPECTED", "ACTUAL", "AVG TIME", "STATUS"
    );
    for c in &report.claims {
        let _ = writeln!(
            out,
            "{:<24} {:<26} {:>4} {:>8.1}% {:>8.1}% {:>11.6}s  {}",
            c.id,
            c.algorithm.to_string(),
            c.bit_size,
            c.expected_rate * 100.0,
            c.actual_rate * 100.0,
            c.avg_time_seconds,
            c.status
        );
    }
    let _ = writeln!(
        out,
        "{} validated, {} failed, {} insufficient corpus",
        report.summary.validated, report.summary.failed, report.summary.insufficient
    );
    out
}
