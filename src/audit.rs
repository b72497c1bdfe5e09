use crate::classify::Verdict;
use crate::error::{Result, SignatureError};
use crate::models::Comparison;
use crate::scoring::Strategy;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub id: Uuid,
    pub reference: String,
    pub sample: String,
    pub strategy: Strategy,
    pub score: f64,
    pub score_percent: f64,
    pub verdict: Verdict,
    pub label: String,
}

impl AuditRecord {
    pub fn from_comparison(comparison: &Comparison, reference: &str, sample: &str) -> Result<Self> {
        let timestamp = OffsetDateTime::now_utc().format(&Rfc3339)?;

        Ok(Self {
            timestamp,
            id: comparison.id,
            reference: reference.to_string(),
            sample: sample.to_string(),
            strategy: comparison.strategy,
            score: comparison.score,
            score_percent: comparison.score_percent,
            verdict: comparison.verdict,
            label: comparison.label.to_string(),
        })
    }
}

/// Append-only JSON-lines file
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &AuditRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        debug!(path = %self.path.display(), id = %record.id, "audit record appended");
        Ok(())
    }

    /// Read every record back, in write order
    pub fn read_all(&self) -> Result<Vec<AuditRecord>> {
        let text = fs::read_to_string(&self.path)?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(SignatureError::from))
            .collect()
    }
}
