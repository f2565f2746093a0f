//! Baseline support for specscope
//!
//! A baseline records the findings present at some point so later runs only
//! report what is new. Findings are matched on the spec file (relative to the
//! project root), the finding code and its location.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

use crate::analysis::{AnalysisReport, Finding};

/// Baseline errors
#[derive(Error, Debug)]
pub enum BaselineError {
    #[error("Failed to read baseline file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse baseline: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Baseline version mismatch (expected {expected}, found {found})")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current baseline format version
const BASELINE_VERSION: u32 = 1;

/// A fingerprint for a finding that can be matched across runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueFingerprint {
    /// Spec file relative to the project root
    pub file: String,
    /// Finding code, e.g. `SA001`
    pub code: String,
    /// Endpoint, path or schema pointer
    pub location: String,
}

impl IssueFingerprint {
    pub fn new(report: &AnalysisReport, finding: &Finding, project_root: &Path) -> Self {
        Self {
            file: relative_source(report, project_root),
            code: finding.code().to_string(),
            location: finding.location(),
        }
    }
}

fn relative_source(report: &AnalysisReport, project_root: &Path) -> String {
    match &report.source {
        Some(source) => source
            .strip_prefix(project_root)
            .unwrap_or(source)
            .to_string_lossy()
            .replace('\\', "/"),
        None => String::new(),
    }
}

/// A baseline containing known findings to ignore
#[derive(Debug, Serialize, Deserialize)]
pub struct Baseline {
    /// Baseline format version
    pub version: u32,
    /// Seconds since the Unix epoch when the baseline was created
    pub created_at: String,
    /// Known issues to ignore
    pub issues: Vec<IssueFingerprint>,
    /// Total count at baseline time
    pub total_at_baseline: usize,
}

impl Baseline {
    /// Create a new baseline from the findings of every report
    pub fn from_reports(reports: &[AnalysisReport], project_root: &Path) -> Self {
        let issues: Vec<IssueFingerprint> = reports
            .iter()
            .flat_map(|report| {
                report
                    .findings
                    .iter()
                    .map(move |finding| IssueFingerprint::new(report, finding, project_root))
            })
            .collect();

        Self {
            version: BASELINE_VERSION,
            created_at: unix_timestamp(),
            total_at_baseline: issues.len(),
            issues,
        }
    }

    /// Load a baseline from a file
    pub fn load(path: &Path) -> Result<Self, BaselineError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let baseline: Self = serde_json::from_reader(reader)?;

        if baseline.version != BASELINE_VERSION {
            return Err(BaselineError::VersionMismatch {
                expected: BASELINE_VERSION,
                found: baseline.version,
            });
        }

        Ok(baseline)
    }

    /// Save baseline to a file
    pub fn save(&self, path: &Path) -> Result<(), BaselineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Check if a finding is in the baseline
    pub fn is_baselined(&self, report: &AnalysisReport, finding: &Finding, project_root: &Path) -> bool {
        let fingerprint = IssueFingerprint::new(report, finding, project_root);
        self.issues.contains(&fingerprint)
    }

    /// Drop baselined findings from a report, returning how many were dropped
    pub fn filter_report(&self, report: &mut AnalysisReport, project_root: &Path) -> usize {
        let before = report.findings.len();
        let kept: Vec<Finding> = report
            .findings
            .iter()
            .filter(|finding| !self.is_baselined(report, finding, project_root))
            .cloned()
            .collect();
        report.findings = kept;
        before - report.findings.len()
    }

    /// Get statistics about baseline coverage
    pub fn stats(&self, reports: &[AnalysisReport], project_root: &Path) -> BaselineStats {
        let mut baselined = 0;
        let mut new = 0;

        for report in reports {
            for finding in &report.findings {
                if self.is_baselined(report, finding, project_root) {
                    baselined += 1;
                } else {
                    new += 1;
                }
            }
        }

        BaselineStats {
            total_in_baseline: self.issues.len(),
            baselined_found: baselined,
            new_issues: new,
        }
    }
}

/// Statistics about baseline comparison
#[derive(Debug, Clone)]
pub struct BaselineStats {
    /// Total issues recorded in baseline
    pub total_in_baseline: usize,
    /// Number of current findings that match baseline
    pub baselined_found: usize,
    /// Number of new issues not in baseline
    pub new_issues: usize,
}

impl std::fmt::Display for BaselineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} new issues ({} baselined, {} in baseline file)",
            self.new_issues, self.baselined_found, self.total_in_baseline
        )
    }
}

fn unix_timestamp() -> String {
    use std::time::SystemTime;

    let duration = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();

    duration.as_secs().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FindingKind;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn report_with(file: &str, schemas: &[&str]) -> AnalysisReport {
        let mut report = AnalysisReport::default().with_source(PathBuf::from(file));
        for schema in schemas {
            report.findings.push(Finding::new(FindingKind::UnusedSchema {
                schema: schema.to_string(),
            }));
        }
        report
    }

    #[test]
    fn test_fingerprint_is_relative() {
        let root = PathBuf::from("/project");
        let report = report_with("/project/specs/api.yaml", &["Legacy"]);
        let fp = IssueFingerprint::new(&report, &report.findings[0], &root);

        assert_eq!(fp.file, "specs/api.yaml");
        assert_eq!(fp.code, "SA006");
        assert_eq!(fp.location, "#/components/schemas/Legacy");
    }

    #[test]
    fn test_baseline_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let baseline_path = temp_dir.path().join("nested/baseline.json");
        let root = PathBuf::from("/project");

        let reports = vec![report_with("/project/a.yaml", &["A", "B"])];
        Baseline::from_reports(&reports, &root).save(&baseline_path).unwrap();

        let loaded = Baseline::load(&baseline_path).unwrap();
        assert_eq!(loaded.issues.len(), 2);
        assert_eq!(loaded.total_at_baseline, 2);
    }

    #[test]
    fn test_version_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("baseline.json");
        std::fs::write(
            &path,
            r#"{"version": 99, "created_at": "0", "issues": [], "total_at_baseline": 0}"#,
        )
        .unwrap();

        assert!(matches!(
            Baseline::load(&path),
            Err(BaselineError::VersionMismatch { found: 99, .. })
        ));
    }

    #[test]
    fn test_filter_report() {
        let root = PathBuf::from("/project");
        let baseline = Baseline::from_reports(&[report_with("/project/a.yaml", &["A"])], &root);

        let mut current = report_with("/project/a.yaml", &["A", "B"]);
        let stats = baseline.stats(std::slice::from_ref(&current), &root);
        assert_eq!(stats.new_issues, 1);
        assert_eq!(stats.baselined_found, 1);

        assert_eq!(baseline.filter_report(&mut current, &root), 1);
        assert_eq!(current.findings.len(), 1);
        assert_eq!(current.findings[0].location(), "#/components/schemas/B");

        // same finding in another file is new
        let other = report_with("/project/b.yaml", &["A"]);
        assert!(!baseline.is_baselined(&other, &other.findings[0], &root));
    }
}
