use super::emit;
use crate::analysis::{AnalysisReport, Severity};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, reports: &[AnalysisReport]) -> Result<()> {
        let json = Self::render(reports)?;
        emit(self.output_path.as_deref(), &json, "Report")
    }

    /// Full reports plus a severity summary, pretty printed
    pub fn render(reports: &[AnalysisReport]) -> Result<String> {
        let report = JsonReport::from_reports(reports);
        serde_json::to_string_pretty(&report).into_diagnostic()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    total_issues: usize,
    specs: &'a [AnalysisReport],
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonSummary {
    errors: usize,
    warnings: usize,
    infos: usize,
    specs: usize,
    operations: usize,
    schemas: usize,
}

impl<'a> JsonReport<'a> {
    fn from_reports(reports: &'a [AnalysisReport]) -> Self {
        let mut summary = JsonSummary {
            errors: 0,
            warnings: 0,
            infos: 0,
            specs: reports.len(),
            operations: 0,
            schemas: 0,
        };

        for report in reports {
            summary.operations += report.stats.operations;
            summary.schemas += report.stats.schemas;
            for finding in &report.findings {
                match finding.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Info => summary.infos += 1,
                }
            }
        }

        Self {
            version: "1.0",
            total_issues: summary.errors + summary.warnings + summary.infos,
            specs: reports,
            summary,
        }
    }
}
