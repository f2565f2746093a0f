mod terminal;
mod json;
mod sarif;

pub use terminal::TerminalReporter;
pub use json::JsonReporter;
pub use sarif::SarifReporter;

use crate::analysis::AnalysisReport;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

/// Output format for reports
#[derive(Debug, Clone, Default)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
    Sarif,
}

impl ReportFormat {
    /// Parse the `report.format` config value
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "terminal" | "text" => Some(ReportFormat::Terminal),
            "json" => Some(ReportFormat::Json),
            "sarif" => Some(ReportFormat::Sarif),
            _ => None,
        }
    }
}

/// Reporter for outputting specification analysis results
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    show_matrix: bool,
    show_depths: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            show_matrix: false,
            show_depths: false,
        }
    }

    /// Print the authorization matrix table (terminal only)
    pub fn with_matrix(mut self, show: bool) -> Self {
        self.show_matrix = show;
        self
    }

    /// Print per-operation nesting depths (terminal only)
    pub fn with_depths(mut self, show: bool) -> Self {
        self.show_depths = show;
        self
    }

    /// Report the analysis results of every document
    pub fn report(&self, reports: &[AnalysisReport]) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new()
                    .with_matrix(self.show_matrix)
                    .with_depths(self.show_depths);
                reporter.report(reports)
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(reports)
            }
            ReportFormat::Sarif => {
                let reporter = SarifReporter::new(self.output_path.clone());
                reporter.report(reports)
            }
        }
    }
}

/// Write rendered output to a file, or stdout when no path is given
pub(crate) fn emit(output_path: Option<&Path>, contents: &str, label: &str) -> Result<()> {
    if let Some(path) = output_path {
        std::fs::write(path, contents).into_diagnostic()?;
        println!("{} written to: {}", label, path.display());
    } else {
        println!("{}", contents);
    }
    Ok(())
}

/// Display name for the file a report came from
pub(crate) fn source_name(report: &AnalysisReport) -> String {
    report
        .source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<input>".to_string())
}
