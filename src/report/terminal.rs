use super::source_name;
use crate::analysis::{AnalysisReport, AuthzMatrix, Finding, NestingDepths, Severity};
use colored::Colorize;
use miette::Result;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    show_matrix: bool,
    show_depths: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            show_matrix: false,
            show_depths: false,
        }
    }

    pub fn with_matrix(mut self, show: bool) -> Self {
        self.show_matrix = show;
        self
    }

    pub fn with_depths(mut self, show: bool) -> Self {
        self.show_depths = show;
        self
    }

    pub fn report(&self, reports: &[AnalysisReport]) -> Result<()> {
        let total: usize = reports.iter().map(|r| r.findings.len()).sum();

        if total == 0 && !self.show_matrix && !self.show_depths {
            println!("{}", "No issues found!".green().bold());
            return Ok(());
        }

        println!();
        if total > 0 {
            println!(
                "{}",
                format!("Found {} issues in {} specs:", total, reports.len())
                    .yellow()
                    .bold()
            );
            println!();
        }

        let mut ordered: Vec<&AnalysisReport> = reports.iter().collect();
        ordered.sort_by(|a, b| a.source.cmp(&b.source));

        for report in ordered {
            self.print_header(report);

            let mut findings: Vec<&Finding> = report.findings.iter().collect();
            findings.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.code().cmp(b.code())));
            for finding in findings {
                self.print_item(finding);
            }

            if self.show_matrix && !report.authz.is_empty() {
                println!();
                self.print_matrix(&report.authz);
            }

            if self.show_depths && !report.depths.is_empty() {
                println!();
                self.print_depths(&report.depths);
            }

            println!();
        }

        self.print_summary(reports);

        Ok(())
    }

    fn print_header(&self, report: &AnalysisReport) {
        let mut header = source_name(report).cyan().bold().to_string();
        if let Some(title) = &report.stats.title {
            let version = report.stats.version.as_deref().unwrap_or("?");
            header.push_str(&format!(" {}", format!("({} v{})", title, version).dimmed()));
        }
        println!("{}", header);
    }

    fn print_item(&self, finding: &Finding) {
        let severity_str = match finding.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };

        println!(
            "  {} [{}] {}",
            severity_str,
            finding.code().dimmed(),
            finding.message
        );
        println!("    {} {}", "→".dimmed(), finding.location().white());
    }

    fn print_matrix(&self, matrix: &AuthzMatrix) {
        println!("{}", "Authorization matrix".bold());

        let width = matrix
            .operations
            .keys()
            .map(str::len)
            .max()
            .unwrap_or(0)
            .max("Operation".len());

        let mut header = format!("  {:<width$}", "Operation", width = width);
        for scope in &matrix.scopes {
            header.push_str(&format!("  {}", scope));
        }
        println!("{}", header.dimmed());

        for (endpoint, scopes) in matrix.operations.iter() {
            let mut row = format!("  {:<width$}", endpoint, width = width);
            for scope in &matrix.scopes {
                let cell = if scopes.contains(scope) { "✓" } else { "·" };
                row.push_str(&format!("  {:^w$}", cell, w = scope.chars().count()));
            }
            println!("{}", row);
        }
    }

    fn print_depths(&self, depths: &NestingDepths) {
        println!("{}", "Nesting depth".bold());
        for (endpoint, depth) in depths.iter() {
            println!("  {:>3}  {}", depth, endpoint);
        }
    }

    fn print_summary(&self, reports: &[AnalysisReport]) {
        let mut errors = 0;
        let mut warnings = 0;
        let mut infos = 0;

        for finding in reports.iter().flat_map(|r| &r.findings) {
            match finding.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
                Severity::Info => infos += 1,
            }
        }

        println!("{}", "─".repeat(60).dimmed());

        let mut severity_parts = Vec::new();
        if errors > 0 {
            severity_parts.push(format!("{} errors", errors).red().to_string());
        }
        if warnings > 0 {
            severity_parts.push(format!("{} warnings", warnings).yellow().to_string());
        }
        if infos > 0 {
            severity_parts.push(format!("{} info", infos).blue().to_string());
        }
        if severity_parts.is_empty() {
            severity_parts.push("no issues".green().to_string());
        }
        println!("Summary: {}", severity_parts.join(", "));

        let operations: usize = reports.iter().map(|r| r.stats.operations).sum();
        let schemas: usize = reports.iter().map(|r| r.stats.schemas).sum();
        println!(
            "{}",
            format!("{} operations, {} schemas analyzed", operations, schemas).dimmed()
        );
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
