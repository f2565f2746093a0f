use super::{emit, source_name};
use crate::analysis::{AnalysisReport, FindingKind, Severity, TaintSeverity};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// SARIF reporter for CI/CD integration (GitHub, Azure DevOps, etc.)
pub struct SarifReporter {
    output_path: Option<PathBuf>,
}

impl SarifReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, reports: &[AnalysisReport]) -> Result<()> {
        let json = Self::render(reports)?;
        emit(self.output_path.as_deref(), &json, "SARIF report")
    }

    pub fn render(reports: &[AnalysisReport]) -> Result<String> {
        let sarif = SarifReport::from_reports(reports);
        serde_json::to_string_pretty(&sarif).into_diagnostic()
    }
}

/// SARIF 2.1.0 format
#[derive(Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: &'static str,
    version: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
struct SarifRule {
    id: &'static str,
    name: &'static str,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_configuration: SarifConfiguration,
}

#[derive(Serialize)]
struct SarifConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: &'static str,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
    #[serde(rename = "logicalLocations")]
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
struct SarifLogicalLocation {
    #[serde(rename = "fullyQualifiedName")]
    fully_qualified_name: String,
}

fn level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

/// One representative of each finding kind, used to describe the rules
fn rule_kinds() -> Vec<FindingKind> {
    vec![
        FindingKind::SensitiveDataExposure {
            endpoint: String::new(),
            taint: TaintSeverity::Critical,
            trail: String::new(),
        },
        FindingKind::ShadowedPath {
            shadowed: String::new(),
            shadowing: String::new(),
        },
        FindingKind::OrphanedOperation {
            endpoint: String::new(),
        },
        FindingKind::SimilarSchemas { schemas: vec![] },
        FindingKind::ExcessiveNesting {
            endpoint: String::new(),
            depth: 0,
            limit: 0,
        },
        FindingKind::UnusedSchema {
            schema: String::new(),
        },
        FindingKind::CircularReference { schemas: vec![] },
    ]
}

fn rule_description(kind: &FindingKind) -> &'static str {
    match kind {
        FindingKind::SensitiveDataExposure { .. } => "Response exposes sensitive data",
        FindingKind::ShadowedPath { .. } => "Literal path is shadowed by a parameterized path",
        FindingKind::OrphanedOperation { .. } => "Operation takes no input and returns no content",
        FindingKind::SimilarSchemas { .. } => "Schemas have nearly identical properties",
        FindingKind::ExcessiveNesting { .. } => "Schema references are nested too deeply",
        FindingKind::UnusedSchema { .. } => "Component schema is never referenced",
        FindingKind::CircularReference { .. } => "Schemas reference each other in a cycle",
    }
}

impl SarifReport {
    fn from_reports(reports: &[AnalysisReport]) -> Self {
        let rules = rule_kinds()
            .iter()
            .map(|kind| SarifRule {
                id: kind.code(),
                name: kind.rule_name(),
                short_description: SarifMessage {
                    text: rule_description(kind).to_string(),
                },
                default_configuration: SarifConfiguration {
                    level: level(kind.default_severity()),
                },
            })
            .collect();

        let results: Vec<SarifResult> = reports
            .iter()
            .flat_map(|report| {
                let uri = source_name(report);
                report.findings.iter().map(move |finding| SarifResult {
                    rule_id: finding.code(),
                    level: level(finding.severity),
                    message: SarifMessage {
                        text: finding.message.clone(),
                    },
                    locations: vec![SarifLocation {
                        physical_location: SarifPhysicalLocation {
                            artifact_location: SarifArtifactLocation { uri: uri.clone() },
                        },
                        logical_locations: vec![SarifLogicalLocation {
                            fully_qualified_name: finding.location(),
                        }],
                    }],
                })
            })
            .collect();

        SarifReport {
            schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
            version: "2.1.0",
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "specscope",
                        version: env!("CARGO_PKG_VERSION"),
                        rules,
                    },
                },
                results,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisEngine, Finding};
    use crate::spec::SpecDocument;

    #[test]
    fn test_one_rule_per_kind() {
        let json = SarifReporter::render(&[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let rules = value["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
        let ids: Vec<_> = rules.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["SA001", "SA002", "SA003", "SA004", "SA005", "SA006", "SA007"]);
        assert_eq!(rules[0]["defaultConfiguration"]["level"], "error");
        assert!(value["runs"][0]["results"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_result_locations() {
        let mut report = AnalysisEngine::new()
            .analyze(&SpecDocument::default())
            .with_source(PathBuf::from("specs/api.yaml"));
        report.findings.push(Finding::new(FindingKind::UnusedSchema {
            schema: "Legacy".to_string(),
        }));

        let json = SarifReporter::render(&[report]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let result = &value["runs"][0]["results"][0];

        assert_eq!(result["ruleId"], "SA006");
        assert_eq!(result["level"], "note");
        assert_eq!(
            result["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
            "specs/api.yaml"
        );
        assert_eq!(
            result["locations"][0]["logicalLocations"][0]["fullyQualifiedName"],
            "#/components/schemas/Legacy"
        );
    }
}
