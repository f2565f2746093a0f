mod authz;
mod cycles;
mod depth;
mod engine;
mod similarity;
mod taint;
mod zombie;

pub use authz::{AuthzMatrix, AuthzMatrixBuilder, PUBLIC_SCOPE};
pub use cycles::{CycleDetector, SchemaCycle};
pub use depth::{DepthCache, NestingDepthCalculator, NestingDepths};
pub use engine::{AnalysisEngine, AnalysisReport, DocumentStats};
pub use similarity::{jaccard, SchemaCluster, SimilarityClusterer, CLUSTER_SUGGESTION, DEFAULT_SIMILARITY_THRESHOLD};
pub use taint::{Sensitivity, TaintAnalyzer, TaintSeverity, TaintVulnerability, SENSITIVE_KEYWORDS};
pub use zombie::{OrphanedOperation, ZombieApiDetector, ZombieEndpoint, ZombieReport};

use serde::Serialize;

/// A single reportable issue found in a specification
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// What was found, with the data specific to that kind of issue
    pub kind: FindingKind,

    /// Severity level
    pub severity: Severity,

    /// Human readable description
    pub message: String,
}

impl Finding {
    pub fn new(kind: FindingKind) -> Self {
        let severity = kind.default_severity();
        let message = kind.default_message();

        Self {
            kind,
            severity,
            message,
        }
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = message;
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Endpoint, path or schema the finding is about
    pub fn location(&self) -> String {
        self.kind.location()
    }
}

/// Kinds of findings, each carrying its own typed context
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FindingKind {
    /// A response exposes a sensitive schema or property
    SensitiveDataExposure {
        endpoint: String,
        taint: TaintSeverity,
        trail: String,
    },

    /// A literal path is hidden behind a parameterized sibling
    ShadowedPath { shadowed: String, shadowing: String },

    /// Operation takes nothing and returns nothing
    OrphanedOperation { endpoint: String },

    /// Schemas with nearly identical fields
    SimilarSchemas { schemas: Vec<String> },

    /// Reference chain deeper than the configured limit
    ExcessiveNesting {
        endpoint: String,
        depth: usize,
        limit: usize,
    },

    /// Component schema that nothing references
    UnusedSchema { schema: String },

    /// Schemas that reference each other in a loop
    CircularReference { schemas: Vec<String> },
}

impl FindingKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            FindingKind::SensitiveDataExposure { taint, .. } => match taint {
                TaintSeverity::Critical => Severity::Error,
                TaintSeverity::Warning => Severity::Warning,
            },
            FindingKind::ShadowedPath { .. } => Severity::Warning,
            FindingKind::OrphanedOperation { .. } => Severity::Info,
            FindingKind::SimilarSchemas { .. } => Severity::Info,
            FindingKind::ExcessiveNesting { .. } => Severity::Warning,
            FindingKind::UnusedSchema { .. } => Severity::Info,
            FindingKind::CircularReference { .. } => Severity::Info,
        }
    }

    pub fn default_message(&self) -> String {
        match self {
            FindingKind::SensitiveDataExposure { endpoint, taint, trail } => match taint {
                TaintSeverity::Critical => format!(
                    "Unauthenticated endpoint '{}' exposes sensitive data ({})",
                    endpoint, trail
                ),
                TaintSeverity::Warning => format!(
                    "Endpoint '{}' exposes sensitive data ({}); verify authorization",
                    endpoint, trail
                ),
            },
            FindingKind::ShadowedPath { shadowed, shadowing } => {
                format!("Path '{}' may be shadowed by '{}'", shadowed, shadowing)
            }
            FindingKind::OrphanedOperation { endpoint } => format!(
                "Operation '{}' takes no input and returns no content",
                endpoint
            ),
            FindingKind::SimilarSchemas { schemas } => format!(
                "Schemas {} have nearly identical properties",
                schemas.join(", ")
            ),
            FindingKind::ExcessiveNesting { endpoint, depth, limit } => format!(
                "Operation '{}' nests schema references {} levels deep (limit {})",
                endpoint, depth, limit
            ),
            FindingKind::UnusedSchema { schema } => {
                format!("Schema '{}' is never referenced", schema)
            }
            FindingKind::CircularReference { schemas } => format!(
                "Schemas form a reference cycle: {}",
                schemas.join(" -> ")
            ),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FindingKind::SensitiveDataExposure { .. } => "SA001",
            FindingKind::ShadowedPath { .. } => "SA002",
            FindingKind::OrphanedOperation { .. } => "SA003",
            FindingKind::SimilarSchemas { .. } => "SA004",
            FindingKind::ExcessiveNesting { .. } => "SA005",
            FindingKind::UnusedSchema { .. } => "SA006",
            FindingKind::CircularReference { .. } => "SA007",
        }
    }

    /// Short rule name used by SARIF output
    pub fn rule_name(&self) -> &'static str {
        match self {
            FindingKind::SensitiveDataExposure { .. } => "sensitive-data-exposure",
            FindingKind::ShadowedPath { .. } => "shadowed-path",
            FindingKind::OrphanedOperation { .. } => "orphaned-operation",
            FindingKind::SimilarSchemas { .. } => "similar-schemas",
            FindingKind::ExcessiveNesting { .. } => "excessive-nesting",
            FindingKind::UnusedSchema { .. } => "unused-schema",
            FindingKind::CircularReference { .. } => "circular-reference",
        }
    }

    pub fn location(&self) -> String {
        match self {
            FindingKind::SensitiveDataExposure { endpoint, .. }
            | FindingKind::OrphanedOperation { endpoint }
            | FindingKind::ExcessiveNesting { endpoint, .. } => endpoint.clone(),
            FindingKind::ShadowedPath { shadowed, .. } => shadowed.clone(),
            FindingKind::UnusedSchema { schema } => format!("#/components/schemas/{}", schema),
            FindingKind::SimilarSchemas { schemas } | FindingKind::CircularReference { schemas } => {
                schemas
                    .first()
                    .map(|name| format!("#/components/schemas/{}", name))
                    .unwrap_or_default()
            }
        }
    }
}

/// Severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" => Some(Severity::Info),
            "warning" | "warn" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
