// Analysis engine - runs every enabled analyzer over one document
//
// Analyzers never call each other; they share only the read-only document
// and the resolver. Results are combined here into one report plus a flat
// list of findings for the reporters.

use super::{
    AuthzMatrix, AuthzMatrixBuilder, CycleDetector, Finding, FindingKind, NestingDepthCalculator,
    NestingDepths, SchemaCluster, SchemaCycle, SimilarityClusterer, TaintAnalyzer,
    TaintVulnerability, ZombieApiDetector, ZombieReport,
};
use crate::config::Config;
use crate::graph::{DependencyGraph, DependencyGraphBuilder, ReverseDependencyGraph, SchemaResolver};
use crate::spec::{Operation, SpecDocument};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Summary numbers about an analyzed document
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentStats {
    pub title: Option<String>,
    pub version: Option<String>,
    pub paths: usize,
    pub operations: usize,
    pub schemas: usize,
    pub servers: Vec<String>,
    /// `$ref`s pointing at undeclared component schemas
    pub dangling_references: Vec<String>,
}

impl DocumentStats {
    pub fn from_document(doc: &SpecDocument) -> Self {
        Self {
            title: doc.info.as_ref().and_then(|i| i.title.clone()),
            version: doc.info.as_ref().and_then(|i| i.version.clone()),
            paths: doc.paths.len(),
            operations: doc.operation_count(),
            schemas: doc.schemas().len(),
            servers: doc.server_urls().into_iter().map(String::from).collect(),
            dangling_references: SchemaResolver::new(doc).dangling_references(doc),
        }
    }
}

/// Everything the engine found in one document
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// File the document was loaded from
    pub source: Option<PathBuf>,
    pub stats: DocumentStats,
    pub dependencies: ReverseDependencyGraph,
    pub depths: NestingDepths,
    pub vulnerabilities: Vec<TaintVulnerability>,
    pub authz: AuthzMatrix,
    pub clusters: Vec<SchemaCluster>,
    pub zombies: ZombieReport,
    pub schema_cycles: Vec<SchemaCycle>,
    pub findings: Vec<Finding>,
}

impl AnalysisReport {
    pub fn with_source(mut self, source: PathBuf) -> Self {
        self.source = Some(source);
        self
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// Facade running the analyzers with the configured options
pub struct AnalysisEngine {
    config: Config,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Run analyzers concurrently
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    pub fn build_reverse_dependency_graph(&self, doc: &SpecDocument) -> ReverseDependencyGraph {
        DependencyGraphBuilder::new().build(doc).reverse_dependencies()
    }

    pub fn calculate_nesting_depths(&self, doc: &SpecDocument) -> NestingDepths {
        NestingDepthCalculator::new().calculate(doc)
    }

    pub fn calculate_nesting_depth(&self, doc: &SpecDocument, operation: &Operation) -> usize {
        NestingDepthCalculator::new().calculate_for_operation(doc, operation)
    }

    pub fn perform_taint_analysis(&self, doc: &SpecDocument) -> Vec<TaintVulnerability> {
        TaintAnalyzer::new()
            .with_extra_keywords(&self.config.detection.extra_sensitive_keywords)
            .analyze(doc)
    }

    pub fn generate_authz_matrix(&self, doc: &SpecDocument) -> AuthzMatrix {
        AuthzMatrixBuilder::new().build(doc)
    }

    pub fn analyze_schema_similarity(&self, doc: &SpecDocument) -> Vec<SchemaCluster> {
        SimilarityClusterer::new()
            .with_threshold(self.config.detection.similarity_threshold)
            .cluster(doc.schemas())
    }

    pub fn detect_zombie_apis(&self, doc: &SpecDocument) -> ZombieReport {
        ZombieApiDetector::new().detect(doc)
    }

    /// Run every enabled analyzer and collect findings
    pub fn analyze(&self, doc: &SpecDocument) -> AnalysisReport {
        let detection = &self.config.detection;

        let stats = DocumentStats::from_document(doc);
        for reference in &stats.dangling_references {
            warn!("Unresolved schema reference: {}", reference);
        }

        let run_graph = || DependencyGraphBuilder::new().build(doc);
        let run_depths = || {
            if detection.depth {
                self.calculate_nesting_depths(doc)
            } else {
                NestingDepths::new()
            }
        };
        let run_taint = || {
            if detection.taint {
                self.perform_taint_analysis(doc)
            } else {
                Vec::new()
            }
        };
        let run_authz = || {
            if detection.authz {
                self.generate_authz_matrix(doc)
            } else {
                AuthzMatrix::default()
            }
        };
        let run_similarity = || {
            if detection.similarity {
                self.analyze_schema_similarity(doc)
            } else {
                Vec::new()
            }
        };
        let run_zombies = || {
            if detection.zombies {
                self.detect_zombie_apis(doc)
            } else {
                ZombieReport::default()
            }
        };

        let ((graph, depths), ((vulnerabilities, authz), (clusters, zombies))) = if self.config.parallel {
            debug!("Running analyzers in parallel");
            rayon::join(
                || rayon::join(run_graph, run_depths),
                || {
                    rayon::join(
                        || rayon::join(run_taint, run_authz),
                        || rayon::join(run_similarity, run_zombies),
                    )
                },
            )
        } else {
            (
                (run_graph(), run_depths()),
                ((run_taint(), run_authz()), (run_similarity(), run_zombies())),
            )
        };

        let schema_cycles = if detection.cycles {
            CycleDetector::new().find_cycles(&graph)
        } else {
            Vec::new()
        };

        let mut report = AnalysisReport {
            source: None,
            stats,
            dependencies: graph.reverse_dependencies(),
            depths,
            vulnerabilities,
            authz,
            clusters,
            zombies,
            schema_cycles,
            findings: Vec::new(),
        };
        report.findings = self.collect_findings(&report, &graph);

        debug!("Analysis produced {} findings", report.findings.len());
        report
    }

    fn collect_findings(&self, report: &AnalysisReport, graph: &DependencyGraph) -> Vec<Finding> {
        let detection = &self.config.detection;
        let mut findings = Vec::new();

        for vuln in &report.vulnerabilities {
            findings.push(Finding::new(FindingKind::SensitiveDataExposure {
                endpoint: vuln.endpoint.clone(),
                taint: vuln.severity,
                trail: vuln.leak_trail.clone(),
            }));
        }

        for zombie in &report.zombies.shadowed {
            findings.push(
                Finding::new(FindingKind::ShadowedPath {
                    shadowed: zombie.shadowed_path.clone(),
                    shadowing: zombie.shadowing_path.clone(),
                })
                .with_message(zombie.reason.clone()),
            );
        }

        for orphan in &report.zombies.orphaned {
            findings.push(Finding::new(FindingKind::OrphanedOperation {
                endpoint: orphan.endpoint(),
            }));
        }

        for cluster in &report.clusters {
            let schemas: Vec<String> = cluster
                .schemas
                .iter()
                .filter(|name| !self.config.is_ignored_schema(name))
                .cloned()
                .collect();
            if schemas.len() > 1 {
                findings.push(Finding::new(FindingKind::SimilarSchemas { schemas }));
            }
        }

        for (endpoint, &depth) in report.depths.iter() {
            if depth > detection.max_depth {
                findings.push(Finding::new(FindingKind::ExcessiveNesting {
                    endpoint: endpoint.to_string(),
                    depth,
                    limit: detection.max_depth,
                }));
            }
        }

        if detection.unused_schemas {
            for schema in graph.unreferenced_schemas() {
                if self.config.is_ignored_schema(schema) {
                    continue;
                }
                findings.push(Finding::new(FindingKind::UnusedSchema {
                    schema: schema.to_string(),
                }));
            }
        }

        for cycle in &report.schema_cycles {
            if cycle.schemas.iter().any(|name| self.config.is_ignored_schema(name)) {
                continue;
            }
            findings.push(Finding::new(FindingKind::CircularReference {
                schemas: cycle.schemas.clone(),
            }));
        }

        findings
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
