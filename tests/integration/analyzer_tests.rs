//! Integration tests for the specscope analyzers
//!
//! These tests run the analyzers against fixture specs and check the
//! properties every analysis pass must hold.

use specscope::analysis::{
    jaccard, AnalysisEngine, AuthzMatrixBuilder, NestingDepthCalculator, SimilarityClusterer,
    TaintAnalyzer, TaintSeverity, ZombieApiDetector, PUBLIC_SCOPE,
};
use specscope::graph::DependencyGraphBuilder;
use specscope::spec::{DocumentFormat, OrderedMap, Schema, SpecDocument};
use specscope::Severity;
use std::path::PathBuf;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/specs")
}

fn load_fixture(name: &str) -> SpecDocument {
    SpecDocument::from_file(&fixtures_path().join(name)).expect("Failed to load fixture")
}

fn yaml(contents: &str) -> SpecDocument {
    SpecDocument::parse(contents, DocumentFormat::Yaml).expect("Invalid test document")
}

// ============================================================================
// Fixture pipeline
// ============================================================================

#[test]
fn test_shop_fixture_findings() {
    let doc = load_fixture("shop.yaml");
    let report = AnalysisEngine::new().analyze(&doc);

    assert_eq!(report.stats.title.as_deref(), Some("Shop"));
    assert_eq!(report.stats.operations, 5);
    assert_eq!(report.stats.schemas, 6);
    assert!(report.stats.dangling_references.is_empty());

    let mut codes: Vec<_> = report.findings.iter().map(|f| f.code()).collect();
    codes.sort();
    assert_eq!(codes, vec!["SA001", "SA002", "SA003", "SA004", "SA006", "SA006", "SA007"]);

    let errors = report.findings.iter().filter(|f| f.severity == Severity::Error).count();
    assert_eq!(errors, 1);
}

#[test]
fn test_shop_fixture_results() {
    let doc = load_fixture("shop.yaml");
    let report = AnalysisEngine::new().analyze(&doc);

    let user = report.dependencies.get("User").unwrap();
    assert!(user.contains("Operation: GET /users/{id}"));
    assert!(user.contains("Operation: GET /users/current"));
    assert!(user.contains("Schema: User"));

    assert_eq!(report.depths.get("POST /orders"), Some(&2));
    assert_eq!(report.depths.get("GET /users/{id}"), Some(&1));
    assert_eq!(report.depths.get("GET /health"), Some(&0));

    assert_eq!(report.clusters.len(), 1);
    assert_eq!(report.clusters[0].schemas, vec!["OrderLine", "LegacyOrderLine"]);

    let scopes: Vec<_> = report.authz.scopes.iter().map(String::as_str).collect();
    assert_eq!(scopes, vec!["PUBLIC", "orders:write", "profile", "users:read"]);

    assert_eq!(report.zombies.orphaned.len(), 1);
    assert_eq!(report.zombies.orphaned[0].endpoint(), "GET /health");
}

#[test]
fn test_clean_json_fixture() {
    let doc = load_fixture("petstore.json");
    let report = AnalysisEngine::new().analyze(&doc);

    assert_eq!(report.stats.operations, 2);
    assert!(report.findings.is_empty(), "unexpected findings: {:?}", report.findings);
    assert_eq!(report.depths.get("GET /pets/{petId}"), Some(&1));
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_unused_schema_scenario() {
    let doc = yaml(
        r#"
components:
  schemas:
    UnusedSchema:
      type: object
"#,
    );
    let reverse = DependencyGraphBuilder::new().build(&doc).reverse_dependencies();

    assert_eq!(reverse.len(), 1);
    assert!(reverse.get("UnusedSchema").unwrap().is_empty());
}

#[test]
fn test_shadowed_path_scenario() {
    let doc = yaml(
        r#"
paths:
  /users/{id}:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                type: object
  /users/current:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                type: object
"#,
    );
    let shadowed = ZombieApiDetector::new().find_shadowed(&doc);

    assert_eq!(shadowed.len(), 1);
    assert_eq!(shadowed[0].shadowed_path, "/users/current");
    assert_eq!(shadowed[0].shadowing_path, "/users/{id}");
}

#[test]
fn test_credentials_scenario() {
    let doc = load_fixture("shop.yaml");
    let vulns = TaintAnalyzer::new().analyze(&doc);

    assert_eq!(vulns.len(), 1);
    assert_eq!(vulns[0].endpoint, "GET /debug/session");
    assert_eq!(vulns[0].severity, TaintSeverity::Critical);
    assert!(vulns[0].leak_trail.ends_with("Property: password"));
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_every_declared_schema_is_a_key() {
    let doc = load_fixture("shop.yaml");
    let reverse = DependencyGraphBuilder::new().build(&doc).reverse_dependencies();

    for name in doc.schemas().keys() {
        assert!(reverse.contains_key(name), "{} missing from graph", name);
    }
    assert_eq!(reverse.len(), doc.schemas().len());
}

#[test]
fn test_depth_baselines() {
    let doc = yaml(
        r#"
paths:
  /plain:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                type: object
                properties:
                  id:
                    type: string
  /one:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Name'
  /self:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Category'
components:
  schemas:
    Name:
      type: string
    Category:
      type: object
      properties:
        parent:
          $ref: '#/components/schemas/Category'
        children:
          type: array
          items:
            $ref: '#/components/schemas/Category'
"#,
    );
    let depths = NestingDepthCalculator::new().calculate(&doc);

    assert_eq!(depths.get("GET /plain"), Some(&0));
    assert_eq!(depths.get("GET /one"), Some(&1));
    assert_eq!(depths.get("GET /self"), Some(&1));
}

#[test]
fn test_taint_severity_follows_security() {
    let responses = r#"
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Secret'
"#;
    let components = r#"
components:
  schemas:
    Secret:
      type: string
"#;

    let unsecured = yaml(&format!("paths:\n  /a:\n    get:{}{}", responses, components));
    let operation_level = yaml(&format!(
        "paths:\n  /a:\n    get:\n      security:\n        - key: []{}{}",
        responses, components
    ));
    let inherited = yaml(&format!(
        "security:\n  - key: []\npaths:\n  /a:\n    get:{}{}",
        responses, components
    ));

    let analyzer = TaintAnalyzer::new();
    assert_eq!(analyzer.analyze(&unsecured)[0].severity, TaintSeverity::Critical);
    assert_eq!(analyzer.analyze(&operation_level)[0].severity, TaintSeverity::Warning);
    assert_eq!(analyzer.analyze(&inherited)[0].severity, TaintSeverity::Warning);
}

#[test]
fn test_similarity_is_symmetric_and_order_independent() {
    let doc = load_fixture("shop.yaml");
    let schemas = doc.schemas();

    for a in schemas.values() {
        for b in schemas.values() {
            let fa = SimilarityClusterer::features(a);
            let fb = SimilarityClusterer::features(b);
            assert_eq!(jaccard(&fa, &fb), jaccard(&fb, &fa));
        }
    }

    let reversed: OrderedMap<Schema> = schemas
        .iter()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|(name, schema)| (name, schema.clone()))
        .collect();
    let clusters = SimilarityClusterer::new().cluster(&reversed);

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].schemas, vec!["LegacyOrderLine", "OrderLine"]);
}

#[test]
fn test_authz_fallback_order() {
    let doc = yaml(
        r#"
security:
  - oauth: [global]
paths:
  /own:
    get:
      security:
        - oauth: [own]
      responses: {}
  /inherited:
    get:
      responses: {}
"#,
    );
    let matrix = AuthzMatrixBuilder::new().build(&doc);

    assert_eq!(matrix.operations.get("GET /own"), Some(&vec!["own".to_string()]));
    assert_eq!(matrix.operations.get("GET /inherited"), Some(&vec!["global".to_string()]));
    assert!(!matrix.scopes.contains(PUBLIC_SCOPE));

    let public = yaml("paths:\n  /open:\n    get:\n      responses: {}\n");
    let matrix = AuthzMatrixBuilder::new().build(&public);
    assert_eq!(matrix.operations.get("GET /open"), Some(&vec![PUBLIC_SCOPE.to_string()]));
}

#[test]
fn test_empty_inputs_give_empty_results() {
    let doc = SpecDocument::default();
    let engine = AnalysisEngine::new();

    assert!(engine.build_reverse_dependency_graph(&doc).is_empty());
    assert!(engine.calculate_nesting_depths(&doc).is_empty());
    assert!(engine.perform_taint_analysis(&doc).is_empty());
    assert!(engine.generate_authz_matrix(&doc).is_empty());
    assert!(engine.analyze_schema_similarity(&doc).is_empty());
    assert!(engine.detect_zombie_apis(&doc).is_empty());
}
