//! specscope - Static analysis for OpenAPI specifications
//!
//! This library loads OpenAPI 3.x documents and runs a set of graph and
//! tree analyzers over their paths and component schemas.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **File Discovery** - Find `.yaml`, `.yml` and `.json` spec files
//! 2. **Loading** - Parse documents into an order-preserving model
//! 3. **Graph Building** - Resolve `$ref`s into a schema dependency graph
//! 4. **Analysis** - Nesting depth, sensitive data taint, authorization
//!    matrix, schema similarity, zombie endpoints and reference cycles
//! 5. **Reporting** - Output results in various formats

pub mod analysis;
pub mod baseline;
pub mod config;
pub mod discovery;
pub mod graph;
pub mod report;
pub mod spec;
pub mod watch;

pub use analysis::{AnalysisEngine, AnalysisReport, Finding, FindingKind, Severity};
pub use config::Config;
pub use discovery::{FileFinder, SpecFile};
pub use graph::{DependencyGraph, DependencyGraphBuilder, SchemaResolver};
pub use report::{ReportFormat, Reporter};
pub use spec::{SpecDocument, SpecError};
