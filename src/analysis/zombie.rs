//! Zombie endpoint detection
//!
//! Two heuristics, both lint signals rather than proofs:
//!
//! - **Shadowing**: a parameterized path such as `/users/{id}` syntactically
//!   matches a literal sibling `/users/current` with the same segment count.
//!   HTTP methods and router precedence are not considered.
//! - **Orphans**: operations with no parameters, no request body and no
//!   `200` response content appear to take nothing and return nothing.

use crate::spec::{HttpMethod, SpecDocument};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// A literal path made unreachable by a parameterized sibling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZombieEndpoint {
    pub shadowed_path: String,
    pub shadowing_path: String,
    pub reason: String,
}

/// Operation that takes no input and returns no content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanedOperation {
    pub method: HttpMethod,
    pub path: String,
    pub reason: String,
}

impl OrphanedOperation {
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ZombieReport {
    pub shadowed: Vec<ZombieEndpoint>,
    pub orphaned: Vec<OrphanedOperation>,
}

impl ZombieReport {
    pub fn is_empty(&self) -> bool {
        self.shadowed.is_empty() && self.orphaned.is_empty()
    }
}

pub struct ZombieApiDetector {
    param_segment: Regex,
}

impl ZombieApiDetector {
    pub fn new() -> Self {
        Self {
            param_segment: Regex::new(r"^\{[^{}/]+\}$").expect("valid path parameter pattern"),
        }
    }

    pub fn detect(&self, doc: &SpecDocument) -> ZombieReport {
        let report = ZombieReport {
            shadowed: self.find_shadowed(doc),
            orphaned: self.find_orphans(doc),
        };

        debug!(
            "Zombie detection: {} shadowed paths, {} orphaned operations",
            report.shadowed.len(),
            report.orphaned.len()
        );

        report
    }

    fn is_param(&self, segment: &str) -> bool {
        self.param_segment.is_match(segment)
    }

    /// Whether `pattern` shadows the literal path `target`
    pub fn shadows(&self, pattern: &str, target: &str) -> bool {
        let a: Vec<&str> = pattern.split('/').collect();
        let b: Vec<&str> = target.split('/').collect();

        if pattern == target || a.len() != b.len() {
            return false;
        }

        let mut param_over_literal = false;
        for (sa, sb) in a.iter().zip(&b) {
            if self.is_param(sa) {
                if !self.is_param(sb) {
                    param_over_literal = true;
                }
            } else if sa != sb {
                return false;
            }
        }

        param_over_literal
    }

    /// Check every ordered pair of distinct paths
    pub fn find_shadowed(&self, doc: &SpecDocument) -> Vec<ZombieEndpoint> {
        let paths: Vec<&str> = doc.paths.keys().collect();
        let mut shadowed = Vec::new();

        for pattern in &paths {
            for target in &paths {
                if self.shadows(pattern, target) {
                    shadowed.push(ZombieEndpoint {
                        shadowed_path: target.to_string(),
                        shadowing_path: pattern.to_string(),
                        reason: format!(
                            "Path '{}' may be unreachable: requests to it also match '{}'",
                            target, pattern
                        ),
                    });
                }
            }
        }

        shadowed
    }

    pub fn find_orphans(&self, doc: &SpecDocument) -> Vec<OrphanedOperation> {
        doc.operations()
            .filter(|op| {
                let returns_content = op
                    .operation
                    .responses
                    .get("200")
                    .is_some_and(|response| response.has_content());

                !op.has_parameters() && op.operation.request_body.is_none() && !returns_content
            })
            .map(|op| OrphanedOperation {
                method: op.method,
                path: op.path.to_string(),
                reason: "Operation has no parameters, no request body and no 200 response content"
                    .to_string(),
            })
            .collect()
    }
}

impl Default for ZombieApiDetector {
    fn default() -> Self {
        Self::new()
    }
}
