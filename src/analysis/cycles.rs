// Cycle detector - finds component schemas that reference each other in a loop
//
// Recursive models are legal OpenAPI (a tree node holding child nodes), so
// cycles are reported as information. A cycle that nothing outside of it
// references is also unused as a whole, which the unused-schema check alone
// cannot see because every member has a dependent.

use crate::graph::{Dependent, DependencyGraph};
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Schemas forming one strongly connected component of the reference graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaCycle {
    /// Member names in declaration order
    pub schemas: Vec<String>,
    /// Whether any operation or schema outside the cycle references it
    pub externally_referenced: bool,
}

impl SchemaCycle {
    pub fn size(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_self_reference(&self) -> bool {
        self.schemas.len() == 1
    }
}

/// Detector for schema reference cycles
pub struct CycleDetector;

impl CycleDetector {
    pub fn new() -> Self {
        Self
    }

    /// Find every schema cycle, largest first.
    ///
    /// Components of two or more schemas are cycles; a single schema counts
    /// only when it references itself.
    pub fn find_cycles(&self, graph: &DependencyGraph) -> Vec<SchemaCycle> {
        let inner = graph.inner();
        let sccs = tarjan_scc(inner);

        let mut cycles = Vec::new();

        for scc in sccs {
            let is_cycle = match scc.as_slice() {
                [single] => inner.contains_edge(*single, *single),
                members => members.len() >= 2,
            };
            if !is_cycle {
                continue;
            }

            let members: HashSet<NodeIndex> = scc.iter().copied().collect();
            let externally_referenced = self.has_external_incoming_edge(graph, &members);

            // Operations never form cycles, every member here is a schema
            let mut schemas: Vec<String> = scc
                .iter()
                .filter_map(|&idx| match inner.node_weight(idx) {
                    Some(Dependent::Schema(name)) => Some(name.clone()),
                    _ => None,
                })
                .collect();

            let declared = graph.declared_schemas();
            schemas.sort_by_key(|name| declared.iter().position(|d| d == name));

            debug!(
                "Found schema cycle with {} members: {:?}",
                schemas.len(),
                schemas
            );

            cycles.push(SchemaCycle {
                schemas,
                externally_referenced,
            });
        }

        // Largest first, then by first member for stable output
        cycles.sort_by(|a, b| b.size().cmp(&a.size()).then_with(|| a.schemas.cmp(&b.schemas)));

        cycles
    }

    /// Check if anything outside the given set references a member of the set
    fn has_external_incoming_edge(&self, graph: &DependencyGraph, members: &HashSet<NodeIndex>) -> bool {
        members.iter().any(|&idx| {
            graph
                .inner()
                .edges_directed(idx, Direction::Incoming)
                .any(|edge| !members.contains(&edge.source()))
        })
    }
}

impl Default for CycleDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::HttpMethod;

    fn graph(schemas: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for name in schemas {
            graph.declare_schema(name);
        }
        for (from, to) in edges {
            graph.add_reference(&Dependent::schema(from), to);
        }
        graph
    }

    #[test]
    fn test_no_cycles() {
        let graph = graph(&["A", "B"], &[("A", "B")]);
        assert!(CycleDetector::new().find_cycles(&graph).is_empty());
    }

    #[test]
    fn test_mutual_reference() {
        let graph = graph(&["Author", "Book", "Tag"], &[("Book", "Author"), ("Author", "Book")]);
        let cycles = CycleDetector::new().find_cycles(&graph);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].schemas, vec!["Author", "Book"]);
        assert!(!cycles[0].externally_referenced);
    }

    #[test]
    fn test_self_reference() {
        let mut graph = graph(&["Node"], &[("Node", "Node")]);
        graph.add_reference(&Dependent::operation(HttpMethod::Get, "/tree"), "Node");

        let cycles = CycleDetector::new().find_cycles(&graph);
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].is_self_reference());
        assert!(cycles[0].externally_referenced);
    }

    #[test]
    fn test_largest_first() {
        let graph = graph(
            &["A", "B", "C", "X", "Y"],
            &[("X", "Y"), ("Y", "X"), ("A", "B"), ("B", "C"), ("C", "A")],
        );
        let cycles = CycleDetector::new().find_cycles(&graph);

        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].schemas, vec!["A", "B", "C"]);
        assert_eq!(cycles[1].schemas, vec!["X", "Y"]);
    }
}
