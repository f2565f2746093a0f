use super::{DependencyGraph, Dependent, SchemaResolver};
use crate::spec::{Schema, SpecDocument};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Builds the reverse dependency graph of a document.
///
/// Every operation's request body and response content is walked through
/// the resolver, and so is the body of every component schema. Each `$ref`
/// met on the way records the current root as a dependent of the target.
pub struct DependencyGraphBuilder;

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, doc: &SpecDocument) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        let schemas = doc.schemas();

        if schemas.is_empty() {
            debug!("No component schemas declared, skipping dependency walk");
            return graph;
        }

        for name in schemas.keys() {
            graph.declare_schema(name);
        }

        let resolver = SchemaResolver::new(doc);

        for op in doc.operations() {
            let dependent = Dependent::operation(op.method, op.path);
            let roots = op
                .operation
                .request_schemas()
                .chain(op.operation.response_schemas().map(|(_, schema)| schema));
            self.walk(roots, &dependent, &resolver, &mut graph);
        }

        for (name, schema) in schemas.iter() {
            let dependent = Dependent::schema(name);
            self.walk(std::iter::once(schema), &dependent, &resolver, &mut graph);
        }

        debug!(
            "Dependency graph: {} schemas, {} references",
            graph.schema_count(),
            graph.reference_count()
        );

        graph
    }

    /// Walk every schema reachable from `roots`, following refs.
    ///
    /// Nodes are tracked by identity for the whole root, so a node reached
    /// twice (a cycle, or a schema referenced from two places) is walked once.
    fn walk<'a>(
        &self,
        roots: impl Iterator<Item = &'a Schema>,
        dependent: &Dependent,
        resolver: &SchemaResolver<'a>,
        graph: &mut DependencyGraph,
    ) {
        let mut visited: HashSet<*const Schema> = HashSet::new();
        let mut stack: Vec<&'a Schema> = roots.collect();

        while let Some(node) = stack.pop() {
            if !visited.insert(node as *const Schema) {
                continue;
            }

            if node.is_reference() {
                match resolver.resolve(node) {
                    Some(target) => {
                        graph.add_reference(dependent, target.name);
                        stack.push(target.schema);
                    }
                    None => trace!("{}: unresolved ref {:?}", dependent, node.reference),
                }
                continue;
            }

            stack.extend(SchemaResolver::children(node));
        }
    }
}

impl Default for DependencyGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{DocumentFormat, SpecDocument};

    fn load(yaml: &str) -> SpecDocument {
        SpecDocument::parse(yaml, DocumentFormat::Yaml).unwrap()
    }

    #[test]
    fn test_empty_components_gives_empty_graph() {
        let doc = load(
            r#"
paths:
  /x:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Missing'
"#,
        );
        let graph = DependencyGraphBuilder::new().build(&doc);
        assert!(graph.reverse_dependencies().is_empty());
    }

    #[test]
    fn test_unused_schema_has_empty_set() {
        let doc = load(
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
    fn test_transitive_and_composite_references() {
        let doc = load(
            r#"
paths:
  /orders:
    post:
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Order'
components:
  schemas:
    Order:
      allOf:
        - $ref: '#/components/schemas/Base'
        - type: object
          properties:
            lines:
              type: array
              items:
                $ref: '#/components/schemas/Line'
    Base:
      type: object
    Line:
      type: object
      properties:
        ghost:
          $ref: '#/components/schemas/Ghost'
"#,
        );
        let reverse = DependencyGraphBuilder::new().build(&doc).reverse_dependencies();

        let keys: Vec<_> = reverse.keys().collect();
        assert_eq!(keys, vec!["Order", "Base", "Line"]);

        let line = reverse.get("Line").unwrap();
        assert!(line.contains("Operation: POST /orders"));
        assert!(line.contains("Schema: Order"));

        let base = reverse.get("Base").unwrap();
        assert!(base.contains("Operation: POST /orders"));
        assert!(base.contains("Schema: Order"));
    }

    #[test]
    fn test_self_reference_terminates() {
        let doc = load(
            r#"
components:
  schemas:
    Node:
      type: object
      properties:
        next:
          $ref: '#/components/schemas/Node'
        children:
          type: array
          items:
            $ref: '#/components/schemas/Node'
"#,
        );
        let reverse = DependencyGraphBuilder::new().build(&doc).reverse_dependencies();
        let node = reverse.get("Node").unwrap();
        assert_eq!(node.len(), 1);
        assert!(node.contains("Schema: Node"));
    }
}
