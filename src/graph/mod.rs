// Schema dependency graph
//
// Nodes are operations and component schemas, edges point from the thing
// that holds a `$ref` to the schema it references.

mod builder;
mod resolver;

pub use builder::DependencyGraphBuilder;
pub use resolver::{ResolvedRef, SchemaResolver, SCHEMA_REF_PREFIX};

use crate::spec::{HttpMethod, OrderedMap};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Schema name -> labels of everything that references it.
///
/// Keys follow schema declaration order; labels are
/// `"Operation: <METHOD> <path>"` or `"Schema: <name>"`.
pub type ReverseDependencyGraph = OrderedMap<BTreeSet<String>>;

/// Something that can depend on a component schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Dependent {
    Operation { method: HttpMethod, path: String },
    Schema(String),
}

impl Dependent {
    pub fn operation(method: HttpMethod, path: &str) -> Self {
        Dependent::Operation {
            method,
            path: path.to_string(),
        }
    }

    pub fn schema(name: &str) -> Self {
        Dependent::Schema(name.to_string())
    }
}

impl fmt::Display for Dependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependent::Operation { method, path } => write!(f, "Operation: {} {}", method, path),
            Dependent::Schema(name) => write!(f, "Schema: {}", name),
        }
    }
}

/// Reference graph between operations and component schemas
#[derive(Debug)]
pub struct DependencyGraph {
    /// The underlying directed graph, dependent -> referenced schema
    inner: DiGraph<Dependent, ()>,

    /// Map from node to node index
    node_map: HashMap<Dependent, NodeIndex>,

    /// Declared schema names, in declaration order
    declared: Vec<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            inner: DiGraph::new(),
            node_map: HashMap::new(),
            declared: Vec::new(),
        }
    }

    fn ensure_node(&mut self, node: &Dependent) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(node) {
            return idx;
        }
        let idx = self.inner.add_node(node.clone());
        self.node_map.insert(node.clone(), idx);
        idx
    }

    /// Register a declared component schema
    pub fn declare_schema(&mut self, name: &str) {
        let node = Dependent::schema(name);
        if !self.node_map.contains_key(&node) {
            self.declared.push(name.to_string());
        }
        self.ensure_node(&node);
    }

    /// Record that `from` references the schema `to`.
    ///
    /// References to undeclared schemas are dropped so the graph only ever
    /// contains declared schema nodes.
    pub fn add_reference(&mut self, from: &Dependent, to: &str) -> bool {
        let Some(&to_idx) = self.node_map.get(&Dependent::schema(to)) else {
            return false;
        };
        let from_idx = self.ensure_node(from);
        self.inner.update_edge(from_idx, to_idx, ());
        true
    }

    /// Everything that references the given schema
    pub fn dependents_of(&self, schema: &str) -> Vec<&Dependent> {
        let Some(&idx) = self.node_map.get(&Dependent::schema(schema)) else {
            return Vec::new();
        };

        let mut dependents: Vec<&Dependent> = self
            .inner
            .edges_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|edge| self.inner.node_weight(edge.source()))
            .collect();
        dependents.sort();
        dependents
    }

    /// Flatten into the schema -> dependents mapping
    pub fn reverse_dependencies(&self) -> ReverseDependencyGraph {
        self.declared
            .iter()
            .map(|name| {
                let dependents: BTreeSet<String> = self
                    .dependents_of(name)
                    .into_iter()
                    .map(|d| d.to_string())
                    .collect();
                (name.clone(), dependents)
            })
            .collect()
    }

    /// Declared schemas nothing references
    pub fn unreferenced_schemas(&self) -> Vec<&str> {
        self.declared
            .iter()
            .filter(|name| self.dependents_of(name).is_empty())
            .map(String::as_str)
            .collect()
    }

    pub fn declared_schemas(&self) -> &[String] {
        &self.declared
    }

    pub fn schema_count(&self) -> usize {
        self.declared.len()
    }

    pub fn reference_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Get the underlying petgraph for advanced operations
    pub fn inner(&self) -> &DiGraph<Dependent, ()> {
        &self.inner
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
