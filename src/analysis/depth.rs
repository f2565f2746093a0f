//! Nesting depth calculation
//!
//! The depth of a schema node is the longest chain of `$ref` hops reachable
//! from it:
//!
//! - a leaf (scalar, or container without children) has depth 0
//! - a `$ref` to `S` has depth `1 + depth(body of S)`
//! - an object/array/composite node has the maximum depth of its children
//!
//! Two separate sets keep this correct on cyclic models. The *active path*
//! holds the schemas currently being expanded; meeting one of them again
//! contributes 0. A result whose expansion met the active path anywhere
//! below it depends on where the walk started, so it is never cached. The
//! [`DepthCache`] holds only results computed without such a cut and is
//! reused across every operation of one pass.

use crate::graph::SchemaResolver;
use crate::spec::{Operation, OrderedMap, Schema, SpecDocument};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// `"METHOD path"` -> depth, in operation declaration order
pub type NestingDepths = OrderedMap<usize>;

/// Completed schema depths for a single analysis pass.
///
/// Created by the caller and threaded through each calculation, so no
/// state is shared between passes or threads.
#[derive(Debug, Default)]
pub struct DepthCache {
    completed: HashMap<String, usize>,
}

impl DepthCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth of the body of a fully computed schema
    pub fn get(&self, name: &str) -> Option<usize> {
        self.completed.get(name).copied()
    }

    fn insert(&mut self, name: &str, depth: usize) {
        self.completed.insert(name.to_string(), depth);
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }
}

enum Step<'a> {
    /// Compute the depth of a node and push it on the value stack
    Visit(&'a Schema),
    /// Body of a referenced schema is on the value stack: cache it, add the hop
    Finish(&'a str),
    /// Replace the top `n` values with their maximum
    Max(usize),
}

/// Depth of a node, and whether its expansion was cut by the active path
#[derive(Clone, Copy)]
struct Partial {
    depth: usize,
    cut: bool,
}

impl Partial {
    const LEAF: Partial = Partial { depth: 0, cut: false };
    const CUT: Partial = Partial { depth: 0, cut: true };
}

/// Calculator for schema reference nesting depth
pub struct NestingDepthCalculator;

impl NestingDepthCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Depth of every operation in the document
    pub fn calculate(&self, doc: &SpecDocument) -> NestingDepths {
        let resolver = SchemaResolver::new(doc);
        let mut cache = DepthCache::new();

        let depths: NestingDepths = doc
            .operations()
            .map(|op| {
                let depth = self.operation_depth(op.operation, &resolver, &mut cache);
                trace!("{} -> depth {}", op.endpoint(), depth);
                (op.endpoint(), depth)
            })
            .collect();

        debug!(
            "Computed nesting depth for {} operations ({} schemas cached)",
            depths.len(),
            cache.len()
        );

        depths
    }

    /// Depth of a single operation with a fresh cache
    pub fn calculate_for_operation(&self, doc: &SpecDocument, operation: &Operation) -> usize {
        let resolver = SchemaResolver::new(doc);
        let mut cache = DepthCache::new();
        self.operation_depth(operation, &resolver, &mut cache)
    }

    /// Maximum depth over the request body, response and parameter schemas
    /// of an operation
    pub fn operation_depth<'a>(
        &self,
        operation: &'a Operation,
        resolver: &SchemaResolver<'a>,
        cache: &mut DepthCache,
    ) -> usize {
        operation
            .request_schemas()
            .chain(operation.response_schemas().map(|(_, schema)| schema))
            .chain(operation.parameter_schemas())
            .map(|schema| self.schema_depth(schema, resolver, cache))
            .max()
            .unwrap_or(0)
    }

    /// Depth of one schema node, evaluated with an explicit stack
    pub fn schema_depth<'a>(
        &self,
        root: &'a Schema,
        resolver: &SchemaResolver<'a>,
        cache: &mut DepthCache,
    ) -> usize {
        let mut steps = vec![Step::Visit(root)];
        let mut values: Vec<Partial> = Vec::new();
        let mut active: HashSet<&'a str> = HashSet::new();

        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(node) => {
                    if node.is_reference() {
                        let Some(target) = resolver.resolve(node) else {
                            // dangling or foreign ref: nothing further
                            values.push(Partial::LEAF);
                            continue;
                        };

                        if active.contains(target.name) {
                            trace!("Cycle through '{}' contributes 0", target.name);
                            values.push(Partial::CUT);
                        } else if let Some(body) = cache.get(target.name) {
                            values.push(Partial { depth: body + 1, cut: false });
                        } else {
                            active.insert(target.name);
                            steps.push(Step::Finish(target.name));
                            steps.push(Step::Visit(target.schema));
                        }
                        continue;
                    }

                    let children: Vec<&'a Schema> = SchemaResolver::children(node).collect();
                    if children.is_empty() {
                        values.push(Partial::LEAF);
                    } else {
                        steps.push(Step::Max(children.len()));
                        steps.extend(children.into_iter().map(Step::Visit));
                    }
                }
                Step::Finish(name) => {
                    let body = values.pop().unwrap_or(Partial::LEAF);
                    active.remove(name);
                    if !body.cut {
                        cache.insert(name, body.depth);
                    }
                    values.push(Partial {
                        depth: body.depth + 1,
                        cut: body.cut,
                    });
                }
                Step::Max(count) => {
                    let start = values.len().saturating_sub(count);
                    let merged = values.drain(start..).fold(Partial::LEAF, |acc, v| Partial {
                        depth: acc.depth.max(v.depth),
                        cut: acc.cut || v.cut,
                    });
                    values.push(merged);
                }
            }
        }

        values.pop().map(|v| v.depth).unwrap_or(0)
    }
}

impl Default for NestingDepthCalculator {
    fn default() -> Self {
        Self::new()
    }
}
