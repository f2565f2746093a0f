//! Schema similarity clustering
//!
//! Each schema is reduced to the set of its direct `name:type` property
//! pairs, and schemas are grouped greedily by Jaccard similarity. Grouping is
//! first-match and depends on declaration order; three schemas that are not
//! all pairwise similar can cluster differently when reordered.

use crate::spec::{OrderedMap, Schema};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Schemas must be strictly more similar than this to share a cluster
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.80;

pub const CLUSTER_SUGGESTION: &str =
    "These schemas are highly similar. Consider merging them or extracting a shared base schema with allOf.";

/// Group of schemas judged near-duplicates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaCluster {
    /// Member names; the first is the schema that started the cluster
    pub schemas: Vec<String>,
    pub suggestion: String,
}

/// Jaccard index of two feature sets; two empty sets are identical
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

pub struct SimilarityClusterer {
    threshold: f64,
}

impl SimilarityClusterer {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// `"<property>:<type>"` for every direct property, `unknown` when the
    /// property has no type (including `$ref` properties)
    pub fn features(schema: &Schema) -> BTreeSet<String> {
        schema
            .properties
            .iter()
            .map(|(name, prop)| format!("{}:{}", name, prop.type_name().unwrap_or("unknown")))
            .collect()
    }

    pub fn cluster(&self, schemas: &OrderedMap<Schema>) -> Vec<SchemaCluster> {
        let names: Vec<&str> = schemas.keys().collect();
        let features: Vec<BTreeSet<String>> = schemas.values().map(Self::features).collect();
        let mut processed = vec![false; names.len()];
        let mut clusters = Vec::new();

        for i in 0..names.len() {
            if processed[i] {
                continue;
            }
            processed[i] = true;
            let mut members = vec![names[i].to_string()];

            for j in (i + 1)..names.len() {
                if processed[j] {
                    continue;
                }
                let score = jaccard(&features[i], &features[j]);
                if score > self.threshold {
                    trace!("{} ~ {} ({:.2})", names[i], names[j], score);
                    processed[j] = true;
                    members.push(names[j].to_string());
                }
            }

            if members.len() > 1 {
                clusters.push(SchemaCluster {
                    schemas: members,
                    suggestion: CLUSTER_SUGGESTION.to_string(),
                });
            }
        }

        debug!("Found {} similar schema clusters", clusters.len());
        clusters
    }
}

impl Default for SimilarityClusterer {
    fn default() -> Self {
        Self::new()
    }
}
