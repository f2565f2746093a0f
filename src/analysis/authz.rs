use crate::spec::{OrderedMap, SecurityRequirement, SpecDocument};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Scope assigned to operations with no security requirement anywhere
pub const PUBLIC_SCOPE: &str = "PUBLIC";

/// Which scopes each operation requires.
///
/// `scopes` is the sorted union of every scope seen, usable as table columns.
/// `operations` maps `"METHOD path"` to that operation's scopes and keeps
/// operation declaration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthzMatrix {
    pub scopes: BTreeSet<String>,
    pub operations: OrderedMap<Vec<String>>,
}

impl AuthzMatrix {
    /// Whether the operation requires the given scope
    pub fn requires(&self, endpoint: &str, scope: &str) -> bool {
        self.operations
            .get(endpoint)
            .is_some_and(|scopes| scopes.iter().any(|s| s == scope))
    }

    /// Operations marked with the `PUBLIC` sentinel
    pub fn public_operations(&self) -> impl Iterator<Item = &str> {
        self.operations
            .iter()
            .filter(|(_, scopes)| scopes.iter().any(|s| s == PUBLIC_SCOPE))
            .map(|(endpoint, _)| endpoint)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

pub struct AuthzMatrixBuilder;

impl AuthzMatrixBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, doc: &SpecDocument) -> AuthzMatrix {
        let mut matrix = AuthzMatrix::default();
        let global = doc.security.as_deref().filter(|reqs| !reqs.is_empty());

        for op in doc.operations() {
            let own = op.operation.security.as_deref().filter(|reqs| !reqs.is_empty());

            let row = match own.or(global) {
                Some(requirements) => Self::collect_scopes(requirements),
                None => vec![PUBLIC_SCOPE.to_string()],
            };

            matrix.scopes.extend(row.iter().cloned());
            matrix.operations.insert(op.endpoint(), row);
        }

        debug!(
            "Authorization matrix: {} operations x {} scopes",
            matrix.operations.len(),
            matrix.scopes.len()
        );

        matrix
    }

    /// Every scope of every scheme, first occurrence order
    fn collect_scopes(requirements: &[SecurityRequirement]) -> Vec<String> {
        let mut row: Vec<String> = Vec::new();
        for scope in requirements
            .iter()
            .flat_map(|req| req.values())
            .flatten()
        {
            if !row.contains(scope) {
                row.push(scope.clone());
            }
        }
        row
    }
}

impl Default for AuthzMatrixBuilder {
    fn default() -> Self {
        Self::new()
    }
}
