use crate::spec::{OrderedMap, Schema, SpecDocument};

/// Prefix of every `$ref` the resolver understands
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// A `$ref` resolved to its component schema
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRef<'a> {
    /// Schema name as declared under `components.schemas`
    pub name: &'a str,
    pub schema: &'a Schema,
}

/// Shared reference-resolution primitive used by every analyzer.
///
/// Only local component refs (`#/components/schemas/<Name>`) resolve. Refs
/// with any other prefix and refs to undeclared names resolve to `None`,
/// which callers treat as "nothing further to walk".
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'a> {
    schemas: &'a OrderedMap<Schema>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(doc: &'a SpecDocument) -> Self {
        Self::from_schemas(doc.schemas())
    }

    pub fn from_schemas(schemas: &'a OrderedMap<Schema>) -> Self {
        Self { schemas }
    }

    /// Extract the schema name from a component ref
    pub fn ref_name(reference: &str) -> Option<&str> {
        reference
            .strip_prefix(SCHEMA_REF_PREFIX)
            .filter(|name| !name.is_empty())
    }

    /// Find a declared schema by name
    pub fn lookup(&self, name: &str) -> Option<ResolvedRef<'a>> {
        self.schemas
            .get_key_value(name)
            .map(|(name, schema)| ResolvedRef { name, schema })
    }

    /// Resolve a `$ref` node to its target
    pub fn resolve(&self, schema: &Schema) -> Option<ResolvedRef<'a>> {
        let name = Self::ref_name(schema.reference.as_deref()?)?;
        self.lookup(name)
    }

    /// Whether the node is a component ref whose target is not declared
    pub fn is_dangling(&self, schema: &Schema) -> bool {
        match schema.reference.as_deref().and_then(Self::ref_name) {
            Some(name) => !self.schemas.contains_key(name),
            None => false,
        }
    }

    /// Direct structural children of a node: property schemas, array items
    /// and allOf/anyOf/oneOf members, in that order.
    pub fn children<'s>(schema: &'s Schema) -> impl Iterator<Item = &'s Schema> {
        schema
            .properties
            .values()
            .chain(schema.items.as_deref())
            .chain(schema.all_of.iter())
            .chain(schema.any_of.iter())
            .chain(schema.one_of.iter())
    }

    /// Every component ref in the document that points at an undeclared
    /// schema, in traversal order and without duplicates.
    pub fn dangling_references(&self, doc: &SpecDocument) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut stack: Vec<&Schema> = Vec::new();

        for op in doc.operations() {
            stack.extend(op.operation.request_schemas());
            stack.extend(op.operation.response_schemas().map(|(_, schema)| schema));
            stack.extend(op.operation.parameter_schemas());
        }
        stack.extend(self.schemas.values());

        // Only inline structure is walked here, so this terminates without a
        // visited set: refs are leaves.
        while let Some(node) = stack.pop() {
            if self.is_dangling(node) {
                if let Some(reference) = &node.reference {
                    if !found.contains(reference) {
                        found.push(reference.clone());
                    }
                }
                continue;
            }
            stack.extend(Self::children(node));
        }

        found
    }
}
