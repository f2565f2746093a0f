// Document model - mirrors the subset of OpenAPI 3.x the analyzers consume

use super::OrderedMap;
use serde::de::value::MapAccessDeserializer;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed OpenAPI document.
///
/// Every field is optional so partially written documents still load; a
/// document without `paths` or `components` simply has nothing to analyze.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpecDocument {
    pub openapi: Option<String>,
    pub swagger: Option<String>,
    pub info: Option<Info>,
    pub servers: Vec<Server>,
    pub paths: OrderedMap<PathItem>,
    pub components: Components,
    pub security: Option<Vec<SecurityRequirement>>,
}

/// One security requirement object: scheme name -> required scopes
pub type SecurityRequirement = OrderedMap<Vec<String>>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Server {
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Components {
    pub schemas: OrderedMap<Schema>,
}

/// A schema node. Nodes reference each other through `$ref`, so the schemas
/// of a document form a graph that may contain cycles.
///
/// OpenAPI 3.1 also allows `true`/`false` anywhere a schema is expected;
/// both load as an empty schema.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, remote = "Self")]
pub struct Schema {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,
    pub properties: OrderedMap<Schema>,
    pub items: Option<Box<Schema>>,
    #[serde(rename = "allOf")]
    pub all_of: Vec<Schema>,
    #[serde(rename = "anyOf")]
    pub any_of: Vec<Schema>,
    #[serde(rename = "oneOf")]
    pub one_of: Vec<Schema>,
    pub description: Option<String>,
}

impl Schema {
    /// Schema consisting of a single `$ref`
    pub fn reference(target: impl Into<String>) -> Self {
        Self {
            reference: Some(target.into()),
            ..Self::default()
        }
    }

    /// Scalar schema of the given type
    pub fn of_type(name: impl Into<String>) -> Self {
        Self {
            schema_type: Some(SchemaType::Single(name.into())),
            ..Self::default()
        }
    }

    /// Effective type name, ignoring `null` in 3.1 type lists
    pub fn type_name(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(SchemaType::primary)
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a schema object or boolean")
            }

            fn visit_bool<E: serde::de::Error>(self, _: bool) -> Result<Schema, E> {
                Ok(Schema::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Schema, A::Error> {
                Schema::deserialize(MapAccessDeserializer::new(map))
            }
        }

        deserializer.deserialize_any(SchemaVisitor)
    }
}

/// `type` is a string in 3.0 and may be a list in 3.1
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    pub fn primary(&self) -> Option<&str> {
        match self {
            SchemaType::Single(name) => Some(name.as_str()),
            SchemaType::Multiple(names) => names
                .iter()
                .map(String::as_str)
                .find(|name| *name != "null"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Parameter {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Option<Schema>,
    pub content: OrderedMap<MediaType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaType {
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestBody {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub content: OrderedMap<MediaType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Response {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    pub description: Option<String>,
    pub content: OrderedMap<MediaType>,
}

impl Response {
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,
    pub responses: OrderedMap<Response>,
    pub security: Option<Vec<SecurityRequirement>>,
    pub deprecated: bool,
}

impl Operation {
    /// Schemas of every request body media type
    pub fn request_schemas(&self) -> impl Iterator<Item = &Schema> {
        self.request_body
            .iter()
            .flat_map(|body| body.content.values())
            .filter_map(|media| media.schema.as_ref())
    }

    /// Schemas of every response media type, tagged with the status code
    pub fn response_schemas(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.responses.iter().flat_map(|(status, response)| {
            response
                .content
                .values()
                .filter_map(move |media| media.schema.as_ref().map(|schema| (status, schema)))
        })
    }

    /// Schemas attached to parameters, directly or through `content`
    pub fn parameter_schemas(&self) -> impl Iterator<Item = &Schema> {
        self.parameters.iter().flat_map(|param| {
            param.schema.iter().chain(
                param
                    .content
                    .values()
                    .filter_map(|media| media.schema.as_ref()),
            )
        })
    }

    /// Whether the operation declares a non-empty security requirement list
    pub fn has_own_security(&self) -> bool {
        self.security.as_ref().is_some_and(|reqs| !reqs.is_empty())
    }
}

/// HTTP methods an OpenAPI path item can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "put" => Some(HttpMethod::Put),
            "post" => Some(HttpMethod::Post),
            "delete" => Some(HttpMethod::Delete),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "patch" => Some(HttpMethod::Patch),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path item. Operations are kept in the order they were declared.
#[derive(Debug, Clone, Default)]
pub struct PathItem {
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Parameters shared by every operation on the path
    pub parameters: Vec<Parameter>,
    operations: Vec<(HttpMethod, Operation)>,
}

impl PathItem {
    pub fn with_operation(mut self, method: HttpMethod, operation: Operation) -> Self {
        self.set_operation(method, operation);
        self
    }

    pub fn set_operation(&mut self, method: HttpMethod, operation: Operation) {
        if let Some(slot) = self.operations.iter_mut().find(|(m, _)| *m == method) {
            slot.1 = operation;
        } else {
            self.operations.push((method, operation));
        }
    }

    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        self.operations.iter().map(|(method, op)| (*method, op))
    }

    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        self.operations
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, op)| op)
    }
}

impl<'de> Deserialize<'de> for PathItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PathItemVisitor;

        impl<'de> Visitor<'de> for PathItemVisitor {
            type Value = PathItem;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an OpenAPI path item")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PathItem, A::Error> {
                let mut item = PathItem::default();
                while let Some(key) = access.next_key::<String>()? {
                    if let Some(method) = HttpMethod::from_key(&key) {
                        let operation: Operation = access.next_value()?;
                        item.set_operation(method, operation);
                        continue;
                    }
                    match key.as_str() {
                        "parameters" => item.parameters = access.next_value()?,
                        "summary" => item.summary = access.next_value()?,
                        "description" => item.description = access.next_value()?,
                        _ => {
                            access.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(item)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<PathItem, E> {
                Ok(PathItem::default())
            }
        }

        deserializer.deserialize_map(PathItemVisitor)
    }
}

/// Borrowed view of one operation together with where it lives
#[derive(Debug, Clone, Copy)]
pub struct OperationRef<'a> {
    pub path: &'a str,
    pub method: HttpMethod,
    pub item: &'a PathItem,
    pub operation: &'a Operation,
}

impl<'a> OperationRef<'a> {
    /// `"METHOD path"` key used by the matrix, depth and taint results
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Operation parameters plus the ones inherited from the path item
    pub fn has_parameters(&self) -> bool {
        !self.operation.parameters.is_empty() || !self.item.parameters.is_empty()
    }
}

impl SpecDocument {
    /// Every operation in declaration order (path order, then method order)
    pub fn operations(&self) -> impl Iterator<Item = OperationRef<'_>> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations().map(move |(method, operation)| OperationRef {
                path,
                method,
                item,
                operation,
            })
        })
    }

    pub fn schemas(&self) -> &OrderedMap<Schema> {
        &self.components.schemas
    }

    /// Whether the document declares a non-empty global security requirement
    pub fn has_global_security(&self) -> bool {
        self.security.as_ref().is_some_and(|reqs| !reqs.is_empty())
    }

    /// Whether an operation is protected, by itself or through global security
    pub fn is_secured(&self, operation: &Operation) -> bool {
        operation.has_own_security() || self.has_global_security()
    }

    pub fn is_openapi(&self) -> bool {
        self.openapi.is_some() || self.swagger.is_some()
    }

    pub fn server_urls(&self) -> Vec<&str> {
        self.servers.iter().map(|s| s.url.as_str()).collect()
    }

    pub fn operation_count(&self) -> usize {
        self.operations().count()
    }
}
