//! Sensitive data taint analysis
//!
//! A schema is *sensitive* when its name, or the name of one of its
//! properties, contains a sensitive keyword. Every response schema is then
//! searched for a path to sensitive data, and the result is graded by
//! whether the operation sits behind a security requirement:
//!
//! - unsecured operation + leak -> `CRITICAL` (public data leakage)
//! - secured operation + leak   -> `WARNING` (needs scope verification)

use crate::graph::SchemaResolver;
use crate::spec::{Schema, SpecDocument};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Keywords that mark a schema or property name as sensitive
pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "password",
    "secret",
    "token",
    "key",
    "ssn",
    "socialsecurity",
    "creditcard",
    "cardnumber",
    "cvv",
    "pii",
    "salary",
    "internal",
];

/// Grade of a taint finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaintSeverity {
    Critical,
    Warning,
}

impl TaintSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaintSeverity::Critical => "CRITICAL",
            TaintSeverity::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for TaintSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensitive data reachable from an operation response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaintVulnerability {
    /// `"METHOD path"`
    pub endpoint: String,
    pub severity: TaintSeverity,
    pub reason: String,
    /// Hops from the response to the sensitive data, joined with ` -> `
    pub leak_trail: String,
}

/// Why a component schema is considered sensitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sensitivity {
    /// The schema name itself matches a keyword
    Name,
    /// The named property matches a keyword
    Property(String),
}

enum Frame<'a> {
    /// Search a schema node for leaks
    Node(&'a Schema, Vec<String>),
    /// Check a property name, then search its schema
    Property(&'a str, &'a Schema, Vec<String>),
}

/// Analyzer tracing sensitive data into responses
pub struct TaintAnalyzer {
    /// Lowercased keywords
    keywords: Vec<String>,
}

impl TaintAnalyzer {
    pub fn new() -> Self {
        Self {
            keywords: SENSITIVE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Append project-specific keywords to the built-in set
    pub fn with_extra_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !self.keywords.contains(&keyword) {
                self.keywords.push(keyword);
            }
        }
        self
    }

    /// Case-insensitive substring match against the keyword set
    pub fn is_sensitive_name(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Classify every declared component schema
    pub fn sensitive_schemas<'a>(&self, doc: &'a SpecDocument) -> HashMap<&'a str, Sensitivity> {
        let mut sensitive = HashMap::new();

        for (name, schema) in doc.schemas().iter() {
            if self.is_sensitive_name(name) {
                sensitive.insert(name, Sensitivity::Name);
            } else if let Some(prop) = schema.properties.keys().find(|p| self.is_sensitive_name(p)) {
                sensitive.insert(name, Sensitivity::Property(prop.to_string()));
            }
        }

        sensitive
    }

    /// Find every operation whose responses expose sensitive data
    pub fn analyze(&self, doc: &SpecDocument) -> Vec<TaintVulnerability> {
        let sensitive = self.sensitive_schemas(doc);
        let resolver = SchemaResolver::new(doc);
        let mut vulnerabilities = Vec::new();

        debug!("{} sensitive schemas", sensitive.len());

        for op in doc.operations() {
            let secured = doc.is_secured(op.operation);
            let mut seen_trails: HashSet<String> = HashSet::new();

            for (status, schema) in op.operation.response_schemas() {
                let Some(trail) = self.find_leak(schema, &resolver, &sensitive) else {
                    continue;
                };

                let leak_trail = trail.join(" -> ");
                if !seen_trails.insert(leak_trail.clone()) {
                    continue;
                }

                trace!("{} ({}) leaks via {}", op.endpoint(), status, leak_trail);

                let (severity, reason) = if secured {
                    (
                        TaintSeverity::Warning,
                        "Sensitive data is returned by an authenticated endpoint; verify the caller's scope allows it".to_string(),
                    )
                } else {
                    (
                        TaintSeverity::Critical,
                        "Sensitive data is returned by an endpoint without any security requirement".to_string(),
                    )
                };

                vulnerabilities.push(TaintVulnerability {
                    endpoint: op.endpoint(),
                    severity,
                    reason,
                    leak_trail,
                });
            }
        }

        debug!("Taint analysis found {} exposures", vulnerabilities.len());
        vulnerabilities
    }

    /// Search one response schema, returning the trail to the first leak.
    ///
    /// Frames are pushed in reverse so they pop in the order a recursive
    /// walk would visit them: ref target, array items, then each property
    /// (name check before its subtree), then composite members.
    fn find_leak<'a>(
        &self,
        root: &'a Schema,
        resolver: &SchemaResolver<'a>,
        sensitive: &HashMap<&'a str, Sensitivity>,
    ) -> Option<Vec<String>> {
        let mut visited: HashSet<&'a str> = HashSet::new();
        let mut stack = vec![Frame::Node(root, Vec::new())];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Property(name, schema, trail) => {
                    let mut trail = trail;
                    trail.push(format!("Property: {}", name));
                    if self.is_sensitive_name(name) {
                        return Some(trail);
                    }
                    stack.push(Frame::Node(schema, trail));
                }
                Frame::Node(node, trail) => {
                    if node.is_reference() {
                        let Some(target) = resolver.resolve(node) else {
                            continue;
                        };

                        let mut trail = trail;
                        trail.push(format!("Schema: {}", target.name));

                        match sensitive.get(target.name) {
                            Some(Sensitivity::Name) => return Some(trail),
                            Some(Sensitivity::Property(prop)) => {
                                trail.push(format!("Property: {}", prop));
                                return Some(trail);
                            }
                            None => {}
                        }

                        if visited.insert(target.name) {
                            stack.push(Frame::Node(target.schema, trail));
                        }
                        continue;
                    }

                    for member in node
                        .one_of
                        .iter()
                        .rev()
                        .chain(node.any_of.iter().rev())
                        .chain(node.all_of.iter().rev())
                    {
                        stack.push(Frame::Node(member, trail.clone()));
                    }
                    for (name, schema) in node.properties.iter().collect::<Vec<_>>().into_iter().rev() {
                        stack.push(Frame::Property(name, schema, trail.clone()));
                    }
                    if let Some(items) = node.items.as_deref() {
                        stack.push(Frame::Node(items, trail));
                    }
                }
            }
        }

        None
    }
}

impl Default for TaintAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::DocumentFormat;

    fn load(yaml: &str) -> SpecDocument {
        SpecDocument::parse(yaml, DocumentFormat::Yaml).unwrap()
    }

    #[test]
    fn test_keyword_matching_is_case_insensitive() {
        let analyzer = TaintAnalyzer::new();
        assert!(analyzer.is_sensitive_name("userPassword"));
        assert!(analyzer.is_sensitive_name("API_KEY"));
        assert!(analyzer.is_sensitive_name("CreditCardInfo"));
        assert!(!analyzer.is_sensitive_name("displayName"));
    }

    #[test]
    fn test_extra_keywords() {
        let analyzer = TaintAnalyzer::new().with_extra_keywords(["IBAN", " "]);
        assert!(analyzer.is_sensitive_name("accountIban"));
        assert!(!analyzer.is_sensitive_name("name"));
    }

    #[test]
    fn test_unsecured_credentials_is_critical() {
        let doc = load(
            r#"
paths:
  /debug/session:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Credentials'
components:
  schemas:
    Credentials:
      type: object
      properties:
        password:
          type: string
"#,
        );
        let vulns = TaintAnalyzer::new().analyze(&doc);
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].endpoint, "GET /debug/session");
        assert_eq!(vulns[0].severity, TaintSeverity::Critical);
        assert!(vulns[0].leak_trail.ends_with("Property: password"));
    }

    #[test]
    fn test_global_security_downgrades_to_warning() {
        let doc = load(
            r#"
security:
  - bearer: []
paths:
  /me:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/ApiSecret'
components:
  schemas:
    ApiSecret:
      type: string
"#,
        );
        let vulns = TaintAnalyzer::new().analyze(&doc);
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].severity, TaintSeverity::Warning);
        assert_eq!(vulns[0].leak_trail, "Schema: ApiSecret");
    }

    #[test]
    fn test_non_sensitive_leaf_is_clean() {
        let doc = load(
            r#"
paths:
  /names:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Name'
components:
  schemas:
    Name:
      type: string
"#,
        );
        assert!(TaintAnalyzer::new().analyze(&doc).is_empty());
    }

    #[test]
    fn test_nested_property_trail() {
        let doc = load(
            r#"
paths:
  /profiles:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: '#/components/schemas/Profile'
components:
  schemas:
    Profile:
      type: object
      properties:
        owner:
          $ref: '#/components/schemas/Person'
    Person:
      type: object
      properties:
        contact:
          type: object
          properties:
            ssnNumber:
              type: string
"#,
        );
        let vulns = TaintAnalyzer::new().analyze(&doc);
        assert_eq!(vulns.len(), 1);
        assert_eq!(
            vulns[0].leak_trail,
            "Schema: Profile -> Property: owner -> Schema: Person -> Property: contact -> Property: ssnNumber"
        );
    }

    #[test]
    fn test_cycle_without_leak_terminates() {
        let doc = load(
            r#"
paths:
  /tree:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Tree'
components:
  schemas:
    Tree:
      type: object
      properties:
        children:
          type: array
          items:
            $ref: '#/components/schemas/Tree'
"#,
        );
        assert!(TaintAnalyzer::new().analyze(&doc).is_empty());
    }

    #[test]
    fn test_operation_security_overrides_missing_global() {
        let doc = load(
            r#"
paths:
  /tokens:
    get:
      security:
        - oauth: [tokens:read]
      responses:
        "200":
          content:
            application/json:
              schema:
                type: object
                properties:
                  accessToken:
                    type: string
"#,
        );
        let vulns = TaintAnalyzer::new().analyze(&doc);
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].severity, TaintSeverity::Warning);
        assert_eq!(vulns[0].leak_trail, "Property: accessToken");
    }
}
