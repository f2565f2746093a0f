use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::DEFAULT_SIMILARITY_THRESHOLD;

/// Configuration for specscope analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spec files or directories to analyze
    pub targets: Vec<PathBuf>,

    /// Patterns to exclude from directory discovery
    pub exclude: Vec<String>,

    /// Schema name patterns never reported as unused, similar or cyclic
    pub ignore_schemas: Vec<String>,

    /// Run analyzers concurrently
    pub parallel: bool,

    /// Report configuration
    pub report: ReportConfig,

    /// Detection configuration
    pub detection: DetectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json, sarif
    pub format: String,

    /// Print the authorization matrix table
    pub show_matrix: bool,

    /// Print per-operation nesting depths
    pub show_depths: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Sensitive data exposure in responses
    pub taint: bool,

    /// Authorization matrix
    pub authz: bool,

    /// Near-duplicate schema clusters
    pub similarity: bool,

    /// Shadowed paths and orphaned operations
    pub zombies: bool,

    /// Nesting depth per operation
    pub depth: bool,

    /// Schemas nothing references
    pub unused_schemas: bool,

    /// Schema reference cycles
    pub cycles: bool,

    /// Depth above which an operation is reported
    pub max_depth: usize,

    /// Jaccard similarity a pair must exceed to cluster
    pub similarity_threshold: f64,

    /// Appended to the built-in sensitive keywords
    pub extra_sensitive_keywords: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: vec![],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/target/**".to_string(),
                "**/.git/**".to_string(),
            ],
            ignore_schemas: vec![],
            parallel: false,
            report: ReportConfig::default(),
            detection: DetectionConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
            show_matrix: false,
            show_depths: false,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            taint: true,
            authz: true,
            similarity: true,
            zombies: true,
            depth: true,
            unused_schemas: true,
            cycles: true,
            max_depth: 5,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            extra_sensitive_keywords: vec![],
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".specscope.yml",
            ".specscope.yaml",
            ".specscope.toml",
            "specscope.yml",
            "specscope.yaml",
            "specscope.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Check if a discovered path matches an exclude pattern
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|pattern| glob_match(pattern, &path_str))
    }

    /// Check if a schema is exempt from unused/similar/cycle reporting
    pub fn is_ignored_schema(&self, name: &str) -> bool {
        self.ignore_schemas.iter().any(|p| glob_match(p, name))
    }
}

/// Simple glob matching for patterns like "*Dto", "Legacy*", "*Legacy*" or
/// "**/vendor/**"
fn glob_match(pattern: &str, text: &str) -> bool {
    let is_name_pattern = !pattern.contains('/') && !pattern.contains("**");

    if let Some(middle) = pattern
        .strip_prefix('*')
        .and_then(|rest| rest.strip_suffix('*'))
        .filter(|_| is_name_pattern)
    {
        return text.contains(middle);
    }

    if let Some(suffix) = pattern.strip_prefix('*').filter(|_| !pattern.contains('/')) {
        return text.ends_with(suffix);
    }

    if let Some(prefix) = pattern.strip_suffix('*').filter(|_| !pattern.contains('/')) {
        return text.starts_with(prefix);
    }

    if pattern.contains("**") {
        // "**/dir/**" matches "dir" as a whole path component anywhere
        if pattern.starts_with("**/") && pattern.ends_with("/**") {
            let dir_name = pattern.trim_start_matches("**/").trim_end_matches("/**");
            let text = text.replace('\\', "/");
            return text.contains(&format!("/{}/", dir_name))
                || text.starts_with(&format!("{}/", dir_name));
        }

        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if prefix.is_empty() && suffix.is_empty() {
                return true;
            }

            if prefix.is_empty() {
                return text.ends_with(suffix) || text.contains(&format!("/{}", suffix));
            }

            if suffix.is_empty() {
                return text.starts_with(prefix) || text.contains(&format!("{}/", prefix));
            }

            return (text.starts_with(prefix) || text.contains(&format!("/{}/", prefix)))
                && (text.ends_with(suffix) || text.contains(&format!("/{}", suffix)));
        }
    }

    text == pattern
}
