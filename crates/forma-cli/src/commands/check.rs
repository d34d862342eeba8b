//! `forma check` command implementation.
//!
//! Validates configuration files for consistency and correctness:
//! - JSON Schema validation against schemas in `schemas/`
//! - Layout structure and dependency checks (cycles, chains, dangling targets)
//! - Default layout uniqueness, access rule ties, tenant ownership

use anyhow::{Context, Result};
use forma_core::config::{FormConfig, resolve_path, yaml_files_in};
use forma_policy::{ConfigFinding, ConfigValidator, Severity};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Embedded JSON Schemas
// ============================================================================

/// Embedded JSON schemas for configuration validation.
/// These are compiled into the binary so validation works without external files.
mod embedded_schemas {
    pub const FORMA_DEFINITION: &str =
        include_str!("../../../../schemas/FormaDefinition.schema.json");
    pub const FORM_LAYOUT: &str = include_str!("../../../../schemas/FormLayout.schema.json");
    pub const FIELD_ACCESS_RULES: &str =
        include_str!("../../../../schemas/FieldAccessRules.schema.json");
}

// ============================================================================
// Check Result Types
// ============================================================================

/// A single check finding.
#[derive(Debug, Clone)]
pub struct CheckFinding {
    pub severity: Severity,
    /// Category of the check that produced this finding.
    pub category: String,
    pub message: String,
    /// Optional file path where the issue was found.
    pub file: Option<PathBuf>,
    /// Optional location within the file (e.g., "sections.basics").
    pub location: Option<String>,
}

impl CheckFinding {
    fn error(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category: category.into(),
            message: message.into(),
            file: None,
            location: None,
        }
    }

    fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl From<ConfigFinding> for CheckFinding {
    fn from(finding: ConfigFinding) -> Self {
        Self {
            severity: finding.severity,
            category: finding.category,
            message: finding.message,
            file: None,
            location: finding.location,
        }
    }
}

/// Results from running all checks.
#[derive(Debug, Default)]
pub struct CheckResults {
    pub findings: Vec<CheckFinding>,
}

impl CheckResults {
    fn new() -> Self {
        Self {
            findings: Vec::new(),
        }
    }

    fn extend(&mut self, findings: impl IntoIterator<Item = CheckFinding>) {
        self.findings.extend(findings);
    }

    /// Returns true if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    /// Count of errors.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Print human-readable summary.
    pub fn print_summary(&self) {
        let group = |severity: Severity| {
            let mut group: Vec<_> = self
                .findings
                .iter()
                .filter(|f| f.severity == severity)
                .collect();
            group.sort_by(|a, b| a.category.cmp(&b.category));
            group
        };
        let errors = group(Severity::Error);
        let warnings = group(Severity::Warning);
        let infos = group(Severity::Info);

        if !errors.is_empty() {
            println!("\n❌ Errors ({}):", errors.len());
            println!("{}", "─".repeat(60));
            for finding in &errors {
                print_finding(finding);
            }
        }

        if !warnings.is_empty() {
            println!("\n⚠️  Warnings ({}):", warnings.len());
            println!("{}", "─".repeat(60));
            for finding in &warnings {
                print_finding(finding);
            }
        }

        if !infos.is_empty() && errors.is_empty() && warnings.is_empty() {
            println!("\nℹ️  Info ({}):", infos.len());
            println!("{}", "─".repeat(60));
            for finding in &infos {
                print_finding(finding);
            }
        }

        println!();
        println!("{}", "═".repeat(60));
        if errors.is_empty() && warnings.is_empty() {
            println!("✅ All checks passed!");
        } else {
            println!(
                "Summary: {} error(s), {} warning(s)",
                errors.len(),
                self.count(Severity::Warning)
            );
            if !errors.is_empty() {
                println!("\n❌ Configuration has errors that must be fixed.");
            }
        }
    }
}

fn print_finding(finding: &CheckFinding) {
    let icon = match finding.severity {
        Severity::Error => "✗",
        Severity::Warning => "⚠",
        Severity::Info => "ℹ",
    };

    let location = match (&finding.file, &finding.location) {
        (Some(f), Some(l)) => format!(" [{}:{}]", f.display(), l),
        (Some(f), None) => format!(" [{}]", f.display()),
        (None, Some(l)) => format!(" [{}]", l),
        (None, None) => String::new(),
    };

    println!(
        "  {} [{}]{}: {}",
        icon, finding.category, location, finding.message
    );
}

// ============================================================================
// Main Check Runner
// ============================================================================

/// Run all configuration checks quietly (no output), returns the results.
pub fn run_quiet(config_path: &Path) -> Result<CheckResults> {
    let mut results = CheckResults::new();

    // 1. JSON Schema validation
    results.extend(validate_json_schemas(config_path)?);
    if results.has_errors() {
        // Files that fail their schema will not load; report what we have.
        return Ok(results);
    }

    // 2. Load configuration for cross-file checks
    let config =
        FormConfig::load_with_context(config_path).context("Failed to load configuration")?;

    // 3. Layouts, dependencies, access rules, tenancy
    results.extend(
        ConfigValidator::new()
            .validate_config(&config)
            .into_iter()
            .map(CheckFinding::from),
    );

    Ok(results)
}

/// Run all configuration checks.
pub fn run(config_path: &Path) -> Result<()> {
    println!("🔍 Checking Forma configuration...");
    println!();

    let results = run_quiet(config_path)?;
    results.print_summary();

    if results.has_errors() {
        anyhow::bail!(
            "Configuration check failed with {} error(s)",
            results.error_count()
        );
    }

    Ok(())
}

// ============================================================================
// JSON Schema Validation
// ============================================================================

fn validate_json_schemas(config_path: &Path) -> Result<Vec<CheckFinding>> {
    let mut findings = Vec::new();
    let schemas = load_embedded_schemas()?;

    let base_dir = config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    if let Some(schema) = schemas.get("FormaDefinition") {
        findings.extend(validate_yaml_against_schema(config_path, schema)?);
    }

    // The raw config tells us where the other files live.
    let config = match FormConfig::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            findings.push(
                CheckFinding::error("config", format!("Failed to load configuration: {}", e))
                    .with_file(config_path),
            );
            return Ok(findings);
        }
    };

    if let Some(schema) = schemas.get("FormLayout") {
        let mut layout_paths = Vec::new();
        if let Some(dir) = &config.layouts_dir {
            let dir = resolve_path(&base_dir, dir);
            if dir.is_dir() {
                layout_paths.extend(yaml_files_in(&dir)?);
            } else {
                findings.push(
                    CheckFinding::error("config", "Layouts directory not found")
                        .with_file(dir),
                );
            }
        }
        layout_paths.extend(config.layout_files.iter().map(|f| resolve_path(&base_dir, f)));

        for path in layout_paths {
            findings.extend(validate_yaml_against_schema(&path, schema)?);
        }
    }

    if let Some(schema) = schemas.get("FieldAccessRules")
        && let Some(rules_file) = &config.access_rules_file
    {
        findings.extend(validate_yaml_against_schema(
            &resolve_path(&base_dir, rules_file),
            schema,
        )?);
    }

    Ok(findings)
}

/// Load JSON schemas from embedded strings.
fn load_embedded_schemas() -> Result<HashMap<String, JsonValue>> {
    let mut schemas = HashMap::new();

    let embedded = [
        ("FormaDefinition", embedded_schemas::FORMA_DEFINITION),
        ("FormLayout", embedded_schemas::FORM_LAYOUT),
        ("FieldAccessRules", embedded_schemas::FIELD_ACCESS_RULES),
    ];

    for (name, content) in embedded {
        let schema: JsonValue = serde_json::from_str(content)
            .with_context(|| format!("Failed to parse embedded schema: {}", name))?;
        schemas.insert(name.to_string(), schema);
    }

    Ok(schemas)
}

fn validate_yaml_against_schema(yaml_path: &Path, schema: &JsonValue) -> Result<Vec<CheckFinding>> {
    let mut findings = Vec::new();

    let content = match fs::read_to_string(yaml_path) {
        Ok(c) => c,
        Err(e) => {
            findings.push(
                CheckFinding::error("json-schema", format!("Failed to read file: {}", e))
                    .with_file(yaml_path),
            );
            return Ok(findings);
        }
    };

    let yaml_value: JsonValue = match serde_yaml::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            findings.push(
                CheckFinding::error("json-schema", format!("Failed to parse YAML: {}", e))
                    .with_file(yaml_path),
            );
            return Ok(findings);
        }
    };

    let compiled = match jsonschema::validator_for(schema) {
        Ok(c) => c,
        Err(e) => {
            findings.push(CheckFinding::error(
                "json-schema",
                format!("Failed to compile JSON schema: {}", e),
            ));
            return Ok(findings);
        }
    };

    for error in compiled.iter_errors(&yaml_value) {
        let path_str = error.instance_path().to_string();
        let location = if path_str.is_empty() {
            "(root)".to_string()
        } else {
            path_str
        };

        findings.push(
            CheckFinding::error("json-schema", format!("{}", error))
                .with_file(yaml_path)
                .with_location(location),
        );
    }

    Ok(findings)
}
