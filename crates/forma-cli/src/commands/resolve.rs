//! `forma resolve` and `forma access` command implementations.
//!
//! Both load the project snapshot from `forma.yaml` and run the engine for
//! one role, printing the result as JSON on stdout.

use anyhow::{Context, Result, bail};
use forma_core::FormData;
use forma_core::config::FormConfig;
use forma_policy::{FormResolver, ResolveContext, resolve_field_access};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::TargetArgs;

/// Resolve the form for a role and print the rendering plan.
pub fn run_resolve(
    config_path: &Path,
    target: &TargetArgs,
    data: Option<&Path>,
    set: &[String],
    compact: bool,
) -> Result<()> {
    let config =
        FormConfig::load_with_context(config_path).context("Failed to load configuration")?;
    tracing::debug!(
        tenant_id = %config.tenant_id,
        layouts = config.layouts.len(),
        access_rules = config.access_rules.len(),
        "Loaded configuration"
    );

    let mut form_data = match data {
        Some(path) => load_form_data(path)?,
        None => FormData::new(),
    };
    for assignment in set {
        let (field, value) = parse_assignment(assignment)?;
        form_data.insert(field, value);
    }

    let ctx = ResolveContext {
        tenant_id: &config.tenant_id,
        role: &target.role,
        screen_type: target.screen,
        entity_kind: target.kind.as_deref(),
        entity_category: target.category.as_deref(),
        form_data: &form_data,
        candidate_layouts: &config.layouts,
        access_rules: &config.access_rules,
    };

    let form = FormResolver::new()
        .resolve(&ctx)
        .context("Failed to resolve form")?;

    print_json(&form, compact)
}

/// Print the effective permission of every ruled field for a role.
pub fn run_access(config_path: &Path, target: &TargetArgs) -> Result<()> {
    let config =
        FormConfig::load_with_context(config_path).context("Failed to load configuration")?;

    let permissions = resolve_field_access(
        &target.role,
        target.screen,
        target.kind.as_deref(),
        target.category.as_deref(),
        &config.access_rules,
    );

    print_json(&permissions, false)
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let output = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", output);
    Ok(())
}

/// Read form values from a JSON or YAML file. The document must be a map.
fn load_form_data(path: &Path) -> Result<FormData> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read form data: {}", path.display()))?;

    let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
    let value: Value = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON: {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML: {}", path.display()))?
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(FormData::new()),
        _ => bail!("Form data in {} must be a map of field values", path.display()),
    }
}

/// Parse `field=value`. The value is read as JSON when it parses, otherwise
/// it is taken as a plain string.
fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let Some((field, raw)) = assignment.split_once('=') else {
        bail!("Expected FIELD=VALUE, got '{}'", assignment);
    };
    let field = field.trim();
    if field.is_empty() {
        bail!("Missing field name in '{}'", assignment);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((field.to_string(), value))
}
