//! Write-time configuration validation.
//!
//! Resolution tolerates bad configuration and falls back deterministically.
//! This module catches the same problems earlier, when a layout or rule is
//! saved, so they can be rejected instead of silently patched over:
//! - Layout structure (duplicate fields, sections, orders)
//! - Dependencies (dangling targets, cycles, multi-hop chains, operands)
//! - Default uniqueness per (screen type, kind, category)
//! - Access rule ties and grants that cannot take effect
//! - Tenant ownership of every record

use crate::access::FieldAccessResolver;
use crate::condition::as_number;
use crate::tenant::TenantOwned;
use forma_core::config::{FieldAccessRule, FormConfig, FormLayout, ScreenType};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Field names must be plain identifiers.
pub const FIELD_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Severity level for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational message.
    Info,
    /// Warning - may indicate a potential issue.
    Warning,
    /// Error - configuration must be rejected.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFinding {
    pub severity: Severity,
    /// Category of the check that produced this finding.
    pub category: String,
    pub message: String,
    /// Location within the configuration (e.g., "layout-1.field_dependencies.b").
    pub location: Option<String>,
}

impl ConfigFinding {
    pub fn error(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category: category.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn warning(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category: category.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Dependency cycles in a layout. Each cycle starts at its smallest field name.
pub fn dependency_cycles(layout: &FormLayout) -> Vec<Vec<String>> {
    let mut cycles = BTreeSet::new();

    for start in layout.field_dependencies.keys() {
        let mut path: Vec<&str> = Vec::new();
        let mut current = start.as_str();
        loop {
            if let Some(pos) = path.iter().position(|f| *f == current) {
                let mut cycle: Vec<String> = path[pos..].iter().map(|f| f.to_string()).collect();
                if let Some(min) = cycle
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.cmp(b.1))
                    .map(|(i, _)| i)
                {
                    cycle.rotate_left(min);
                }
                cycles.insert(cycle);
                break;
            }
            path.push(current);
            match layout.field_dependencies.get(current) {
                Some(dep) => current = dep.depends_on.as_str(),
                None => break,
            }
        }
    }

    cycles.into_iter().collect()
}

/// Dependencies whose target has a dependency of its own, as (field, via).
/// Fields that sit on a cycle are reported by [`dependency_cycles`] instead.
pub fn dependency_chains(layout: &FormLayout) -> Vec<(String, String)> {
    let on_cycle: BTreeSet<String> = dependency_cycles(layout).into_iter().flatten().collect();

    layout
        .field_dependencies
        .iter()
        .filter(|(field, dep)| {
            !on_cycle.contains(field.as_str())
                && layout.field_dependencies.contains_key(&dep.depends_on)
        })
        .map(|(field, dep)| (field.clone(), dep.depends_on.clone()))
        .collect()
}

/// Field names that appear more than once across a layout's sections.
pub fn duplicate_fields(layout: &FormLayout) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for field in layout.sections.iter().flat_map(|s| s.fields.iter()) {
        if !seen.insert(field.as_str()) {
            duplicates.insert(field.clone());
        }
    }
    duplicates.into_iter().collect()
}

/// Section order values used by more than one section.
pub fn duplicate_section_orders(layout: &FormLayout) -> Vec<i32> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for section in &layout.sections {
        *counts.entry(section.order).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(order, _)| order)
        .collect()
}

/// Validates form configuration before it is stored.
pub struct ConfigValidator {
    field_name_pattern: Option<Regex>,
}

impl ConfigValidator {
    /// Create a new config validator.
    pub fn new() -> Self {
        let field_name_pattern = match Regex::new(FIELD_NAME_PATTERN) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("Invalid field name pattern {}: {}", FIELD_NAME_PATTERN, e);
                None
            }
        };
        Self { field_name_pattern }
    }

    /// Validate a whole configuration snapshot.
    pub fn validate_config(&self, config: &FormConfig) -> Vec<ConfigFinding> {
        let mut findings = Vec::new();
        findings.extend(self.validate_tenancy(
            &config.tenant_id,
            &config.layouts,
            &config.access_rules,
        ));
        findings.extend(self.validate_layouts(&config.layouts));
        findings.extend(self.validate_rules(&config.access_rules));
        findings
    }

    /// Every record must belong to the project tenant.
    pub fn validate_tenancy(
        &self,
        tenant_id: &str,
        layouts: &[FormLayout],
        rules: &[FieldAccessRule],
    ) -> Vec<ConfigFinding> {
        let mut findings = Vec::new();
        let foreign_layouts = layouts.iter().filter(|l| l.tenant_id != tenant_id);
        for layout in foreign_layouts {
            findings.push(foreign_record(tenant_id, layout));
        }
        let foreign_rules = rules.iter().filter(|r| r.tenant_id != tenant_id);
        for rule in foreign_rules {
            findings.push(foreign_record(tenant_id, rule));
        }
        findings
    }

    /// Validate a set of layouts, including cross-layout invariants.
    pub fn validate_layouts(&self, layouts: &[FormLayout]) -> Vec<ConfigFinding> {
        let mut findings = Vec::new();

        let mut ids = BTreeSet::new();
        for layout in layouts {
            if !ids.insert(layout.id.as_str()) {
                findings.push(
                    ConfigFinding::error("layout", format!("Duplicate layout id '{}'", layout.id))
                        .with_location(layout.id.clone()),
                );
            }
            findings.extend(self.validate_layout(layout));
        }

        // At most one default per (tenant, screen type, kind, category).
        let mut defaults: BTreeMap<(&str, ScreenType, Option<&str>, Option<&str>), Vec<&str>> =
            BTreeMap::new();
        for layout in layouts.iter().filter(|l| l.is_default && l.is_active) {
            defaults
                .entry((
                    layout.tenant_id.as_str(),
                    layout.screen_type,
                    layout.entity_kind.as_deref(),
                    layout.entity_category.as_deref(),
                ))
                .or_default()
                .push(layout.id.as_str());
        }
        for ((_, screen_type, kind, category), ids) in defaults {
            if ids.len() > 1 {
                findings.push(ConfigFinding::error(
                    "default-layout",
                    format!(
                        "Layouts {:?} are all marked default for screen '{}' (kind: {}, category: {})",
                        ids,
                        screen_type,
                        kind.unwrap_or("-"),
                        category.unwrap_or("-")
                    ),
                ));
            }
        }

        findings
    }

    /// Validate the structure and dependencies of one layout.
    pub fn validate_layout(&self, layout: &FormLayout) -> Vec<ConfigFinding> {
        let mut findings = Vec::new();
        let id = layout.id.as_str();

        let mut section_ids = BTreeSet::new();
        for section in &layout.sections {
            if !section_ids.insert(section.id.as_str()) {
                findings.push(
                    ConfigFinding::error(
                        "section",
                        format!("Duplicate section id '{}'", section.id),
                    )
                    .with_location(format!("{}.sections.{}", id, section.id)),
                );
            }
        }
        for order in duplicate_section_orders(layout) {
            findings.push(
                ConfigFinding::error("section", format!("Several sections use order {}", order))
                    .with_location(format!("{}.sections", id)),
            );
        }

        for field in duplicate_fields(layout) {
            findings.push(
                ConfigFinding::error(
                    "field",
                    format!("Field '{}' appears more than once in the layout", field),
                )
                .with_location(format!("{}.sections", id)),
            );
        }

        if let Some(re) = &self.field_name_pattern {
            for field in layout.field_names() {
                if !re.is_match(field) {
                    findings.push(
                        ConfigFinding::warning(
                            "field",
                            format!("Field name '{}' does not match {}", field, FIELD_NAME_PATTERN),
                        )
                        .with_location(format!("{}.sections", id)),
                    );
                }
            }
        }

        for (field, dep) in &layout.field_dependencies {
            let location = format!("{}.field_dependencies.{}", id, field);

            if !layout.contains_field(field) {
                findings.push(
                    ConfigFinding::warning(
                        "dependency",
                        format!(
                            "Dependency declared for field '{}' which is not in the layout",
                            field
                        ),
                    )
                    .with_location(location.clone()),
                );
            }
            if !layout.contains_field(&dep.depends_on) {
                findings.push(
                    ConfigFinding::error(
                        "dependency",
                        format!(
                            "Field '{}' depends on '{}' which is not in the layout",
                            field, dep.depends_on
                        ),
                    )
                    .with_location(location.clone()),
                );
            }

            match (&dep.value, dep.condition.takes_value()) {
                (None, true) => findings.push(
                    ConfigFinding::error(
                        "dependency",
                        format!("Condition '{}' requires a value", dep.condition),
                    )
                    .with_location(location.clone()),
                ),
                (Some(_), false) => findings.push(
                    ConfigFinding::warning(
                        "dependency",
                        format!("Condition '{}' ignores its value", dep.condition),
                    )
                    .with_location(location.clone()),
                ),
                (Some(value), true) if dep.condition.is_numeric() && as_number(value).is_none() => {
                    findings.push(
                        ConfigFinding::error(
                            "dependency",
                            format!(
                                "Condition '{}' needs a numeric value, got {}",
                                dep.condition, value
                            ),
                        )
                        .with_location(location.clone()),
                    )
                }
                _ => {}
            }
        }

        for cycle in dependency_cycles(layout) {
            findings.push(
                ConfigFinding::error(
                    "dependency",
                    format!("Dependency cycle: {}", cycle.join(" -> ")),
                )
                .with_location(format!("{}.field_dependencies", id)),
            );
        }
        for (field, via) in dependency_chains(layout) {
            findings.push(
                ConfigFinding::error(
                    "dependency",
                    format!(
                        "Field '{}' depends on '{}' which has its own dependency; only one hop is supported",
                        field, via
                    ),
                )
                .with_location(format!("{}.field_dependencies.{}", id, field)),
            );
        }

        findings
    }

    /// Validate access rules.
    pub fn validate_rules(&self, rules: &[FieldAccessRule]) -> Vec<ConfigFinding> {
        let mut findings = Vec::new();

        for rule in rules {
            for (role, perm) in &rule.role_permissions {
                if perm.edit && !perm.view {
                    findings.push(
                        ConfigFinding::warning(
                            "access-rule",
                            format!(
                                "Role '{}' is granted edit without view on '{}'; edit will be ignored",
                                role, rule.field_name
                            ),
                        )
                        .with_location(rule.record_id()),
                    );
                }
            }
        }

        // Rules at the same specificity for the same field tie at resolution time.
        let mut groups: BTreeMap<(&str, ScreenType, Option<&str>, Option<&str>), usize> =
            BTreeMap::new();
        for rule in rules {
            *groups
                .entry((
                    rule.field_name.as_str(),
                    rule.screen_type,
                    rule.entity_kind.as_deref(),
                    rule.entity_category.as_deref(),
                ))
                .or_default() += 1;
        }
        for ((field, screen_type, kind, category), count) in groups {
            if count > 1 {
                let resolver = FieldAccessResolver::new(rules, screen_type, kind, category);
                let winner = resolver
                    .winning_rule(field)
                    .and_then(|(rule, _, _)| rule.defined_at.map(|t| t.to_rfc3339()))
                    .unwrap_or_else(|| "last listed".to_string());
                findings.push(
                    ConfigFinding::warning(
                        "access-rule",
                        format!(
                            "{} rules for field '{}' on screen '{}' tie at the same specificity; the most recent ({}) wins",
                            count, field, screen_type, winner
                        ),
                    )
                    .with_location(format!("{}@{}", field, screen_type)),
                );
            }
        }

        findings
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn foreign_record<T: TenantOwned>(tenant_id: &str, record: &T) -> ConfigFinding {
    ConfigFinding::error(
        "tenancy",
        format!(
            "{} '{}' belongs to tenant '{}' but the configuration is for tenant '{}'",
            record.record_kind(),
            record.record_id(),
            record.tenant_id(),
            tenant_id
        ),
    )
    .with_location(record.record_id())
}
