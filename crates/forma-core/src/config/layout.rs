//! Form layout definitions.
//!
//! A layout is a named, tenant-owned arrangement of fields into ordered
//! sections for one screen type. Layouts may be narrowed to an entity kind
//! and/or category; those filters only drive selection, never rendering.
//!
//! # Layouts Location
//!
//! By convention, layouts are stored at `layouts/*.yaml` relative to the
//! project root (one file per layout).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use super::ConfigError;
use super::screen::ScreenType;

/// A tenant-owned form configuration for one screen type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormLayout {
    /// Opaque identifier. Also the deterministic tie-breaker (lowest wins).
    pub id: String,

    /// Owning tenant.
    pub tenant_id: String,

    /// Human-readable layout name.
    pub name: String,

    /// Screen type this layout targets.
    pub screen_type: ScreenType,

    /// Sections, rendered by ascending `order`.
    #[serde(default)]
    pub sections: Vec<SectionDefinition>,

    /// Entity kind filter (e.g. "AI_AGENT").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_kind: Option<String>,

    /// Entity category filter (e.g. "Analytics").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<String>,

    /// Conditional visibility, keyed by the dependent field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_dependencies: BTreeMap<String, FieldDependency>,

    /// Inactive layouts are never selected.
    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Default layout for its (screen_type, kind, category) combination.
    #[serde(default)]
    pub is_default: bool,
}

impl FormLayout {
    /// Load a layout from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a layout from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Whether the layout narrows itself to an entity kind or category.
    pub fn has_filters(&self) -> bool {
        self.entity_kind.is_some() || self.entity_category.is_some()
    }

    /// Field names in render order, first occurrence only.
    pub fn field_names(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.sections_in_order()
            .into_iter()
            .flat_map(|s| s.fields.iter())
            .filter(|f| seen.insert(f.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Whether any section references the field.
    pub fn contains_field(&self, field: &str) -> bool {
        self.sections
            .iter()
            .any(|s| s.fields.iter().any(|f| f == field))
    }

    /// Sections sorted by `order`. Equal orders keep their declared position.
    pub fn sections_in_order(&self) -> Vec<&SectionDefinition> {
        let mut sections: Vec<&SectionDefinition> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }

    /// Dependency declared for a field, if any.
    pub fn dependency_for(&self, field: &str) -> Option<&FieldDependency> {
        self.field_dependencies.get(field)
    }
}

/// An ordered group of fields within a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub id: String,

    pub title: String,

    /// Ascending render order, unique within a layout.
    #[serde(default)]
    pub order: i32,

    /// Field names in render order.
    #[serde(default)]
    pub fields: Vec<String>,
}

/// A conditional-visibility rule tying one field to another field's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDependency {
    /// Field whose current value is tested.
    pub depends_on: String,

    /// Comparison operator.
    pub condition: ConditionKind,

    /// Right-hand operand. Absent for `is_empty` / `is_not_empty`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FieldDependency {
    /// Build a dependency with a comparison value.
    pub fn new(depends_on: impl Into<String>, condition: ConditionKind, value: Value) -> Self {
        Self {
            depends_on: depends_on.into(),
            condition,
            value: Some(value),
        }
    }

    /// Build a dependency for a unary operator.
    pub fn unary(depends_on: impl Into<String>, condition: ConditionKind) -> Self {
        Self {
            depends_on: depends_on.into(),
            condition,
            value: None,
        }
    }
}

/// The fixed vocabulary of dependency operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

impl ConditionKind {
    /// Whether the operator needs a right-hand value.
    pub fn takes_value(&self) -> bool {
        !matches!(self, ConditionKind::IsEmpty | ConditionKind::IsNotEmpty)
    }

    /// Whether the operator compares numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ConditionKind::GreaterThan | ConditionKind::LessThan)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Equals => "equals",
            ConditionKind::NotEquals => "not_equals",
            ConditionKind::Contains => "contains",
            ConditionKind::NotContains => "not_contains",
            ConditionKind::GreaterThan => "greater_than",
            ConditionKind::LessThan => "less_than",
            ConditionKind::IsEmpty => "is_empty",
            ConditionKind::IsNotEmpty => "is_not_empty",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}
