//! Resolved form output types.
//!
//! A `ResolvedForm` is built fresh on every resolution and never persisted.
//! Every collection here is ordered so that resolving the same input twice
//! serializes to identical bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ConditionKind, FieldSource, ScreenType};

/// Result of resolving a form for one rendering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedForm {
    /// No layout is configured for the screen; render the standard field set.
    UseDefaultFields,
    /// A configured layout, filtered for the role and current data.
    Layout(ResolvedLayout),
}

impl ResolvedForm {
    /// The resolved layout, unless the default field set applies.
    pub fn layout(&self) -> Option<&ResolvedLayout> {
        match self {
            ResolvedForm::UseDefaultFields => None,
            ResolvedForm::Layout(layout) => Some(layout),
        }
    }

    pub fn uses_default_fields(&self) -> bool {
        matches!(self, ResolvedForm::UseDefaultFields)
    }

    /// Find an emitted field by name.
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.layout().and_then(|l| l.field(name))
    }
}

/// How specifically the selected layout matched the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Entity kind and category both set and both match.
    KindAndCategory,
    /// Entity kind matches, category unset on the layout.
    KindOnly,
    /// Entity category matches, kind unset on the layout.
    CategoryOnly,
    /// Unfiltered layout marked as default.
    Default,
    /// Any other active layout for the screen type.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLayout {
    pub layout_id: String,
    pub layout_name: String,
    pub screen_type: ScreenType,
    pub match_tier: MatchTier,
    pub sections: Vec<ResolvedSection>,
    /// Configuration problems recovered from while resolving.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ambiguities: Vec<ConfigurationAmbiguity>,
}

impl ResolvedLayout {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields().find(|f| f.name == name)
    }

    /// All emitted fields in render order.
    pub fn fields(&self) -> impl Iterator<Item = &ResolvedField> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Names of emitted fields the role may edit.
    pub fn editable_fields(&self) -> Vec<&str> {
        self.fields()
            .filter(|f| f.editable)
            .map(|f| f.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSection {
    pub id: String,
    pub title: String,
    pub order: i32,
    pub fields: Vec<ResolvedField>,
}

/// A field in the rendering plan.
///
/// Only fields that are shown are emitted, so `visible` is always true and
/// an attached `dependency` is always satisfied. Hidden fields never appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub name: String,
    pub visible: bool,
    pub editable: bool,
    /// Value from the form data, `null` when absent.
    pub current_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<FieldSource>,
    /// Present when the field's visibility is conditional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<DependencyState>,
}

/// The dependency a rendered field carries. Renderers use it to know which
/// field changes require re-resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyState {
    pub depends_on: String,
    pub condition: ConditionKind,
}

/// A configuration problem resolved deterministically instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigurationAmbiguity {
    /// Several layouts matched at the same tier.
    LayoutTie {
        tier: MatchTier,
        chosen: String,
        others: Vec<String>,
    },
    /// Several access rules for one field matched at the same specificity.
    AccessRuleTie { field: String, candidates: usize },
    /// Dependencies form a cycle.
    DependencyCycle { fields: Vec<String> },
    /// A dependency targets a field that itself has a dependency.
    DependencyChain { field: String, via: String },
    /// A dependency targets a field missing from the layout.
    DanglingDependency { field: String, depends_on: String },
    /// A field appears more than once in the layout.
    DuplicateField { field: String },
    /// Two sections share an order value.
    DuplicateSectionOrder { order: i32 },
}
