//! Field access rule types.
//!
//! A rule maps roles to view/edit permissions for a single field within a
//! screen type, optionally narrowed by entity kind and/or category.
//!
//! # Rules Location
//!
//! By convention, rules are stored in `access.yaml` relative to the project
//! root as a YAML list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::ConfigError;
use super::screen::ScreenType;

/// Per-role permissions for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPermission {
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub edit: bool,
}

impl FieldPermission {
    /// Applied when no rule matches a field at all.
    pub const DEFAULT: FieldPermission = FieldPermission {
        view: true,
        edit: false,
    };

    /// Applied when the winning rule does not mention the role.
    pub const DENIED: FieldPermission = FieldPermission {
        view: false,
        edit: false,
    };

    pub fn new(view: bool, edit: bool) -> Self {
        Self { view, edit }
    }

    /// Edit without view is not grantable.
    pub fn normalized(self) -> Self {
        Self {
            view: self.view,
            edit: self.view && self.edit,
        }
    }
}

/// Where a field comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Field declared by a tenant requirement definition.
    RequirementDefined,
    /// Field intrinsic to the entity record.
    EntityIntrinsic,
}

/// Role-to-permission mapping for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAccessRule {
    /// Owning tenant.
    pub tenant_id: String,

    /// Field the rule applies to.
    pub field_name: String,

    /// Field provenance.
    #[serde(default = "default_field_source")]
    pub field_source: FieldSource,

    /// Screen type the rule applies to.
    pub screen_type: ScreenType,

    /// Permissions keyed by role name.
    #[serde(default)]
    pub role_permissions: BTreeMap<String, FieldPermission>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<String>,

    /// When the rule was last defined. Later wins among equally specific rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defined_at: Option<DateTime<Utc>>,
}

impl FieldAccessRule {
    /// Build an unfiltered rule with no role grants.
    pub fn new(
        tenant_id: impl Into<String>,
        field_name: impl Into<String>,
        screen_type: ScreenType,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            field_name: field_name.into(),
            field_source: default_field_source(),
            screen_type,
            role_permissions: BTreeMap::new(),
            entity_kind: None,
            entity_category: None,
            defined_at: None,
        }
    }

    /// Grant a role permissions on this rule.
    pub fn grant(mut self, role: impl Into<String>, view: bool, edit: bool) -> Self {
        self.role_permissions
            .insert(role.into(), FieldPermission::new(view, edit));
        self
    }

    /// Narrow the rule to an entity kind.
    pub fn for_kind(mut self, kind: impl Into<String>) -> Self {
        self.entity_kind = Some(kind.into());
        self
    }

    /// Narrow the rule to an entity category.
    pub fn for_category(mut self, category: impl Into<String>) -> Self {
        self.entity_category = Some(category.into());
        self
    }

    /// Permission granted to a role, if the rule mentions it.
    pub fn permission_for(&self, role: &str) -> Option<FieldPermission> {
        self.role_permissions.get(role).map(|p| p.normalized())
    }

    /// Load a list of rules from a YAML file.
    pub fn list_from_file(path: impl AsRef<Path>) -> Result<Vec<Self>, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::list_from_yaml(&content)
    }

    /// Parse a list of rules from YAML content.
    pub fn list_from_yaml(content: &str) -> Result<Vec<Self>, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }
}

fn default_field_source() -> FieldSource {
    FieldSource::EntityIntrinsic
}
