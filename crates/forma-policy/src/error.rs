//! Error types for form resolution.
//!
//! Resolution recovers locally from every configuration problem except a
//! tenant mismatch, which aborts the single resolution call.

use std::fmt;

/// Kind of tenant-owned record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    FormLayout,
    FieldAccessRule,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::FormLayout => write!(f, "form layout"),
            RecordKind::FieldAccessRule => write!(f, "field access rule"),
        }
    }
}

/// Error type for resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A record handed to the engine belongs to another tenant.
    #[error(
        "Tenant scope violation: {record_kind} '{record_id}' belongs to tenant '{found}' but resolution is scoped to tenant '{expected}'"
    )]
    TenantScopeViolation {
        record_kind: RecordKind,
        record_id: String,
        expected: String,
        found: String,
    },

    /// Resolution was requested without a tenant.
    #[error("Tenant is required but was not provided in the resolution context")]
    MissingTenant,
}

impl ResolveError {
    /// Create a tenant scope violation error.
    pub fn tenant_scope_violation(
        record_kind: RecordKind,
        record_id: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TenantScopeViolation {
            record_kind,
            record_id: record_id.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn is_tenant_violation(&self) -> bool {
        matches!(self, Self::TenantScopeViolation { .. })
    }
}
