//! Tenant scope enforcement.
//!
//! The configuration store filters by tenant at the query boundary. The
//! engine re-checks every record it is handed and refuses to resolve when
//! one belongs to another tenant: a mismatch here means isolation already
//! failed upstream, so it is never filtered silently.

use crate::error::{RecordKind, ResolveError};
use forma_core::config::{FieldAccessRule, FormLayout};

/// A configuration record owned by a tenant.
pub trait TenantOwned {
    fn tenant_id(&self) -> &str;
    fn record_kind(&self) -> RecordKind;
    /// Identifier used in logs and errors.
    fn record_id(&self) -> String;
}

impl TenantOwned for FormLayout {
    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn record_kind(&self) -> RecordKind {
        RecordKind::FormLayout
    }

    fn record_id(&self) -> String {
        self.id.clone()
    }
}

impl TenantOwned for FieldAccessRule {
    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn record_kind(&self) -> RecordKind {
        RecordKind::FieldAccessRule
    }

    fn record_id(&self) -> String {
        format!("{}@{}", self.field_name, self.screen_type)
    }
}

/// Guards a resolution call against cross-tenant records.
#[derive(Debug, Clone, Copy)]
pub struct TenantScope<'a> {
    tenant_id: &'a str,
}

impl<'a> TenantScope<'a> {
    /// Create a scope. An empty tenant id is rejected.
    pub fn new(tenant_id: &'a str) -> Result<Self, ResolveError> {
        if tenant_id.trim().is_empty() {
            return Err(ResolveError::MissingTenant);
        }
        Ok(Self { tenant_id })
    }

    pub fn tenant_id(&self) -> &str {
        self.tenant_id
    }

    /// Whether a single record belongs to this scope.
    pub fn owns<T: TenantOwned + ?Sized>(&self, record: &T) -> bool {
        record.tenant_id() == self.tenant_id
    }

    /// Check every record, failing on the first foreign one.
    pub fn check<T: TenantOwned>(&self, records: &[T]) -> Result<(), ResolveError> {
        match records.iter().find(|r| !self.owns(*r)) {
            None => Ok(()),
            Some(record) => {
                tracing::error!(
                    expected_tenant = %self.tenant_id,
                    found_tenant = %record.tenant_id(),
                    record_kind = %record.record_kind(),
                    record_id = %record.record_id(),
                    "Tenant scope violation: refusing to resolve form"
                );
                Err(ResolveError::tenant_scope_violation(
                    record.record_kind(),
                    record.record_id(),
                    self.tenant_id,
                    record.tenant_id(),
                ))
            }
        }
    }
}
