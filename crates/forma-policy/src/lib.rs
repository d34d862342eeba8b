//! Forma Form Resolution
//!
//! Given a screen context (tenant, role, screen type, entity kind and
//! category) and the current form data, selects the matching layout,
//! computes per-field view/edit permissions, and evaluates conditional
//! visibility. The engine is synchronous and performs no I/O: callers pass
//! a consistent snapshot of the tenant's layouts and access rules.
//!
//! # Modules
//!
//! - [`condition`] - dependency operator evaluation
//! - [`access`] - field access rule precedence
//! - [`layout`] - layout selection tiers
//! - [`resolver`] - orchestration into a [`ResolvedForm`](forma_core::ResolvedForm)
//! - [`tenant`] - tenant scope enforcement
//! - [`check`] - write-time configuration validation

pub mod access;
pub mod check;
pub mod condition;
pub mod error;
pub mod layout;
pub mod resolver;
pub mod tenant;

pub use access::{FieldAccess, FieldAccessResolver, RuleSpecificity, resolve_field_access};
pub use check::{ConfigFinding, ConfigValidator, Severity};
pub use condition::ConditionEvaluator;
pub use error::{RecordKind, ResolveError};
pub use layout::{LayoutSelection, LayoutSelector};
pub use resolver::{FormResolver, ResolveContext};
pub use tenant::{TenantOwned, TenantScope};
