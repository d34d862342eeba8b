//! Form resolution.
//!
//! The `FormResolver` is the primary entry point. It composes the other
//! components into a single rendering plan:
//!
//! 1. **Tenant scope** - every candidate layout and access rule is checked
//! 2. **Layout selection** - the most specific active layout for the screen
//! 3. **Field access** - view/edit permission per field for the role
//! 4. **Dependencies** - conditional visibility against the current form data
//!
//! Fields the role may not view are omitted entirely, never sent as hidden.
//! A field's own visibility is its view permission plus its own condition.
//! A dependent field is shown only when it is visible on its own and the
//! field it depends on is visible on its own. That single hop is the only
//! propagation.

use crate::access::{FieldAccess, FieldAccessResolver};
use crate::check::{
    dependency_chains, dependency_cycles, duplicate_fields, duplicate_section_orders,
};
use crate::condition::ConditionEvaluator;
use crate::error::ResolveError;
use crate::layout::LayoutSelector;
use crate::tenant::TenantScope;
use forma_core::FormData;
use forma_core::config::{FieldAccessRule, FormLayout, ScreenType};
use forma_core::resolved::{
    ConfigurationAmbiguity, DependencyState, ResolvedField, ResolvedForm, ResolvedLayout,
    ResolvedSection,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Everything a single resolution needs. Layouts and rules must be one
/// consistent snapshot for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// The caller's tenant.
    pub tenant_id: &'a str,
    /// The requesting role.
    pub role: &'a str,
    pub screen_type: ScreenType,
    pub entity_kind: Option<&'a str>,
    pub entity_category: Option<&'a str>,
    /// Current field values.
    pub form_data: &'a FormData,
    /// Tenant-scoped layouts for the screen.
    pub candidate_layouts: &'a [FormLayout],
    /// Tenant-scoped access rules.
    pub access_rules: &'a [FieldAccessRule],
}

/// Resolves role- and data-aware forms.
///
/// Holds no state between calls, so one instance can be shared across
/// threads. Re-resolve whenever the form data changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormResolver {
    evaluator: ConditionEvaluator,
}

impl FormResolver {
    pub fn new() -> Self {
        Self {
            evaluator: ConditionEvaluator::new(),
        }
    }

    /// Resolve a form.
    ///
    /// Returns `ResolvedForm::UseDefaultFields` when no layout is configured
    /// for the screen. Fails only on a tenant scope violation.
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<ResolvedForm, ResolveError> {
        // 1. Tenant scope
        let scope = TenantScope::new(ctx.tenant_id)?;
        scope.check(ctx.candidate_layouts)?;
        scope.check(ctx.access_rules)?;

        // 2. Layout selection
        let Some(selection) = LayoutSelector::new(ctx.candidate_layouts).select(
            ctx.screen_type,
            ctx.entity_kind,
            ctx.entity_category,
        ) else {
            return Ok(ResolvedForm::UseDefaultFields);
        };
        let layout = selection.layout;

        let mut ambiguities: Vec<ConfigurationAmbiguity> = Vec::new();
        ambiguities.extend(selection.ambiguity);
        ambiguities.extend(self.structural_ambiguities(layout));

        // 3. Field access, once per unique field
        let access = FieldAccessResolver::new(
            ctx.access_rules,
            ctx.screen_type,
            ctx.entity_kind,
            ctx.entity_category,
        );
        let mut permissions: BTreeMap<&str, FieldAccess> = BTreeMap::new();
        for field in layout.field_names() {
            let field_access = access.resolve_field(ctx.role, field);
            ambiguities.extend(field_access.ambiguity.clone());
            permissions.insert(field, field_access);
        }

        // 4. Own visibility: permission plus the field's own condition
        let mut own_visible: BTreeMap<&str, bool> = BTreeMap::new();
        for (&field, field_access) in &permissions {
            let condition_holds = layout
                .dependency_for(field)
                .map(|dep| self.evaluator.evaluate_dependency(dep, ctx.form_data))
                .unwrap_or(true);
            own_visible.insert(field, field_access.permission.view && condition_holds);
        }

        // 5. One hop of propagation and assembly
        let mut emitted = BTreeSet::new();
        let mut sections = Vec::new();
        for section in layout.sections_in_order() {
            let mut fields = Vec::new();
            for name in &section.fields {
                if !emitted.insert(name.as_str()) {
                    continue;
                }
                let Some(field_access) = permissions.get(name.as_str()) else {
                    continue;
                };
                if !own_visible.get(name.as_str()).copied().unwrap_or(false) {
                    continue;
                }

                let dependency = match layout.dependency_for(name) {
                    None => None,
                    Some(dep) => {
                        // Targets outside the layout only need to be viewable.
                        let target_visible = match own_visible.get(dep.depends_on.as_str()) {
                            Some(visible) => *visible,
                            None => access.resolve_field(ctx.role, &dep.depends_on).permission.view,
                        };
                        if !target_visible {
                            continue;
                        }
                        Some(DependencyState {
                            depends_on: dep.depends_on.clone(),
                            condition: dep.condition,
                        })
                    }
                };

                fields.push(ResolvedField {
                    name: name.clone(),
                    visible: true,
                    editable: field_access.permission.edit,
                    current_value: ctx.form_data.get(name).cloned().unwrap_or(Value::Null),
                    source: field_access.source,
                    dependency,
                });
            }

            if !fields.is_empty() {
                sections.push(ResolvedSection {
                    id: section.id.clone(),
                    title: section.title.clone(),
                    order: section.order,
                    fields,
                });
            }
        }

        tracing::debug!(
            tenant_id = %ctx.tenant_id,
            role = %ctx.role,
            layout_id = %layout.id,
            sections = sections.len(),
            ambiguities = ambiguities.len(),
            "Resolved form"
        );

        Ok(ResolvedForm::Layout(ResolvedLayout {
            layout_id: layout.id.clone(),
            layout_name: layout.name.clone(),
            screen_type: layout.screen_type,
            match_tier: selection.tier,
            sections,
            ambiguities,
        }))
    }

    /// Configuration problems in the selected layout, logged as they are found.
    fn structural_ambiguities(&self, layout: &FormLayout) -> Vec<ConfigurationAmbiguity> {
        let mut found = Vec::new();

        for field in duplicate_fields(layout) {
            found.push(ConfigurationAmbiguity::DuplicateField { field });
        }
        for order in duplicate_section_orders(layout) {
            found.push(ConfigurationAmbiguity::DuplicateSectionOrder { order });
        }
        for (field, dep) in &layout.field_dependencies {
            if !layout.contains_field(&dep.depends_on) {
                found.push(ConfigurationAmbiguity::DanglingDependency {
                    field: field.clone(),
                    depends_on: dep.depends_on.clone(),
                });
            }
        }
        for fields in dependency_cycles(layout) {
            found.push(ConfigurationAmbiguity::DependencyCycle { fields });
        }
        for (field, via) in dependency_chains(layout) {
            found.push(ConfigurationAmbiguity::DependencyChain { field, via });
        }

        for ambiguity in &found {
            tracing::warn!(
                layout_id = %layout.id,
                ambiguity = ?ambiguity,
                "Configuration ambiguity in form layout"
            );
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_core::config::{ConditionKind, FieldDependency, SectionDefinition};
    use forma_core::resolved::MatchTier;
    use serde_json::json;

    fn section(id: &str, order: i32, fields: &[&str]) -> SectionDefinition {
        SectionDefinition {
            id: id.to_string(),
            title: id.to_uppercase(),
            order,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn layout(sections: Vec<SectionDefinition>) -> FormLayout {
        FormLayout {
            id: "layout-1".to_string(),
            tenant_id: "acme".to_string(),
            name: "Submission".to_string(),
            screen_type: ScreenType::Submission,
            sections,
            entity_kind: None,
            entity_category: None,
            field_dependencies: Default::default(),
            is_active: true,
            is_default: true,
        }
    }

    fn ctx<'a>(
        role: &'a str,
        data: &'a FormData,
        layouts: &'a [FormLayout],
        rules: &'a [FieldAccessRule],
    ) -> ResolveContext<'a> {
        ResolveContext {
            tenant_id: "acme",
            role,
            screen_type: ScreenType::Submission,
            entity_kind: None,
            entity_category: None,
            form_data: data,
            candidate_layouts: layouts,
            access_rules: rules,
        }
    }

    #[test]
    fn test_no_layout_uses_default_fields() {
        let data = FormData::new();
        let form = FormResolver::new()
            .resolve(&ctx("submitter", &data, &[], &[]))
            .unwrap();
        assert_eq!(form, ResolvedForm::UseDefaultFields);
    }

    #[test]
    fn test_sections_sorted_and_values_attached() {
        let layouts = vec![layout(vec![
            section("details", 2, &["description"]),
            section("basics", 1, &["name", "owner"]),
        ])];
        let mut data = FormData::new();
        data.insert("name".to_string(), json!("Atlas"));

        let form = FormResolver::new()
            .resolve(&ctx("submitter", &data, &layouts, &[]))
            .unwrap();
        let resolved = form.layout().unwrap();
        assert_eq!(resolved.match_tier, MatchTier::Default);

        let ids: Vec<_> = resolved.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["basics", "details"]);
        let name = form.field("name").unwrap();
        assert_eq!(name.current_value, json!("Atlas"));
        assert!(name.visible);
        assert!(!name.editable);
        assert_eq!(form.field("owner").unwrap().current_value, Value::Null);
    }

    #[test]
    fn test_hidden_fields_are_omitted_and_empty_sections_dropped() {
        let layouts = vec![layout(vec![
            section("basics", 1, &["name"]),
            section("internal", 2, &["internal_notes"]),
        ])];
        let rules = vec![
            FieldAccessRule::new("acme", "internal_notes", ScreenType::Submission)
                .grant("approver", true, true),
            FieldAccessRule::new("acme", "name", ScreenType::Submission)
                .grant("submitter", true, true),
        ];
        let data = FormData::new();

        let form = FormResolver::new()
            .resolve(&ctx("submitter", &data, &layouts, &rules))
            .unwrap();
        let resolved = form.layout().unwrap();
        assert_eq!(resolved.sections.len(), 1);
        assert!(form.field("internal_notes").is_none());
        assert_eq!(resolved.editable_fields(), vec!["name"]);
    }

    #[test]
    fn test_dependency_on_hidden_field_hides_dependent() {
        let mut l = layout(vec![section("main", 1, &["deployment_type", "cloud_provider"])]);
        l.field_dependencies.insert(
            "cloud_provider".to_string(),
            FieldDependency::new("deployment_type", ConditionKind::Equals, json!("cloud")),
        );
        let layouts = vec![l];
        let rules = vec![
            FieldAccessRule::new("acme", "deployment_type", ScreenType::Submission)
                .grant("approver", true, false),
        ];
        let mut data = FormData::new();
        data.insert("deployment_type".to_string(), json!("cloud"));

        let resolver = FormResolver::new();
        let hidden = resolver.resolve(&ctx("submitter", &data, &layouts, &rules)).unwrap();
        assert!(hidden.field("deployment_type").is_none());
        assert!(hidden.field("cloud_provider").is_none());

        let shown = resolver.resolve(&ctx("approver", &data, &layouts, &rules)).unwrap();
        let field = shown.field("cloud_provider").unwrap();
        assert_eq!(
            field.dependency,
            Some(DependencyState {
                depends_on: "deployment_type".to_string(),
                condition: ConditionKind::Equals,
            })
        );
    }

    #[test]
    fn test_dependent_of_condition_hidden_field_is_hidden() {
        let mut l = layout(vec![section("main", 1, &["x", "a", "b"])]);
        l.field_dependencies.insert(
            "a".to_string(),
            FieldDependency::new("x", ConditionKind::Equals, json!("yes")),
        );
        l.field_dependencies.insert(
            "b".to_string(),
            FieldDependency::unary("a", ConditionKind::IsEmpty),
        );
        let layouts = vec![l];
        let resolver = FormResolver::new();

        let mut data = FormData::new();
        data.insert("x".to_string(), json!("no"));
        let form = resolver.resolve(&ctx("submitter", &data, &layouts, &[])).unwrap();
        assert!(form.field("x").is_some());
        assert!(form.field("a").is_none());
        assert!(form.field("b").is_none());

        data.insert("x".to_string(), json!("yes"));
        let form = resolver.resolve(&ctx("submitter", &data, &layouts, &[])).unwrap();
        assert!(form.field("a").is_some());
        assert!(form.field("b").is_some());
    }

    #[test]
    fn test_resolver_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FormResolver>();
        assert_send_sync::<ResolveContext<'static>>();
    }

    #[test]
    fn test_cycle_resolves_without_looping() {
        let mut l = layout(vec![section("main", 1, &["a", "b"])]);
        l.field_dependencies.insert(
            "a".to_string(),
            FieldDependency::unary("b", ConditionKind::IsNotEmpty),
        );
        l.field_dependencies.insert(
            "b".to_string(),
            FieldDependency::unary("a", ConditionKind::IsEmpty),
        );
        let layouts = vec![l];
        let mut data = FormData::new();
        data.insert("b".to_string(), json!("set"));

        let form = FormResolver::new()
            .resolve(&ctx("submitter", &data, &layouts, &[]))
            .unwrap();
        let resolved = form.layout().unwrap();
        assert!(form.field("a").is_some());
        assert!(form.field("b").is_some());
        assert!(resolved.ambiguities.contains(&ConfigurationAmbiguity::DependencyCycle {
            fields: vec!["a".to_string(), "b".to_string()],
        }));
    }

    #[test]
    fn test_duplicate_field_emitted_once() {
        let layouts = vec![layout(vec![
            section("one", 1, &["name"]),
            section("two", 2, &["name", "email"]),
        ])];
        let data = FormData::new();
        let form = FormResolver::new()
            .resolve(&ctx("submitter", &data, &layouts, &[]))
            .unwrap();
        let resolved = form.layout().unwrap();
        assert_eq!(resolved.fields().filter(|f| f.name == "name").count(), 1);
        assert_eq!(resolved.sections[1].fields.len(), 1);
        assert!(resolved.ambiguities.contains(&ConfigurationAmbiguity::DuplicateField {
            field: "name".to_string(),
        }));
    }

    #[test]
    fn test_foreign_rule_aborts_resolution() {
        let layouts = vec![layout(vec![section("main", 1, &["name"])])];
        let rules = vec![FieldAccessRule::new("globex", "name", ScreenType::Submission)];
        let data = FormData::new();
        let err = FormResolver::new()
            .resolve(&ctx("submitter", &data, &layouts, &rules))
            .unwrap_err();
        assert!(err.is_tenant_violation());
    }
}
