//! Field-level access resolution.
//!
//! For each field the single most specific matching rule wins:
//! 1. screen type + entity kind + entity category
//! 2. screen type + entity kind
//! 3. screen type + entity category
//! 4. screen type only
//!
//! With no matching rule the field is viewable but not editable. A winning
//! rule that does not mention the role denies both view and edit.

use forma_core::config::{FieldAccessRule, FieldPermission, FieldSource, ScreenType};
use forma_core::resolved::ConfigurationAmbiguity;
use std::collections::{BTreeMap, BTreeSet};

/// How narrowly a rule matched the request. Later variants are more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleSpecificity {
    ScreenOnly,
    CategoryOnly,
    KindOnly,
    KindAndCategory,
}

/// Effective access to one field for one role.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccess {
    pub permission: FieldPermission,
    /// Provenance of the field, taken from the winning rule.
    pub source: Option<FieldSource>,
    /// Specificity of the winning rule, `None` when no rule matched.
    pub specificity: Option<RuleSpecificity>,
    /// Set when several rules tied at the winning specificity.
    pub ambiguity: Option<ConfigurationAmbiguity>,
}

/// Resolves field permissions from a tenant's rules for one screen context.
pub struct FieldAccessResolver<'a> {
    rules: &'a [FieldAccessRule],
    screen_type: ScreenType,
    entity_kind: Option<&'a str>,
    entity_category: Option<&'a str>,
}

impl<'a> FieldAccessResolver<'a> {
    /// Create a resolver for a screen context.
    pub fn new(
        rules: &'a [FieldAccessRule],
        screen_type: ScreenType,
        entity_kind: Option<&'a str>,
        entity_category: Option<&'a str>,
    ) -> Self {
        Self {
            rules,
            screen_type,
            entity_kind,
            entity_category,
        }
    }

    /// How the rule matches this context, or `None` if it does not apply.
    pub fn specificity(&self, rule: &FieldAccessRule) -> Option<RuleSpecificity> {
        if rule.screen_type != self.screen_type {
            return None;
        }
        let kind = match rule.entity_kind.as_deref() {
            None => false,
            Some(k) if Some(k) == self.entity_kind => true,
            Some(_) => return None,
        };
        let category = match rule.entity_category.as_deref() {
            None => false,
            Some(c) if Some(c) == self.entity_category => true,
            Some(_) => return None,
        };
        Some(match (kind, category) {
            (true, true) => RuleSpecificity::KindAndCategory,
            (true, false) => RuleSpecificity::KindOnly,
            (false, true) => RuleSpecificity::CategoryOnly,
            (false, false) => RuleSpecificity::ScreenOnly,
        })
    }

    /// The winning rule for a field and how many rules tied with it.
    ///
    /// Ties go to the most recently defined rule: the latest `defined_at`,
    /// then the latest position in the snapshot.
    pub fn winning_rule(
        &self,
        field: &str,
    ) -> Option<(&'a FieldAccessRule, RuleSpecificity, usize)> {
        let mut best: Option<(usize, &'a FieldAccessRule, RuleSpecificity)> = None;
        let mut tied = 0;

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.field_name != field {
                continue;
            }
            let Some(spec) = self.specificity(rule) else {
                continue;
            };
            match best {
                Some((_, _, best_spec)) if spec < best_spec => {}
                Some((best_index, best_rule, best_spec)) if spec == best_spec => {
                    tied += 1;
                    if (rule.defined_at, index) > (best_rule.defined_at, best_index) {
                        best = Some((index, rule, spec));
                    }
                }
                _ => {
                    best = Some((index, rule, spec));
                    tied = 1;
                }
            }
        }

        best.map(|(_, rule, spec)| (rule, spec, tied))
    }

    /// Resolve access to one field for a role.
    pub fn resolve_field(&self, role: &str, field: &str) -> FieldAccess {
        let Some((rule, specificity, tied)) = self.winning_rule(field) else {
            return FieldAccess {
                permission: FieldPermission::DEFAULT,
                source: None,
                specificity: None,
                ambiguity: None,
            };
        };

        let ambiguity = (tied > 1).then(|| {
            tracing::warn!(
                field = %field,
                screen_type = %self.screen_type,
                candidates = tied,
                "Configuration ambiguity: access rules tie at the same specificity, using the most recently defined"
            );
            ConfigurationAmbiguity::AccessRuleTie {
                field: field.to_string(),
                candidates: tied,
            }
        });

        let permission = rule.permission_for(role).unwrap_or(FieldPermission::DENIED);

        FieldAccess {
            permission,
            source: Some(rule.field_source),
            specificity: Some(specificity),
            ambiguity,
        }
    }

    /// Permission map for every distinct field named in the rule set.
    pub fn resolve(&self, role: &str) -> BTreeMap<String, FieldPermission> {
        let fields: BTreeSet<&str> = self.rules.iter().map(|r| r.field_name.as_str()).collect();
        fields
            .into_iter()
            .map(|f| (f.to_string(), self.resolve_field(role, f).permission))
            .collect()
    }
}

/// Resolve the permission map for a role in one pass.
pub fn resolve_field_access(
    role: &str,
    screen_type: ScreenType,
    entity_kind: Option<&str>,
    entity_category: Option<&str>,
    rules: &[FieldAccessRule],
) -> BTreeMap<String, FieldPermission> {
    FieldAccessResolver::new(rules, screen_type, entity_kind, entity_category).resolve(role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rule(field: &str) -> FieldAccessRule {
        FieldAccessRule::new("acme", field, ScreenType::Submission)
    }

    #[test]
    fn test_no_rule_defaults_to_view_only() {
        let resolver = FieldAccessResolver::new(&[], ScreenType::Submission, None, None);
        for role in ["submitter", "approver", "anyone"] {
            let access = resolver.resolve_field(role, "description");
            assert_eq!(access.permission, FieldPermission::new(true, false));
            assert_eq!(access.specificity, None);
        }
    }

    #[test]
    fn test_rule_omitting_role_denies() {
        let rules = vec![rule("budget").grant("approver", true, true)];
        let resolver = FieldAccessResolver::new(&rules, ScreenType::Submission, None, None);

        assert_eq!(
            resolver.resolve_field("vendor_user", "budget").permission,
            FieldPermission::new(false, false)
        );
        // Contrast: a field with no rule at all stays viewable.
        assert_eq!(
            resolver.resolve_field("vendor_user", "name").permission,
            FieldPermission::new(true, false)
        );
    }

    #[test]
    fn test_precedence_most_specific_wins() {
        let rules = vec![
            rule("budget").grant("submitter", true, false),
            rule("budget")
                .for_category("Analytics")
                .grant("submitter", true, true),
            rule("budget")
                .for_kind("AI_AGENT")
                .grant("submitter", false, false),
            rule("budget")
                .for_kind("AI_AGENT")
                .for_category("Analytics")
                .grant("submitter", true, true),
        ];

        let full = FieldAccessResolver::new(
            &rules,
            ScreenType::Submission,
            Some("AI_AGENT"),
            Some("Analytics"),
        );
        let access = full.resolve_field("submitter", "budget");
        assert_eq!(access.specificity, Some(RuleSpecificity::KindAndCategory));
        assert_eq!(access.permission, FieldPermission::new(true, true));
        assert!(access.ambiguity.is_none());

        let kind_only = FieldAccessResolver::new(
            &rules,
            ScreenType::Submission,
            Some("AI_AGENT"),
            Some("Finance"),
        );
        let access = kind_only.resolve_field("submitter", "budget");
        assert_eq!(access.specificity, Some(RuleSpecificity::KindOnly));
        assert_eq!(access.permission, FieldPermission::DENIED);

        let category_only = FieldAccessResolver::new(
            &rules,
            ScreenType::Submission,
            Some("VENDOR"),
            Some("Analytics"),
        );
        assert_eq!(
            category_only.resolve_field("submitter", "budget").specificity,
            Some(RuleSpecificity::CategoryOnly)
        );

        let bare = FieldAccessResolver::new(&rules, ScreenType::Submission, None, None);
        let access = bare.resolve_field("submitter", "budget");
        assert_eq!(access.specificity, Some(RuleSpecificity::ScreenOnly));
        assert_eq!(access.permission, FieldPermission::new(true, false));
    }

    #[test]
    fn test_other_screen_rules_do_not_apply() {
        let rules = vec![
            FieldAccessRule::new("acme", "budget", ScreenType::Approval)
                .grant("approver", true, true),
        ];
        let resolver = FieldAccessResolver::new(&rules, ScreenType::Submission, None, None);
        assert_eq!(
            resolver.resolve_field("approver", "budget").permission,
            FieldPermission::DEFAULT
        );
    }

    #[test]
    fn test_tie_picks_most_recently_defined() {
        let mut older = rule("budget").grant("submitter", true, true);
        older.defined_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let mut newer = rule("budget").grant("submitter", true, false);
        newer.defined_at = Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());

        // Newer listed first so position alone would pick the wrong one.
        let rules = vec![newer, older];
        let resolver = FieldAccessResolver::new(&rules, ScreenType::Submission, None, None);
        let access = resolver.resolve_field("submitter", "budget");
        assert_eq!(access.permission, FieldPermission::new(true, false));
        assert_eq!(
            access.ambiguity,
            Some(ConfigurationAmbiguity::AccessRuleTie {
                field: "budget".to_string(),
                candidates: 2,
            })
        );
    }

    #[test]
    fn test_undated_tie_picks_last_defined() {
        let rules = vec![
            rule("budget").grant("submitter", true, true),
            rule("budget").grant("submitter", false, false),
        ];
        let resolver = FieldAccessResolver::new(&rules, ScreenType::Submission, None, None);
        assert_eq!(
            resolver.resolve_field("submitter", "budget").permission,
            FieldPermission::DENIED
        );
    }

    #[test]
    fn test_resolve_covers_every_field_in_rules() {
        let rules = vec![
            rule("budget").grant("submitter", true, true),
            rule("notes").grant("approver", true, true),
            FieldAccessRule::new("acme", "score", ScreenType::Approval)
                .grant("approver", true, true),
        ];
        let map = resolve_field_access("submitter", ScreenType::Submission, None, None, &rules);
        assert_eq!(map.len(), 3);
        assert_eq!(map["budget"], FieldPermission::new(true, true));
        assert_eq!(map["notes"], FieldPermission::DENIED);
        assert_eq!(map["score"], FieldPermission::DEFAULT);
    }
}
