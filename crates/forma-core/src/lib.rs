// Configuration types shared across all Forma crates
pub mod config;

// Output of a form resolution
pub mod resolved;

// Re-export commonly used types for convenience
pub use config::{
    ConditionKind, ConfigError, FieldAccessRule, FieldDependency, FieldPermission, FieldSource,
    FormConfig, FormLayout, ScreenType, SectionDefinition,
};
pub use resolved::{
    ConfigurationAmbiguity, DependencyState, MatchTier, ResolvedField, ResolvedForm,
    ResolvedLayout, ResolvedSection,
};

/// Flat mapping of field name to current value.
pub type FormData = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_against(schema_src: &str, instance: &serde_json::Value) {
        let schema: serde_json::Value =
            serde_json::from_str(schema_src).expect("schema must parse");
        let validator = jsonschema::draft202012::options()
            .build(&schema)
            .expect("schema must compile");

        if !validator.is_valid(instance) {
            let mut msgs = Vec::new();
            for (idx, err) in validator.iter_errors(instance).take(20).enumerate() {
                msgs.push(format!("{}: {}", idx + 1, err));
            }
            panic!("instance did not validate: {}", msgs.join("; "));
        }
    }

    #[test]
    fn layout_serialization_validates_against_schema() {
        let mut layout = FormLayout {
            id: "layout-1".to_string(),
            tenant_id: "acme".to_string(),
            name: "Agent submission".to_string(),
            screen_type: ScreenType::Submission,
            sections: vec![SectionDefinition {
                id: "deployment".to_string(),
                title: "Deployment".to_string(),
                order: 1,
                fields: vec!["deployment_type".to_string(), "cloud_provider".to_string()],
            }],
            entity_kind: Some("AI_AGENT".to_string()),
            entity_category: None,
            field_dependencies: Default::default(),
            is_active: true,
            is_default: false,
        };
        layout.field_dependencies.insert(
            "cloud_provider".to_string(),
            FieldDependency::new(
                "deployment_type",
                ConditionKind::Equals,
                serde_json::json!("cloud"),
            ),
        );

        let instance = serde_json::to_value(&layout).expect("layout must serialize");
        validate_against(
            include_str!("../../../schemas/FormLayout.schema.json"),
            &instance,
        );
    }

    #[test]
    fn access_rules_serialization_validates_against_schema() {
        let rules = vec![
            FieldAccessRule::new("acme", "internal_notes", ScreenType::Approval)
                .grant("approver", true, true)
                .for_kind("AI_AGENT"),
        ];

        let instance = serde_json::to_value(&rules).expect("rules must serialize");
        validate_against(
            include_str!("../../../schemas/FieldAccessRules.schema.json"),
            &instance,
        );
    }
}
