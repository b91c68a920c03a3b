//! Schema Validator: declarative per-resource-type property/metadata rules
//! and update-immutability checks.

mod rules;

pub use rules::{TypeRules, TYPE_RULES};

use catalog_models::{Resource, ResourceType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn ok() -> Self {
        ValidationResult {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn push_error(&mut self, msg: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(msg.into());
    }

    fn push_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

pub struct Validator;

impl Validator {
    pub fn validate(resource: &Resource) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if resource.resource_type == ResourceType::Unknown {
            result.push_error("resource type must not be Unknown at create time");
        }

        if !catalog_models::NAME_RE.is_match(&resource.name) {
            result.push_error(format!("name '{}' violates the allowed pattern", resource.name));
        }

        if let Some(ns) = &resource.namespace {
            if !catalog_models::NAMESPACE_RE.is_match(ns) {
                result.push_error(format!("namespace '{ns}' violates the allowed pattern"));
            }
        }

        Self::validate_properties_and_metadata(resource, &mut result);
        Self::validate_metadata_serialisable(resource, &mut result);
        Self::validate_duplicate_tags(resource, &mut result);

        result
    }

    /// Additionally errors on any attempted change to immutable fields
    /// (`id`, `type`, `createdAt`, `createdBy`) on top of `validate`'s
    /// checks.
    pub fn validate_update(existing: &Resource, updated: &Resource) -> ValidationResult {
        let mut result = Self::validate(updated);

        if existing.id != updated.id {
            result.push_error("id is immutable");
        }
        if existing.resource_type != updated.resource_type {
            result.push_error("type is immutable");
        }
        if existing.created_at != updated.created_at {
            result.push_warning("attempt to change createdAt on update was ignored");
        }
        if existing.created_by != updated.created_by {
            result.push_warning("attempt to change createdBy on update was ignored");
        }

        result
    }

    fn validate_properties_and_metadata(resource: &Resource, result: &mut ValidationResult) {
        let Some(rules) = TYPE_RULES.get(&resource.resource_type) else {
            result.push_error(format!("unknown type '{}'", resource.resource_type));
            return;
        };

        for required in rules.required_properties {
            match resource.properties.get(*required) {
                None => result.push_error(format!("missing required property '{required}'")),
                Some(value) if value.trim().is_empty() => {
                    result.push_error(format!("required property '{required}' is empty"))
                }
                Some(_) => {}
            }
        }

        for key in resource.properties.keys() {
            let known = rules.required_properties.contains(&key.as_str())
                || rules.optional_properties.contains(&key.as_str());
            if !known {
                result.push_warning(format!("unknown optional property '{key}'"));
            }
        }

        for required in rules.required_metadata {
            match resource.metadata.get(*required) {
                None => result.push_error(format!("missing required metadata '{required}'")),
                Some(serde_json::Value::Null) => {
                    result.push_error(format!("required metadata '{required}' is empty"))
                }
                Some(_) => {}
            }
        }
    }

    /// `serde_json::Value` cannot represent NaN/Infinity by construction, so
    /// this walk is defensive: it guards against a future change widening
    /// the metadata value type to something that isn't always JSON-safe.
    fn validate_metadata_serialisable(resource: &Resource, result: &mut ValidationResult) {
        for (key, value) in &resource.metadata {
            if serde_json::to_string(value).is_err() {
                result.push_error(format!("metadata '{key}' is not JSON-serialisable"));
            }
        }
    }

    fn validate_duplicate_tags(resource: &Resource, result: &mut ValidationResult) {
        let mut seen = std::collections::HashSet::new();
        for tag in &resource.tags {
            if !seen.insert(tag) {
                result.push_warning(format!("duplicate tag '{tag}'"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_models::SemanticVersion;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn base_service() -> Resource {
        let mut properties = BTreeMap::new();
        properties.insert("endpoint".to_string(), "https://svc.internal".to_string());
        properties.insert("protocol".to_string(), "grpc".to_string());
        properties.insert("description".to_string(), "billing service".to_string());

        Resource {
            id: Uuid::new_v4(),
            resource_type: ResourceType::Service,
            name: "billing-api".to_string(),
            namespace: Some("payments".to_string()),
            version: SemanticVersion::parse("1.0.0").unwrap(),
            tags: vec!["prod".to_string()],
            metadata: BTreeMap::new(),
            properties,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: Some("tester".to_string()),
            active: true,
        }
    }

    #[test]
    fn valid_service_passes() {
        let result = Validator::validate(&base_service());
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn missing_required_property_errors() {
        let mut resource = base_service();
        resource.properties.remove("endpoint");
        let result = Validator::validate(&resource);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("endpoint")));
    }

    #[test]
    fn empty_required_property_errors() {
        let mut resource = base_service();
        resource.properties.insert("endpoint".to_string(), "  ".to_string());
        let result = Validator::validate(&resource);
        assert!(!result.is_valid);
    }

    #[test]
    fn unknown_optional_property_warns() {
        let mut resource = base_service();
        resource.properties.insert("mystery".to_string(), "x".to_string());
        let result = Validator::validate(&resource);
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("mystery")));
    }

    #[test]
    fn duplicate_tags_warn() {
        let mut resource = base_service();
        resource.tags.push("prod".to_string());
        let result = Validator::validate(&resource);
        assert!(result.warnings.iter().any(|w| w.contains("duplicate tag")));
    }

    #[test]
    fn unknown_type_at_create_errors() {
        let mut resource = base_service();
        resource.resource_type = ResourceType::Unknown;
        let result = Validator::validate(&resource);
        assert!(!result.is_valid);
    }

    #[test]
    fn oversized_name_rejected() {
        let mut resource = base_service();
        resource.name = "a".repeat(65);
        let result = Validator::validate(&resource);
        assert!(!result.is_valid);
    }

    #[test]
    fn update_rejects_immutable_field_changes() {
        let existing = base_service();
        let mut updated = existing.clone();
        updated.resource_type = ResourceType::Database;
        updated.properties.insert("connection_string".to_string(), "x".to_string());
        updated.properties.insert("provider".to_string(), "postgres".to_string());
        updated.properties.insert("environment".to_string(), "prod".to_string());

        let result = Validator::validate_update(&existing, &updated);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("type is immutable")));
    }

    #[test]
    fn update_warns_on_created_at_change() {
        let existing = base_service();
        let mut updated = existing.clone();
        updated.created_at = Utc::now() + chrono::Duration::days(1);

        let result = Validator::validate_update(&existing, &updated);
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("createdAt")));
    }
}
