use rules_core::config::{ObjectTypeConfig, PropertyType};
use rules_protocol::filter::FilterKind;
use serde::Serialize;
use serde_json::Value;

use crate::extract::{filter_view, logic_properties};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    /// Referenced property ids, sorted.
    pub used_properties: Vec<String>,
    /// Declared property ids, in declaration order.
    pub valid_properties: Vec<String>,
}

/// Every property the document refers to must be declared on `object_type`.
pub fn validate_properties(logic: &Value, object_type: &ObjectTypeConfig) -> PropertyValidation {
    let used_properties = logic_properties(logic);
    let valid_properties: Vec<String> = object_type
        .properties
        .iter()
        .map(|property| property.id.clone())
        .collect();

    let errors: Vec<String> = used_properties
        .iter()
        .filter(|used| !valid_properties.contains(*used))
        .map(|used| {
            format!(
                "Property \"{used}\" does not exist on object type \"{}\". Valid properties: {}",
                object_type.id,
                valid_properties.join(", ")
            )
        })
        .collect();

    PropertyValidation {
        valid: errors.is_empty(),
        errors,
        used_properties,
        valid_properties,
    }
}

/// Comparisons must fit the declared property type.
///
/// String comparisons need a `string` property and numeric comparisons a
/// `number` property. Null checks apply to every type. Undeclared properties
/// are left to [`validate_properties`].
pub fn validate_property_types(logic: &Value, object_type: &ObjectTypeConfig) -> Vec<String> {
    let Some(view) = filter_view(logic) else {
        return Vec::new();
    };

    let mut errors = Vec::new();
    for leaf in view.leaves() {
        let Some(declared) = leaf.property_id().and_then(|id| object_type.property(id)) else {
            continue;
        };
        let (Some(kind), Some(op)) = (leaf.kind(), leaf.op()) else {
            continue;
        };
        let fits = match kind {
            FilterKind::String => declared.property_type == PropertyType::String,
            FilterKind::Numeric => declared.property_type == PropertyType::Number,
            FilterKind::Null => true,
        };
        if !fits {
            let message = format!(
                "{} filter \"{}\" cannot be applied to property \"{}\" of type {}",
                capitalized(kind),
                op,
                declared.id,
                declared.property_type
            );
            if !errors.contains(&message) {
                errors.push(message);
            }
        }
    }
    errors
}

fn capitalized(kind: FilterKind) -> &'static str {
    match kind {
        FilterKind::String => "String",
        FilterKind::Numeric => "Numeric",
        FilterKind::Null => "Null",
    }
}
