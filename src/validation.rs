//! Schema validation helpers.
//!
//! Validates a resource configuration (`serde_json::Value`) against its
//! [`Schema`] before planning. Values the host marks as unknown are accepted
//! as-is: their type and validators are checked once they become known.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_commonfate::schema::{Attribute, Schema, Validator};
//! use hemmer_provider_commonfate::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "batch_duration_in_minutes",
//!         Attribute::optional_int64().with_validator(Validator::AtLeast(5)),
//!     );
//!
//! let diagnostics = validate(&schema, &json!({"name": "audit", "batch_duration_in_minutes": 10}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "audit", "batch_duration_in_minutes": 1}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("batch_duration_in_minutes".to_string()));
//! ```

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, DiagnosticSeverity, NestedBlock,
    Schema, Validator,
};
use crate::value::is_unknown;
use serde_json::Value;
use std::collections::HashMap;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed attributes are skipped (provider sets these)
/// - Attribute types must match the schema
/// - Set elements must be unique
/// - Attribute validators (`at_least`, `size_at_least`, `one_of`) must hold
/// - Nested blocks are validated recursively with min/max item constraints
/// - Unknown values pass; they are checked again once known
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
///
/// This is a convenience wrapper around [`validate`] that returns a Result.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
///
/// Returns `true` if valid, `false` otherwise.
/// Use [`validate`] to get detailed error information.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => {
            // Null is valid for optional blocks, but we can't validate further
            return;
        },
        v if is_unknown(v) => return,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value)))
                    .with_attribute_if_not_empty(path),
            );
            return;
        },
    };

    // Validate attributes
    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        let attr_value = obj.get(name);
        validate_attribute(attr, attr_value, &attr_path, diagnostics);
    }

    // Validate nested blocks
    for (name, nested_block) in &block.blocks {
        let block_path = join_path(path, name);
        let block_value = obj.get(name);
        validate_nested_block(nested_block, block_value, &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Skip computed-only attributes (provider sets these)
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            // Check if required
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
            // Optional attributes can be missing/null
        },
        Some(v) if is_unknown(v) => {},
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            if diagnostics.len() == before {
                for validator in &attr.validators {
                    check_validator(validator, v, path, diagnostics);
                }
            }
        },
    }
}

fn check_validator(
    validator: &Validator,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let holds = match validator {
        Validator::AtLeast(min) => value.as_f64().map_or(true, |v| v >= *min as f64),
        Validator::SizeAtLeast(min) => match value {
            Value::Array(items) => items.len() >= *min,
            Value::Object(map) => map.len() >= *min,
            _ => true,
        },
        Validator::OneOf(allowed) => value
            .as_str()
            .map_or(true, |v| allowed.iter().any(|a| a == v)),
    };

    if !holds {
        diagnostics.push(
            Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                .with_detail(validator_detail(validator))
                .with_attribute(path),
        );
    }
}

/// The validator's description as a sentence, e.g. "Value must be at least 5."
fn validator_detail(validator: &Validator) -> String {
    let description = validator.describe();
    let mut chars = description.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => description,
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if is_unknown(value) {
        return;
    }

    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Float64 => {
            if !value.is_number() {
                diagnostics.push(type_error(path, "float64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
        AttributeType::Set(element_type) => {
            // Sets are represented as arrays in JSON
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                    if arr[..i].contains(elem) && !is_unknown(elem) {
                        diagnostics.push(
                            Diagnostic::error(format!("Duplicate element in set '{}'", path))
                                .with_detail(format!("Element {} appears more than once", elem))
                                .with_attribute(elem_path),
                        );
                    }
                }
            } else {
                diagnostics.push(type_error(path, "set", value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
        AttributeType::Object(attrs) => {
            if let Some(obj) = value.as_object() {
                validate_object_type(attrs, obj, path, diagnostics);
            } else {
                diagnostics.push(type_error(path, "object", value));
            }
        },
        AttributeType::Dynamic => {
            // Dynamic accepts any value
        },
    }
}

fn validate_object_type(
    attrs: &HashMap<String, AttributeType>,
    obj: &serde_json::Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr_type) in attrs {
        let attr_path = join_path(path, name);
        if let Some(value) = obj.get(name) {
            validate_attribute_type(attr_type, value, &attr_path, diagnostics);
        }
        // Object attributes within a type don't have required/optional flags,
        // so we don't enforce presence
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match nested.nesting_mode {
        BlockNestingMode::Single => {
            validate_single_block(nested, value, path, diagnostics);
        },
        BlockNestingMode::List => {
            validate_list_block(nested, value, path, diagnostics);
        },
        BlockNestingMode::Set => {
            // Sets are validated the same as lists for our purposes
            validate_list_block(nested, value, path, diagnostics);
        },
        BlockNestingMode::Map => {
            validate_map_block(nested, value, path, diagnostics);
        },
    }
}

fn validate_single_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required block '{}'", path))
                        .with_detail("At least one block is required")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            validate_block(&nested.block, v, path, diagnostics);
        },
    }
}

fn validate_list_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        Some(v) if is_unknown(v) => {},
        Some(Value::Array(arr)) => {
            let len = arr.len() as u32;

            // Check min_items
            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // Check max_items (0 means unlimited)
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // Validate each block
            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

fn validate_map_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        Some(v) if is_unknown(v) => {},
        Some(Value::Object(obj)) => {
            let len = obj.len() as u32;

            // Check min_items
            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // Check max_items (0 means unlimited)
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // Validate each block
            for (key, item) in obj {
                let item_path = format!("{}.{}", path, key);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected map for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

// Helper functions

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            // Check if it's an integer (no fractional part)
            if n.is_i64() {
                true
            } else if let Some(f) = n.as_f64() {
                // Check if the float is actually an integer
                f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
            } else {
                false
            }
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        )),
        attribute: Some(path.to_string()),
    }
}

trait DiagnosticExt {
    fn with_attribute_if_not_empty(self, path: &str) -> Self;
}

impl DiagnosticExt for Diagnostic {
    fn with_attribute_if_not_empty(self, path: &str) -> Self {
        if path.is_empty() {
            self
        } else {
            self.with_attribute(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, Schema};
    use crate::value::UNKNOWN_VALUE;
    use serde_json::json;

    fn workflow_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::id())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("access_duration", Attribute::required_int64())
            .with_attribute("activation_expiry", Attribute::optional_int64())
    }

    fn webhook_schema() -> Schema {
        Schema::v0()
            .with_attribute("url", Attribute::required_string())
            .with_attribute(
                "send_audit_log_events",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute("filter_for_actions", Attribute::optional_string_set())
            .with_block(
                "headers",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("key", Attribute::required_string())
                        .with_attribute("value", Attribute::required_string()),
                ),
            )
    }

    #[test]
    fn test_validate_required_attributes() {
        let schema = workflow_schema();

        let diagnostics = validate(&schema, &json!({"name": "oncall", "access_duration": 3600}));
        assert!(diagnostics.is_empty());

        let diagnostics = validate(&schema, &json!({"access_duration": 3600}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        let diagnostics = validate(&schema, &json!({"name": null, "access_duration": 3600}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_wrong_types() {
        let schema = workflow_schema();

        let diagnostics = validate(
            &schema,
            &json!({"name": 1, "access_duration": "an hour", "activation_expiry": 1.5}),
        );
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics
            .iter()
            .all(|d| d.summary.contains("Invalid type")));
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = workflow_schema();

        // The id is server-issued; whatever the plan carries is not checked.
        let diagnostics = validate(
            &schema,
            &json!({"id": 123, "name": "oncall", "access_duration": 3600}),
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_validate_int64_accepts_integral_floats() {
        let schema = workflow_schema();

        let diagnostics = validate(&schema, &json!({"name": "x", "access_duration": 3600.0}));
        assert!(diagnostics.is_empty());

        let diagnostics = validate(&schema, &json!({"name": "x", "access_duration": 3600.5}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_unknown_values_pass() {
        let schema = workflow_schema();

        let diagnostics = validate(
            &schema,
            &json!({"name": UNKNOWN_VALUE, "access_duration": UNKNOWN_VALUE}),
        );
        assert!(diagnostics.is_empty());

        let diagnostics = validate(
            &webhook_schema(),
            &json!({"url": "https://example.test", "headers": UNKNOWN_VALUE}),
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_at_least_validator() {
        let schema = Schema::v0().with_attribute(
            "batch_duration_in_minutes",
            Attribute::optional_int64()
                .with_default(json!(5))
                .with_validator(Validator::AtLeast(5)),
        );

        assert!(validate(&schema, &json!({"batch_duration_in_minutes": 5})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());

        let diagnostics = validate(&schema, &json!({"batch_duration_in_minutes": 4}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].detail.as_deref(),
            Some("Value must be at least 5.")
        );
    }

    #[test]
    fn test_one_of_validator() {
        let schema = Schema::v0().with_attribute(
            "compression",
            Attribute::optional_string()
                .with_validator(Validator::OneOf(vec!["gzip".into(), "none".into()])),
        );

        assert!(validate(&schema, &json!({"compression": "gzip"})).is_empty());
        assert_eq!(validate(&schema, &json!({"compression": "zstd"})).len(), 1);
    }

    #[test]
    fn test_validator_skipped_on_type_error() {
        let schema = Schema::v0().with_attribute(
            "maximum_batch_size",
            Attribute::optional_int64().with_validator(Validator::AtLeast(1)),
        );

        let diagnostics = validate(&schema, &json!({"maximum_batch_size": "lots"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_set_rules() {
        let schema = webhook_schema();
        let base = |filter: Value| {
            json!({"url": "https://example.test", "filter_for_actions": filter})
        };

        assert!(validate(&schema, &base(json!(["grant.approved"]))).is_empty());
        assert!(validate(&schema, &base(Value::Null)).is_empty());
        assert!(validate(&schema, &base(json!([]))).is_empty());

        let diagnostics = validate(
            &schema,
            &base(json!(["grant.approved", "grant.revoked", "grant.approved"])),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Duplicate element"));
        assert_eq!(
            diagnostics[0].attribute,
            Some("filter_for_actions.2".to_string())
        );

        let diagnostics = validate(&schema, &base(json!(["grant.approved", 7])));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("filter_for_actions.1".to_string())
        );
    }

    #[test]
    fn test_validate_nested_block_list() {
        let schema = webhook_schema();

        let diagnostics = validate(
            &schema,
            &json!({"url": "https://x", "headers": [{"key": "X-Token", "value": "abc"}]}),
        );
        assert!(diagnostics.is_empty());

        assert!(validate(&schema, &json!({"url": "https://x"})).is_empty());
        assert!(validate(&schema, &json!({"url": "https://x", "headers": []})).is_empty());

        let diagnostics = validate(
            &schema,
            &json!({"url": "https://x", "headers": [{"key": "X-Token"}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("headers.0.value".to_string())
        );

        let diagnostics = validate(&schema, &json!({"url": "https://x", "headers": "X-Token"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected list"));
    }

    #[test]
    fn test_size_validator() {
        let schema = Schema::v0().with_attribute(
            "role_ids",
            Attribute::optional_string_set().with_validator(Validator::SizeAtLeast(1)),
        );

        assert!(validate(&schema, &json!({"role_ids": ["admin"]})).is_empty());
        assert!(validate(&schema, &json!({"role_ids": null})).is_empty());

        let diagnostics = validate(&schema, &json!({"role_ids": []}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("role_ids".to_string()));
        assert_eq!(
            diagnostics[0].detail.as_deref(),
            Some("Must contain at least 1 element(s).")
        );
    }

    #[test]
    fn test_validate_nested_block_limits_and_modes() {
        let schema = Schema::v0()
            .with_block(
                "target",
                NestedBlock::list(Block::new().with_attribute("selector_id", Attribute::required_string()))
                    .with_min_items(1)
                    .with_max_items(2),
            )
            .with_block(
                "labels",
                NestedBlock::map(Block::new().with_attribute("value", Attribute::required_string())),
            )
            .with_block(
                "owner",
                NestedBlock::single(Block::new().with_attribute("email", Attribute::required_string())),
            );

        let diagnostics = validate(
            &schema,
            &json!({
                "target": [{"selector_id": "a"}, {"selector_id": "b"}, {"selector_id": "c"}],
                "labels": {"env": {"value": 1}},
                "owner": {"email": "ops@example.test"},
            }),
        );
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().any(|d| d.summary.contains("at most 2")));
        assert!(diagnostics
            .iter()
            .any(|d| d.attribute.as_deref() == Some("labels.env.value")));

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("target".to_string()));

        let diagnostics = validate(&schema, &json!({"target": []}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));
    }

    #[test]
    fn test_validate_object_and_map_types() {
        let mut eid = HashMap::new();
        eid.insert("type".to_string(), AttributeType::String);
        eid.insert("id".to_string(), AttributeType::String);

        let schema = Schema::v0()
            .with_attribute(
                "belonging_to",
                Attribute::new(AttributeType::Object(eid), AttributeFlags::required()),
            )
            .with_attribute(
                "tags",
                Attribute::new(
                    AttributeType::map(AttributeType::String),
                    AttributeFlags::optional(),
                ),
            )
            .with_attribute(
                "extra",
                Attribute::new(AttributeType::Dynamic, AttributeFlags::optional()),
            );

        let diagnostics = validate(
            &schema,
            &json!({
                "belonging_to": {"type": "Okta::Organization", "id": "org-1"},
                "tags": {"team": "sec"},
                "extra": [1, {"x": true}],
            }),
        );
        assert!(diagnostics.is_empty());

        let diagnostics = validate(
            &schema,
            &json!({"belonging_to": {"type": "Okta::Organization", "id": 1}, "tags": {"n": 2}}),
        );
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_helpers() {
        let schema = workflow_schema();
        let good = json!({"name": "oncall", "access_duration": 60});

        assert!(is_valid(&schema, &good));
        assert!(!is_valid(&schema, &json!({})));
        assert!(validate_result(&schema, &good).is_ok());
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 2);
    }

    #[test]
    fn test_validate_root_not_object() {
        let diagnostics = validate(&workflow_schema(), &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }
}
