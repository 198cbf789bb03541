//! Schema-driven plan computation.
//!
//! Given a resource schema, the prior state and the configuration, compute
//! the planned state the host will later hand to Create or Update:
//!
//! - configured values are planned as-is;
//! - unset attributes with a default plan the default;
//! - unset computed attributes plan the prior value when nothing they depend
//!   on changed (or always, with `use_state_for_unknown`), and unknown
//!   otherwise;
//! - everything else plans null.
//!
//! Attribute changes are reported with sensitive values masked, and
//! `requires_replace` is set when a `force_new` attribute changes on an
//! existing object.

use serde_json::{Map, Value};

use crate::schema::{has_errors, Attribute, AttributeType, Schema};
use crate::types::{AttributeChange, PlanResult};
use crate::validation::validate;
use crate::value;

/// Compute the plan for one resource instance.
///
/// `prior_state` is `None` when the instance is being created. A null
/// `proposed_state` means the instance is being destroyed.
pub fn plan_resource(
    schema: &Schema,
    prior_state: Option<&Value>,
    proposed_state: &Value,
    config: &Value,
) -> PlanResult {
    let prior = prior_state.and_then(Value::as_object);

    if proposed_state.is_null() {
        return plan_destroy(prior);
    }

    // Hosts that only send the proposed state get it treated as config.
    let config = if config.is_null() {
        proposed_state
    } else {
        config
    };

    let diagnostics = validate(schema, config);
    if has_errors(&diagnostics) {
        return PlanResult::invalid(proposed_state.clone(), diagnostics);
    }

    let empty = Map::new();
    let config_obj = config.as_object().unwrap_or(&empty);
    let prior_value = |name: &str| prior.and_then(|p| p.get(name)).unwrap_or(&Value::Null);

    let mut planned = Map::new();

    for (name, attr) in &schema.block.attributes {
        if let Some(value) = configured_value(attr, config_obj.get(name)) {
            let previous = prior_value(name.as_str());
            let value = if is_set(attr) && set_equal(&value, previous) {
                previous.clone()
            } else {
                value
            };
            planned.insert(name.clone(), value);
        }
    }
    for name in schema.block.blocks.keys() {
        let value = config_obj.get(name).cloned().unwrap_or(Value::Null);
        planned.insert(name.clone(), value);
    }

    let config_changed = prior.is_none()
        || planned
            .iter()
            .any(|(name, value)| value != prior_value(name.as_str()));

    for (name, attr) in &schema.block.attributes {
        if planned.contains_key(name) {
            continue;
        }
        let value = if attr.flags.computed {
            match prior_value(name.as_str()) {
                Value::Null => unknown_unless_created(prior.is_some(), attr),
                previous if attr.use_state_for_unknown || !config_changed => previous.clone(),
                _ => value::unknown(),
            }
        } else {
            Value::Null
        };
        planned.insert(name.clone(), value);
    }

    let mut changes = Vec::new();
    let mut requires_replace = false;
    for name in schema.field_names() {
        let after = planned.get(name).unwrap_or(&Value::Null);
        let before = prior_value(name);
        if before == after {
            continue;
        }

        let attr = schema.block.attributes.get(name);
        let change = AttributeChange::new(name, non_null(before), non_null(after));
        changes.push(match attr {
            Some(attr) if attr.flags.sensitive => change.masked(),
            _ => change,
        });

        if prior.is_some() && attr.map(|a| a.force_new).unwrap_or(false) {
            requires_replace = true;
        }
    }

    PlanResult {
        planned_state: Value::Object(planned),
        changes,
        requires_replace,
        diagnostics,
    }
}

/// The planned value of a configurable attribute, or `None` if the
/// attribute is left for the computed pass.
///
/// Computed-only attributes are never taken from configuration, even when
/// the host echoes them back in the proposed state.
fn configured_value(attr: &Attribute, configured: Option<&Value>) -> Option<Value> {
    if !attr.flags.configurable() {
        return None;
    }
    match configured {
        Some(v) if !v.is_null() => Some(v.clone()),
        _ => match &attr.default {
            Some(default) => Some(default.clone()),
            None if attr.flags.computed => None,
            None => Some(Value::Null),
        },
    }
}

/// A computed attribute with no prior value.
///
/// On create it is unknown. On an existing object a computed attribute the
/// control plane left empty stays null, unless it is an optional+computed
/// attribute the remote may still fill in.
fn unknown_unless_created(exists: bool, attr: &Attribute) -> Value {
    if exists && !attr.flags.optional {
        Value::Null
    } else {
        value::unknown()
    }
}

fn plan_destroy(prior: Option<&Map<String, Value>>) -> PlanResult {
    let changes = prior
        .map(|p| {
            let mut names: Vec<&String> = p.keys().collect();
            names.sort();
            names
                .into_iter()
                .filter(|name| !p[name.as_str()].is_null())
                .map(|name| AttributeChange::removed(name.clone(), p[name.as_str()].clone()))
                .collect()
        })
        .unwrap_or_default();
    PlanResult::with_changes(Value::Null, changes, false)
}

fn is_set(attr: &Attribute) -> bool {
    matches!(attr.attr_type, AttributeType::Set(_))
}

/// Sets compare without regard to element order.
fn set_equal(a: &Value, b: &Value) -> bool {
    match (a.as_array(), b.as_array()) {
        (Some(a), Some(b)) => {
            a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
        }
        _ => a == b,
    }
}

fn non_null(value: &Value) -> Option<Value> {
    if value.is_null() {
        None
    } else {
        Some(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Block, NestedBlock, Validator};
    use crate::testing::{
        assert_plan_changes_attribute, assert_plan_does_not_change_attribute,
        assert_plan_no_changes, assert_plan_replaces, assert_plan_updates_in_place,
    };
    use crate::types::SENSITIVE_MASK;
    use crate::value::{is_unknown, UNKNOWN_VALUE};
    use serde_json::json;

    fn s3_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::id())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("bucket_name", Attribute::required_string())
            .with_attribute(
                "batch_duration_in_minutes",
                Attribute::optional_int64()
                    .with_default(json!(5))
                    .with_validator(Validator::AtLeast(5)),
            )
            .with_attribute(
                "maximum_batch_size",
                Attribute::optional_int64().with_default(json!(5000)),
            )
            .with_attribute("filter_for_actions", Attribute::optional_string_set())
    }

    #[test]
    fn test_create_applies_defaults_and_unknown_id() {
        let config = json!({"name": "audit", "bucket_name": "logs"});
        let plan = plan_resource(&s3_schema(), None, &config, &config);

        assert!(plan.diagnostics.is_empty());
        assert!(is_unknown(&plan.planned_state["id"]));
        assert_eq!(plan.planned_state["batch_duration_in_minutes"], 5);
        assert_eq!(plan.planned_state["maximum_batch_size"], 5000);
        assert!(plan.planned_state["filter_for_actions"].is_null());

        assert_plan_changes_attribute(&plan, "id");
        assert_plan_changes_attribute(&plan, "maximum_batch_size");
        assert_plan_does_not_change_attribute(&plan, "filter_for_actions");
    }

    #[test]
    fn test_defaults_produce_no_diff_after_apply() {
        let config = json!({"name": "audit", "bucket_name": "logs"});
        let prior = json!({
            "id": "I-1",
            "name": "audit",
            "bucket_name": "logs",
            "batch_duration_in_minutes": 5,
            "maximum_batch_size": 5000,
            "filter_for_actions": null,
        });

        let plan = plan_resource(&s3_schema(), Some(&prior), &config, &config);
        assert_plan_no_changes(&plan);
        assert_eq!(plan.planned_state, prior);
    }

    #[test]
    fn test_update_keeps_id_from_state() {
        let prior = json!({
            "id": "I-1",
            "name": "audit",
            "bucket_name": "logs",
            "batch_duration_in_minutes": 5,
            "maximum_batch_size": 5000,
        });
        let config = json!({"name": "audit", "bucket_name": "other-logs"});

        let plan = plan_resource(&s3_schema(), Some(&prior), &config, &config);
        assert_eq!(plan.planned_state["id"], "I-1");
        assert_plan_changes_attribute(&plan, "bucket_name");
        assert_plan_does_not_change_attribute(&plan, "id");
        assert_plan_updates_in_place(&plan);
    }

    #[test]
    fn test_computed_without_state_hint_becomes_unknown_on_change() {
        let schema = Schema::v0()
            .with_attribute("id", Attribute::id())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("revision", Attribute::computed_int64());
        let prior = json!({"id": "X", "name": "a", "revision": 3});

        let same = json!({"name": "a"});
        let plan = plan_resource(&schema, Some(&prior), &same, &same);
        assert_eq!(plan.planned_state["revision"], 3);

        let changed = json!({"name": "b"});
        let plan = plan_resource(&schema, Some(&prior), &changed, &changed);
        assert_eq!(plan.planned_state["revision"], UNKNOWN_VALUE);
        assert_eq!(plan.planned_state["id"], "X");
    }

    #[test]
    fn test_optional_computed_priority() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "priority",
                Attribute::optional_computed_int64().with_use_state_for_unknown(),
            );

        let config = json!({"name": "a"});
        let plan = plan_resource(&schema, None, &config, &config);
        assert!(is_unknown(&plan.planned_state["priority"]));

        let prior = json!({"name": "a", "priority": 100});
        let renamed = json!({"name": "b"});
        let plan = plan_resource(&schema, Some(&prior), &renamed, &renamed);
        assert_eq!(plan.planned_state["priority"], 100);

        let explicit = json!({"name": "a", "priority": 7});
        let plan = plan_resource(&schema, Some(&prior), &explicit, &explicit);
        assert_eq!(plan.planned_state["priority"], 7);
    }

    #[test]
    fn test_sensitive_values_are_masked() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("token", Attribute::optional_string().sensitive());
        let prior = json!({"name": "a", "token": "old-secret"});
        let config = json!({"name": "a", "token": "new-secret"});

        let plan = plan_resource(&schema, Some(&prior), &config, &config);
        let change = plan.changes.iter().find(|c| c.path == "token").unwrap();
        assert_eq!(change.before, Some(json!(SENSITIVE_MASK)));
        assert_eq!(change.after, Some(json!(SENSITIVE_MASK)));
        // The planned state itself still carries the value for apply.
        assert_eq!(plan.planned_state["token"], "new-secret");
    }

    #[test]
    fn test_force_new_requires_replace() {
        let schema = Schema::v0()
            .with_attribute("id", Attribute::id())
            .with_attribute("region", Attribute::required_string().with_force_new());
        let prior = json!({"id": "X", "region": "us-east-1"});
        let config = json!({"region": "eu-west-1"});

        let plan = plan_resource(&schema, Some(&prior), &config, &config);
        assert_plan_replaces(&plan);

        let plan = plan_resource(&schema, None, &config, &config);
        assert!(!plan.requires_replace);
    }

    #[test]
    fn test_invalid_config_reports_diagnostics() {
        let config = json!({"name": "audit", "bucket_name": "logs", "batch_duration_in_minutes": 1});
        let plan = plan_resource(&s3_schema(), None, &config, &config);

        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(
            plan.diagnostics[0].attribute.as_deref(),
            Some("batch_duration_in_minutes")
        );
        assert!(plan.changes.is_empty());
    }

    #[test]
    fn test_blocks_pass_through() {
        let schema = Schema::v0()
            .with_attribute("url", Attribute::required_string())
            .with_block(
                "headers",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("key", Attribute::required_string())
                        .with_attribute("value", Attribute::required_string()),
                ),
            );
        let config = json!({"url": "https://x", "headers": [{"key": "X-Token", "value": "abc"}]});

        let plan = plan_resource(&schema, None, &config, &config);
        assert_eq!(plan.planned_state["headers"][0]["key"], "X-Token");
        assert_plan_changes_attribute(&plan, "headers");
    }

    #[test]
    fn test_reordered_set_is_not_a_change() {
        let prior = json!({
            "id": "I-1",
            "name": "audit",
            "bucket_name": "logs",
            "batch_duration_in_minutes": 5,
            "maximum_batch_size": 5000,
            "filter_for_actions": ["grant.activated", "grant.revoked"],
        });
        let config = json!({
            "name": "audit",
            "bucket_name": "logs",
            "filter_for_actions": ["grant.revoked", "grant.activated"],
        });

        let plan = plan_resource(&s3_schema(), Some(&prior), &config, &config);
        assert_plan_no_changes(&plan);

        let config = json!({"name": "audit", "bucket_name": "logs", "filter_for_actions": []});
        let plan = plan_resource(&s3_schema(), Some(&prior), &config, &config);
        assert_plan_changes_attribute(&plan, "filter_for_actions");
        assert_eq!(plan.planned_state["filter_for_actions"], json!([]));
    }

    #[test]
    fn test_destroy_plan() {
        let prior = json!({"id": "I-1", "name": "audit", "filter_for_actions": null});
        let plan = plan_resource(&s3_schema(), Some(&prior), &Value::Null, &Value::Null);

        assert!(plan.planned_state.is_null());
        assert_eq!(plan.changes.len(), 2);
        assert_eq!(plan.changes[0].path, "id");
        assert!(plan.changes.iter().all(|c| c.after.is_none()));
    }

    #[test]
    fn test_null_config_falls_back_to_proposed() {
        let proposed = json!({"name": "audit", "bucket_name": "logs"});
        let plan = plan_resource(&s3_schema(), None, &proposed, &Value::Null);
        assert_eq!(plan.planned_state["bucket_name"], "logs");
    }
}
