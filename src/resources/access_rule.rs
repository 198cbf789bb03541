//! `commonfate_access_rule`: which targets and roles may be requested, and
//! through which workflow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{control_plane_from, require_client, ControlPlane, ProviderData};
use crate::context::Context;
use crate::diagnostics;
use crate::error::ProviderError;
use crate::generated::config as cfg;
use crate::resource::{decode_model, encode_model, to_i32, Resource};
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema, Validator};
use crate::types::ResourceState;
use crate::value::Attr;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRuleTargetModel {
    #[serde(rename = "type")]
    pub target_type: Attr<String>,
    pub selector_id: Attr<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRuleModel {
    pub id: Attr<String>,
    pub name: Attr<String>,
    pub priority: Attr<i64>,
    pub workflow_id: Attr<String>,
    pub targets: Attr<Vec<AccessRuleTargetModel>>,
    pub role_ids: Attr<Vec<String>>,
}

impl AccessRuleModel {
    fn from_proto(rule: cfg::AccessRule) -> Self {
        let targets = rule
            .targets
            .into_iter()
            .map(|t| AccessRuleTargetModel {
                target_type: Attr::non_empty(t.r#type),
                selector_id: Attr::non_empty(t.selector_id),
            })
            .collect();
        Self {
            id: Attr::non_empty(rule.id),
            name: Attr::non_empty(rule.name),
            priority: Attr::Known(i64::from(rule.priority)),
            workflow_id: Attr::non_empty(rule.workflow_id),
            targets: Attr::non_empty_list(targets),
            role_ids: Attr::non_empty_list(rule.role_ids),
        }
    }

    fn targets_to_proto(&self) -> Result<Vec<cfg::AccessRuleTarget>, ProviderError> {
        self.targets
            .clone()
            .optional("targets")?
            .unwrap_or_default()
            .into_iter()
            .map(|t| {
                Ok(cfg::AccessRuleTarget {
                    r#type: t.target_type.require("targets.type")?,
                    selector_id: t.selector_id.require("targets.selector_id")?,
                })
            })
            .collect()
    }

    /// The configured priority. Unset or unknown leaves it to the server.
    fn priority(&self) -> Result<Option<i32>, ProviderError> {
        self.priority
            .known()
            .map(|p| to_i32(*p, "priority"))
            .transpose()
    }

    fn apply_computed(mut self, id: String, rule: &cfg::AccessRule) -> Self {
        self.id = Attr::Known(id);
        if !self.priority.is_known() {
            self.priority = Attr::Known(i64::from(rule.priority));
        }
        self
    }
}

#[derive(Default)]
pub struct AccessRuleResource {
    client: Option<ControlPlane>,
}

impl AccessRuleResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> Box<dyn Resource> {
        Box::new(Self::new())
    }
}

fn missing_rule() -> ProviderError {
    ProviderError::Remote("control plane response did not include the access rule".to_string())
}

#[async_trait]
impl Resource for AccessRuleResource {
    fn type_suffix(&self) -> &'static str {
        "access_rule"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "Access rules control who can request access to what, and the workflow \
                 used to grant it.",
            )
            .with_attribute("id", Attribute::id())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name of the access rule."),
            )
            .with_attribute(
                "priority",
                Attribute::optional_computed_int64()
                    .with_use_state_for_unknown()
                    .with_description(
                        "The priority of the rule when several match a request. Set by Common Fate when omitted.",
                    ),
            )
            .with_attribute(
                "workflow_id",
                Attribute::required_string()
                    .with_description("The access workflow used to grant access."),
            )
            .with_attribute(
                "role_ids",
                Attribute::optional_string_set()
                    .with_validator(Validator::SizeAtLeast(1))
                    .with_description("The roles that may be requested on the targets."),
            )
            .with_block(
                "targets",
                NestedBlock::list(
                    Block::new()
                        .with_attribute(
                            "type",
                            Attribute::required_string()
                                .with_description("The entity type of the target, e.g. `Okta::Group`."),
                        )
                        .with_attribute(
                            "selector_id",
                            Attribute::required_string()
                                .with_description("The selector matching the target entities."),
                        ),
                )
                .with_min_items(1),
            )
    }

    fn configure(&mut self, data: Option<&ProviderData>) -> Result<(), ProviderError> {
        self.client = control_plane_from(data)?;
        Ok(())
    }

    async fn create(&self, ctx: &Context, planned: &Value) -> Result<ResourceState, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let plan: AccessRuleModel = decode_model(planned)?;

        let request = cfg::CreateAccessRuleRequest {
            name: plan.name.clone().require("name")?,
            priority: plan.priority()?,
            workflow_id: plan.workflow_id.clone().require("workflow_id")?,
            targets: plan.targets_to_proto()?,
            role_ids: plan.role_ids.clone().optional("role_ids")?.unwrap_or_default(),
        };

        let response = client.access_rules.create_access_rule(ctx, request).await?;
        let rule = response.access_rule.ok_or_else(missing_rule)?;
        if rule.id.is_empty() {
            return Err(ProviderError::Remote(
                "control plane did not assign an id to the access rule".to_string(),
            ));
        }
        info!(id = %rule.id, "created access rule");

        let state = plan.apply_computed(rule.id.clone(), &rule);
        Ok(ResourceState::new(encode_model(&state)?)
            .with_diagnostics(diagnostics::from_remote(response.diagnostics)))
    }

    async fn read(&self, ctx: &Context, current: &Value) -> Result<ResourceState, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let prior: AccessRuleModel = decode_model(current)?;
        let id = prior.id.require("id")?;

        let response = match client
            .access_rules
            .get_access_rule(ctx, cfg::GetAccessRuleRequest { id: id.clone() })
            .await
        {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                warn!(id = %id, "access rule no longer exists; removing from state");
                return Ok(ResourceState::removed());
            }
            Err(err) => return Err(err),
        };

        let rule = response.access_rule.ok_or_else(missing_rule)?;
        let mut state = AccessRuleModel::from_proto(rule);
        state.id = Attr::Known(id);
        Ok(ResourceState::new(encode_model(&state)?)
            .with_diagnostics(diagnostics::from_remote(response.diagnostics)))
    }

    async fn update(
        &self,
        ctx: &Context,
        prior: &Value,
        planned: &Value,
    ) -> Result<ResourceState, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let prior: AccessRuleModel = decode_model(prior)?;
        let plan: AccessRuleModel = decode_model(planned)?;

        let id = prior.id.clone().require("id")?;
        let priority = match plan.priority()? {
            Some(priority) => priority,
            None => prior.priority()?.unwrap_or_default(),
        };
        let rule = cfg::AccessRule {
            id: id.clone(),
            name: plan.name.clone().require("name")?,
            priority,
            workflow_id: plan.workflow_id.clone().require("workflow_id")?,
            targets: plan.targets_to_proto()?,
            role_ids: plan.role_ids.clone().optional("role_ids")?.unwrap_or_default(),
        };
        let response = client
            .access_rules
            .update_access_rule(
                ctx,
                cfg::UpdateAccessRuleRequest {
                    access_rule: Some(rule),
                },
            )
            .await?;
        let rule = response.access_rule.ok_or_else(missing_rule)?;
        info!(id = %id, "updated access rule");

        let state = plan.apply_computed(id, &rule);
        Ok(ResourceState::new(encode_model(&state)?)
            .with_diagnostics(diagnostics::from_remote(response.diagnostics)))
    }

    async fn delete(&self, ctx: &Context, current: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let state: AccessRuleModel = decode_model(current)?;
        let id = state.id.require("id")?;

        client
            .access_rules
            .delete_access_rule(ctx, cfg::DeleteAccessRuleRequest { id: id.clone() })
            .await?;
        info!(id = %id, "deleted access rule");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AccessRuleService;
    use crate::testing::FakeControlPlane;
    use crate::value::UNKNOWN_VALUE;
    use serde_json::json;
    use std::sync::Arc;

    fn resource(fake: &Arc<FakeControlPlane>) -> AccessRuleResource {
        let mut resource = AccessRuleResource::new();
        let data = ControlPlane::from_client(fake.clone()).into_provider_data();
        resource.configure(Some(&data)).unwrap();
        resource
    }

    fn plan() -> Value {
        json!({
            "id": UNKNOWN_VALUE,
            "name": "engineers",
            "priority": 5,
            "workflow_id": "W-1",
            "targets": [
                {"type": "Okta::Group", "selector_id": "S-1"},
                {"type": "Auth0::Organization", "selector_id": "S-2"},
            ],
            "role_ids": ["admin", "viewer"],
        })
    }

    #[tokio::test]
    async fn test_create_and_read_round_trip() {
        let fake = Arc::new(FakeControlPlane::new());
        let resource = resource(&fake);

        let state = resource
            .create(&Context::background(), &plan())
            .await
            .unwrap()
            .state
            .unwrap();
        assert!(state["id"].as_str().unwrap().starts_with("R-"));
        assert_eq!(state["priority"], 5);
        assert_eq!(state["targets"][1]["selector_id"], "S-2");

        let read = resource
            .read(&Context::background(), &state)
            .await
            .unwrap()
            .state
            .unwrap();
        assert_eq!(read, state);
    }

    #[tokio::test]
    async fn test_missing_role_ids_read_back_as_null() {
        let fake = Arc::new(FakeControlPlane::new());
        let resource = resource(&fake);
        let mut planned = plan();
        planned["role_ids"] = Value::Null;

        let state = resource
            .create(&Context::background(), &planned)
            .await
            .unwrap()
            .state
            .unwrap();
        let read = resource
            .read(&Context::background(), &state)
            .await
            .unwrap()
            .state
            .unwrap();
        assert!(read["role_ids"].is_null());
    }

    #[tokio::test]
    async fn test_update_sends_full_payload_with_prior_id() {
        let fake = Arc::new(FakeControlPlane::new());
        let resource = resource(&fake);
        let state = resource
            .create(&Context::background(), &plan())
            .await
            .unwrap()
            .state
            .unwrap();
        let id = state["id"].as_str().unwrap().to_string();

        let mut planned = state.clone();
        planned["targets"] = json!([{"type": "Okta::Group", "selector_id": "S-9"}]);
        resource
            .update(&Context::background(), &state, &planned)
            .await
            .unwrap();

        let remote = fake.access_rule(&id).unwrap();
        assert_eq!(remote.targets.len(), 1);
        assert_eq!(remote.targets[0].selector_id, "S-9");
        assert_eq!(remote.role_ids, vec!["admin", "viewer"]);
        assert_eq!(remote.workflow_id, "W-1");
    }

    #[tokio::test]
    async fn test_omitted_priority_is_chosen_by_server() {
        let fake = Arc::new(FakeControlPlane::new());
        let resource = resource(&fake);
        let mut planned = plan();
        planned["priority"] = json!(UNKNOWN_VALUE);

        let state = resource
            .create(&Context::background(), &planned)
            .await
            .unwrap()
            .state
            .unwrap();
        assert_eq!(state["priority"], 100);

        let mut next = state.clone();
        next["priority"] = json!(UNKNOWN_VALUE);
        next["role_ids"] = json!(["viewer"]);
        resource
            .update(&Context::background(), &state, &next)
            .await
            .unwrap();
        assert_eq!(fake.access_rule(state["id"].as_str().unwrap()).unwrap().priority, 100);
    }

    /// Delegates to the fake but answers updates without an id.
    struct BlankIdOnUpdate(Arc<FakeControlPlane>);

    #[async_trait]
    impl AccessRuleService for BlankIdOnUpdate {
        async fn create_access_rule(
            &self,
            ctx: &Context,
            request: cfg::CreateAccessRuleRequest,
        ) -> Result<cfg::CreateAccessRuleResponse, ProviderError> {
            self.0.create_access_rule(ctx, request).await
        }

        async fn get_access_rule(
            &self,
            ctx: &Context,
            request: cfg::GetAccessRuleRequest,
        ) -> Result<cfg::GetAccessRuleResponse, ProviderError> {
            self.0.get_access_rule(ctx, request).await
        }

        async fn update_access_rule(
            &self,
            ctx: &Context,
            request: cfg::UpdateAccessRuleRequest,
        ) -> Result<cfg::UpdateAccessRuleResponse, ProviderError> {
            let mut response = self.0.update_access_rule(ctx, request).await?;
            if let Some(rule) = response.access_rule.as_mut() {
                rule.id.clear();
            }
            Ok(response)
        }

        async fn delete_access_rule(
            &self,
            ctx: &Context,
            request: cfg::DeleteAccessRuleRequest,
        ) -> Result<cfg::DeleteAccessRuleResponse, ProviderError> {
            self.0.delete_access_rule(ctx, request).await
        }
    }

    #[tokio::test]
    async fn test_update_keeps_prior_id_when_response_has_none() {
        let fake = Arc::new(FakeControlPlane::new());
        let mut control_plane = ControlPlane::from_client(fake.clone());
        control_plane.access_rules = Arc::new(BlankIdOnUpdate(fake.clone()));
        let mut resource = AccessRuleResource::new();
        resource
            .configure(Some(&control_plane.into_provider_data()))
            .unwrap();

        let state = resource
            .create(&Context::background(), &plan())
            .await
            .unwrap()
            .state
            .unwrap();
        let mut planned = state.clone();
        planned["name"] = json!("platform");

        let updated = resource
            .update(&Context::background(), &state, &planned)
            .await
            .unwrap()
            .state
            .unwrap();
        assert_eq!(updated["id"], state["id"]);
        assert_eq!(updated["name"], "platform");
    }

    #[test]
    fn test_schema_requires_a_target() {
        let schema = AccessRuleResource::new().schema();
        assert_eq!(schema.block.blocks["targets"].min_items, 1);
        assert!(schema.block.attributes["id"].use_state_for_unknown);
    }
}
