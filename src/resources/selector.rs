//! Selectors: named policy expressions matching remote entities of one type
//! inside a parent scope.
//!
//! Every selector kind shares one adapter; a [`SelectorKind`] supplies the
//! entity type, the parent type and the name of the attribute holding the
//! parent id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{control_plane_from, require_client, ControlPlane, ProviderData};
use crate::context::Context;
use crate::diagnostics;
use crate::error::ProviderError;
use crate::generated::config as cfg;
use crate::resource::{decode_model, encode_model, Resource};
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::types::ResourceState;
use crate::value::Attr;

/// Static description of a selector kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorKind {
    pub type_suffix: &'static str,
    /// Entity type the selector matches, e.g. `Okta::Group`.
    pub resource_type: &'static str,
    /// Entity type of the parent scope, e.g. `Okta::Organization`.
    pub belonging_to_type: &'static str,
    /// Host attribute holding the parent id.
    pub belonging_to_attribute: &'static str,
    /// Human name of the parent, for descriptions.
    pub parent_label: &'static str,
}

pub const AUTH0_ORGANIZATION: SelectorKind = SelectorKind {
    type_suffix: "auth0_organization_selector",
    resource_type: "Auth0::Organization",
    belonging_to_type: "Auth0::Tenant",
    belonging_to_attribute: "tenant_id",
    parent_label: "Auth0 tenant",
};

pub const ENTRA_GROUP: SelectorKind = SelectorKind {
    type_suffix: "entra_group_selector",
    resource_type: "Entra::Group",
    belonging_to_type: "Entra::Tenant",
    belonging_to_attribute: "tenant_id",
    parent_label: "Entra tenant",
};

pub const OKTA_GROUP: SelectorKind = SelectorKind {
    type_suffix: "okta_group_selector",
    resource_type: "Okta::Group",
    belonging_to_type: "Okta::Organization",
    belonging_to_attribute: "organization_id",
    parent_label: "Okta organization",
};

pub const SNOWFLAKE_DATABASE: SelectorKind = SelectorKind {
    type_suffix: "snowflake_database_selector",
    resource_type: "Snowflake::Database",
    belonging_to_type: "Snowflake::Account",
    belonging_to_attribute: "account_id",
    parent_label: "Snowflake account",
};

/// Selector fields with the parent id under a fixed name; the host-facing
/// name comes from the kind.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct SelectorModel {
    id: Attr<String>,
    name: Attr<String>,
    belonging_to_id: Attr<String>,
    when: Attr<String>,
}

pub struct SelectorResource {
    kind: SelectorKind,
    client: Option<ControlPlane>,
}

impl SelectorResource {
    pub fn new(kind: SelectorKind) -> Self {
        Self { kind, client: None }
    }

    fn decode(&self, value: &Value) -> Result<SelectorModel, ProviderError> {
        let mut fields = value.as_object().cloned().unwrap_or_default();
        let parent = fields
            .remove(self.kind.belonging_to_attribute)
            .unwrap_or(Value::Null);
        fields.insert("belonging_to_id".to_string(), parent);
        decode_model(&Value::Object(fields))
    }

    fn encode(&self, model: &SelectorModel) -> Result<Value, ProviderError> {
        let mut value = encode_model(model)?;
        if let Some(fields) = value.as_object_mut() {
            let parent = fields.remove("belonging_to_id").unwrap_or(Value::Null);
            fields.insert(self.kind.belonging_to_attribute.to_string(), parent);
        }
        Ok(value)
    }

    fn to_proto(&self, model: &SelectorModel, id: String) -> Result<cfg::Selector, ProviderError> {
        Ok(cfg::Selector {
            id,
            name: model.name.clone().require("name")?,
            resource_type: self.kind.resource_type.to_string(),
            belonging_to: Some(cfg::Eid {
                r#type: self.kind.belonging_to_type.to_string(),
                id: model
                    .belonging_to_id
                    .clone()
                    .require(self.kind.belonging_to_attribute)?,
            }),
            when: model.when.clone().require("when")?,
        })
    }

    fn from_proto(&self, selector: cfg::Selector) -> Result<SelectorModel, ProviderError> {
        if selector.resource_type != self.kind.resource_type {
            return Err(ProviderError::FailedPrecondition(format!(
                "selector {} matches {}, not {}",
                selector.id, selector.resource_type, self.kind.resource_type
            )));
        }
        Ok(SelectorModel {
            id: Attr::non_empty(selector.id),
            name: Attr::non_empty(selector.name),
            belonging_to_id: selector
                .belonging_to
                .map(|eid| Attr::non_empty(eid.id))
                .unwrap_or_default(),
            when: Attr::non_empty(selector.when),
        })
    }
}

fn missing_selector() -> ProviderError {
    ProviderError::Remote("control plane response did not include the selector".to_string())
}

#[async_trait]
impl Resource for SelectorResource {
    fn type_suffix(&self) -> &'static str {
        self.kind.type_suffix
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(format!(
                "Selects `{}` entities within an {} using a policy expression.",
                self.kind.resource_type, self.kind.parent_label
            ))
            .with_attribute("id", Attribute::id())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name of the selector."),
            )
            .with_attribute(
                self.kind.belonging_to_attribute,
                Attribute::required_string()
                    .with_description(format!("The id of the {}.", self.kind.parent_label)),
            )
            .with_attribute(
                "when",
                Attribute::required_string().with_description(
                    "The policy expression entities must satisfy to be selected.",
                ),
            )
    }

    fn configure(&mut self, data: Option<&ProviderData>) -> Result<(), ProviderError> {
        self.client = control_plane_from(data)?;
        Ok(())
    }

    async fn create(&self, ctx: &Context, planned: &Value) -> Result<ResourceState, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let mut plan = self.decode(planned)?;
        let selector = self.to_proto(&plan, String::new())?;

        let request = cfg::CreateSelectorRequest {
            name: selector.name,
            resource_type: selector.resource_type,
            belonging_to: selector.belonging_to,
            when: selector.when,
        };
        let response = client.selectors.create_selector(ctx, request).await?;
        let created = response.selector.ok_or_else(missing_selector)?;
        info!(id = %created.id, kind = self.kind.type_suffix, "created selector");

        plan.id = Attr::Known(created.id);
        Ok(ResourceState::new(self.encode(&plan)?)
            .with_diagnostics(diagnostics::from_remote(response.diagnostics)))
    }

    async fn read(&self, ctx: &Context, current: &Value) -> Result<ResourceState, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let prior = self.decode(current)?;
        let id = prior.id.require("id")?;

        let response = match client
            .selectors
            .get_selector(ctx, cfg::GetSelectorRequest { id: id.clone() })
            .await
        {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                warn!(id = %id, kind = self.kind.type_suffix, "selector no longer exists; removing from state");
                return Ok(ResourceState::removed());
            }
            Err(err) => return Err(err),
        };

        let selector = response.selector.ok_or_else(missing_selector)?;
        let mut state = self.from_proto(selector)?;
        state.id = Attr::Known(id);
        Ok(ResourceState::new(self.encode(&state)?)
            .with_diagnostics(diagnostics::from_remote(response.diagnostics)))
    }

    async fn update(
        &self,
        ctx: &Context,
        prior: &Value,
        planned: &Value,
    ) -> Result<ResourceState, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let prior = self.decode(prior)?;
        let mut plan = self.decode(planned)?;
        let id = prior.id.require("id")?;

        let request = cfg::UpdateSelectorRequest {
            selector: Some(self.to_proto(&plan, id.clone())?),
        };
        let response = client.selectors.update_selector(ctx, request).await?;
        info!(id = %id, kind = self.kind.type_suffix, "updated selector");

        plan.id = Attr::Known(id);
        Ok(ResourceState::new(self.encode(&plan)?)
            .with_diagnostics(diagnostics::from_remote(response.diagnostics)))
    }

    async fn delete(&self, ctx: &Context, current: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let id = self.decode(current)?.id.require("id")?;

        client
            .selectors
            .delete_selector(ctx, cfg::DeleteSelectorRequest { id: id.clone() })
            .await?;
        info!(id = %id, kind = self.kind.type_suffix, "deleted selector");
        Ok(Vec::new())
    }
}

pub fn auth0_organization_factory() -> Box<dyn Resource> {
    Box::new(SelectorResource::new(AUTH0_ORGANIZATION))
}

pub fn entra_group_factory() -> Box<dyn Resource> {
    Box::new(SelectorResource::new(ENTRA_GROUP))
}

pub fn okta_group_factory() -> Box<dyn Resource> {
    Box::new(SelectorResource::new(OKTA_GROUP))
}

pub fn snowflake_database_factory() -> Box<dyn Resource> {
    Box::new(SelectorResource::new(SNOWFLAKE_DATABASE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeControlPlane;
    use crate::value::UNKNOWN_VALUE;
    use serde_json::json;
    use std::sync::Arc;

    fn resource(kind: SelectorKind, fake: &Arc<FakeControlPlane>) -> SelectorResource {
        let mut resource = SelectorResource::new(kind);
        let data = ControlPlane::from_client(fake.clone()).into_provider_data();
        resource.configure(Some(&data)).unwrap();
        resource
    }

    #[test]
    fn test_schema_uses_kind_attribute() {
        let okta = SelectorResource::new(OKTA_GROUP).schema();
        assert!(okta.block.attributes.contains_key("organization_id"));
        assert!(!okta.block.attributes.contains_key("tenant_id"));

        let snowflake = SelectorResource::new(SNOWFLAKE_DATABASE);
        assert_eq!(snowflake.type_name(), "commonfate_snowflake_database_selector");
        assert!(snowflake.schema().block.attributes.contains_key("account_id"));
    }

    #[tokio::test]
    async fn test_create_sends_typed_scope() {
        let fake = Arc::new(FakeControlPlane::new());
        let resource = resource(OKTA_GROUP, &fake);
        let planned = json!({
            "id": UNKNOWN_VALUE,
            "name": "engineering groups",
            "organization_id": "acme",
            "when": "resource.name like \"eng-*\"",
        });

        let state = resource
            .create(&Context::background(), &planned)
            .await
            .unwrap()
            .state
            .unwrap();
        let id = state["id"].as_str().unwrap();
        assert!(id.starts_with("S-"));
        assert_eq!(state["organization_id"], "acme");
        assert!(state.get("belonging_to_id").is_none());

        let remote = fake.selector(id).unwrap();
        assert_eq!(remote.resource_type, "Okta::Group");
        let scope = remote.belonging_to.unwrap();
        assert_eq!(scope.r#type, "Okta::Organization");
        assert_eq!(scope.id, "acme");

        let read = resource
            .read(&Context::background(), &state)
            .await
            .unwrap()
            .state
            .unwrap();
        assert_eq!(read, state);
    }

    #[tokio::test]
    async fn test_read_refuses_other_entity_type() {
        let fake = Arc::new(FakeControlPlane::new());
        let okta = resource(OKTA_GROUP, &fake);
        let state = okta
            .create(
                &Context::background(),
                &json!({"name": "n", "organization_id": "acme", "when": "true"}),
            )
            .await
            .unwrap()
            .state
            .unwrap();

        let entra = resource(ENTRA_GROUP, &fake);
        let imported = entra.import_state(state["id"].as_str().unwrap());
        let err = entra
            .read(&Context::background(), &imported)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Okta::Group"));
    }

    #[tokio::test]
    async fn test_import_then_read() {
        let fake = Arc::new(FakeControlPlane::new());
        let resource = resource(AUTH0_ORGANIZATION, &fake);
        let created = resource
            .create(
                &Context::background(),
                &json!({"name": "orgs", "tenant_id": "t-1", "when": "true"}),
            )
            .await
            .unwrap()
            .state
            .unwrap();

        let imported = resource.import_state(created["id"].as_str().unwrap());
        assert!(imported["tenant_id"].is_null());

        let read = resource
            .read(&Context::background(), &imported)
            .await
            .unwrap()
            .state
            .unwrap();
        assert_eq!(read, created);
    }
}
