//! Integrations: connections from Common Fate to identity providers and log
//! sinks.
//!
//! The control plane stores every integration behind one service with a
//! tagged-union config. Each kind here owns exactly one variant of that
//! union. It writes only its own variant, and reading any other variant back
//! is a [`ProviderError::VariantMismatch`].

mod auth0;
mod entra;
mod okta;
mod pagerduty;
mod s3_log_destination;
mod snowflake;
mod webhook;

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{control_plane_from, require_client, ControlPlane, ProviderData};
use crate::context::Context;
use crate::diagnostics;
use crate::error::ProviderError;
use crate::generated::integration::{self, config::Config as Variant};
use crate::resource::{decode_model, encode_model, Resource};
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::types::ResourceState;
use crate::value::Attr;

pub use auth0::{Auth0, Auth0Config};
pub use entra::{Entra, EntraConfig};
pub use okta::{Okta, OktaConfig};
pub use pagerduty::{PagerDuty, PagerDutyConfig};
pub use s3_log_destination::{S3LogDestination, S3LogDestinationConfig};
pub use snowflake::{Snowflake, SnowflakeConfig};
pub use webhook::{Webhook, WebhookConfig, WebhookHeaderModel};

/// One variant of the integration config union.
pub trait IntegrationKind: Send + Sync + 'static {
    /// The type name suffix, e.g. `okta_integration`.
    const TYPE_SUFFIX: &'static str;
    /// The union variant this kind owns, as named by [`variant_name`].
    const VARIANT: &'static str;
    const DESCRIPTION: &'static str;

    /// Host-side fields of the variant. `id` and `name` are handled by
    /// [`IntegrationResource`].
    type Config: Serialize + DeserializeOwned + Default + Send + Sync;

    /// Add the variant's attributes to the shared `id`/`name` schema.
    fn extend_schema(schema: Schema) -> Schema;

    fn to_variant(config: &Self::Config) -> Result<Variant, ProviderError>;

    /// Decode this kind's variant, or `None` for any other variant.
    fn from_variant(variant: Variant) -> Option<Self::Config>;
}

/// Stable name of a config variant, used in mismatch errors.
pub fn variant_name(variant: &Variant) -> &'static str {
    match variant {
        Variant::Auth0(_) => "auth0",
        Variant::Entra(_) => "entra",
        Variant::Okta(_) => "okta",
        Variant::Snowflake(_) => "snowflake",
        Variant::PagerDuty(_) => "pager_duty",
        Variant::Webhook(_) => "webhook",
        Variant::S3LogDestination(_) => "s3_log_destination",
    }
}

/// The populated variant of a config, refusing a config with none set.
pub fn config_variant(config: Option<&integration::Config>) -> Result<&Variant, ProviderError> {
    config
        .and_then(|c| c.config.as_ref())
        .ok_or_else(|| ProviderError::Validation("integration config has no variant set".to_string()))
}

/// Decode `K`'s config from a remote config, which must carry `K`'s variant.
pub fn from_remote_config<K: IntegrationKind>(
    config: Option<integration::Config>,
) -> Result<K::Config, ProviderError> {
    let Some(variant) = config.and_then(|c| c.config) else {
        return Err(mismatch::<K>("none"));
    };
    let found = variant_name(&variant);
    K::from_variant(variant).ok_or_else(|| mismatch::<K>(found))
}

fn mismatch<K: IntegrationKind>(found: &str) -> ProviderError {
    ProviderError::VariantMismatch {
        expected: K::VARIANT.to_string(),
        found: found.to_string(),
    }
}

/// Encode `K`'s config as a remote config with exactly one variant.
pub fn to_remote_config<K: IntegrationKind>(
    config: &K::Config,
) -> Result<integration::Config, ProviderError> {
    let remote = integration::Config {
        config: Some(K::to_variant(config)?),
    };
    let variant = config_variant(Some(&remote))?;
    if variant_name(variant) != K::VARIANT {
        return Err(mismatch::<K>(variant_name(variant)));
    }
    Ok(remote)
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct IntegrationModel<C> {
    id: Attr<String>,
    name: Attr<String>,
    #[serde(flatten)]
    config: C,
}

/// The lifecycle shared by every integration kind.
pub struct IntegrationResource<K: IntegrationKind> {
    client: Option<ControlPlane>,
    kind: PhantomData<K>,
}

impl<K: IntegrationKind> IntegrationResource<K> {
    pub fn new() -> Self {
        Self {
            client: None,
            kind: PhantomData,
        }
    }

    pub fn factory() -> Box<dyn Resource> {
        Box::new(Self::new())
    }

    fn decode(value: &Value) -> Result<IntegrationModel<K::Config>, ProviderError> {
        decode_model(value)
    }

    fn from_proto(integration: integration::Integration) -> Result<IntegrationModel<K::Config>, ProviderError> {
        Ok(IntegrationModel {
            id: Attr::non_empty(integration.id),
            name: Attr::non_empty(integration.name),
            config: from_remote_config::<K>(integration.config)?,
        })
    }
}

impl<K: IntegrationKind> Default for IntegrationResource<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_integration() -> ProviderError {
    ProviderError::Remote("control plane response did not include the integration".to_string())
}

#[async_trait]
impl<K: IntegrationKind> Resource for IntegrationResource<K> {
    fn type_suffix(&self) -> &'static str {
        K::TYPE_SUFFIX
    }

    fn schema(&self) -> Schema {
        let base = Schema::v0()
            .with_description(K::DESCRIPTION)
            .with_attribute("id", Attribute::id())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name of the integration."),
            );
        K::extend_schema(base)
    }

    fn configure(&mut self, data: Option<&ProviderData>) -> Result<(), ProviderError> {
        self.client = control_plane_from(data)?;
        Ok(())
    }

    async fn create(&self, ctx: &Context, planned: &Value) -> Result<ResourceState, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let mut plan = Self::decode(planned)?;

        let request = integration::CreateIntegrationRequest {
            name: plan.name.clone().require("name")?,
            config: Some(to_remote_config::<K>(&plan.config)?),
        };
        let response = client.integrations.create_integration(ctx, request).await?;
        let created = response.integration.ok_or_else(missing_integration)?;
        info!(id = %created.id, kind = K::VARIANT, "created integration");

        plan.id = Attr::Known(created.id);
        Ok(ResourceState::new(encode_model(&plan)?)
            .with_diagnostics(diagnostics::from_remote(response.diagnostics)))
    }

    async fn read(&self, ctx: &Context, current: &Value) -> Result<ResourceState, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let prior = Self::decode(current)?;
        let id = prior.id.require("id")?;

        let response = match client
            .integrations
            .get_integration(ctx, integration::GetIntegrationRequest { id: id.clone() })
            .await
        {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                warn!(id = %id, kind = K::VARIANT, "integration no longer exists; removing from state");
                return Ok(ResourceState::removed());
            }
            Err(err) => return Err(err),
        };

        let remote = response.integration.ok_or_else(missing_integration)?;
        let mut state = Self::from_proto(remote)?;
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
        let id = Self::decode(prior)?.id.require("id")?;
        let mut plan = Self::decode(planned)?;

        let request = integration::UpdateIntegrationRequest {
            integration: Some(integration::Integration {
                id: id.clone(),
                name: plan.name.clone().require("name")?,
                config: Some(to_remote_config::<K>(&plan.config)?),
            }),
        };
        let response = client.integrations.update_integration(ctx, request).await?;
        info!(id = %id, kind = K::VARIANT, "updated integration");

        plan.id = Attr::Known(id);
        Ok(ResourceState::new(encode_model(&plan)?)
            .with_diagnostics(diagnostics::from_remote(response.diagnostics)))
    }

    async fn delete(&self, ctx: &Context, current: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let id = Self::decode(current)?.id.require("id")?;

        client
            .integrations
            .delete_integration(ctx, integration::DeleteIntegrationRequest { id: id.clone() })
            .await?;
        info!(id = %id, kind = K::VARIANT, "deleted integration");
        Ok(Vec::new())
    }
}

/// Map an optional set of action names onto the wire filter.
///
/// Null leaves the filter unset; an empty set is sent as an empty filter.
pub(crate) fn action_filter_to_proto(
    actions: &Attr<Vec<String>>,
) -> Result<Option<integration::ActionFilter>, ProviderError> {
    Ok(actions
        .clone()
        .optional("filter_for_actions")?
        .map(|actions| integration::ActionFilter { actions }))
}

pub(crate) fn action_filter_from_proto(filter: Option<integration::ActionFilter>) -> Attr<Vec<String>> {
    filter.map(|f| f.actions).into()
}

/// The set-of-actions attribute shared by the log sinks.
pub(crate) fn filter_for_actions_attribute() -> Attribute {
    Attribute::optional_string_set().with_description(
        "Only forward events for these actions. All events are forwarded when unset; none when empty.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeControlPlane;
    use std::sync::Arc;

    #[test]
    fn test_variant_names() {
        let variant = Variant::PagerDuty(integration::PagerDuty::default());
        assert_eq!(variant_name(&variant), "pager_duty");
    }

    #[test]
    fn test_config_without_variant_is_refused() {
        let err = config_variant(Some(&integration::Config { config: None })).unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(config_variant(None).is_err());
    }

    #[test]
    fn test_from_remote_config_mismatch() {
        let auth0 = integration::Config {
            config: Some(Variant::Auth0(integration::Auth0::default())),
        };
        match from_remote_config::<Okta>(Some(auth0)).unwrap_err() {
            ProviderError::VariantMismatch { expected, found } => {
                assert_eq!(expected, "okta");
                assert_eq!(found, "auth0");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        match from_remote_config::<Okta>(None).unwrap_err() {
            ProviderError::VariantMismatch { found, .. } => assert_eq!(found, "none"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_action_filter_keeps_null_and_empty_apart() {
        assert_eq!(action_filter_to_proto(&Attr::Null).unwrap(), None);
        assert_eq!(
            action_filter_to_proto(&Attr::Known(vec![])).unwrap(),
            Some(integration::ActionFilter { actions: vec![] })
        );
        assert_eq!(action_filter_from_proto(None), Attr::Null);
        assert_eq!(
            action_filter_from_proto(Some(integration::ActionFilter { actions: vec![] })),
            Attr::Known(vec![])
        );
    }

    #[tokio::test]
    async fn test_read_of_other_kind_leaves_state_untouched() {
        let fake = Arc::new(FakeControlPlane::new());
        let data = ControlPlane::from_client(fake.clone()).into_provider_data();

        let mut auth0 = IntegrationResource::<Auth0>::new();
        auth0.configure(Some(&data)).unwrap();
        let created = auth0
            .create(
                &Context::background(),
                &serde_json::json!({
                    "name": "auth0",
                    "domain": "acme.auth0.com",
                    "client_id": "cid",
                    "client_secret_secret_path": "secrets/auth0",
                }),
            )
            .await
            .unwrap()
            .state
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let mut okta = IntegrationResource::<Okta>::new();
        okta.configure(Some(&data)).unwrap();
        let imported = okta.import_state(&id);
        let err = okta
            .read(&Context::background(), &imported)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::VariantMismatch { .. }));

        // The remote auth0 integration is untouched.
        let remote = fake.integration(&id).unwrap();
        assert_eq!(variant_name(config_variant(remote.config.as_ref()).unwrap()), "auth0");
        assert_eq!(fake.call_count("UpdateIntegration"), 0);
    }
}
