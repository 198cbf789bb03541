//! The Common Fate provider shell.
//!
//! [`CommonFateProvider`] owns the registry of resource kinds and the
//! control-plane handle published by Configure. Every resource call builds a
//! fresh adapter from its factory, hands it the provider data and runs one
//! operation on it.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{
    AccessRuleService, AccessWorkflowService, ControlPlane, IntegrationService, ProviderData,
    SelectorService,
};
use crate::config::{provider_schema, ProviderConfig};
use crate::context::Context;
use crate::error::ProviderError;
use crate::plan::plan_resource;
use crate::resource::{Resource, ResourceFactory};
use crate::resources;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata, ResourceState, ServerCapabilities};
use crate::validation;

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Manages Common Fate access workflows, access rules, selectors and
/// integrations.
pub struct CommonFateProvider {
    factories: HashMap<String, ResourceFactory>,
    data: OnceLock<ProviderData>,
    env: EnvLookup,
}

impl Default for CommonFateProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CommonFateProvider {
    /// An unconfigured provider that reads credentials from the process
    /// environment.
    pub fn new() -> Self {
        let factories = resources::all()
            .into_iter()
            .map(|factory| (factory().type_name(), factory))
            .collect();
        Self {
            factories,
            data: OnceLock::new(),
            env: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// A provider already bound to `client`, as if Configure had run.
    pub fn with_control_plane<C>(client: Arc<C>) -> Self
    where
        C: IntegrationService + SelectorService + AccessWorkflowService + AccessRuleService + 'static,
    {
        let provider = Self::new();
        let _ = provider
            .data
            .set(ControlPlane::from_client(client).into_provider_data());
        provider
    }

    /// Replace the environment lookup used for credential fallbacks.
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(env);
        self
    }

    /// Whether Configure has published a control-plane client.
    pub fn is_configured(&self) -> bool {
        self.data.get().is_some()
    }

    /// Build and configure a fresh adapter for `resource_type`.
    fn resource(&self, resource_type: &str) -> Result<Box<dyn Resource>, ProviderError> {
        let factory = self
            .factories
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))?;
        let mut resource = factory();
        resource.configure(self.data.get())?;
        Ok(resource)
    }
}

#[async_trait::async_trait]
impl ProviderService for CommonFateProvider {
    fn schema(&self) -> ProviderSchema {
        self.factories.iter().fold(
            ProviderSchema::new().with_provider_config(provider_schema()),
            |schema, (name, factory)| schema.with_resource(name.clone(), factory().schema()),
        )
    }

    fn metadata(&self) -> ProviderMetadata {
        let mut resources: Vec<String> = self.factories.keys().cloned().collect();
        resources.sort();
        ProviderMetadata {
            resources,
            capabilities: ServerCapabilities { plan_destroy: true },
        }
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validation::validate(&provider_schema(), &config))
    }

    async fn configure(&self, _ctx: &Context, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        if self.is_configured() {
            warn!("provider is already configured; ignoring repeated Configure");
            return Ok(vec![]);
        }

        let config = match ProviderConfig::resolve_with(&config, |name| (self.env)(name)) {
            Ok(config) => config,
            Err(diagnostics) => return Ok(diagnostics),
        };

        let control_plane = ControlPlane::connect(&config)?;
        if self.data.set(control_plane.into_provider_data()).is_err() {
            warn!("provider was configured concurrently; keeping the first client");
            return Ok(vec![]);
        }

        info!(host = %config.host, username = %config.username, "configured Common Fate client");
        Ok(vec![])
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        debug!("provider stopped");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(validation::validate(&resource.schema(), &config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(plan_resource(
            &resource.schema(),
            prior_state.as_ref(),
            &proposed_state,
            &config,
        ))
    }

    async fn create(
        &self,
        ctx: &Context,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<ResourceState, ProviderError> {
        self.resource(resource_type)?
            .create(ctx, &planned_state)
            .await
    }

    async fn read(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<ResourceState, ProviderError> {
        self.resource(resource_type)?
            .read(ctx, &current_state)
            .await
    }

    async fn update(
        &self,
        ctx: &Context,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<ResourceState, ProviderError> {
        self.resource(resource_type)?
            .update(ctx, &prior_state, &planned_state)
            .await
    }

    async fn delete(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        self.resource(resource_type)?
            .delete(ctx, &current_state)
            .await
    }

    async fn import_resource(
        &self,
        _ctx: &Context,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(vec![ImportedResource::new(
            resource_type,
            resource.import_state(id),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generated::{diagnostic as remote, integration};
    use crate::schema::{has_errors, DiagnosticSeverity};
    use crate::testing::{
        assert_error_contains, assert_no_errors, assert_plan_creates, assert_plan_no_changes,
        FakeControlPlane, ProviderTester,
    };
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio_test::{assert_err, assert_ok};

    fn tester(fake: &Arc<FakeControlPlane>) -> ProviderTester<CommonFateProvider> {
        ProviderTester::new(CommonFateProvider::with_control_plane(fake.clone()))
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[tokio::test]
    async fn test_webhook_create_and_read_back() {
        let fake = Arc::new(FakeControlPlane::new());
        let tester = tester(&fake);
        let config = json!({
            "name": "notify",
            "url": "https://example.test/hook",
            "filter_for_actions": ["grant.approved"],
        });

        let plan = tester
            .plan_create("commonfate_webhook_integration", config.clone())
            .await
            .unwrap();
        assert_plan_creates(&plan);
        assert_eq!(plan.planned_state["send_audit_log_events"], false);

        let state = tester
            .lifecycle_create("commonfate_webhook_integration", config)
            .await
            .unwrap();
        let id = state["id"].as_str().unwrap();
        assert!(id.starts_with("I-"));
        assert_eq!(state["filter_for_actions"], json!(["grant.approved"]));
        assert!(state["headers"].is_null());

        let remote = fake.integration(id).unwrap();
        match remote.config.unwrap().config.unwrap() {
            integration::config::Config::Webhook(webhook) => {
                assert_eq!(webhook.url, "https://example.test/hook");
                assert!(!webhook.send_audit_log_events);
                assert!(!webhook.send_authorization_events);
                assert_eq!(webhook.filter_for_actions.unwrap().actions, vec!["grant.approved"]);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_s3_defaults_plan_without_diff() {
        let fake = Arc::new(FakeControlPlane::new());
        let tester = tester(&fake);
        let config = json!({
            "name": "audit-logs",
            "bucket_name": "acme-audit",
            "role_arn": "arn:aws:iam::123456789012:role/commonfate-logs",
        });

        let state = tester
            .lifecycle_create("commonfate_s3_log_destination", config.clone())
            .await
            .unwrap();
        assert_eq!(state["batch_duration_in_minutes"], 5);
        assert_eq!(state["maximum_batch_size"], 5000);

        let remote = fake.integration(state["id"].as_str().unwrap()).unwrap();
        match remote.config.unwrap().config.unwrap() {
            integration::config::Config::S3LogDestination(s3) => {
                assert_eq!(s3.batch_duration_minutes, 5);
                assert_eq!(s3.maximum_batch_size, 5000);
            }
            other => panic!("unexpected variant: {:?}", other),
        }

        let plan = tester
            .plan_update("commonfate_s3_log_destination", state, config)
            .await
            .unwrap();
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn test_s3_batch_duration_below_minimum_is_refused() {
        let tester = tester(&Arc::new(FakeControlPlane::new()));
        let result = tester
            .validate_resource_config(
                "commonfate_s3_log_destination",
                json!({
                    "name": "audit-logs",
                    "bucket_name": "acme-audit",
                    "role_arn": "arn:aws:iam::123456789012:role/commonfate-logs",
                    "batch_duration_in_minutes": 1,
                }),
            )
            .await;
        assert_err!(result);
    }

    #[tokio::test]
    async fn test_workflow_optional_fields_stay_null() {
        let fake = Arc::new(FakeControlPlane::new());
        let tester = tester(&fake);

        let state = tester
            .lifecycle_create(
                "commonfate_access_workflow",
                json!({
                    "name": "default",
                    "access_duration": 7200,
                    "try_extend_after": 3600,
                }),
            )
            .await
            .unwrap();

        assert!(state["activation_expiry"].is_null());
        assert!(state["default_duration"].is_null());
        assert_eq!(state["priority"], 100);

        let remote = fake.workflow(state["id"].as_str().unwrap()).unwrap();
        assert_eq!(remote.activation_expiry_seconds, None);
        assert_eq!(remote.default_duration_seconds, None);
    }

    #[tokio::test]
    async fn test_drift_drops_instance_without_error() {
        let fake = Arc::new(FakeControlPlane::new());
        let tester = tester(&fake);

        let read = tester
            .read(
                "commonfate_access_workflow",
                json!({"id": "W-123", "name": "deleted out of band"}),
            )
            .await
            .unwrap();

        assert!(read.is_removed());
        assert!(read.diagnostics.is_empty());
        assert_eq!(fake.call_count("GetAccessWorkflow"), 1);
    }

    #[tokio::test]
    async fn test_import_then_read_then_plan_is_clean() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.insert_integration(integration::Integration {
            id: "I-42".to_string(),
            name: "okta".to_string(),
            config: Some(integration::Config {
                config: Some(integration::config::Config::Okta(integration::Okta {
                    organization_id: "acme".to_string(),
                    api_key_secret_path: "secrets/okta".to_string(),
                })),
            }),
        });
        let tester = tester(&fake);

        let imported = tester
            .import_resource("commonfate_okta_integration", "I-42")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].state["id"], "I-42");
        assert!(imported[0].state["organization_id"].is_null());

        let state = tester
            .read("commonfate_okta_integration", imported[0].state.clone())
            .await
            .unwrap()
            .state
            .unwrap();
        assert_eq!(state["organization_id"], "acme");

        let plan = tester
            .plan_update(
                "commonfate_okta_integration",
                state,
                json!({
                    "name": "okta",
                    "organization_id": "acme",
                    "api_key_secret_path": "secrets/okta",
                }),
            )
            .await
            .unwrap();
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn test_variant_swap_is_a_mismatch() {
        let fake = Arc::new(FakeControlPlane::new());
        let tester = tester(&fake);
        let state = tester
            .lifecycle_create(
                "commonfate_okta_integration",
                json!({
                    "name": "okta",
                    "organization_id": "acme",
                    "api_key_secret_path": "secrets/okta",
                }),
            )
            .await
            .unwrap();
        let id = state["id"].as_str().unwrap();

        let auth0 = integration::Config {
            config: Some(integration::config::Config::Auth0(integration::Auth0 {
                domain: "acme.auth0.com".to_string(),
                client_id: "cid".to_string(),
                client_secret_secret_path: "secrets/auth0".to_string(),
            })),
        };
        assert!(fake.replace_integration_config(id, auth0.clone()));

        let err = tester
            .read("commonfate_okta_integration", state.clone())
            .await
            .unwrap_err();
        match &err {
            ProviderError::VariantMismatch { expected, found } => {
                assert_eq!(expected, "okta");
                assert_eq!(found, "auth0");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_error_contains(&[crate::diagnostics::from_error(&err)], "variant mismatch");

        // Nothing was written back.
        assert_eq!(fake.integration(id).unwrap().config, Some(auth0));
        assert_eq!(fake.call_count("UpdateIntegration"), 0);
    }

    #[tokio::test]
    async fn test_delete_is_a_single_call() {
        let fake = Arc::new(FakeControlPlane::new());
        let tester = tester(&fake);
        let state = tester
            .lifecycle_create(
                "commonfate_okta_group_selector",
                json!({
                    "name": "eng",
                    "organization_id": "acme",
                    "when": "resource.name like \"eng-*\"",
                }),
            )
            .await
            .unwrap();

        let diagnostics = tester
            .lifecycle_delete("commonfate_okta_group_selector", state.clone())
            .await
            .unwrap();
        assert_no_errors(&diagnostics);
        assert_eq!(fake.call_count("DeleteSelector"), 1);

        // A second delete surfaces not-found and is not retried.
        let err = tester
            .delete("commonfate_okta_group_selector", state)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fake.call_count("DeleteSelector"), 2);
    }

    #[tokio::test]
    async fn test_update_carries_prior_id() {
        let fake = Arc::new(FakeControlPlane::new());
        let tester = tester(&fake);
        let state = tester
            .lifecycle_create(
                "commonfate_access_workflow",
                json!({"name": "default", "access_duration": 7200, "try_extend_after": 3600}),
            )
            .await
            .unwrap();

        let updated = tester
            .lifecycle_update(
                "commonfate_access_workflow",
                state.clone(),
                json!({"name": "renamed", "access_duration": 7200, "try_extend_after": 3600}),
            )
            .await
            .unwrap();

        assert_eq!(updated["id"], state["id"]);
        assert_eq!(updated["name"], "renamed");
        assert_eq!(fake.last_updated_id().as_deref(), state["id"].as_str());
    }

    #[tokio::test]
    async fn test_reordered_filter_plans_no_change() {
        let fake = Arc::new(FakeControlPlane::new());
        let tester = tester(&fake);
        let config = json!({
            "name": "notify",
            "url": "https://example.test/hook",
            "filter_for_actions": ["grant.approved", "grant.revoked"],
        });
        let state = tester
            .lifecycle_create("commonfate_webhook_integration", config)
            .await
            .unwrap();

        let plan = tester
            .plan_update(
                "commonfate_webhook_integration",
                state,
                json!({
                    "name": "notify",
                    "url": "https://example.test/hook",
                    "filter_for_actions": ["grant.revoked", "grant.approved"],
                }),
            )
            .await
            .unwrap();
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn test_empty_and_null_filters_stay_distinct() {
        let fake = Arc::new(FakeControlPlane::new());
        let tester = tester(&fake);

        let empty = json!({
            "name": "quiet",
            "url": "https://example.test/hook",
            "filter_for_actions": [],
        });
        let plan = tester
            .plan_create("commonfate_webhook_integration", empty.clone())
            .await
            .unwrap();
        assert_no_errors(&plan.diagnostics);
        assert_eq!(plan.planned_state["filter_for_actions"], json!([]));

        let state = tester
            .lifecycle_create("commonfate_webhook_integration", empty.clone())
            .await
            .unwrap();
        let read = tester
            .read("commonfate_webhook_integration", state.clone())
            .await
            .unwrap()
            .state
            .unwrap();
        assert_eq!(read["filter_for_actions"], json!([]));
        let plan = tester
            .plan_update("commonfate_webhook_integration", read, empty)
            .await
            .unwrap();
        assert_plan_no_changes(&plan);

        let unset = tester
            .lifecycle_create(
                "commonfate_webhook_integration",
                json!({"name": "loud", "url": "https://example.test/hook"}),
            )
            .await
            .unwrap();
        let read = tester
            .read("commonfate_webhook_integration", unset.clone())
            .await
            .unwrap()
            .state
            .unwrap();
        assert!(read["filter_for_actions"].is_null());

        let remote = fake.integration(unset["id"].as_str().unwrap()).unwrap();
        match remote.config.unwrap().config.unwrap() {
            integration::config::Config::Webhook(webhook) => {
                assert!(webhook.filter_for_actions.is_none())
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_warnings_still_write_state() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.push_diagnostics(vec![remote::Diagnostic {
            level: remote::DiagnosticLevel::Warning as i32,
            message: "workflow has no approvers".to_string(),
            path: "name".to_string(),
        }]);
        let tester = tester(&fake);

        let created = tester
            .create(
                "commonfate_access_workflow",
                json!({"name": "default", "access_duration": 7200, "try_extend_after": 3600}),
            )
            .await
            .unwrap();

        assert!(created.state.is_some());
        assert_eq!(created.diagnostics.len(), 1);
        assert_eq!(created.diagnostics[0].severity, DiagnosticSeverity::Warning);
        assert_eq!(created.diagnostics[0].attribute.as_deref(), Some("name"));
    }

    #[tokio::test]
    async fn test_remote_errors_still_write_state() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.push_diagnostics(vec![remote::Diagnostic {
            level: remote::DiagnosticLevel::Error as i32,
            message: "selector matched nothing".to_string(),
            path: String::new(),
        }]);
        let tester = tester(&fake);

        let created = tester
            .create(
                "commonfate_entra_group_selector",
                json!({"name": "none", "tenant_id": "t-1", "when": "false"}),
            )
            .await
            .unwrap();

        assert!(created.state.is_some());
        assert!(has_errors(&created.diagnostics));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_refuses_resource_calls() {
        let provider = CommonFateProvider::new().with_env(no_env);
        let tester = ProviderTester::new(provider);

        // Schema-only operations work before Configure.
        let plan = tester
            .plan_create(
                "commonfate_access_workflow",
                json!({"name": "default", "access_duration": 7200, "try_extend_after": 3600}),
            )
            .await;
        assert_ok!(plan);

        let err = tester
            .create(
                "commonfate_access_workflow",
                json!({"name": "default", "access_duration": 7200, "try_extend_after": 3600}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unconfigured(_)));
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let tester = tester(&Arc::new(FakeControlPlane::new()));
        let err = tester
            .read("commonfate_nonexistent", json!({"id": "X-1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_configure_reports_missing_credentials() {
        let provider = CommonFateProvider::new().with_env(no_env);
        let diagnostics = provider
            .configure(&Context::background(), json!({"host": "cf.example.test"}))
            .await
            .unwrap();

        let attributes: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert_eq!(attributes, vec!["username", "password"]);
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_configure_uses_env_and_runs_once() {
        let provider = CommonFateProvider::new().with_env(|name| match name {
            crate::config::HOST_ENV => Some("http://cf.example.test".to_string()),
            crate::config::USERNAME_ENV => Some("svc".to_string()),
            crate::config::PASSWORD_ENV => Some("hunter2".to_string()),
            _ => None,
        });

        let diagnostics = provider
            .configure(&Context::background(), json!({}))
            .await
            .unwrap();
        assert_no_errors(&diagnostics);
        assert!(provider.is_configured());

        // A repeated Configure is ignored, even with a broken block.
        let again = provider
            .configure(&Context::background(), json!({"host": 42}))
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_stop_cancels_stalled_call() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.stall();
        let (stop, rx) = watch::channel(false);
        let tester = tester(&fake).with_context(Context::background().with_stop(rx));

        let read = tester.read("commonfate_access_rule", json!({"id": "R-1"}));
        let stopper = async {
            tokio::task::yield_now().await;
            stop.send_replace(true);
        };
        let (result, _) = tokio::join!(read, stopper);

        assert!(matches!(result.unwrap_err(), ProviderError::Cancelled(_)));
    }

    #[tokio::test]
    async fn test_deadline_is_reported() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.stall();
        let tester = tester(&fake)
            .with_context(Context::background().with_timeout(Duration::from_millis(10)));

        let err = tester
            .create(
                "commonfate_access_workflow",
                json!({"name": "default", "access_duration": 7200, "try_extend_after": 3600}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::DeadlineExceeded(_)));
        assert!(fake.workflow("W-1").is_none());
    }

    #[test]
    fn test_metadata_and_schema_cover_every_kind() {
        let provider = CommonFateProvider::new();
        let metadata = provider.metadata();
        assert_eq!(metadata.resources.len(), 13);
        assert!(metadata.capabilities.plan_destroy);

        let schema = provider.schema();
        assert_eq!(schema.resources.len(), 13);
        assert!(schema.provider.block.attributes["password"].flags.sensitive);
    }
}
