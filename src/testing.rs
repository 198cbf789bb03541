//! Testing utilities for the provider.
//!
//! [`FakeControlPlane`] is an in-memory Common Fate control plane that
//! implements all four service traits, so resource adapters and the
//! provider shell can be exercised without a network.
//! [`ProviderTester`] drives a [`ProviderService`] without a gRPC server.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hemmer_provider_commonfate::provider::CommonFateProvider;
//! use hemmer_provider_commonfate::testing::{FakeControlPlane, ProviderTester};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_workflow() {
//!     let fake = Arc::new(FakeControlPlane::new());
//!     let tester = ProviderTester::new(CommonFateProvider::with_control_plane(fake.clone()));
//!
//!     let state = tester
//!         .lifecycle_create("commonfate_access_workflow", json!({
//!             "name": "default",
//!             "access_duration": 7200,
//!             "try_extend_after": 3600,
//!         }))
//!         .await
//!         .unwrap();
//!
//!     assert!(fake.workflow(state["id"].as_str().unwrap()).is_some());
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{AccessRuleService, AccessWorkflowService, IntegrationService, SelectorService};
use crate::context::Context;
use crate::error::ProviderError;
use crate::generated::{config as cfg, diagnostic as remote, integration};
use crate::resources::integration::config_variant;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult, ResourceState};

/// Priority the fake assigns to workflows and rules created without one.
pub const DEFAULT_PRIORITY: i32 = 100;

#[derive(Default)]
struct FakeState {
    next_id: u64,
    integrations: BTreeMap<String, integration::Integration>,
    selectors: BTreeMap<String, cfg::Selector>,
    workflows: BTreeMap<String, cfg::AccessWorkflow>,
    access_rules: BTreeMap<String, cfg::AccessRule>,
    calls: Vec<String>,
    last_updated_id: Option<String>,
    pending_diagnostics: Vec<remote::Diagnostic>,
}

impl FakeState {
    fn new_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn take_diagnostics(&mut self) -> Vec<remote::Diagnostic> {
        std::mem::take(&mut self.pending_diagnostics)
    }

    fn updated(&mut self, id: &str) {
        self.last_updated_id = Some(id.to_string());
    }
}

fn not_found(kind: &str, id: &str) -> ProviderError {
    ProviderError::NotFound(format!("{} {} not found", kind, id))
}

fn missing_body(kind: &str) -> ProviderError {
    ProviderError::InvalidRequest(format!("update request has no {}", kind))
}

/// An in-memory control plane.
///
/// Ids are assigned from one counter with a per-kind prefix: `I-` for
/// integrations, `S-` for selectors, `W-` for workflows and `R-` for access
/// rules. Get, update and delete of an unknown id return
/// [`ProviderError::NotFound`]. Every call is recorded by its RPC method
/// name, e.g. `CreateAccessWorkflow`.
#[derive(Default)]
pub struct FakeControlPlane {
    state: Mutex<FakeState>,
    stalled: AtomicBool,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `method`, then run `op` against the store under the call's
    /// context.
    async fn call<T, F>(&self, ctx: &Context, method: &str, op: F) -> Result<T, ProviderError>
    where
        T: Send,
        F: FnOnce(&mut FakeState) -> Result<T, ProviderError> + Send,
    {
        self.lock().calls.push(method.to_string());
        ctx.run(async {
            if self.stalled.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            op(&mut self.lock())
        })
        .await
    }

    /// Make every subsequent call hang until its deadline passes or the
    /// provider is stopped.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    /// Attach diagnostics to the next response that carries any.
    pub fn push_diagnostics(&self, diagnostics: Vec<remote::Diagnostic>) {
        self.lock().pending_diagnostics.extend(diagnostics);
    }

    /// Number of recorded calls to `method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == method).count()
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// The id carried by the most recent successful update.
    pub fn last_updated_id(&self) -> Option<String> {
        self.lock().last_updated_id.clone()
    }

    pub fn integration(&self, id: &str) -> Option<integration::Integration> {
        self.lock().integrations.get(id).cloned()
    }

    pub fn selector(&self, id: &str) -> Option<cfg::Selector> {
        self.lock().selectors.get(id).cloned()
    }

    pub fn workflow(&self, id: &str) -> Option<cfg::AccessWorkflow> {
        self.lock().workflows.get(id).cloned()
    }

    pub fn access_rule(&self, id: &str) -> Option<cfg::AccessRule> {
        self.lock().access_rules.get(id).cloned()
    }

    // Out-of-band changes, as if made outside the provider.

    pub fn insert_integration(&self, integration: integration::Integration) {
        self.lock()
            .integrations
            .insert(integration.id.clone(), integration);
    }

    pub fn insert_selector(&self, selector: cfg::Selector) {
        self.lock().selectors.insert(selector.id.clone(), selector);
    }

    pub fn insert_workflow(&self, workflow: cfg::AccessWorkflow) {
        self.lock().workflows.insert(workflow.id.clone(), workflow);
    }

    pub fn insert_access_rule(&self, rule: cfg::AccessRule) {
        self.lock().access_rules.insert(rule.id.clone(), rule);
    }

    /// Delete any object with this id. Returns whether one existed.
    pub fn remove(&self, id: &str) -> bool {
        let mut state = self.lock();
        state.integrations.remove(id).is_some()
            | state.selectors.remove(id).is_some()
            | state.workflows.remove(id).is_some()
            | state.access_rules.remove(id).is_some()
    }

    /// Swap an integration's config, e.g. to another variant.
    pub fn replace_integration_config(&self, id: &str, config: integration::Config) -> bool {
        match self.lock().integrations.get_mut(id) {
            Some(existing) => {
                existing.config = Some(config);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl IntegrationService for FakeControlPlane {
    async fn create_integration(
        &self,
        ctx: &Context,
        request: integration::CreateIntegrationRequest,
    ) -> Result<integration::CreateIntegrationResponse, ProviderError> {
        self.call(ctx, "CreateIntegration", move |state| {
            config_variant(request.config.as_ref())?;
            let created = integration::Integration {
                id: state.new_id("I"),
                name: request.name,
                config: request.config,
            };
            state.integrations.insert(created.id.clone(), created.clone());
            Ok(integration::CreateIntegrationResponse {
                integration: Some(created),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn get_integration(
        &self,
        ctx: &Context,
        request: integration::GetIntegrationRequest,
    ) -> Result<integration::GetIntegrationResponse, ProviderError> {
        self.call(ctx, "GetIntegration", move |state| {
            let found = state
                .integrations
                .get(&request.id)
                .cloned()
                .ok_or_else(|| not_found("integration", &request.id))?;
            Ok(integration::GetIntegrationResponse {
                integration: Some(found),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn update_integration(
        &self,
        ctx: &Context,
        request: integration::UpdateIntegrationRequest,
    ) -> Result<integration::UpdateIntegrationResponse, ProviderError> {
        self.call(ctx, "UpdateIntegration", move |state| {
            let updated = request.integration.ok_or_else(|| missing_body("integration"))?;
            config_variant(updated.config.as_ref())?;
            if !state.integrations.contains_key(&updated.id) {
                return Err(not_found("integration", &updated.id));
            }
            state.updated(&updated.id);
            state.integrations.insert(updated.id.clone(), updated.clone());
            Ok(integration::UpdateIntegrationResponse {
                integration: Some(updated),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn delete_integration(
        &self,
        ctx: &Context,
        request: integration::DeleteIntegrationRequest,
    ) -> Result<integration::DeleteIntegrationResponse, ProviderError> {
        self.call(ctx, "DeleteIntegration", move |state| {
            state
                .integrations
                .remove(&request.id)
                .map(|_| integration::DeleteIntegrationResponse {})
                .ok_or_else(|| not_found("integration", &request.id))
        })
        .await
    }
}

#[async_trait]
impl SelectorService for FakeControlPlane {
    async fn create_selector(
        &self,
        ctx: &Context,
        request: cfg::CreateSelectorRequest,
    ) -> Result<cfg::CreateSelectorResponse, ProviderError> {
        self.call(ctx, "CreateSelector", move |state| {
            let created = cfg::Selector {
                id: state.new_id("S"),
                name: request.name,
                resource_type: request.resource_type,
                belonging_to: request.belonging_to,
                when: request.when,
            };
            state.selectors.insert(created.id.clone(), created.clone());
            Ok(cfg::CreateSelectorResponse {
                selector: Some(created),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn get_selector(
        &self,
        ctx: &Context,
        request: cfg::GetSelectorRequest,
    ) -> Result<cfg::GetSelectorResponse, ProviderError> {
        self.call(ctx, "GetSelector", move |state| {
            let found = state
                .selectors
                .get(&request.id)
                .cloned()
                .ok_or_else(|| not_found("selector", &request.id))?;
            Ok(cfg::GetSelectorResponse {
                selector: Some(found),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn update_selector(
        &self,
        ctx: &Context,
        request: cfg::UpdateSelectorRequest,
    ) -> Result<cfg::UpdateSelectorResponse, ProviderError> {
        self.call(ctx, "UpdateSelector", move |state| {
            let updated = request.selector.ok_or_else(|| missing_body("selector"))?;
            if !state.selectors.contains_key(&updated.id) {
                return Err(not_found("selector", &updated.id));
            }
            state.updated(&updated.id);
            state.selectors.insert(updated.id.clone(), updated.clone());
            Ok(cfg::UpdateSelectorResponse {
                selector: Some(updated),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn delete_selector(
        &self,
        ctx: &Context,
        request: cfg::DeleteSelectorRequest,
    ) -> Result<cfg::DeleteSelectorResponse, ProviderError> {
        self.call(ctx, "DeleteSelector", move |state| {
            state
                .selectors
                .remove(&request.id)
                .map(|_| cfg::DeleteSelectorResponse {})
                .ok_or_else(|| not_found("selector", &request.id))
        })
        .await
    }
}

#[async_trait]
impl AccessWorkflowService for FakeControlPlane {
    async fn create_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::CreateAccessWorkflowRequest,
    ) -> Result<cfg::CreateAccessWorkflowResponse, ProviderError> {
        self.call(ctx, "CreateAccessWorkflow", move |state| {
            let created = cfg::AccessWorkflow {
                id: state.new_id("W"),
                name: request.name,
                access_duration_seconds: request.access_duration_seconds,
                try_extend_after_seconds: request.try_extend_after_seconds,
                priority: request.priority.unwrap_or(DEFAULT_PRIORITY),
                activation_expiry_seconds: request.activation_expiry_seconds,
                default_duration_seconds: request.default_duration_seconds,
            };
            state.workflows.insert(created.id.clone(), created.clone());
            Ok(cfg::CreateAccessWorkflowResponse {
                workflow: Some(created),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn get_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::GetAccessWorkflowRequest,
    ) -> Result<cfg::GetAccessWorkflowResponse, ProviderError> {
        self.call(ctx, "GetAccessWorkflow", move |state| {
            let found = state
                .workflows
                .get(&request.id)
                .cloned()
                .ok_or_else(|| not_found("access workflow", &request.id))?;
            Ok(cfg::GetAccessWorkflowResponse {
                workflow: Some(found),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn update_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::UpdateAccessWorkflowRequest,
    ) -> Result<cfg::UpdateAccessWorkflowResponse, ProviderError> {
        self.call(ctx, "UpdateAccessWorkflow", move |state| {
            let updated = request.workflow.ok_or_else(|| missing_body("workflow"))?;
            if !state.workflows.contains_key(&updated.id) {
                return Err(not_found("access workflow", &updated.id));
            }
            state.updated(&updated.id);
            state.workflows.insert(updated.id.clone(), updated.clone());
            Ok(cfg::UpdateAccessWorkflowResponse {
                workflow: Some(updated),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn delete_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::DeleteAccessWorkflowRequest,
    ) -> Result<cfg::DeleteAccessWorkflowResponse, ProviderError> {
        self.call(ctx, "DeleteAccessWorkflow", move |state| {
            state
                .workflows
                .remove(&request.id)
                .map(|_| cfg::DeleteAccessWorkflowResponse {})
                .ok_or_else(|| not_found("access workflow", &request.id))
        })
        .await
    }
}

#[async_trait]
impl AccessRuleService for FakeControlPlane {
    async fn create_access_rule(
        &self,
        ctx: &Context,
        request: cfg::CreateAccessRuleRequest,
    ) -> Result<cfg::CreateAccessRuleResponse, ProviderError> {
        self.call(ctx, "CreateAccessRule", move |state| {
            let created = cfg::AccessRule {
                id: state.new_id("R"),
                name: request.name,
                priority: request.priority.unwrap_or(DEFAULT_PRIORITY),
                workflow_id: request.workflow_id,
                targets: request.targets,
                role_ids: request.role_ids,
            };
            state.access_rules.insert(created.id.clone(), created.clone());
            Ok(cfg::CreateAccessRuleResponse {
                access_rule: Some(created),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn get_access_rule(
        &self,
        ctx: &Context,
        request: cfg::GetAccessRuleRequest,
    ) -> Result<cfg::GetAccessRuleResponse, ProviderError> {
        self.call(ctx, "GetAccessRule", move |state| {
            let found = state
                .access_rules
                .get(&request.id)
                .cloned()
                .ok_or_else(|| not_found("access rule", &request.id))?;
            Ok(cfg::GetAccessRuleResponse {
                access_rule: Some(found),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn update_access_rule(
        &self,
        ctx: &Context,
        request: cfg::UpdateAccessRuleRequest,
    ) -> Result<cfg::UpdateAccessRuleResponse, ProviderError> {
        self.call(ctx, "UpdateAccessRule", move |state| {
            let updated = request.access_rule.ok_or_else(|| missing_body("access rule"))?;
            if !state.access_rules.contains_key(&updated.id) {
                return Err(not_found("access rule", &updated.id));
            }
            state.updated(&updated.id);
            state.access_rules.insert(updated.id.clone(), updated.clone());
            Ok(cfg::UpdateAccessRuleResponse {
                access_rule: Some(updated),
                diagnostics: state.take_diagnostics(),
            })
        })
        .await
    }

    async fn delete_access_rule(
        &self,
        ctx: &Context,
        request: cfg::DeleteAccessRuleRequest,
    ) -> Result<cfg::DeleteAccessRuleResponse, ProviderError> {
        self.call(ctx, "DeleteAccessRule", move |state| {
            state
                .access_rules
                .remove(&request.id)
                .map(|_| cfg::DeleteAccessRuleResponse {})
                .ok_or_else(|| not_found("access rule", &request.id))
        })
        .await
    }
}

/// A test harness for provider implementations.
///
/// Every operation runs under the tester's [`Context`], which defaults to
/// one with no deadline that is never cancelled.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
    ctx: Context,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            ctx: Context::background(),
        }
    }

    /// Run operations under `ctx` instead.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Validate provider configuration, failing on error diagnostics.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider, failing on error diagnostics.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(&self.ctx, config).await?;
        check_diagnostics(diagnostics)
    }

    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<ResourceState, ProviderError> {
        self.provider
            .create(&self.ctx, resource_type, planned_state)
            .await
    }

    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<ResourceState, ProviderError> {
        self.provider
            .read(&self.ctx, resource_type, current_state)
            .await
    }

    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<ResourceState, ProviderError> {
        self.provider
            .update(&self.ctx, resource_type, prior_state, planned_state)
            .await
    }

    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        self.provider
            .delete(&self.ctx, resource_type, current_state)
            .await
    }

    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider
            .import_resource(&self.ctx, resource_type, id)
            .await
    }

    /// Run plan → create → read and return the state read back.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self.plan_create(resource_type, config).await?;
        let created = self
            .create(resource_type, plan_result.planned_state)
            .await?;
        let created = persisted(resource_type, created)?;
        persisted(resource_type, self.read(resource_type, created).await?)
    }

    /// Run plan → update → read and return the state read back.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;
        let updated = self
            .update(resource_type, prior_state, plan_result.planned_state)
            .await?;
        let updated = persisted(resource_type, updated)?;
        persisted(resource_type, self.read(resource_type, updated).await?)
    }

    /// Run plan → delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = self
            .plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }
}

fn persisted(resource_type: &str, state: ResourceState) -> Result<Value, ProviderError> {
    state.state.ok_or_else(|| {
        ProviderError::NotFound(format!("{} was removed from state", resource_type))
    })
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan creates without replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        !has_change,
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that some error diagnostic's summary contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error) && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::watch;

    fn workflow_request(priority: Option<i32>) -> cfg::CreateAccessWorkflowRequest {
        cfg::CreateAccessWorkflowRequest {
            name: "default".to_string(),
            access_duration_seconds: 7200,
            try_extend_after_seconds: 3600,
            priority,
            activation_expiry_seconds: None,
            default_duration_seconds: None,
        }
    }

    #[tokio::test]
    async fn test_ids_share_one_counter() {
        let fake = FakeControlPlane::new();
        let ctx = Context::background();

        let workflow = fake
            .create_access_workflow(&ctx, workflow_request(None))
            .await
            .unwrap()
            .workflow
            .unwrap();
        let selector = fake
            .create_selector(&ctx, cfg::CreateSelectorRequest::default())
            .await
            .unwrap()
            .selector
            .unwrap();

        assert_eq!(workflow.id, "W-1");
        assert_eq!(workflow.priority, DEFAULT_PRIORITY);
        assert_eq!(selector.id, "S-2");
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let fake = FakeControlPlane::new();
        let ctx = Context::background();

        let err = fake
            .get_access_rule(&ctx, cfg::GetAccessRuleRequest { id: "R-9".to_string() })
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = fake
            .delete_integration(&ctx, integration::DeleteIntegrationRequest { id: "I-9".to_string() })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fake.calls(), vec!["GetAccessRule", "DeleteIntegration"]);
    }

    #[tokio::test]
    async fn test_integration_without_variant_is_refused() {
        let fake = FakeControlPlane::new();
        let err = fake
            .create_integration(
                &Context::background(),
                integration::CreateIntegrationRequest {
                    name: "empty".to_string(),
                    config: Some(integration::Config { config: None }),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_pushed_diagnostics_attach_once() {
        let fake = FakeControlPlane::new();
        let ctx = Context::background();
        fake.push_diagnostics(vec![remote::Diagnostic {
            level: remote::DiagnosticLevel::Warning as i32,
            message: "heads up".to_string(),
            path: String::new(),
        }]);

        let first = fake
            .create_access_workflow(&ctx, workflow_request(Some(1)))
            .await
            .unwrap();
        assert_eq!(first.diagnostics.len(), 1);

        let id = first.workflow.unwrap().id;
        let second = fake
            .get_access_workflow(&ctx, cfg::GetAccessWorkflowRequest { id })
            .await
            .unwrap();
        assert!(second.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_stall_honours_deadline() {
        let fake = FakeControlPlane::new();
        fake.stall();
        let ctx = Context::background().with_timeout(Duration::from_millis(10));

        let err = fake
            .create_access_workflow(&ctx, workflow_request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::DeadlineExceeded(_)));
        assert!(fake.workflow("W-1").is_none());
    }

    #[tokio::test]
    async fn test_stall_honours_stop() {
        let fake = FakeControlPlane::new();
        fake.stall();
        let (stop, rx) = watch::channel(false);
        let ctx = Context::background().with_stop(rx);

        let call = fake.create_access_workflow(&ctx, workflow_request(None));
        let stopper = async {
            tokio::task::yield_now().await;
            stop.send_replace(true);
        };
        let (result, _) = tokio::join!(call, stopper);
        assert!(matches!(result.unwrap_err(), ProviderError::Cancelled(_)));
    }

    #[test]
    fn test_out_of_band_changes() {
        let fake = FakeControlPlane::new();
        fake.insert_integration(integration::Integration {
            id: "I-42".to_string(),
            name: "okta".to_string(),
            config: Some(integration::Config {
                config: Some(integration::config::Config::Okta(integration::Okta::default())),
            }),
        });

        let auth0 = integration::Config {
            config: Some(integration::config::Config::Auth0(integration::Auth0::default())),
        };
        assert!(fake.replace_integration_config("I-42", auth0.clone()));
        assert_eq!(fake.integration("I-42").unwrap().config, Some(auth0));

        assert!(fake.remove("I-42"));
        assert!(!fake.remove("I-42"));
        assert!(!fake.replace_integration_config("I-42", integration::Config::default()));
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        assert_no_errors(&[Diagnostic::error("An error")]);
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("field1"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("First error"));
        assert!(display.contains("Second error"));
        assert!(display.contains("field1"));
        assert!(display.contains("More info"));
    }
}
