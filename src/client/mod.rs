//! Handles to the Common Fate control plane.
//!
//! The control plane is made of four unary gRPC services. Each is modelled as
//! an object-safe async trait so the provider can run against the real
//! [`GrpcClient`] or the in-memory fake in [`crate::testing`].
//!
//! Every method takes the per-call [`Context`]; implementations must honour
//! its deadline and stop signal.

mod grpc;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::context::Context;
use crate::error::ProviderError;
use crate::generated::{config as cfg, integration};

pub use grpc::{GrpcClient, USER_AGENT};

/// Opaque data published by the provider shell at Configure time and handed
/// to every resource adapter.
pub type ProviderData = Arc<dyn Any + Send + Sync>;

/// Create, read, update and delete integrations of any kind.
#[async_trait]
pub trait IntegrationService: Send + Sync {
    async fn create_integration(
        &self,
        ctx: &Context,
        request: integration::CreateIntegrationRequest,
    ) -> Result<integration::CreateIntegrationResponse, ProviderError>;

    async fn get_integration(
        &self,
        ctx: &Context,
        request: integration::GetIntegrationRequest,
    ) -> Result<integration::GetIntegrationResponse, ProviderError>;

    async fn update_integration(
        &self,
        ctx: &Context,
        request: integration::UpdateIntegrationRequest,
    ) -> Result<integration::UpdateIntegrationResponse, ProviderError>;

    async fn delete_integration(
        &self,
        ctx: &Context,
        request: integration::DeleteIntegrationRequest,
    ) -> Result<integration::DeleteIntegrationResponse, ProviderError>;
}

#[async_trait]
pub trait SelectorService: Send + Sync {
    async fn create_selector(
        &self,
        ctx: &Context,
        request: cfg::CreateSelectorRequest,
    ) -> Result<cfg::CreateSelectorResponse, ProviderError>;

    async fn get_selector(
        &self,
        ctx: &Context,
        request: cfg::GetSelectorRequest,
    ) -> Result<cfg::GetSelectorResponse, ProviderError>;

    async fn update_selector(
        &self,
        ctx: &Context,
        request: cfg::UpdateSelectorRequest,
    ) -> Result<cfg::UpdateSelectorResponse, ProviderError>;

    async fn delete_selector(
        &self,
        ctx: &Context,
        request: cfg::DeleteSelectorRequest,
    ) -> Result<cfg::DeleteSelectorResponse, ProviderError>;
}

#[async_trait]
pub trait AccessWorkflowService: Send + Sync {
    async fn create_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::CreateAccessWorkflowRequest,
    ) -> Result<cfg::CreateAccessWorkflowResponse, ProviderError>;

    async fn get_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::GetAccessWorkflowRequest,
    ) -> Result<cfg::GetAccessWorkflowResponse, ProviderError>;

    async fn update_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::UpdateAccessWorkflowRequest,
    ) -> Result<cfg::UpdateAccessWorkflowResponse, ProviderError>;

    async fn delete_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::DeleteAccessWorkflowRequest,
    ) -> Result<cfg::DeleteAccessWorkflowResponse, ProviderError>;
}

#[async_trait]
pub trait AccessRuleService: Send + Sync {
    async fn create_access_rule(
        &self,
        ctx: &Context,
        request: cfg::CreateAccessRuleRequest,
    ) -> Result<cfg::CreateAccessRuleResponse, ProviderError>;

    async fn get_access_rule(
        &self,
        ctx: &Context,
        request: cfg::GetAccessRuleRequest,
    ) -> Result<cfg::GetAccessRuleResponse, ProviderError>;

    async fn update_access_rule(
        &self,
        ctx: &Context,
        request: cfg::UpdateAccessRuleRequest,
    ) -> Result<cfg::UpdateAccessRuleResponse, ProviderError>;

    async fn delete_access_rule(
        &self,
        ctx: &Context,
        request: cfg::DeleteAccessRuleRequest,
    ) -> Result<cfg::DeleteAccessRuleResponse, ProviderError>;
}

/// The set of service handles a configured provider talks to.
///
/// Cloning is cheap; all handles are shared.
#[derive(Clone)]
pub struct ControlPlane {
    pub integrations: Arc<dyn IntegrationService>,
    pub selectors: Arc<dyn SelectorService>,
    pub workflows: Arc<dyn AccessWorkflowService>,
    pub access_rules: Arc<dyn AccessRuleService>,
}

impl ControlPlane {
    /// Build a control plane backed by a lazily connected gRPC channel.
    ///
    /// No network traffic happens until the first call.
    pub fn connect(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Arc::new(GrpcClient::connect_lazy(config)?);
        Ok(Self::from_client(client))
    }

    /// Use one object for all four services.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: IntegrationService + SelectorService + AccessWorkflowService + AccessRuleService + 'static,
    {
        Self {
            integrations: client.clone(),
            selectors: client.clone(),
            workflows: client.clone(),
            access_rules: client,
        }
    }

    /// Wrap the control plane as opaque provider data.
    pub fn into_provider_data(self) -> ProviderData {
        Arc::new(self)
    }
}

impl fmt::Debug for ControlPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPlane").finish_non_exhaustive()
    }
}

/// Recover the control plane from provider data handed to an adapter.
///
/// `None` means Configure has not run yet; data of any other type is a
/// wiring error.
pub fn control_plane_from(
    data: Option<&ProviderData>,
) -> Result<Option<ControlPlane>, ProviderError> {
    match data {
        None => Ok(None),
        Some(data) => data
            .downcast_ref::<ControlPlane>()
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                ProviderError::Configuration(
                    "unexpected provider data type; expected a Common Fate control plane"
                        .to_string(),
                )
            }),
    }
}

/// The configured control plane, or [`ProviderError::Unconfigured`].
pub fn require_client(client: Option<&ControlPlane>) -> Result<&ControlPlane, ProviderError> {
    client.ok_or_else(|| {
        ProviderError::Unconfigured(
            "expected a configured Common Fate client; the provider has not been configured"
                .to_string(),
        )
    })
}
