//! gRPC implementation of the control-plane services.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::AsciiMetadataValue;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::debug;

use super::{AccessRuleService, AccessWorkflowService, IntegrationService, SelectorService};
use crate::config::ProviderConfig;
use crate::context::Context;
use crate::error::ProviderError;
use crate::generated::{config as cfg, integration};

/// User agent sent on every control-plane call.
pub const USER_AGENT: &str = concat!("hemmer-provider-commonfate/", env!("CARGO_PKG_VERSION"));

const INTEGRATION_SERVICE: &str = "commonfate.control.integration.v1alpha1.IntegrationService";
const SELECTOR_SERVICE: &str = "commonfate.control.config.v1alpha1.SelectorService";
const WORKFLOW_SERVICE: &str = "commonfate.control.config.v1alpha1.AccessWorkflowService";
const ACCESS_RULE_SERVICE: &str = "commonfate.control.config.v1alpha1.AccessRuleService";

/// One HTTP/2 channel shared by all four services.
#[derive(Clone)]
pub struct GrpcClient {
    channel: Channel,
    authorization: AsciiMetadataValue,
}

impl std::fmt::Debug for GrpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcClient").finish_non_exhaustive()
    }
}

impl GrpcClient {
    /// Build a client whose channel connects on first use.
    ///
    /// `https` hosts use TLS with the platform's native roots.
    pub fn connect_lazy(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let host = normalize_host(&config.host);
        let mut endpoint = Endpoint::from_shared(host.clone())?.user_agent(USER_AGENT)?;
        if host.starts_with("https://") {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_native_roots())?;
        }
        debug!(host = %host, "control plane channel configured");

        Ok(Self {
            channel: endpoint.connect_lazy(),
            authorization: basic_auth(&config.username, &config.password)?,
        })
    }

    async fn unary<Req, Resp>(
        &self,
        ctx: &Context,
        service: &'static str,
        method: &'static str,
        message: Req,
    ) -> Result<Resp, ProviderError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let path = format!("/{}/{}", service, method);
        let call = async {
            let mut grpc = tonic::client::Grpc::new(self.channel.clone());
            grpc.ready().await.map_err(|e| {
                ProviderError::Unavailable(format!("control plane not ready: {}", e))
            })?;

            let mut request = tonic::Request::new(message);
            request
                .metadata_mut()
                .insert("authorization", self.authorization.clone());
            if let Some(remaining) = ctx.remaining() {
                request.set_timeout(remaining);
            }

            let path = PathAndQuery::try_from(path.as_str())
                .map_err(|e| ProviderError::Internal(format!("invalid method path: {}", e)))?;
            let codec = tonic_prost::ProstCodec::<Req, Resp>::default();
            let response = grpc.unary(request, path, codec).await?;
            Ok(response.into_inner())
        };

        debug!(method = %method, "calling control plane");
        let result = ctx.run(call).await;
        if let Err(err) = &result {
            debug!(method = %method, error = %err, "control plane call failed");
        }
        result
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn basic_auth(username: &str, password: &str) -> Result<AsciiMetadataValue, ProviderError> {
    let encoded = STANDARD.encode(format!("{}:{}", username, password));
    let mut value: AsciiMetadataValue = format!("Basic {}", encoded)
        .parse()
        .map_err(|_| ProviderError::Configuration("invalid credentials".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl IntegrationService for GrpcClient {
    async fn create_integration(
        &self,
        ctx: &Context,
        request: integration::CreateIntegrationRequest,
    ) -> Result<integration::CreateIntegrationResponse, ProviderError> {
        self.unary(ctx, INTEGRATION_SERVICE, "CreateIntegration", request)
            .await
    }

    async fn get_integration(
        &self,
        ctx: &Context,
        request: integration::GetIntegrationRequest,
    ) -> Result<integration::GetIntegrationResponse, ProviderError> {
        self.unary(ctx, INTEGRATION_SERVICE, "GetIntegration", request)
            .await
    }

    async fn update_integration(
        &self,
        ctx: &Context,
        request: integration::UpdateIntegrationRequest,
    ) -> Result<integration::UpdateIntegrationResponse, ProviderError> {
        self.unary(ctx, INTEGRATION_SERVICE, "UpdateIntegration", request)
            .await
    }

    async fn delete_integration(
        &self,
        ctx: &Context,
        request: integration::DeleteIntegrationRequest,
    ) -> Result<integration::DeleteIntegrationResponse, ProviderError> {
        self.unary(ctx, INTEGRATION_SERVICE, "DeleteIntegration", request)
            .await
    }
}

#[async_trait]
impl SelectorService for GrpcClient {
    async fn create_selector(
        &self,
        ctx: &Context,
        request: cfg::CreateSelectorRequest,
    ) -> Result<cfg::CreateSelectorResponse, ProviderError> {
        self.unary(ctx, SELECTOR_SERVICE, "CreateSelector", request)
            .await
    }

    async fn get_selector(
        &self,
        ctx: &Context,
        request: cfg::GetSelectorRequest,
    ) -> Result<cfg::GetSelectorResponse, ProviderError> {
        self.unary(ctx, SELECTOR_SERVICE, "GetSelector", request).await
    }

    async fn update_selector(
        &self,
        ctx: &Context,
        request: cfg::UpdateSelectorRequest,
    ) -> Result<cfg::UpdateSelectorResponse, ProviderError> {
        self.unary(ctx, SELECTOR_SERVICE, "UpdateSelector", request)
            .await
    }

    async fn delete_selector(
        &self,
        ctx: &Context,
        request: cfg::DeleteSelectorRequest,
    ) -> Result<cfg::DeleteSelectorResponse, ProviderError> {
        self.unary(ctx, SELECTOR_SERVICE, "DeleteSelector", request)
            .await
    }
}

#[async_trait]
impl AccessWorkflowService for GrpcClient {
    async fn create_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::CreateAccessWorkflowRequest,
    ) -> Result<cfg::CreateAccessWorkflowResponse, ProviderError> {
        self.unary(ctx, WORKFLOW_SERVICE, "CreateAccessWorkflow", request)
            .await
    }

    async fn get_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::GetAccessWorkflowRequest,
    ) -> Result<cfg::GetAccessWorkflowResponse, ProviderError> {
        self.unary(ctx, WORKFLOW_SERVICE, "GetAccessWorkflow", request)
            .await
    }

    async fn update_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::UpdateAccessWorkflowRequest,
    ) -> Result<cfg::UpdateAccessWorkflowResponse, ProviderError> {
        self.unary(ctx, WORKFLOW_SERVICE, "UpdateAccessWorkflow", request)
            .await
    }

    async fn delete_access_workflow(
        &self,
        ctx: &Context,
        request: cfg::DeleteAccessWorkflowRequest,
    ) -> Result<cfg::DeleteAccessWorkflowResponse, ProviderError> {
        self.unary(ctx, WORKFLOW_SERVICE, "DeleteAccessWorkflow", request)
            .await
    }
}

#[async_trait]
impl AccessRuleService for GrpcClient {
    async fn create_access_rule(
        &self,
        ctx: &Context,
        request: cfg::CreateAccessRuleRequest,
    ) -> Result<cfg::CreateAccessRuleResponse, ProviderError> {
        self.unary(ctx, ACCESS_RULE_SERVICE, "CreateAccessRule", request)
            .await
    }

    async fn get_access_rule(
        &self,
        ctx: &Context,
        request: cfg::GetAccessRuleRequest,
    ) -> Result<cfg::GetAccessRuleResponse, ProviderError> {
        self.unary(ctx, ACCESS_RULE_SERVICE, "GetAccessRule", request)
            .await
    }

    async fn update_access_rule(
        &self,
        ctx: &Context,
        request: cfg::UpdateAccessRuleRequest,
    ) -> Result<cfg::UpdateAccessRuleResponse, ProviderError> {
        self.unary(ctx, ACCESS_RULE_SERVICE, "UpdateAccessRule", request)
            .await
    }

    async fn delete_access_rule(
        &self,
        ctx: &Context,
        request: cfg::DeleteAccessRuleRequest,
    ) -> Result<cfg::DeleteAccessRuleResponse, ProviderError> {
        self.unary(ctx, ACCESS_RULE_SERVICE, "DeleteAccessRule", request)
            .await
    }
}
