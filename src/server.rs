//! The gRPC plugin server the host connects to.
//!
//! This module provides the [`ProviderService`] trait the provider
//! implements, and the [`serve`] function that starts the gRPC server and
//! prints the handshake line.
//!
//! # Cancellation
//!
//! Each incoming call gets a [`Context`] built from its `grpc-timeout`
//! metadata and the provider-wide stop signal. The host's `Stop` RPC flips
//! that signal, so every in-flight control-plane call returns promptly with
//! a cancellation error.
//!
//! # Signal Handling
//!
//! On SIGTERM or SIGINT the server:
//! 1. Stops accepting new connections
//! 2. Waits for in-flight requests to complete, up to
//!    [`ServeOptions::shutdown_timeout`]
//! 3. Cancels whatever is still running through the stop signal
//! 4. Calls the provider's `stop()` method and exits

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tonic::transport::Server;
use tracing::{debug, error, info, instrument, warn};

use crate::context::Context;
use crate::diagnostics;
use crate::error::ProviderError;
use crate::generated::provider as proto;
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::types::{
    ImportedResource, PlanResult, ProviderMetadata, ResourceState, HANDSHAKE_PREFIX,
    PROTOCOL_VERSION,
};

/// The provider side of the plugin protocol, in terms of crate types.
///
/// Operations that reach the control plane take the per-call [`Context`].
/// Errors are reported to the host as diagnostics; the gRPC call itself
/// always succeeds.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Return the provider block schema and every resource schema.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata. By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let mut resources: Vec<String> = self.schema().resources.keys().cloned().collect();
        resources.sort();
        ProviderMetadata {
            resources,
            capabilities: Default::default(),
        }
    }

    /// Validate the provider block before Configure.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Resolve the provider block and build the control-plane client.
    async fn configure(&self, ctx: &Context, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Called once the host has asked the provider to stop.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Plan changes for a resource. A null `proposed_state` plans a destroy.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    async fn create(
        &self,
        ctx: &Context,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<ResourceState, ProviderError>;

    /// Refresh a resource. [`ResourceState::removed`] drops it from host state.
    async fn read(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<ResourceState, ProviderError>;

    async fn update(
        &self,
        ctx: &Context,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<ResourceState, ProviderError>;

    async fn delete(
        &self,
        ctx: &Context,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError>;

    async fn import_resource(
        &self,
        ctx: &Context,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError>;
}

/// Adapts a [`ProviderService`] to the generated gRPC trait.
struct ProviderGrpcService<P: ProviderService> {
    provider: Arc<P>,
    stop: watch::Sender<bool>,
}

impl<P: ProviderService> ProviderGrpcService<P> {
    fn new(provider: Arc<P>, stop: watch::Sender<bool>) -> Self {
        Self { provider, stop }
    }

    fn context(&self, metadata: &tonic::metadata::MetadataMap) -> Context {
        Context::from_metadata(metadata, self.stop.subscribe())
    }

    fn schema_to_proto(&self, schema: &crate::schema::Schema) -> proto::Schema {
        proto::Schema {
            version: schema.version as i64,
            block: Some(block_to_proto(&schema.block)),
        }
    }
}

fn block_to_proto(block: &crate::schema::Block) -> proto::Block {
    proto::Block {
        attributes: block
            .attributes
            .iter()
            .map(|(name, attr)| proto::Attribute {
                name: name.clone(),
                r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
                required: attr.flags.required,
                optional: attr.flags.optional,
                computed: attr.flags.computed,
                sensitive: attr.flags.sensitive,
                description: attr.description.clone().unwrap_or_default(),
                force_new: attr.force_new,
                default_value: attr
                    .default
                    .as_ref()
                    .map(|v| serde_json::to_vec(v).unwrap_or_default())
                    .unwrap_or_default(),
            })
            .collect(),
        block_types: block
            .blocks
            .iter()
            .map(|(name, nested)| proto::NestedBlock {
                type_name: name.clone(),
                block: Some(block_to_proto(&nested.block)),
                nesting_mode: match nested.nesting_mode {
                    crate::schema::BlockNestingMode::Single => {
                        proto::nested_block::NestingMode::Single as i32
                    }
                    crate::schema::BlockNestingMode::List => {
                        proto::nested_block::NestingMode::List as i32
                    }
                    crate::schema::BlockNestingMode::Set => {
                        proto::nested_block::NestingMode::Set as i32
                    }
                    crate::schema::BlockNestingMode::Map => {
                        proto::nested_block::NestingMode::Map as i32
                    }
                },
                min_items: nested.min_items as i32,
                max_items: nested.max_items as i32,
            })
            .collect(),
        description: block.description.clone().unwrap_or_default(),
    }
}

/// Decode a JSON payload from the host. Empty bytes decode as null.
fn decode_json(bytes: &[u8], what: &str) -> Result<Value, ProviderError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
        .map_err(|e| ProviderError::InvalidRequest(format!("could not parse {}: {}", what, e)))
}

/// Decode prior state, proposed state and config, in that order.
fn decode_plan_request(req: &proto::PlanRequest) -> Result<(Value, Value, Value), ProviderError> {
    Ok((
        decode_json(&req.prior_state, "prior state")?,
        decode_json(&req.proposed_state, "proposed state")?,
        decode_json(&req.config, "config")?,
    ))
}

/// Encode a JSON payload for the host.
fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ProviderError> {
    Ok(serde_json::to_vec(value)?)
}

/// Encode resource state for the host. A removed resource is JSON `null`.
fn encode_state(state: &ResourceState) -> Result<Vec<u8>, ProviderError> {
    match &state.state {
        Some(value) => encode_json(value),
        None => Ok(b"null".to_vec()),
    }
}

fn log_diagnostics(operation: &str, resource_type: &str, diagnostics: &[Diagnostic]) {
    if has_errors(diagnostics) {
        warn!(resource_type = %resource_type, diagnostics = diagnostics.len(), "{} completed with errors", operation);
    } else {
        info!(resource_type = %resource_type, "{} completed", operation);
    }
}

#[tonic::async_trait]
impl<P: ProviderService> proto::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: tonic::Request<proto::GetMetadataRequest>,
    ) -> Result<tonic::Response<proto::GetMetadataResponse>, tonic::Status> {
        let metadata = self.provider.metadata();
        info!(resources = metadata.resources.len(), "GetMetadata completed");
        Ok(tonic::Response::new(proto::GetMetadataResponse {
            server_capabilities: Some(proto::ServerCapabilities {
                plan_destroy: metadata.capabilities.plan_destroy,
            }),
            resources: metadata.resources,
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: tonic::Request<proto::GetSchemaRequest>,
    ) -> Result<tonic::Response<proto::GetSchemaResponse>, tonic::Status> {
        let schema = self.provider.schema();
        info!(resources = schema.resources.len(), "GetSchema completed");
        Ok(tonic::Response::new(proto::GetSchemaResponse {
            provider: Some(self.schema_to_proto(&schema.provider)),
            resources: schema
                .resources
                .iter()
                .map(|(k, v)| (k.clone(), self.schema_to_proto(v)))
                .collect(),
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: tonic::Request<proto::ValidateProviderConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateProviderConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = match decode_json(&req.config, "provider config") {
            Ok(config) => self.provider.validate_provider_config(config).await,
            Err(e) => Err(e),
        };

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("ValidateProviderConfig", "provider", &diagnostics);
                diagnostics::to_proto(diagnostics)
            }
            Err(e) => {
                error!(error = %e, "ValidateProviderConfig failed");
                diagnostics::error_to_proto(&e)
            }
        };
        Ok(tonic::Response::new(proto::ValidateProviderConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: tonic::Request<proto::ConfigureRequest>,
    ) -> Result<tonic::Response<proto::ConfigureResponse>, tonic::Status> {
        let ctx = self.context(request.metadata());
        let req = request.into_inner();
        let result = match decode_json(&req.config, "provider config") {
            Ok(config) => self.provider.configure(&ctx, config).await,
            Err(e) => Err(e),
        };

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("Configure", "provider", &diagnostics);
                diagnostics::to_proto(diagnostics)
            }
            Err(e) => {
                error!(error = %e, "Configure failed");
                diagnostics::error_to_proto(&e)
            }
        };
        Ok(tonic::Response::new(proto::ConfigureResponse { diagnostics }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(
        &self,
        _request: tonic::Request<proto::StopRequest>,
    ) -> Result<tonic::Response<proto::StopResponse>, tonic::Status> {
        info!("Stop called; cancelling in-flight operations");
        self.stop.send_replace(true);

        let error = match self.provider.stop().await {
            Ok(()) => String::new(),
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            }
        };
        Ok(tonic::Response::new(proto::StopResponse { error }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        request: tonic::Request<proto::ValidateResourceConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateResourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(resource_type = %req.resource_type, "ValidateResourceConfig called");

        let result = match decode_json(&req.config, "resource config") {
            Ok(config) => {
                self.provider
                    .validate_resource_config(&req.resource_type, config)
                    .await
            }
            Err(e) => Err(e),
        };

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("ValidateResourceConfig", &req.resource_type, &diagnostics);
                diagnostics::to_proto(diagnostics)
            }
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "ValidateResourceConfig failed");
                diagnostics::error_to_proto(&e)
            }
        };
        Ok(tonic::Response::new(proto::ValidateResourceConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.plan")]
    async fn plan(
        &self,
        request: tonic::Request<proto::PlanRequest>,
    ) -> Result<tonic::Response<proto::PlanResponse>, tonic::Status> {
        let req = request.into_inner();
        let is_create = req.prior_state.is_empty();
        debug!(resource_type = %req.resource_type, is_create = is_create, "Plan called");

        let result = match decode_plan_request(&req) {
            Ok((prior, proposed, config)) => {
                let prior = if prior.is_null() { None } else { Some(prior) };
                self.provider
                    .plan(&req.resource_type, prior, proposed, config)
                    .await
            }
            Err(e) => Err(e),
        };

        let result = result.and_then(|plan| encode_json(&plan.planned_state).map(|bytes| (bytes, plan)));

        match result {
            Ok((planned_state, result)) => {
                info!(
                    resource_type = %req.resource_type,
                    changes = result.changes.len(),
                    requires_replace = result.requires_replace,
                    "Plan completed"
                );
                Ok(tonic::Response::new(proto::PlanResponse {
                    planned_state,
                    changes: result.changes.into_iter().map(Into::into).collect(),
                    requires_replace: result.requires_replace,
                    diagnostics: diagnostics::to_proto(result.diagnostics),
                }))
            }
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Plan failed");
                Ok(tonic::Response::new(proto::PlanResponse {
                    planned_state: vec![],
                    changes: vec![],
                    requires_replace: false,
                    diagnostics: diagnostics::error_to_proto(&e),
                }))
            }
        }
    }

    #[instrument(skip(self, request), name = "grpc.create")]
    async fn create(
        &self,
        request: tonic::Request<proto::CreateRequest>,
    ) -> Result<tonic::Response<proto::CreateResponse>, tonic::Status> {
        let ctx = self.context(request.metadata());
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, "Create called");

        let result = match decode_json(&req.planned_state, "planned state") {
            Ok(planned) => self.provider.create(&ctx, &req.resource_type, planned).await,
            Err(e) => Err(e),
        };

        let result = result.and_then(|state| encode_state(&state).map(|bytes| (bytes, state)));

        match result {
            Ok((encoded, state)) => {
                log_diagnostics("Create", &req.resource_type, &state.diagnostics);
                Ok(tonic::Response::new(proto::CreateResponse {
                    state: encoded,
                    diagnostics: diagnostics::to_proto(state.diagnostics),
                }))
            }
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Create failed");
                Ok(tonic::Response::new(proto::CreateResponse {
                    state: vec![],
                    diagnostics: diagnostics::error_to_proto(&e),
                }))
            }
        }
    }

    #[instrument(skip(self, request), name = "grpc.read")]
    async fn read(
        &self,
        request: tonic::Request<proto::ReadRequest>,
    ) -> Result<tonic::Response<proto::ReadResponse>, tonic::Status> {
        let ctx = self.context(request.metadata());
        let req = request.into_inner();
        debug!(resource_type = %req.resource_type, "Read called");

        let result = match decode_json(&req.current_state, "current state") {
            Ok(current) => self.provider.read(&ctx, &req.resource_type, current).await,
            Err(e) => Err(e),
        };

        let result = result.and_then(|state| encode_state(&state).map(|bytes| (bytes, state)));

        match result {
            Ok((encoded, state)) => {
                if state.is_removed() {
                    info!(resource_type = %req.resource_type, "Read found the resource gone; dropping it");
                } else {
                    debug!(resource_type = %req.resource_type, "Read completed");
                }
                Ok(tonic::Response::new(proto::ReadResponse {
                    state: encoded,
                    diagnostics: diagnostics::to_proto(state.diagnostics),
                }))
            }
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Read failed");
                Ok(tonic::Response::new(proto::ReadResponse {
                    state: vec![],
                    diagnostics: diagnostics::error_to_proto(&e),
                }))
            }
        }
    }

    #[instrument(skip(self, request), name = "grpc.update")]
    async fn update(
        &self,
        request: tonic::Request<proto::UpdateRequest>,
    ) -> Result<tonic::Response<proto::UpdateResponse>, tonic::Status> {
        let ctx = self.context(request.metadata());
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, "Update called");

        let decoded = decode_json(&req.prior_state, "prior state").and_then(|prior| {
            decode_json(&req.planned_state, "planned state").map(|planned| (prior, planned))
        });
        let result = match decoded {
            Ok((prior, planned)) => {
                self.provider
                    .update(&ctx, &req.resource_type, prior, planned)
                    .await
            }
            Err(e) => Err(e),
        };

        let result = result.and_then(|state| encode_state(&state).map(|bytes| (bytes, state)));

        match result {
            Ok((encoded, state)) => {
                log_diagnostics("Update", &req.resource_type, &state.diagnostics);
                Ok(tonic::Response::new(proto::UpdateResponse {
                    state: encoded,
                    diagnostics: diagnostics::to_proto(state.diagnostics),
                }))
            }
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Update failed");
                Ok(tonic::Response::new(proto::UpdateResponse {
                    state: vec![],
                    diagnostics: diagnostics::error_to_proto(&e),
                }))
            }
        }
    }

    #[instrument(skip(self, request), name = "grpc.delete")]
    async fn delete(
        &self,
        request: tonic::Request<proto::DeleteRequest>,
    ) -> Result<tonic::Response<proto::DeleteResponse>, tonic::Status> {
        let ctx = self.context(request.metadata());
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, "Delete called");

        let result = match decode_json(&req.current_state, "current state") {
            Ok(current) => self.provider.delete(&ctx, &req.resource_type, current).await,
            Err(e) => Err(e),
        };

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("Delete", &req.resource_type, &diagnostics);
                diagnostics::to_proto(diagnostics)
            }
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Delete failed");
                diagnostics::error_to_proto(&e)
            }
        };
        Ok(tonic::Response::new(proto::DeleteResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.import_resource_state")]
    async fn import_resource_state(
        &self,
        request: tonic::Request<proto::ImportResourceStateRequest>,
    ) -> Result<tonic::Response<proto::ImportResourceStateResponse>, tonic::Status> {
        let ctx = self.context(request.metadata());
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, id = %req.id, "ImportResourceState called");

        let result = self
            .provider
            .import_resource(&ctx, &req.resource_type, &req.id)
            .await
            .and_then(|imported| {
                imported
                    .into_iter()
                    .map(|r| {
                        Ok(proto::ImportedResource {
                            state: encode_json(&r.state)?,
                            resource_type: r.resource_type,
                        })
                    })
                    .collect::<Result<Vec<_>, ProviderError>>()
            });

        match result {
            Ok(imported) => {
                info!(
                    resource_type = %req.resource_type,
                    id = %req.id,
                    imported_count = imported.len(),
                    "ImportResourceState completed"
                );
                Ok(tonic::Response::new(proto::ImportResourceStateResponse {
                    imported,
                    diagnostics: vec![],
                }))
            }
            Err(e) => {
                error!(resource_type = %req.resource_type, id = %req.id, error = %e, "ImportResourceState failed");
                Ok(tonic::Response::new(proto::ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: diagnostics::error_to_proto(&e),
                }))
            }
        }
    }
}

/// Options for configuring the provider server.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// How long in-flight requests may run after a shutdown signal before
    /// they are cancelled. Default: 30 seconds.
    pub shutdown_timeout: Duration,
    /// Print a hint on stderr for attaching the host to this process.
    pub debug: bool,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
            debug: false,
        }
    }
}

impl ServeOptions {
    /// Create new serve options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Enable debug mode.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Wait for SIGTERM or SIGINT (CTRL+C on Windows).
///
/// If the handlers cannot be installed the error is logged and this never
/// resolves; the host can still stop the process.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
                    _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "Failed to install signal handlers");
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(windows)]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received CTRL+C, initiating graceful shutdown"),
            Err(e) => {
                error!(error = %e, "Failed to install CTRL+C handler");
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        std::future::pending::<()>().await;
    }
}

/// Serve a provider as a gRPC server on a free loopback port.
///
/// Prints the handshake `HEMMER_PROVIDER|<version>|<address>` on stdout and
/// runs until a shutdown signal arrives.
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), Box<dyn std::error::Error>> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// Serve a provider with custom options. See [`serve`].
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    println!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr);
    info!(address = %addr, "Provider server starting");
    if options.debug {
        eprintln!(
            "Provider started in debug mode. To reattach, point Hemmer at this process:\n\n\t{}|{}|{}\n",
            HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr
        );
    }

    let provider = Arc::new(provider);
    let (stop_tx, _) = watch::channel(false);
    let grpc_service = ProviderGrpcService::new(Arc::clone(&provider), stop_tx.clone());

    let (signalled_tx, signalled_rx) = oneshot::channel();
    let server = Server::builder()
        .add_service(proto::provider_server::ProviderServer::new(grpc_service))
        .serve_with_incoming_shutdown(
            tokio_stream::wrappers::TcpListenerStream::new(listener),
            async move {
                wait_for_shutdown_signal().await;
                let _ = signalled_tx.send(());
            },
        );
    tokio::pin!(server);

    // The timeout only starts once a signal has arrived.
    let result = tokio::select! {
        biased;
        result = &mut server => result,
        _ = signalled_rx => {
            match tokio::time::timeout(options.shutdown_timeout, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout = ?options.shutdown_timeout, "Shutdown timeout exceeded, cancelling in-flight requests");
                    stop_tx.send_replace(true);
                    Ok(())
                }
            }
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }
    info!("Server shutdown complete");

    debug!("Calling provider stop()");
    if let Err(e) = provider.stop().await {
        warn!(error = %e, "Provider stop() returned error");
    }

    info!("Provider shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generated::provider::provider_server::Provider;
    use crate::provider::CommonFateProvider;
    use crate::testing::FakeControlPlane;
    use serde_json::json;

    fn service(fake: &Arc<FakeControlPlane>) -> ProviderGrpcService<CommonFateProvider> {
        let provider = CommonFateProvider::with_control_plane(fake.clone());
        let (stop, _) = watch::channel(false);
        ProviderGrpcService::new(Arc::new(provider), stop)
    }

    #[tokio::test]
    async fn test_metadata_lists_resources() {
        let svc = service(&Arc::new(FakeControlPlane::new()));
        let response = svc
            .get_metadata(tonic::Request::new(proto::GetMetadataRequest {}))
            .await
            .unwrap()
            .into_inner();

        assert!(response.resources.contains(&"commonfate_access_rule".to_string()));
        assert!(response.server_capabilities.unwrap().plan_destroy);
        let mut sorted = response.resources.clone();
        sorted.sort();
        assert_eq!(sorted, response.resources);
    }

    #[tokio::test]
    async fn test_schema_marks_password_sensitive() {
        let svc = service(&Arc::new(FakeControlPlane::new()));
        let response = svc
            .get_schema(tonic::Request::new(proto::GetSchemaRequest {}))
            .await
            .unwrap()
            .into_inner();

        let provider = response.provider.unwrap().block.unwrap();
        let password = provider
            .attributes
            .iter()
            .find(|a| a.name == "password")
            .unwrap();
        assert!(password.sensitive);
        assert!(response.resources.contains_key("commonfate_webhook_integration"));
    }

    #[tokio::test]
    async fn test_read_of_missing_resource_returns_null_state() {
        let svc = service(&Arc::new(FakeControlPlane::new()));
        let response = svc
            .read(tonic::Request::new(proto::ReadRequest {
                resource_type: "commonfate_access_workflow".to_string(),
                current_state: serde_json::to_vec(&json!({"id": "W-123"})).unwrap(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.state, b"null".to_vec());
        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_errors_become_diagnostics() {
        let svc = service(&Arc::new(FakeControlPlane::new()));
        let response = svc
            .delete(tonic::Request::new(proto::DeleteRequest {
                resource_type: "commonfate_access_workflow".to_string(),
                current_state: serde_json::to_vec(&json!({"id": "W-404"})).unwrap(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].severity,
            proto::diagnostic::Severity::Error as i32
        );
        assert!(response.diagnostics[0].summary.contains("not found"));
    }

    #[tokio::test]
    async fn test_malformed_state_is_reported() {
        let svc = service(&Arc::new(FakeControlPlane::new()));
        let response = svc
            .create(tonic::Request::new(proto::CreateRequest {
                resource_type: "commonfate_access_workflow".to_string(),
                planned_state: b"{not json".to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.state.is_empty());
        assert!(response.diagnostics[0].summary.contains("could not parse planned state"));
    }

    #[test]
    fn test_encoding_failure_becomes_error_diagnostic() {
        // JSON object keys must be strings.
        let mut unencodable = std::collections::BTreeMap::new();
        unencodable.insert(vec![1u8], 1);

        let err = encode_json(&unencodable).unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
        let wire = diagnostics::error_to_proto(&err);
        assert_eq!(wire[0].severity, proto::diagnostic::Severity::Error as i32);
        assert!(wire[0].summary.contains("Serialization error"));

        assert_eq!(encode_state(&ResourceState::removed()).unwrap(), b"null".to_vec());
        assert_eq!(
            encode_state(&ResourceState::new(json!({"id": "W-1"}))).unwrap(),
            br#"{"id":"W-1"}"#.to_vec()
        );
    }

    #[tokio::test]
    async fn test_stop_cancels_in_flight_calls() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.stall();
        let svc = Arc::new(service(&fake));

        let reader = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move {
                svc.read(tonic::Request::new(proto::ReadRequest {
                    resource_type: "commonfate_access_workflow".to_string(),
                    current_state: serde_json::to_vec(&json!({"id": "W-1"})).unwrap(),
                }))
                .await
            })
        };
        // Let the read reach the control plane.
        while fake.call_count("GetAccessWorkflow") == 0 {
            tokio::task::yield_now().await;
        }

        let stopped = svc
            .stop(tonic::Request::new(proto::StopRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert!(stopped.error.is_empty());

        let response = reader.await.unwrap().unwrap().into_inner();
        assert!(response.state.is_empty());
        assert!(response.diagnostics[0].summary.contains("Cancelled"));
    }

    #[tokio::test]
    async fn test_host_deadline_is_honoured() {
        let fake = Arc::new(FakeControlPlane::new());
        fake.stall();
        let svc = service(&fake);

        let mut request = tonic::Request::new(proto::ReadRequest {
            resource_type: "commonfate_access_workflow".to_string(),
            current_state: serde_json::to_vec(&json!({"id": "W-1"})).unwrap(),
        });
        request
            .metadata_mut()
            .insert(crate::context::GRPC_TIMEOUT_HEADER, "20m".parse().unwrap());

        let response = svc.read(request).await.unwrap().into_inner();
        assert!(response.diagnostics[0].summary.contains("Deadline exceeded"));
    }
}
