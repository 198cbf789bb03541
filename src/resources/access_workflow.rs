//! `commonfate_access_workflow`: how access is requested, approved and extended.

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
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::types::ResourceState;
use crate::value::Attr;

/// Host-side model of an access workflow. Durations are in seconds.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessWorkflowModel {
    pub id: Attr<String>,
    pub name: Attr<String>,
    pub access_duration: Attr<i64>,
    pub try_extend_after: Attr<i64>,
    pub priority: Attr<i64>,
    pub activation_expiry: Attr<i64>,
    pub default_duration: Attr<i64>,
}

impl AccessWorkflowModel {
    fn from_proto(workflow: cfg::AccessWorkflow) -> Self {
        Self {
            id: Attr::non_empty(workflow.id),
            name: Attr::non_empty(workflow.name),
            access_duration: Attr::Known(workflow.access_duration_seconds),
            try_extend_after: Attr::Known(workflow.try_extend_after_seconds),
            priority: Attr::Known(i64::from(workflow.priority)),
            activation_expiry: workflow.activation_expiry_seconds.into(),
            default_duration: workflow.default_duration_seconds.into(),
        }
    }

    /// The full payload for Update. An unset priority keeps the prior one.
    fn to_proto(&self, prior: &Self, id: String) -> Result<cfg::AccessWorkflow, ProviderError> {
        let priority = self
            .priority
            .known()
            .or_else(|| prior.priority.known())
            .copied()
            .unwrap_or_default();
        Ok(cfg::AccessWorkflow {
            id,
            name: self.name.clone().require("name")?,
            access_duration_seconds: self.access_duration.clone().require("access_duration")?,
            try_extend_after_seconds: self
                .try_extend_after
                .clone()
                .require("try_extend_after")?,
            priority: to_i32(priority, "priority")?,
            activation_expiry_seconds: self.activation_expiry.clone().optional("activation_expiry")?,
            default_duration_seconds: self.default_duration.clone().optional("default_duration")?,
        })
    }

    /// Record the id and, when it was left to the server, the priority.
    fn apply_computed(mut self, id: String, workflow: &cfg::AccessWorkflow) -> Self {
        self.id = Attr::Known(id);
        if !self.priority.is_known() {
            self.priority = Attr::Known(i64::from(workflow.priority));
        }
        self
    }
}

#[derive(Default)]
pub struct AccessWorkflowResource {
    client: Option<ControlPlane>,
}

impl AccessWorkflowResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> Box<dyn Resource> {
        Box::new(Self::new())
    }
}

fn missing_workflow() -> ProviderError {
    ProviderError::Remote("control plane response did not include the access workflow".to_string())
}

#[async_trait]
impl Resource for AccessWorkflowResource {
    fn type_suffix(&self) -> &'static str {
        "access_workflow"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "Access workflows are used to describe how long access should be applied. \
                 Created workflows can be linked to access rules.",
            )
            .with_attribute("id", Attribute::id())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name of the workflow."),
            )
            .with_attribute(
                "access_duration",
                Attribute::required_int64()
                    .with_description("The maximum length of time access can be granted for, in seconds."),
            )
            .with_attribute(
                "try_extend_after",
                Attribute::required_int64().with_description(
                    "The amount of time after access has been activated that extension can be requested, in seconds.",
                ),
            )
            .with_attribute(
                "priority",
                Attribute::optional_computed_int64()
                    .with_use_state_for_unknown()
                    .with_description(
                        "The priority of the workflow when several apply. Set by Common Fate when omitted.",
                    ),
            )
            .with_attribute(
                "activation_expiry",
                Attribute::optional_int64().with_description(
                    "How long an approved request may wait to be activated before it expires, in seconds.",
                ),
            )
            .with_attribute(
                "default_duration",
                Attribute::optional_int64()
                    .with_description("The duration requested by default, in seconds."),
            )
    }

    fn configure(&mut self, data: Option<&ProviderData>) -> Result<(), ProviderError> {
        self.client = control_plane_from(data)?;
        Ok(())
    }

    async fn create(&self, ctx: &Context, planned: &Value) -> Result<ResourceState, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let plan: AccessWorkflowModel = decode_model(planned)?;

        // Unset or unknown: the control plane picks the priority.
        let priority = plan
            .priority
            .known()
            .map(|p| to_i32(*p, "priority"))
            .transpose()?;
        let request = cfg::CreateAccessWorkflowRequest {
            name: plan.name.clone().require("name")?,
            access_duration_seconds: plan.access_duration.clone().require("access_duration")?,
            try_extend_after_seconds: plan.try_extend_after.clone().require("try_extend_after")?,
            priority,
            activation_expiry_seconds: plan.activation_expiry.clone().optional("activation_expiry")?,
            default_duration_seconds: plan.default_duration.clone().optional("default_duration")?,
        };

        let response = client.workflows.create_access_workflow(ctx, request).await?;
        let workflow = response.workflow.ok_or_else(missing_workflow)?;
        if workflow.id.is_empty() {
            return Err(ProviderError::Remote(
                "control plane did not assign an id to the access workflow".to_string(),
            ));
        }
        info!(id = %workflow.id, "created access workflow");

        let state = plan.apply_computed(workflow.id.clone(), &workflow);
        Ok(ResourceState::new(encode_model(&state)?)
            .with_diagnostics(diagnostics::from_remote(response.diagnostics)))
    }

    async fn read(&self, ctx: &Context, current: &Value) -> Result<ResourceState, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let prior: AccessWorkflowModel = decode_model(current)?;
        let id = prior.id.require("id")?;

        let response = match client
            .workflows
            .get_access_workflow(ctx, cfg::GetAccessWorkflowRequest { id: id.clone() })
            .await
        {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                warn!(id = %id, "access workflow no longer exists; removing from state");
                return Ok(ResourceState::removed());
            }
            Err(err) => return Err(err),
        };

        let workflow = response.workflow.ok_or_else(missing_workflow)?;
        let mut state = AccessWorkflowModel::from_proto(workflow);
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
        let prior: AccessWorkflowModel = decode_model(prior)?;
        let plan: AccessWorkflowModel = decode_model(planned)?;
        let id = prior.id.clone().require("id")?;

        let request = cfg::UpdateAccessWorkflowRequest {
            workflow: Some(plan.to_proto(&prior, id.clone())?),
        };
        let response = client.workflows.update_access_workflow(ctx, request).await?;
        let workflow = response.workflow.ok_or_else(missing_workflow)?;
        info!(id = %id, "updated access workflow");

        let state = plan.apply_computed(id, &workflow);
        Ok(ResourceState::new(encode_model(&state)?)
            .with_diagnostics(diagnostics::from_remote(response.diagnostics)))
    }

    async fn delete(&self, ctx: &Context, current: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let client = require_client(self.client.as_ref())?;
        let state: AccessWorkflowModel = decode_model(current)?;
        let id = state.id.require("id")?;

        client
            .workflows
            .delete_access_workflow(ctx, cfg::DeleteAccessWorkflowRequest { id: id.clone() })
            .await?;
        info!(id = %id, "deleted access workflow");
        Ok(Vec::new())
    }
}
