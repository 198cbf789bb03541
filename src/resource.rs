//! The lifecycle contract every Common Fate resource kind implements.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::ProviderData;
use crate::context::Context;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};
use crate::types::ResourceState;

/// Prefix of every resource type name this provider registers.
pub const TYPE_PREFIX: &str = "commonfate";

/// A resource kind bound to the control plane.
///
/// A fresh value is built from its [`ResourceFactory`] for every host call,
/// configured with the provider data, used once and dropped. Implementations
/// hold no state beyond the configured client.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The kind suffix, e.g. `webhook_integration`.
    fn type_suffix(&self) -> &'static str;

    /// The full type name the host stores, e.g. `commonfate_webhook_integration`.
    fn type_name(&self) -> String {
        format!("{}_{}", TYPE_PREFIX, self.type_suffix())
    }

    fn schema(&self) -> Schema;

    /// Receive the provider data published at Configure.
    ///
    /// `None` means the provider is not configured yet and must not fail;
    /// data of an unexpected type is a configuration error.
    fn configure(&mut self, data: Option<&ProviderData>) -> Result<(), ProviderError>;

    /// Create the remote object from the planned state.
    async fn create(&self, ctx: &Context, planned: &Value) -> Result<ResourceState, ProviderError>;

    /// Refresh state from the control plane.
    ///
    /// A remote object that no longer exists yields [`ResourceState::removed`].
    async fn read(&self, ctx: &Context, current: &Value) -> Result<ResourceState, ProviderError>;

    /// Replace the remote object with the planned state.
    ///
    /// The id is taken from `prior`, never from `planned`.
    async fn update(
        &self,
        ctx: &Context,
        prior: &Value,
        planned: &Value,
    ) -> Result<ResourceState, ProviderError>;

    async fn delete(&self, ctx: &Context, current: &Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// State for `import <id>`: the id and every other field null.
    ///
    /// The Read that follows an import fills in the rest.
    fn import_state(&self, id: &str) -> Value {
        let mut state: Map<String, Value> = self
            .schema()
            .field_names()
            .into_iter()
            .map(|name| (name.to_string(), Value::Null))
            .collect();
        state.insert("id".to_string(), Value::String(id.to_string()));
        Value::Object(state)
    }
}

/// Builds an unconfigured adapter.
pub type ResourceFactory = fn() -> Box<dyn Resource>;

/// Decode a host value into a resource model.
pub fn decode_model<T: DeserializeOwned>(value: &Value) -> Result<T, ProviderError> {
    T::deserialize(value).map_err(|e| {
        ProviderError::InvalidRequest(format!("could not decode resource data: {}", e))
    })
}

/// Encode a resource model for the host.
pub fn encode_model<T: Serialize>(model: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(model)?)
}

/// Narrow an int64 attribute to the control plane's 32-bit fields.
pub fn to_i32(value: i64, attribute: &str) -> Result<i32, ProviderError> {
    i32::try_from(value).map_err(|_| {
        ProviderError::Validation(format!(
            "attribute '{}' is out of range: {}",
            attribute, value
        ))
    })
}
