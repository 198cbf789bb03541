//! Result types exchanged between the server, the provider and its resources.
//!
//! These wrap the raw protobuf messages with JSON values and typed
//! diagnostics.

use serde::{Deserialize, Serialize};

use crate::generated::provider as proto;
use crate::schema::Diagnostic;

/// Value shown in place of a sensitive attribute in plan output.
pub const SENSITIVE_MASK: &str = "(sensitive)";

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (JSON-encoded, None if creating).
    pub before: Option<serde_json::Value>,
    /// The value after the change (JSON-encoded, None if deleting).
    pub after: Option<serde_json::Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(
        path: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(
        path: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self::new(path, Some(before), Some(after))
    }

    /// Replace both sides of the change with [`SENSITIVE_MASK`].
    pub fn masked(self) -> Self {
        let mask = |v: Option<serde_json::Value>| {
            v.map(|_| serde_json::Value::String(SENSITIVE_MASK.to_string()))
        };
        Self {
            path: self.path,
            before: mask(self.before),
            after: mask(self.after),
        }
    }
}

impl From<proto::AttributeChange> for AttributeChange {
    fn from(proto: proto::AttributeChange) -> Self {
        Self {
            path: proto.path,
            before: if proto.before.is_empty() {
                None
            } else {
                serde_json::from_slice(&proto.before).ok()
            },
            after: if proto.after.is_empty() {
                None
            } else {
                serde_json::from_slice(&proto.after).ok()
            },
        }
    }
}

impl From<AttributeChange> for proto::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        Self {
            path: change.path,
            before: change
                .before
                .map(|v| serde_json::to_vec(&v).unwrap_or_default())
                .unwrap_or_default(),
            after: change
                .after
                .map(|v| serde_json::to_vec(&v).unwrap_or_default())
                .unwrap_or_default(),
        }
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation (`null` when destroying).
    pub planned_state: serde_json::Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
    /// Validation findings for the configuration.
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: serde_json::Value) -> Self {
        Self::with_changes(state, Vec::new(), false)
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: serde_json::Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
            diagnostics: Vec::new(),
        }
    }

    /// A plan that could not be computed because the configuration is invalid.
    pub fn invalid(proposed_state: serde_json::Value, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            ..Self::no_change(proposed_state)
        }
    }
}

/// The outcome of a create, read or update.
///
/// `state: None` is only produced by Read and tells the host the remote
/// object is gone, so the instance must be dropped. Diagnostics carry
/// whatever the control plane reported alongside a successful response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceState {
    /// The new state to persist.
    pub state: Option<serde_json::Value>,
    /// Diagnostics to report to the host.
    pub diagnostics: Vec<Diagnostic>,
}

impl ResourceState {
    /// A state to persist.
    pub fn new(state: serde_json::Value) -> Self {
        Self {
            state: Some(state),
            diagnostics: Vec::new(),
        }
    }

    /// Ask the host to drop the instance from its state.
    pub fn removed() -> Self {
        Self::default()
    }

    /// Attach diagnostics.
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }

    /// Whether the host should drop the instance.
    pub fn is_removed(&self) -> bool {
        self.state.is_none()
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

/// Server capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Whether the provider supports planning destroy operations.
    pub plan_destroy: bool,
}

/// The protocol version for the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// The handshake prefix output by providers.
pub const HANDSHAKE_PREFIX: &str = "HEMMER_PROVIDER";
