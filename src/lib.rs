//! Hemmer provider for Common Fate
//!
//! This crate manages Common Fate access configuration from Hemmer: access
//! workflows, access rules, selectors, and integrations with identity
//! providers and log sinks. The provider runs as a plugin process that Hemmer
//! spawns and talks to over gRPC, and it drives the Common Fate control plane
//! over gRPC in turn.
//!
//! # Overview
//!
//! - **Resource kinds** ([`resources`]): one adapter per Common Fate object,
//!   all implementing the [`resource::Resource`] lifecycle
//! - **Provider shell** ([`provider`]): resolves credentials at Configure time
//!   and routes every host call to a fresh adapter
//! - **Control-plane client** ([`client`]): the four control-plane services as
//!   async traits, backed by a lazily connected tonic channel
//! - **Diagnostics** ([`diagnostics`]): control-plane findings forwarded to
//!   the host with their severity
//! - **Plugin server** ([`server`]): the host protocol, handshake and graceful
//!   shutdown
//!
//! # Handshake Protocol
//!
//! When the provider starts via [`serve`], it outputs a handshake string to
//! stdout:
//!
//! ```text
//! HEMMER_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `HEMMER_PROVIDER|<protocol_version>|<address>`
//!
//! # Resource Types
//!
//! | Type name | Common Fate object |
//! |-----------|--------------------|
//! | `commonfate_access_workflow` | access workflow |
//! | `commonfate_access_rule` | access rule |
//! | `commonfate_{auth0_organization,entra_group,okta_group,snowflake_database}_selector` | selector |
//! | `commonfate_{auth0,entra,okta,snowflake,pagerduty,webhook}_integration` | integration |
//! | `commonfate_s3_log_destination` | S3 log destination integration |
//!
//! # Provider Configuration
//!
//! ```text
//! provider "commonfate" {
//!   host     = "https://commonfate.example.com"   # or COMMONFATE_HOST
//!   username = "..."                              # or COMMONFATE_USERNAME
//!   password = "..."                              # or COMMONFATE_PASSWORD
//! }
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;
pub mod value;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use context::Context;
pub use error::ProviderError;
pub use logging::{init_logging, try_init_logging};
pub use provider::CommonFateProvider;
pub use schema::ProviderSchema;
pub use server::{serve, serve_with_options, ProviderService, ServeOptions};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ResourceState,
    ServerCapabilities, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
