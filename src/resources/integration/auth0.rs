use serde::{Deserialize, Serialize};

use super::{IntegrationKind, Variant};
use crate::error::ProviderError;
use crate::generated::integration;
use crate::schema::{Attribute, Schema};
use crate::value::Attr;

/// `commonfate_auth0_integration`.
pub struct Auth0;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Auth0Config {
    pub domain: Attr<String>,
    pub client_id: Attr<String>,
    pub client_secret_secret_path: Attr<String>,
}

impl IntegrationKind for Auth0 {
    const TYPE_SUFFIX: &'static str = "auth0_integration";
    const VARIANT: &'static str = "auth0";
    const DESCRIPTION: &'static str =
        "Registers an Auth0 tenant with Common Fate so its organizations can be selected and granted.";

    type Config = Auth0Config;

    fn extend_schema(schema: Schema) -> Schema {
        schema
            .with_attribute(
                "domain",
                Attribute::required_string()
                    .with_description("The Auth0 tenant domain, e.g. `acme.us.auth0.com`."),
            )
            .with_attribute(
                "client_id",
                Attribute::required_string()
                    .with_description("The client id of the Auth0 machine-to-machine application."),
            )
            .with_attribute(
                "client_secret_secret_path",
                Attribute::required_string().with_description(
                    "Path to the secret holding the application's client secret.",
                ),
            )
    }

    fn to_variant(config: &Auth0Config) -> Result<Variant, ProviderError> {
        Ok(Variant::Auth0(integration::Auth0 {
            domain: config.domain.clone().require("domain")?,
            client_id: config.client_id.clone().require("client_id")?,
            client_secret_secret_path: config
                .client_secret_secret_path
                .clone()
                .require("client_secret_secret_path")?,
        }))
    }

    fn from_variant(variant: Variant) -> Option<Auth0Config> {
        match variant {
            Variant::Auth0(auth0) => Some(Auth0Config {
                domain: Attr::non_empty(auth0.domain),
                client_id: Attr::non_empty(auth0.client_id),
                client_secret_secret_path: Attr::non_empty(auth0.client_secret_secret_path),
            }),
            _ => None,
        }
    }
}
