use serde::{Deserialize, Serialize};

use super::{IntegrationKind, Variant};
use crate::error::ProviderError;
use crate::generated::integration;
use crate::schema::{Attribute, Schema};
use crate::value::Attr;

/// `commonfate_entra_integration`.
pub struct Entra;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntraConfig {
    pub tenant_id: Attr<String>,
    pub client_id: Attr<String>,
    pub client_secret_secret_path: Attr<String>,
}

impl IntegrationKind for Entra {
    const TYPE_SUFFIX: &'static str = "entra_integration";
    const VARIANT: &'static str = "entra";
    const DESCRIPTION: &'static str =
        "Registers a Microsoft Entra tenant with Common Fate so its groups can be selected and granted.";

    type Config = EntraConfig;

    fn extend_schema(schema: Schema) -> Schema {
        schema
            .with_attribute(
                "tenant_id",
                Attribute::required_string().with_description("The Entra tenant id."),
            )
            .with_attribute(
                "client_id",
                Attribute::required_string()
                    .with_description("The client id of the Entra app registration."),
            )
            .with_attribute(
                "client_secret_secret_path",
                Attribute::required_string()
                    .with_description("Path to the secret holding the app registration's client secret."),
            )
    }

    fn to_variant(config: &EntraConfig) -> Result<Variant, ProviderError> {
        Ok(Variant::Entra(integration::Entra {
            tenant_id: config.tenant_id.clone().require("tenant_id")?,
            client_id: config.client_id.clone().require("client_id")?,
            client_secret_secret_path: config
                .client_secret_secret_path
                .clone()
                .require("client_secret_secret_path")?,
        }))
    }

    fn from_variant(variant: Variant) -> Option<EntraConfig> {
        match variant {
            Variant::Entra(entra) => Some(EntraConfig {
                tenant_id: Attr::non_empty(entra.tenant_id),
                client_id: Attr::non_empty(entra.client_id),
                client_secret_secret_path: Attr::non_empty(entra.client_secret_secret_path),
            }),
            _ => None,
        }
    }
}
