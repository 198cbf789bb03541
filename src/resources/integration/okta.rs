use serde::{Deserialize, Serialize};

use super::{IntegrationKind, Variant};
use crate::error::ProviderError;
use crate::generated::integration;
use crate::schema::{Attribute, Schema};
use crate::value::Attr;

/// `commonfate_okta_integration`.
pub struct Okta;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OktaConfig {
    pub organization_id: Attr<String>,
    pub api_key_secret_path: Attr<String>,
}

impl IntegrationKind for Okta {
    const TYPE_SUFFIX: &'static str = "okta_integration";
    const VARIANT: &'static str = "okta";
    const DESCRIPTION: &'static str =
        "Registers an Okta organization with Common Fate so its groups can be selected and granted.";

    type Config = OktaConfig;

    fn extend_schema(schema: Schema) -> Schema {
        schema
            .with_attribute(
                "organization_id",
                Attribute::required_string()
                    .with_description("The Okta organization id, e.g. `acme` for `acme.okta.com`."),
            )
            .with_attribute(
                "api_key_secret_path",
                Attribute::required_string()
                    .with_description("Path to the secret holding the Okta API key."),
            )
    }

    fn to_variant(config: &OktaConfig) -> Result<Variant, ProviderError> {
        Ok(Variant::Okta(integration::Okta {
            organization_id: config.organization_id.clone().require("organization_id")?,
            api_key_secret_path: config
                .api_key_secret_path
                .clone()
                .require("api_key_secret_path")?,
        }))
    }

    fn from_variant(variant: Variant) -> Option<OktaConfig> {
        match variant {
            Variant::Okta(okta) => Some(OktaConfig {
                organization_id: Attr::non_empty(okta.organization_id),
                api_key_secret_path: Attr::non_empty(okta.api_key_secret_path),
            }),
            _ => None,
        }
    }
}
