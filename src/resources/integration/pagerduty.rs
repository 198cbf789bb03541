use serde::{Deserialize, Serialize};

use super::{IntegrationKind, Variant};
use crate::error::ProviderError;
use crate::generated::integration;
use crate::schema::{Attribute, Schema};
use crate::value::Attr;

/// `commonfate_pagerduty_integration`.
pub struct PagerDuty;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerDutyConfig {
    pub client_id: Attr<String>,
    pub client_secret_secret_path: Attr<String>,
}

impl IntegrationKind for PagerDuty {
    const TYPE_SUFFIX: &'static str = "pagerduty_integration";
    const VARIANT: &'static str = "pager_duty";
    const DESCRIPTION: &'static str =
        "Connects PagerDuty so on-call schedules can be used when approving access.";

    type Config = PagerDutyConfig;

    fn extend_schema(schema: Schema) -> Schema {
        schema
            .with_attribute(
                "client_id",
                Attribute::required_string().with_description("The PagerDuty OAuth client id."),
            )
            .with_attribute(
                "client_secret_secret_path",
                Attribute::required_string()
                    .with_description("Path to the secret holding the OAuth client secret."),
            )
    }

    fn to_variant(config: &PagerDutyConfig) -> Result<Variant, ProviderError> {
        Ok(Variant::PagerDuty(integration::PagerDuty {
            client_id: config.client_id.clone().require("client_id")?,
            client_secret_secret_path: config
                .client_secret_secret_path
                .clone()
                .require("client_secret_secret_path")?,
        }))
    }

    fn from_variant(variant: Variant) -> Option<PagerDutyConfig> {
        match variant {
            Variant::PagerDuty(pd) => Some(PagerDutyConfig {
                client_id: Attr::non_empty(pd.client_id),
                client_secret_secret_path: Attr::non_empty(pd.client_secret_secret_path),
            }),
            _ => None,
        }
    }
}
