use serde::{Deserialize, Serialize};

use super::{IntegrationKind, Variant};
use crate::error::ProviderError;
use crate::generated::integration;
use crate::schema::{Attribute, Schema};
use crate::value::Attr;

/// `commonfate_snowflake_integration`.
pub struct Snowflake;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowflakeConfig {
    pub account_id: Attr<String>,
    pub region: Attr<String>,
    pub username: Attr<String>,
    pub password_secret_path: Attr<String>,
}

impl IntegrationKind for Snowflake {
    const TYPE_SUFFIX: &'static str = "snowflake_integration";
    const VARIANT: &'static str = "snowflake";
    const DESCRIPTION: &'static str =
        "Registers a Snowflake account with Common Fate so its databases can be selected and granted.";

    type Config = SnowflakeConfig;

    fn extend_schema(schema: Schema) -> Schema {
        schema
            .with_attribute(
                "account_id",
                Attribute::required_string().with_description("The Snowflake account identifier."),
            )
            .with_attribute(
                "region",
                Attribute::required_string().with_description("The region the account is hosted in."),
            )
            .with_attribute(
                "username",
                Attribute::required_string()
                    .with_description("The Snowflake user Common Fate connects as."),
            )
            .with_attribute(
                "password_secret_path",
                Attribute::required_string()
                    .with_description("Path to the secret holding that user's password."),
            )
    }

    fn to_variant(config: &SnowflakeConfig) -> Result<Variant, ProviderError> {
        Ok(Variant::Snowflake(integration::Snowflake {
            account_id: config.account_id.clone().require("account_id")?,
            region: config.region.clone().require("region")?,
            username: config.username.clone().require("username")?,
            password_secret_path: config
                .password_secret_path
                .clone()
                .require("password_secret_path")?,
        }))
    }

    fn from_variant(variant: Variant) -> Option<SnowflakeConfig> {
        match variant {
            Variant::Snowflake(snowflake) => Some(SnowflakeConfig {
                account_id: Attr::non_empty(snowflake.account_id),
                region: Attr::non_empty(snowflake.region),
                username: Attr::non_empty(snowflake.username),
                password_secret_path: Attr::non_empty(snowflake.password_secret_path),
            }),
            _ => None,
        }
    }
}
