use serde::{Deserialize, Serialize};

use super::{
    action_filter_from_proto, action_filter_to_proto, filter_for_actions_attribute,
    IntegrationKind, Variant,
};
use crate::error::ProviderError;
use crate::generated::integration;
use crate::schema::{Attribute, Schema, Validator};
use crate::value::Attr;

/// Minutes of events batched into one object when unset.
pub const DEFAULT_BATCH_DURATION_MINUTES: i64 = 5;
/// Events per object when unset.
pub const DEFAULT_MAXIMUM_BATCH_SIZE: i64 = 5000;

/// `commonfate_s3_log_destination`: batches events into objects in an S3
/// bucket.
pub struct S3LogDestination;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3LogDestinationConfig {
    pub bucket_name: Attr<String>,
    pub role_arn: Attr<String>,
    pub key_template: Attr<String>,
    pub compression: Attr<String>,
    pub filter_for_actions: Attr<Vec<String>>,
    pub batch_duration_in_minutes: Attr<i64>,
    pub maximum_batch_size: Attr<i64>,
}

fn to_u32(value: Attr<i64>, attribute: &str, default: i64) -> Result<u32, ProviderError> {
    let value = value.optional(attribute)?.unwrap_or(default);
    u32::try_from(value).map_err(|_| {
        ProviderError::Validation(format!("attribute '{}' is out of range: {}", attribute, value))
    })
}

impl IntegrationKind for S3LogDestination {
    const TYPE_SUFFIX: &'static str = "s3_log_destination";
    const VARIANT: &'static str = "s3_log_destination";
    const DESCRIPTION: &'static str = "Writes Common Fate audit events to an S3 bucket.";

    type Config = S3LogDestinationConfig;

    fn extend_schema(schema: Schema) -> Schema {
        schema
            .with_attribute(
                "bucket_name",
                Attribute::required_string().with_description("The bucket events are written to."),
            )
            .with_attribute(
                "role_arn",
                Attribute::required_string()
                    .with_description("The IAM role Common Fate assumes to write to the bucket."),
            )
            .with_attribute(
                "key_template",
                Attribute::optional_string()
                    .with_description("Template for object keys. Common Fate's default is used when unset."),
            )
            .with_attribute(
                "compression",
                Attribute::optional_string()
                    .with_description("Compression applied to written objects, e.g. `gzip`."),
            )
            .with_attribute("filter_for_actions", filter_for_actions_attribute())
            .with_attribute(
                "batch_duration_in_minutes",
                Attribute::optional_int64()
                    .with_default(serde_json::json!(DEFAULT_BATCH_DURATION_MINUTES))
                    .with_validator(Validator::AtLeast(DEFAULT_BATCH_DURATION_MINUTES))
                    .with_description("How long events are batched before being written. At least 5."),
            )
            .with_attribute(
                "maximum_batch_size",
                Attribute::optional_int64()
                    .with_default(serde_json::json!(DEFAULT_MAXIMUM_BATCH_SIZE))
                    .with_description("The most events written in one object."),
            )
    }

    fn to_variant(config: &S3LogDestinationConfig) -> Result<Variant, ProviderError> {
        Ok(Variant::S3LogDestination(integration::S3LogDestination {
            bucket_name: config.bucket_name.clone().require("bucket_name")?,
            role_arn: config.role_arn.clone().require("role_arn")?,
            key_template: config
                .key_template
                .clone()
                .optional("key_template")?
                .unwrap_or_default(),
            compression: config
                .compression
                .clone()
                .optional("compression")?
                .unwrap_or_default(),
            filter_for_actions: action_filter_to_proto(&config.filter_for_actions)?,
            batch_duration_minutes: to_u32(
                config.batch_duration_in_minutes.clone(),
                "batch_duration_in_minutes",
                DEFAULT_BATCH_DURATION_MINUTES,
            )?,
            maximum_batch_size: to_u32(
                config.maximum_batch_size.clone(),
                "maximum_batch_size",
                DEFAULT_MAXIMUM_BATCH_SIZE,
            )?,
        }))
    }

    fn from_variant(variant: Variant) -> Option<S3LogDestinationConfig> {
        let Variant::S3LogDestination(s3) = variant else {
            return None;
        };
        Some(S3LogDestinationConfig {
            bucket_name: Attr::non_empty(s3.bucket_name),
            role_arn: Attr::non_empty(s3.role_arn),
            key_template: Attr::non_empty(s3.key_template),
            compression: Attr::non_empty(s3.compression),
            filter_for_actions: action_filter_from_proto(s3.filter_for_actions),
            batch_duration_in_minutes: Attr::Known(i64::from(s3.batch_duration_minutes)),
            maximum_batch_size: Attr::Known(i64::from(s3.maximum_batch_size)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_batch_size_is_rejected() {
        let config = S3LogDestinationConfig {
            bucket_name: Attr::Known("logs".to_string()),
            role_arn: Attr::Known("arn:aws:iam::123456789012:role/cf".to_string()),
            maximum_batch_size: Attr::Known(-1),
            ..Default::default()
        };
        let err = S3LogDestination::to_variant(&config).unwrap_err();
        assert!(err.to_string().contains("maximum_batch_size"));
    }

    #[test]
    fn test_null_batch_settings_use_defaults() {
        let config = S3LogDestinationConfig {
            bucket_name: Attr::Known("logs".to_string()),
            role_arn: Attr::Known("arn:aws:iam::123456789012:role/cf".to_string()),
            ..Default::default()
        };
        let Variant::S3LogDestination(s3) = S3LogDestination::to_variant(&config).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(s3.batch_duration_minutes, 5);
        assert_eq!(s3.maximum_batch_size, 5000);
        assert!(s3.key_template.is_empty());
    }

    #[test]
    fn test_read_back_maps_empty_strings_to_null() {
        let config = S3LogDestination::from_variant(Variant::S3LogDestination(
            integration::S3LogDestination {
                bucket_name: "logs".to_string(),
                role_arn: "arn".to_string(),
                batch_duration_minutes: 10,
                maximum_batch_size: 100,
                ..Default::default()
            },
        ))
        .unwrap();
        assert!(config.compression.is_null());
        assert!(config.filter_for_actions.is_null());
        assert_eq!(config.batch_duration_in_minutes, Attr::Known(10));
    }
}
