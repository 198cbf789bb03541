use serde::{Deserialize, Serialize};

use super::{
    action_filter_from_proto, action_filter_to_proto, filter_for_actions_attribute,
    IntegrationKind, Variant,
};
use crate::error::ProviderError;
use crate::generated::integration;
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::value::Attr;

/// `commonfate_webhook_integration`: forwards audit and authorization events
/// to an HTTP endpoint.
pub struct Webhook;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookHeaderModel {
    pub key: Attr<String>,
    pub value: Attr<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: Attr<String>,
    pub send_audit_log_events: Attr<bool>,
    pub send_authorization_events: Attr<bool>,
    pub headers: Attr<Vec<WebhookHeaderModel>>,
    pub filter_for_actions: Attr<Vec<String>>,
}

impl IntegrationKind for Webhook {
    const TYPE_SUFFIX: &'static str = "webhook_integration";
    const VARIANT: &'static str = "webhook";
    const DESCRIPTION: &'static str =
        "Sends Common Fate events to an HTTP endpoint as they happen.";

    type Config = WebhookConfig;

    fn extend_schema(schema: Schema) -> Schema {
        schema
            .with_attribute(
                "url",
                Attribute::required_string().with_description("The endpoint events are POSTed to."),
            )
            .with_attribute(
                "send_audit_log_events",
                Attribute::optional_bool()
                    .with_default(serde_json::json!(false))
                    .with_description("Send audit log events."),
            )
            .with_attribute(
                "send_authorization_events",
                Attribute::optional_bool()
                    .with_default(serde_json::json!(false))
                    .with_description("Send authorization decision events."),
            )
            .with_attribute("filter_for_actions", filter_for_actions_attribute())
            .with_block(
                "headers",
                NestedBlock::list(
                    Block::new()
                        .with_description("An HTTP header added to every request.")
                        .with_attribute("key", Attribute::required_string())
                        .with_attribute("value", Attribute::required_string()),
                ),
            )
    }

    fn to_variant(config: &WebhookConfig) -> Result<Variant, ProviderError> {
        let headers = config
            .headers
            .clone()
            .optional("headers")?
            .unwrap_or_default()
            .into_iter()
            .map(|h| {
                Ok(integration::WebhookHeader {
                    key: h.key.require("headers.key")?,
                    value: h.value.require("headers.value")?,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;

        Ok(Variant::Webhook(integration::Webhook {
            url: config.url.clone().require("url")?,
            send_audit_log_events: config
                .send_audit_log_events
                .clone()
                .optional("send_audit_log_events")?
                .unwrap_or(false),
            send_authorization_events: config
                .send_authorization_events
                .clone()
                .optional("send_authorization_events")?
                .unwrap_or(false),
            headers,
            filter_for_actions: action_filter_to_proto(&config.filter_for_actions)?,
        }))
    }

    fn from_variant(variant: Variant) -> Option<WebhookConfig> {
        let Variant::Webhook(webhook) = variant else {
            return None;
        };
        let headers = webhook
            .headers
            .into_iter()
            .map(|h| WebhookHeaderModel {
                key: Attr::non_empty(h.key),
                value: Attr::non_empty(h.value),
            })
            .collect();
        Some(WebhookConfig {
            url: Attr::non_empty(webhook.url),
            send_audit_log_events: Attr::Known(webhook.send_audit_log_events),
            send_authorization_events: Attr::Known(webhook.send_authorization_events),
            headers: Attr::non_empty_list(headers),
            filter_for_actions: action_filter_from_proto(webhook.filter_for_actions),
        })
    }
}
