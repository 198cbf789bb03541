//! Provider block configuration.
//!
//! The provider block accepts `host`, `username`, `password` and `version`.
//! A null `host`, `username` or `password` falls back to the matching
//! `COMMONFATE_*` environment variable. An unknown value is rejected outright:
//! the client cannot be built from a value that is only known after apply.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::schema::{Attribute, Diagnostic, Schema};
use crate::value::Attr;

/// Environment variable consulted when `host` is not set.
pub const HOST_ENV: &str = "COMMONFATE_HOST";
/// Environment variable consulted when `username` is not set.
pub const USERNAME_ENV: &str = "COMMONFATE_USERNAME";
/// Environment variable consulted when `password` is not set.
pub const PASSWORD_ENV: &str = "COMMONFATE_PASSWORD";

/// Resolved provider configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the Common Fate API.
    pub host: String,
    pub username: String,
    pub password: String,
    /// Accepted and recorded; no behaviour depends on it.
    pub version: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"(sensitive)")
            .field("version", &self.version)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    host: Attr<String>,
    username: Attr<String>,
    password: Attr<String>,
    version: Attr<String>,
}

struct Setting {
    attribute: &'static str,
    label: &'static str,
    env: &'static str,
}

const HOST: Setting = Setting {
    attribute: "host",
    label: "Common Fate API host",
    env: HOST_ENV,
};
const USERNAME: Setting = Setting {
    attribute: "username",
    label: "Common Fate API username",
    env: USERNAME_ENV,
};
const PASSWORD: Setting = Setting {
    attribute: "password",
    label: "Common Fate API password",
    env: PASSWORD_ENV,
};

impl ProviderConfig {
    /// Resolve the provider block against the process environment.
    pub fn resolve(config: &Value) -> Result<Self, Vec<Diagnostic>> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve the provider block with an injected environment lookup.
    ///
    /// All problems are reported together, each scoped to its attribute.
    pub fn resolve_with<F>(config: &Value, env: F) -> Result<Self, Vec<Diagnostic>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = match config {
            Value::Null => RawConfig::default(),
            other => RawConfig::deserialize(other).map_err(|e| {
                vec![Diagnostic::error("Invalid provider configuration")
                    .with_detail(e.to_string())]
            })?,
        };

        let mut diagnostics = Vec::new();
        let host = resolve_setting(&HOST, raw.host, &env, &mut diagnostics);
        let username = resolve_setting(&USERNAME, raw.username, &env, &mut diagnostics);
        let password = resolve_setting(&PASSWORD, raw.password, &env, &mut diagnostics);

        let version = match raw.version {
            Attr::Unknown => {
                diagnostics.push(unknown_value("version", "provider version", None));
                None
            }
            other => other.into_known(),
        };

        if diagnostics.is_empty() {
            Ok(Self {
                host,
                username,
                password,
                version,
            })
        } else {
            Err(diagnostics)
        }
    }
}

fn resolve_setting<F>(
    setting: &Setting,
    value: Attr<String>,
    env: &F,
    diagnostics: &mut Vec<Diagnostic>,
) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let resolved = match value {
        Attr::Unknown => {
            diagnostics.push(unknown_value(
                setting.attribute,
                setting.label,
                Some(setting.env),
            ));
            return String::new();
        }
        Attr::Known(value) => value,
        Attr::Null => env(setting.env).unwrap_or_default(),
    };

    if resolved.is_empty() {
        diagnostics.push(
            Diagnostic::error(format!("Missing {}", setting.label))
                .with_detail(format!(
                    "The provider cannot create the Common Fate client as there is a missing or empty value for the {}. \
                     Set the {} value in the configuration or use the {} environment variable.",
                    setting.label, setting.attribute, setting.env
                ))
                .with_attribute(setting.attribute),
        );
    }
    resolved
}

fn unknown_value(attribute: &str, label: &str, env: Option<&str>) -> Diagnostic {
    let hint = match env {
        Some(env) => format!(", or use the {} environment variable", env),
        None => String::new(),
    };
    Diagnostic::error(format!("Unknown {}", label))
        .with_detail(format!(
            "The provider cannot create the Common Fate client as there is an unknown configuration value for the {}. \
             Either apply the source of the value first, set the value statically in the configuration{}.",
            label, hint
        ))
        .with_attribute(attribute)
}

/// Schema of the provider block.
pub fn provider_schema() -> Schema {
    Schema::v0()
        .with_description("Manage access rules, workflows, selectors and integrations in Common Fate.")
        .with_attribute(
            "host",
            Attribute::optional_string().with_description(
                "The Common Fate API URL. May also be set with `COMMONFATE_HOST`.",
            ),
        )
        .with_attribute(
            "username",
            Attribute::optional_string().with_description(
                "Client id used to authenticate. May also be set with `COMMONFATE_USERNAME`.",
            ),
        )
        .with_attribute(
            "password",
            Attribute::optional_string()
                .sensitive()
                .with_description(
                    "Client secret used to authenticate. May also be set with `COMMONFATE_PASSWORD`.",
                ),
        )
        .with_attribute(
            "version",
            Attribute::optional_string()
                .with_description("The Common Fate deployment version. Currently informational."),
        )
}
