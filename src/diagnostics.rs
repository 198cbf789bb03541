//! Conversions between control-plane, provider and host diagnostics.
//!
//! Control-plane responses may carry diagnostics next to a successful
//! payload. They are forwarded with their severity intact; only error
//! severity fails the host operation, and even then the state returned with
//! them is still written.

use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::generated::diagnostic as remote;
use crate::generated::provider as proto;
use crate::schema::{Diagnostic, DiagnosticSeverity};

/// Convert control-plane diagnostics into provider diagnostics.
///
/// An unspecified level is reported as a warning so it is visible without
/// failing the operation.
pub fn from_remote(diagnostics: Vec<remote::Diagnostic>) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| {
            let level = remote::DiagnosticLevel::try_from(d.level)
                .unwrap_or(remote::DiagnosticLevel::Unspecified);
            let diagnostic = match level {
                remote::DiagnosticLevel::Error => {
                    warn!(path = %d.path, message = %d.message, "control plane reported an error");
                    Diagnostic::error(d.message)
                }
                remote::DiagnosticLevel::Warning | remote::DiagnosticLevel::Unspecified => {
                    debug!(path = %d.path, "control plane reported a warning");
                    Diagnostic::warning(d.message)
                }
                remote::DiagnosticLevel::Info => Diagnostic::info(d.message),
            };
            if d.path.is_empty() {
                diagnostic
            } else {
                diagnostic.with_attribute(d.path)
            }
        })
        .collect()
}

/// Convert provider diagnostics into the host wire format.
pub fn to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| proto::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning as i32,
                DiagnosticSeverity::Info => proto::diagnostic::Severity::Info as i32,
            },
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.unwrap_or_default(),
        })
        .collect()
}

/// Turn a failed operation into a single error diagnostic for the host.
pub fn from_error(err: &ProviderError) -> Diagnostic {
    let diagnostic = Diagnostic::error(err.to_string());
    match err {
        ProviderError::VariantMismatch { expected, .. } => diagnostic.with_detail(format!(
            "The remote integration is not a {} integration. Check that the imported id belongs to this resource type.",
            expected
        )),
        ProviderError::Unconfigured(_) => diagnostic.with_detail(
            "The provider was asked to manage a resource before it was configured. \
             This is a bug in the provider or in Hemmer; please report it at \
             https://github.com/hemmer-io/hemmer-provider-commonfate/issues.",
        ),
        _ => diagnostic,
    }
}

/// Wire form of [`from_error`].
pub fn error_to_proto(err: &ProviderError) -> Vec<proto::Diagnostic> {
    to_proto(vec![from_error(err)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(level: remote::DiagnosticLevel, message: &str, path: &str) -> remote::Diagnostic {
        remote::Diagnostic {
            level: level as i32,
            message: message.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_from_remote_preserves_severity() {
        let diagnostics = from_remote(vec![
            remote(remote::DiagnosticLevel::Info, "synced", ""),
            remote(
                remote::DiagnosticLevel::Warning,
                "secret path not found yet",
                "client_secret_secret_path",
            ),
            remote(remote::DiagnosticLevel::Error, "domain rejected", "domain"),
        ]);

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Info);
        assert!(diagnostics[0].attribute.is_none());
        assert_eq!(diagnostics[1].severity, DiagnosticSeverity::Warning);
        assert_eq!(
            diagnostics[1].attribute.as_deref(),
            Some("client_secret_secret_path")
        );
        assert_eq!(diagnostics[2].severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostics[2].summary, "domain rejected");
    }

    #[test]
    fn test_unspecified_and_unrecognised_levels_are_warnings() {
        let mut odd = remote(remote::DiagnosticLevel::Info, "from the future", "");
        odd.level = 42;
        let diagnostics = from_remote(vec![
            remote(remote::DiagnosticLevel::Unspecified, "legacy", ""),
            odd,
        ]);
        assert!(diagnostics
            .iter()
            .all(|d| d.severity == DiagnosticSeverity::Warning));
    }

    #[test]
    fn test_to_proto() {
        let wire = to_proto(vec![
            Diagnostic::info("fyi"),
            Diagnostic::error("bad")
                .with_detail("more")
                .with_attribute("url"),
        ]);
        assert_eq!(wire[0].severity, proto::diagnostic::Severity::Info as i32);
        assert_eq!(wire[1].severity, proto::diagnostic::Severity::Error as i32);
        assert_eq!(wire[1].detail, "more");
        assert_eq!(wire[1].attribute, "url");
        assert!(wire[0].attribute.is_empty());
    }

    #[test]
    fn test_from_error_adds_context() {
        let d = from_error(&ProviderError::VariantMismatch {
            expected: "okta".to_string(),
            found: "auth0".to_string(),
        });
        assert!(d.is_error());
        assert!(d.summary.contains("expected okta, found auth0"));
        assert!(d.detail.unwrap().contains("not a okta integration"));

        let d = from_error(&ProviderError::Unconfigured("no control plane client".to_string()));
        assert!(d.summary.contains("not configured"));
        assert!(d.detail.unwrap().contains("please report it"));

        let d = from_error(&ProviderError::NotFound("W-123".to_string()));
        assert!(d.detail.is_none());
    }
}
