//! Protocol buffer types.
//!
//! Files in this directory are produced by `tonic-prost-build` (see
//! `build.rs`) and committed so that building the crate does not require
//! `protoc`. The module tree mirrors the proto packages so that cross-package
//! references such as `super::super::diagnostic::v1alpha1::Diagnostic`
//! resolve.

pub mod hemmer {
    pub mod provider {
        pub mod v1 {
            include!("hemmer.provider.v1.rs");
        }
    }
}

pub mod commonfate {
    pub mod control {
        pub mod diagnostic {
            pub mod v1alpha1 {
                include!("commonfate.control.diagnostic.v1alpha1.rs");
            }
        }
        pub mod config {
            pub mod v1alpha1 {
                include!("commonfate.control.config.v1alpha1.rs");
            }
        }
        pub mod integration {
            pub mod v1alpha1 {
                include!("commonfate.control.integration.v1alpha1.rs");
            }
        }
    }
}

/// Host-facing plugin protocol (`hemmer.provider.v1`).
pub use self::hemmer::provider::v1 as provider;

/// Common Fate access workflows, selectors and access rules.
pub use self::commonfate::control::config::v1alpha1 as config;

/// Common Fate control-plane diagnostics.
pub use self::commonfate::control::diagnostic::v1alpha1 as diagnostic;

/// Common Fate integrations.
pub use self::commonfate::control::integration::v1alpha1 as integration;
