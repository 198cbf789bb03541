//! Every resource kind the provider registers.

pub mod access_rule;
pub mod access_workflow;
pub mod integration;
pub mod selector;

use crate::resource::ResourceFactory;

pub use access_rule::AccessRuleResource;
pub use access_workflow::AccessWorkflowResource;
pub use integration::IntegrationResource;
pub use selector::{SelectorKind, SelectorResource};

/// Factories for all resource kinds, in registration order.
pub fn all() -> Vec<ResourceFactory> {
    vec![
        AccessWorkflowResource::factory,
        AccessRuleResource::factory,
        selector::auth0_organization_factory,
        selector::entra_group_factory,
        selector::okta_group_factory,
        selector::snowflake_database_factory,
        IntegrationResource::<integration::Auth0>::factory,
        IntegrationResource::<integration::Entra>::factory,
        IntegrationResource::<integration::Okta>::factory,
        IntegrationResource::<integration::Snowflake>::factory,
        IntegrationResource::<integration::PagerDuty>::factory,
        IntegrationResource::<integration::Webhook>::factory,
        IntegrationResource::<integration::S3LogDestination>::factory,
    ]
}
