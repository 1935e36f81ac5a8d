//! Resource kinds held by a configuration snapshot.

mod connection;
mod credential;
mod imports;
mod integration;
mod meta;
mod notifier;
mod provider;

pub use connection::{ConnectionConfig, ConnectionType, PipelingConnection};
pub use credential::{Credential, CredentialConfig, CredentialType};
pub use imports::{ConnectionImport, CredentialImport, ImportDirective};
pub use integration::{
    EmailIntegration, HttpIntegration, Integration, IntegrationConfig, IntegrationType,
    MsTeamsIntegration, SlackIntegration,
};
pub use meta::ResourceMeta;
pub use notifier::{Notifier, Notify};
pub use provider::{
    ApiKeyConfig, AwsConfig, AzureConfig, BasicConfig, GcpConfig, JiraConfig, TokenConfig,
};
