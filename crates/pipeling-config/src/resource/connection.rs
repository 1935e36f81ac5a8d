use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::meta::ResourceMeta;
use super::provider::{ApiKeyConfig, AwsConfig, AzureConfig, GcpConfig, JiraConfig, TokenConfig};

/// Connection kinds known to the configuration system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectionType {
    Aws,
    Azure,
    Gcp,
    Github,
    Gitlab,
    Slack,
    Jira,
    Openai,
    Abuseipdb,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 9] = [
        ConnectionType::Aws,
        ConnectionType::Azure,
        ConnectionType::Gcp,
        ConnectionType::Github,
        ConnectionType::Gitlab,
        ConnectionType::Slack,
        ConnectionType::Jira,
        ConnectionType::Openai,
        ConnectionType::Abuseipdb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Aws => "aws",
            ConnectionType::Azure => "azure",
            ConnectionType::Gcp => "gcp",
            ConnectionType::Github => "github",
            ConnectionType::Gitlab => "gitlab",
            ConnectionType::Slack => "slack",
            ConnectionType::Jira => "jira",
            ConnectionType::Openai => "openai",
            ConnectionType::Abuseipdb => "abuseipdb",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unsupported connection type '{}'", s))
    }
}

/// Provider-specific connection attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionConfig {
    Aws(AwsConfig),
    Azure(AzureConfig),
    Gcp(GcpConfig),
    Github(TokenConfig),
    Gitlab(TokenConfig),
    Slack(TokenConfig),
    Jira(JiraConfig),
    Openai(ApiKeyConfig),
    Abuseipdb(ApiKeyConfig),
}

impl ConnectionConfig {
    pub fn empty(kind: ConnectionType) -> Self {
        match kind {
            ConnectionType::Aws => ConnectionConfig::Aws(AwsConfig::default()),
            ConnectionType::Azure => ConnectionConfig::Azure(AzureConfig::default()),
            ConnectionType::Gcp => ConnectionConfig::Gcp(GcpConfig::default()),
            ConnectionType::Github => ConnectionConfig::Github(TokenConfig::default()),
            ConnectionType::Gitlab => ConnectionConfig::Gitlab(TokenConfig::default()),
            ConnectionType::Slack => ConnectionConfig::Slack(TokenConfig::default()),
            ConnectionType::Jira => ConnectionConfig::Jira(JiraConfig::default()),
            ConnectionType::Openai => ConnectionConfig::Openai(ApiKeyConfig::default()),
            ConnectionType::Abuseipdb => ConnectionConfig::Abuseipdb(ApiKeyConfig::default()),
        }
    }

    /// Decodes the attributes of a `kind` connection. Unknown attributes are rejected.
    pub fn decode(kind: ConnectionType, attributes: Mapping) -> Result<Self, serde_yaml::Error> {
        let value = Value::Mapping(attributes);
        Ok(match kind {
            ConnectionType::Aws => ConnectionConfig::Aws(serde_yaml::from_value(value)?),
            ConnectionType::Azure => ConnectionConfig::Azure(serde_yaml::from_value(value)?),
            ConnectionType::Gcp => ConnectionConfig::Gcp(serde_yaml::from_value(value)?),
            ConnectionType::Github => ConnectionConfig::Github(serde_yaml::from_value(value)?),
            ConnectionType::Gitlab => ConnectionConfig::Gitlab(serde_yaml::from_value(value)?),
            ConnectionType::Slack => ConnectionConfig::Slack(serde_yaml::from_value(value)?),
            ConnectionType::Jira => ConnectionConfig::Jira(serde_yaml::from_value(value)?),
            ConnectionType::Openai => ConnectionConfig::Openai(serde_yaml::from_value(value)?),
            ConnectionType::Abuseipdb => {
                ConnectionConfig::Abuseipdb(serde_yaml::from_value(value)?)
            }
        })
    }

    pub fn connection_type(&self) -> ConnectionType {
        match self {
            ConnectionConfig::Aws(_) => ConnectionType::Aws,
            ConnectionConfig::Azure(_) => ConnectionType::Azure,
            ConnectionConfig::Gcp(_) => ConnectionType::Gcp,
            ConnectionConfig::Github(_) => ConnectionType::Github,
            ConnectionConfig::Gitlab(_) => ConnectionType::Gitlab,
            ConnectionConfig::Slack(_) => ConnectionType::Slack,
            ConnectionConfig::Jira(_) => ConnectionType::Jira,
            ConnectionConfig::Openai(_) => ConnectionType::Openai,
            ConnectionConfig::Abuseipdb(_) => ConnectionType::Abuseipdb,
        }
    }
}

/// A named, typed endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelingConnection {
    #[serde(flatten)]
    pub meta: ResourceMeta,
    /// Provider-specific attributes.
    pub config: ConnectionConfig,
}

impl PipelingConnection {
    pub fn new(short_name: &str, config: ConnectionConfig) -> Self {
        Self {
            meta: ResourceMeta::typed(config.connection_type().as_str(), short_name),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta.full_name
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.config.connection_type()
    }

    pub fn validate(&self) -> Vec<String> {
        match &self.config {
            ConnectionConfig::Aws(c) => c.problems(),
            ConnectionConfig::Azure(c) => c.problems(),
            ConnectionConfig::Jira(c) => c.problems(),
            _ => Vec::new(),
        }
    }
}
