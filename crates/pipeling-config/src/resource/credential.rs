use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::connection::{ConnectionConfig, PipelingConnection};
use super::meta::ResourceMeta;
use super::provider::{
    ApiKeyConfig, AwsConfig, AzureConfig, BasicConfig, GcpConfig, JiraConfig, TokenConfig,
};
use crate::error::ConversionError;

/// Credential kinds known to the configuration system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CredentialType {
    Aws,
    Azure,
    Gcp,
    Github,
    Gitlab,
    Slack,
    Jira,
    Openai,
    Abuseipdb,
    Basic,
}

impl CredentialType {
    pub const ALL: [CredentialType; 10] = [
        CredentialType::Aws,
        CredentialType::Azure,
        CredentialType::Gcp,
        CredentialType::Github,
        CredentialType::Gitlab,
        CredentialType::Slack,
        CredentialType::Jira,
        CredentialType::Openai,
        CredentialType::Abuseipdb,
        CredentialType::Basic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::Aws => "aws",
            CredentialType::Azure => "azure",
            CredentialType::Gcp => "gcp",
            CredentialType::Github => "github",
            CredentialType::Gitlab => "gitlab",
            CredentialType::Slack => "slack",
            CredentialType::Jira => "jira",
            CredentialType::Openai => "openai",
            CredentialType::Abuseipdb => "abuseipdb",
            CredentialType::Basic => "basic",
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unsupported credential type '{}'", s))
    }
}

/// Provider-specific credential attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CredentialConfig {
    Aws(AwsConfig),
    Azure(AzureConfig),
    Gcp(GcpConfig),
    Github(TokenConfig),
    Gitlab(TokenConfig),
    Slack(TokenConfig),
    Jira(JiraConfig),
    Openai(ApiKeyConfig),
    Abuseipdb(ApiKeyConfig),
    Basic(BasicConfig),
}

impl CredentialConfig {
    /// An empty attribute set for `kind`.
    pub fn empty(kind: CredentialType) -> Self {
        match kind {
            CredentialType::Aws => CredentialConfig::Aws(AwsConfig::default()),
            CredentialType::Azure => CredentialConfig::Azure(AzureConfig::default()),
            CredentialType::Gcp => CredentialConfig::Gcp(GcpConfig::default()),
            CredentialType::Github => CredentialConfig::Github(TokenConfig::default()),
            CredentialType::Gitlab => CredentialConfig::Gitlab(TokenConfig::default()),
            CredentialType::Slack => CredentialConfig::Slack(TokenConfig::default()),
            CredentialType::Jira => CredentialConfig::Jira(JiraConfig::default()),
            CredentialType::Openai => CredentialConfig::Openai(ApiKeyConfig::default()),
            CredentialType::Abuseipdb => CredentialConfig::Abuseipdb(ApiKeyConfig::default()),
            CredentialType::Basic => CredentialConfig::Basic(BasicConfig::default()),
        }
    }

    /// Decodes the attributes of a `kind` credential. Unknown attributes are rejected.
    pub fn decode(kind: CredentialType, attributes: Mapping) -> Result<Self, serde_yaml::Error> {
        let value = Value::Mapping(attributes);
        Ok(match kind {
            CredentialType::Aws => CredentialConfig::Aws(serde_yaml::from_value(value)?),
            CredentialType::Azure => CredentialConfig::Azure(serde_yaml::from_value(value)?),
            CredentialType::Gcp => CredentialConfig::Gcp(serde_yaml::from_value(value)?),
            CredentialType::Github => CredentialConfig::Github(serde_yaml::from_value(value)?),
            CredentialType::Gitlab => CredentialConfig::Gitlab(serde_yaml::from_value(value)?),
            CredentialType::Slack => CredentialConfig::Slack(serde_yaml::from_value(value)?),
            CredentialType::Jira => CredentialConfig::Jira(serde_yaml::from_value(value)?),
            CredentialType::Openai => CredentialConfig::Openai(serde_yaml::from_value(value)?),
            CredentialType::Abuseipdb => {
                CredentialConfig::Abuseipdb(serde_yaml::from_value(value)?)
            }
            CredentialType::Basic => CredentialConfig::Basic(serde_yaml::from_value(value)?),
        })
    }

    pub fn credential_type(&self) -> CredentialType {
        match self {
            CredentialConfig::Aws(_) => CredentialType::Aws,
            CredentialConfig::Azure(_) => CredentialType::Azure,
            CredentialConfig::Gcp(_) => CredentialType::Gcp,
            CredentialConfig::Github(_) => CredentialType::Github,
            CredentialConfig::Gitlab(_) => CredentialType::Gitlab,
            CredentialConfig::Slack(_) => CredentialType::Slack,
            CredentialConfig::Jira(_) => CredentialType::Jira,
            CredentialConfig::Openai(_) => CredentialType::Openai,
            CredentialConfig::Abuseipdb(_) => CredentialType::Abuseipdb,
            CredentialConfig::Basic(_) => CredentialType::Basic,
        }
    }

    /// Stamps names onto the attributes, producing a finished credential.
    pub fn into_credential(self, short_name: &str) -> Credential {
        Credential::new(short_name, self)
    }
}

/// A named secret bundle of a provider kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credential {
    #[serde(flatten)]
    pub meta: ResourceMeta,
    /// Provider-specific attributes.
    pub config: CredentialConfig,
}

impl Credential {
    pub fn new(short_name: &str, config: CredentialConfig) -> Self {
        Self {
            meta: ResourceMeta::typed(config.credential_type().as_str(), short_name),
            config,
        }
    }

    /// Full name, `<type>.<short name>`.
    pub fn name(&self) -> &str {
        &self.meta.full_name
    }

    pub fn short_name(&self) -> &str {
        &self.meta.short_name
    }

    pub fn credential_type(&self) -> CredentialType {
        self.config.credential_type()
    }

    /// Returns a description of every invalid attribute combination.
    pub fn validate(&self) -> Vec<String> {
        match &self.config {
            CredentialConfig::Aws(c) => c.problems(),
            CredentialConfig::Azure(c) => c.problems(),
            CredentialConfig::Jira(c) => c.problems(),
            CredentialConfig::Basic(c) if c.username.is_none() => {
                vec!["username is required".to_string()]
            }
            _ => Vec::new(),
        }
    }

    /// Builds the connection carrying the same attributes under the same name.
    ///
    /// Kinds without a connection counterpart fail with
    /// [`ConversionError::InvalidConnectionType`].
    pub fn to_connection(&self) -> Result<PipelingConnection, ConversionError> {
        let config = match &self.config {
            CredentialConfig::Aws(c) => ConnectionConfig::Aws(c.clone()),
            CredentialConfig::Azure(c) => ConnectionConfig::Azure(c.clone()),
            CredentialConfig::Gcp(c) => ConnectionConfig::Gcp(c.clone()),
            CredentialConfig::Github(c) => ConnectionConfig::Github(c.clone()),
            CredentialConfig::Gitlab(c) => ConnectionConfig::Gitlab(c.clone()),
            CredentialConfig::Slack(c) => ConnectionConfig::Slack(c.clone()),
            CredentialConfig::Jira(c) => ConnectionConfig::Jira(c.clone()),
            CredentialConfig::Openai(c) => ConnectionConfig::Openai(c.clone()),
            CredentialConfig::Abuseipdb(c) => ConnectionConfig::Abuseipdb(c.clone()),
            CredentialConfig::Basic(_) => {
                return Err(ConversionError::InvalidConnectionType(
                    CredentialType::Basic.to_string(),
                ))
            }
        };

        if self.meta.short_name.contains('.') {
            return Err(ConversionError::InvalidName {
                name: self.meta.short_name.clone(),
                reason: "connection names cannot contain '.'".to_string(),
            });
        }

        Ok(PipelingConnection {
            meta: self.meta.clone(),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_credential_type_parse() {
        for kind in CredentialType::ALL {
            assert_eq!(kind.as_str().parse::<CredentialType>().unwrap(), kind);
        }
        assert!("steampipe".parse::<CredentialType>().is_err());
    }

    #[test]
    fn test_decode_per_kind() {
        let config =
            CredentialConfig::decode(CredentialType::Aws, mapping("profile: prod1")).unwrap();
        assert_eq!(
            config,
            CredentialConfig::Aws(AwsConfig {
                profile: Some("prod1".into()),
                ..Default::default()
            })
        );

        let config =
            CredentialConfig::decode(CredentialType::Github, mapping("token: ghp_x")).unwrap();
        assert_eq!(config.credential_type(), CredentialType::Github);

        assert!(CredentialConfig::decode(CredentialType::Github, mapping("api_key: x")).is_err());
    }

    #[test]
    fn test_empty_matches_kind() {
        for kind in CredentialType::ALL {
            assert_eq!(CredentialConfig::empty(kind).credential_type(), kind);
        }
    }

    #[test]
    fn test_names() {
        let cred = CredentialConfig::empty(CredentialType::Aws).into_credential("prod");
        assert_eq!(cred.name(), "aws.prod");
        assert_eq!(cred.short_name(), "prod");
    }

    #[test]
    fn test_validate() {
        let basic = Credential::new("b", CredentialConfig::Basic(BasicConfig::default()));
        assert_eq!(basic.validate(), vec!["username is required".to_string()]);

        let aws = Credential::new(
            "a",
            CredentialConfig::Aws(AwsConfig {
                access_key: Some("AKIA".into()),
                secret_key: Some("secret".into()),
                ..Default::default()
            }),
        );
        assert!(aws.validate().is_empty());
    }

    #[test]
    fn test_to_connection_copies_attributes() {
        let mut cred = Credential::new(
            "prod",
            CredentialConfig::Aws(AwsConfig {
                profile: Some("prod1".into()),
                ..Default::default()
            }),
        );
        cred.meta.description = Some("production".to_string());

        let conn = cred.to_connection().unwrap();
        assert_eq!(conn.name(), "aws.prod");
        assert_eq!(conn.meta.description.as_deref(), Some("production"));
        assert_eq!(
            conn.config,
            ConnectionConfig::Aws(AwsConfig {
                profile: Some("prod1".into()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_to_connection_rejects_basic() {
        let cred = Credential::new(
            "b",
            CredentialConfig::Basic(BasicConfig {
                username: Some("u".into()),
                password: None,
            }),
        );
        assert_eq!(
            cred.to_connection().unwrap_err(),
            ConversionError::InvalidConnectionType("basic".to_string())
        );
    }

    #[test]
    fn test_to_connection_rejects_dotted_names() {
        let cred = Credential::new("a.b", CredentialConfig::empty(CredentialType::Slack));
        assert!(matches!(
            cred.to_connection(),
            Err(ConversionError::InvalidName { .. })
        ));
    }
}
