use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::{Mapping, Value};

use super::meta::ResourceMeta;

/// Integration kinds that notifiers can deliver through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntegrationType {
    Slack,
    Email,
    Http,
    MsTeams,
}

impl IntegrationType {
    pub const ALL: [IntegrationType; 4] = [
        IntegrationType::Slack,
        IntegrationType::Email,
        IntegrationType::Http,
        IntegrationType::MsTeams,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationType::Slack => "slack",
            IntegrationType::Email => "email",
            IntegrationType::Http => "http",
            IntegrationType::MsTeams => "msteams",
        }
    }
}

impl fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unsupported integration type '{}'", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlackIntegration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailIntegration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_tls: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Compares two optional recipient lists as sets. A missing list equals an empty one.
pub(crate) fn recipients_equal(a: &Option<Vec<String>>, b: &Option<Vec<String>>) -> bool {
    let a: HashSet<&str> = a.iter().flatten().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().flatten().map(String::as_str).collect();
    a == b
}

impl PartialEq for EmailIntegration {
    fn eq(&self, other: &Self) -> bool {
        self.smtp_host == other.smtp_host
            && self.smtp_port == other.smtp_port
            && self.smtp_tls == other.smtp_tls
            && self.smtp_username == other.smtp_username
            && self.smtp_password == other.smtp_password
            && self.from == other.from
            && self.subject == other.subject
            && recipients_equal(&self.to, &other.to)
            && recipients_equal(&self.cc, &other.cc)
            && recipients_equal(&self.bcc, &other.bcc)
    }
}

impl Eq for EmailIntegration {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpIntegration {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MsTeamsIntegration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// Delivery-channel specific integration attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IntegrationConfig {
    Slack(SlackIntegration),
    Email(EmailIntegration),
    Http(HttpIntegration),
    #[serde(rename = "msteams")]
    MsTeams(MsTeamsIntegration),
}

impl IntegrationConfig {
    pub fn decode(kind: IntegrationType, attributes: Mapping) -> Result<Self, serde_yaml::Error> {
        let value = Value::Mapping(attributes);
        Ok(match kind {
            IntegrationType::Slack => IntegrationConfig::Slack(serde_yaml::from_value(value)?),
            IntegrationType::Email => IntegrationConfig::Email(serde_yaml::from_value(value)?),
            IntegrationType::Http => IntegrationConfig::Http(serde_yaml::from_value(value)?),
            IntegrationType::MsTeams => IntegrationConfig::MsTeams(serde_yaml::from_value(value)?),
        })
    }

    pub fn integration_type(&self) -> IntegrationType {
        match self {
            IntegrationConfig::Slack(_) => IntegrationType::Slack,
            IntegrationConfig::Email(_) => IntegrationType::Email,
            IntegrationConfig::Http(_) => IntegrationType::Http,
            IntegrationConfig::MsTeams(_) => IntegrationType::MsTeams,
        }
    }
}

const META_KEYS: [&str; 6] = [
    "full_name",
    "short_name",
    "unqualified_name",
    "title",
    "description",
    "resource_type",
];

/// A named, typed delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Integration {
    #[serde(flatten)]
    pub meta: ResourceMeta,
    pub config: IntegrationConfig,
}

impl Integration {
    pub fn new(short_name: &str, config: IntegrationConfig) -> Self {
        Self {
            meta: ResourceMeta::typed(config.integration_type().as_str(), short_name),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta.full_name
    }

    pub fn integration_type(&self) -> IntegrationType {
        self.config.integration_type()
    }

    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        match &self.config {
            IntegrationConfig::Slack(slack) => {
                match (&slack.token, &slack.webhook_url) {
                    (Some(_), Some(_)) => {
                        problems.push("token and webhook_url are mutually exclusive".to_string())
                    }
                    (None, None) => {
                        problems.push("one of token or webhook_url is required".to_string())
                    }
                    _ => {}
                }
                if slack.signing_secret.is_some() && slack.token.is_none() {
                    problems.push("signing_secret can only be set with token".to_string());
                }
            }
            IntegrationConfig::Email(email) => {
                if email.smtp_host.is_none() {
                    problems.push("smtp_host is required".to_string());
                }
                if email.from.is_none() {
                    problems.push("from is required".to_string());
                }
            }
            IntegrationConfig::MsTeams(teams) if teams.webhook_url.is_none() => {
                problems.push("webhook_url is required".to_string());
            }
            _ => {}
        }
        problems
    }

    /// The value notifiers see when they reference this integration.
    pub fn to_value(&self) -> Result<JsonValue, serde_json::Error> {
        let mut object = match serde_json::to_value(&self.config)? {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        object.insert("full_name".into(), self.meta.full_name.clone().into());
        object.insert("short_name".into(), self.meta.short_name.clone().into());
        object.insert(
            "unqualified_name".into(),
            self.meta.unqualified_name.clone().into(),
        );
        if let Some(title) = &self.meta.title {
            object.insert("title".into(), title.clone().into());
        }
        if let Some(description) = &self.meta.description {
            object.insert("description".into(), description.clone().into());
        }
        object.insert("resource_type".into(), "integration".into());
        Ok(JsonValue::Object(object))
    }

    /// Rebuilds an integration from the value produced by [`Integration::to_value`].
    pub fn from_value(value: &JsonValue) -> Result<Self, serde_json::Error> {
        let object = value
            .as_object()
            .ok_or_else(|| serde_json::Error::custom("integration value must be an object"))?;

        let text = |key: &str| object.get(key).and_then(JsonValue::as_str).map(String::from);
        let full_name = text("full_name")
            .ok_or_else(|| serde_json::Error::custom("integration value is missing full_name"))?;
        let meta = ResourceMeta {
            short_name: text("short_name").unwrap_or_default(),
            unqualified_name: text("unqualified_name").unwrap_or_else(|| full_name.clone()),
            full_name,
            title: text("title"),
            description: text("description"),
            decl_range: None,
        };

        let attributes: Map<String, JsonValue> = object
            .iter()
            .filter(|(k, _)| !META_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let config = serde_json::from_value(JsonValue::Object(attributes))?;

        Ok(Self { meta, config })
    }
}
