use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use super::integration::{recipients_equal, Integration};
use super::meta::ResourceMeta;

/// One delivery target of a notifier.
#[derive(Debug, Clone, Serialize)]
pub struct Notify {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration: Option<Integration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Vec<String>>,
}

impl Notify {
    pub fn new(integration: Integration) -> Self {
        Self {
            integration: Some(integration),
            channel: None,
            subject: None,
            description: None,
            to: None,
            cc: None,
            bcc: None,
        }
    }

    pub fn to_value(&self) -> Result<JsonValue, serde_json::Error> {
        let mut object = Map::new();
        if let Some(integration) = &self.integration {
            object.insert("integration".into(), integration.to_value()?);
        }
        let optional = [
            ("channel", &self.channel),
            ("subject", &self.subject),
            ("description", &self.description),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                object.insert(key.into(), value.clone().into());
            }
        }
        let lists = [("to", &self.to), ("cc", &self.cc), ("bcc", &self.bcc)];
        for (key, value) in lists {
            if let Some(value) = value {
                object.insert(key.into(), serde_json::to_value(value)?);
            }
        }
        Ok(JsonValue::Object(object))
    }
}

// Recipient lists are compared as sets.
impl PartialEq for Notify {
    fn eq(&self, other: &Self) -> bool {
        self.integration == other.integration
            && self.channel == other.channel
            && self.subject == other.subject
            && self.description == other.description
            && recipients_equal(&self.to, &other.to)
            && recipients_equal(&self.cc, &other.cc)
            && recipients_equal(&self.bcc, &other.bcc)
    }
}

impl Eq for Notify {}

/// A named group of delivery targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notifier {
    #[serde(flatten)]
    pub meta: ResourceMeta,
    /// Delivery targets, in declaration order.
    pub notifies: Vec<Notify>,
}

impl Notifier {
    pub fn new(name: &str, notifies: Vec<Notify>) -> Self {
        Self {
            meta: ResourceMeta::named(name, name),
            notifies,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta.full_name
    }

    pub fn validate(&self) -> Vec<String> {
        if self.notifies.is_empty() {
            return vec!["at least one notify target is required".to_string()];
        }
        Vec::new()
    }

    /// The value pipelines see when they reference this notifier.
    pub fn to_value(&self) -> Result<JsonValue, serde_json::Error> {
        let notifies = self
            .notifies
            .iter()
            .map(Notify::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let mut object = Map::new();
        object.insert("notifies".into(), JsonValue::Array(notifies));
        if let Some(title) = &self.meta.title {
            object.insert("title".into(), title.clone().into());
        }
        if let Some(description) = &self.meta.description {
            object.insert("description".into(), description.clone().into());
        }
        object.insert("full_name".into(), self.meta.full_name.clone().into());
        object.insert("short_name".into(), self.meta.short_name.clone().into());
        object.insert("name".into(), self.meta.short_name.clone().into());
        object.insert(
            "unqualified_name".into(),
            self.meta.unqualified_name.clone().into(),
        );
        object.insert("notifier_name".into(), self.meta.short_name.clone().into());
        object.insert("resource_type".into(), "notifier".into());
        Ok(JsonValue::Object(object))
    }
}
