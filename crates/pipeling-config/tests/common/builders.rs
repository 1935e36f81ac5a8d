//! YAML builders for configuration blocks.
//!
//! Each builder renders a single document in the `pipeling.io/v1`
//! envelope; join several with `---` to build multi-document files.

#![allow(dead_code)]

use pipeling_config::parse::API_VERSION;

/// Builder for a single configuration document.
pub struct BlockBuilder {
    kind: String,
    name: String,
    type_label: Option<String>,
    description: Option<String>,
    spec: Vec<String>,
}

impl BlockBuilder {
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            type_label: None,
            description: None,
            spec: Vec::new(),
        }
    }

    pub fn type_label(mut self, type_label: &str) -> Self {
        self.type_label = Some(type_label.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Add a raw spec line, indented relative to `spec:`.
    pub fn line(mut self, line: &str) -> Self {
        self.spec.push(line.to_string());
        self
    }

    /// Add a `key: value` spec attribute.
    pub fn attr(self, key: &str, value: &str) -> Self {
        self.line(&format!("{}: {}", key, value))
    }

    pub fn build(&self) -> String {
        let mut out = format!(
            "apiVersion: {}\nkind: {}\nmetadata:\n  name: {}\n",
            API_VERSION, self.kind, self.name
        );
        if let Some(t) = &self.type_label {
            out.push_str(&format!("  type: {}\n", t));
        }
        if let Some(d) = &self.description {
            out.push_str(&format!("  description: {}\n", d));
        }
        if !self.spec.is_empty() {
            out.push_str("spec:\n");
            for line in &self.spec {
                out.push_str(&format!("  {}\n", line));
            }
        }
        out
    }
}

pub fn credential(kind: &str, name: &str) -> BlockBuilder {
    BlockBuilder::new("Credential", name).type_label(kind)
}

pub fn aws_credential(name: &str, profile: &str) -> String {
    credential("aws", name).attr("profile", profile).build()
}

pub fn integration(kind: &str, name: &str) -> BlockBuilder {
    BlockBuilder::new("Integration", name).type_label(kind)
}

pub fn slack_integration(name: &str, webhook_url: &str) -> String {
    integration("slack", name)
        .attr("webhook_url", webhook_url)
        .build()
}

/// A notifier with one notify per `(integration reference, channel)`.
pub fn notifier(name: &str, notifies: &[(&str, &str)]) -> String {
    let mut builder = BlockBuilder::new("Notifier", name).line("notifies:");
    for (integration, channel) in notifies {
        builder = builder
            .line(&format!("  - integration: \"${{{}}}\"", integration))
            .line(&format!("    channel: \"{}\"", channel));
    }
    builder.build()
}

pub fn connection(kind: &str, name: &str) -> BlockBuilder {
    BlockBuilder::new("Connection", name).type_label(kind)
}

/// An import directive of `kind` (`CredentialImport` or `ConnectionImport`).
pub fn import(kind: &str, name: &str, source: &str, patterns: &[&str], prefix: Option<&str>) -> String {
    let mut builder = BlockBuilder::new(kind, name).attr("source", &format!("\"{}\"", source));
    if !patterns.is_empty() {
        builder = builder.line("connections:");
        for pattern in patterns {
            builder = builder.line(&format!("  - \"{}\"", pattern));
        }
    }
    if let Some(prefix) = prefix {
        builder = builder.attr("prefix", &format!("\"{}\"", prefix));
    }
    builder.build()
}

pub fn credential_import(name: &str, source: &str, patterns: &[&str], prefix: Option<&str>) -> String {
    import("CredentialImport", name, source, patterns, prefix)
}

pub fn connection_import(name: &str, source: &str, patterns: &[&str], prefix: Option<&str>) -> String {
    import("ConnectionImport", name, source, patterns, prefix)
}

/// A connection as written in an import source: a plugin plus attributes.
pub fn source_connection(name: &str, plugin: &str, attrs: &[(&str, &str)]) -> String {
    let mut builder = BlockBuilder::new("Connection", name).attr("plugin", &format!("\"{}\"", plugin));
    for (key, value) in attrs {
        builder = builder.attr(key, &format!("\"{}\"", value));
    }
    builder.build()
}
