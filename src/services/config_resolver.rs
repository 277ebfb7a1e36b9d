//! Configuration parsing from host-provided attributes.
//!
//! The host page hands the widget a flat set of attributes (a script tag's
//! `data-*` values, or an equivalent JSON object). This module validates them
//! into a [`Config`].

use std::collections::{BTreeMap, HashMap};

use url::Url;

use crate::error::AppError;
use crate::models::{Config, IssueMappingStrategy};
use crate::services::urls::normalize_instance_url;

/// A single attribute value as provided by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Flag(bool),
}

impl AttrValue {
    /// Text content; empty strings count as absent.
    fn text(&self) -> Option<String> {
        match self {
            Self::Text(s) if !s.is_empty() => Some(s.clone()),
            Self::Text(_) => None,
            Self::Flag(b) => Some(b.to_string()),
        }
    }
}

/// Key-value attribute source the configuration is read from.
pub trait AttributeSource {
    fn attribute(&self, key: &str) -> Option<AttrValue>;
}

impl AttributeSource for HashMap<String, String> {
    fn attribute(&self, key: &str) -> Option<AttrValue> {
        self.get(key).cloned().map(AttrValue::Text)
    }
}

impl AttributeSource for BTreeMap<String, String> {
    fn attribute(&self, key: &str) -> Option<AttrValue> {
        self.get(key).cloned().map(AttrValue::Text)
    }
}

impl AttributeSource for serde_json::Value {
    fn attribute(&self, key: &str) -> Option<AttrValue> {
        match self.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(AttrValue::Flag(*b)),
            serde_json::Value::String(s) => Some(AttrValue::Text(s.clone())),
            other => Some(AttrValue::Text(other.to_string())),
        }
    }
}

/// Parse and validate the widget configuration.
///
/// # Errors
/// - `MissingConfig` if `clientId`, `redirectUri`, `projectName` or
///   `issueMappingStrategy` is absent or empty
/// - `InvalidConfig` if `instanceUrl` is rejected, the strategy is unknown or
///   `redirectUri` is not an absolute URL
pub fn resolve_config(source: &impl AttributeSource) -> Result<Config, AppError> {
    let dev_mode = match source.attribute("devMode") {
        Some(AttrValue::Flag(flag)) => flag,
        Some(AttrValue::Text(s)) => s == "true",
        None => false,
    };

    // `gitlabUrl` is the attribute name used by earlier widget releases.
    let raw_instance = text(source, "instanceUrl").or_else(|| text(source, "gitlabUrl"));
    let instance_url = normalize_instance_url(raw_instance.as_deref(), dev_mode)?;

    let client_id = required(source, "clientId")?;
    let redirect_uri = required(source, "redirectUri")?;
    let project_name = required(source, "projectName")?;
    let strategy = required(source, "issueMappingStrategy")?;

    Url::parse(&redirect_uri).map_err(|_| {
        AppError::invalid_config_field(
            format!("Invalid redirectUri: \"{}\" - must be an absolute URL", redirect_uri),
            "redirectUri",
        )
    })?;

    let issue_mapping_strategy = match strategy.as_str() {
        "url" => IssueMappingStrategy::ByUrl,
        "pageTitle" => IssueMappingStrategy::ByPageTitle,
        "issueId" => IssueMappingStrategy::ByIssueId(text(source, "issueId")),
        other => {
            return Err(AppError::invalid_config_field(
                format!(
                    "Unknown issueMappingStrategy \"{}\" (expected url, pageTitle or issueId)",
                    other
                ),
                "issueMappingStrategy",
            ))
        }
    };

    Ok(Config {
        instance_url,
        client_id,
        redirect_uri,
        project_name,
        issue_mapping_strategy,
        dev_mode,
        theme: text(source, "theme").unwrap_or_else(|| "light".to_string()),
        version: text(source, "beblobVersion"),
    })
}

fn text(source: &impl AttributeSource, key: &str) -> Option<String> {
    source.attribute(key).and_then(|v| v.text())
}

fn required(source: &impl AttributeSource, key: &str) -> Result<String, AppError> {
    text(source, key).ok_or_else(|| AppError::missing_config(key))
}
