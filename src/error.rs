//! Widget error types.
//!
//! These errors are serializable so a host embedding the widget can forward
//! them to its own UI layer as structured JSON.

use serde::Serialize;
use thiserror::Error;

/// Errors produced by the widget engine.
///
/// All variants serialize to a structured JSON object for host consumption.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Configuration value present but malformed (bad instance URL, scheme policy, unknown strategy).
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// A required configuration value is absent.
    #[error("Missing required BeBlob configuration: {field}")]
    MissingConfig { field: String },

    /// Access token expired, revoked or absent - requires re-authentication.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Requested resource not found.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Network request failed before a response arrived.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The server already holds the record we tried to create.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// GitLab API request failed with an unexpected status.
    #[error("GitLab API error: {message}")]
    GitLabApi {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// Token persistence failed.
    #[error("Credential storage error: {message}")]
    CredentialStorage { message: String },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid configuration error naming the offending attribute.
    pub fn invalid_config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a missing configuration error.
    pub fn missing_config(field: impl Into<String>) -> Self {
        Self::MissingConfig {
            field: field.into(),
        }
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Check if this error means the stored token is no longer usable.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Check if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Create a GitLab API error.
    pub fn gitlab_api(message: impl Into<String>) -> Self {
        Self::GitLabApi {
            message: message.into(),
            status_code: None,
            endpoint: None,
        }
    }

    /// Create a GitLab API error with status code and endpoint.
    pub fn gitlab_api_full(
        message: impl Into<String>,
        status_code: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self::GitLabApi {
            message: message.into(),
            status_code: Some(status_code),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create a credential storage error.
    pub fn credential_storage(message: impl Into<String>) -> Self {
        Self::CredentialStorage {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network("Failed to connect to server")
        } else if err.is_status() {
            Self::gitlab_api(format!("HTTP error: {}", err))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::invalid_config_field("must not contain a path", "instanceUrl");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"InvalidConfig\""));
        assert!(json.contains("\"field\":\"instanceUrl\""));
    }

    #[test]
    fn test_gitlab_api_error_full() {
        let err = AppError::gitlab_api_full("Access denied", 403, "/projects/7/issues");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"status_code\":403"));
        assert!(json.contains("/projects/7/issues"));
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let err = AppError::not_found("project");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn test_predicates() {
        assert!(AppError::unauthorized("expired").is_unauthorized());
        assert!(AppError::conflict("taken").is_conflict());
        assert!(AppError::not_found_with_id("issue", "4").is_not_found());
        assert!(!AppError::network("down").is_unauthorized());
    }

    #[test]
    fn test_display_impl() {
        let err = AppError::missing_config("clientId");
        assert_eq!(
            format!("{}", err),
            "Missing required BeBlob configuration: clientId"
        );
    }
}
