//! Error types for sharepoint-connect
//!
//! Configuration problems are always detectable before any network call and
//! are kept apart from identity-provider and SharePoint failures so callers
//! can tell them apart.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("SharePoint error: {0}")]
    SharePoint(#[from] SharePointError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Missing required environment variables: {}", .names.join(", "))]
    MissingVariables { names: Vec<String> },

    #[error("Invalid auth method: {given}. Must be one of: {}", .valid.join(", "))]
    InvalidAuthMethod { given: String, valid: Vec<String> },

    #[error("Certificate path and thumbprint are required for cert-based auth")]
    CertificateNotConfigured,

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Authentication errors raised while talking to an identity provider
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to acquire token: {description}")]
    TokenAcquisition { description: String },

    #[error("Invalid certificate: {0}")]
    Certificate(String),

    #[error("Failed to discover tenant realm: {0}")]
    RealmDiscovery(String),

    #[error("HTTP request to identity provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response from identity provider: {0}")]
    InvalidResponse(String),
}

/// SharePoint REST errors
#[derive(Error, Debug)]
pub enum SharePointError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SharePoint API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: the credential was rejected by the site")]
    Unauthorized,

    #[error("Forbidden: the app lacks permission for {resource}")]
    Forbidden { resource: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid response from SharePoint: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
}

impl SharePointError {
    /// Create an appropriate error from an HTTP status code and response body
    pub fn from_response(status: u16, resource: &str, body: &str) -> Self {
        match status {
            401 => SharePointError::Unauthorized,
            403 => SharePointError::Forbidden {
                resource: resource.to_string(),
            },
            404 => SharePointError::NotFound {
                resource: resource.to_string(),
            },
            _ => SharePointError::Api {
                status,
                message: if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for authentication operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Result type alias for SharePoint REST operations
pub type SharePointResult<T> = std::result::Result<T, SharePointError>;
