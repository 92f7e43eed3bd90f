//! Authentication provider trait
//!
//! A [`ClientContext`](crate::sharepoint::ClientContext) asks its provider for
//! an `Authorization` header on every request and lets it refresh when the
//! current token is about to expire.

use crate::error::AuthError;
// async_trait required for dyn-compatibility with Box<dyn AuthProvider>
use async_trait::async_trait;

/// Authentication provider trait
///
/// Implementations hold whatever credential material they need and hand out
/// bearer tokens for SharePoint requests.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Get the authentication header for the next request
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError>;

    /// Check if the token must be (re)acquired before the next request
    fn needs_refresh(&self) -> bool;

    /// Acquire a fresh token
    async fn refresh(&mut self) -> Result<(), AuthError>;

    /// Get a description of the auth method (for logging)
    fn auth_type(&self) -> &'static str;
}

/// Bearer authentication header
#[derive(Debug, Clone)]
pub struct AuthHeader {
    token: String,
}

impl AuthHeader {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn header_name(&self) -> &'static str {
        "Authorization"
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Box type alias for auth providers
pub type BoxedAuthProvider = Box<dyn AuthProvider>;
