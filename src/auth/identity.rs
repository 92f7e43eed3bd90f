//! Microsoft identity platform client
//!
//! Performs the OAuth2 client-credentials grant against a tenant authority.
//! The [`IdentityClient`] trait is the seam between the authenticator and the
//! network, mirroring how MSAL reports failures: an unsuccessful request still
//! yields a [`TokenResponse`], with `error` and `error_description` set and no
//! `access_token`.

use crate::error::{AuthError, AuthResult};
use crate::util::SecretString;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Lifetime assumed when the provider omits `expires_in`
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Tokens are treated as expired this long before their actual expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How the application proves its identity in a token request
#[derive(Debug, Clone)]
pub enum ClientAuthentication {
    /// Shared client secret
    Secret(SecretString),
    /// Signed JWT client assertion
    Assertion(SecretString),
}

/// A client-credentials token request
#[derive(Debug, Clone)]
pub struct TokenRequest {
    /// Tenant authority, e.g. `https://login.microsoftonline.com/<tenant>`
    pub authority: String,
    pub client_id: String,
    pub credential: ClientAuthentication,
    pub scopes: Vec<String>,
}

impl TokenRequest {
    /// The v2.0 token endpoint under this request's authority
    pub fn token_endpoint(&self) -> String {
        token_endpoint(&self.authority)
    }

    fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", self.client_id.clone()),
            ("scope", self.scopes.join(" ")),
        ];

        match &self.credential {
            ClientAuthentication::Secret(secret) => {
                form.push(("client_secret", secret.expose_secret().to_string()));
            }
            ClientAuthentication::Assertion(assertion) => {
                form.push(("client_assertion_type", CLIENT_ASSERTION_TYPE.to_string()));
                form.push(("client_assertion", assertion.expose_secret().to_string()));
            }
        }

        form
    }
}

/// The v2.0 token endpoint for an authority
pub fn token_endpoint(authority: &str) -> String {
    format!("{}/oauth2/v2.0/token", authority.trim_end_matches('/'))
}

/// Token lifetime as sent by the provider.
///
/// The identity platform sends a number, ACS sends a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Lifetime {
    Seconds(u64),
    Text(String),
}

impl Lifetime {
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Lifetime::Seconds(secs) => Some(Duration::from_secs(*secs)),
            Lifetime::Text(text) => text.trim().parse().ok().map(Duration::from_secs),
        }
    }
}

/// Token endpoint response, successful or not
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<Lifetime>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Convert into an [`AccessToken`], failing when no token was issued.
    ///
    /// The failure carries the provider's `error_description`, or
    /// `Unknown error` when none was supplied.
    pub fn into_access_token(self) -> AuthResult<AccessToken> {
        match self.access_token {
            Some(token) if !token.is_empty() => {
                let lifetime = self
                    .expires_in
                    .as_ref()
                    .and_then(Lifetime::as_duration)
                    .unwrap_or(DEFAULT_TOKEN_LIFETIME);
                Ok(AccessToken::new(token, lifetime))
            }
            _ => Err(AuthError::TokenAcquisition {
                description: self
                    .error_description
                    .unwrap_or_else(|| "Unknown error".to_string()),
            }),
        }
    }
}

/// An issued bearer token and when it stops being usable
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: SecretString,
    expires_at: Instant,
}

impl AccessToken {
    /// A lifetime too large to represent falls back to the default lifetime.
    pub fn new(value: impl Into<String>, lifetime: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(lifetime)
            .unwrap_or(now + DEFAULT_TOKEN_LIFETIME);

        Self {
            value: SecretString::new(value),
            expires_at,
        }
    }

    pub fn secret(&self) -> &SecretString {
        &self.value
    }

    /// True once the token is within the expiry margin
    pub fn is_expiring(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

/// Identity provider seam
///
/// Implementations request tokens for confidential clients. Provider-side
/// rejections are reported in the returned [`TokenResponse`]; only transport
/// failures are returned as errors.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    async fn acquire_token_for_client(&self, request: &TokenRequest) -> AuthResult<TokenResponse>;
}

/// [`IdentityClient`] talking to the Microsoft identity platform over HTTP
#[derive(Debug, Clone)]
pub struct AzureIdentityClient {
    http: Client,
}

impl AzureIdentityClient {
    pub fn new() -> AuthResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("sharepoint-connect/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http })
    }
}

#[async_trait]
impl IdentityClient for AzureIdentityClient {
    #[instrument(
        skip(self, request),
        fields(authority = %request.authority, client_id = %request.client_id)
    )]
    async fn acquire_token_for_client(&self, request: &TokenRequest) -> AuthResult<TokenResponse> {
        let response = self
            .http
            .post(request.token_endpoint())
            .form(&request.form())
            .send()
            .await?;

        // Error bodies carry AADSTS codes in error_description, so parse before checking status.
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "Token endpoint responded");

        serde_json::from_str(&body).map_err(|e| {
            AuthError::InvalidResponse(format!(
                "HTTP {} from token endpoint, body is not a token response: {}",
                status.as_u16(),
                e
            ))
        })
    }
}
