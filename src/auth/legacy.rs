//! Legacy ACS app-only authentication
//!
//! SharePoint add-in style auth through Azure Access Control Service. It is
//! deprecated and disabled on newer tenants, but still works where an app was
//! registered through `appregnew.aspx`.
//!
//! Nothing is sent over the network until the first request: the provider
//! then discovers the tenant realm from the site's `WWW-Authenticate`
//! challenge and exchanges the client id and secret for a token.

use crate::auth::identity::{AccessToken, TokenResponse};
use crate::auth::provider::{AuthHeader, AuthProvider};
use crate::error::{AuthError, AuthResult};
use crate::util::SecretString;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header::WWW_AUTHENTICATE};
use std::time::Duration;
use tracing::{debug, instrument};

/// Azure ACS token issuer
pub const ACS_HOST: &str = "https://accounts.accesscontrol.windows.net";

/// Well-known principal id of SharePoint Online
pub const SHAREPOINT_PRINCIPAL_ID: &str = "00000003-0000-0ff1-ce00-000000000000";

const REALM_DISCOVERY_PATH: &str = "/_vti_bin/client.svc";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client id and secret pair registered for ACS app-only access
#[derive(Debug, Clone)]
pub struct ClientCredential {
    client_id: String,
    client_secret: SecretString,
    acs_host: String,
}

impl ClientCredential {
    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            acs_host: ACS_HOST.to_string(),
        }
    }

    /// Use a different ACS host (sovereign clouds, tests)
    pub fn with_acs_host(mut self, host: impl Into<String>) -> Self {
        self.acs_host = host.into();
        self
    }
}

/// Token provider for the ACS flow
pub struct AcsTokenProvider {
    http: Client,
    site_url: String,
    credential: ClientCredential,
    token: Option<AccessToken>,
}

impl AcsTokenProvider {
    pub fn new(http: Client, site_url: impl Into<String>, credential: ClientCredential) -> Self {
        Self {
            http,
            site_url: site_url.into(),
            credential,
            token: None,
        }
    }

    /// Ask the site which realm (tenant id) issues its tokens
    #[instrument(skip(self), fields(site_url = %self.site_url))]
    async fn discover_realm(&self) -> AuthResult<String> {
        let response = self
            .http
            .get(format!("{}{}", self.site_url, REALM_DISCOVERY_PATH))
            .header("Authorization", "Bearer")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Err(AuthError::RealmDiscovery(format!(
                "expected HTTP 401 challenge, got HTTP {}",
                response.status().as_u16()
            )));
        }

        response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_realm)
            .ok_or_else(|| {
                AuthError::RealmDiscovery("no realm in WWW-Authenticate challenge".to_string())
            })
    }

    #[instrument(skip(self), fields(client_id = %self.credential.client_id))]
    async fn request_token(&self, realm: &str) -> AuthResult<AccessToken> {
        let host = Url::parse(&self.site_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .ok_or_else(|| {
                AuthError::RealmDiscovery(format!("site URL has no host: {}", self.site_url))
            })?;

        let form = [
            ("grant_type", "client_credentials".to_string()),
            (
                "client_id",
                format!("{}@{}", self.credential.client_id, realm),
            ),
            (
                "client_secret",
                self.credential.client_secret.expose_secret().to_string(),
            ),
            (
                "resource",
                format!("{}/{}@{}", SHAREPOINT_PRINCIPAL_ID, host, realm),
            ),
        ];

        let response = self
            .http
            .post(format!(
                "{}/{}/tokens/OAuth/2",
                self.credential.acs_host.trim_end_matches('/'),
                realm
            ))
            .form(&form)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "ACS token endpoint responded");

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::InvalidResponse(format!(
                "HTTP {} from ACS, body is not a token response: {}",
                status.as_u16(),
                e
            ))
        })?;

        token.into_access_token()
    }
}

/// Extract `realm="..."` from a `Bearer` challenge
pub fn parse_realm(challenge: &str) -> Option<String> {
    let start = challenge.find("realm=\"")? + "realm=\"".len();
    let rest = &challenge[start..];
    let end = rest.find('"')?;
    let realm = &rest[..end];
    (!realm.is_empty()).then(|| realm.to_string())
}

#[async_trait]
impl AuthProvider for AcsTokenProvider {
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError> {
        self.token
            .as_ref()
            .map(|token| AuthHeader::bearer(token.secret().expose_secret()))
            .ok_or_else(|| AuthError::TokenAcquisition {
                description: "no ACS token has been acquired yet".to_string(),
            })
    }

    fn needs_refresh(&self) -> bool {
        self.token.as_ref().is_none_or(AccessToken::is_expiring)
    }

    async fn refresh(&mut self) -> Result<(), AuthError> {
        let realm = self.discover_realm().await?;
        debug!(realm = %realm, "Discovered ACS realm");
        self.token = Some(self.request_token(&realm).await?);
        Ok(())
    }

    fn auth_type(&self) -> &'static str {
        "Client credentials (legacy ACS)"
    }
}
