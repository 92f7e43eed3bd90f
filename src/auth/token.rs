//! Client-credential token provider
//!
//! Backs both the token flow and the certificate flow: the first token is
//! acquired eagerly so bad credentials fail at context construction, later
//! tokens are re-acquired in memory when the current one is about to expire.

use crate::auth::certificate::CertificateCredential;
use crate::auth::identity::{
    AccessToken, ClientAuthentication, IdentityClient, TokenRequest, token_endpoint,
};
use crate::auth::provider::{AuthHeader, AuthProvider};
use crate::error::{AuthError, AuthResult};
use crate::util::SecretString;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Application credential presented to the identity platform
#[derive(Debug, Clone)]
pub enum AppCredential {
    Secret(SecretString),
    Certificate(CertificateCredential),
}

/// Everything needed to repeat a client-credentials grant
#[derive(Debug, Clone)]
pub struct ClientCredentialGrant {
    pub authority: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub credential: AppCredential,
}

impl ClientCredentialGrant {
    /// Build the token request, signing a fresh assertion for certificates
    fn token_request(&self) -> AuthResult<TokenRequest> {
        let credential = match &self.credential {
            AppCredential::Secret(secret) => ClientAuthentication::Secret(secret.clone()),
            AppCredential::Certificate(cert) => {
                let audience = token_endpoint(&self.authority);
                ClientAuthentication::Assertion(SecretString::new(
                    cert.client_assertion(&audience, &self.client_id)?,
                ))
            }
        };

        Ok(TokenRequest {
            authority: self.authority.clone(),
            client_id: self.client_id.clone(),
            credential,
            scopes: self.scopes.clone(),
        })
    }
}

/// Bearer token provider for the client-credentials grant
pub struct ClientCredentialProvider {
    identity: Arc<dyn IdentityClient>,
    grant: ClientCredentialGrant,
    token: AccessToken,
}

impl ClientCredentialProvider {
    /// Acquire the first token and wrap it in a provider
    pub async fn acquire(
        identity: Arc<dyn IdentityClient>,
        grant: ClientCredentialGrant,
    ) -> AuthResult<Self> {
        let token = request_token(identity.as_ref(), &grant).await?;
        Ok(Self {
            identity,
            grant,
            token,
        })
    }
}

async fn request_token(
    identity: &dyn IdentityClient,
    grant: &ClientCredentialGrant,
) -> AuthResult<AccessToken> {
    let request = grant.token_request()?;
    let response = identity.acquire_token_for_client(&request).await?;
    response.into_access_token()
}

#[async_trait]
impl AuthProvider for ClientCredentialProvider {
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError> {
        Ok(AuthHeader::bearer(self.token.secret().expose_secret()))
    }

    fn needs_refresh(&self) -> bool {
        self.token.is_expiring()
    }

    async fn refresh(&mut self) -> Result<(), AuthError> {
        debug!(client_id = %self.grant.client_id, "Re-acquiring client-credential token");
        self.token = request_token(self.identity.as_ref(), &self.grant).await?;
        Ok(())
    }

    fn auth_type(&self) -> &'static str {
        match self.grant.credential {
            AppCredential::Secret(_) => "Client secret (identity platform)",
            AppCredential::Certificate(_) => "Client certificate (identity platform)",
        }
    }
}
