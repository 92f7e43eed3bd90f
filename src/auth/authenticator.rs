//! Strategy selection for SharePoint authentication
//!
//! The three strategies share nothing but their signature, so they sit side
//! by side and [`Authenticator::dispatch`] picks one with an exhaustive match.
//! No strategy ever falls back to another.

use crate::auth::certificate::CertificateCredential;
use crate::auth::identity::IdentityClient;
use crate::auth::legacy::{ACS_HOST, ClientCredential};
use crate::auth::token::{AppCredential, ClientCredentialGrant, ClientCredentialProvider};
use crate::config::{AuthMethod, SiteConfig};
use crate::error::Result;
use crate::sharepoint::ClientContext;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Produces authenticated [`ClientContext`]s for one site
pub struct Authenticator {
    config: SiteConfig,
    identity: Arc<dyn IdentityClient>,
    acs_host: String,
}

impl Authenticator {
    pub fn new(config: SiteConfig, identity: Arc<dyn IdentityClient>) -> Self {
        Self {
            config,
            identity,
            acs_host: ACS_HOST.to_string(),
        }
    }

    /// Override the ACS host used by the legacy flow
    pub fn with_acs_host(mut self, host: impl Into<String>) -> Self {
        self.acs_host = host.into();
        self
    }

    /// Token flow: client id and secret against the tenant authority
    pub async fn authenticate_via_token_flow(&self) -> Result<ClientContext> {
        let grant = ClientCredentialGrant {
            authority: self.config.authority(),
            client_id: self.config.client_id().to_string(),
            scopes: vec![self.config.scope()],
            credential: AppCredential::Secret(self.config.client_secret().clone()),
        };

        let builder = ClientContext::builder(self.config.site_url())?;
        let provider = ClientCredentialProvider::acquire(self.identity.clone(), grant).await?;
        let ctx = builder.with_access_token(provider);

        info!("Successfully authenticated using MSAL (modern Azure AD)");
        Ok(ctx)
    }

    /// Certificate flow: client assertion signed with the app's private key
    pub async fn authenticate_via_certificate(&self) -> Result<ClientContext> {
        let (cert_path, thumbprint) = self.config.certificate()?;
        let certificate = CertificateCredential::from_pem_file(cert_path, thumbprint)?;

        let ctx = ClientContext::builder(self.config.site_url())?
            .with_client_certificate(
                self.identity.clone(),
                self.config.authority(),
                self.config.client_id(),
                self.config.scope(),
                certificate,
            )
            .await?;

        info!(cert_path = %cert_path.display(), "Successfully authenticated using certificate");
        Ok(ctx)
    }

    /// Legacy ACS flow: deprecated, fails on tenants with ACS app-only disabled
    pub async fn authenticate_via_legacy_flow(&self) -> Result<ClientContext> {
        warn!(
            "Using legacy ACS authentication. This may fail on new tenants. \
             Consider using MSAL or certificate-based auth instead."
        );

        let credential =
            ClientCredential::new(self.config.client_id(), self.config.client_secret().clone())
                .with_acs_host(self.acs_host.clone());

        Ok(ClientContext::builder(self.config.site_url())?.with_credentials(credential))
    }

    /// Run the selected strategy.
    ///
    /// Failures are logged with the method name and returned unchanged.
    pub async fn dispatch(&self, method: AuthMethod) -> Result<ClientContext> {
        info!(method = %method, site_url = %self.config.site_url(), "Authenticating to SharePoint");

        let result = match method {
            AuthMethod::Msal => self.authenticate_via_token_flow().await,
            AuthMethod::Certificate => self.authenticate_via_certificate().await,
            AuthMethod::Legacy => self.authenticate_via_legacy_flow().await,
        };

        result.inspect_err(|e| error!(method = %method, error = %e, "Authentication failed"))
    }

    /// Parse a method name and run it
    pub async fn dispatch_named(&self, method: &str) -> Result<ClientContext> {
        let method = AuthMethod::from_str(method)?;
        self.dispatch(method).await
    }
}
