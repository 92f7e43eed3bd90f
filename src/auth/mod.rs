//! Authentication module
//!
//! Three ways to obtain a SharePoint [`ClientContext`]: a client-credential
//! token from the identity platform, a certificate-signed client assertion,
//! and the deprecated ACS client id/secret flow.

pub mod authenticator;
pub mod certificate;
pub mod identity;
pub mod legacy;
pub mod provider;
pub mod token;

pub use authenticator::Authenticator;
pub use certificate::CertificateCredential;
pub use identity::{AzureIdentityClient, IdentityClient, TokenRequest, TokenResponse};
pub use legacy::ClientCredential;
pub use provider::{AuthHeader, AuthProvider, BoxedAuthProvider};
pub use token::ClientCredentialProvider;

use crate::config::{AuthMethod, Settings, load_settings};
use crate::error::Result;
use crate::sharepoint::ClientContext;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Create a client context from resolved settings.
///
/// Every missing required variable is reported in one error before anything
/// touches the network. When the default token flow fails, a hint about the
/// legacy method is logged; it is never attempted automatically.
pub async fn create_client_context(
    settings: &Settings,
    identity: Arc<dyn IdentityClient>,
) -> Result<ClientContext> {
    let config = settings.site_config()?;
    let method = settings.auth_method()?;

    let authenticator = Authenticator::new(config, identity);

    match authenticator.dispatch(method).await {
        Ok(ctx) => {
            info!(method = %method, auth_type = ctx.auth_type(), "Created SharePoint context");
            Ok(ctx)
        }
        Err(e) => {
            error!(method = %method, error = %e, "Failed to create SharePoint context");
            if let Some(hint) = legacy_hint(method) {
                warn!("{hint}");
            }
            Err(e)
        }
    }
}

/// Suggestion shown when `method` fails. Only the default token flow has one.
pub fn legacy_hint(method: AuthMethod) -> Option<&'static str> {
    match method {
        AuthMethod::Msal => Some(
            "MSAL authentication failed. If you're using an older tenant, you can try \
             setting SHP_AUTH_METHOD=legacy, but note that legacy ACS authentication is \
             deprecated and may not work on new tenants.",
        ),
        AuthMethod::Certificate | AuthMethod::Legacy => None,
    }
}

/// Create a client context from the process environment
pub async fn create_client_context_from_env() -> Result<ClientContext> {
    let settings = load_settings()?;
    let identity = Arc::new(AzureIdentityClient::new()?);
    create_client_context(&settings, identity).await
}
