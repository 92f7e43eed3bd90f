//! SharePoint client context
//!
//! An authenticated handle to one site. Every request asks the auth provider
//! for a bearer header, refreshing the token first when it is about to expire.

use crate::auth::certificate::CertificateCredential;
use crate::auth::identity::IdentityClient;
use crate::auth::legacy::{AcsTokenProvider, ClientCredential};
use crate::auth::provider::{AuthProvider, BoxedAuthProvider};
use crate::auth::token::{AppCredential, ClientCredentialGrant, ClientCredentialProvider};
use crate::error::{AuthResult, SharePointError, SharePointResult};
use crate::sharepoint::types::{Collection, File, Folder, Web};
use crate::util::trim_trailing_separators;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

const ODATA_NOMETADATA: &str = "application/json;odata=nometadata";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Unauthenticated context, finished by one of the `with_*` constructors
pub struct ContextBuilder {
    http: Client,
    site_url: String,
}

impl ContextBuilder {
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Attach a provider that supplies bearer tokens per request
    pub fn with_access_token(self, provider: impl AuthProvider + 'static) -> ClientContext {
        let auth_type = provider.auth_type();
        let auth: BoxedAuthProvider = Box::new(provider);

        ClientContext {
            http: self.http,
            site_url: self.site_url,
            auth: Arc::new(RwLock::new(auth)),
            auth_type,
        }
    }

    /// Authenticate with a certificate-signed client assertion.
    ///
    /// The first token is acquired before the context is returned.
    pub async fn with_client_certificate(
        self,
        identity: Arc<dyn IdentityClient>,
        authority: impl Into<String>,
        client_id: impl Into<String>,
        scope: impl Into<String>,
        certificate: CertificateCredential,
    ) -> AuthResult<ClientContext> {
        let grant = ClientCredentialGrant {
            authority: authority.into(),
            client_id: client_id.into(),
            scopes: vec![scope.into()],
            credential: AppCredential::Certificate(certificate),
        };

        let provider = ClientCredentialProvider::acquire(identity, grant).await?;
        Ok(self.with_access_token(provider))
    }

    /// Authenticate with an ACS client id and secret.
    ///
    /// No request is made until the context is first used.
    pub fn with_credentials(self, credential: ClientCredential) -> ClientContext {
        let provider = AcsTokenProvider::new(self.http.clone(), self.site_url.clone(), credential);
        self.with_access_token(provider)
    }
}

/// Authenticated SharePoint site handle
pub struct ClientContext {
    http: Client,
    site_url: String,
    auth: Arc<RwLock<BoxedAuthProvider>>,
    auth_type: &'static str,
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("site_url", &self.site_url)
            .field("auth_type", &self.auth_type)
            .finish_non_exhaustive()
    }
}

impl ClientContext {
    /// Start building a context for a site
    pub fn builder(site_url: &str) -> SharePointResult<ContextBuilder> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("sharepoint-connect/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SharePointError::Request)?;

        Ok(ContextBuilder {
            http,
            site_url: trim_trailing_separators(site_url).to_string(),
        })
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Description of how this context authenticates
    pub fn auth_type(&self) -> &'static str {
        self.auth_type
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.site_url, endpoint)
    }

    /// Add authentication to a request
    async fn authenticate(&self, request: RequestBuilder) -> SharePointResult<RequestBuilder> {
        if self.auth.read().await.needs_refresh() {
            let mut auth = self.auth.write().await;
            // Another caller may have refreshed while we waited for the lock.
            if auth.needs_refresh() {
                debug!(auth_type = auth.auth_type(), "Refreshing credentials");
                auth.refresh().await?;
            }
        }

        let header = self.auth.read().await.get_auth_header().await?;
        Ok(request.header(header.header_name(), header.header_value()))
    }

    /// Handle API response
    async fn handle_response(response: Response, resource: &str) -> SharePointResult<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(SharePointError::from_response(status.as_u16(), resource, &body))
    }

    /// Make a GET request
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        resource: &str,
    ) -> SharePointResult<T> {
        let request = self
            .http
            .get(self.url(endpoint))
            .header(ACCEPT, ODATA_NOMETADATA);
        let request = self.authenticate(request).await?;

        let response = Self::handle_response(request.send().await?, resource).await?;
        response.json().await.map_err(|e| {
            SharePointError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }

    /// Fetch site metadata
    pub async fn get_web(&self) -> SharePointResult<Web> {
        self.get("/_api/web", "site").await
    }

    /// List the sub-folders of a folder
    pub async fn list_folders(&self, server_relative_path: &str) -> SharePointResult<Vec<Folder>> {
        let endpoint = format!("{}/Folders", Self::folder_endpoint(server_relative_path));
        let folders: Collection<Folder> = self
            .get(&endpoint, &format!("folder '{}'", server_relative_path))
            .await?;
        Ok(folders.value)
    }

    /// List the files directly inside a folder
    pub async fn list_files(&self, server_relative_path: &str) -> SharePointResult<Vec<File>> {
        let endpoint = format!("{}/Files", Self::folder_endpoint(server_relative_path));
        let files: Collection<File> = self
            .get(&endpoint, &format!("folder '{}'", server_relative_path))
            .await?;
        Ok(files.value)
    }

    /// REST path addressing a folder by server- or site-relative path
    pub fn folder_endpoint(server_relative_path: &str) -> String {
        // OData string literals escape a single quote by doubling it.
        let literal = server_relative_path.replace('\'', "''");
        format!(
            "/_api/web/GetFolderByServerRelativePath(decodedurl='{}')",
            urlencoding::encode(&literal)
        )
    }
}
