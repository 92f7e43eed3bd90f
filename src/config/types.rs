//! Configuration types for sharepoint-connect
//!
//! [`Settings`] is the raw snapshot of every `SHP_*` variable. It is resolved
//! once per process and turned into a validated [`SiteConfig`] and
//! [`AuthMethod`] before any network call happens.

use crate::error::ConfigError;
use crate::util::{SecretString, trim_trailing_separators};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const SHP_SITE_URL: &str = "SHP_SITE_URL";
pub const SHP_ID_APP: &str = "SHP_ID_APP";
pub const SHP_ID_APP_SECRET: &str = "SHP_ID_APP_SECRET";
pub const SHP_TENANT_ID: &str = "SHP_TENANT_ID";
pub const SHP_AUTH_METHOD: &str = "SHP_AUTH_METHOD";
pub const SHP_CERT_PATH: &str = "SHP_CERT_PATH";
pub const SHP_CERT_THUMBPRINT: &str = "SHP_CERT_THUMBPRINT";
pub const SHP_DOC_LIBRARY: &str = "SHP_DOC_LIBRARY";

/// Variables that must be set before any authentication is attempted
pub const REQUIRED_VARS: [&str; 4] = [SHP_SITE_URL, SHP_ID_APP, SHP_ID_APP_SECRET, SHP_TENANT_ID];

/// Document library used when `SHP_DOC_LIBRARY` is not set
pub const DEFAULT_DOC_LIBRARY: &str = "Shared Documents";

/// Microsoft identity platform host for the commercial cloud
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Authentication strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMethod {
    /// Client-credential token from the identity platform (default)
    #[default]
    Msal,
    /// Client credentials signed with a certificate private key
    Certificate,
    /// Deprecated SharePoint app-only auth through Azure ACS
    Legacy,
}

impl AuthMethod {
    pub const ALL: [AuthMethod; 3] = [
        AuthMethod::Msal,
        AuthMethod::Certificate,
        AuthMethod::Legacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Msal => "msal",
            AuthMethod::Certificate => "certificate",
            AuthMethod::Legacy => "legacy",
        }
    }

    /// Names accepted by [`AuthMethod::from_str`], in declaration order
    pub fn valid_names() -> Vec<String> {
        Self::ALL.iter().map(|m| m.as_str().to_string()).collect()
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidAuthMethod {
                given: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

/// Raw `SHP_*` environment snapshot
///
/// Field names match the variable names with the `SHP_` prefix removed.
/// Empty values are treated the same as unset ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub site_url: Option<String>,
    pub id_app: Option<String>,
    pub id_app_secret: Option<SecretString>,
    pub tenant_id: Option<String>,
    pub auth_method: Option<String>,
    pub cert_path: Option<String>,
    pub cert_thumbprint: Option<String>,
    pub doc_library: Option<String>,
}

impl Settings {
    /// Look up a variable by its full environment name.
    ///
    /// Returns `None` for unknown names and for unset or empty values. The
    /// client secret is returned unmasked, callers displaying it must mask it.
    pub fn value(&self, name: &str) -> Option<&str> {
        let value = match name {
            SHP_SITE_URL => self.site_url.as_deref(),
            SHP_ID_APP => self.id_app.as_deref(),
            SHP_ID_APP_SECRET => self.id_app_secret.as_ref().map(|s| s.expose_secret()),
            SHP_TENANT_ID => self.tenant_id.as_deref(),
            SHP_AUTH_METHOD => self.auth_method.as_deref(),
            SHP_CERT_PATH => self.cert_path.as_deref(),
            SHP_CERT_THUMBPRINT => self.cert_thumbprint.as_deref(),
            SHP_DOC_LIBRARY => self.doc_library.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.is_empty())
    }

    /// Every required variable that is unset or empty, in declaration order
    pub fn missing_required(&self) -> Vec<String> {
        REQUIRED_VARS
            .iter()
            .filter(|name| self.value(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    /// Resolve the selected auth method, defaulting to [`AuthMethod::Msal`]
    pub fn auth_method(&self) -> Result<AuthMethod, ConfigError> {
        self.value(SHP_AUTH_METHOD)
            .map(AuthMethod::from_str)
            .unwrap_or(Ok(AuthMethod::default()))
    }

    pub fn doc_library(&self) -> &str {
        self.value(SHP_DOC_LIBRARY).unwrap_or(DEFAULT_DOC_LIBRARY)
    }

    /// Build a validated [`SiteConfig`].
    ///
    /// Fails with [`ConfigError::MissingVariables`] naming every missing
    /// required variable at once.
    pub fn site_config(&self) -> Result<SiteConfig, ConfigError> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables { names: missing });
        }

        let field = |name: &str| self.value(name).unwrap_or_default();

        let config = SiteConfig::new(
            field(SHP_SITE_URL),
            field(SHP_TENANT_ID),
            field(SHP_ID_APP),
            SecretString::new(field(SHP_ID_APP_SECRET)),
        )?
        .with_cert_path(self.value(SHP_CERT_PATH).map(PathBuf::from))
        .with_cert_thumbprint(self.value(SHP_CERT_THUMBPRINT).map(str::to_string));

        Ok(config)
    }
}

/// Validated site and credential configuration
#[derive(Debug, Clone)]
pub struct SiteConfig {
    site_url: String,
    tenant_id: String,
    client_id: String,
    client_secret: SecretString,
    cert_path: Option<PathBuf>,
    cert_thumbprint: Option<String>,
}

impl SiteConfig {
    /// Create a site configuration.
    ///
    /// Trailing `/` characters are trimmed from the site URL. The site URL,
    /// tenant id and client id must be non-empty.
    pub fn new(
        site_url: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: SecretString,
    ) -> Result<Self, ConfigError> {
        let site_url = trim_trailing_separators(site_url);

        for (field, value) in [
            ("site_url", site_url),
            ("tenant_id", tenant_id),
            ("client_id", client_id),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Missing {
                    field: field.to_string(),
                });
            }
        }

        Ok(Self {
            site_url: site_url.to_string(),
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret,
            cert_path: None,
            cert_thumbprint: None,
        })
    }

    pub fn with_cert_path(mut self, path: Option<PathBuf>) -> Self {
        self.cert_path = path;
        self
    }

    pub fn with_cert_thumbprint(mut self, thumbprint: Option<String>) -> Self {
        self.cert_thumbprint = thumbprint;
        self
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    pub fn cert_path(&self) -> Option<&Path> {
        self.cert_path.as_deref()
    }

    pub fn cert_thumbprint(&self) -> Option<&str> {
        self.cert_thumbprint.as_deref()
    }

    /// Tenant-specific authority on the identity platform
    pub fn authority(&self) -> String {
        format!("{}/{}", AUTHORITY_HOST, self.tenant_id)
    }

    /// App-only scope covering the whole site
    pub fn scope(&self) -> String {
        format!("{}/.default", self.site_url)
    }

    /// Certificate path and thumbprint, both of which must be set
    pub fn certificate(&self) -> Result<(&Path, &str), ConfigError> {
        match (self.cert_path(), self.cert_thumbprint()) {
            (Some(path), Some(thumbprint)) => Ok((path, thumbprint)),
            _ => Err(ConfigError::CertificateNotConfigured),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
