//! Connection diagnostics
//!
//! A fixed sequence of operator checks: environment, runtime components,
//! connection, basic read operations. Later stages only run when the earlier
//! ones passed. Every check works from the same resolved [`Settings`].

pub mod report;

pub use report::{CheckOutcome, DiagnosticReport, Line};

use crate::auth::{
    CertificateCredential, IdentityClient, create_client_context, legacy_hint,
};
use crate::config::{
    AUTHORITY_HOST, AuthMethod, SHP_AUTH_METHOD, SHP_CERT_PATH, SHP_CERT_THUMBPRINT,
    SHP_DOC_LIBRARY, SHP_ID_APP, SHP_ID_APP_SECRET, SHP_SITE_URL, SHP_TENANT_ID, Settings,
};
use crate::error::{AppError, AuthError, ConfigError, SharePointError};
use crate::sharepoint::ClientContext;
use crate::util::mask_secret;
use reqwest::Url;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const ENVIRONMENT_CHECK: &str = "Environment Variables";
pub const RUNTIME_CHECK: &str = "Runtime Components";
pub const CONNECTION_CHECK: &str = "SharePoint Connection";
pub const OPERATIONS_CHECK: &str = "Basic Operations";

const REQUIRED_VARIABLES: [(&str, &str); 4] = [
    (SHP_TENANT_ID, "Azure AD Tenant ID"),
    (SHP_ID_APP, "Azure AD Application (Client) ID"),
    (SHP_ID_APP_SECRET, "Azure AD Client Secret"),
    (SHP_SITE_URL, "SharePoint Site URL"),
];

const OPTIONAL_VARIABLES: [(&str, &str); 4] = [
    (SHP_DOC_LIBRARY, "Document Library Path (default: \"Shared Documents\")"),
    (SHP_AUTH_METHOD, "Authentication Method (default: \"msal\")"),
    (SHP_CERT_PATH, "Certificate File (certificate auth)"),
    (SHP_CERT_THUMBPRINT, "Certificate Thumbprint (certificate auth)"),
];

/// Environment check: every required variable set, secrets masked
pub fn check_environment(settings: &Settings) -> CheckOutcome {
    let mut check = CheckOutcome::new(ENVIRONMENT_CHECK, "Checking Environment Variables");

    for (name, description) in REQUIRED_VARIABLES {
        match settings.value(name) {
            Some(value) => {
                check.success(format!(
                    "{:25} {:40} {}",
                    name,
                    description,
                    display_value(name, value)
                ));
            }
            None => check.failure(format!("{:25} {:40} NOT SET", name, description)),
        }
    }

    check.blank();
    check.info("Optional Variables:");
    for (name, description) in OPTIONAL_VARIABLES {
        match settings.value(name) {
            Some(value) => check.success(format!(
                "{:25} {:40} {}",
                name,
                description,
                display_value(name, value)
            )),
            None => check.info(format!("{:25} {:40} (using default)", name, description)),
        }
    }

    check
}

fn display_value(name: &str, value: &str) -> String {
    if name.contains("SECRET") {
        mask_secret(value)
    } else {
        value.to_string()
    }
}

/// A runtime component the connection depends on
struct Probe {
    name: &'static str,
    description: &'static str,
    status: Result<Option<String>, String>,
}

/// Runtime component check.
///
/// Dependencies are linked at build time, so instead of looking for
/// packages this probes the pieces a connection needs at runtime.
pub fn check_runtime(settings: &Settings) -> CheckOutcome {
    let mut check = CheckOutcome::new(RUNTIME_CHECK, "Checking Runtime Components");

    let probes = [
        Probe {
            name: "tokio",
            description: "Async runtime",
            status: tokio::runtime::Handle::try_current()
                .map(|handle| Some(format!("{:?} scheduler", handle.runtime_flavor())))
                .map_err(|e| e.to_string()),
        },
        Probe {
            name: "reqwest",
            description: "HTTP client with rustls TLS",
            status: reqwest::Client::builder()
                .use_rustls_tls()
                .build()
                .map(|_| None)
                .map_err(|e| e.to_string()),
        },
        Probe {
            name: "site-url",
            description: "SharePoint site URL",
            status: probe_site_url(settings),
        },
        Probe {
            name: "authority",
            description: "Identity platform authority",
            status: probe_authority(settings),
        },
        Probe {
            name: "credential",
            description: "Credential material",
            status: probe_credential(settings),
        },
    ];

    for probe in probes {
        match probe.status {
            Ok(detail) => check.success(format!(
                "{:20} {}{}",
                probe.name,
                probe.description,
                detail.map(|d| format!(" ({d})")).unwrap_or_default()
            )),
            Err(reason) => check.failure(format!(
                "{:20} {} - {}",
                probe.name, probe.description, reason
            )),
        }
    }

    check
}

fn probe_site_url(settings: &Settings) -> Result<Option<String>, String> {
    let site_url = settings
        .value(SHP_SITE_URL)
        .ok_or_else(|| format!("{SHP_SITE_URL} is not set"))?;
    let url = Url::parse(site_url).map_err(|e| format!("invalid URL: {e}"))?;

    match url.scheme() {
        "https" | "http" => Ok(url.host_str().map(str::to_string)),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

fn probe_authority(settings: &Settings) -> Result<Option<String>, String> {
    let tenant = settings
        .value(SHP_TENANT_ID)
        .ok_or_else(|| format!("{SHP_TENANT_ID} is not set"))?;
    let authority = format!("{AUTHORITY_HOST}/{tenant}");
    Url::parse(&authority).map_err(|e| format!("invalid authority: {e}"))?;
    Ok(Some(authority))
}

fn probe_credential(settings: &Settings) -> Result<Option<String>, String> {
    let method = settings.auth_method().map_err(|e| e.to_string())?;

    match method {
        AuthMethod::Certificate => {
            let (path, thumbprint) = settings
                .value(SHP_CERT_PATH)
                .zip(settings.value(SHP_CERT_THUMBPRINT))
                .ok_or_else(|| ConfigError::CertificateNotConfigured.to_string())?;
            CertificateCredential::from_pem_file(Path::new(path), thumbprint)
                .map_err(|e| e.to_string())?;
            Ok(Some(format!("certificate {path}")))
        }
        AuthMethod::Msal | AuthMethod::Legacy => Ok(Some(format!("client secret, {method}"))),
    }
}

/// Failure classes of the connection check, each with its own remediation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureBucket {
    /// Missing or invalid settings, detected before any network call
    Configuration,
    /// The identity provider or site rejected the credentials
    Authentication,
    /// Network, URL, permission and everything else
    Other,
}

impl FailureBucket {
    pub fn classify(err: &AppError) -> Self {
        match err {
            AppError::Config(_) => FailureBucket::Configuration,
            AppError::Auth(AuthError::TokenAcquisition { .. } | AuthError::Certificate(_))
            | AppError::SharePoint(
                SharePointError::Auth(AuthError::TokenAcquisition { .. })
                | SharePointError::Unauthorized,
            ) => FailureBucket::Authentication,
            _ => FailureBucket::Other,
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            FailureBucket::Configuration => "Configuration Error",
            FailureBucket::Authentication => "Authentication Failed",
            FailureBucket::Other => "Connection Failed",
        }
    }

    fn hints(&self, err: &AppError) -> Vec<String> {
        match self {
            FailureBucket::Configuration => {
                let fix = match err {
                    AppError::Config(ConfigError::MissingVariables { .. }) => {
                        "Fix: Set all required environment variables".to_string()
                    }
                    AppError::Config(ConfigError::InvalidAuthMethod { valid, .. }) => {
                        format!("Fix: Set {SHP_AUTH_METHOD} to one of: {}", valid.join(", "))
                    }
                    AppError::Config(ConfigError::CertificateNotConfigured) => {
                        format!("Fix: Set both {SHP_CERT_PATH} and {SHP_CERT_THUMBPRINT}")
                    }
                    _ => "Fix: Review the SHP_* settings listed above".to_string(),
                };
                vec![fix]
            }
            FailureBucket::Authentication => vec![
                "Possible fixes:".to_string(),
                format!("  1. Verify your {SHP_TENANT_ID} is correct"),
                format!("  2. Check that {SHP_ID_APP} and {SHP_ID_APP_SECRET} are correct"),
                "  3. Ensure your Azure AD app has SharePoint API permissions".to_string(),
                "  4. Grant admin consent in Azure Portal".to_string(),
            ],
            FailureBucket::Other => vec![
                "Possible causes:".to_string(),
                "  1. Invalid credentials".to_string(),
                "  2. Network connectivity issues".to_string(),
                "  3. SharePoint site URL is incorrect".to_string(),
                "  4. Azure AD app lacks proper permissions".to_string(),
                "  5. Admin consent not granted".to_string(),
            ],
        }
    }
}

fn report_failure(check: &mut CheckOutcome, err: &AppError, method: Option<AuthMethod>) {
    let bucket = FailureBucket::classify(err);
    debug!(bucket = ?bucket, error = %err, "Connection check failed");

    check.failure(bucket.heading());
    check.info(format!("Error: {err}"));
    check.blank();
    for hint in bucket.hints(err) {
        check.info(hint);
    }

    if bucket == FailureBucket::Authentication {
        if let Some(hint) = method.and_then(legacy_hint) {
            check.blank();
            check.push(Line::Warning(hint.to_string()));
        }
    }
}

/// Runs the full diagnostic sequence
pub struct Diagnostics {
    settings: Settings,
    identity: Arc<dyn IdentityClient>,
}

impl Diagnostics {
    pub fn new(settings: Settings, identity: Arc<dyn IdentityClient>) -> Self {
        Self { settings, identity }
    }

    pub async fn run(&self) -> DiagnosticReport {
        let mut report = DiagnosticReport::default();

        let environment = check_environment(&self.settings);
        let runtime = check_runtime(&self.settings);
        let prerequisites_met = environment.passed && runtime.passed;
        report.checks.push(environment);
        report.checks.push(runtime);

        if !prerequisites_met {
            report.notes.push(Line::Warning(
                "Skipping connection tests due to failed prerequisites".to_string(),
            ));
            return report;
        }

        let (connection, ctx) = self.check_connection().await;
        report.checks.push(connection);

        if let Some(ctx) = ctx {
            report.checks.push(self.check_operations(&ctx).await);
        }

        info!(passed = report.passed(), "Diagnostics finished");
        report
    }

    /// Build a context and fetch site metadata with it
    pub async fn check_connection(&self) -> (CheckOutcome, Option<ClientContext>) {
        let mut check = CheckOutcome::new(CONNECTION_CHECK, "Testing SharePoint Connection");

        check.info("Attempting to connect to SharePoint...");
        let ctx = match create_client_context(&self.settings, self.identity.clone()).await {
            Ok(ctx) => ctx,
            Err(e) => {
                report_failure(&mut check, &e, self.settings.auth_method().ok());
                return (check, None);
            }
        };

        check.info("Fetching web information...");
        match ctx.get_web().await {
            Ok(web) => {
                let method = self.settings.auth_method().unwrap_or_default();
                check.success("Successfully connected to SharePoint!");
                check.blank();
                check.info(format!("Site Title:  {}", web.title));
                check.info(format!("Site URL:    {}", web.url));
                check.info(format!("Auth Method: {}", method.as_str().to_uppercase()));
                (check, Some(ctx))
            }
            Err(e) => {
                report_failure(&mut check, &AppError::from(e), self.settings.auth_method().ok());
                (check, None)
            }
        }
    }

    /// List the library's folders, then the files of the first folder
    pub async fn check_operations(&self, ctx: &ClientContext) -> CheckOutcome {
        let mut check = CheckOutcome::new(OPERATIONS_CHECK, "Testing Basic Operations");
        let library = self.settings.doc_library();

        check.info(format!("Testing folder listing in '{library}'..."));
        let folders = match ctx.list_folders(library).await {
            Ok(folders) => {
                check.success(format!(
                    "Successfully listed folders (found {} folders)",
                    folders.len()
                ));
                folders
            }
            Err(e) => {
                check.failure(format!("Failed to list folders: {e}"));
                return check;
            }
        };

        // Without sub-folders the library root itself is listed.
        let target = folders
            .first()
            .map(|folder| folder.server_relative_url.as_str())
            .unwrap_or(library);

        check.info(format!("Testing file listing in '{target}'..."));
        match ctx.list_files(target).await {
            Ok(files) => check.success(format!(
                "Successfully listed files (found {} files)",
                files.len()
            )),
            Err(e) => check.failure(format!("Failed to list files: {e}")),
        }

        check
    }
}
