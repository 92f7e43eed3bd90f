//! SharePoint connection via Azure AD
//!
//! Authentication glue for SharePoint Online sites plus an operator
//! diagnostic (`shp-check`).
//!
//! ## Authentication Methods
//!
//! | `SHP_AUTH_METHOD` | Flow |
//! |-------------------|------|
//! | `msal` (default)  | Client-credential token from `login.microsoftonline.com` |
//! | `certificate`     | Same grant, signed with the app certificate's private key |
//! | `legacy`          | Deprecated ACS app-only token (client id + secret) |
//!
//! ## Configuration
//!
//! ```text
//! SHP_SITE_URL=https://contoso.sharepoint.com/sites/team
//! SHP_TENANT_ID=contoso.onmicrosoft.com
//! SHP_ID_APP=<application (client) id>
//! SHP_ID_APP_SECRET=<client secret>
//! # optional
//! SHP_AUTH_METHOD=certificate
//! SHP_CERT_PATH=/etc/sharepoint/app.pem
//! SHP_CERT_THUMBPRINT=96A811A151D13E971BBCC6A872D08ED098275EF4
//! SHP_DOC_LIBRARY=Shared Documents
//! ```
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> sharepoint_connect::Result<()> {
//! let ctx = sharepoint_connect::auth::create_client_context_from_env().await?;
//! let web = ctx.get_web().await?;
//! println!("{}", web.title);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod sharepoint;
pub mod util;

// Re-export main types
pub use auth::{Authenticator, create_client_context};
pub use config::{AuthMethod, Settings, SiteConfig, load_settings};
pub use error::{AppError, Result};
pub use sharepoint::ClientContext;
