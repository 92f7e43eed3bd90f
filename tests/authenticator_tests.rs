//! Authentication strategy tests

mod common;

use common::{StubIdentity, TEST_THUMBPRINT, fixture_path, site_settings};
use sharepoint_connect::auth::identity::ClientAuthentication;
use sharepoint_connect::auth::Authenticator;
use sharepoint_connect::config::AuthMethod;
use sharepoint_connect::create_client_context;
use sharepoint_connect::error::{AppError, AuthError, ConfigError};
use std::io::Write;

const SITE: &str = "https://contoso.sharepoint.com/sites/team";

fn authenticator(extra: &[(&str, &str)], identity: std::sync::Arc<StubIdentity>) -> Authenticator {
    let config = site_settings(SITE, extra).site_config().unwrap();
    Authenticator::new(config, identity)
}

#[tokio::test]
async fn test_token_flow_requests_site_scope() {
    let identity = StubIdentity::issuing("token-abc");
    let ctx = create_client_context(&site_settings(SITE, &[]), identity.clone())
        .await
        .unwrap();

    assert_eq!(ctx.site_url(), SITE);
    assert_eq!(ctx.auth_type(), "Client secret (identity platform)");

    let requests = identity.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authority,
        "https://login.microsoftonline.com/contoso.onmicrosoft.com"
    );
    assert_eq!(requests[0].client_id, "11111111-2222-3333-4444-555555555555");
    assert_eq!(requests[0].scopes, vec![format!("{SITE}/.default")]);
    assert!(matches!(
        &requests[0].credential,
        ClientAuthentication::Secret(secret) if secret.expose_secret() == "abcd-client-secret-wxyz"
    ));
}

#[tokio::test]
async fn test_token_flow_failure_carries_description() {
    let identity = StubIdentity::rejecting(Some(
        "AADSTS7000215: Invalid client secret provided.",
    ));

    let err = authenticator(&[], identity)
        .authenticate_via_token_flow()
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Authentication error: Failed to acquire token: AADSTS7000215: Invalid client secret provided."
    );
}

#[tokio::test]
async fn test_token_flow_failure_without_description() {
    let err = authenticator(&[], StubIdentity::rejecting(None))
        .authenticate_via_token_flow()
        .await
        .unwrap_err();

    match err {
        AppError::Auth(AuthError::TokenAcquisition { description }) => {
            assert_eq!(description, "Unknown error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_token_flow_failure_is_not_retried_as_legacy() {
    let identity = StubIdentity::rejecting(Some("AADSTS90002: Tenant not found."));

    let err = create_client_context(&site_settings(SITE, &[]), identity.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Auth(AuthError::TokenAcquisition { .. })));
    assert_eq!(identity.call_count(), 1);
}

#[tokio::test]
async fn test_legacy_flow_skips_identity_platform() {
    let identity = StubIdentity::issuing("unused");

    let ctx = create_client_context(
        &site_settings(SITE, &[("SHP_AUTH_METHOD", "legacy")]),
        identity.clone(),
    )
    .await
    .unwrap();

    assert_eq!(ctx.auth_type(), "Client credentials (legacy ACS)");
    assert_eq!(identity.call_count(), 0);
}

#[tokio::test]
async fn test_certificate_requires_path_and_thumbprint() {
    let cert = fixture_path("app-cert.pem");
    let cert = cert.to_str().unwrap();

    for extra in [
        vec![],
        vec![("SHP_CERT_PATH", cert)],
        vec![("SHP_CERT_THUMBPRINT", TEST_THUMBPRINT)],
    ] {
        let identity = StubIdentity::issuing("token");
        let err = authenticator(&extra, identity.clone())
            .dispatch(AuthMethod::Certificate)
            .await
            .unwrap_err();

        assert!(
            matches!(err, AppError::Config(ConfigError::CertificateNotConfigured)),
            "{extra:?}: {err:?}"
        );
        assert_eq!(identity.call_count(), 0);
    }
}

#[tokio::test]
async fn test_certificate_flow_sends_signed_assertion() {
    let cert = fixture_path("app-cert.pem");
    let identity = StubIdentity::issuing("cert-token");

    let ctx = authenticator(
        &[
            ("SHP_CERT_PATH", cert.to_str().unwrap()),
            ("SHP_CERT_THUMBPRINT", TEST_THUMBPRINT),
        ],
        identity.clone(),
    )
    .dispatch(AuthMethod::Certificate)
    .await
    .unwrap();

    assert_eq!(ctx.auth_type(), "Client certificate (identity platform)");

    let requests = identity.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authority,
        "https://login.microsoftonline.com/contoso.onmicrosoft.com"
    );
    assert_eq!(requests[0].scopes, vec![format!("{SITE}/.default")]);
    match &requests[0].credential {
        ClientAuthentication::Assertion(jwt) => {
            assert_eq!(jwt.expose_secret().split('.').count(), 3);
        }
        other => panic!("expected a client assertion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_certificate_flow_rejects_garbage_pem() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "this is not a certificate").unwrap();

    let identity = StubIdentity::issuing("token");
    let err = authenticator(
        &[
            ("SHP_CERT_PATH", file.path().to_str().unwrap()),
            ("SHP_CERT_THUMBPRINT", TEST_THUMBPRINT),
        ],
        identity.clone(),
    )
    .authenticate_via_certificate()
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Auth(AuthError::Certificate(_))), "{err:?}");
    assert_eq!(identity.call_count(), 0);
}

#[tokio::test]
async fn test_certificate_flow_missing_file() {
    let err = authenticator(
        &[
            ("SHP_CERT_PATH", "/nonexistent/app-cert.pem"),
            ("SHP_CERT_THUMBPRINT", TEST_THUMBPRINT),
        ],
        StubIdentity::issuing("token"),
    )
    .authenticate_via_certificate()
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Config(ConfigError::Invalid { .. })), "{err:?}");
}

#[tokio::test]
async fn test_dispatch_named_rejects_unknown_method() {
    let identity = StubIdentity::issuing("token");
    let err = authenticator(&[], identity.clone())
        .dispatch_named("MSAL")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Config(ConfigError::InvalidAuthMethod { ref given, .. }) if given == "MSAL"
    ));
    assert_eq!(identity.call_count(), 0);
}

#[tokio::test]
async fn test_dispatch_named_runs_selected_strategy() {
    let identity = StubIdentity::issuing("token");
    let ctx = authenticator(&[], identity.clone())
        .dispatch_named("legacy")
        .await
        .unwrap();

    assert_eq!(ctx.auth_type(), "Client credentials (legacy ACS)");
    assert_eq!(identity.call_count(), 0);
}

#[tokio::test]
async fn test_certificate_scope_uses_trimmed_site_url() {
    let cert = fixture_path("app-cert.pem");
    let identity = StubIdentity::issuing("cert-token");
    let settings = site_settings(
        &format!("{SITE}//"),
        &[
            ("SHP_AUTH_METHOD", "certificate"),
            ("SHP_CERT_PATH", cert.to_str().unwrap()),
            ("SHP_CERT_THUMBPRINT", TEST_THUMBPRINT),
        ],
    );

    create_client_context(&settings, identity.clone()).await.unwrap();

    assert_eq!(identity.requests()[0].scopes, vec![format!("{SITE}/.default")]);
}
