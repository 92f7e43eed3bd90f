//! SharePoint client integration tests with mock server

mod common;

use common::{StubIdentity, site_settings};
use serde_json::json;
use sharepoint_connect::auth::identity::{AzureIdentityClient, ClientAuthentication, TokenRequest};
use sharepoint_connect::auth::{Authenticator, IdentityClient};
use sharepoint_connect::config::AuthMethod;
use sharepoint_connect::error::{AppError, AuthError, SharePointError};
use sharepoint_connect::util::SecretString;
use sharepoint_connect::{ClientContext, create_client_context};
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REALM: &str = "test-realm";

/// Helper to create a context pointing to the mock server
async fn create_test_context(mock_server: &MockServer, token: &str) -> ClientContext {
    create_client_context(
        &site_settings(&mock_server.uri(), &[]),
        StubIdentity::issuing(token),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_get_web_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_api/web"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("Accept", "application/json;odata=nometadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Title": "Team Site",
            "Url": "https://contoso.sharepoint.com/sites/team",
            "ServerRelativeUrl": "/sites/team"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_test_context(&mock_server, "test-token").await;
    let web = ctx.get_web().await.unwrap();

    assert_eq!(web.title, "Team Site");
    assert_eq!(web.url, "https://contoso.sharepoint.com/sites/team");
    assert_eq!(web.server_relative_url.as_deref(), Some("/sites/team"));
}

#[tokio::test]
async fn test_list_folders_and_files() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"decodedurl='Shared%20Documents'\)/Folders$"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"Name": "Reports", "ServerRelativeUrl": "/sites/team/Shared Documents/Reports", "ItemCount": 2},
                {"Name": "Forms", "ServerRelativeUrl": "/sites/team/Shared Documents/Forms", "ItemCount": 0}
            ]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"Reports'\)/Files$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"Name": "q1.xlsx", "ServerRelativeUrl": "/sites/team/Shared Documents/Reports/q1.xlsx"},
                {"Name": "q2.xlsx", "ServerRelativeUrl": "/sites/team/Shared Documents/Reports/q2.xlsx",
                 "TimeLastModified": "2024-04-01T08:00:00Z"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let ctx = create_test_context(&mock_server, "test-token").await;

    let folders = ctx.list_folders("Shared Documents").await.unwrap();
    assert_eq!(folders.len(), 2);
    assert_eq!(folders[0].name, "Reports");
    assert_eq!(folders[0].item_count, Some(2));

    let files = ctx.list_files(&folders[0].server_relative_url).await.unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[1].name, "q2.xlsx");
    assert_eq!(files[1].time_last_modified.as_deref(), Some("2024-04-01T08:00:00Z"));
}

#[tokio::test]
async fn test_not_found_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_api/web"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&mock_server)
        .await;

    let ctx = create_test_context(&mock_server, "test-token").await;
    let err = ctx.get_web().await.unwrap_err();

    assert!(matches!(err, SharePointError::NotFound { ref resource } if resource == "site"));
}

#[tokio::test]
async fn test_unauthorized_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/Folders$"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let ctx = create_test_context(&mock_server, "expired-token").await;
    let err = ctx.list_folders("Shared Documents").await.unwrap_err();

    assert!(matches!(err, SharePointError::Unauthorized));
}

#[tokio::test]
async fn test_server_error_keeps_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_api/web"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;

    let ctx = create_test_context(&mock_server, "test-token").await;
    let err = ctx.get_web().await.unwrap_err();

    match err {
        SharePointError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Service Unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_legacy_flow_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_vti_bin/client.svc"))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            format!(
                r#"Bearer realm="{REALM}",client_id="00000003-0000-0ff1-ce00-000000000000""#
            ),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/{REALM}/tokens/OAuth/2")))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains(
            "client_id=11111111-2222-3333-4444-555555555555%40test-realm",
        ))
        .and(body_string_contains(
            "resource=00000003-0000-0ff1-ce00-000000000000%2F127.0.0.1%40test-realm",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "acs-token",
            "expires_in": "86399"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/_api/web"))
        .and(header("Authorization", "Bearer acs-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Title": "Legacy Site",
            "Url": mock_server.uri()
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let identity = StubIdentity::issuing("unused");
    let config = site_settings(&mock_server.uri(), &[]).site_config().unwrap();
    let ctx = Authenticator::new(config, identity.clone())
        .with_acs_host(mock_server.uri())
        .dispatch(AuthMethod::Legacy)
        .await
        .unwrap();

    // The token is fetched once and reused.
    assert_eq!(ctx.get_web().await.unwrap().title, "Legacy Site");
    assert_eq!(ctx.get_web().await.unwrap().title, "Legacy Site");
    assert_eq!(identity.call_count(), 0);
}

#[tokio::test]
async fn test_legacy_flow_without_challenge() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_vti_bin/client.svc"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = site_settings(&mock_server.uri(), &[]).site_config().unwrap();
    let ctx = Authenticator::new(config, StubIdentity::issuing("unused"))
        .with_acs_host(mock_server.uri())
        .dispatch(AuthMethod::Legacy)
        .await
        .unwrap();

    let err = ctx.get_web().await.unwrap_err();
    assert!(
        matches!(err, SharePointError::Auth(AuthError::RealmDiscovery(_))),
        "{err:?}"
    );
}

fn token_request(mock_server: &MockServer) -> TokenRequest {
    TokenRequest {
        authority: format!("{}/contoso", mock_server.uri()),
        client_id: "app-id".to_string(),
        credential: ClientAuthentication::Secret(SecretString::new("s3cret")),
        scopes: vec!["https://contoso.sharepoint.com/.default".to_string()],
    }
}

#[tokio::test]
async fn test_identity_client_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contoso/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=app-id"))
        .and(body_string_contains("client_secret=s3cret"))
        .and(body_string_contains(
            "scope=https%3A%2F%2Fcontoso.sharepoint.com%2F.default",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "eyJ0eXAi"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AzureIdentityClient::new().unwrap();
    let response = client
        .acquire_token_for_client(&token_request(&mock_server))
        .await
        .unwrap();

    let token = response.into_access_token().unwrap();
    assert_eq!(token.secret().expose_secret(), "eyJ0eXAi");
    assert!(!token.is_expiring());
}

#[tokio::test]
async fn test_identity_client_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contoso/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .mount(&mock_server)
        .await;

    let client = AzureIdentityClient::new().unwrap();
    let response = client
        .acquire_token_for_client(&token_request(&mock_server))
        .await
        .unwrap();

    assert_eq!(response.error.as_deref(), Some("invalid_client"));
    let err = AppError::from(response.into_access_token().unwrap_err());
    assert_eq!(
        err.to_string(),
        "Authentication error: Failed to acquire token: AADSTS7000215: Invalid client secret provided."
    );
}

#[tokio::test]
async fn test_identity_client_unparseable_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contoso/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let client = AzureIdentityClient::new().unwrap();
    let err = client
        .acquire_token_for_client(&token_request(&mock_server))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidResponse(ref msg) if msg.contains("HTTP 502")));
}
