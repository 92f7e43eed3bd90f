//! Shared test helpers

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use sharepoint_connect::auth::{IdentityClient, TokenRequest, TokenResponse};
use sharepoint_connect::config::{Settings, load_settings_from_map};
use sharepoint_connect::error::AuthResult;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const TEST_THUMBPRINT: &str = "96A811A151D13E971BBCC6A872D08ED098275EF4";

/// Identity client returning a canned response and recording every request
pub struct StubIdentity {
    response: Value,
    requests: Mutex<Vec<TokenRequest>>,
}

impl StubIdentity {
    pub fn issuing(token: &str) -> Arc<Self> {
        Self::with_response(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": token,
        }))
    }

    pub fn rejecting(description: Option<&str>) -> Arc<Self> {
        let mut response = json!({ "error": "invalid_client" });
        if let Some(description) = description {
            response["error_description"] = json!(description);
        }
        Self::with_response(response)
    }

    pub fn with_response(response: Value) -> Arc<Self> {
        Arc::new(Self {
            response,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<TokenRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityClient for StubIdentity {
    async fn acquire_token_for_client(&self, request: &TokenRequest) -> AuthResult<TokenResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(serde_json::from_value(self.response.clone()).unwrap())
    }
}

/// Settings from `(name, value)` pairs
pub fn settings(pairs: &[(&str, &str)]) -> Settings {
    load_settings_from_map(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
    .unwrap()
}

/// The four required variables for a site
pub fn required_vars(site_url: &str) -> Vec<(&'static str, String)> {
    vec![
        ("SHP_SITE_URL", site_url.to_string()),
        ("SHP_ID_APP", "11111111-2222-3333-4444-555555555555".to_string()),
        ("SHP_ID_APP_SECRET", "abcd-client-secret-wxyz".to_string()),
        ("SHP_TENANT_ID", "contoso.onmicrosoft.com".to_string()),
    ]
}

/// Settings with the required variables plus extra pairs
pub fn site_settings(site_url: &str, extra: &[(&str, &str)]) -> Settings {
    let required = required_vars(site_url);
    let mut pairs: Vec<(&str, &str)> = required.iter().map(|(k, v)| (*k, v.as_str())).collect();
    pairs.extend_from_slice(extra);
    settings(&pairs)
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
