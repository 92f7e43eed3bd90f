//! Certificate credentials
//!
//! Builds the signed JWT client assertion the identity platform accepts in
//! place of a client secret. The assertion header names the certificate by
//! its SHA-1 thumbprint (`x5t`), the payload binds it to the token endpoint.

use crate::error::{AppError, AuthError, AuthResult, ConfigError};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Validity window of a client assertion
const ASSERTION_LIFETIME_SECS: u64 = 600;

/// SHA-1 digests are 20 bytes
const THUMBPRINT_LEN: usize = 20;

const PRIVATE_KEY_TAGS: [&str; 2] = ["PRIVATE KEY", "RSA PRIVATE KEY"];

/// Claims of a client assertion
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub jti: String,
    pub nbf: u64,
    pub iat: u64,
    pub exp: u64,
}

/// RSA private key plus the thumbprint of its certificate
#[derive(Clone)]
pub struct CertificateCredential {
    key: EncodingKey,
    x5t: String,
}

impl fmt::Debug for CertificateCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateCredential")
            .field("x5t", &self.x5t)
            .finish_non_exhaustive()
    }
}

impl CertificateCredential {
    /// Load the private key from a PEM file.
    ///
    /// An unreadable file is a configuration problem; unusable key material
    /// or thumbprint is an authentication problem.
    pub fn from_pem_file(path: &Path, thumbprint: &str) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Invalid {
            message: format!("cannot read certificate file {}: {}", path.display(), e),
        })?;

        Ok(Self::from_pem(&content, thumbprint)?)
    }

    /// Build a credential from PEM content holding an RSA private key.
    ///
    /// The content may also contain the certificate itself; only the key
    /// block is used. The thumbprint is the hex SHA-1 fingerprint shown in
    /// the Azure portal, colons and whitespace are ignored.
    pub fn from_pem(pem_content: &str, thumbprint: &str) -> AuthResult<Self> {
        let blocks = pem::parse_many(pem_content)
            .map_err(|e| AuthError::Certificate(format!("failed to parse PEM content: {}", e)))?;

        let key_block = blocks
            .iter()
            .find(|block| PRIVATE_KEY_TAGS.contains(&block.tag()))
            .ok_or_else(|| {
                if blocks.iter().any(|b| b.tag() == "ENCRYPTED PRIVATE KEY") {
                    AuthError::Certificate("encrypted private keys are not supported".to_string())
                } else {
                    AuthError::Certificate("no private key found in PEM content".to_string())
                }
            })?;

        let key = EncodingKey::from_rsa_pem(pem::encode(key_block).as_bytes())
            .map_err(|e| AuthError::Certificate(format!("invalid RSA private key: {}", e)))?;

        Ok(Self {
            key,
            x5t: thumbprint_to_x5t(thumbprint)?,
        })
    }

    /// Sign a fresh client assertion for `audience` (the token endpoint).
    pub fn client_assertion(&self, audience: &str, client_id: &str) -> AuthResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::Certificate(format!("system clock error: {}", e)))?
            .as_secs();

        let claims = AssertionClaims {
            aud: audience.to_string(),
            iss: client_id.to_string(),
            sub: client_id.to_string(),
            jti: format!("{:032x}", rand::random::<u128>()),
            nbf: now,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.x5t = Some(self.x5t.clone());

        encode(&header, &claims, &self.key)
            .map_err(|e| AuthError::Certificate(format!("failed to sign client assertion: {}", e)))
    }
}

fn thumbprint_to_x5t(thumbprint: &str) -> AuthResult<String> {
    let cleaned: String = thumbprint
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();

    let digest = hex::decode(&cleaned)
        .map_err(|e| AuthError::Certificate(format!("thumbprint is not valid hex: {}", e)))?;

    if digest.len() != THUMBPRINT_LEN {
        return Err(AuthError::Certificate(format!(
            "thumbprint must be a {}-byte SHA-1 digest, got {} bytes",
            THUMBPRINT_LEN,
            digest.len()
        )));
    }

    Ok(URL_SAFE_NO_PAD.encode(digest))
}
