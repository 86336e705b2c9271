//! Service-account credentials and OAuth2 access tokens.
//!
//! The REST clients authenticate with short-lived bearer tokens. A
//! [`TokenSource`] built from a [`ServiceAccount`] signs an RS256 JWT
//! assertion and exchanges it at the account's token endpoint; the resulting
//! token is reused until shortly before it expires. A static source is used
//! against local emulators, which accept the fixed token `owner`.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Token endpoint used when the service account does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested for the identity and database APIs.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/firebase.database",
    "https://www.googleapis.com/auth/identitytoolkit",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Token accepted by the local emulators.
pub const EMULATOR_TOKEN: &str = "owner";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// Errors raised while loading credentials or minting access tokens.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to parse service account json: {0}")]
    InvalidServiceAccount(String),

    #[error("Failed to parse private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Failed to sign token assertion: {0}")]
    Signing(String),

    #[error("Error fetching access token: {0}")]
    TokenExchange(String),
}

/// A service-account key as downloaded from the cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccount {
    /// Parse a service-account JSON document.
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let account: ServiceAccount = serde_json::from_str(json)
            .map_err(|e| CredentialError::InvalidServiceAccount(e.to_string()))?;

        if account.project_id.is_empty() {
            return Err(CredentialError::InvalidServiceAccount(
                "\"project_id\" must be a non-empty string".into(),
            ));
        }
        if account.client_email.is_empty() {
            return Err(CredentialError::InvalidServiceAccount(
                "\"client_email\" must be a non-empty string".into(),
            ));
        }
        Ok(account)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

struct ServiceAccountTokens {
    account: ServiceAccount,
    key: EncodingKey,
    scope: String,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

enum Source {
    Static(String),
    ServiceAccount(ServiceAccountTokens),
}

/// Supplies bearer tokens to the REST clients.
///
/// Cheap to clone; clones share the cached token.
#[derive(Clone)]
pub struct TokenSource {
    source: Arc<Source>,
}

impl TokenSource {
    /// A source that always yields the same token.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            source: Arc::new(Source::Static(token.into())),
        }
    }

    /// The fixed token accepted by the local emulators.
    pub fn emulator() -> Self {
        Self::fixed(EMULATOR_TOKEN)
    }

    /// A source that mints tokens for the given service account.
    pub fn from_service_account(account: ServiceAccount) -> Result<Self, CredentialError> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| CredentialError::InvalidPrivateKey(e.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CredentialError::TokenExchange(e.to_string()))?;

        info!(
            "Using service account {} for project {}",
            account.client_email, account.project_id
        );
        Ok(Self {
            source: Arc::new(Source::ServiceAccount(ServiceAccountTokens {
                account,
                key,
                scope: DEFAULT_SCOPES.join(" "),
                client,
                cached: Mutex::new(None),
            })),
        })
    }

    /// Return a valid access token, minting a new one when needed.
    pub async fn access_token(&self) -> Result<String, CredentialError> {
        match self.source.as_ref() {
            Source::Static(token) => Ok(token.clone()),
            Source::ServiceAccount(tokens) => tokens.access_token().await,
        }
    }
}

impl ServiceAccountTokens {
    async fn access_token(&self) -> Result<String, CredentialError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - REFRESH_MARGIN_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let token = self.exchange(now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: i64) -> Result<String, CredentialError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.account.private_key_id.clone();

        let claims = AssertionClaims {
            iss: &self.account.client_email,
            scope: self.scope.clone(),
            aud: &self.account.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        jsonwebtoken::encode(&header, &claims, &self.key)
            .map_err(|e| CredentialError::Signing(e.to_string()))
    }

    async fn exchange(&self, now: i64) -> Result<CachedToken, CredentialError> {
        let assertion = self.assertion(now)?;
        debug!("Requesting access token from {}", self.account.token_uri);

        let response = self
            .client
            .post(&self.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| CredentialError::TokenExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::TokenExchange(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::TokenExchange(e.to_string()))?;

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS),
        })
    }
}
