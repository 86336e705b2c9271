//! Identity Toolkit REST client.
//!
//! Talks to the managed identity service over its v1 REST API, scoped to one
//! project. Every call carries a bearer token from a [`TokenSource`]. Error
//! codes returned by the service (`EMAIL_EXISTS`, `USER_NOT_FOUND`, ...) are
//! translated to [`ProviderError`] variants whose messages match what the
//! service's admin SDK reports.
//!
//! Point the client at a local emulator with [`FirebaseAuthProvider::emulator`].

use super::{
    CreateUserRequest, IdentityProvider, ListUsersPage, MAX_LIST_USERS_RESULTS, ProviderError,
    UpdateUserRequest, UserMetadata, UserRecord, format_timestamp,
};
use crate::credentials::TokenSource;
use chrono::DateTime;
use log::{debug, info, trace, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const MAX_UID_LENGTH: usize = 128;

/// Identity provider backed by the Identity Toolkit REST API.
#[derive(Clone)]
pub struct FirebaseAuthProvider {
    client: reqwest::Client,
    project_url: String,
    tokens: TokenSource,
}

impl FirebaseAuthProvider {
    /// Client for the production service.
    pub fn new(project_id: &str, tokens: TokenSource) -> Result<Self, ProviderError> {
        Self::with_base_url(IDENTITY_TOOLKIT_URL, project_id, tokens)
    }

    /// Client for an Auth emulator listening on `host` (e.g. `localhost:9099`).
    pub fn emulator(host: &str, project_id: &str) -> Result<Self, ProviderError> {
        let base_url = format!("http://{}/identitytoolkit.googleapis.com/v1", host);
        Self::with_base_url(&base_url, project_id, TokenSource::emulator())
    }

    /// Client for an arbitrary API root (the part before `/projects/...`).
    pub fn with_base_url(
        base_url: &str,
        project_id: &str,
        tokens: TokenSource,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let project_url = format!("{}/projects/{}", base_url.trim_end_matches('/'), project_id);
        info!("Identity provider endpoint: {}", project_url);

        Ok(Self {
            client,
            project_url,
            tokens,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.project_url, method)
    }

    async fn post<R: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        context: ErrorContext<'_>,
    ) -> Result<R, ProviderError> {
        trace!("POST {} {}", method, body);
        let request = self.client.post(self.endpoint(method)).json(body);
        self.send(request, context).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: ErrorContext<'_>,
    ) -> Result<R, ProviderError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<R>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let err = service_error(status.as_u16(), &body, context);
        warn!("Identity provider returned {}: {}", status, err);
        Err(err)
    }

    async fn lookup(&self, uid: &str) -> Result<UserRecord, ProviderError> {
        let context = ErrorContext::for_uid(uid);
        let response: LookupResponse = self
            .post("accounts:lookup", &json!({ "localId": [uid] }), context)
            .await?;

        response
            .users
            .into_iter()
            .next()
            .map(UserRecord::from)
            .ok_or_else(|| ProviderError::UserNotFound {
                uid: uid.to_string(),
            })
    }
}

fn validate_uid(uid: &str) -> Result<(), ProviderError> {
    if uid.is_empty() || uid.chars().count() > MAX_UID_LENGTH {
        return Err(ProviderError::InvalidUid);
    }
    Ok(())
}

/// Identifiers echoed back in error values.
#[derive(Debug, Clone, Copy, Default)]
struct ErrorContext<'a> {
    uid: Option<&'a str>,
    email: Option<&'a str>,
}

impl<'a> ErrorContext<'a> {
    fn for_uid(uid: &'a str) -> Self {
        Self {
            uid: Some(uid),
            email: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceErrorEnvelope {
    error: ServiceErrorBody,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: String,
}

fn service_error(status: u16, body: &str, context: ErrorContext<'_>) -> ProviderError {
    match serde_json::from_str::<ServiceErrorEnvelope>(body) {
        Ok(envelope) => {
            ProviderError::from_service_code(&envelope.error.message, context.uid, context.email)
        }
        Err(_) => ProviderError::Unexpected {
            code: None,
            message: format!(
                "Unexpected response with status: {} and body: {}",
                status, body
            ),
        },
    }
}

/// User shape returned by `accounts:lookup` and `accounts:batchGet`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    disabled: bool,
    /// Milliseconds since the epoch, as a decimal string.
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    last_login_at: Option<String>,
}

fn millis_to_timestamp(millis: Option<&str>) -> Option<String> {
    let millis = millis?.parse::<i64>().ok()?;
    DateTime::from_timestamp_millis(millis).map(format_timestamp)
}

impl From<ServiceUser> for UserRecord {
    fn from(user: ServiceUser) -> Self {
        UserRecord {
            metadata: UserMetadata {
                creation_time: millis_to_timestamp(user.created_at.as_deref()),
                last_sign_in_time: millis_to_timestamp(user.last_login_at.as_deref()),
            },
            uid: user.local_id,
            email: user.email,
            email_verified: user.email_verified,
            display_name: user.display_name,
            photo_url: user.photo_url,
            phone_number: user.phone_number,
            disabled: user.disabled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<ServiceUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    users: Vec<ServiceUser>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetQuery<'a> {
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_page_token: Option<&'a str>,
}

/// Body of `accounts:update` for a partial update.
fn update_body(uid: &str, request: UpdateUserRequest) -> Value {
    let mut body = Map::new();
    let mut delete_attributes = Vec::new();
    let mut delete_providers = Vec::new();

    body.insert("localId".into(), json!(uid));
    if let Some(email) = request.email {
        body.insert("email".into(), json!(email));
    }
    if let Some(password) = request.password {
        body.insert("password".into(), json!(password));
    }
    match request.display_name {
        Some(Some(display_name)) => {
            body.insert("displayName".into(), json!(display_name));
        }
        Some(None) => delete_attributes.push("DISPLAY_NAME"),
        None => {}
    }
    match request.photo_url {
        Some(Some(photo_url)) => {
            body.insert("photoUrl".into(), json!(photo_url));
        }
        Some(None) => delete_attributes.push("PHOTO_URL"),
        None => {}
    }
    match request.phone_number {
        Some(Some(phone_number)) => {
            body.insert("phoneNumber".into(), json!(phone_number));
        }
        Some(None) => delete_providers.push("phone"),
        None => {}
    }
    if let Some(email_verified) = request.email_verified {
        body.insert("emailVerified".into(), json!(email_verified));
    }
    if let Some(disabled) = request.disabled {
        body.insert("disableUser".into(), json!(disabled));
    }
    if !delete_attributes.is_empty() {
        body.insert("deleteAttribute".into(), json!(delete_attributes));
    }
    if !delete_providers.is_empty() {
        body.insert("deleteProvider".into(), json!(delete_providers));
    }

    Value::Object(body)
}

impl IdentityProvider for FirebaseAuthProvider {
    async fn create_user(&self, request: CreateUserRequest) -> Result<UserRecord, ProviderError> {
        if let Some(uid) = &request.uid {
            validate_uid(uid)?;
        }
        let mut body = serde_json::to_value(&request)
            .map_err(|e| ProviderError::invalid_argument(e.to_string()))?;
        if let Some(uid) = body.as_object_mut().and_then(|fields| fields.remove("uid")) {
            body["localId"] = uid;
        }
        let context = ErrorContext {
            uid: request.uid.as_deref(),
            email: request.email.as_deref(),
        };

        let created: SignUpResponse = self.post("accounts", &body, context).await?;
        debug!("Created user {}", created.local_id);
        self.lookup(&created.local_id).await
    }

    async fn get_user(&self, uid: &str) -> Result<UserRecord, ProviderError> {
        validate_uid(uid)?;
        debug!("Looking up user {}", uid);
        self.lookup(uid).await
    }

    async fn update_user(
        &self,
        uid: &str,
        request: UpdateUserRequest,
    ) -> Result<UserRecord, ProviderError> {
        validate_uid(uid)?;
        let email = request.email.clone();
        let context = ErrorContext {
            uid: Some(uid),
            email: email.as_deref(),
        };

        let _: Value = self
            .post("accounts:update", &update_body(uid, request), context)
            .await?;
        debug!("Updated user {}", uid);
        self.lookup(uid).await
    }

    async fn delete_user(&self, uid: &str) -> Result<(), ProviderError> {
        validate_uid(uid)?;

        let _: Value = self
            .post(
                "accounts:delete",
                &json!({ "localId": uid }),
                ErrorContext::for_uid(uid),
            )
            .await?;
        debug!("Deleted user {}", uid);
        Ok(())
    }

    async fn list_users(
        &self,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<ListUsersPage, ProviderError> {
        if max_results == 0 || max_results > MAX_LIST_USERS_RESULTS {
            return Err(ProviderError::invalid_argument(format!(
                "Required \"maxResults\" must be a positive integer that does not exceed {}.",
                MAX_LIST_USERS_RESULTS
            )));
        }
        if page_token.is_some_and(str::is_empty) {
            return Err(ProviderError::InvalidPageToken);
        }

        let query = BatchGetQuery {
            max_results,
            next_page_token: page_token,
        };
        let request = self
            .client
            .get(self.endpoint("accounts:batchGet"))
            .query(&query);
        let response: BatchGetResponse = self.send(request, ErrorContext::default()).await?;

        debug!(
            "Fetched page of {} users (more pages: {})",
            response.users.len(),
            response.next_page_token.is_some()
        );
        Ok(ListUsersPage {
            users: response.users.into_iter().map(UserRecord::from).collect(),
            page_token: response.next_page_token.filter(|token| !token.is_empty()),
        })
    }
}
