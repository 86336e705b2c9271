//! In-memory identity provider.
//!
//! A thread-safe stand-in for the managed identity service, used by the test
//! suite and by the gateway binary when `DIRECTORY_BACKEND=memory`. It applies
//! the same input rules the real provider does, so gateway behavior observed
//! against it carries over.
//!
//! # Ordering and paging
//!
//! Users are kept in a `BTreeMap` keyed by uid, so listings come back in uid
//! order. The page token is the URL-safe base64 encoding of the last uid of
//! the previous page.

use super::{
    CreateUserRequest, IdentityProvider, ListUsersPage, MAX_LIST_USERS_RESULTS, ProviderError,
    UpdateUserRequest, UserMetadata, UserRecord, format_timestamp,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use log::{debug, trace};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

const MAX_UID_LENGTH: usize = 128;
const MIN_PASSWORD_LENGTH: usize = 6;

/// Thread-safe in-memory user directory.
///
/// Clones share the same underlying directory.
#[derive(Clone, Default)]
pub struct InMemoryIdentityProvider {
    users: Arc<RwLock<BTreeMap<String, UserRecord>>>,
}

impl InMemoryIdentityProvider {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users currently provisioned.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Remove every user (useful for testing).
    pub async fn clear(&self) {
        self.users.write().await.clear();
    }

    /// Stamp the user's last sign-in time with the current instant.
    pub async fn record_sign_in(&self, uid: &str) -> Result<(), ProviderError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(uid).ok_or_else(|| ProviderError::UserNotFound {
            uid: uid.to_string(),
        })?;
        user.metadata.last_sign_in_time = Some(format_timestamp(Utc::now()));
        Ok(())
    }

    fn validate_uid(uid: &str) -> Result<(), ProviderError> {
        if uid.is_empty() || uid.chars().count() > MAX_UID_LENGTH {
            return Err(ProviderError::InvalidUid);
        }
        Ok(())
    }

    fn validate_email(email: &str) -> Result<(), ProviderError> {
        let mut parts = email.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(ProviderError::InvalidEmail),
        }
    }

    fn validate_password(password: &str) -> Result<(), ProviderError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ProviderError::InvalidPassword);
        }
        Ok(())
    }

    fn validate_phone_number(phone_number: &str) -> Result<(), ProviderError> {
        match phone_number.strip_prefix('+') {
            Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                Ok(())
            }
            _ => Err(ProviderError::InvalidPhoneNumber),
        }
    }

    fn decode_page_token(token: &str) -> Result<String, ProviderError> {
        if token.is_empty() {
            return Err(ProviderError::InvalidPageToken);
        }
        URL_SAFE_NO_PAD
            .decode(token)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or(ProviderError::InvalidPageToken)
    }

    fn encode_page_token(last_uid: &str) -> String {
        URL_SAFE_NO_PAD.encode(last_uid)
    }
}

fn email_taken(users: &BTreeMap<String, UserRecord>, email: &str, except_uid: Option<&str>) -> bool {
    users.values().any(|user| {
        Some(user.uid.as_str()) != except_uid
            && user
                .email
                .as_deref()
                .is_some_and(|existing| existing.eq_ignore_ascii_case(email))
    })
}

fn phone_taken(users: &BTreeMap<String, UserRecord>, phone: &str, except_uid: &str) -> bool {
    users
        .values()
        .any(|user| user.uid != except_uid && user.phone_number.as_deref() == Some(phone))
}

impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_user(&self, request: CreateUserRequest) -> Result<UserRecord, ProviderError> {
        if let Some(uid) = &request.uid {
            Self::validate_uid(uid)?;
        }
        if let Some(email) = &request.email {
            Self::validate_email(email)?;
        }
        if let Some(password) = &request.password {
            Self::validate_password(password)?;
        }

        let email = request.email.map(|email| email.to_lowercase());
        let mut users = self.users.write().await;

        if let Some(email) = &email {
            if email_taken(&users, email, None) {
                return Err(ProviderError::EmailAlreadyExists {
                    email: email.clone(),
                });
            }
        }

        let uid = match request.uid {
            Some(uid) if users.contains_key(&uid) => return Err(ProviderError::UidAlreadyExists),
            Some(uid) => uid,
            None => uuid::Uuid::new_v4().simple().to_string(),
        };
        let record = UserRecord {
            uid: uid.clone(),
            email,
            email_verified: false,
            display_name: request.display_name,
            photo_url: None,
            phone_number: None,
            disabled: false,
            metadata: UserMetadata {
                creation_time: Some(format_timestamp(Utc::now())),
                last_sign_in_time: None,
            },
        };
        users.insert(uid.clone(), record.clone());

        debug!("Created user {}", uid);
        trace!("Created user record: {:?}", record);
        Ok(record)
    }

    async fn get_user(&self, uid: &str) -> Result<UserRecord, ProviderError> {
        Self::validate_uid(uid)?;
        debug!("Looking up user {}", uid);

        self.users
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(|| ProviderError::UserNotFound {
                uid: uid.to_string(),
            })
    }

    async fn update_user(
        &self,
        uid: &str,
        request: UpdateUserRequest,
    ) -> Result<UserRecord, ProviderError> {
        Self::validate_uid(uid)?;
        if let Some(email) = &request.email {
            Self::validate_email(email)?;
        }
        if let Some(password) = &request.password {
            Self::validate_password(password)?;
        }
        if let Some(Some(phone_number)) = &request.phone_number {
            Self::validate_phone_number(phone_number)?;
        }

        let mut users = self.users.write().await;
        if !users.contains_key(uid) {
            return Err(ProviderError::UserNotFound {
                uid: uid.to_string(),
            });
        }

        let email = request.email.map(|email| email.to_lowercase());
        if let Some(email) = &email {
            if email_taken(&users, email, Some(uid)) {
                return Err(ProviderError::EmailAlreadyExists {
                    email: email.clone(),
                });
            }
        }
        if let Some(Some(phone_number)) = &request.phone_number {
            if phone_taken(&users, phone_number, uid) {
                return Err(ProviderError::PhoneNumberAlreadyExists);
            }
        }

        let user = users
            .get_mut(uid)
            .ok_or_else(|| ProviderError::UserNotFound {
                uid: uid.to_string(),
            })?;

        if email.is_some() {
            user.email = email;
            user.email_verified = false;
        }
        if let Some(display_name) = request.display_name {
            user.display_name = display_name;
        }
        if let Some(photo_url) = request.photo_url {
            user.photo_url = photo_url;
        }
        if let Some(phone_number) = request.phone_number {
            user.phone_number = phone_number;
        }
        if let Some(email_verified) = request.email_verified {
            user.email_verified = email_verified;
        }
        if let Some(disabled) = request.disabled {
            user.disabled = disabled;
        }

        debug!("Updated user {}", uid);
        Ok(user.clone())
    }

    async fn delete_user(&self, uid: &str) -> Result<(), ProviderError> {
        Self::validate_uid(uid)?;

        match self.users.write().await.remove(uid) {
            Some(_) => {
                debug!("Deleted user {}", uid);
                Ok(())
            }
            None => Err(ProviderError::UserNotFound {
                uid: uid.to_string(),
            }),
        }
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
        let cursor = page_token.map(Self::decode_page_token).transpose()?;

        let users = self.users.read().await;
        let lower = match cursor.as_deref() {
            Some(last_uid) => Bound::Excluded(last_uid),
            None => Bound::Unbounded,
        };

        // One extra record tells us whether another page follows.
        let mut page: Vec<UserRecord> = users
            .range::<str, _>((lower, Bound::Unbounded))
            .take(max_results + 1)
            .map(|(_, user)| user.clone())
            .collect();

        let page_token = if page.len() > max_results {
            page.truncate(max_results);
            page.last().map(|user| Self::encode_page_token(&user.uid))
        } else {
            None
        };

        debug!(
            "Listed {} users (more pages: {})",
            page.len(),
            page_token.is_some()
        );
        Ok(ListUsersPage {
            users: page,
            page_token,
        })
    }
}
