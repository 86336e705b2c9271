//! User record types exchanged with identity providers.
//!
//! The JSON shape of [`UserRecord`] matches what the identity provider's admin
//! SDK returns, so records can be handed to callers unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Timestamp format used by the identity provider for record metadata.
const PROVIDER_TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Render a UTC instant the way the identity provider does
/// (`Mon, 19 Oct 2026 10:00:00 GMT`).
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(PROVIDER_TIMESTAMP_FORMAT).to_string()
}

/// A user as stored by the identity provider.
///
/// The password is write-only and never part of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    pub metadata: UserMetadata,
}

/// Provider-assigned lifecycle timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetadata {
    #[serde(default)]
    pub creation_time: Option<String>,
    /// `None` when the user has never signed in.
    #[serde(default)]
    pub last_sign_in_time: Option<String>,
}

/// One page of a provider listing.
#[derive(Debug, Clone, Default)]
pub struct ListUsersPage {
    pub users: Vec<UserRecord>,
    /// Continuation cursor; absent on the last page.
    pub page_token: Option<String>,
}

/// Fields accepted when creating a user.
///
/// Every field is optional here: whether a missing email or password is
/// acceptable is the provider's decision, not the gateway's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Caller-chosen identifier; the provider assigns one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl CreateUserRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uid: None,
            email: Some(email.into()),
            password: Some(password.into()),
            display_name: None,
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// A partial update. Absent fields are left untouched.
///
/// For the clearable attributes the outer `Option` tells whether the field was
/// sent at all and the inner one whether it was `null`, which removes the
/// attribute from the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub display_name: Option<Option<String>>,
    #[serde(default, rename = "photoURL", deserialize_with = "present")]
    pub photo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub phone_number: Option<Option<String>>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub disabled: Option<bool>,
}

impl UpdateUserRequest {
    pub fn display_name(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(Some(display_name.into())),
            ..Self::default()
        }
    }

    /// True when the update carries no field at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// A field that is present in the body, possibly as `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
