//! Error type for identity provider implementations.
//!
//! The `Display` text of each variant is the identity provider's own message
//! and is shown to callers verbatim.

use crate::credentials::CredentialError;
use thiserror::Error;

/// Errors that can occur during identity provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("There is no user record corresponding to the provided identifier.")]
    UserNotFound {
        /// The identifier that was looked up
        uid: String,
    },

    #[error("The email address is already in use by another account.")]
    EmailAlreadyExists {
        /// The duplicate address
        email: String,
    },

    #[error("The user with the provided phone number already exists.")]
    PhoneNumberAlreadyExists,

    #[error("The user with the provided uid already exists.")]
    UidAlreadyExists,

    #[error("The email address is improperly formatted.")]
    InvalidEmail,

    #[error("The password must be a string with at least 6 characters.")]
    InvalidPassword,

    #[error("The uid must be a non-empty string with at most 128 characters.")]
    InvalidUid,

    #[error("The phone number must be a non-empty E.164 standard compliant identifier string.")]
    InvalidPhoneNumber,

    #[error("The page token must be a valid non-empty string.")]
    InvalidPageToken,

    #[error("{message}")]
    InvalidArgument {
        /// Description of the rejected argument
        message: String,
    },

    #[error("Credential implementation provided to initializeApp() failed: {0}")]
    Credential(#[from] CredentialError),

    #[error("Error while making request: {0}")]
    Transport(String),

    #[error("{message}")]
    Unexpected {
        /// Provider error code, when one was returned
        code: Option<String>,
        /// Description of the failure
        message: String,
    },
}

impl ProviderError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ProviderError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether this error means the identifier names no user.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::UserNotFound { .. })
    }

    /// Map an Identity Toolkit error code (e.g. `EMAIL_EXISTS`,
    /// `WEAK_PASSWORD : Password should be at least 6 characters`) to an error.
    pub fn from_service_code(code: &str, uid: Option<&str>, email: Option<&str>) -> Self {
        let name = code.split(':').next().unwrap_or(code).trim();
        match name {
            "USER_NOT_FOUND" => ProviderError::UserNotFound {
                uid: uid.unwrap_or_default().to_string(),
            },
            "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => ProviderError::EmailAlreadyExists {
                email: email.unwrap_or_default().to_string(),
            },
            "PHONE_NUMBER_EXISTS" | "DUPLICATE_PHONE_NUMBER" => {
                ProviderError::PhoneNumberAlreadyExists
            }
            "DUPLICATE_LOCAL_ID" | "UID_ALREADY_EXISTS" => ProviderError::UidAlreadyExists,
            "INVALID_EMAIL" => ProviderError::InvalidEmail,
            "WEAK_PASSWORD" | "INVALID_PASSWORD" => ProviderError::InvalidPassword,
            "INVALID_LOCAL_ID" | "INVALID_UID" => ProviderError::InvalidUid,
            "INVALID_PHONE_NUMBER" => ProviderError::InvalidPhoneNumber,
            "INVALID_PAGE_SELECTION" | "INVALID_PAGE_TOKEN" => ProviderError::InvalidPageToken,
            _ => ProviderError::Unexpected {
                code: Some(name.to_string()),
                message: format!("An internal error has occurred. Raw server response: \"{code}\""),
            },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}
