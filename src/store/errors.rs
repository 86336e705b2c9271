//! Errors raised while reading the hierarchical store.
//!
//! These describe transport and data failures only. Whether a failed read is
//! fatal for a request is decided by the gateway.

use crate::credentials::CredentialError;
use std::fmt;

/// Errors that can occur during a store read.
#[derive(Debug)]
pub enum StoreError {
    /// The path cannot address a node (empty segment or forbidden character).
    InvalidPath { path: String, reason: String },

    /// No access token could be obtained.
    Credential(CredentialError),

    /// The request never produced a response.
    Transport(String),

    /// The store answered with a non-success status.
    Status { status: u16, message: String },

    /// The response body was not valid JSON.
    InvalidResponse(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidPath { path, reason } => {
                write!(f, "Invalid database path \"{}\": {}", path, reason)
            }
            StoreError::Credential(err) => write!(f, "{}", err),
            StoreError::Transport(message) => {
                write!(f, "Error while reading database: {}", message)
            }
            StoreError::Status { status, message } => {
                write!(f, "Database read failed with status {}: {}", status, message)
            }
            StoreError::InvalidResponse(message) => {
                write!(f, "Invalid database response: {}", message)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Credential(err) => Some(err),
            _ => None,
        }
    }
}

impl StoreError {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<CredentialError> for StoreError {
    fn from(err: CredentialError) -> Self {
        StoreError::Credential(err)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::InvalidResponse(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}
