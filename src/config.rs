//! Process configuration read from environment variables.
//!
//! A `.env` file in the working directory is loaded first when present.
//! Parsing itself goes through [`GatewayConfig::from_lookup`], which takes any
//! key lookup, so it can be exercised without touching the process environment.

use crate::credentials::{CredentialError, ServiceAccount};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key} value \"{value}\"")]
    InvalidValue { key: &'static str, value: String },

    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Which collaborators back the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Identity Toolkit and Realtime Database, or their emulators.
    #[default]
    Firebase,
    /// In-process directory and tree, empty at start.
    Memory,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(Backend::Firebase),
            "memory" => Ok(Backend::Memory),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Firebase => f.write_str("firebase"),
            Backend::Memory => f.write_str("memory"),
        }
    }
}

/// Gateway settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    /// Service-account key JSON (`FIREBASE_SERVICE_ACCOUNT`).
    pub service_account_json: Option<String>,
    /// Project used when no service account is given (`FIREBASE_PROJECT_ID`).
    pub project_id: Option<String>,
    pub database_url: Option<String>,
    pub auth_emulator_host: Option<String>,
    pub database_emulator_host: Option<String>,
}

/// Resolved settings for the Firebase clients.
#[derive(Debug, Clone)]
pub struct FirebaseSettings {
    pub project_id: String,
    pub database_url: String,
    /// Absent only when every client talks to an emulator.
    pub service_account: Option<ServiceAccount>,
    pub auth_emulator_host: Option<String>,
    pub database_emulator_host: Option<String>,
}

impl GatewayConfig {
    /// Read configuration from the process environment, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value })?,
            None => DEFAULT_PORT,
        };

        let backend = match get("DIRECTORY_BACKEND") {
            Some(value) => value
                .parse::<Backend>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "DIRECTORY_BACKEND",
                    value,
                })?,
            None => Backend::default(),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            backend,
            service_account_json: get("FIREBASE_SERVICE_ACCOUNT"),
            project_id: get("FIREBASE_PROJECT_ID"),
            database_url: get("FIREBASE_DATABASE_URL"),
            auth_emulator_host: get("FIREBASE_AUTH_EMULATOR_HOST"),
            database_emulator_host: get("FIREBASE_DATABASE_EMULATOR_HOST"),
        })
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve the project, database URL and credentials for the Firebase
    /// backend.
    ///
    /// A service account is required unless both clients use emulators, in
    /// which case `FIREBASE_PROJECT_ID` names the project instead.
    pub fn firebase(&self) -> Result<FirebaseSettings, ConfigError> {
        let service_account = self
            .service_account_json
            .as_deref()
            .map(ServiceAccount::from_json)
            .transpose()?;

        let emulated = self.auth_emulator_host.is_some() && self.database_emulator_host.is_some();
        if service_account.is_none() && !emulated {
            return Err(ConfigError::Missing("FIREBASE_SERVICE_ACCOUNT"));
        }

        let project_id = match (&self.project_id, &service_account) {
            (Some(project_id), _) => project_id.clone(),
            (None, Some(account)) => account.project_id.clone(),
            (None, None) => return Err(ConfigError::Missing("FIREBASE_PROJECT_ID")),
        };

        let database_url = self
            .database_url
            .clone()
            .unwrap_or_else(|| default_database_url(&project_id));

        Ok(FirebaseSettings {
            project_id,
            database_url,
            service_account,
            auth_emulator_host: self.auth_emulator_host.clone(),
            database_emulator_host: self.database_emulator_host.clone(),
        })
    }
}

/// URL of a project's default Realtime Database instance.
pub fn default_database_url(project_id: &str) -> String {
    format!("https://{}-default-rtdb.firebaseio.com", project_id)
}
