//! Realtime Database REST client.
//!
//! A read is a single `GET {database_url}/{path}.json`. The service answers
//! `null` for paths that hold no data.

use super::{Snapshot, StoreError, TreeStore, path_segments};
use crate::credentials::TokenSource;
use log::{debug, warn};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Tree store backed by the Realtime Database REST API.
#[derive(Clone)]
pub struct RealtimeDatabaseStore {
    client: reqwest::Client,
    base_url: Url,
    /// Database name, sent as `ns` when talking to an emulator.
    namespace: Option<String>,
    tokens: TokenSource,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    error: String,
}

impl RealtimeDatabaseStore {
    /// Client for the database at `database_url`
    /// (e.g. `https://my-project-default-rtdb.firebaseio.com`).
    pub fn new(database_url: &str, tokens: TokenSource) -> Result<Self, StoreError> {
        let base_url = parse_url(database_url)?;
        Self::build(base_url, None, tokens)
    }

    /// Client for a Database emulator on `host`, serving the database named
    /// in `database_url`.
    pub fn emulator(host: &str, database_url: &str) -> Result<Self, StoreError> {
        let namespace = namespace_from_url(&parse_url(database_url)?)?;
        let base_url = parse_url(&format!("http://{}", host))?;
        Self::build(base_url, Some(namespace), TokenSource::emulator())
    }

    fn build(
        base_url: Url,
        namespace: Option<String>,
        tokens: TokenSource,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        debug!(
            "Database endpoint: {} (namespace: {:?})",
            base_url, namespace
        );
        Ok(Self {
            client,
            base_url,
            namespace,
            tokens,
        })
    }

    fn node_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StoreError::invalid_path(self.base_url.as_str(), "not a base URL"))?;
            path.pop_if_empty();
            match segments.split_last() {
                Some((last, parents)) => {
                    path.extend(parents);
                    path.push(&format!("{}.json", last));
                }
                None => {
                    path.push(".json");
                }
            }
        }
        if let Some(namespace) = &self.namespace {
            url.query_pairs_mut().append_pair("ns", namespace);
        }
        Ok(url)
    }
}

fn parse_url(url: &str) -> Result<Url, StoreError> {
    Url::parse(url).map_err(|e| StoreError::invalid_path(url, e.to_string()))
}

/// The database name is the first label of the database host.
fn namespace_from_url(url: &Url) -> Result<String, StoreError> {
    url.host_str()
        .and_then(|host| host.split('.').next())
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StoreError::invalid_path(url.as_str(), "database URL has no host"))
}

impl TreeStore for RealtimeDatabaseStore {
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError> {
        let segments = path_segments(path)?;
        let url = self.node_url(&segments)?;
        let token = self.tokens.access_token().await?;

        debug!("GET {}", url);
        let response = self.client.get(url).bearer_auth(token).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ServiceError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            warn!("Database read of /{} failed: {} {}", segments.join("/"), status, message);
            return Err(StoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = response.json().await?;
        Ok(Snapshot::new(value))
    }
}
