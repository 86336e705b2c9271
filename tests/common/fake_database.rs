//! Minimal Realtime Database REST endpoint serving a fixed JSON tree.

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct FakeDatabase {
    root: Arc<Value>,
    token: String,
    /// When set, requests must carry `?ns=` with this value.
    namespace: Option<String>,
}

impl FakeDatabase {
    pub fn new(root: Value, token: &str) -> Self {
        Self {
            root: Arc::new(root),
            token: token.to_string(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/*path", get(read))
            .with_state(self.clone())
    }
}

async fn read(
    State(database): State<FakeDatabase>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let expected = format!("Bearer {}", database.token);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Permission denied"})),
        );
    }
    if database.namespace.is_some() && query.get("ns") != database.namespace.as_ref() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Namespace not found"})),
        );
    }

    let Some(path) = path.strip_suffix(".json") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid path: must end in .json"})),
        );
    };

    let node = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .try_fold(database.root.as_ref(), |node, segment| node.get(segment));
    (StatusCode::OK, Json(node.cloned().unwrap_or(Value::Null)))
}
