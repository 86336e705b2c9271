//! Minimal Identity Toolkit v1 endpoint backed by a map.
//!
//! Speaks the request and error shapes the real service uses for the five
//! account methods the gateway calls.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::any;
use axum::Json;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

pub const PROJECT_ID: &str = "demo-project";
pub const CREATED_AT_MILLIS: &str = "1760868303000";

#[derive(Clone)]
pub struct FakeToolkit {
    state: Arc<Mutex<ToolkitState>>,
    token: String,
}

#[derive(Default)]
struct ToolkitState {
    users: BTreeMap<String, Value>,
    next_id: usize,
    requests: Vec<String>,
}

type Reply = (StatusCode, Json<Value>);

fn service_error(status: StatusCode, message: &str) -> Reply {
    (
        status,
        Json(json!({
            "error": {
                "code": status.as_u16(),
                "message": message,
                "errors": [{"message": message, "domain": "global", "reason": "invalid"}]
            }
        })),
    )
}

impl FakeToolkit {
    /// A toolkit that accepts only `Bearer {token}`.
    pub fn new(token: &str) -> Self {
        Self {
            state: Arc::default(),
            token: token.to_string(),
        }
    }

    /// Routes for both the production layout and the emulator layout.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/v1/projects/:project/:method", any(dispatch))
            .route(
                "/identitytoolkit.googleapis.com/v1/projects/:project/:method",
                any(dispatch),
            )
            .with_state(self.clone())
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    /// Methods called so far, e.g. `accounts:lookup`.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Insert a user directly, bypassing validation.
    pub fn insert(&self, user: Value) {
        let uid = user["localId"].as_str().unwrap().to_string();
        self.state.lock().unwrap().users.insert(uid, user);
    }
}

async fn dispatch(
    State(toolkit): State<FakeToolkit>,
    Path((project, method)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Reply {
    let expected = format!("Bearer {}", toolkit.token);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return service_error(StatusCode::UNAUTHORIZED, "CREDENTIAL_MISMATCH");
    }
    if project != PROJECT_ID {
        return service_error(StatusCode::NOT_FOUND, "PROJECT_NOT_FOUND");
    }

    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let mut state = toolkit.state.lock().unwrap();
    state.requests.push(method.clone());

    match method.as_str() {
        "accounts" => sign_up(&mut state, &body),
        "accounts:lookup" => lookup(&state, &body),
        "accounts:update" => update(&mut state, &body),
        "accounts:delete" => delete(&mut state, &body),
        "accounts:batchGet" => batch_get(&state, &query),
        _ => service_error(StatusCode::NOT_FOUND, "METHOD_NOT_FOUND"),
    }
}

fn email_taken(state: &ToolkitState, email: &str, except: Option<&str>) -> bool {
    state
        .users
        .values()
        .any(|user| user["email"] == email && user["localId"].as_str() != except)
}

fn sign_up(state: &mut ToolkitState, body: &Value) -> Reply {
    if let Some(email) = body["email"].as_str() {
        if !email.contains('@') {
            return service_error(StatusCode::BAD_REQUEST, "INVALID_EMAIL");
        }
        if email_taken(state, email, None) {
            return service_error(StatusCode::BAD_REQUEST, "EMAIL_EXISTS");
        }
    }
    if let Some(password) = body["password"].as_str() {
        if password.len() < 6 {
            return service_error(
                StatusCode::BAD_REQUEST,
                "WEAK_PASSWORD : Password should be at least 6 characters",
            );
        }
    }

    let uid = match body["localId"].as_str() {
        Some(uid) if state.users.contains_key(uid) => {
            return service_error(StatusCode::BAD_REQUEST, "DUPLICATE_LOCAL_ID");
        }
        Some(uid) => uid.to_string(),
        None => {
            state.next_id += 1;
            format!("uid{:04}", state.next_id)
        }
    };
    let mut user = json!({
        "localId": uid,
        "emailVerified": false,
        "createdAt": CREATED_AT_MILLIS,
        "passwordHash": "UkVEQUNURUQ=",
    });
    for field in ["email", "displayName"] {
        if let Some(value) = body.get(field) {
            user[field] = value.clone();
        }
    }
    state.users.insert(uid.clone(), user);

    (
        StatusCode::OK,
        Json(json!({"kind": "identitytoolkit#SignupNewUserResponse", "localId": uid})),
    )
}

fn lookup(state: &ToolkitState, body: &Value) -> Reply {
    let users: Vec<Value> = body["localId"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|uid| uid.as_str())
        .filter_map(|uid| state.users.get(uid).cloned())
        .collect();

    // The service omits `users` entirely when nothing matched.
    let mut reply = json!({"kind": "identitytoolkit#GetAccountInfoResponse"});
    if !users.is_empty() {
        reply["users"] = Value::Array(users);
    }
    (StatusCode::OK, Json(reply))
}

fn update(state: &mut ToolkitState, body: &Value) -> Reply {
    let uid = body["localId"].as_str().unwrap_or_default().to_string();
    if let Some(email) = body["email"].as_str() {
        if email_taken(state, email, Some(&uid)) {
            return service_error(StatusCode::BAD_REQUEST, "EMAIL_EXISTS");
        }
    }
    let Some(user) = state.users.get_mut(&uid) else {
        return service_error(StatusCode::BAD_REQUEST, "USER_NOT_FOUND");
    };

    for field in ["email", "displayName", "photoUrl", "phoneNumber", "emailVerified"] {
        if let Some(value) = body.get(field) {
            user[field] = value.clone();
        }
    }
    if let Some(disabled) = body.get("disableUser") {
        user["disabled"] = disabled.clone();
    }
    let object = user.as_object_mut().unwrap();
    for attribute in body["deleteAttribute"].as_array().into_iter().flatten() {
        match attribute.as_str() {
            Some("DISPLAY_NAME") => object.remove("displayName"),
            Some("PHOTO_URL") => object.remove("photoUrl"),
            _ => None,
        };
    }
    if body["deleteProvider"]
        .as_array()
        .is_some_and(|providers| providers.iter().any(|p| p == "phone"))
    {
        object.remove("phoneNumber");
    }

    (
        StatusCode::OK,
        Json(json!({"kind": "identitytoolkit#SetAccountInfoResponse", "localId": uid})),
    )
}

fn delete(state: &mut ToolkitState, body: &Value) -> Reply {
    let uid = body["localId"].as_str().unwrap_or_default();
    match state.users.remove(uid) {
        Some(_) => (
            StatusCode::OK,
            Json(json!({"kind": "identitytoolkit#DeleteAccountResponse"})),
        ),
        None => service_error(StatusCode::BAD_REQUEST, "USER_NOT_FOUND"),
    }
}

fn batch_get(state: &ToolkitState, query: &HashMap<String, String>) -> Reply {
    let max_results: usize = match query.get("maxResults").map(|v| v.parse()) {
        Some(Ok(n)) if (1..=1000).contains(&n) => n,
        _ => return service_error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
    };

    let after = query.get("nextPageToken").cloned();
    let remaining: Vec<&Value> = state
        .users
        .iter()
        .filter(|(uid, _)| after.as_ref().is_none_or(|token| *uid > token))
        .map(|(_, user)| user)
        .collect();

    let page: Vec<Value> = remaining.iter().take(max_results).map(|u| (*u).clone()).collect();
    let mut reply = json!({"kind": "identitytoolkit#DownloadAccountResponse", "users": page});
    if remaining.len() > max_results {
        reply["nextPageToken"] = page
            .last()
            .map(|user| user["localId"].clone())
            .unwrap_or(Value::Null);
    }
    (StatusCode::OK, Json(reply))
}
