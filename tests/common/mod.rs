//! Shared helpers for the integration tests.
//!
//! - `fake_toolkit` - an in-process Identity Toolkit REST endpoint
//! - `fake_database` - an in-process Realtime Database REST endpoint
//! - request helpers that drive a router with `oneshot`

#![allow(dead_code)]

pub mod fake_database;
pub mod fake_toolkit;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode, header};
use directory_gateway::providers::{
    CreateUserRequest, IdentityProvider, InMemoryIdentityProvider, ListUsersPage, ProviderError,
    UpdateUserRequest, UserRecord,
};
use directory_gateway::store::{InMemoryTreeStore, Snapshot, StoreError, TreeStore};
use directory_gateway::{DirectoryGateway, server};
use http_body_util::BodyExt;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

pub type MemoryGateway = DirectoryGateway<InMemoryIdentityProvider, InMemoryTreeStore>;

pub fn memory_gateway() -> Arc<MemoryGateway> {
    Arc::new(DirectoryGateway::new(
        InMemoryIdentityProvider::new(),
        InMemoryTreeStore::new(),
    ))
}

/// A response with its body fully read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!("body is not JSON ({}): {}", e, self.text());
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Send one request through the router.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    send_request(app, request).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response.into_body().collect().await.unwrap().to_bytes();

    TestResponse {
        status,
        content_type,
        body,
    }
}

pub fn app<P, S>(gateway: Arc<DirectoryGateway<P, S>>) -> Router
where
    P: IdentityProvider + 'static,
    S: TreeStore + 'static,
{
    server::router(gateway)
}

/// Serve `router` on an ephemeral local port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A store whose reads always fail.
pub struct UnreachableStore;

impl TreeStore for UnreachableStore {
    async fn read(&self, _path: &str) -> Result<Snapshot, StoreError> {
        Err(StoreError::Transport("connection refused".into()))
    }
}

/// Wraps the in-memory directory and fails listing from the given page on.
pub struct FlakyListingProvider {
    pub inner: InMemoryIdentityProvider,
    pub fail_from_page: usize,
    pub calls: std::sync::atomic::AtomicUsize,
}

impl FlakyListingProvider {
    pub fn new(inner: InMemoryIdentityProvider, fail_from_page: usize) -> Self {
        Self {
            inner,
            fail_from_page,
            calls: Default::default(),
        }
    }
}

impl IdentityProvider for FlakyListingProvider {
    async fn create_user(&self, request: CreateUserRequest) -> Result<UserRecord, ProviderError> {
        self.inner.create_user(request).await
    }

    async fn get_user(&self, uid: &str) -> Result<UserRecord, ProviderError> {
        self.inner.get_user(uid).await
    }

    async fn update_user(
        &self,
        uid: &str,
        request: UpdateUserRequest,
    ) -> Result<UserRecord, ProviderError> {
        self.inner.update_user(uid, request).await
    }

    async fn delete_user(&self, uid: &str) -> Result<(), ProviderError> {
        self.inner.delete_user(uid).await
    }

    async fn list_users(
        &self,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<ListUsersPage, ProviderError> {
        let page = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        if page >= self.fail_from_page {
            return Err(ProviderError::Transport("socket hang up".into()));
        }
        self.inner.list_users(max_results, page_token).await
    }
}

/// Provision `count` users directly in the provider.
pub async fn provision(provider: &InMemoryIdentityProvider, count: usize) -> Vec<String> {
    let mut uids = Vec::with_capacity(count);
    for i in 0..count {
        let user = provider
            .create_user(CreateUserRequest::new(
                format!("user{}@example.com", i),
                "secret123",
            ))
            .await
            .unwrap();
        uids.push(user.uid);
    }
    uids
}
