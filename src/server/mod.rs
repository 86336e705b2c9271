//! HTTP surface of the gateway.
//!
//! | Method | Path                     | Operation         |
//! |--------|--------------------------|-------------------|
//! | GET    | `/`                      | status banner     |
//! | POST   | `/users`                 | create user       |
//! | GET    | `/users`                 | list all users    |
//! | GET    | `/users/size`            | per-user size     |
//! | PUT    | `/users/size`            | update uid `size` |
//! | DELETE | `/users/size`            | delete uid `size` |
//! | GET    | `/users/:uid`            | get user          |
//! | PUT    | `/users/:uid`            | update user       |
//! | DELETE | `/users/:uid`            | delete user       |
//! | GET    | `/users/:uid/timestamps` | timestamps HTML   |
//!
//! Request bodies that are empty or not sent as JSON read as `{}`.
//! Cross-origin requests are allowed from any origin.

pub mod handlers;
pub mod response;

pub use response::{ErrorResponse, MessageResponse, UserResponse};

use crate::gateway::DirectoryGateway;
use crate::providers::IdentityProvider;
use crate::store::TreeStore;
use axum::Router;
use axum::routing::get;
use log::{info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Build the router over a shared gateway.
pub fn router<P, S>(gateway: Arc<DirectoryGateway<P, S>>) -> Router
where
    P: IdentityProvider + 'static,
    S: TreeStore + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::status))
        .route(
            "/users",
            get(handlers::list_users::<P, S>).post(handlers::create_user::<P, S>),
        )
        .route(
            "/users/size",
            get(handlers::user_sizes::<P, S>)
                .put(handlers::update_size_user::<P, S>)
                .delete(handlers::delete_size_user::<P, S>),
        )
        .route(
            "/users/:uid",
            get(handlers::get_user::<P, S>)
                .put(handlers::update_user::<P, S>)
                .delete(handlers::delete_user::<P, S>),
        )
        .route(
            "/users/:uid/timestamps",
            get(handlers::user_timestamps::<P, S>),
        )
        .layer(cors)
        .with_state(gateway)
}

/// Serve requests on `listener` until `shutdown` resolves, then drain
/// in-flight requests.
pub async fn serve<P, S, F>(
    listener: TcpListener,
    gateway: Arc<DirectoryGateway<P, S>>,
    shutdown: F,
) -> std::io::Result<()>
where
    P: IdentityProvider + 'static,
    S: TreeStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Directory gateway listening on {}", addr);
    }

    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Directory gateway stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
