//! HTTP directory gateway for a managed identity provider.
//!
//! Exposes user create, read, update, delete and full listing over a thin
//! JSON API, plus a per-user stored-size report computed from a hierarchical
//! key-value store. The gateway keeps no state of its own; every request is
//! forwarded to the collaborators it was built with.
//!
//! # Core Components
//!
//! - [`DirectoryGateway`] - The gateway operations, generic over its collaborators
//! - [`IdentityProvider`] - Trait for user directories (in-memory or Identity Toolkit)
//! - [`TreeStore`] - Trait for snapshot reads of the key-value tree
//! - [`server::router`] - The axum router exposing the gateway over HTTP
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use directory_gateway::{DirectoryGateway, server};
//! use directory_gateway::providers::InMemoryIdentityProvider;
//! use directory_gateway::store::InMemoryTreeStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Arc::new(DirectoryGateway::new(
//!     InMemoryIdentityProvider::new(),
//!     InMemoryTreeStore::new(),
//! ));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! server::serve(listener, gateway, server::shutdown_signal()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod server;
pub mod store;

pub use config::{Backend, ConfigError, GatewayConfig};
pub use error::{ErrorFormat, FailureClass, GatewayError, GatewayResult, Operation};
pub use gateway::{DirectoryGateway, UserSizeReport, UserSummary};
pub use providers::{IdentityProvider, ProviderError, UserRecord};
pub use store::{Snapshot, StoreError, TreeStore};
