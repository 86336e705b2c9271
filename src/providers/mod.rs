//! Identity provider abstraction and implementations.
//!
//! # Available Providers
//!
//! * [`InMemoryIdentityProvider`] - In-process directory for tests and local runs
//! * [`FirebaseAuthProvider`] - Identity Toolkit REST client for production use
//!
//! Both implement [`IdentityProvider`], which is all the gateway depends on.

pub mod error;
pub mod firebase;
pub mod in_memory;
pub mod provider;
pub mod types;

pub use error::ProviderError;
pub use firebase::FirebaseAuthProvider;
pub use in_memory::InMemoryIdentityProvider;
pub use provider::{IdentityProvider, MAX_LIST_USERS_RESULTS};
pub use types::{
    CreateUserRequest, ListUsersPage, UpdateUserRequest, UserMetadata, UserRecord,
    format_timestamp,
};
