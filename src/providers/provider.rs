//! Identity provider trait.
//!
//! This module defines the operations the gateway needs from a managed
//! identity service. Implementations own every rule about user records
//! (email format, uniqueness, password strength, paging); the gateway only
//! forwards requests and shapes responses.
//!
//! # Key Types
//!
//! - [`IdentityProvider`] - Trait for identity backends
//!
//! # Examples
//!
//! ```rust
//! use directory_gateway::providers::{
//!     CreateUserRequest, IdentityProvider, InMemoryIdentityProvider,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = InMemoryIdentityProvider::new();
//! let user = provider
//!     .create_user(CreateUserRequest::new("a@b.com", "secret123"))
//!     .await?;
//! let fetched = provider.get_user(&user.uid).await?;
//! assert_eq!(fetched.email.as_deref(), Some("a@b.com"));
//! # Ok(())
//! # }
//! ```

use super::{CreateUserRequest, ListUsersPage, ProviderError, UpdateUserRequest, UserRecord};
use std::future::Future;

/// Largest page the identity provider will return from one listing call.
pub const MAX_LIST_USERS_RESULTS: usize = 1000;

/// Operations over a managed user directory.
///
/// All operations are async and must be safe to call concurrently from many
/// request handlers sharing one provider instance.
pub trait IdentityProvider: Send + Sync {
    /// Create a user from exactly the given fields.
    ///
    /// # Returns
    /// The record as stored, including the provider-assigned `uid`.
    fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> impl Future<Output = Result<UserRecord, ProviderError>> + Send;

    /// Look up a user by identifier.
    ///
    /// Fails with [`ProviderError::UserNotFound`] if no such user exists.
    fn get_user(&self, uid: &str)
    -> impl Future<Output = Result<UserRecord, ProviderError>> + Send;

    /// Apply a partial update and return the updated record.
    fn update_user(
        &self,
        uid: &str,
        request: UpdateUserRequest,
    ) -> impl Future<Output = Result<UserRecord, ProviderError>> + Send;

    /// Delete a user. Deleting an unknown identifier is an error.
    fn delete_user(&self, uid: &str) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Fetch one page of users.
    ///
    /// # Arguments
    /// * `max_results` - Page size, at most [`MAX_LIST_USERS_RESULTS`]
    /// * `page_token` - Cursor from the previous page, `None` for the first page
    ///
    /// # Returns
    /// The page, with a cursor if more users follow.
    fn list_users(
        &self,
        max_results: usize,
        page_token: Option<&str>,
    ) -> impl Future<Output = Result<ListUsersPage, ProviderError>> + Send;
}
