//! The directory gateway: user operations over an identity provider plus the
//! per-user storage report over the hierarchical store.
//!
//! The gateway holds no state of its own. Every operation forwards to a
//! collaborator, and every failure leaves as a [`GatewayError`] tagged with
//! the [`Operation`] that produced it.
//!
//! # Example Usage
//!
//! ```rust
//! use directory_gateway::gateway::DirectoryGateway;
//! use directory_gateway::providers::{CreateUserRequest, InMemoryIdentityProvider};
//! use directory_gateway::store::InMemoryTreeStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = DirectoryGateway::new(InMemoryIdentityProvider::new(), InMemoryTreeStore::new());
//!
//! let user = gateway
//!     .create_user(CreateUserRequest::new("a@b.com", "secret123"))
//!     .await?;
//! assert_eq!(gateway.get_user(&user.uid).await?.email.as_deref(), Some("a@b.com"));
//!
//! let everyone = gateway.list_all_users().await?;
//! assert_eq!(everyone.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod listing;
pub mod size;
pub mod timestamps;

pub use listing::{UserSummary, collect_all_users};
pub use size::{USERS_PATH, UserSizeReport, bytes_to_megabytes};
pub use timestamps::render_timestamps;

use crate::error::{GatewayResult, Operation, for_operation};
use crate::providers::{CreateUserRequest, IdentityProvider, UpdateUserRequest, UserRecord};
use crate::store::TreeStore;
use log::{debug, error, info, warn};

pub const USER_CREATED_MESSAGE: &str = "Usuário criado com sucesso";
pub const USER_UPDATED_MESSAGE: &str = "Usuário atualizado com sucesso";
pub const USER_DELETED_MESSAGE: &str = "Usuário excluído com sucesso";

/// User directory operations over an identity provider and a tree store.
pub struct DirectoryGateway<P, S> {
    provider: P,
    store: S,
}

impl<P, S> DirectoryGateway<P, S>
where
    P: IdentityProvider,
    S: TreeStore,
{
    pub fn new(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a user. The request goes to the provider as-is; validation is
    /// the provider's.
    pub async fn create_user(&self, request: CreateUserRequest) -> GatewayResult<UserRecord> {
        let user = self
            .provider
            .create_user(request)
            .await
            .inspect_err(|e| warn!("Create user rejected: {}", e))
            .map_err(for_operation(Operation::CreateUser))?;

        info!("Created user {}", user.uid);
        Ok(user)
    }

    pub async fn get_user(&self, uid: &str) -> GatewayResult<UserRecord> {
        debug!("Fetching user {}", uid);
        self.provider
            .get_user(uid)
            .await
            .map_err(for_operation(Operation::GetUser))
    }

    /// Apply a partial update and return the updated record.
    pub async fn update_user(
        &self,
        uid: &str,
        request: UpdateUserRequest,
    ) -> GatewayResult<UserRecord> {
        let user = self
            .provider
            .update_user(uid, request)
            .await
            .inspect_err(|e| warn!("Update of user {} rejected: {}", uid, e))
            .map_err(for_operation(Operation::UpdateUser))?;

        info!("Updated user {}", uid);
        Ok(user)
    }

    pub async fn delete_user(&self, uid: &str) -> GatewayResult<()> {
        self.provider
            .delete_user(uid)
            .await
            .inspect_err(|e| warn!("Delete of user {} rejected: {}", uid, e))
            .map_err(for_operation(Operation::DeleteUser))?;

        info!("Deleted user {}", uid);
        Ok(())
    }

    /// Every user in the directory, in provider order.
    pub async fn list_all_users(&self) -> GatewayResult<Vec<UserSummary>> {
        collect_all_users(&self.provider)
            .await
            .inspect_err(|e| error!("Listing users failed: {}", e))
            .map_err(for_operation(Operation::ListUsers))
    }

    /// HTML fragment with the user's creation and last sign-in times.
    pub async fn user_timestamps(&self, uid: &str) -> GatewayResult<String> {
        let user = self
            .provider
            .get_user(uid)
            .await
            .map_err(for_operation(Operation::UserTimestamps))?;

        Ok(render_timestamps(&user))
    }

    /// Size of each child of the `users` subtree, from a single read.
    pub async fn user_sizes(&self) -> GatewayResult<UserSizeReport> {
        let snapshot = self
            .store
            .read(USERS_PATH)
            .await
            .inspect_err(|e| error!("Reading user sizes failed: {}", e))
            .map_err(for_operation(Operation::UserSizes))?;

        let report = UserSizeReport::from_snapshot(&snapshot);
        debug!("Measured {} user records", report.len());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorFormat, GatewayErrorSource};
    use crate::providers::{InMemoryIdentityProvider, ProviderError};
    use crate::store::{InMemoryTreeStore, Snapshot, StoreError};
    use serde_json::json;

    type TestGateway = DirectoryGateway<InMemoryIdentityProvider, InMemoryTreeStore>;

    fn gateway() -> TestGateway {
        DirectoryGateway::new(InMemoryIdentityProvider::new(), InMemoryTreeStore::new())
    }

    struct FailingStore;

    impl TreeStore for FailingStore {
        async fn read(&self, _path: &str) -> Result<Snapshot, StoreError> {
            Err(StoreError::Transport("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let gateway = gateway();
        let created = gateway
            .create_user(CreateUserRequest::new("a@b.com", "secret123").with_display_name("Ana"))
            .await
            .unwrap();

        assert!(!created.uid.is_empty());
        let fetched = gateway.get_user(&created.uid).await.unwrap();
        assert_eq!(fetched.email.as_deref(), Some("a@b.com"));
        assert_eq!(fetched.display_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_create_rejection_is_bad_request() {
        let gateway = gateway();
        gateway
            .create_user(CreateUserRequest::new("a@b.com", "secret123"))
            .await
            .unwrap();

        let err = gateway
            .create_user(CreateUserRequest::new("a@b.com", "other-pass"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(
            err.message(),
            "The email address is already in use by another account."
        );

        let err = gateway
            .create_user(CreateUserRequest::new("c@d.com", "123"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(
            err.message(),
            "The password must be a string with at least 6 characters."
        );
    }

    #[tokio::test]
    async fn test_unknown_uid() {
        let gateway = gateway();

        let err = gateway.get_user("ghost").await.unwrap_err();
        assert_eq!(err.status(), 404);
        assert!(matches!(
            err.cause(),
            GatewayErrorSource::Provider(ProviderError::UserNotFound { .. })
        ));

        assert_eq!(gateway.delete_user("ghost").await.unwrap_err().status(), 400);
        assert_eq!(gateway.user_timestamps("ghost").await.unwrap_err().status(), 404);
        assert_eq!(
            gateway
                .update_user("ghost", UpdateUserRequest::display_name("X"))
                .await
                .unwrap_err()
                .status(),
            400
        );
    }

    #[tokio::test]
    async fn test_deleted_user_is_gone() {
        let gateway = gateway();
        let user = gateway
            .create_user(CreateUserRequest::new("a@b.com", "secret123"))
            .await
            .unwrap();

        gateway.delete_user(&user.uid).await.unwrap();
        assert_eq!(gateway.get_user(&user.uid).await.unwrap_err().status(), 404);
        assert_eq!(gateway.delete_user(&user.uid).await.unwrap_err().status(), 400);
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let gateway = gateway();
        let user = gateway
            .create_user(CreateUserRequest::new("a@b.com", "secret123"))
            .await
            .unwrap();

        let first = gateway
            .update_user(&user.uid, UpdateUserRequest::display_name("Bia"))
            .await
            .unwrap();
        let second = gateway
            .update_user(&user.uid, UpdateUserRequest::display_name("Bia"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.display_name.as_deref(), Some("Bia"));
    }

    #[tokio::test]
    async fn test_timestamps_fragment() {
        let gateway = gateway();
        let user = gateway
            .create_user(CreateUserRequest::new("a@b.com", "secret123"))
            .await
            .unwrap();

        let html = gateway.user_timestamps(&user.uid).await.unwrap();
        assert!(html.contains(timestamps::NEVER));
        assert!(!html.contains(timestamps::UNAVAILABLE));

        gateway.provider().record_sign_in(&user.uid).await.unwrap();
        let html = gateway.user_timestamps(&user.uid).await.unwrap();
        assert!(!html.contains(timestamps::NEVER));
    }

    #[tokio::test]
    async fn test_user_sizes() {
        let gateway = gateway();
        assert!(gateway.user_sizes().await.unwrap().is_empty());

        gateway
            .store()
            .set("users/u1", json!("x".repeat(1_048_574)))
            .await
            .unwrap();
        gateway
            .store()
            .set("users/u2", json!({"name": "Ana"}))
            .await
            .unwrap();

        let report = gateway.user_sizes().await.unwrap();
        assert_eq!(report.get("u1"), Some(1.0));
        assert_eq!(report.get("u2"), Some(0.0));
        assert_eq!(report.len(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_plain_text_500() {
        let gateway = DirectoryGateway::new(InMemoryIdentityProvider::new(), FailingStore);

        let err = gateway.user_sizes().await.unwrap_err();
        assert_eq!(err.status(), 500);
        assert_eq!(err.format(), ErrorFormat::PlainText);
        assert_eq!(
            err.message(),
            "Error while reading database: connection refused"
        );
    }
}
