//! Error types for gateway operations.
//!
//! Every external call made by the gateway is tagged with the [`Operation`] it
//! serves. The operation alone decides which HTTP status a failure maps to, so
//! the status mapping lives in one place instead of in each route handler.

use crate::providers::ProviderError;
use crate::store::StoreError;
use std::fmt;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// The gateway operations exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateUser,
    GetUser,
    UpdateUser,
    DeleteUser,
    ListUsers,
    UserTimestamps,
    UserSizes,
}

/// The three failure classes a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The provider rejected the input (bad email, duplicate user, weak password).
    Rejected,
    /// The identifier does not name a user.
    NotFound,
    /// A listing or storage aggregation failed as a whole.
    Aggregation,
}

/// How an error body is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    /// `{"error": "<message>"}`
    Json,
    /// The bare message as `text/plain`.
    PlainText,
}

impl Operation {
    /// The failure class every error of this operation falls into.
    pub fn failure_class(self) -> FailureClass {
        match self {
            Operation::CreateUser | Operation::UpdateUser | Operation::DeleteUser => {
                FailureClass::Rejected
            }
            Operation::GetUser | Operation::UserTimestamps => FailureClass::NotFound,
            Operation::ListUsers | Operation::UserSizes => FailureClass::Aggregation,
        }
    }

    /// HTTP status code for a failure of this operation.
    pub fn failure_status(self) -> u16 {
        match self.failure_class() {
            FailureClass::Rejected => 400,
            FailureClass::NotFound => 404,
            FailureClass::Aggregation => 500,
        }
    }

    /// Body format for a failure of this operation.
    pub fn failure_format(self) -> ErrorFormat {
        match self {
            Operation::UserSizes => ErrorFormat::PlainText,
            _ => ErrorFormat::Json,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CreateUser => "create_user",
            Operation::GetUser => "get_user",
            Operation::UpdateUser => "update_user",
            Operation::DeleteUser => "delete_user",
            Operation::ListUsers => "list_users",
            Operation::UserTimestamps => "user_timestamps",
            Operation::UserSizes => "user_sizes",
        };
        f.write_str(name)
    }
}

/// Underlying cause of a gateway failure.
#[derive(Debug, thiserror::Error)]
pub enum GatewayErrorSource {
    /// The identity provider failed or rejected the call
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The hierarchical store read failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request body could not be decoded
    #[error("{0}")]
    InvalidBody(String),
}

/// Error returned by every gateway operation.
///
/// Carries the operation that failed so the boundary can pick the status and
/// body format without inspecting the cause.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct GatewayError {
    operation: Operation,
    #[source]
    source: GatewayErrorSource,
}

impl GatewayError {
    /// Wrap any failure cause for the given operation.
    pub fn new(operation: Operation, source: impl Into<GatewayErrorSource>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }

    /// A request body that could not be decoded.
    pub fn invalid_body(operation: Operation, message: impl Into<String>) -> Self {
        Self::new(operation, GatewayErrorSource::InvalidBody(message.into()))
    }

    /// The operation that failed.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The failure cause.
    pub fn cause(&self) -> &GatewayErrorSource {
        &self.source
    }

    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self.source {
            GatewayErrorSource::InvalidBody(_) => 400,
            _ => self.operation.failure_status(),
        }
    }

    /// Body format for this error.
    pub fn format(&self) -> ErrorFormat {
        self.operation.failure_format()
    }

    /// The message surfaced to the caller, verbatim from the provider.
    pub fn message(&self) -> String {
        self.source.to_string()
    }
}

/// Bind an operation to a fallible call, as `.map_err(for_operation(op))`.
pub fn for_operation<E>(operation: Operation) -> impl FnOnce(E) -> GatewayError
where
    E: Into<GatewayErrorSource>,
{
    move |err| GatewayError::new(operation, err)
}
