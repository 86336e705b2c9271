//! Route handlers. Each one forwards to a [`DirectoryGateway`] operation and
//! wraps the result in its response envelope.

use super::response::{MessageResponse, UserResponse};
use crate::error::{GatewayError, GatewayResult, Operation};
use crate::gateway::{
    DirectoryGateway, USER_CREATED_MESSAGE, USER_DELETED_MESSAGE, USER_UPDATED_MESSAGE,
    UserSizeReport, UserSummary,
};
use crate::providers::{CreateUserRequest, IdentityProvider, UpdateUserRequest, UserRecord};
use crate::store::TreeStore;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Html;
use log::debug;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Message returned by `GET /`.
pub const STATUS_MESSAGE: &str = "Directory gateway is running";

/// Uid addressed by `PUT` and `DELETE` on `/users/size`, whose `GET` is the
/// size report.
pub const SIZE_SEGMENT: &str = "size";

type Gateway<P, S> = State<Arc<DirectoryGateway<P, S>>>;

fn is_json_content(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Decode a request body the way a JSON body parser feeds a handler: a body
/// that is empty or not declared as JSON reads as an empty object, and only
/// JSON that fails to parse is rejected.
fn decode_body<T>(
    operation: Operation,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResult<T>
where
    T: DeserializeOwned + Default,
{
    let body = body.map_err(|rejection| {
        debug!("Could not read {} body: {}", operation, rejection);
        GatewayError::invalid_body(operation, rejection.body_text())
    })?;

    if !is_json_content(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    Json::<T>::from_bytes(&body)
        .map(|Json(value)| value)
        .map_err(|rejection| {
            debug!("Rejected {} body: {}", operation, rejection);
            GatewayError::invalid_body(operation, rejection.body_text())
        })
}

/// `GET /`: liveness banner.
pub async fn status() -> Json<MessageResponse> {
    Json(MessageResponse::new(STATUS_MESSAGE))
}

/// `POST /users`: create a user, 201 with the created record.
pub async fn create_user<P, S>(
    State(gateway): Gateway<P, S>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResult<(StatusCode, Json<UserResponse>)>
where
    P: IdentityProvider,
    S: TreeStore,
{
    let request: CreateUserRequest = decode_body(Operation::CreateUser, &headers, body)?;
    let user = gateway.create_user(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: USER_CREATED_MESSAGE.to_string(),
            user,
        }),
    ))
}

/// `GET /users/:uid`: the full user record.
pub async fn get_user<P, S>(
    State(gateway): Gateway<P, S>,
    Path(uid): Path<String>,
) -> GatewayResult<Json<UserRecord>>
where
    P: IdentityProvider,
    S: TreeStore,
{
    gateway.get_user(&uid).await.map(Json)
}

/// `PUT /users/:uid`: apply a partial update, 200 with the updated record.
pub async fn update_user<P, S>(
    gateway: Gateway<P, S>,
    Path(uid): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResult<Json<UserResponse>>
where
    P: IdentityProvider,
    S: TreeStore,
{
    apply_update(gateway, &uid, &headers, body).await
}

/// `PUT /users/size`: update the user whose uid is `size`.
pub async fn update_size_user<P, S>(
    gateway: Gateway<P, S>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResult<Json<UserResponse>>
where
    P: IdentityProvider,
    S: TreeStore,
{
    apply_update(gateway, SIZE_SEGMENT, &headers, body).await
}

async fn apply_update<P, S>(
    State(gateway): Gateway<P, S>,
    uid: &str,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResult<Json<UserResponse>>
where
    P: IdentityProvider,
    S: TreeStore,
{
    let request: UpdateUserRequest = decode_body(Operation::UpdateUser, headers, body)?;
    let user = gateway.update_user(uid, request).await?;

    Ok(Json(UserResponse {
        message: USER_UPDATED_MESSAGE.to_string(),
        user,
    }))
}

/// `DELETE /users/:uid`: delete a user.
pub async fn delete_user<P, S>(
    gateway: Gateway<P, S>,
    Path(uid): Path<String>,
) -> GatewayResult<Json<MessageResponse>>
where
    P: IdentityProvider,
    S: TreeStore,
{
    remove_user(gateway, &uid).await
}

/// `DELETE /users/size`: delete the user whose uid is `size`.
pub async fn delete_size_user<P, S>(gateway: Gateway<P, S>) -> GatewayResult<Json<MessageResponse>>
where
    P: IdentityProvider,
    S: TreeStore,
{
    remove_user(gateway, SIZE_SEGMENT).await
}

async fn remove_user<P, S>(
    State(gateway): Gateway<P, S>,
    uid: &str,
) -> GatewayResult<Json<MessageResponse>>
where
    P: IdentityProvider,
    S: TreeStore,
{
    gateway.delete_user(uid).await?;
    Ok(Json(MessageResponse::new(USER_DELETED_MESSAGE)))
}

/// `GET /users`: every user, projected to a summary.
pub async fn list_users<P, S>(State(gateway): Gateway<P, S>) -> GatewayResult<Json<Vec<UserSummary>>>
where
    P: IdentityProvider,
    S: TreeStore,
{
    gateway.list_all_users().await.map(Json)
}

/// `GET /users/:uid/timestamps`: creation and last sign-in as HTML.
pub async fn user_timestamps<P, S>(
    State(gateway): Gateway<P, S>,
    Path(uid): Path<String>,
) -> GatewayResult<Html<String>>
where
    P: IdentityProvider,
    S: TreeStore,
{
    gateway.user_timestamps(&uid).await.map(Html)
}

/// `GET /users/size`: stored megabytes per uid.
pub async fn user_sizes<P, S>(State(gateway): Gateway<P, S>) -> GatewayResult<Json<UserSizeReport>>
where
    P: IdentityProvider,
    S: TreeStore,
{
    gateway.user_sizes().await.map(Json)
}
