use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{dto::MessageResponse, password::hash_password, AuthUser},
    error::{internal, AppError, AppResult},
    extract::JsonBody,
    state::AppState,
    users::{
        dto::{ForgotPasswordRequest, ResetPasswordRequest, UserChanges},
        repo::UserRepo,
        repo_types::User,
    },
};

/// Reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users/forgot-password", post(forgot_password))
        .route("/users/reset-password", post(reset_password))
}

/// Any valid token may use these, whichever user it belongs to.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", put(update_user).delete(delete_user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<Json<Vec<User>>> {
    let users = state
        .store
        .list_users()
        .await
        .map_err(internal("Error fetching users"))?;
    Ok(Json(users))
}

#[instrument(skip(state, changes))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
    JsonBody(changes): JsonBody<UserChanges>,
) -> AppResult<Json<MessageResponse>> {
    const CTX: &str = "Error updating user";

    if changes.role.is_some() {
        warn!(user_id = id, caller_id = caller.id, "role change ignored on user update");
    }
    let password_hash = match &changes.password {
        Some(plain) => Some(hash_password(plain).await.map_err(internal(CTX))?),
        None => None,
    };

    state
        .store
        .update_user(id, changes.into_update(password_hash))
        .await
        .map_err(internal(CTX))?
        .ok_or(AppError::NotFound("User"))?;

    info!(user_id = id, caller_id = caller.id, "user updated");
    Ok(Json(MessageResponse::new("User updated successfully")))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let deleted = state
        .store
        .delete_user(id)
        .await
        .map_err(internal("Error deleting user"))?;
    if !deleted {
        return Err(AppError::NotFound("User"));
    }
    info!(user_id = id, caller_id = caller.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Confirms the account exists. No reset link or token is issued.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = state
        .store
        .find_user_by_email(&payload.email)
        .await
        .map_err(internal("Error initiating password reset"))?
        .ok_or(AppError::NotFound("User"))?;

    info!(user_id = user.id, "password reset initiated");
    Ok(Json(MessageResponse::new("Password reset initiated")))
}

/// Sets a new password for whoever owns `email`, with no further proof of identity.
#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    const CTX: &str = "Error resetting password";

    let user = state
        .store
        .find_user_by_email(&payload.email)
        .await
        .map_err(internal(CTX))?
        .ok_or(AppError::NotFound("User"))?;

    let hash = hash_password(&payload.new_password)
        .await
        .map_err(internal(CTX))?;
    if !state
        .store
        .set_password(user.id, &hash)
        .await
        .map_err(internal(CTX))?
    {
        return Err(AppError::NotFound("User"));
    }

    warn!(user_id = user.id, "password reset without verification token");
    Ok(Json(MessageResponse::new("Password reset successfully")))
}
