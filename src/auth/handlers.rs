use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, MessageResponse, RegisterRequest, TokenResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_against_placeholder, verify_password},
    },
    error::{internal, AppError, AppResult},
    extract::JsonBody,
    state::AppState,
    users::{
        repo::UserRepo,
        repo_types::{NewUser, DEFAULT_ROLE},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    const CTX: &str = "Error registering user";

    let hash = hash_password(&payload.password).await.map_err(internal(CTX))?;
    let user = state
        .store
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password: hash,
            department: payload.department,
            category: payload.category,
            role: payload
                .role
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE.to_owned()),
        })
        .await
        .map_err(internal(CTX))?;

    info!(user_id = user.id, role = %user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    const CTX: &str = "Error logging in user";

    // Unknown email and wrong password answer identically, in the same time.
    let user = match state
        .store
        .find_user_by_email(&payload.email)
        .await
        .map_err(internal(CTX))?
    {
        Some(u) => u,
        None => {
            verify_against_placeholder(&payload.password)
                .await
                .map_err(internal(CTX))?;
            warn!("login for unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password)
        .await
        .map_err(internal(CTX))?
    {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(&state)
        .issue(user.id, &user.role)
        .map_err(internal(CTX))?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}
