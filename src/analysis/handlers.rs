use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    analysis::{
        repo::AnalysisRepo,
        repo_types::{Analysis, AnalysisFields},
    },
    auth::{dto::MessageResponse, AuthUser},
    error::{internal, AppError, AppResult},
    extract::JsonBody,
    state::AppState,
};

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/analysis", get(list_analyses).post(create_analysis))
        .route(
            "/analysis/:id",
            get(get_analysis).put(update_analysis).delete(delete_analysis),
        )
}

/// The owner is always the caller; any `id_user` in the body is dropped.
#[instrument(skip(state, body), fields(user_id = caller.id))]
pub async fn create_analysis(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(body): JsonBody<AnalysisFields>,
) -> AppResult<(StatusCode, Json<Analysis>)> {
    let row = state
        .store
        .create_analysis(caller.id, body)
        .await
        .map_err(internal("Error creating analysis"))?;
    info!(analysis_id = row.id, "analysis created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state), fields(user_id = caller.id))]
pub async fn list_analyses(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<Analysis>>> {
    let rows = state
        .store
        .list_analyses(caller.id)
        .await
        .map_err(internal("Error fetching analyses"))?;
    Ok(Json(rows))
}

#[instrument(skip(state), fields(user_id = caller.id))]
pub async fn get_analysis(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Analysis>> {
    state
        .store
        .find_analysis(id, caller.id)
        .await
        .map_err(internal("Error fetching analysis"))?
        .map(Json)
        .ok_or(AppError::NotFound("Analysis"))
}

/// Partial update: fields missing from the body keep their stored value.
#[instrument(skip(state, patch), fields(user_id = caller.id))]
pub async fn update_analysis(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
    JsonBody(patch): JsonBody<AnalysisFields>,
) -> AppResult<Json<MessageResponse>> {
    const CTX: &str = "Error updating analysis";

    state
        .store
        .update_analysis(id, caller.id, patch)
        .await
        .map_err(internal(CTX))?
        .ok_or(AppError::NotFound("Analysis"))?;

    info!(analysis_id = id, "analysis updated");
    Ok(Json(MessageResponse::new("Analysis updated successfully")))
}

#[instrument(skip(state), fields(user_id = caller.id))]
pub async fn delete_analysis(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let deleted = state
        .store
        .delete_analysis(id, caller.id)
        .await
        .map_err(internal("Error deleting analysis"))?;
    if !deleted {
        return Err(AppError::NotFound("Analysis"));
    }
    info!(analysis_id = id, "analysis deleted");
    Ok(StatusCode::NO_CONTENT)
}
