use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::ApiResponse;

use crate::models::{UpdateUser, User};
use crate::schema::users;
use crate::AppState;

/// GET /profile/:id
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(telegram_id): Path<i64>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user = users::table
        .find(telegram_id)
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    Ok(Json(ApiResponse::ok(user)))
}

/// PUT /profile/:id - partial update; omitted fields keep their stored value
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(telegram_id): Path<i64>,
    Json(payload): Json<UpdateUser>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let exists: bool = users::table
        .find(telegram_id)
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    if !exists {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }

    let updated = diesel::update(users::table.find(telegram_id))
        .set((&payload, users::updated_at.eq(chrono::Utc::now())))
        .get_result::<User>(&mut conn)?;

    tracing::info!(user = telegram_id, "profile updated");

    Ok(Json(ApiResponse::ok(updated)))
}
