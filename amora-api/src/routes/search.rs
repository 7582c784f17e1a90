use axum::extract::{Query, State};
use axum::Json;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Double;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::ApiResponse;

use crate::models::User;
use crate::schema::users;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub telegram_id: i64,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

/// Public candidate card; the full row (tokens, timestamps) stays server-side.
#[derive(Debug, Serialize)]
pub struct Candidate {
    pub telegram_id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub orientation: String,
    pub bio: String,
    pub profile_photos: Vec<String>,
    pub selected_spokies: Vec<i32>,
}

impl From<User> for Candidate {
    fn from(u: User) -> Self {
        Self {
            telegram_id: u.telegram_id,
            name: u.name,
            age: u.age,
            gender: u.gender,
            orientation: u.orientation,
            bio: u.bio,
            profile_photos: u.profile_photos,
            selected_spokies: u.selected_spokies,
        }
    }
}

/// GET /search/users?telegram_id=&skip=&limit=
///
/// Bounded random sample of other users. Consecutive calls may repeat
/// candidates; the client keeps its own pagination state.
pub async fn list_candidates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<ApiResponse<Vec<Candidate>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let requester = users::table
        .find(params.telegram_id)
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    let skip = params.skip.max(0);
    let limit = params.limit.clamp(1, 50);

    let mut query = users::table
        .filter(users::telegram_id.ne(params.telegram_id))
        .into_boxed();

    // Narrow the sample to preferred genders when the requester set any.
    if !requester.interested_in.is_empty() {
        query = query.filter(users::gender.eq_any(requester.interested_in.clone()));
    }

    let candidates: Vec<User> = query
        .order(sql::<Double>("random()"))
        .offset(skip)
        .limit(limit)
        .load::<User>(&mut conn)?;

    diesel::update(users::table.find(params.telegram_id))
        .set(users::last_online.eq(chrono::Utc::now()))
        .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(
        candidates.into_iter().map(Candidate::from).collect(),
    )))
}
