use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::ApiResponse;

use crate::models::{NewLike, SwipeAction, User};
use crate::routes::chats::find_or_create_chat;
use crate::schema::{likes, users};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub user_id: i64,
    pub target_user_id: i64,
    pub action: SwipeAction,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub action: SwipeAction,
    pub is_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<Uuid>,
}

/// POST /like/swipe
///
/// Appends a like record. A match exists iff both directions hold a
/// positive (like/superlike) record; detection fires when the second
/// record lands, and the chat for the pair is created right away.
pub async fn record_swipe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SwipeRequest>,
) -> AppResult<Json<ApiResponse<SwipeResponse>>> {
    if req.user_id == req.target_user_id {
        return Err(AppError::bad_request("cannot swipe on yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user_exists: bool = users::table
        .find(req.user_id)
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);
    if !user_exists {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }

    let target_exists: bool = users::table
        .find(req.target_user_id)
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);
    if !target_exists {
        return Err(AppError::new(ErrorCode::TargetNotFound, "target user not found"));
    }

    let new_like = NewLike {
        user_id: req.user_id,
        target_user_id: req.target_user_id,
        action: req.action.as_str().to_string(),
    };

    diesel::insert_into(likes::table)
        .values(&new_like)
        .execute(&mut conn)?;

    let mut is_match = false;
    let mut chat_id = None;

    if req.action.is_positive() {
        let reverse_exists: bool = likes::table
            .filter(likes::user_id.eq(req.target_user_id))
            .filter(likes::target_user_id.eq(req.user_id))
            .filter(likes::action.eq_any(["like", "superlike"]))
            .count()
            .get_result::<i64>(&mut conn)
            .map(|c| c > 0)
            .unwrap_or(false);

        if reverse_exists {
            is_match = true;
            chat_id = Some(find_or_create_chat(&mut conn, req.user_id, req.target_user_id)?);
            tracing::info!(
                user = req.user_id,
                target = req.target_user_id,
                chat = %chat_id.unwrap_or_default(),
                "mutual like, match created"
            );
        }
    }

    Ok(Json(ApiResponse::ok(SwipeResponse {
        action: req.action,
        is_match,
        chat_id,
    })))
}

#[derive(Debug, Serialize)]
pub struct ReceivedLike {
    pub like_id: Uuid,
    pub action: String,
    pub liked_at: DateTime<Utc>,
    pub telegram_id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub orientation: String,
    pub bio: String,
    pub profile_photos: Vec<String>,
}

/// Likes are append-only, so the same liker can appear several times.
/// The inbox cares about each liker's latest signal only: keep the
/// newest record per liker, then drop likers whose newest record is a
/// dislike. Rows must arrive newest first.
fn latest_signals(
    rows: Vec<(Uuid, i64, String, DateTime<Utc>)>,
) -> Vec<(Uuid, i64, String, DateTime<Utc>)> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|(_, liker_id, _, _)| seen.insert(*liker_id))
        .filter(|(_, _, action, _)| matches!(action.as_str(), "like" | "superlike"))
        .collect()
}

/// GET /likes/received/:id - like/superlike inbox, newest first, one
/// entry per liker.
pub async fn received_likes(
    State(state): State<Arc<AppState>>,
    Path(telegram_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<ReceivedLike>>>> {
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

    let rows: Vec<(Uuid, i64, String, DateTime<Utc>)> = likes::table
        .filter(likes::target_user_id.eq(telegram_id))
        .order(likes::created_at.desc())
        .select((likes::id, likes::user_id, likes::action, likes::created_at))
        .load(&mut conn)?;

    let mut inbox = Vec::new();
    for (like_id, liker_id, action, liked_at) in latest_signals(rows) {
        let Some(liker) = users::table
            .find(liker_id)
            .first::<User>(&mut conn)
            .optional()?
        else {
            continue;
        };
        inbox.push(ReceivedLike {
            like_id,
            action,
            liked_at,
            telegram_id: liker.telegram_id,
            name: liker.name,
            age: liker.age,
            gender: liker.gender,
            orientation: liker.orientation,
            bio: liker.bio,
            profile_photos: liker.profile_photos,
        });
    }

    Ok(Json(ApiResponse::ok(inbox)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(liker: i64, action: &str, secs: i64) -> (Uuid, i64, String, DateTime<Utc>) {
        (
            Uuid::now_v7(),
            liker,
            action.to_string(),
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    #[test]
    fn like_retracted_by_newer_dislike_leaves_inbox() {
        // Newest first, as the query orders them.
        let rows = vec![row(7, "dislike", 200), row(7, "like", 100)];
        assert!(latest_signals(rows).is_empty());
    }

    #[test]
    fn newest_positive_wins_per_liker() {
        let rows = vec![
            row(7, "superlike", 300),
            row(7, "dislike", 200),
            row(9, "like", 150),
            row(9, "like", 100),
        ];
        let kept = latest_signals(rows);
        assert_eq!(kept.len(), 2);
        assert_eq!((kept[0].1, kept[0].2.as_str()), (7, "superlike"));
        assert_eq!((kept[1].1, kept[1].2.as_str()), (9, "like"));
    }

    #[test]
    fn plain_dislikes_never_surface() {
        let rows = vec![row(3, "dislike", 50)];
        assert!(latest_signals(rows).is_empty());
    }
}
