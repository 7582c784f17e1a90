use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::chat::{ChatCreated, ChatPreview, CreateChatRequest};
use amora_shared::types::ApiResponse;

use crate::models::{Chat, Message, NewChat, User};
use crate::schema::{chats, messages, users};
use crate::AppState;

/// A participant counts as online when last seen within this window.
const ONLINE_WINDOW_MINUTES: i64 = 5;

/// Store the smaller id first so one chat exists per unordered pair.
pub fn normalize_pair(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Insert-or-fetch for the normalized pair. The unique constraint on
/// (user_a, user_b) resolves concurrent creation from both sides; the
/// loser of the race falls back to reading the winner's row.
pub fn find_or_create_chat(conn: &mut PgConnection, a: i64, b: i64) -> AppResult<Uuid> {
    if a == b {
        return Err(AppError::new(ErrorCode::SelfChat, "cannot open a chat with yourself"));
    }
    let (user_a, user_b) = normalize_pair(a, b);

    let inserted: Option<Uuid> = diesel::insert_into(chats::table)
        .values(&NewChat { user_a, user_b })
        .on_conflict((chats::user_a, chats::user_b))
        .do_nothing()
        .returning(chats::id)
        .get_result(conn)
        .optional()?;

    if let Some(id) = inserted {
        tracing::info!(chat = %id, user_a, user_b, "chat created");
        return Ok(id);
    }

    let existing: Uuid = chats::table
        .filter(chats::user_a.eq(user_a))
        .filter(chats::user_b.eq(user_b))
        .select(chats::id)
        .first(conn)?;

    Ok(existing)
}

/// POST /chats - create the chat for a pair, or return the existing one
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateChatRequest>,
) -> AppResult<Json<ApiResponse<ChatCreated>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    for id in [req.user1_id, req.user2_id] {
        let exists: bool = users::table
            .find(id)
            .count()
            .get_result::<i64>(&mut conn)
            .map(|c| c > 0)
            .unwrap_or(false);
        if !exists {
            return Err(AppError::new(ErrorCode::UserNotFound, format!("user {id} not found")));
        }
    }

    let chat_id = find_or_create_chat(&mut conn, req.user1_id, req.user2_id)?;

    Ok(Json(ApiResponse::ok(ChatCreated { chat_id })))
}

#[derive(Debug, Deserialize)]
pub struct ChatListParams {
    pub user_id: i64,
}

/// GET /chats?user_id= - chat previews ordered by most recent activity
///
/// The latest message is read back from the messages table rather than
/// through the chat's denormalized pointer, so a stale pointer never
/// shows up here.
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChatListParams>,
) -> AppResult<Json<ApiResponse<Vec<ChatPreview>>>> {
    let user_id = params.user_id;
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let exists: bool = users::table
        .find(user_id)
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);
    if !exists {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }

    let user_chats: Vec<Chat> = chats::table
        .filter(chats::user_a.eq(user_id).or(chats::user_b.eq(user_id)))
        .load::<Chat>(&mut conn)?;

    let online_cutoff = Utc::now() - Duration::minutes(ONLINE_WINDOW_MINUTES);
    let mut previews = Vec::with_capacity(user_chats.len());

    for chat in user_chats {
        let other_id = chat.other_user(user_id);

        let Some(other) = users::table
            .find(other_id)
            .first::<User>(&mut conn)
            .optional()?
        else {
            continue;
        };

        let last_msg: Option<Message> = messages::table
            .filter(messages::chat_id.eq(chat.id))
            .order(messages::created_at.desc())
            .first::<Message>(&mut conn)
            .optional()?;

        let unread_count: i64 = messages::table
            .filter(messages::chat_id.eq(chat.id))
            .filter(messages::sender_id.ne(user_id))
            .filter(messages::created_at.gt(chat.last_read_for(user_id)))
            .count()
            .get_result(&mut conn)?;

        let last_message_time = last_msg.as_ref().map(|m| m.created_at);
        // Empty chats fall back to their creation time for ordering.
        let activity = last_message_time.unwrap_or(chat.created_at);

        previews.push((
            activity,
            ChatPreview {
                chat_id: chat.id,
                other_user_id: other_id,
                other_name: other.name,
                last_message: last_msg.map(|m| m.content),
                last_message_time,
                unread_count,
                is_online: other.last_online > online_cutoff,
            },
        ));
    }

    previews.sort_by(|a, b| b.0.cmp(&a.0));
    let previews: Vec<ChatPreview> = previews.into_iter().map(|(_, p)| p).collect();

    diesel::update(users::table.find(user_id))
        .set(users::last_online.eq(Utc::now()))
        .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(previews)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_normalization_orders_ids() {
        assert_eq!(normalize_pair(111, 222), (111, 222));
        assert_eq!(normalize_pair(222, 111), (111, 222));
        assert_eq!(normalize_pair(7, 7), (7, 7));
    }
}
