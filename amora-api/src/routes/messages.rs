use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::chat::{MessagePosted, MessageView, SendMessageRequest};
use amora_shared::types::pagination::PageParams;
use amora_shared::types::ApiResponse;

use crate::models::{Chat, Message, NewMessage, User};
use crate::schema::{chats, messages, users};
use crate::AppState;

fn load_chat(conn: &mut PgConnection, chat_id: Uuid) -> AppResult<Chat> {
    chats::table
        .find(chat_id)
        .first::<Chat>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ChatNotFound, "chat not found"))
}

/// GET /chats/:chat_id/messages?limit=&offset= - ascending history
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ApiResponse<Vec<MessageView>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    load_chat(&mut conn, chat_id)?;

    // The id tiebreak keeps the order total: same-timestamp messages
    // would otherwise shuffle between queries and duplicate or skip
    // rows at page boundaries.
    let rows: Vec<Message> = messages::table
        .filter(messages::chat_id.eq(chat_id))
        .order((messages::created_at.asc(), messages::id.asc()))
        .offset(params.offset())
        .limit(params.limit())
        .load::<Message>(&mut conn)?;

    let views = rows
        .into_iter()
        .map(|m| MessageView {
            message_id: m.id,
            sender_id: m.sender_id,
            sender_name: m.sender_name,
            content: m.content,
            content_type: m.content_type,
            is_read: m.is_read,
            created_at: m.created_at,
        })
        .collect();

    Ok(Json(ApiResponse::ok(views)))
}

/// POST /chats/:chat_id/messages
///
/// The sender's display name is copied onto the row at write time, so
/// history keeps the name as of posting even after a rename. The chat's
/// last-message pointer is refreshed in a second statement; a crash in
/// between leaves a stale pointer that the chat list recomputes anyway.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<MessagePosted>>> {
    if req.content.trim().is_empty() {
        return Err(AppError::new(ErrorCode::EmptyMessage, "message content is required"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let chat = load_chat(&mut conn, chat_id)?;
    if !chat.is_participant(req.sender_id) {
        return Err(AppError::new(
            ErrorCode::NotChatParticipant,
            "sender is not a participant of this chat",
        ));
    }

    let sender = users::table
        .find(req.sender_id)
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "sender not found"))?;

    let new_message = NewMessage {
        chat_id,
        sender_id: req.sender_id,
        sender_name: sender.name,
        content: req.content,
        content_type: req.content_type,
    };

    let message: Message = diesel::insert_into(messages::table)
        .values(&new_message)
        .get_result(&mut conn)?;

    diesel::update(chats::table.find(chat_id))
        .set((
            chats::last_message_id.eq(message.id),
            chats::last_activity.eq(message.created_at),
        ))
        .execute(&mut conn)?;

    diesel::update(users::table.find(req.sender_id))
        .set(users::last_online.eq(Utc::now()))
        .execute(&mut conn)?;

    tracing::info!(
        chat = %chat_id,
        sender = req.sender_id,
        message = %message.id,
        "message posted"
    );

    Ok(Json(ApiResponse::ok(MessagePosted {
        message_id: message.id,
        created_at: message.created_at,
    })))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadParams {
    pub user_id: i64,
}

/// PATCH /chats/:chat_id/read?user_id=
///
/// Flags only the messages sent *to* the caller and advances the
/// caller's last-read mark; the caller's own sent messages keep their
/// recipient-side read state.
pub async fn mark_chat_read(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<Uuid>,
    Query(params): Query<MarkReadParams>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let chat = load_chat(&mut conn, chat_id)?;
    if !chat.is_participant(params.user_id) {
        return Err(AppError::new(
            ErrorCode::NotChatParticipant,
            "you are not a participant of this chat",
        ));
    }

    let flagged = diesel::update(
        messages::table
            .filter(messages::chat_id.eq(chat_id))
            .filter(messages::sender_id.ne(params.user_id)),
    )
    .set(messages::is_read.eq(true))
    .execute(&mut conn)?;

    let read_at = Utc::now();
    if chat.user_a == params.user_id {
        diesel::update(chats::table.find(chat_id))
            .set(chats::last_read_a.eq(read_at))
            .execute(&mut conn)?;
    } else {
        diesel::update(chats::table.find(chat_id))
            .set(chats::last_read_b.eq(read_at))
            .execute(&mut conn)?;
    }

    tracing::debug!(chat = %chat_id, user = params.user_id, flagged, "chat marked read");

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "chat_id": chat_id,
        "read_at": read_at,
    }))))
}
