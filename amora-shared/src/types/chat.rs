use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry in a user's chat list, with the derived display fields
/// computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPreview {
    pub chat_id: Uuid,
    pub other_user_id: i64,
    pub other_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_time: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub is_online: bool,
}

/// A chat message as returned from the history endpoint. `sender_name`
/// is the denormalised copy taken when the message was posted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub message_id: Uuid,
    pub sender_id: i64,
    pub sender_name: String,
    pub content: String,
    pub content_type: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub user1_id: i64,
    pub user2_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCreated {
    pub chat_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: i64,
    pub content: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "text".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagePosted {
    pub message_id: Uuid,
    pub created_at: DateTime<Utc>,
}
