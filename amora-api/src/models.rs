use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{chats, likes, messages, users};

// --- User ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = users, primary_key(telegram_id))]
pub struct User {
    pub telegram_id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub orientation: String,
    pub interested_in: Vec<String>,
    pub relationship_type: Vec<String>,
    pub selected_spokies: Vec<i32>,
    pub profile_photos: Vec<String>,
    pub bio: String,
    pub tokens: i32,
    pub last_online: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub telegram_id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub orientation: String,
    pub interested_in: Vec<String>,
    pub relationship_type: Vec<String>,
    pub selected_spokies: Vec<i32>,
    pub profile_photos: Vec<String>,
    pub bio: String,
    pub tokens: i32,
}

#[derive(Debug, AsChangeset, Deserialize, Default)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i32>,
    pub relationship_type: Option<Vec<String>>,
    pub selected_spokies: Option<Vec<i32>>,
}

// --- Like ---

/// Directional preference signal. Rows are append-only; duplicates for the
/// same (user, target) pair are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeAction {
    Like,
    Dislike,
    Superlike,
}

impl SwipeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
            Self::Superlike => "superlike",
        }
    }

    /// Only positive signals participate in match detection.
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Like | Self::Superlike)
    }
}

impl std::str::FromStr for SwipeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            "superlike" => Ok(Self::Superlike),
            _ => Err(format!("unknown swipe action: {s}")),
        }
    }
}

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: Uuid,
    pub user_id: i64,
    pub target_user_id: i64,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub user_id: i64,
    pub target_user_id: i64,
    pub action: String,
}

// --- Chat ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = chats)]
pub struct Chat {
    pub id: Uuid,
    pub user_a: i64,
    pub user_b: i64,
    pub last_message_id: Option<Uuid>,
    pub last_activity: DateTime<Utc>,
    pub last_read_a: DateTime<Utc>,
    pub last_read_b: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn other_user(&self, user_id: i64) -> i64 {
        if self.user_a == user_id { self.user_b } else { self.user_a }
    }

    pub fn last_read_for(&self, user_id: i64) -> DateTime<Utc> {
        if self.user_a == user_id { self.last_read_a } else { self.last_read_b }
    }

    pub fn is_participant(&self, user_id: i64) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = chats)]
pub struct NewChat {
    pub user_a: i64,
    pub user_b: i64,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: i64,
    pub sender_name: String,
    pub content: String,
    pub content_type: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub chat_id: Uuid,
    pub sender_id: i64,
    pub sender_name: String,
    pub content: String,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn swipe_action_roundtrip() {
        for action in [SwipeAction::Like, SwipeAction::Dislike, SwipeAction::Superlike] {
            assert_eq!(SwipeAction::from_str(action.as_str()).unwrap(), action);
        }
        assert!(SwipeAction::from_str("poke").is_err());
    }

    #[test]
    fn only_like_and_superlike_are_positive() {
        assert!(SwipeAction::Like.is_positive());
        assert!(SwipeAction::Superlike.is_positive());
        assert!(!SwipeAction::Dislike.is_positive());
    }

    #[test]
    fn chat_side_helpers() {
        let chat = Chat {
            id: Uuid::nil(),
            user_a: 111,
            user_b: 222,
            last_message_id: None,
            last_activity: Utc::now(),
            last_read_a: Utc::now(),
            last_read_b: Utc::now(),
            created_at: Utc::now(),
        };
        assert_eq!(chat.other_user(111), 222);
        assert_eq!(chat.other_user(222), 111);
        assert!(chat.is_participant(111));
        assert!(!chat.is_participant(333));
    }
}
