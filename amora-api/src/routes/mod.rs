pub mod chats;
pub mod health;
pub mod likes;
pub mod messages;
pub mod profile;
pub mod register;
pub mod search;
