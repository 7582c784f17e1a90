use dashmap::DashMap;
use uuid::Uuid;

use amora_shared::types::chat::MessageView;

use crate::api::ApiClient;
use crate::config::BotConfig;
use crate::telegram::{
    CallbackQuery, IncomingMessage, InlineKeyboardButton, InlineKeyboardMarkup, TelegramClient,
    Update,
};

/// Chat history is replayed in pages of this size; a full page means
/// there may be more to load.
const PAGE_SIZE: i64 = 50;

/// Per-user relay state: which chat is open and how far history has
/// been replayed.
#[derive(Debug, Clone)]
pub struct Session {
    pub chat_id: Uuid,
    pub offset: i64,
    /// Telegram message id of the pending "load more" button, removed
    /// once the next page is requested.
    pub more_msg_id: Option<i64>,
}

pub struct BotState {
    pub tg: TelegramClient,
    pub api: ApiClient,
    pub config: BotConfig,
    pub sessions: DashMap<i64, Session>,
}

#[derive(Debug, PartialEq)]
enum Command {
    Start(Option<Uuid>),
    BadStartLink,
    ListChats,
    OpenChat,
    Text(String),
}

fn parse_command(text: &str) -> Command {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("/start") {
        let payload = rest.trim();
        if payload.is_empty() {
            return Command::Start(None);
        }
        return match Uuid::parse_str(payload) {
            Ok(chat_id) => Command::Start(Some(chat_id)),
            Err(_) => Command::BadStartLink,
        };
    }
    match trimmed {
        "/chats" | "Chats" => Command::ListChats,
        "/open" | "Open chat" => Command::OpenChat,
        _ => Command::Text(trimmed.to_string()),
    }
}

#[derive(Debug, PartialEq)]
enum Callback {
    Open(Uuid),
    More(Uuid, i64),
}

fn parse_callback(data: &str) -> Option<Callback> {
    if let Some(id) = data.strip_prefix("chat_") {
        return Uuid::parse_str(id).ok().map(Callback::Open);
    }
    if let Some(rest) = data.strip_prefix("more_") {
        let (id, offset) = rest.rsplit_once('_')?;
        let chat_id = Uuid::parse_str(id).ok()?;
        let offset = offset.parse().ok()?;
        return Some(Callback::More(chat_id, offset));
    }
    None
}

/// Flatten a history page into outgoing texts, with a name header at
/// every change of sender.
fn render_history(messages: &[MessageView]) -> Vec<String> {
    let mut out = Vec::new();
    let mut last_sender: Option<&str> = None;
    for m in messages {
        if last_sender != Some(m.sender_name.as_str()) {
            out.push(format!("— {} —", m.sender_name));
            last_sender = Some(m.sender_name.as_str());
        }
        out.push(m.content.clone());
    }
    out
}

pub async fn handle_update(state: &BotState, update: Update) -> anyhow::Result<()> {
    if let Some(callback) = update.callback_query {
        return handle_callback(state, callback).await;
    }

    if let Some(message) = update.message {
        return handle_message(state, message).await;
    }

    Ok(())
}

async fn handle_callback(state: &BotState, callback: CallbackQuery) -> anyhow::Result<()> {
    if let Err(e) = state.tg.answer_callback_query(&callback.id).await {
        tracing::warn!(error = %e, "failed to ack callback query");
    }

    let user_id = callback.from.id;
    let tg_chat_id = callback.message.as_ref().map(|m| m.chat.id).unwrap_or(user_id);

    match callback.data.as_deref().and_then(parse_callback) {
        Some(Callback::Open(chat_id)) => open_chat(state, user_id, tg_chat_id, chat_id, 0).await,
        Some(Callback::More(chat_id, offset)) => {
            // Remove the stale "load more" button before the next page.
            let more_id = state.sessions.get(&user_id).and_then(|s| s.more_msg_id);
            if let Some(more_id) = more_id {
                if let Err(e) = state.tg.delete_message(tg_chat_id, more_id).await {
                    tracing::debug!(error = %e, "failed to delete load-more button");
                }
            }
            open_chat(state, user_id, tg_chat_id, chat_id, offset).await
        }
        None => Ok(()),
    }
}

async fn handle_message(state: &BotState, message: IncomingMessage) -> anyhow::Result<()> {
    let Some(from) = message.from else { return Ok(()) };
    let Some(text) = message.text else { return Ok(()) };
    let tg_chat_id = message.chat.id;

    match parse_command(&text) {
        Command::Start(Some(chat_id)) => open_chat(state, from.id, tg_chat_id, chat_id, 0).await,
        Command::Start(None) => {
            let keyboard = InlineKeyboardMarkup {
                inline_keyboard: vec![vec![InlineKeyboardButton::link(
                    "Visit the site",
                    state.config.site_url.as_str(),
                )]],
            };
            state
                .tg
                .send_message(
                    tg_chat_id,
                    "Welcome! Head to the site to find your matches:",
                    Some(&keyboard),
                )
                .await?;
            Ok(())
        }
        Command::BadStartLink => {
            state
                .tg
                .send_message(
                    tg_chat_id,
                    "That chat link looks broken. Use /chats to pick a chat.",
                    None,
                )
                .await?;
            Ok(())
        }
        Command::ListChats => show_chats(state, from.id, tg_chat_id).await,
        Command::OpenChat => {
            let session = state.sessions.get(&from.id).map(|s| s.value().clone());
            match session {
                Some(s) => open_chat(state, from.id, tg_chat_id, s.chat_id, s.offset).await,
                None => {
                    state
                        .tg
                        .send_message(
                            tg_chat_id,
                            "Open a chat first with /chats or a chat link.",
                            None,
                        )
                        .await?;
                    Ok(())
                }
            }
        }
        Command::Text(content) => relay_text(state, from.id, tg_chat_id, &content).await,
    }
}

async fn show_chats(state: &BotState, user_id: i64, tg_chat_id: i64) -> anyhow::Result<()> {
    let chats = match state.api.list_chats(user_id).await {
        Ok(chats) => chats,
        Err(e) => {
            tracing::error!(user = user_id, error = %e, "failed to fetch chat list");
            state
                .tg
                .send_message(tg_chat_id, "Could not load your chats.", None)
                .await?;
            return Ok(());
        }
    };

    if chats.is_empty() {
        state
            .tg
            .send_message(
                tg_chat_id,
                "You have no chats yet. Start a conversation on the site.",
                None,
            )
            .await?;
        return Ok(());
    }

    let keyboard = InlineKeyboardMarkup {
        inline_keyboard: chats
            .iter()
            .map(|c| {
                vec![InlineKeyboardButton::callback(
                    c.other_name.as_str(),
                    format!("chat_{}", c.chat_id),
                )]
            })
            .collect(),
    };

    state
        .tg
        .send_message(tg_chat_id, "Your chats:", Some(&keyboard))
        .await?;
    Ok(())
}

async fn open_chat(
    state: &BotState,
    user_id: i64,
    tg_chat_id: i64,
    chat_id: Uuid,
    offset: i64,
) -> anyhow::Result<()> {
    let messages = match state.api.list_messages(chat_id, offset, PAGE_SIZE).await {
        Ok(messages) => messages,
        Err(e) => {
            tracing::error!(user = user_id, chat = %chat_id, error = %e, "failed to fetch history");
            state
                .tg
                .send_message(tg_chat_id, "Could not load the chat history.", None)
                .await?;
            return Ok(());
        }
    };

    let mut more_msg_id = None;
    if messages.len() as i64 == PAGE_SIZE {
        let keyboard = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton::callback(
                "Load more",
                format!("more_{}_{}", chat_id, offset + PAGE_SIZE),
            )]],
        };
        let sent = state
            .tg
            .send_message(tg_chat_id, "More history available:", Some(&keyboard))
            .await?;
        more_msg_id = Some(sent.message_id);
    }

    for text in render_history(&messages) {
        state.tg.send_message(tg_chat_id, &text, None).await?;
    }

    if offset == 0 {
        state
            .tg
            .send_message(tg_chat_id, "— You are now chatting here —", None)
            .await?;
    }

    state.sessions.insert(
        user_id,
        Session {
            chat_id,
            offset,
            more_msg_id,
        },
    );

    Ok(())
}

/// Free text while a chat is open: persist through the REST API first,
/// then forward to the other participant. A forwarding failure is
/// logged only; the message is already durable server-side.
async fn relay_text(
    state: &BotState,
    user_id: i64,
    tg_chat_id: i64,
    content: &str,
) -> anyhow::Result<()> {
    let Some(chat_id) = state.sessions.get(&user_id).map(|s| s.chat_id) else {
        state
            .tg
            .send_message(
                tg_chat_id,
                "Open a chat first with /start <chat link> or /chats.",
                None,
            )
            .await?;
        return Ok(());
    };

    if let Err(e) = state.api.post_message(chat_id, user_id, content).await {
        tracing::error!(user = user_id, chat = %chat_id, error = %e, "failed to save message");
        state
            .tg
            .send_message(tg_chat_id, "Could not save your message, try again.", None)
            .await?;
        return Ok(());
    }

    match state.api.list_chats(user_id).await {
        Ok(chats) => {
            if let Some(chat) = chats.iter().find(|c| c.chat_id == chat_id) {
                if let Err(e) = state.tg.send_message(chat.other_user_id, content, None).await {
                    tracing::warn!(
                        user = user_id,
                        other = chat.other_user_id,
                        error = %e,
                        "message saved but live delivery failed"
                    );
                }
            }
        }
        Err(e) => {
            tracing::warn!(user = user_id, error = %e, "could not resolve chat partner for forwarding");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn msg(sender_id: i64, sender_name: &str, content: &str) -> MessageView {
        MessageView {
            message_id: Uuid::now_v7(),
            sender_id,
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            content_type: "text".to_string(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn start_with_payload_parses_chat_id() {
        let id = Uuid::now_v7();
        assert_eq!(parse_command(&format!("/start {id}")), Command::Start(Some(id)));
        assert_eq!(parse_command("/start"), Command::Start(None));
    }

    #[test]
    fn mangled_start_payload_is_flagged_not_swallowed() {
        assert_eq!(parse_command("/start not-a-uuid"), Command::BadStartLink);
        assert_eq!(
            parse_command("/start 123e4567-e89b-12d3-a456"),
            Command::BadStartLink
        );
    }

    #[test]
    fn keywords_map_to_commands() {
        assert_eq!(parse_command("/chats"), Command::ListChats);
        assert_eq!(parse_command("Chats"), Command::ListChats);
        assert_eq!(parse_command("/open"), Command::OpenChat);
        assert_eq!(parse_command("hello"), Command::Text("hello".to_string()));
    }

    #[test]
    fn callback_data_roundtrip() {
        let id = Uuid::now_v7();
        assert_eq!(parse_callback(&format!("chat_{id}")), Some(Callback::Open(id)));
        assert_eq!(
            parse_callback(&format!("more_{id}_50")),
            Some(Callback::More(id, 50))
        );
        assert_eq!(parse_callback("more_junk"), None);
        assert_eq!(parse_callback("unknown"), None);
    }

    #[test]
    fn history_groups_by_contiguous_sender() {
        let messages = vec![
            msg(1, "Alice", "hi"),
            msg(1, "Alice", "how are you?"),
            msg(2, "Bob", "good!"),
            msg(1, "Alice", "nice"),
        ];
        let out = render_history(&messages);
        assert_eq!(
            out,
            vec![
                "— Alice —",
                "hi",
                "how are you?",
                "— Bob —",
                "good!",
                "— Alice —",
                "nice",
            ]
        );
    }

    #[test]
    fn empty_history_renders_nothing() {
        assert!(render_history(&[]).is_empty());
    }
}
