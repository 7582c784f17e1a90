//! Client for the Amora REST API. The bot is just another consumer of
//! the same endpoints the browser uses.

use amora_shared::types::chat::{ChatPreview, MessagePosted, MessageView, SendMessageRequest};
use amora_shared::types::{ApiErrorResponse, ApiResponse};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into(),
        }
    }

    async fn unwrap_envelope<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> anyhow::Result<T> {
        if resp.status().is_success() {
            let envelope: ApiResponse<serde_json::Value> = resp.json().await?;
            Ok(serde_json::from_value(envelope.data)?)
        } else {
            let status = resp.status();
            let message = match resp.json::<ApiErrorResponse>().await {
                Ok(err) => err.error.message,
                Err(_) => "unreadable error response".to_string(),
            };
            anyhow::bail!("api request failed ({status}): {message}")
        }
    }

    pub async fn list_chats(&self, user_id: i64) -> anyhow::Result<Vec<ChatPreview>> {
        let resp = self
            .http
            .get(format!("{}/chats", self.base))
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        Self::unwrap_envelope(resp).await
    }

    pub async fn list_messages(
        &self,
        chat_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<MessageView>> {
        let resp = self
            .http
            .get(format!("{}/chats/{chat_id}/messages", self.base))
            .query(&[("offset", offset), ("limit", limit)])
            .send()
            .await?;
        Self::unwrap_envelope(resp).await
    }

    pub async fn post_message(
        &self,
        chat_id: Uuid,
        sender_id: i64,
        content: &str,
    ) -> anyhow::Result<MessagePosted> {
        let body = SendMessageRequest {
            sender_id,
            content: content.to_string(),
            content_type: "text".to_string(),
        };
        let resp = self
            .http
            .post(format!("{}/chats/{chat_id}/messages", self.base))
            .json(&body)
            .send()
            .await?;
        Self::unwrap_envelope(resp).await
    }
}
