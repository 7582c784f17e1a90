use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

mod api;
mod config;
mod handlers;
mod telegram;

use api::ApiClient;
use config::BotConfig;
use handlers::BotState;
use telegram::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amora_shared::middleware::init_tracing("amora-bot");

    let config = BotConfig::load()?;
    let poll_timeout = config.poll_timeout_secs;

    let state = Arc::new(BotState {
        tg: TelegramClient::new(&config.bot_token),
        api: ApiClient::new(&config.api_base),
        sessions: DashMap::new(),
        config,
    });

    tracing::info!("amora-bot starting long-poll loop");

    let mut offset = 0i64;
    loop {
        let updates = match state.tg.get_updates(offset, poll_timeout).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::error!(error = %e, "getUpdates failed, backing off");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            if let Err(e) = handlers::handle_update(&state, update).await {
                tracing::error!(error = %e, "update handling failed");
            }
        }
    }
}
