use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_api_base() -> String { "http://localhost:5000".into() }
fn default_site_url() -> String { "http://localhost:3000".into() }
fn default_poll_timeout() -> u64 { 30 }

impl BotConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("AMORA_BOT").separator("__"))
            .build()?;
        let cfg: Self = config.try_deserialize()?;
        if cfg.bot_token.is_empty() {
            anyhow::bail!("AMORA_BOT__BOT_TOKEN is not set");
        }
        Ok(cfg)
    }
}
