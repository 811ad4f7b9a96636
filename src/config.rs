use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::streak::StreakClock;

pub const DEFAULT_DATABASE_PATH: &str = "unt.db";
pub const DEFAULT_QUESTIONS_DIR: &str = "question_sources";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 30;

/// Process configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub call_token: char,

    pub database_path: PathBuf,
    pub questions_dir: PathBuf,

    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_timeout: Duration,

    pub streak_clock: StreakClock,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        let discord_token = get("DISCORD_TOKEN")
            .context("Expected 'DISCORD_TOKEN=<token>' in .env in project root.")?;

        let call_token = match get("BOT_CALL_TOKEN") {
            None => '!',
            Some(token) => {
                let mut chars = token.chars();
                let first = chars.next().ok_or_else(|| anyhow!("BOT_CALL_TOKEN is empty."))?;
                if chars.next().is_some() {
                    log::warn!("$BOT_CALL_TOKEN not a single character. Truncating to {first}");
                }
                first
            }
        };

        let gemini_timeout = match get("GEMINI_TIMEOUT_SECS") {
            None => DEFAULT_GEMINI_TIMEOUT_SECS,
            Some(secs) => secs
                .parse::<u64>()
                .with_context(|| format!("GEMINI_TIMEOUT_SECS must be a number of seconds, got {secs}"))?,
        };

        let streak_clock = get("STREAK_CLOCK")
            .map(|clock| clock.parse::<StreakClock>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            discord_token,
            call_token,
            database_path: get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.into()).into(),
            questions_dir: get("QUESTIONS_DIR").unwrap_or_else(|| DEFAULT_QUESTIONS_DIR.into()).into(),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            gemini_timeout: Duration::from_secs(gemini_timeout),
            streak_clock,
        })
    }
}
