pub mod commands;

use std::path::PathBuf;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::models::Subject;
use crate::questions::QuestionStore;
use crate::streak::StreakClock;
use crate::untai::Tutor;
use crate::untai::gemini::GeminiClient;
use crate::untdb;

pub use commands::{Author, Commands};

/// Discord refuses longer messages.
const MAX_MESSAGE_LENGTH: usize = 2000;

/// Everything a command needs besides its database connection.
pub struct BotState<M = GeminiClient> {
    pub store: QuestionStore,
    pub tutor: Tutor<M>,
    pub call_token: char,
    pub streak_clock: StreakClock,
}

pub async fn run_untbot(config: Config) -> Result<()> {
    let tutor = match &config.gemini_api_key {
        Some(api_key) => Tutor::new(GeminiClient::new(api_key, &config.gemini_model, config.gemini_timeout)?),
        None => {
            log::warn!("GEMINI_API_KEY not set, AI explanations are disabled.");
            Tutor::disabled()
        }
    };

    let store = QuestionStore::new(&config.questions_dir);
    for subject in Subject::ALL {
        match store.load(subject) {
            Ok(bank) => log::info!(
                "Loaded {} {subject} questions ({} rejected).",
                bank.records().len(),
                bank.rejected()
            ),
            Err(err) => log::warn!("{err}"),
        }
    }

    let handler = UntHandler {
        state: BotState {
            store,
            tutor,
            call_token: config.call_token,
            streak_clock: config.streak_clock,
        },
        database_path: config.database_path,
    };

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .context("Error creating client.")?;

    client.start().await?;

    Ok(())
}

/// Cuts `text` down to what fits in one message.
fn fit_message(text: String) -> String {
    if text.chars().count() <= MAX_MESSAGE_LENGTH {
        return text;
    }

    let mut fitted = text.chars().take(MAX_MESSAGE_LENGTH - 1).collect::<String>();
    fitted.push('…');
    fitted
}

struct UntHandler {
    state: BotState,
    database_path: PathBuf,
}

impl UntHandler {
    async fn respond(&self, msg: &Message) -> Result<Option<String>> {
        let author = Author {
            id: i64::try_from(msg.author.id.get()).context("Discord user id out of range.")?,
            name: msg.author.global_name.as_deref().unwrap_or(&msg.author.name),
        };

        let mut connection = untdb::connect(&self.database_path)
            .with_context(|| format!("Couldn't open database at {}", self.database_path.display()))?;

        Commands::respond(&self.state, &mut connection, author, &msg.content).await
    }
}

#[async_trait]
impl EventHandler for UntHandler {
    async fn ready(&self, _ctx: serenity::client::Context, ready: Ready) {
        log::info!("{} is connected and ready!", ready.user.name);
    }

    async fn message(&self, ctx: serenity::client::Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let response = match self.respond(&msg).await {
            Ok(Some(message)) => message,
            Ok(None) => return,
            Err(err) => {
                log::error!("Command from {} failed: {err:#}", msg.author.name);
                format!("Error: {err}")
            }
        };

        // Discord doesn't like sending empty messages.
        if response.is_empty() {
            return;
        }

        // If the reply can't be sent, try to at least say so. If *that* fails too,
        //   it will be logged on our end anyways.
        if let Err(why) = msg.channel_id.say(&ctx.http, fit_message(response)).await {
            let _ = msg.channel_id.say(&ctx.http, "Oops, internal error.").await;
            log::error!("Error sending message: {why:?}");
        }
    }
}
