use anyhow::{Context, Result};
use dotenv::dotenv;

use unt_tutor::config::Config;
use unt_tutor::{untbot, untdb};

#[tokio::main]
async fn main() -> Result<()> {
    // .env may carry RUST_LOG, so load it before the logger
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    // Initialize database
    let connection = untdb::connect(&config.database_path)
        .with_context(|| format!("Couldn't open database at {}", config.database_path.display()))?;
    untdb::initialize_db(&connection).context("Couldn't initialize database.")?;
    drop(connection);

    untbot::run_untbot(config).await
}
