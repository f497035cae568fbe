//! Task Bridge Telegram Bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx SUPABASE_URL=https://xyz.supabase.co \
//!   SUPABASE_ANON_KEY=xxx TASKBRIDGE_USER_ID=<uuid> cargo run -p taskbridge-telegram
//! ```

use std::sync::Arc;

use clap::Parser;
use taskbridge_core::{config, Settings};
use taskbridge_store::SupabaseRepository;
use taskbridge_telegram::TaskBot;
use tracing_subscriber::EnvFilter;

/// Task Bridge Telegram Bot - manage deep and light work tasks from Telegram
#[derive(Parser, Debug)]
#[command(name = "taskbridge-telegram")]
#[command(about = "Telegram bot for Task Bridge - list, create and complete tasks remotely")]
struct Args {
    /// Only accept URGENT, HIGH, MEDIUM or LOW as priorities
    #[arg(long)]
    strict_priority: bool,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

async fn run(args: Args) -> taskbridge_telegram::Result<()> {
    let mut settings = Settings::from_env()?;
    if args.strict_priority {
        settings.strict_priority = true;
    }

    let store = SupabaseRepository::from_settings(&settings)?;
    tracing::info!(
        store = %settings.store_url,
        user_id = %settings.user_id,
        allowed_chats = settings.allowed_chats.len(),
        allow_any_chat = settings.allow_any_chat,
        strict_priority = settings.strict_priority,
        "Task store configured"
    );

    if settings.denies_every_chat() {
        tracing::warn!(
            "TASKBRIDGE_ALLOWED_CHATS is empty; every chat will be ignored. \
             List chat IDs, or use * to allow any chat"
        );
    }

    let bot = TaskBot::new(settings, Arc::new(store));

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] Task Bridge Bot");
            println!("   Bot: @{}", username);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e);
        }
    }

    println!("\n[phone] Open Telegram and send /start to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    config::load_env_files();

    let filter = match args.verbose {
        0 => "taskbridge_telegram=info,taskbridge_core=info,taskbridge_store=info,teloxide=warn",
        1 => "taskbridge_telegram=debug,taskbridge_core=debug,taskbridge_store=debug,teloxide=info",
        2 => "taskbridge_telegram=trace,taskbridge_core=trace,taskbridge_store=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = config::ensure_config_dir() {
        tracing::warn!(error = %e, "Failed to create config directory");
    }

    run(args).await?;
    Ok(())
}
