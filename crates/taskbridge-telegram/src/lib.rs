//! Telegram bot interface for Task Bridge.
//!
//! Lets a user list, create and complete tasks in a Supabase-hosted task
//! store from a Telegram chat.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `SUPABASE_URL`: Project URL, e.g. `https://xyz.supabase.co`
//! - `SUPABASE_ANON_KEY`: Project API key
//! - `TASKBRIDGE_USER_ID`: UUID owning the tasks
//!
//! - `TASKBRIDGE_ALLOWED_CHATS`: Comma-separated chat IDs allowed to use the
//!   bot, or `*` for any chat. The bot answers nobody without it.
//!
//! Optional:
//! - `TASKBRIDGE_STRICT_PRIORITY`: Reject priorities other than URGENT/HIGH/MEDIUM/LOW
//! - `TASKBRIDGE_HTTP_TIMEOUT_SECS`: Task store request timeout (default: 30)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskbridge_core::Settings;
//! use taskbridge_store::SupabaseRepository;
//! use taskbridge_telegram::TaskBot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env()?;
//!     let store = SupabaseRepository::from_settings(&settings)?;
//!     let bot = TaskBot::new(settings, Arc::new(store));
//!     bot.start_polling().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! - `/start`, `/help` - Usage
//! - `/tasks`, `/deep` - Deep work tasks with subtasks
//! - `/light` - Light work tasks
//! - `/briefing` - Morning briefing
//! - `/add` - Create a task step by step
//! - `/cancel` - Abandon task creation
//! - `/complete <id>` - Mark a task complete

pub mod bot;
pub mod error;
pub mod handlers;
pub mod reply;
pub mod state;

pub use bot::TaskBot;
pub use error::{Result, TelegramError};
pub use state::{create_shared_state, BridgeState};
