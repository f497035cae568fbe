//! Command, message and callback handlers for the Telegram bot.

use std::sync::Arc;

use taskbridge_core::{classify, ConversationId, Intent, RepositoryError, WizardInput, HELP_HINT};
use taskbridge_models::{TaskCategory, TaskId};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, MaybeInaccessibleMessage};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use crate::reply::{parse_category_callback, send_html, send_reply};
use crate::state::{briefing_day, BridgeState};

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Show deep work tasks with subtasks")]
    Tasks,

    #[command(description = "Show deep work tasks with subtasks")]
    Deep,

    #[command(description = "Show light work tasks")]
    Light,

    #[command(description = "Morning briefing")]
    Briefing,

    #[command(description = "Create a new task (interactive)")]
    Add,

    #[command(description = "Cancel task creation")]
    Cancel,

    #[command(description = "Mark a task complete: /complete <id>")]
    Complete(String),
}

const STORE_UNAVAILABLE: &str = "❌ Could not reach the task store. Please try again.";

fn conversation(chat_id: ChatId) -> ConversationId {
    ConversationId::new(chat_id.0)
}

async fn report_store_error(bot: &Bot, chat_id: ChatId, e: RepositoryError) -> ResponseResult<()> {
    error!(chat_id = %chat_id, error = %e, "Task store request failed");
    bot.send_message(chat_id, STORE_UNAVAILABLE).await?;
    Ok(())
}

/// Handle the /start command.
pub async fn handle_start(bot: Bot, msg: Message) -> ResponseResult<()> {
    let welcome = "<b>🤖 Task Bridge</b>\n\n\
        I can read and write the tasks in your task store.\n\n\
        <b>Commands:</b>\n\
        /tasks - Show deep work tasks with subtasks\n\
        /light - Show light work tasks\n\
        /add - Create a new task (interactive)\n\
        /briefing - Morning briefing\n\
        /complete &lt;id&gt; - Mark task complete\n\
        /cancel - Stop creating a task\n\n\
        Just chat with me naturally or use commands!";

    send_html(&bot, msg.chat.id, welcome).await?;

    info!(chat_id = %msg.chat.id, user = ?msg.from.as_ref().map(|u| &u.username), "User started bot");
    Ok(())
}

/// Handle the /help command.
pub async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    let help_text = Command::descriptions().to_string();
    bot.send_message(msg.chat.id, help_text).await?;
    Ok(())
}

/// Send the open tasks of a category.
pub async fn handle_list(
    bot: Bot,
    chat_id: ChatId,
    state: Arc<BridgeState>,
    category: TaskCategory,
) -> ResponseResult<()> {
    bot.send_chat_action(chat_id, ChatAction::Typing).await?;
    match state.task_list_text(category).await {
        Ok(text) => send_html(&bot, chat_id, text).await,
        Err(e) => report_store_error(&bot, chat_id, e).await,
    }
}

/// Send the morning briefing.
pub async fn handle_briefing(
    bot: Bot,
    chat_id: ChatId,
    state: Arc<BridgeState>,
) -> ResponseResult<()> {
    bot.send_chat_action(chat_id, ChatAction::Typing).await?;
    let today = briefing_day(chrono::Utc::now());
    match state.briefing_text(today).await {
        Ok(text) => send_html(&bot, chat_id, text).await,
        Err(e) => report_store_error(&bot, chat_id, e).await,
    }
}

/// Start the task creation wizard.
pub async fn handle_add(bot: Bot, chat_id: ChatId, state: Arc<BridgeState>) -> ResponseResult<()> {
    let reply = state.wizard().start(conversation(chat_id)).await;
    send_reply(&bot, chat_id, reply, None).await
}

/// Handle the /cancel command.
pub async fn handle_cancel(bot: Bot, msg: Message, state: Arc<BridgeState>) -> ResponseResult<()> {
    match state.wizard().cancel(conversation(msg.chat.id)).await {
        Some(reply) => send_reply(&bot, msg.chat.id, reply, None).await,
        None => {
            bot.send_message(msg.chat.id, "Nothing to cancel.").await?;
            Ok(())
        }
    }
}

/// Handle the /complete command.
pub async fn handle_complete(
    bot: Bot,
    msg: Message,
    state: Arc<BridgeState>,
    arg: String,
) -> ResponseResult<()> {
    let id = arg.trim();
    if id.is_empty() {
        send_html(
            &bot,
            msg.chat.id,
            "Please provide a task ID.\n\n<b>Usage:</b> <code>/complete ID</code>\n\n\
             Use /tasks to see task IDs.",
        )
        .await?;
        return Ok(());
    }

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;
    match state.complete(&TaskId::from(id)).await {
        Ok(Some(category)) => {
            info!(chat_id = %msg.chat.id, task_id = %id, category = %category, "Task completed");
            bot.send_message(msg.chat.id, "✅ Task marked as complete!").await?;
        }
        Ok(None) => {
            bot.send_message(
                msg.chat.id,
                "❌ Could not find task with that ID. Use /tasks to see task IDs.",
            )
            .await?;
        }
        Err(e) => report_store_error(&bot, msg.chat.id, e).await?,
    }
    Ok(())
}

/// Handle a plain text message.
///
/// Feeds the wizard when one is running for the chat; otherwise routes by
/// keyword.
pub async fn handle_message(bot: Bot, msg: Message, state: Arc<BridgeState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    if !state.is_authorized(chat_id) {
        debug!(chat_id = %chat_id, "Ignoring message from unauthorized chat");
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    if let Some(transition) = state
        .wizard()
        .handle(conversation(chat_id), WizardInput::text(text))
        .await
    {
        debug!(chat_id = %chat_id, outcome = ?transition.outcome, "Wizard input handled");
        return send_reply(&bot, chat_id, transition.reply, None).await;
    }

    match classify(text) {
        Intent::AddTask => handle_add(bot, chat_id, state).await,
        Intent::Briefing => handle_briefing(bot, chat_id, state).await,
        Intent::DeepTasks => handle_list(bot, chat_id, state, TaskCategory::Deep).await,
        Intent::LightTasks => handle_list(bot, chat_id, state, TaskCategory::Light).await,
        Intent::Help => {
            bot.send_message(chat_id, HELP_HINT).await?;
            Ok(())
        }
    }
}

/// Handle an inline keyboard press.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<BridgeState>,
) -> ResponseResult<()> {
    let message = q.message.as_ref();
    let chat_id = message.map(|m| m.chat().id);
    let message_id = message.map(MaybeInaccessibleMessage::id);

    let category = q.data.as_deref().and_then(parse_category_callback);

    let (Some(chat_id), Some(category)) = (chat_id, category) else {
        warn!(data = ?q.data, "Unhandled callback query");
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    if !state.is_authorized(chat_id) {
        debug!(chat_id = %chat_id, "Ignoring callback from unauthorized chat");
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    }

    let transition = state
        .wizard()
        .handle(conversation(chat_id), WizardInput::CategorySelected(category))
        .await;

    bot.answer_callback_query(q.id).await?;

    match transition {
        Some(transition) => send_reply(&bot, chat_id, transition.reply, message_id).await,
        None => {
            debug!(chat_id = %chat_id, "Category picked with no wizard running");
            bot.send_message(chat_id, "That prompt has expired. Use /add to start again.")
                .await?;
            Ok(())
        }
    }
}

/// Dispatch a parsed command.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BridgeState>,
) -> ResponseResult<()> {
    if !state.is_authorized(msg.chat.id) {
        debug!(chat_id = %msg.chat.id, "Ignoring command from unauthorized chat");
        return Ok(());
    }

    let chat_id = msg.chat.id;
    match cmd {
        Command::Start => handle_start(bot, msg).await,
        Command::Help => handle_help(bot, msg).await,
        Command::Tasks | Command::Deep => handle_list(bot, chat_id, state, TaskCategory::Deep).await,
        Command::Light => handle_list(bot, chat_id, state, TaskCategory::Light).await,
        Command::Briefing => handle_briefing(bot, chat_id, state).await,
        Command::Add => handle_add(bot, chat_id, state).await,
        Command::Cancel => handle_cancel(bot, msg, state).await,
        Command::Complete(id) => handle_complete(bot, msg, state, id).await,
    }
}
