use std::sync::Arc;

use arch_bot_commons::{names::user_name_prettyprint, useful_methods::BotStuff};
use chrono::Utc;
use html_escape::encode_text;
use teloxide::{
    payloads::SendMessageSetters,
    requests::Requester,
    types::{BotCommand, ChatId, Me, Message},
    Bot,
};

use crate::{
    config::Config,
    dialogue::{reset, ReviewDialogue, State},
    error::HandlerError,
    keyboards,
    store::Store,
    types::ReviewId,
    workflow::{self, SubmitError, Submission},
};

pub mod callbacks;
pub mod membership;
mod moderation;
mod screens;
mod settings;

pub const GREETING: &str = "Hi! 👋\nHere you can leave a review.";
pub const ADMIN_PANEL: &str = "⚙️ Admin panel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Admin,
}

/// Find a command at the start of this text. Commands addressed to other bots
/// (`/start@SomeOtherBot`) are not ours.
fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    if !text.starts_with('/') {
        return None;
    }
    let command = text.split_whitespace().next()?;

    let callname = if let Some((callname, username)) = command.split_once('@') {
        // Bot names are guaranteed ASCII, so ignore ASCII case specifically.
        if !username.eq_ignore_ascii_case(bot_username) {
            return None;
        }
        callname
    } else {
        command
    };

    match callname.to_lowercase().as_str() {
        "/start" => Some(Command::Start),
        "/admin" => Some(Command::Admin),
        _ => None,
    }
}

pub fn generate_bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Leave a review"),
        BotCommand::new("admin", "Admin panel"),
    ]
}

pub async fn send_main_menu(bot: &Bot, chat: ChatId) -> Result<(), HandlerError> {
    bot.send_message(chat, GREETING)
        .reply_markup(keyboards::main_menu())
        .await?;
    Ok(())
}

pub async fn send_admin_panel(bot: &Bot, chat: ChatId, store: &Store) -> Result<(), HandlerError> {
    let pending = store.read(|d| d.pending_reviews.len()).await;
    bot.send_message(chat, ADMIN_PANEL)
        .reply_markup(keyboards::admin_panel(pending))
        .await?;
    Ok(())
}

pub async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    dialogue: ReviewDialogue,
    state: State,
    store: Arc<Store>,
    config: Arc<Config>,
) -> Result<(), HandlerError> {
    // All conversations happen in DMs.
    if !message.chat.is_private() {
        return Ok(());
    }
    let Some(user) = &message.from else {
        return Ok(());
    };
    let is_admin = config.is_admin(user.id);

    if let Some(command) = message
        .text()
        .and_then(|text| parse_command(text, me.username()))
    {
        match command {
            Command::Start => {
                reset(&dialogue).await?;
                send_main_menu(&bot, message.chat.id).await?;
            }
            Command::Admin if is_admin => {
                reset(&dialogue).await?;
                send_admin_panel(&bot, message.chat.id, &store).await?;
            }
            Command::Admin => {
                log::info!(
                    "Unauthorized user trying to access the admin panel: {}",
                    user_name_prettyprint(user, true)
                );
                bot.send_message(message.chat.id, "⛔ You don't have access to this command.")
                    .await?;
            }
        }
        return Ok(());
    }

    match state {
        State::AwaitingReview => receive_review(&bot, &message, &dialogue, &store, &config).await,
        State::AwaitingRejectionReason { review_id } if is_admin => {
            receive_rejection_reason(&bot, &message, &dialogue, &store, review_id).await
        }
        State::Idle => {
            log::debug!("Ignoring a message outside of any conversation.");
            reset(&dialogue).await
        }
        State::AwaitingRejectionReason { .. } | State::AwaitingConfirmation { .. } => {
            log::debug!("Ignoring a message outside of any conversation.");
            Ok(())
        }
    }
}

async fn receive_review(
    bot: &Bot,
    message: &Message,
    dialogue: &ReviewDialogue,
    store: &Store,
    config: &Config,
) -> Result<(), HandlerError> {
    let Some(submission) = Submission::from_message(message) else {
        return Ok(());
    };
    let is_admin = config.is_admin(submission.user_id);
    let submitter_name = message
        .from
        .as_ref()
        .map(|user| user_name_prettyprint(user, false))
        .unwrap_or_default();

    let result = store
        .mutate(|document| workflow::submit(document, submission, is_admin, Utc::now()))
        .await?;

    match result {
        Ok(id) => {
            reset(dialogue).await?;
            log::info!("New review {id} from {submitter_name}.");

            bot.send_best_effort(
                config.admin_id,
                format!(
                    "🔔 New review awaiting moderation from {}.",
                    encode_text(&submitter_name)
                ),
            )
            .await;
            bot.send_message(
                message.chat.id,
                "✅ Thank you! Your review was sent for moderation.",
            )
            .await?;
            send_main_menu(bot, message.chat.id).await?;
        }
        Err(e @ SubmitError::Blocked(_)) => {
            // Got locked or cooled down while they were typing.
            reset(dialogue).await?;
            bot.send_message(message.chat.id, e.to_string()).await?;
            send_main_menu(bot, message.chat.id).await?;
        }
        Err(e) => {
            // Let them try again.
            bot.send_message(message.chat.id, e.to_string()).await?;
        }
    }
    Ok(())
}

async fn receive_rejection_reason(
    bot: &Bot,
    message: &Message,
    dialogue: &ReviewDialogue,
    store: &Store,
    review_id: ReviewId,
) -> Result<(), HandlerError> {
    let Some(reason) = message.text() else {
        bot.send_message(message.chat.id, "Please send the reason as text.")
            .await?;
        return Ok(());
    };

    reset(dialogue).await?;

    match workflow::reject(store, review_id).await? {
        None => {
            bot.send_message(message.chat.id, screens::ALREADY_PROCESSED)
                .await?;
        }
        Some(review) => {
            bot.send_best_effort(
                review.submitter(),
                format!(
                    "❌ Unfortunately, your review was rejected.\n<b>Reason:</b> {}",
                    encode_text(reason)
                ),
            )
            .await;
            bot.send_message(
                message.chat.id,
                "✅ The reason was sent, the review is rejected.",
            )
            .await?;
        }
    }

    send_admin_panel(bot, message.chat.id, store).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_commands() {
        assert_eq!(parse_command("/start", "ReviewBot"), Some(Command::Start));
        assert_eq!(parse_command("/START now", "ReviewBot"), Some(Command::Start));
        assert_eq!(parse_command("/admin@reviewbot", "ReviewBot"), Some(Command::Admin));
        assert_eq!(parse_command("/admin@OtherBot", "ReviewBot"), None);
        assert_eq!(parse_command("/help", "ReviewBot"), None);
        assert_eq!(parse_command("start", "ReviewBot"), None);
    }

    #[test]
    fn commands_are_registered() {
        let commands = generate_bot_commands();
        let names: Vec<_> = commands.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(names, ["start", "admin"]);
    }
}
