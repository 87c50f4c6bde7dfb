use std::sync::Arc;

use arch_bot_commons::names::user_name_prettyprint;
use teloxide::{
    payloads::AnswerCallbackQuerySetters,
    requests::Requester,
    types::{CallbackQuery, Message, User},
    Bot,
};

use crate::{
    config::Config,
    dialogue::{reset, switch_to, ReviewDialogue, State},
    error::HandlerError,
    store::Store,
    types::Action,
};

use super::{moderation, screens, settings};

/// Telegram doesn't show more than this in a callback answer.
const MAX_NOTICE_CHARS: usize = 200;

/// Text shown to whoever pressed the button, in a popup.
pub type Notice = Option<String>;

/// Put two notices together, one per line.
pub fn join(first: Notice, second: Notice) -> Notice {
    match (first, second) {
        (Some(first), Some(second)) => Some(format!("{first}\n{second}")),
        (first, second) => first.or(second),
    }
}

/// Everything a button press needs: who pressed it, and the menu message it's on.
pub struct Ctx<'a> {
    pub bot: &'a Bot,
    pub store: &'a Store,
    pub config: &'a Config,
    pub dialogue: &'a ReviewDialogue,
    pub message: &'a Message,
    pub user: &'a User,
}

impl Ctx<'_> {
    pub fn is_admin(&self) -> bool {
        self.config.is_admin(self.user.id)
    }
}

pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    dialogue: ReviewDialogue,
    state: State,
    store: Arc<Store>,
    config: Arc<Config>,
) -> Result<(), HandlerError> {
    macro_rules! goodbye {
        ($text:expr) => {
            if state == State::Idle {
                reset(&dialogue).await?;
            }
            bot.answer_callback_query(query.id.clone())
                .text($text)
                .show_alert(true)
                .await?;
            return Ok(());
        };
    }

    let Some(data) = &query.data else {
        goodbye!("No query data.");
    };

    let action: Action = match data.parse() {
        Ok(action) => action,
        Err(e) => {
            log::warn!("Received unparsable callback data {data:?}: {e}");
            goodbye!("Unknown action.");
        }
    };

    if action.is_admin_only() && !config.is_admin(query.from.id) {
        log::info!(
            "Unauthorized user pressing admin buttons: {}",
            user_name_prettyprint(&query.from, true)
        );
        goodbye!("⛔ Access denied.");
    }

    let Some(message) = query.regular_message() else {
        // May happen if the message is too old
        goodbye!("This menu is too old. Please send /start to get a new one.");
    };

    log::debug!("{} pressed {action:?}", query.from.id);
    switch_to(&dialogue, state.after_pressing(action)).await?;

    let ctx = Ctx {
        bot: &bot,
        store: &store,
        config: &config,
        dialogue: &dialogue,
        message,
        user: &query.from,
    };

    let notice = match action {
        Action::MainMenu => screens::main_menu(&ctx).await?,
        Action::LeaveReview => moderation::start_review(&ctx).await?,
        Action::AdminPanel => screens::admin_panel(&ctx).await?,
        Action::PendingList => screens::pending_list(&ctx).await?,
        Action::Inspect(id) => screens::inspect(&ctx, id).await?,
        Action::Approve(id) => moderation::approve(&ctx, id).await?,
        Action::RejectMenu(id) => screens::reject_menu(&ctx, id).await?,
        Action::RejectSilently(id) => moderation::reject_silently(&ctx, id).await?,
        Action::RejectWithReason(id) => moderation::ask_rejection_reason(&ctx, id).await?,
        Action::Groups => screens::groups(&ctx).await?,
        Action::Group(chat) => screens::group(&ctx, chat).await?,
        Action::SetMainGroup(chat) => settings::set_main_group(&ctx, chat).await?,
        Action::Restrictions => screens::restrictions(&ctx).await?,
        Action::CooldownMenu => screens::cooldown_menu(&ctx).await?,
        Action::Request(pending) => screens::confirmation(&ctx, pending).await?,
        Action::Confirm => match state.pending_confirmation() {
            Some(pending) => settings::carry_out(&ctx, pending).await?,
            None => join(
                Some("This confirmation has expired.".to_string()),
                screens::admin_panel(&ctx).await?,
            ),
        },
    };

    let answer = bot.answer_callback_query(query.id.clone());
    match notice {
        Some(text) => {
            let text: String = text.chars().take(MAX_NOTICE_CHARS).collect();
            answer.text(text).show_alert(true).await?;
        }
        None => {
            answer.await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joining_notices() {
        assert_eq!(join(None, None), None);
        assert_eq!(join(Some("a".into()), None), Some("a".into()));
        assert_eq!(join(None, Some("b".into())), Some("b".into()));
        assert_eq!(join(Some("a".into()), Some("b".into())), Some("a\nb".into()));
    }
}
