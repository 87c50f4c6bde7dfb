//! Menus, each rendered in place of the message whose button was pressed.

use std::future::Future;

use arch_bot_commons::useful_methods::BotStuff;
use html_escape::encode_text;
use teloxide::{
    payloads::SendPhotoSetters,
    requests::Requester,
    types::{ChatId, InputFile, ParseMode},
    RequestError,
};
use url::Url;

use crate::{
    dialogue::reset,
    error::HandlerError,
    keyboards,
    types::{humanize_duration, Action, Cooldown, PendingAction, ReviewId},
};

use super::{
    callbacks::{join, Ctx, Notice},
    ADMIN_PANEL, GREETING,
};

pub const ALREADY_PROCESSED: &str = "This review has already been processed.";

pub async fn main_menu(ctx: &Ctx<'_>) -> Result<Notice, HandlerError> {
    ctx.bot
        .replace_menu(ctx.message, GREETING.to_string(), keyboards::main_menu())
        .await?;
    Ok(None)
}

pub async fn admin_panel(ctx: &Ctx<'_>) -> Result<Notice, HandlerError> {
    let pending = ctx.store.read(|d| d.pending_reviews.len()).await;
    ctx.bot
        .replace_menu(
            ctx.message,
            ADMIN_PANEL.to_string(),
            keyboards::admin_panel(pending),
        )
        .await?;
    Ok(None)
}

/// One button per pending review. With none pending, says so and goes back to the admin panel.
pub async fn pending_list(ctx: &Ctx<'_>) -> Result<Notice, HandlerError> {
    let keyboard = ctx
        .store
        .read(|d| {
            if d.pending_reviews.is_empty() {
                None
            } else {
                Some(keyboards::pending_list(&d.pending_reviews))
            }
        })
        .await;

    let Some(keyboard) = keyboard else {
        admin_panel(ctx).await?;
        return Ok(Some("✅ There are no reviews to moderate.".to_string()));
    };

    ctx.bot
        .replace_menu(
            ctx.message,
            "👀 Reviews awaiting moderation:".to_string(),
            keyboard,
        )
        .await?;
    Ok(None)
}

/// Show the review in full, with the photo if it has one.
pub async fn inspect(ctx: &Ctx<'_>, id: ReviewId) -> Result<Notice, HandlerError> {
    let Some(review) = ctx.store.read(|d| d.pending_reviews.get(&id).cloned()).await else {
        return Ok(join(
            Some(ALREADY_PROCESSED.to_string()),
            pending_list(ctx).await?,
        ));
    };

    let handle = match &review.username {
        Some(username) => format!("@{}", encode_text(username)),
        None => "no username".to_string(),
    };
    let text = format!(
        "<b>Review from {}</b> ({})\n\n<i>\"{}\"</i>",
        encode_text(&review.first_name),
        handle,
        encode_text(&review.text)
    );

    if let Some(photo) = review.photo() {
        if let Err(e) = ctx
            .bot
            .delete_message(ctx.message.chat.id, ctx.message.id)
            .await
        {
            log::debug!("Failed to delete the menu before showing a photo: {e}");
        }
        ctx.bot
            .send_photo(ctx.message.chat.id, InputFile::file_id(photo))
            .caption(text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::review_actions(id))
            .await?;
    } else {
        ctx.bot
            .replace_menu(ctx.message, text, keyboards::review_actions(id))
            .await?;
    }
    Ok(None)
}

pub async fn reject_menu(ctx: &Ctx<'_>, id: ReviewId) -> Result<Notice, HandlerError> {
    if !ctx.store.read(|d| d.pending_reviews.contains_key(&id)).await {
        return Ok(join(
            Some(ALREADY_PROCESSED.to_string()),
            pending_list(ctx).await?,
        ));
    }

    ctx.bot
        .replace_menu(
            ctx.message,
            "How should the review be rejected?".to_string(),
            keyboards::reject_menu(id),
        )
        .await?;
    Ok(None)
}

pub async fn groups(ctx: &Ctx<'_>) -> Result<Notice, HandlerError> {
    let keyboard = ctx
        .store
        .read(|d| {
            if d.groups.is_empty() {
                None
            } else {
                Some(keyboards::groups_list(d))
            }
        })
        .await;

    match keyboard {
        Some(keyboard) => {
            ctx.bot
                .replace_menu(ctx.message, "👥 My groups:".to_string(), keyboard)
                .await?
        }
        None => {
            ctx.bot
                .replace_menu(
                    ctx.message,
                    concat!(
                        "The bot isn't in any group yet.\n",
                        "To add a group, make the bot an administrator in it."
                    )
                    .to_string(),
                    keyboards::back(Action::AdminPanel),
                )
                .await?
        }
    }
    Ok(None)
}

pub async fn group(ctx: &Ctx<'_>, chat: ChatId) -> Result<Notice, HandlerError> {
    let group = ctx
        .store
        .read(|d| d.group(chat).cloned().map(|g| (g, d.main_group() == Some(chat))))
        .await;
    let Some((group, is_main)) = group else {
        return Ok(join(
            Some("Group not found.".to_string()),
            groups(ctx).await?,
        ));
    };

    let bot = ctx.bot;
    let invite_link = find_invite_link(
        move || async move {
            bot.get_chat(chat)
                .await
                .map(|full| full.invite_link().map(str::to_string))
        },
        move || async move { bot.export_chat_invite_link(chat).await },
    )
    .await;
    let invite_link = match invite_link {
        Ok(link) => Url::parse(&link).ok(),
        Err(e) => {
            // Needs admin rights in there. No button then.
            log::debug!("No invite link for {chat}: {e}");
            None
        }
    };

    ctx.bot
        .replace_menu(
            ctx.message,
            format!("Group: <b>{}</b>", encode_text(&group.title)),
            keyboards::group_options(&group, is_main, invite_link),
        )
        .await?;
    Ok(None)
}

/// The chat's current invite link, or a freshly exported one if it has none.
///
/// Exporting revokes the previous primary link, so it only happens when there's nothing to reuse.
async fn find_invite_link<C, CFut, E, EFut>(current: C, export: E) -> Result<String, RequestError>
where
    C: FnOnce() -> CFut,
    CFut: Future<Output = Result<Option<String>, RequestError>>,
    E: FnOnce() -> EFut,
    EFut: Future<Output = Result<String, RequestError>>,
{
    match current().await? {
        Some(link) => Ok(link),
        None => export().await,
    }
}

pub async fn restrictions(ctx: &Ctx<'_>) -> Result<Notice, HandlerError> {
    let settings = ctx.store.read(|d| d.settings).await;
    ctx.bot
        .replace_menu(
            ctx.message,
            "⚙️ Restriction settings".to_string(),
            keyboards::restrictions(&settings),
        )
        .await?;
    Ok(None)
}

pub async fn cooldown_menu(ctx: &Ctx<'_>) -> Result<Notice, HandlerError> {
    ctx.bot
        .replace_menu(
            ctx.message,
            "⏳ Choose the cooldown between reviews of one user:".to_string(),
            keyboards::cooldown_presets(),
        )
        .await?;
    Ok(None)
}

/// Ask whether to really do this. The action itself waits in the dialogue state.
pub async fn confirmation(ctx: &Ctx<'_>, pending: PendingAction) -> Result<Notice, HandlerError> {
    let (question, cancel_to) = match pending {
        PendingAction::LeaveGroup(chat) => {
            let Some(title) = ctx.store.read(|d| d.group(chat).map(|g| g.title.clone())).await
            else {
                reset(ctx.dialogue).await?;
                return Ok(join(
                    Some("Group not found.".to_string()),
                    groups(ctx).await?,
                ));
            };
            (
                format!(
                    "Are you sure you want the bot to leave <b>{}</b>?",
                    encode_text(&title)
                ),
                Action::Group(chat),
            )
        }
        PendingAction::SetLock(true) => (
            "Are you sure you want to lock submitting reviews for everyone?".to_string(),
            Action::Restrictions,
        ),
        PendingAction::SetLock(false) => (
            "Are you sure you want to unlock submitting reviews for everyone?".to_string(),
            Action::Restrictions,
        ),
        PendingAction::SetCooldown(Cooldown::Disabled) => (
            "Are you sure you want to disable the cooldown between reviews?".to_string(),
            Action::Restrictions,
        ),
        PendingAction::SetCooldown(cooldown) => (
            format!(
                "Are you sure you want to set the cooldown between reviews of one user to {}?",
                humanize_duration(cooldown.seconds())
            ),
            Action::Restrictions,
        ),
    };

    ctx.bot
        .replace_menu(ctx.message, question, keyboards::confirmation(cancel_to))
        .await?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicUsize, Ordering};

    use teloxide::ApiError;

    use super::*;

    const LINK: &str = "https://t.me/+AbCdEfGhIjKlMnOp";

    #[tokio::test]
    async fn existing_invite_link_is_reused() {
        let exports = AtomicUsize::new(0);
        for _ in 0..2 {
            let link = find_invite_link(
                || async { Ok(Some(LINK.to_string())) },
                || {
                    exports.fetch_add(1, Ordering::SeqCst);
                    async { Ok("https://t.me/+new".to_string()) }
                },
            )
            .await
            .unwrap();
            assert_eq!(link, LINK);
        }
        assert_eq!(exports.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invite_link_is_exported_only_if_missing() {
        let link = find_invite_link(
            || async { Ok(None) },
            || async { Ok(LINK.to_string()) },
        )
        .await
        .unwrap();
        assert_eq!(link, LINK);
    }

    #[tokio::test]
    async fn failed_lookup_does_not_export() {
        let exports = AtomicUsize::new(0);
        let result = find_invite_link(
            || async { Err(RequestError::Api(ApiError::ChatNotFound)) },
            || {
                exports.fetch_add(1, Ordering::SeqCst);
                async { Ok(LINK.to_string()) }
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(exports.load(Ordering::SeqCst), 0);
    }
}
