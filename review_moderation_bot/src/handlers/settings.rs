use teloxide::{requests::Requester, types::ChatId};

use crate::{
    error::HandlerError,
    membership::{apply_membership, Membership, MembershipChange},
    types::{humanize_duration, Cooldown, PendingAction},
    workflow,
};

use super::{
    callbacks::{join, Ctx, Notice},
    screens,
};

pub async fn set_main_group(ctx: &Ctx<'_>, chat: ChatId) -> Result<Notice, HandlerError> {
    let notice = ctx
        .store
        .mutate(|d| {
            let Some(group) = d.group(chat) else {
                return "Group not found.".to_string();
            };
            if d.main_group() == Some(chat) {
                return format!("{} is already the main group.", group.title);
            }
            log::info!("Main group is now {chat} ({}).", group.title);
            let notice = format!(
                "⭐ {} is now the main group. Approved reviews will be published there.",
                group.title
            );
            d.main_group_id = Some(chat.0);
            notice
        })
        .await?;

    Ok(join(Some(notice), screens::groups(ctx).await?))
}

/// Do what was confirmed.
pub async fn carry_out(ctx: &Ctx<'_>, action: PendingAction) -> Result<Notice, HandlerError> {
    match action {
        PendingAction::LeaveGroup(chat) => leave_group(ctx, chat).await,
        PendingAction::SetLock(locked) => {
            workflow::set_locked(ctx.store, locked).await?;
            let notice = match locked {
                true => "❌ Submitting reviews is now locked for everyone.",
                false => "✅ Submitting reviews is unlocked.",
            };
            Ok(join(
                Some(notice.to_string()),
                screens::restrictions(ctx).await?,
            ))
        }
        PendingAction::SetCooldown(cooldown) => {
            workflow::set_cooldown(ctx.store, cooldown).await?;
            let notice = match cooldown {
                Cooldown::Disabled => "✅ The cooldown between reviews is disabled.".to_string(),
                other => format!(
                    "✅ Users can now leave a review once per {}.",
                    humanize_duration(other.seconds())
                ),
            };
            Ok(join(Some(notice), screens::restrictions(ctx).await?))
        }
    }
}

async fn leave_group(ctx: &Ctx<'_>, chat: ChatId) -> Result<Notice, HandlerError> {
    let Some(title) = ctx
        .store
        .read(|d| d.group(chat).map(|g| g.title.clone()))
        .await
    else {
        return Ok(join(
            Some("Group not found.".to_string()),
            screens::groups(ctx).await?,
        ));
    };

    let notice = match ctx.bot.leave_chat(chat).await {
        Ok(_) => {
            let change = ctx
                .store
                .mutate(|d| apply_membership(d, chat, &title, Membership::Gone))
                .await?;
            log::info!("Left group {chat} ({title}) on request.");
            match change {
                Some(MembershipChange::Left { was_main: true, .. }) => {
                    format!("The bot left {title}. It was the main group, so there is none now.")
                }
                _ => format!("The bot left {title}."),
            }
        }
        Err(e) => {
            log::warn!("Failed to leave {chat}: {e}");
            format!("❌ Failed to leave the group: {e}")
        }
    };

    Ok(join(Some(notice), screens::groups(ctx).await?))
}
