use std::sync::Arc;

use arch_bot_commons::{names::chat_name_prettyprint, useful_methods::BotStuff};
use html_escape::encode_text;
use teloxide::{types::ChatMemberUpdated, Bot};

use crate::{
    config::Config,
    error::HandlerError,
    membership::{apply_membership, Membership, MembershipChange},
    store::Store,
};

/// Keep the group registry in sync with where the bot actually is.
pub async fn handle_my_chat_member(
    bot: Bot,
    update: ChatMemberUpdated,
    store: Arc<Store>,
    config: Arc<Config>,
) -> Result<(), HandlerError> {
    let chat = &update.chat;
    if !(chat.is_group() || chat.is_supergroup()) {
        return Ok(());
    }

    let title = chat
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| chat_name_prettyprint(chat));
    let membership = Membership::from(&update.new_chat_member.kind);

    let Some(change) = store
        .mutate(|d| apply_membership(d, chat.id, &title, membership))
        .await?
    else {
        return Ok(());
    };

    let text = match change {
        MembershipChange::Joined(group) => {
            log::info!("Joined group {} ({}).", group.id, group.title);
            format!(
                "ℹ️ Bot was added to group: <b>{}</b>",
                encode_text(&group.title)
            )
        }
        MembershipChange::Left { group, was_main } => {
            log::info!("Removed from group {} ({}).", group.id, group.title);
            let mut text = format!(
                "ℹ️ Bot was removed from group: <b>{}</b>",
                encode_text(&group.title)
            );
            if was_main {
                text.push_str(
                    "\nIt was the main group. \
                     Approved reviews won't be published until a new one is chosen.",
                );
            }
            text
        }
    };

    bot.send_best_effort(config.admin_id, text).await;
    Ok(())
}
