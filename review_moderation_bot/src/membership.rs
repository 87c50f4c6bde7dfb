use teloxide::types::{ChatId, ChatMemberKind};

use crate::{store::Document, types::Group};

/// What the bot's new membership status in a group amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Present,
    Gone,
    /// Restricted and the like. Not interesting.
    Other,
}

impl From<&ChatMemberKind> for Membership {
    fn from(kind: &ChatMemberKind) -> Self {
        if kind.is_administrator() || kind.is_member() {
            Membership::Present
        } else if kind.is_left() || kind.is_banned() {
            Membership::Gone
        } else {
            Membership::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipChange {
    Joined(Group),
    Left { group: Group, was_main: bool },
}

/// Update the group registry. Returns [`None`] if nothing changed.
pub fn apply_membership(
    document: &mut Document,
    chat: ChatId,
    title: &str,
    membership: Membership,
) -> Option<MembershipChange> {
    let tracked = document.group(chat).is_some();

    match membership {
        Membership::Present if !tracked => {
            let group = Group {
                id: chat.0,
                title: title.to_string(),
            };
            document.groups.push(group.clone());
            Some(MembershipChange::Joined(group))
        }
        Membership::Gone if tracked => {
            let position = document.groups.iter().position(|g| g.id == chat.0)?;
            let group = document.groups.remove(position);
            let was_main = document.main_group() == Some(chat);
            if was_main {
                document.main_group_id = None;
            }
            Some(MembershipChange::Left { group, was_main })
        }
        Membership::Present | Membership::Gone | Membership::Other => None,
    }
}
