use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

use crate::{
    store::Document,
    types::{humanize_duration, Action, Cooldown, Group, PendingAction, Review, ReviewId, Settings},
};

fn button(text: impl Into<String>, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_string())
}

fn back_button(to: Action) -> InlineKeyboardButton {
    button("🔙 Back", to)
}

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "✍️ Leave a review",
        Action::LeaveReview,
    )]])
}

pub fn admin_panel(pending_count: usize) -> InlineKeyboardMarkup {
    let moderation = if pending_count > 0 {
        format!("📋 Moderation ({pending_count})")
    } else {
        "📋 Moderation".to_string()
    };

    InlineKeyboardMarkup::new(vec![
        vec![button(moderation, Action::PendingList)],
        vec![button("👥 My groups", Action::Groups)],
        vec![button("⚙️ Restrictions", Action::Restrictions)],
        vec![button("🏠 Main menu", Action::MainMenu)],
    ])
}

pub fn back(to: Action) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![back_button(to)]])
}

pub fn cancel(to: Action) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🔙 Cancel", to)]])
}

pub fn pending_list<'a>(
    reviews: impl IntoIterator<Item = (&'a ReviewId, &'a Review)>,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = reviews
        .into_iter()
        .map(|(id, review)| {
            let photo = if review.photo_file_id.is_some() {
                " 🖼️"
            } else {
                ""
            };
            vec![button(
                format!("From {}{}", review.first_name, photo),
                Action::Inspect(*id),
            )]
        })
        .collect();
    rows.push(vec![back_button(Action::AdminPanel)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn review_actions(id: ReviewId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("✅ Approve", Action::Approve(id)),
            button("❌ Reject", Action::RejectMenu(id)),
        ],
        vec![back_button(Action::PendingList)],
    ])
}

pub fn reject_menu(id: ReviewId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("Without a reason", Action::RejectSilently(id))],
        vec![button("With a reason", Action::RejectWithReason(id))],
        vec![button("🔙 Cancel", Action::Inspect(id))],
    ])
}

pub fn groups_list(document: &Document) -> InlineKeyboardMarkup {
    let main = document.main_group();
    let mut rows: Vec<_> = document
        .groups
        .iter()
        .map(|group| {
            let star = if Some(group.chat_id()) == main {
                " ⭐"
            } else {
                ""
            };
            vec![button(
                format!("{}{}", group.title, star),
                Action::Group(group.chat_id()),
            )]
        })
        .collect();
    rows.push(vec![back_button(Action::AdminPanel)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn group_options(
    group: &Group,
    is_main: bool,
    invite_link: Option<Url>,
) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if let Some(link) = invite_link {
        rows.push(vec![InlineKeyboardButton::url("➡️ Open group", link)]);
    }

    let main_text = if is_main { "⭐ Main" } else { "Make main" };
    rows.push(vec![button(main_text, Action::SetMainGroup(group.chat_id()))]);
    rows.push(vec![button(
        "🗑️ Leave the group",
        Action::Request(PendingAction::LeaveGroup(group.chat_id())),
    )]);
    rows.push(vec![back_button(Action::Groups)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn restrictions(settings: &Settings) -> InlineKeyboardMarkup {
    let cooldown = format!(
        "⏳ Cooldown: {}",
        humanize_duration(settings.review_timeout_seconds)
    );
    let lock = if settings.reviews_locked {
        button(
            "✅ Unlock submissions",
            Action::Request(PendingAction::SetLock(false)),
        )
    } else {
        button(
            "❌ Lock submissions",
            Action::Request(PendingAction::SetLock(true)),
        )
    };

    InlineKeyboardMarkup::new(vec![
        vec![button(cooldown, Action::CooldownMenu)],
        vec![lock],
        vec![back_button(Action::AdminPanel)],
    ])
}

pub fn cooldown_presets() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<_>> = Cooldown::ALL
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|&cooldown| {
                    let label = match cooldown {
                        Cooldown::Disabled => "Disable",
                        other => other.label(),
                    };
                    button(label, Action::Request(PendingAction::SetCooldown(cooldown)))
                })
                .collect()
        })
        .collect();
    rows.push(vec![back_button(Action::Restrictions)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn confirmation(cancel_to: Action) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button("✅ Yes", Action::Confirm),
        button("❌ No, cancel", cancel_to),
    ]])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use teloxide::types::{ChatId, InlineKeyboardButtonKind};

    use super::*;

    fn actions(keyboard: &InlineKeyboardMarkup) -> Vec<Action> {
        keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.parse().unwrap()),
                _ => None,
            })
            .collect()
    }

    fn labels(keyboard: &InlineKeyboardMarkup) -> Vec<&str> {
        keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.text.as_str())
            .collect()
    }

    fn review(name: &str, photo: bool) -> Review {
        Review {
            user_id: 1,
            username: None,
            first_name: name.to_string(),
            text: "Great service, loved it!".to_string(),
            photo_file_id: photo.then(|| "AgACAgIAAxkBAAI".to_string()),
            message_id: None,
        }
    }

    #[test]
    fn pending_list_marks_photos() {
        let mut document = Document::default();
        document.pending_reviews.insert(3, review("Anna", true));
        document.pending_reviews.insert(8, review("Boris", false));

        let keyboard = pending_list(&document.pending_reviews);
        assert_eq!(labels(&keyboard), ["From Anna 🖼️", "From Boris", "🔙 Back"]);
        assert_eq!(
            actions(&keyboard),
            [Action::Inspect(3), Action::Inspect(8), Action::AdminPanel]
        );
    }

    #[test]
    fn groups_list_stars_the_main_group() {
        let mut document = Document::default();
        document.groups.push(Group {
            id: -1,
            title: "One".to_string(),
        });
        document.groups.push(Group {
            id: -2,
            title: "Two".to_string(),
        });
        document.main_group_id = Some(-2);

        let keyboard = groups_list(&document);
        assert_eq!(labels(&keyboard), ["One", "Two ⭐", "🔙 Back"]);
        assert_eq!(actions(&keyboard)[1], Action::Group(ChatId(-2)));
    }

    #[test]
    fn destructive_buttons_ask_first() {
        let group = Group {
            id: -5,
            title: "Five".to_string(),
        };
        let keyboard = group_options(&group, false, None);
        assert!(actions(&keyboard)
            .contains(&Action::Request(PendingAction::LeaveGroup(ChatId(-5)))));

        let settings = Settings {
            reviews_locked: true,
            review_timeout_seconds: 86_400,
        };
        let keyboard = restrictions(&settings);
        assert_eq!(labels(&keyboard)[0], "⏳ Cooldown: 1 day");
        assert_eq!(
            actions(&keyboard)[1],
            Action::Request(PendingAction::SetLock(false))
        );

        assert!(actions(&cooldown_presets())
            .iter()
            .all(|a| matches!(a, Action::Request(_) | Action::Restrictions)));
    }

    #[test]
    fn admin_panel_counts_pending() {
        assert_eq!(labels(&admin_panel(0))[0], "📋 Moderation");
        assert_eq!(labels(&admin_panel(4))[0], "📋 Moderation (4)");
    }
}
