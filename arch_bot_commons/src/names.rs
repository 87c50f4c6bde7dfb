use teloxide::types::{Chat, User};

/// Picks the prettiest name out of the parts: `@username` if there is one,
/// otherwise the first name with the last name appended.
#[must_use]
pub fn display_handle(username: Option<&str>, first_name: &str, last_name: Option<&str>) -> String {
    if let Some(username) = username {
        return format!("@{username}");
    }

    let mut name = first_name.to_string();
    if let Some(last_name) = last_name {
        name.push(' ');
        name.push_str(last_name);
    }
    name
}

/// Tries to print the user in the prettiest way possible, with either `@username` or full name.
/// Optionally allows including user ID.
#[must_use]
pub fn user_name_prettyprint(user: &User, with_id: bool) -> String {
    let mut name = display_handle(
        user.username.as_deref(),
        &user.first_name,
        user.last_name.as_deref(),
    );

    if with_id {
        name.push_str(&format!(" (userid {})", user.id));
    }

    name
}

/// Tries to print the chat name in the prettiest way possible, with either `@username` or chat
/// title.
#[must_use]
pub fn chat_name_prettyprint(chat: &Chat) -> String {
    if let Some(username) = chat.username() {
        format!("@{username}")
    } else if let Some(title) = chat.title() {
        title.to_string()
    } else {
        // Shouldn't happen for groups, but eh.
        format!("chat {}", chat.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_wins_over_full_name() {
        assert_eq!(display_handle(Some("amogus"), "Sus", Some("Impostor")), "@amogus");
    }

    #[test]
    fn full_name_when_no_username() {
        assert_eq!(display_handle(None, "Sus", Some("Impostor")), "Sus Impostor");
        assert_eq!(display_handle(None, "Sus", None), "Sus");
    }
}
