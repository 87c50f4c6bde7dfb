use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use teloxide::types::{ChatId, FileId, MessageId, UserId};

/// Unique identifier of a pending review.
pub type ReviewId = u64;

/// Minimum and maximum length of review text, in characters, inclusive.
pub const REVIEW_TEXT_LENGTH: std::ops::RangeInclusive<usize> = 10..=50;

/// A review waiting for the administrator's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub user_id: u64,
    pub username: Option<String>,
    pub first_name: String,
    pub text: String,
    pub photo_file_id: Option<String>,
    /// ID of the message the review was submitted with, in the submitter's private chat.
    /// Older data files keyed reviews by this ID and don't have the field.
    #[serde(default)]
    pub message_id: Option<i32>,
}

impl Review {
    #[must_use]
    pub fn submitter(&self) -> UserId {
        UserId(self.user_id)
    }

    #[must_use]
    pub fn photo(&self) -> Option<FileId> {
        self.photo_file_id.clone().map(FileId)
    }

    /// The message to forward when publishing this review.
    ///
    /// Returns [`None`] for a legacy review whose key can't be a message ID.
    #[must_use]
    pub fn source_message(&self, id: ReviewId) -> Option<MessageId> {
        match self.message_id {
            Some(message_id) => Some(MessageId(message_id)),
            None => i32::try_from(id).ok().map(MessageId),
        }
    }
}

/// A group chat the bot is a member of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
}

impl Group {
    #[must_use]
    pub fn chat_id(&self) -> ChatId {
        ChatId(self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether new reviews are not accepted.
    pub reviews_locked: bool,
    /// Cooldown between reviews of one user. 0 disables it.
    pub review_timeout_seconds: u64,
}

/// Cooldown durations the administrator may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cooldown {
    Disabled,
    OneDay,
    TwoDays,
    OneWeek,
}

impl Cooldown {
    pub const ALL: [Cooldown; 4] = [
        Cooldown::OneDay,
        Cooldown::TwoDays,
        Cooldown::OneWeek,
        Cooldown::Disabled,
    ];

    #[must_use]
    pub fn seconds(self) -> u64 {
        match self {
            Cooldown::Disabled => 0,
            Cooldown::OneDay => 86_400,
            Cooldown::TwoDays => 2 * 86_400,
            Cooldown::OneWeek => 7 * 86_400,
        }
    }

    #[must_use]
    pub fn from_seconds(seconds: u64) -> Option<Cooldown> {
        Self::ALL.into_iter().find(|x| x.seconds() == seconds)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Cooldown::Disabled => "disabled",
            Cooldown::OneDay => "1 day",
            Cooldown::TwoDays => "2 days",
            Cooldown::OneWeek => "1 week",
        }
    }
}

fn plural(amount: u64, unit: &str) -> String {
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

/// Describe a duration the way a human would: preset names for the preset
/// values, otherwise the largest whole unit.
#[must_use]
pub fn humanize_duration(seconds: u64) -> String {
    if let Some(preset) = Cooldown::from_seconds(seconds) {
        return preset.label().to_string();
    }

    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "less than a minute".to_string()
    }
}

/// Something the administrator must confirm before it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingAction {
    LeaveGroup(ChatId),
    SetLock(bool),
    SetCooldown(Cooldown),
}

/// A button press, decoded from callback data.
///
/// Telegram limits callback data to 64 bytes, so the encoding is terse:
/// a keyword, optionally followed by `:` and a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MainMenu,
    LeaveReview,
    AdminPanel,
    PendingList,
    Inspect(ReviewId),
    Approve(ReviewId),
    RejectMenu(ReviewId),
    RejectSilently(ReviewId),
    RejectWithReason(ReviewId),
    Groups,
    Group(ChatId),
    SetMainGroup(ChatId),
    Restrictions,
    CooldownMenu,
    /// Asks for confirmation of this action.
    Request(PendingAction),
    /// Carries out whatever is waiting for confirmation.
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("unknown action {0:?}")]
    Unknown(String),
    #[error("action {0:?} needs a parameter")]
    MissingParameter(String),
    #[error("action {0:?} takes no parameter")]
    ExtraParameter(String),
    #[error("bad parameter {0:?}")]
    BadParameter(String),
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (keyword, param) = match value.split_once(':') {
            Some((keyword, param)) => (keyword, Some(param)),
            None => (value, None),
        };

        macro_rules! param {
            () => {
                param
                    .ok_or_else(|| ActionParseError::MissingParameter(keyword.to_string()))?
                    .parse()
                    .map_err(|_| ActionParseError::BadParameter(value.to_string()))?
            };
        }

        let action = match keyword {
            "inspect" => Action::Inspect(param!()),
            "approve" => Action::Approve(param!()),
            "reject" => Action::RejectMenu(param!()),
            "reject_silent" => Action::RejectSilently(param!()),
            "reject_reason" => Action::RejectWithReason(param!()),
            "group" => Action::Group(ChatId(param!())),
            "set_main" => Action::SetMainGroup(ChatId(param!())),
            "leave_group" => Action::Request(PendingAction::LeaveGroup(ChatId(param!()))),
            "set_cooldown" => {
                let seconds: u64 = param!();
                let cooldown = Cooldown::from_seconds(seconds)
                    .ok_or_else(|| ActionParseError::BadParameter(value.to_string()))?;
                Action::Request(PendingAction::SetCooldown(cooldown))
            }
            _ => {
                if param.is_some() {
                    return match keyword {
                        "main" | "leave_review" | "admin" | "pending" | "groups"
                        | "restrictions" | "cooldown" | "lock" | "unlock" | "confirm" => {
                            Err(ActionParseError::ExtraParameter(keyword.to_string()))
                        }
                        _ => Err(ActionParseError::Unknown(value.to_string())),
                    };
                }
                match keyword {
                    "main" => Action::MainMenu,
                    "leave_review" => Action::LeaveReview,
                    "admin" => Action::AdminPanel,
                    "pending" => Action::PendingList,
                    "groups" => Action::Groups,
                    "restrictions" => Action::Restrictions,
                    "cooldown" => Action::CooldownMenu,
                    "lock" => Action::Request(PendingAction::SetLock(true)),
                    "unlock" => Action::Request(PendingAction::SetLock(false)),
                    "confirm" => Action::Confirm,
                    _ => return Err(ActionParseError::Unknown(value.to_string())),
                }
            }
        };

        Ok(action)
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::MainMenu => write!(f, "main"),
            Action::LeaveReview => write!(f, "leave_review"),
            Action::AdminPanel => write!(f, "admin"),
            Action::PendingList => write!(f, "pending"),
            Action::Inspect(id) => write!(f, "inspect:{id}"),
            Action::Approve(id) => write!(f, "approve:{id}"),
            Action::RejectMenu(id) => write!(f, "reject:{id}"),
            Action::RejectSilently(id) => write!(f, "reject_silent:{id}"),
            Action::RejectWithReason(id) => write!(f, "reject_reason:{id}"),
            Action::Groups => write!(f, "groups"),
            Action::Group(chat) => write!(f, "group:{}", chat.0),
            Action::SetMainGroup(chat) => write!(f, "set_main:{}", chat.0),
            Action::Restrictions => write!(f, "restrictions"),
            Action::CooldownMenu => write!(f, "cooldown"),
            Action::Request(PendingAction::LeaveGroup(chat)) => write!(f, "leave_group:{}", chat.0),
            Action::Request(PendingAction::SetLock(true)) => write!(f, "lock"),
            Action::Request(PendingAction::SetLock(false)) => write!(f, "unlock"),
            Action::Request(PendingAction::SetCooldown(cooldown)) => {
                write!(f, "set_cooldown:{}", cooldown.seconds())
            }
            Action::Confirm => write!(f, "confirm"),
        }
    }
}

impl Action {
    /// Whether only the administrator may press this button.
    #[must_use]
    pub fn is_admin_only(&self) -> bool {
        !matches!(self, Action::MainMenu | Action::LeaveReview)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn parsing_actions() {
        assert_eq!("main".parse::<Action>().unwrap(), Action::MainMenu);
        assert_eq!("approve:17".parse::<Action>().unwrap(), Action::Approve(17));
        assert_eq!(
            "group:-1002065680710".parse::<Action>().unwrap(),
            Action::Group(ChatId(-1002065680710))
        );
        assert_eq!(
            "set_cooldown:172800".parse::<Action>().unwrap(),
            Action::Request(PendingAction::SetCooldown(Cooldown::TwoDays))
        );
        assert_eq!(
            "unlock".parse::<Action>().unwrap(),
            Action::Request(PendingAction::SetLock(false))
        );
    }

    #[test]
    fn rejecting_garbage_actions() {
        assert!(matches!(
            "amogus".parse::<Action>(),
            Err(ActionParseError::Unknown(_))
        ));
        assert!(matches!(
            "approve".parse::<Action>(),
            Err(ActionParseError::MissingParameter(_))
        ));
        assert!(matches!(
            "approve:lol".parse::<Action>(),
            Err(ActionParseError::BadParameter(_))
        ));
        assert!(matches!(
            "confirm:1".parse::<Action>(),
            Err(ActionParseError::ExtraParameter(_))
        ));
        // Only the presets are allowed.
        assert!(matches!(
            "set_cooldown:5".parse::<Action>(),
            Err(ActionParseError::BadParameter(_))
        ));
    }

    #[test]
    fn actions_survive_the_trip_through_a_button() {
        let actions = [
            Action::Inspect(u64::MAX),
            Action::RejectWithReason(3),
            Action::Request(PendingAction::LeaveGroup(ChatId(i64::MIN))),
            Action::Request(PendingAction::SetCooldown(Cooldown::Disabled)),
            Action::Confirm,
        ];
        for action in actions {
            let data = action.to_string();
            assert!(data.len() <= 64, "{data} is too long for callback data");
            assert_eq!(data.parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn humanizing_durations() {
        assert_eq!(humanize_duration(0), "disabled");
        assert_eq!(humanize_duration(86_400), "1 day");
        assert_eq!(humanize_duration(604_800), "1 week");
        assert_eq!(humanize_duration(79_200), "22 hours");
        assert_eq!(humanize_duration(3 * 86_400 + 5), "3 days");
        assert_eq!(humanize_duration(60), "1 minute");
        assert_eq!(humanize_duration(59), "less than a minute");
    }

    #[test]
    fn legacy_review_uses_its_key_as_message() {
        let review: Review = serde_json::from_str(
            r#"{"user_id": 5, "username": null, "first_name": "Vasya",
                "text": "Great service, loved it!", "photo_file_id": null}"#,
        )
        .unwrap();
        assert_eq!(review.source_message(123), Some(MessageId(123)));
        assert_eq!(review.source_message(i32::MAX as u64 + 1), None);
        assert_eq!(review.submitter(), UserId(5));
    }
}
