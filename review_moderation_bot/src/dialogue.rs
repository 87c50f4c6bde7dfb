use teloxide::dispatching::dialogue::{Dialogue, InMemStorage, InMemStorageError};

use crate::{
    error::HandlerError,
    types::{Action, PendingAction, ReviewId},
};

/// What a chat is in the middle of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Idle,
    /// The next message from this user is their review.
    AwaitingReview,
    /// The next message from the administrator is why this review is rejected.
    AwaitingRejectionReason { review_id: ReviewId },
    /// This action fires if the administrator presses "confirm" next.
    AwaitingConfirmation { action: PendingAction },
}

pub type ReviewDialogue = Dialogue<State, InMemStorage<State>>;

/// Forget any multi-step interaction this chat was in.
///
/// Idle chats are removed from the storage instead of being stored as idle.
pub async fn reset(dialogue: &ReviewDialogue) -> Result<(), HandlerError> {
    match dialogue.exit().await {
        // Wasn't stored in the first place.
        Ok(()) | Err(InMemStorageError::DialogueNotFound) => Ok(()),
    }
}

pub async fn switch_to(dialogue: &ReviewDialogue, state: State) -> Result<(), HandlerError> {
    match state {
        State::Idle => reset(dialogue).await,
        state => {
            dialogue.update(state).await?;
            Ok(())
        }
    }
}

impl State {
    /// State to enter when this button is pressed in this state.
    ///
    /// Only the buttons that start a multi-step interaction keep or set
    /// one. Anything else is unrelated navigation and drops back to idle, so
    /// a stale flow can't fire later.
    #[must_use]
    pub fn after_pressing(self, action: Action) -> State {
        match action {
            Action::RejectWithReason(review_id) => State::AwaitingRejectionReason { review_id },
            Action::Request(action) => State::AwaitingConfirmation { action },
            // Decided by whether submissions are open, see `handlers::moderation`.
            Action::LeaveReview => State::Idle,
            // Consumes the pending action.
            Action::Confirm => State::Idle,
            Action::MainMenu
            | Action::AdminPanel
            | Action::PendingList
            | Action::Inspect(_)
            | Action::Approve(_)
            | Action::RejectMenu(_)
            | Action::RejectSilently(_)
            | Action::Groups
            | Action::Group(_)
            | Action::SetMainGroup(_)
            | Action::Restrictions
            | Action::CooldownMenu => State::Idle,
        }
    }

    /// The action waiting for confirmation, if that's what this state is.
    #[must_use]
    pub fn pending_confirmation(self) -> Option<PendingAction> {
        match self {
            State::AwaitingConfirmation { action } => Some(action),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use teloxide::{dispatching::dialogue::Storage, types::ChatId};

    use super::*;
    use crate::types::Cooldown;

    #[test]
    fn navigation_drops_pending_flows() {
        let waiting = State::AwaitingConfirmation {
            action: PendingAction::SetLock(true),
        };
        assert_eq!(waiting.after_pressing(Action::Restrictions), State::Idle);
        assert_eq!(waiting.after_pressing(Action::MainMenu), State::Idle);

        let rejecting = State::AwaitingRejectionReason { review_id: 4 };
        assert_eq!(rejecting.after_pressing(Action::Inspect(4)), State::Idle);
        assert_eq!(State::AwaitingReview.after_pressing(Action::MainMenu), State::Idle);
    }

    #[test]
    fn requests_wait_for_confirmation() {
        let leave = PendingAction::LeaveGroup(ChatId(-100));
        let state = State::Idle.after_pressing(Action::Request(leave));
        assert_eq!(state.pending_confirmation(), Some(leave));

        // A newer request replaces the older one.
        let cooldown = PendingAction::SetCooldown(Cooldown::OneWeek);
        let state = state.after_pressing(Action::Request(cooldown));
        assert_eq!(state.pending_confirmation(), Some(cooldown));

        assert_eq!(state.after_pressing(Action::Confirm), State::Idle);
    }

    #[test]
    fn confirming_after_navigating_away_finds_nothing() {
        let lock = PendingAction::SetLock(true);
        let state = State::Idle
            .after_pressing(Action::Request(lock))
            .after_pressing(Action::CooldownMenu);
        assert_eq!(state.pending_confirmation(), None);

        // A second press of an already used "confirm" button.
        let state = State::Idle
            .after_pressing(Action::Request(lock))
            .after_pressing(Action::Confirm);
        assert_eq!(state.pending_confirmation(), None);
    }

    fn dialogue() -> (Arc<InMemStorage<State>>, ReviewDialogue) {
        let storage = InMemStorage::<State>::new();
        let dialogue = ReviewDialogue::new(storage.clone(), ChatId(5));
        (storage, dialogue)
    }

    #[tokio::test]
    async fn idle_chats_are_not_stored() {
        let (storage, dialogue) = dialogue();

        // Nothing stored yet, still fine.
        reset(&dialogue).await.unwrap();

        switch_to(&dialogue, State::AwaitingReview).await.unwrap();
        assert_eq!(dialogue.get().await.unwrap(), Some(State::AwaitingReview));

        switch_to(&dialogue, State::Idle).await.unwrap();
        assert_eq!(dialogue.get().await.unwrap(), None);
        assert_eq!(storage.get_dialogue(ChatId(5)).await.unwrap(), None);
    }

    #[test]
    fn rejection_reason_remembers_the_review() {
        assert_eq!(
            State::Idle.after_pressing(Action::RejectWithReason(9)),
            State::AwaitingRejectionReason { review_id: 9 }
        );
        assert_eq!(State::Idle.pending_confirmation(), None);
    }
}
