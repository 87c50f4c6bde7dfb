use std::{fmt::Display, future::Future};

use arch_bot_commons::useful_methods::MessageStuff;
use chrono::{DateTime, Utc};
use teloxide::{
    types::{ChatId, Message, MessageId, UserId},
    RequestError,
};

use crate::{
    error::StoreError,
    store::{Document, Store},
    types::{humanize_duration, Cooldown, Review, ReviewId, REVIEW_TEXT_LENGTH},
};

fn unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// Why a user can't leave a review right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocked {
    Locked,
    Cooldown { remaining_seconds: u64 },
}

impl Display for Blocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Blocked::Locked => write!(
                f,
                "⛔ Submitting reviews is temporarily paused by the administrator."
            ),
            Blocked::Cooldown { remaining_seconds } => write!(
                f,
                "You will be able to leave your next review in {}.",
                humanize_duration(*remaining_seconds)
            ),
        }
    }
}

/// Check if this user may submit a review. The administrator always may.
pub fn check_submissions_open(
    document: &Document,
    user: UserId,
    is_admin: bool,
    now: DateTime<Utc>,
) -> Result<(), Blocked> {
    if is_admin {
        return Ok(());
    }

    if document.settings.reviews_locked {
        return Err(Blocked::Locked);
    }

    let timeout = document.settings.review_timeout_seconds;
    if timeout == 0 {
        return Ok(());
    }

    let Some(last_review) = document.last_review_time(user) else {
        return Ok(());
    };

    let elapsed = unix_seconds(now) - last_review;
    if elapsed < timeout as f64 {
        let remaining_seconds = (timeout as f64 - elapsed).ceil() as u64;
        return Err(Blocked::Cooldown { remaining_seconds });
    }

    Ok(())
}

/// A message someone sent as their review, not validated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub text: Option<String>,
    pub photo_file_id: Option<String>,
    pub message_id: MessageId,
}

impl Submission {
    /// Returns [`None`] if the message has no sender.
    #[must_use]
    pub fn from_message(message: &Message) -> Option<Submission> {
        let user = message.from.as_ref()?;
        Some(Submission {
            user_id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            text: message.text_full().map(str::to_string),
            photo_file_id: message
                .find_biggest_photo()
                .map(|photo| photo.file.id.to_string()),
            message_id: message.id,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    Blocked(Blocked),
    /// A photo was sent without the review text in its caption.
    MissingCaption,
    /// Neither text nor a photo.
    NotAReview,
    BadLength { length: usize },
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Blocked(blocked) => blocked.fmt(f),
            SubmitError::MissingCaption => write!(
                f,
                "❌ Error: the photo needs a caption with the text of your review."
            ),
            SubmitError::NotAReview => write!(
                f,
                "❌ Error: please send your review as text, or as a photo with a caption."
            ),
            SubmitError::BadLength { length } => write!(
                f,
                "❌ Error: the review (or photo caption) must be from {} to {} characters long, \
                 but yours is {}.",
                REVIEW_TEXT_LENGTH.start(),
                REVIEW_TEXT_LENGTH.end(),
                length
            ),
        }
    }
}

/// Validate a submission and queue it for moderation, stamping the submitter's cooldown.
///
/// On error nothing is changed.
pub fn submit(
    document: &mut Document,
    submission: Submission,
    is_admin: bool,
    now: DateTime<Utc>,
) -> Result<ReviewId, SubmitError> {
    check_submissions_open(document, submission.user_id, is_admin, now)
        .map_err(SubmitError::Blocked)?;

    let text = match (submission.text, &submission.photo_file_id) {
        (Some(text), _) => text,
        (None, Some(_)) => return Err(SubmitError::MissingCaption),
        (None, None) => return Err(SubmitError::NotAReview),
    };

    let length = text.chars().count();
    if !REVIEW_TEXT_LENGTH.contains(&length) {
        return Err(SubmitError::BadLength { length });
    }

    let id = document.allocate_review_id();
    document.pending_reviews.insert(
        id,
        Review {
            user_id: submission.user_id.0,
            username: submission.username,
            first_name: submission.first_name,
            text,
            photo_file_id: submission.photo_file_id,
            message_id: Some(submission.message_id.0),
        },
    );
    document
        .user_last_review_time
        .insert(submission.user_id.0, unix_seconds(now));

    Ok(id)
}

/// Where to forward an approved review from and to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardRequest {
    pub to: ChatId,
    pub from: ChatId,
    pub message_id: MessageId,
}

#[derive(Debug)]
pub enum ApproveOutcome {
    /// No such review pending; someone got to it first.
    AlreadyProcessed,
    /// Approved, but there's no group to publish it to.
    NoTarget(Review),
    Published { review: Review, target: ChatId },
    /// Forwarding failed and the review is back in the queue.
    ForwardFailed { review: Review, error: RequestError },
    /// Legacy review with no message to forward. It's back in the queue.
    NoSourceMessage(Review),
}

/// Take the review out of the queue and publish it into the main group with `forward`.
///
/// The approval only sticks if forwarding succeeds; otherwise the review is put back as it was.
pub async fn approve<F, Fut>(
    store: &Store,
    id: ReviewId,
    forward: F,
) -> Result<ApproveOutcome, StoreError>
where
    F: FnOnce(ForwardRequest) -> Fut,
    Fut: Future<Output = Result<(), RequestError>>,
{
    let (review, target) = store
        .mutate(|document| {
            let review = document.pending_reviews.remove(&id);
            (review, document.main_group())
        })
        .await?;

    let Some(review) = review else {
        return Ok(ApproveOutcome::AlreadyProcessed);
    };

    let Some(target) = target else {
        log::info!("Approved review {id} without publishing, no main group is set.");
        return Ok(ApproveOutcome::NoTarget(review));
    };

    let Some(message_id) = review.source_message(id) else {
        log::warn!("Review {id} has no message to forward, putting it back.");
        store
            .mutate(|document| document.pending_reviews.insert(id, review.clone()))
            .await?;
        return Ok(ApproveOutcome::NoSourceMessage(review));
    };

    let request = ForwardRequest {
        to: target,
        from: ChatId::from(review.submitter()),
        message_id,
    };

    match forward(request).await {
        Ok(()) => {
            log::info!("Published review {id} into {target}.");
            Ok(ApproveOutcome::Published { review, target })
        }
        Err(error) => {
            log::warn!("Failed to publish review {id} into {target}, putting it back: {error}");
            store
                .mutate(|document| document.pending_reviews.insert(id, review.clone()))
                .await?;
            Ok(ApproveOutcome::ForwardFailed { review, error })
        }
    }
}

/// Take the review out of the queue for good. Returns [`None`] if it wasn't there.
pub async fn reject(store: &Store, id: ReviewId) -> Result<Option<Review>, StoreError> {
    let review = store
        .mutate(|document| document.pending_reviews.remove(&id))
        .await?;
    if review.is_some() {
        log::info!("Rejected review {id}.");
    }
    Ok(review)
}

/// Lock or unlock submitting reviews for everyone but the administrator.
pub async fn set_locked(store: &Store, locked: bool) -> Result<(), StoreError> {
    store
        .mutate(|document| document.settings.reviews_locked = locked)
        .await?;
    log::info!("Review submissions locked: {locked}");
    Ok(())
}

pub async fn set_cooldown(store: &Store, cooldown: Cooldown) -> Result<(), StoreError> {
    store
        .mutate(|document| document.settings.review_timeout_seconds = cooldown.seconds())
        .await?;
    log::info!("Review cooldown set to {} seconds.", cooldown.seconds());
    Ok(())
}
