use arch_bot_commons::useful_methods::BotStuff;
use chrono::Utc;
use html_escape::encode_text;
use teloxide::requests::Requester;

use crate::{
    dialogue::{reset, State},
    error::HandlerError,
    keyboards,
    types::{Action, ReviewId, REVIEW_TEXT_LENGTH},
    workflow::{self, ApproveOutcome},
};

use super::{
    callbacks::{join, Ctx, Notice},
    screens::{self, ALREADY_PROCESSED},
};

const APPROVED: &str = "✅ Your review was approved! Thank you.";

/// Start taking a review from this user, unless they're locked out or cooling down.
pub async fn start_review(ctx: &Ctx<'_>) -> Result<Notice, HandlerError> {
    let open = ctx
        .store
        .read(|d| workflow::check_submissions_open(d, ctx.user.id, ctx.is_admin(), Utc::now()))
        .await;
    if let Err(blocked) = open {
        return Ok(Some(blocked.to_string()));
    }

    ctx.dialogue.update(State::AwaitingReview).await?;
    let prompt = format!(
        "Write your review (from {} to {} characters).\n\
         You may also attach a photo, with the review text in its caption.",
        REVIEW_TEXT_LENGTH.start(),
        REVIEW_TEXT_LENGTH.end()
    );
    ctx.bot
        .replace_menu(ctx.message, prompt, keyboards::back(Action::MainMenu))
        .await?;
    Ok(None)
}

pub async fn approve(ctx: &Ctx<'_>, id: ReviewId) -> Result<Notice, HandlerError> {
    let bot = ctx.bot.clone();
    let outcome = workflow::approve(ctx.store, id, move |request| async move {
        bot.forward_message(request.to, request.from, request.message_id)
            .await
            .map(|_| ())
    })
    .await?;

    let notice = match outcome {
        ApproveOutcome::AlreadyProcessed => ALREADY_PROCESSED.to_string(),
        ApproveOutcome::NoTarget(review) => {
            ctx.bot
                .send_best_effort(review.submitter(), APPROVED.to_string())
                .await;
            "⚠️ The review is approved, but no main group is set, so it wasn't published anywhere."
                .to_string()
        }
        ApproveOutcome::Published { review, target } => {
            ctx.bot
                .send_best_effort(review.submitter(), APPROVED.to_string())
                .await;
            let title = ctx
                .store
                .read(|d| d.group(target).map(|g| g.title.clone()))
                .await
                .unwrap_or_else(|| target.to_string());
            format!("✅ The review is approved and published in {title}.")
        }
        ApproveOutcome::ForwardFailed { review, error } => format!(
            "❌ Failed to publish the review from {}, it's still pending: {error}",
            review.first_name
        ),
        ApproveOutcome::NoSourceMessage(review) => format!(
            "❌ Can't publish the review from {}: its original message is unknown. \
             It's still pending.",
            review.first_name
        ),
    };

    Ok(join(Some(notice), screens::pending_list(ctx).await?))
}

pub async fn reject_silently(ctx: &Ctx<'_>, id: ReviewId) -> Result<Notice, HandlerError> {
    let notice = match workflow::reject(ctx.store, id).await? {
        None => ALREADY_PROCESSED.to_string(),
        Some(review) => {
            ctx.bot
                .send_best_effort(
                    review.submitter(),
                    "❌ Unfortunately, your review was rejected.".to_string(),
                )
                .await;
            "The review is rejected.".to_string()
        }
    };

    Ok(join(Some(notice), screens::pending_list(ctx).await?))
}

/// The dialogue is already waiting for the reason, this only asks for it.
pub async fn ask_rejection_reason(ctx: &Ctx<'_>, id: ReviewId) -> Result<Notice, HandlerError> {
    let Some(review) = ctx.store.read(|d| d.pending_reviews.get(&id).cloned()).await else {
        reset(ctx.dialogue).await?;
        return Ok(join(
            Some(ALREADY_PROCESSED.to_string()),
            screens::pending_list(ctx).await?,
        ));
    };

    ctx.bot
        .replace_menu(
            ctx.message,
            format!(
                "Send the reason for rejecting the review from <b>{}</b>.\n\
                 It will be sent to them as is.",
                encode_text(&review.first_name)
            ),
            keyboards::cancel(Action::Inspect(id)),
        )
        .await?;
    Ok(None)
}
