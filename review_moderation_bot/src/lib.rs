//! Source code for a review moderation bot: users leave short reviews, the
//! administrator approves them into a group or rejects them.

/// Startup configuration.
mod config;

/// Error types.
mod error;

/// The JSON document holding everything the bot remembers.
mod store;

/// Various types used throughout.
mod types;

/// Per-chat conversation state.
mod dialogue;

/// Submission, approval and rejection of reviews.
mod workflow;

/// Keeping track of groups the bot is in.
mod membership;

/// Inline keyboards for all the menus.
mod keyboards;

/// Functions that handle events from Telegram.
mod handlers;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;
