use teloxide::{dispatching::dialogue::InMemStorageError, RequestError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no bot token: set BOT_TOKEN or put it into the key file")]
    MissingToken,
    #[error("ADMIN_ID is not set")]
    MissingAdmin,
    #[error("ADMIN_ID is not a user ID: {0:?}")]
    BadAdmin(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write the data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize the data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Anything that can go wrong while handling an update.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] RequestError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("conversation state failure: {0}")]
    Dialogue(#[from] InMemStorageError),
}
