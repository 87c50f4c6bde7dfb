use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use teloxide::types::{ChatId, UserId};
use tokio::sync::Mutex;

use crate::{
    error::StoreError,
    types::{Group, Review, ReviewId, Settings},
};

/// Everything the bot remembers, as it's laid out in the data file.
///
/// Missing keys are filled with defaults and unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub pending_reviews: BTreeMap<ReviewId, Review>,
    pub groups: Vec<Group>,
    pub main_group_id: Option<i64>,
    pub settings: Settings,
    /// User ID to UNIX timestamp (in seconds) of their last accepted review.
    pub user_last_review_time: BTreeMap<u64, f64>,
    pub next_review_id: ReviewId,
}

impl Document {
    /// Parse a document, treating malformed JSON as no data at all.
    #[must_use]
    pub fn from_json(json: &str) -> Document {
        serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("Data file is corrupt, starting from scratch: {e}");
            Document::default()
        })
    }

    /// Hand out a review ID that no pending review has, and never had since the counter existed.
    pub fn allocate_review_id(&mut self) -> ReviewId {
        let after_existing = self
            .pending_reviews
            .last_key_value()
            .map_or(0, |(id, _)| id + 1);
        let id = self.next_review_id.max(after_existing);
        self.next_review_id = id + 1;
        id
    }

    #[must_use]
    pub fn main_group(&self) -> Option<ChatId> {
        self.main_group_id.map(ChatId)
    }

    #[must_use]
    pub fn group(&self, chat: ChatId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == chat.0)
    }

    #[must_use]
    pub fn last_review_time(&self, user: UserId) -> Option<f64> {
        self.user_last_review_time.get(&user.0).copied()
    }
}

/// Read the data file. A missing or broken file yields an empty document.
pub async fn load(path: &Path) -> Document {
    match tokio::fs::read_to_string(path).await {
        Ok(json) => Document::from_json(&json),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("No data file at {}, starting from scratch.", path.display());
            Document::default()
        }
        Err(e) => {
            log::warn!(
                "Failed to read data file at {}, starting from scratch: {e}",
                path.display()
            );
            Document::default()
        }
    }
}

/// Overwrite the data file with this document.
pub async fn save(path: &Path, document: &Document) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(document)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// The document in memory, backed by the data file.
/// Every mutation is written out in full before the lock is released.
pub struct Store {
    path: PathBuf,
    document: Mutex<Document>,
}

impl Store {
    pub async fn open(path: impl Into<PathBuf>) -> Store {
        let path = path.into();
        let document = load(&path).await;
        Store {
            path,
            document: Mutex::new(document),
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        let document = self.document.lock().await;
        f(&document)
    }

    /// Change the document and save it.
    ///
    /// If saving fails, the change still stays in memory.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut Document) -> R) -> Result<R, StoreError> {
        let mut document = self.document.lock().await;
        let result = f(&mut document);
        if let Err(e) = save(&self.path, &document).await {
            log::error!("Failed to save data to {}: {e}", self.path.display());
            return Err(e);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn review(text: &str) -> Review {
        Review {
            user_id: 5,
            username: Some("vasya".to_string()),
            first_name: "Вася".to_string(),
            text: text.to_string(),
            photo_file_id: None,
            message_id: Some(77),
        }
    }

    #[test]
    fn garbage_is_an_empty_document() {
        assert_eq!(Document::from_json("{ not json"), Document::default());
        assert_eq!(Document::from_json(""), Document::default());
    }

    #[test]
    fn missing_keys_are_defaulted() {
        let document = Document::from_json(
            r#"{"groups": [{"id": -100, "title": "Reviews"}], "settings": {"reviews_locked": true},
                "some_future_key": 1}"#,
        );
        assert_eq!(document.groups.len(), 1);
        assert!(document.settings.reviews_locked);
        assert_eq!(document.settings.review_timeout_seconds, 0);
        assert!(document.pending_reviews.is_empty());
        assert_eq!(document.main_group(), None);
    }

    #[test]
    fn reads_the_old_layout() {
        let document = Document::from_json(
            r#"{
                "pending_reviews": {"1234": {"user_id": 5, "username": null, "first_name": "A",
                    "text": "Great service, loved it!", "photo_file_id": null}},
                "groups": [],
                "main_group_id": null,
                "settings": {"reviews_locked": false, "review_timeout_seconds": 86400},
                "user_last_review_time": {"5": 1700000000.5}
            }"#,
        );
        assert!(document.pending_reviews.contains_key(&1234));
        assert_eq!(document.last_review_time(UserId(5)), Some(1700000000.5));
        assert_eq!(document.settings.review_timeout_seconds, 86400);
    }

    #[test]
    fn review_ids_are_never_reused() {
        let mut document = Document::default();
        document.pending_reviews.insert(1234, review("legacy review here"));

        let first = document.allocate_review_id();
        assert_eq!(first, 1235);
        document.pending_reviews.insert(first, review("first new review"));
        document.pending_reviews.remove(&first);

        let second = document.allocate_review_id();
        assert_ne!(first, second);
        assert!(second > first);
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("nope.json")).await;
        assert_eq!(store.read(Document::clone).await, Document::default());
    }

    #[tokio::test]
    async fn mutations_are_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot_data.json");

        let store = Store::open(&path).await;
        store
            .mutate(|document| {
                let id = document.allocate_review_id();
                document.pending_reviews.insert(id, review("Great service, loved it!"));
                document.main_group_id = Some(-100);
            })
            .await
            .unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        // Non-ASCII text is kept as is.
        assert!(json.contains("Вася"));

        let reopened = Store::open(&path).await;
        let document = reopened.read(Document::clone).await;
        assert_eq!(document.main_group(), Some(ChatId(-100)));
        assert_eq!(
            document.pending_reviews.values().next(),
            Some(&review("Great service, loved it!"))
        );
    }
}
