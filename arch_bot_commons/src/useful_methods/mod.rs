use std::future::Future;

use teloxide::{
    payloads::{EditMessageTextSetters, SendMessageSetters},
    requests::Requester,
    types::{InlineKeyboardMarkup, Message, ParseMode, PhotoSize, Recipient},
    ApiError, Bot, RequestError,
};

pub trait MessageStuff {
    /// Text of the message, or its caption if it's a media message.
    fn text_full(&self) -> Option<&str>;
    fn find_biggest_photo(&self) -> Option<&PhotoSize>;
}

impl MessageStuff for Message {
    fn text_full(&self) -> Option<&str> {
        self.text().or_else(|| self.caption())
    }
    fn find_biggest_photo(&self) -> Option<&PhotoSize> {
        if let Some(photo_sizes) = self.photo() {
            photo_sizes.iter().max_by_key(|x| x.width + x.height)
        } else {
            None
        }
    }
}

pub trait BotStuff {
    /// Turn this message into a menu with the given HTML text and keyboard.
    ///
    /// Photo messages can't be edited into text messages, so those get deleted
    /// and a fresh message is sent in their place.
    fn replace_menu(
        &self,
        message: &Message,
        text: String,
        keyboard: InlineKeyboardMarkup,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    /// Send an HTML message, logging and otherwise ignoring failure.
    /// Returns `true` if it was delivered.
    fn send_best_effort(
        &self,
        to_where: impl Into<Recipient> + Send,
        text: String,
    ) -> impl Future<Output = bool> + Send;
}

impl BotStuff for Bot {
    async fn replace_menu(
        &self,
        message: &Message,
        text: String,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), RequestError> {
        if message.photo().is_some() {
            // Not *too* important if this fails lol
            if let Err(e) = self.delete_message(message.chat.id, message.id).await {
                log::debug!("Failed to delete a photo menu before replacing it: {e}");
            }
            self.send_message(message.chat.id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard)
                .await?;
            return Ok(());
        }

        let edit_result = self
            .edit_message_text(message.chat.id, message.id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await;

        match edit_result {
            // Same menu rendered twice. That's fine.
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn send_best_effort(&self, to_where: impl Into<Recipient> + Send, text: String) -> bool {
        let to_where: Recipient = to_where.into();
        match self
            .send_message(to_where.clone(), text)
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Failed to deliver a message to {to_where:?}: {e}");
                false
            }
        }
    }
}
