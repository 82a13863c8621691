use std::sync::Arc;

use bazaar_db::models::ChatRow;
use bazaar_db::{ChatRepository, UserRepository};
use bazaar_types::models::{Chat, ChatMessage};

use crate::convert;
use crate::error::ApiError;
use crate::validation::parse_id;

const CHAT_ID_REQUIRED: &str = "Valid chat ID is required";
const MAX_MESSAGE_CHARS: usize = 2000;

/// Buyer/seller conversations. Only the two participants can read or post.
#[derive(Clone)]
pub struct ChatService {
    chats: Arc<dyn ChatRepository>,
    users: Arc<dyn UserRepository>,
}

impl ChatService {
    pub fn new(chats: Arc<dyn ChatRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { chats, users }
    }

    pub fn list(&self, user_id: i64) -> Result<Vec<Chat>, ApiError> {
        let rows = self.chats.list_chats(user_id)?;
        Ok(rows
            .into_iter()
            .map(|summary| {
                let last = summary.last_message.map(convert::chat_message);
                convert::chat(summary.chat, last, Vec::new())
            })
            .collect())
    }

    /// Get or create the chat where `buyer_id` talks to `seller_id`.
    pub fn open(&self, seller_id: i64, buyer_id: i64) -> Result<Chat, ApiError> {
        if seller_id == buyer_id {
            return Err(ApiError::validation("You cannot start a chat with yourself"));
        }
        if !self.users.user_exists(seller_id)? {
            return Err(ApiError::not_found("Seller not found"));
        }
        let row = self.chats.open_chat(buyer_id, seller_id)?;
        Ok(convert::chat(row, None, Vec::new()))
    }

    pub fn get(&self, raw_id: &str, user_id: i64) -> Result<Chat, ApiError> {
        let chat = self.participant_chat(raw_id, user_id)?;
        let messages: Vec<ChatMessage> = self
            .chats
            .chat_messages(chat.id)?
            .into_iter()
            .map(convert::chat_message)
            .collect();
        let last = messages.last().cloned();
        Ok(convert::chat(chat, last, messages))
    }

    pub fn send(&self, raw_id: &str, user_id: i64, message: &str) -> Result<ChatMessage, ApiError> {
        let chat = self.participant_chat(raw_id, user_id)?;

        let message = message.trim();
        if message.is_empty() {
            return Err(ApiError::validation("Message is required"));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ApiError::validation(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        let row = self.chats.insert_chat_message(chat.id, user_id, message)?;
        Ok(convert::chat_message(row))
    }

    fn participant_chat(&self, raw_id: &str, user_id: i64) -> Result<ChatRow, ApiError> {
        let id = parse_id(raw_id, CHAT_ID_REQUIRED)?;
        let chat = self
            .chats
            .find_chat(id)?
            .ok_or_else(|| ApiError::not_found("Chat not found"))?;

        if chat.buyer_id != user_id && chat.seller_id != user_id {
            return Err(ApiError::Forbidden("You are not part of this chat".into()));
        }
        Ok(chat)
    }
}
