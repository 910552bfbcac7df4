//! Chat payloads.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::domain::chat::{CHAT_PAGE_SIZE, MessageCursor};
use crate::domain::types::{MessageContent, MessageId, UserId};
use crate::forms::FormError;

pub const MAX_CHAT_PAGE_SIZE: usize = 200;

#[derive(Debug, Deserialize)]
pub struct DirectRoomForm {
    pub user_id: i32,
}

impl TryFrom<DirectRoomForm> for UserId {
    type Error = FormError;

    fn try_from(form: DirectRoomForm) -> Result<Self, Self::Error> {
        UserId::new(form.user_id).map_err(|_| FormError::InvalidUserId)
    }
}

/// Keyset page request; `before_at` and `before_id` come together.
#[derive(Debug, Default, Deserialize)]
pub struct MessagePageForm {
    pub before_at: Option<NaiveDateTime>,
    pub before_id: Option<i32>,
    pub limit: Option<usize>,
}

pub struct MessagePagePayload {
    pub before: Option<MessageCursor>,
    pub limit: usize,
}

impl TryFrom<MessagePageForm> for MessagePagePayload {
    type Error = FormError;

    fn try_from(form: MessagePageForm) -> Result<Self, Self::Error> {
        let before = match (form.before_at, form.before_id) {
            (Some(created_at), Some(id)) => Some(MessageCursor {
                created_at,
                id: MessageId::new(id).map_err(|_| FormError::InvalidMessageId)?,
            }),
            (None, None) => None,
            _ => {
                return Err(FormError::InvalidQuery(
                    "before_at and before_id must be given together".to_string(),
                ));
            }
        };

        Ok(Self {
            before,
            limit: form
                .limit
                .unwrap_or(CHAT_PAGE_SIZE)
                .clamp(1, MAX_CHAT_PAGE_SIZE),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SendMessageForm {
    pub content: String,
    #[serde(default)]
    pub mentions: Vec<i32>,
    pub reply_to_id: Option<i32>,
}

pub struct SendMessagePayload {
    pub content: MessageContent,
    pub mentions: Vec<UserId>,
    pub reply_to_id: Option<MessageId>,
}

impl TryFrom<SendMessageForm> for SendMessagePayload {
    type Error = FormError;

    fn try_from(form: SendMessageForm) -> Result<Self, Self::Error> {
        let content = MessageContent::new(form.content).map_err(|_| FormError::EmptyContent)?;

        // Mentions are resolved against the user table later; malformed ids drop out here.
        let mut mentions = form
            .mentions
            .into_iter()
            .filter_map(|id| UserId::new(id).ok())
            .collect::<Vec<_>>();
        mentions.sort_unstable();
        mentions.dedup();

        let reply_to_id = form
            .reply_to_id
            .map(|id| MessageId::new(id).map_err(|_| FormError::InvalidMessageId))
            .transpose()?;

        Ok(Self {
            content,
            mentions,
            reply_to_id,
        })
    }
}
