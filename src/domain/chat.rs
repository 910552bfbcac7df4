//! Chat rooms and messages.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{MessageContent, MessageId, RoomId, TypeConstraintError, UserId};

pub const CHAT_PAGE_SIZE: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Global,
    Direct,
}

impl RoomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomKind::Global => "global",
            RoomKind::Direct => "direct",
        }
    }
}

impl std::str::FromStr for RoomKind {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(RoomKind::Global),
            "direct" => Ok(RoomKind::Direct),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown room kind {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub content: MessageContent,
    pub mentions: Vec<UserId>,
    pub reply_to_id: Option<MessageId>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

impl Message {
    /// Keyset position of this message in its room timeline.
    pub fn cursor(&self) -> MessageCursor {
        MessageCursor {
            created_at: self.created_at,
            id: self.id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub mentions: Vec<UserId>,
    pub reply_to_id: Option<MessageId>,
    pub created_at: NaiveDateTime,
}

impl NewMessage {
    pub fn new(room_id: RoomId, sender_id: UserId, content: MessageContent) -> Self {
        Self {
            room_id,
            sender_id,
            content,
            mentions: Vec::new(),
            reply_to_id: None,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Position in a room timeline; pages are fetched strictly before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageCursor {
    pub created_at: NaiveDateTime,
    pub id: MessageId,
}

/// Direct conversation seen from one participant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectRoom {
    pub room_id: RoomId,
    pub other_user_id: UserId,
    pub other_user_name: String,
    pub last_message_at: Option<NaiveDateTime>,
}
