//! Diesel models for chat rooms and messages.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::chat::{
    Message as DomainMessage, NewMessage as DomainNewMessage, Room as DomainRoom, RoomKind,
};
use crate::domain::types::{MessageContent, MessageId, RoomId, TypeConstraintError, UserId};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::rooms)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Room {
    pub id: String,
    pub kind: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::rooms)]
pub struct NewRoom {
    pub id: String,
    pub kind: &'static str,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::room_members)]
pub struct RoomMember {
    pub room_id: String,
    pub user_id: i32,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Message {
    pub id: i32,
    pub room_id: String,
    pub sender_id: i32,
    pub content: String,
    /// JSON array of user ids.
    pub mentions: String,
    pub reply_to_id: Option<i32>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::messages)]
pub struct NewMessage<'a> {
    pub room_id: String,
    pub sender_id: i32,
    pub content: &'a str,
    pub mentions: String,
    pub reply_to_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<Room> for DomainRoom {
    type Error = TypeConstraintError;

    fn try_from(room: Room) -> Result<Self, Self::Error> {
        Ok(Self {
            id: room.id.parse::<RoomId>()?,
            kind: room.kind.parse::<RoomKind>()?,
            created_at: room.created_at,
        })
    }
}

/// Message row joined with the sender's display name.
impl TryFrom<(Message, String)> for DomainMessage {
    type Error = TypeConstraintError;

    fn try_from((message, sender_name): (Message, String)) -> Result<Self, Self::Error> {
        let mentions = serde_json::from_str::<Vec<i32>>(&message.mentions)
            .map_err(|err| TypeConstraintError::InvalidValue(format!("mentions: {err}")))?
            .into_iter()
            .map(UserId::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: MessageId::try_from(message.id)?,
            room_id: message.room_id.parse::<RoomId>()?,
            sender_id: UserId::try_from(message.sender_id)?,
            sender_name,
            content: MessageContent::new(message.content)?,
            mentions,
            reply_to_id: message.reply_to_id.map(MessageId::try_from).transpose()?,
            is_read: message.is_read,
            created_at: message.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewMessage> for NewMessage<'a> {
    fn from(message: &'a DomainNewMessage) -> Self {
        let mentions: Vec<i32> = message.mentions.iter().map(|id| id.get()).collect();
        Self {
            room_id: message.room_id.to_string(),
            sender_id: message.sender_id.get(),
            content: message.content.as_str(),
            mentions: serde_json::to_string(&mentions).unwrap_or_else(|_| "[]".to_string()),
            reply_to_id: message.reply_to_id.map(MessageId::get),
            created_at: message.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn mentions_round_trip_as_json() {
        let mut new_message = DomainNewMessage::new(
            RoomId::GLOBAL,
            UserId::new(1).unwrap(),
            MessageContent::new("hi @Bob").unwrap(),
        );
        new_message.mentions = vec![UserId::new(2).unwrap(), UserId::new(3).unwrap()];

        let insert: NewMessage = (&new_message).into();
        assert_eq!(insert.mentions, "[2,3]");
        assert_eq!(insert.room_id, "00000000-0000-0000-0000-000000000000");

        let row = Message {
            id: 10,
            room_id: insert.room_id.clone(),
            sender_id: 1,
            content: "hi @Bob".into(),
            mentions: insert.mentions.clone(),
            reply_to_id: None,
            is_read: false,
            created_at: Utc::now().naive_utc(),
        };
        let message = DomainMessage::try_from((row, "Ann".to_string())).unwrap();
        assert_eq!(message.mentions, new_message.mentions);
        assert_eq!(message.sender_name, "Ann");
    }
}
