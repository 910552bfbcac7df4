use serde::Serialize;

use crate::domain::chat::{Message, MessageCursor, Room};

#[derive(Debug, Serialize)]
pub struct DirectRoomData {
    pub room: Room,
    /// False when the room already existed.
    pub created: bool,
}

/// Messages in ascending timeline order.
#[derive(Debug, Serialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    /// Cursor to pass as `before_*` for the next older page.
    pub older_cursor: Option<MessageCursor>,
    pub has_more: bool,
}
