//! Room timeline assembled from paged history and realtime inserts.

use std::collections::{BTreeMap, HashMap};

use crate::domain::change::RowChange;
use crate::domain::chat::{CHAT_PAGE_SIZE, Message, MessageCursor};
use crate::domain::types::{MessageId, RoomId};

/// Unions two batches by id and orders them by `(created_at, id)`.
///
/// When both batches carry the same id the incoming copy wins.
pub fn merge_messages(existing: &[Message], incoming: Vec<Message>) -> Vec<Message> {
    let mut by_key: BTreeMap<MessageCursor, Message> = BTreeMap::new();
    let mut key_of: HashMap<MessageId, MessageCursor> = HashMap::new();

    for message in existing.iter().cloned().chain(incoming) {
        if let Some(previous) = key_of.remove(&message.id) {
            by_key.remove(&previous);
        }
        let key = message.cursor();
        key_of.insert(message.id, key);
        by_key.insert(key, message);
    }

    by_key.into_values().collect()
}

pub struct ChatTimeline {
    room_id: RoomId,
    messages: Vec<Message>,
    has_more: bool,
    page_size: usize,
}

impl ChatTimeline {
    pub fn new(room_id: RoomId) -> Self {
        Self::with_page_size(room_id, CHAT_PAGE_SIZE)
    }

    pub fn with_page_size(room_id: RoomId, page_size: usize) -> Self {
        Self {
            room_id,
            messages: Vec::new(),
            has_more: true,
            page_size: page_size.max(1),
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Cursor for the next older page, `None` once history is exhausted.
    pub fn older_cursor(&self) -> Option<MessageCursor> {
        if !self.has_more {
            return None;
        }
        self.messages.first().map(Message::cursor)
    }

    /// Latest page of the room; replaces whatever was loaded.
    pub fn load_initial(&mut self, page: Vec<Message>) {
        self.has_more = page.len() >= self.page_size;
        self.messages = merge_messages(&[], self.own_messages(page));
    }

    pub fn load_older(&mut self, page: Vec<Message>) {
        if page.len() < self.page_size {
            self.has_more = false;
        }
        let page = self.own_messages(page);
        self.messages = merge_messages(&self.messages, page);
    }

    pub fn apply_change(&mut self, change: RowChange<Message>) {
        match change {
            RowChange::Inserted(message) | RowChange::Updated(message) => {
                if message.room_id == self.room_id {
                    self.messages = merge_messages(&self.messages, vec![message]);
                }
            }
            RowChange::Deleted(message) => self.messages.retain(|m| m.id != message.id),
        }
    }

    fn own_messages(&self, page: Vec<Message>) -> Vec<Message> {
        page.into_iter()
            .filter(|message| message.room_id == self.room_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::domain::types::{MessageContent, UserId};

    fn message(id: i32, seconds: i64, text: &str) -> Message {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Message {
            id: MessageId::new(id).unwrap(),
            room_id: RoomId::GLOBAL,
            sender_id: UserId::new(1).unwrap(),
            sender_name: "Ann".to_string(),
            content: MessageContent::new(text).unwrap(),
            mentions: vec![],
            reply_to_id: None,
            is_read: false,
            created_at: base + Duration::seconds(seconds),
        }
    }

    fn ids(messages: &[Message]) -> Vec<i32> {
        messages.iter().map(|m| m.id.get()).collect()
    }

    #[test]
    fn merge_deduplicates_and_sorts() {
        let existing = vec![message(2, 10, "b"), message(3, 20, "c")];
        let incoming = vec![message(1, 0, "a"), message(3, 20, "c edited"), message(4, 20, "d")];

        let merged = merge_messages(&existing, incoming);

        assert_eq!(ids(&merged), vec![1, 2, 3, 4]);
        assert_eq!(merged[2].content.as_str(), "c edited");
    }

    #[test]
    fn merge_is_order_independent() {
        let a = vec![message(1, 0, "a"), message(5, 30, "e")];
        let b = vec![message(3, 15, "c"), message(1, 0, "a")];
        assert_eq!(
            merge_messages(&a, b.clone()),
            merge_messages(&b, a.clone())
        );
    }

    #[test]
    fn short_page_ends_history() {
        let mut timeline = ChatTimeline::with_page_size(RoomId::GLOBAL, 2);
        timeline.load_initial(vec![message(3, 30, "c"), message(4, 40, "d")]);
        assert!(timeline.has_more());
        assert_eq!(
            timeline.older_cursor().map(|cursor| cursor.id.get()),
            Some(3)
        );

        timeline.load_older(vec![message(2, 20, "b")]);
        assert!(!timeline.has_more());
        assert_eq!(timeline.older_cursor(), None);
        assert_eq!(ids(timeline.messages()), vec![2, 3, 4]);
    }

    #[test]
    fn realtime_insert_appends_once_and_ignores_other_rooms() {
        let mut timeline = ChatTimeline::new(RoomId::GLOBAL);
        timeline.load_initial(vec![message(1, 0, "a")]);
        assert!(!timeline.has_more());

        timeline.apply_change(RowChange::Inserted(message(2, 5, "b")));
        timeline.apply_change(RowChange::Inserted(message(2, 5, "b")));

        let mut foreign = message(3, 6, "elsewhere");
        foreign.room_id = RoomId::new();
        timeline.apply_change(RowChange::Inserted(foreign));

        assert_eq!(ids(timeline.messages()), vec![1, 2]);
    }
}
