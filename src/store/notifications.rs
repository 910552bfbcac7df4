//! Notification bell state.

use crate::domain::change::RowChange;
use crate::domain::notification::{NOTIFICATION_PAGE_SIZE, Notification};
use crate::domain::types::NotificationId;

#[derive(Debug, Default)]
pub struct NotificationInbox {
    items: Vec<Notification>,
    unread: usize,
}

impl NotificationInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, items: Vec<Notification>, unread: usize) {
        self.items = items;
        self.unread = unread;
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    /// Returns `false` when the item was unknown or already read.
    pub fn mark_read(&mut self, id: NotificationId) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) if !item.is_read => {
                item.is_read = true;
                self.unread = self.unread.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for item in &mut self.items {
            item.is_read = true;
        }
        self.unread = 0;
    }

    pub fn remove(&mut self, id: NotificationId) -> Option<Notification> {
        let index = self.items.iter().position(|item| item.id == id)?;
        let removed = self.items.remove(index);
        if !removed.is_read {
            self.unread = self.unread.saturating_sub(1);
        }
        Some(removed)
    }

    pub fn apply_change(&mut self, change: RowChange<Notification>) {
        match change {
            RowChange::Inserted(item) => {
                if self.items.iter().any(|existing| existing.id == item.id) {
                    return;
                }
                if !item.is_read {
                    self.unread += 1;
                }
                self.items.insert(0, item);
                self.items.truncate(NOTIFICATION_PAGE_SIZE);
            }
            RowChange::Updated(item) => {
                if let Some(existing) = self.items.iter_mut().find(|e| e.id == item.id) {
                    if !existing.is_read && item.is_read {
                        self.unread = self.unread.saturating_sub(1);
                    } else if existing.is_read && !item.is_read {
                        self.unread += 1;
                    }
                    *existing = item;
                }
            }
            RowChange::Deleted(item) => {
                self.remove(item.id);
            }
        }
    }
}
