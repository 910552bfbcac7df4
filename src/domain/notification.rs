use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{LeadId, NonEmptyString, NotificationId, UserId};

pub const NOTIFICATION_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    /// Lead opened when the notification is clicked.
    pub related_lead_id: Option<LeadId>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub title: NonEmptyString,
    pub message: String,
    pub related_lead_id: Option<LeadId>,
    pub created_at: NaiveDateTime,
}

impl NewNotification {
    pub fn new(user_id: UserId, title: NonEmptyString, message: impl Into<String>) -> Self {
        Self {
            user_id,
            title,
            message: message.into(),
            related_lead_id: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn related_lead(mut self, lead_id: LeadId) -> Self {
        self.related_lead_id = Some(lead_id);
        self
    }
}
