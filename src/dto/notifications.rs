use serde::Serialize;

use crate::domain::notification::Notification;

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}
