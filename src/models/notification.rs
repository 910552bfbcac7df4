use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::notification::{
    NewNotification as DomainNewNotification, Notification as DomainNotification,
};
use crate::domain::types::{LeadId, NotificationId, TypeConstraintError, UserId};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub related_lead_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::notifications)]
pub struct NewNotification<'a> {
    pub user_id: i32,
    pub title: &'a str,
    pub message: &'a str,
    pub related_lead_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<Notification> for DomainNotification {
    type Error = TypeConstraintError;

    fn try_from(notification: Notification) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NotificationId::try_from(notification.id)?,
            user_id: UserId::try_from(notification.user_id)?,
            title: notification.title,
            message: notification.message,
            is_read: notification.is_read,
            related_lead_id: notification
                .related_lead_id
                .map(LeadId::try_from)
                .transpose()?,
            created_at: notification.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewNotification> for NewNotification<'a> {
    fn from(notification: &'a DomainNewNotification) -> Self {
        Self {
            user_id: notification.user_id.get(),
            title: notification.title.as_str(),
            message: notification.message.as_str(),
            related_lead_id: notification.related_lead_id.map(LeadId::get),
            created_at: notification.created_at,
        }
    }
}
