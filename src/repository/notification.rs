use diesel::prelude::*;

use crate::domain::notification::{NewNotification, Notification};
use crate::domain::types::{NotificationId, UserId};
use crate::models::notification::{
    NewNotification as DbNewNotification, Notification as DbNotification,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, NotificationReader, NotificationWriter};
use crate::schema::notifications;

impl NotificationReader for DieselRepository {
    fn list_notifications(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> RepositoryResult<Vec<Notification>> {
        let mut conn = self.conn()?;

        let items = notifications::table
            .filter(notifications::user_id.eq(user_id.get()))
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .limit(limit as i64)
            .load::<DbNotification>(&mut conn)?
            .into_iter()
            .map(Notification::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn count_unread_notifications(&self, user_id: UserId) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;

        let unread: i64 = notifications::table
            .filter(notifications::user_id.eq(user_id.get()))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result(&mut conn)?;

        Ok(unread as usize)
    }

    fn get_notification(&self, id: NotificationId) -> RepositoryResult<Option<Notification>> {
        let mut conn = self.conn()?;

        let notification = notifications::table
            .find(id.get())
            .first::<DbNotification>(&mut conn)
            .optional()?;

        Ok(notification.map(Notification::try_from).transpose()?)
    }
}

impl NotificationWriter for DieselRepository {
    fn create_notification(
        &self,
        new_notification: &NewNotification,
    ) -> RepositoryResult<Notification> {
        let mut conn = self.conn()?;

        let insertable: DbNewNotification = new_notification.into();
        let notification = diesel::insert_into(notifications::table)
            .values(&insertable)
            .get_result::<DbNotification>(&mut conn)?;

        Ok(Notification::try_from(notification)?)
    }

    fn mark_notification_read(&self, id: NotificationId) -> RepositoryResult<Notification> {
        let mut conn = self.conn()?;

        let notification = diesel::update(notifications::table.find(id.get()))
            .set(notifications::is_read.eq(true))
            .get_result::<DbNotification>(&mut conn)?;

        Ok(Notification::try_from(notification)?)
    }

    fn mark_all_notifications_read(&self, user_id: UserId) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;

        let updated = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id.get()))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?;

        Ok(updated)
    }

    fn delete_notification(&self, id: NotificationId) -> RepositoryResult<Notification> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let notification = notifications::table
                .find(id.get())
                .first::<DbNotification>(conn)?;
            diesel::delete(notifications::table.find(id.get())).execute(conn)?;
            Ok(Notification::try_from(notification)?)
        })
    }
}
