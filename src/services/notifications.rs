//! Notification inbox and the notifications raised from the change feed.

use crate::changes::{ChangePublisher, broadcast};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::change::{ChangeEvent, LeadAssignment, RowChange};
use crate::domain::chat::Message;
use crate::domain::notification::{NOTIFICATION_PAGE_SIZE, NewNotification, Notification};
use crate::domain::types::{NonEmptyString, NotificationId};
use crate::dto::notifications::NotificationList;
use crate::repository::{NotificationReader, NotificationWriter};
use crate::services::{ServiceError, ServiceResult, current_user_id};

pub const MENTION_TITLE: &str = "New mention";
pub const ASSIGNMENT_TITLE: &str = "Lead assigned";

/// Longest message excerpt quoted in a mention notification.
const EXCERPT_CHARS: usize = 120;

pub fn list_notifications<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<NotificationList>
where
    R: NotificationReader + ?Sized,
{
    let user_id = current_user_id(user)?;

    Ok(NotificationList {
        notifications: repo.list_notifications(user_id, NOTIFICATION_PAGE_SIZE)?,
        unread: repo.count_unread_notifications(user_id)?,
    })
}

/// Notification addressed to the caller; someone else's is reported missing.
fn own_notification<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: NotificationId,
) -> ServiceResult<Notification>
where
    R: NotificationReader + ?Sized,
{
    let user_id = current_user_id(user)?;
    repo.get_notification(id)?
        .filter(|notification| notification.user_id == user_id)
        .ok_or(ServiceError::NotFound)
}

pub fn mark_read<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    id: NotificationId,
) -> ServiceResult<Notification>
where
    R: NotificationReader + NotificationWriter + ?Sized,
{
    own_notification(repo, user, id)?;

    let notification = repo.mark_notification_read(id)?;
    broadcast(
        publisher,
        ChangeEvent::Notifications(RowChange::Updated(notification.clone())),
    );
    Ok(notification)
}

pub fn mark_all_read<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<usize>
where
    R: NotificationWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    Ok(repo.mark_all_notifications_read(user_id)?)
}

pub fn delete_notification<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    id: NotificationId,
) -> ServiceResult<Notification>
where
    R: NotificationReader + NotificationWriter + ?Sized,
{
    own_notification(repo, user, id)?;

    let notification = repo.delete_notification(id)?;
    broadcast(
        publisher,
        ChangeEvent::Notifications(RowChange::Deleted(notification.clone())),
    );
    Ok(notification)
}

fn deliver<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    new_notification: &NewNotification,
) -> ServiceResult<Notification>
where
    R: NotificationWriter + ?Sized,
{
    let notification = repo.create_notification(new_notification).map_err(|err| {
        log::error!(
            "Failed to notify user {}: {err}",
            new_notification.user_id
        );
        err
    })?;
    broadcast(
        publisher,
        ChangeEvent::Notifications(RowChange::Inserted(notification.clone())),
    );
    Ok(notification)
}

/// One notification per mentioned user; senders never notify themselves.
pub fn notify_mentions<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    message: &Message,
) -> ServiceResult<Vec<Notification>>
where
    R: NotificationWriter + ?Sized,
{
    let title = NonEmptyString::new(MENTION_TITLE)?;
    let excerpt: String = message.content.as_str().chars().take(EXCERPT_CHARS).collect();
    let body = format!("{} mentioned you: {excerpt}", message.sender_name);

    let mut recipients = message.mentions.clone();
    recipients.sort_unstable();
    recipients.dedup();

    recipients
        .into_iter()
        .filter(|recipient| *recipient != message.sender_id)
        .map(|recipient| {
            deliver(
                repo,
                publisher,
                &NewNotification::new(recipient, title.clone(), body.clone()),
            )
        })
        .collect()
}

pub fn notify_assignment<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    assignment: &LeadAssignment,
) -> ServiceResult<Notification>
where
    R: NotificationWriter + ?Sized,
{
    let new_notification = NewNotification::new(
        assignment.agent_id,
        NonEmptyString::new(ASSIGNMENT_TITLE)?,
        format!("{} was assigned to you", assignment.lead_name),
    )
    .related_lead(assignment.lead_id);

    deliver(repo, publisher, &new_notification)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::changes::MemoryChangePublisher;
    use crate::domain::auth::Role;
    use crate::domain::types::{LeadId, MessageContent, MessageId, RoomId, UserId};
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::user_with_role;

    fn uid(id: i32) -> UserId {
        UserId::new(id).unwrap()
    }

    fn stored(new_notification: &NewNotification, id: i32) -> Notification {
        Notification {
            id: NotificationId::new(id).unwrap(),
            user_id: new_notification.user_id,
            title: new_notification.title.to_string(),
            message: new_notification.message.clone(),
            is_read: false,
            related_lead_id: new_notification.related_lead_id,
            created_at: new_notification.created_at,
        }
    }

    #[test]
    fn mentions_skip_the_sender() {
        let mut repo = MockRepository::new();
        repo.expect_create_notification()
            .withf(|new_notification| new_notification.title.as_str() == MENTION_TITLE)
            .times(2)
            .returning(|new_notification| Ok(stored(new_notification, 1)));
        let publisher = MemoryChangePublisher::new();
        let message = Message {
            id: MessageId::new(1).unwrap(),
            room_id: RoomId::GLOBAL,
            sender_id: uid(2),
            sender_name: "Ann".to_string(),
            content: MessageContent::new("@bob @cid @ann look").unwrap(),
            mentions: vec![uid(3), uid(2), uid(4), uid(3)],
            reply_to_id: None,
            is_read: false,
            created_at: Utc::now().naive_utc(),
        };

        let created = notify_mentions(&repo, &publisher, &message).unwrap();

        let recipients: Vec<UserId> = created.iter().map(|n| n.user_id).collect();
        assert_eq!(recipients, vec![uid(3), uid(4)]);
        assert_eq!(
            publisher.topics(),
            vec!["notifications:3".to_string(), "notifications:4".to_string()]
        );
    }

    #[test]
    fn assignment_links_the_lead() {
        let mut repo = MockRepository::new();
        repo.expect_create_notification()
            .withf(|new_notification| {
                new_notification.related_lead_id == Some(LeadId::new(9).unwrap())
                    && new_notification.title.as_str() == ASSIGNMENT_TITLE
            })
            .times(1)
            .returning(|new_notification| Ok(stored(new_notification, 5)));

        let assignment = LeadAssignment {
            lead_id: LeadId::new(9).unwrap(),
            lead_name: "Jane Doe".to_string(),
            agent_id: uid(4),
            assigned_by: uid(1),
        };
        let notification =
            notify_assignment(&repo, &MemoryChangePublisher::new(), &assignment).unwrap();

        assert_eq!(notification.message, "Jane Doe was assigned to you");
    }

    #[test]
    fn foreign_notifications_are_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_notification().returning(|id| {
            let new_notification =
                NewNotification::new(uid(8), NonEmptyString::new("t").unwrap(), "");
            Ok(Some(stored(&new_notification, id.get())))
        });
        repo.expect_delete_notification().times(0);

        let result = delete_notification(
            &repo,
            &MemoryChangePublisher::new(),
            &user_with_role(3, Role::Retention),
            NotificationId::new(1).unwrap(),
        );

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }
}
