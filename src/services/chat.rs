//! Global and direct chat rooms.

use crate::changes::{ChangePublisher, broadcast};
use crate::domain::auth::{AuthenticatedUser, Feature};
use crate::domain::change::{ChangeEvent, RowChange};
use crate::domain::chat::{DirectRoom, Message, NewMessage, Room};
use crate::domain::types::{RoomId, UserId};
use crate::dto::chat::{DirectRoomData, MessagePage};
use crate::forms::chat::{MessagePagePayload, SendMessagePayload};
use crate::repository::{ChatReader, ChatWriter, UserReader};
use crate::services::{ServiceError, ServiceResult, current_user_id, ensure_feature};
use crate::store::chat::ChatTimeline;

/// Room the caller belongs to; other rooms do not exist for them.
fn member_room<R>(repo: &R, room_id: RoomId, user_id: UserId) -> ServiceResult<Room>
where
    R: ChatReader + ?Sized,
{
    let room = repo.get_room(room_id)?.ok_or(ServiceError::NotFound)?;
    if !repo.is_room_member(room_id, user_id)? {
        return Err(ServiceError::NotFound);
    }
    Ok(room)
}

pub fn list_direct_rooms<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<DirectRoom>>
where
    R: ChatReader + ?Sized,
{
    ensure_feature(user, Feature::Chat)?;
    let user_id = current_user_id(user)?;
    Ok(repo.list_direct_rooms(user_id)?)
}

/// Returns the two-party room with `other_user_id`, creating it on first use.
pub fn open_direct_room<R>(
    repo: &R,
    user: &AuthenticatedUser,
    other_user_id: UserId,
) -> ServiceResult<DirectRoomData>
where
    R: ChatWriter + UserReader + ?Sized,
{
    ensure_feature(user, Feature::Chat)?;
    let user_id = current_user_id(user)?;

    if other_user_id == user_id {
        return Err(ServiceError::Form("cannot open a direct chat with yourself".to_string()));
    }
    repo.get_user_by_id(other_user_id)?
        .ok_or(ServiceError::NotFound)?;

    let (room, created) = repo
        .create_or_get_direct_room(user_id, other_user_id)
        .map_err(|err| {
            log::error!("Failed to open direct room with {other_user_id}: {err}");
            err
        })?;
    if created {
        log::info!("Opened direct room {} for {user_id} and {other_user_id}", room.id);
    }

    Ok(DirectRoomData { room, created })
}

/// Newest messages before the optional cursor, in timeline order.
pub fn list_messages<R>(
    repo: &R,
    user: &AuthenticatedUser,
    room_id: RoomId,
    page: MessagePagePayload,
) -> ServiceResult<MessagePage>
where
    R: ChatReader + ?Sized,
{
    ensure_feature(user, Feature::Chat)?;
    let user_id = current_user_id(user)?;
    member_room(repo, room_id, user_id)?;

    let messages = repo.list_messages(room_id, page.before, page.limit)?;

    let mut timeline = ChatTimeline::with_page_size(room_id, page.limit);
    timeline.load_initial(messages);

    Ok(MessagePage {
        older_cursor: timeline.older_cursor(),
        has_more: timeline.has_more(),
        messages: timeline.messages().to_vec(),
    })
}

pub fn send_message<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    room_id: RoomId,
    payload: SendMessagePayload,
) -> ServiceResult<Message>
where
    R: ChatReader + ChatWriter + UserReader + ?Sized,
{
    ensure_feature(user, Feature::Chat)?;
    let sender_id = current_user_id(user)?;
    member_room(repo, room_id, sender_id)?;

    if let Some(reply_to_id) = payload.reply_to_id {
        repo.get_message(reply_to_id)?
            .filter(|original| original.room_id == room_id)
            .ok_or_else(|| ServiceError::Form("reply target is not in this room".to_string()))?;
    }

    let mentions = if payload.mentions.is_empty() {
        Vec::new()
    } else {
        repo.list_users_by_ids(&payload.mentions)?
            .into_iter()
            .map(|mentioned| mentioned.id)
            .collect()
    };

    let mut new_message = NewMessage::new(room_id, sender_id, payload.content);
    new_message.mentions = mentions;
    new_message.reply_to_id = payload.reply_to_id;

    let message = repo.create_message(&new_message).map_err(|err| {
        log::error!("Failed to send message to room {room_id}: {err}");
        err
    })?;
    broadcast(publisher, ChangeEvent::Messages(RowChange::Inserted(message.clone())));

    Ok(message)
}

/// Marks messages from other senders as read; returns how many changed.
pub fn mark_room_read<R>(repo: &R, user: &AuthenticatedUser, room_id: RoomId) -> ServiceResult<usize>
where
    R: ChatReader + ChatWriter + ?Sized,
{
    ensure_feature(user, Feature::Chat)?;
    let reader_id = current_user_id(user)?;
    member_room(repo, room_id, reader_id)?;

    Ok(repo.mark_room_read(room_id, reader_id)?)
}
