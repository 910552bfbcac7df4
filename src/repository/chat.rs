use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::dsl::max;
use diesel::prelude::*;

use crate::domain::chat::{DirectRoom, Message, MessageCursor, NewMessage, Room, RoomKind};
use crate::domain::types::{MessageId, RoomId, UserId};
use crate::models::chat::{
    Message as DbMessage, NewMessage as DbNewMessage, NewRoom, Room as DbRoom, RoomMember,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{ChatReader, ChatWriter, DieselRepository};
use crate::schema::{crm_users, messages, room_members, rooms};

fn load_message(conn: &mut SqliteConnection, id: i32) -> RepositoryResult<Option<Message>> {
    let row = messages::table
        .inner_join(crm_users::table)
        .filter(messages::id.eq(id))
        .select((DbMessage::as_select(), crm_users::real_name))
        .first::<(DbMessage, String)>(conn)
        .optional()?;

    Ok(row.map(Message::try_from).transpose()?)
}

fn load_room(conn: &mut SqliteConnection, id: &str) -> RepositoryResult<Room> {
    let room = rooms::table.find(id).first::<DbRoom>(conn)?;
    Ok(Room::try_from(room)?)
}

impl ChatReader for DieselRepository {
    fn get_room(&self, id: RoomId) -> RepositoryResult<Option<Room>> {
        let mut conn = self.conn()?;

        let room = rooms::table
            .find(id.to_string())
            .first::<DbRoom>(&mut conn)
            .optional()?;

        Ok(room.map(Room::try_from).transpose()?)
    }

    fn is_room_member(&self, room_id: RoomId, user_id: UserId) -> RepositoryResult<bool> {
        if room_id.is_global() {
            return Ok(true);
        }

        let mut conn = self.conn()?;

        let count: i64 = room_members::table
            .filter(room_members::room_id.eq(room_id.to_string()))
            .filter(room_members::user_id.eq(user_id.get()))
            .count()
            .get_result(&mut conn)?;

        Ok(count > 0)
    }

    fn list_messages(
        &self,
        room_id: RoomId,
        before: Option<MessageCursor>,
        limit: usize,
    ) -> RepositoryResult<Vec<Message>> {
        let mut conn = self.conn()?;

        let mut query = messages::table
            .inner_join(crm_users::table)
            .filter(messages::room_id.eq(room_id.to_string()))
            .select((DbMessage::as_select(), crm_users::real_name))
            .into_boxed();

        if let Some(cursor) = before {
            query = query.filter(
                messages::created_at.lt(cursor.created_at).or(messages::created_at
                    .eq(cursor.created_at)
                    .and(messages::id.lt(cursor.id.get()))),
            );
        }

        let mut page = query
            .order((messages::created_at.desc(), messages::id.desc()))
            .limit(limit as i64)
            .load::<(DbMessage, String)>(&mut conn)?
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        page.reverse();
        Ok(page)
    }

    fn get_message(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        let mut conn = self.conn()?;
        load_message(&mut conn, id.get())
    }

    fn list_direct_rooms(&self, user_id: UserId) -> RepositoryResult<Vec<DirectRoom>> {
        let mut conn = self.conn()?;

        let room_ids = room_members::table
            .inner_join(rooms::table)
            .filter(room_members::user_id.eq(user_id.get()))
            .filter(rooms::kind.eq(RoomKind::Direct.as_str()))
            .select(room_members::room_id)
            .load::<String>(&mut conn)?;

        if room_ids.is_empty() {
            return Ok(Vec::new());
        }

        let others = room_members::table
            .inner_join(crm_users::table)
            .filter(room_members::room_id.eq_any(&room_ids))
            .filter(room_members::user_id.ne(user_id.get()))
            .select((room_members::room_id, crm_users::id, crm_users::real_name))
            .load::<(String, i32, String)>(&mut conn)?;

        let last_activity: HashMap<String, Option<NaiveDateTime>> = messages::table
            .filter(messages::room_id.eq_any(&room_ids))
            .group_by(messages::room_id)
            .select((messages::room_id, max(messages::created_at)))
            .load::<(String, Option<NaiveDateTime>)>(&mut conn)?
            .into_iter()
            .collect();

        let mut rooms = others
            .into_iter()
            .map(|(room_id, other_id, other_name)| {
                Ok(DirectRoom {
                    room_id: room_id.parse::<RoomId>()?,
                    other_user_id: UserId::try_from(other_id)?,
                    other_user_name: other_name,
                    last_message_at: last_activity.get(&room_id).copied().flatten(),
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        rooms.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(rooms)
    }
}

impl ChatWriter for DieselRepository {
    fn create_or_get_direct_room(
        &self,
        user_id: UserId,
        other_user_id: UserId,
    ) -> RepositoryResult<(Room, bool)> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            let shared_with_other = room_members::table
                .filter(room_members::user_id.eq(other_user_id.get()))
                .select(room_members::room_id)
                .load::<String>(conn)?;

            let existing = room_members::table
                .inner_join(rooms::table)
                .filter(room_members::user_id.eq(user_id.get()))
                .filter(rooms::kind.eq(RoomKind::Direct.as_str()))
                .filter(room_members::room_id.eq_any(&shared_with_other))
                .select(room_members::room_id)
                .first::<String>(conn)
                .optional()?;

            if let Some(room_id) = existing {
                return Ok((load_room(conn, &room_id)?, false));
            }

            let room_id = RoomId::new().to_string();
            diesel::insert_into(rooms::table)
                .values(&NewRoom {
                    id: room_id.clone(),
                    kind: RoomKind::Direct.as_str(),
                })
                .execute(conn)?;

            let members = [user_id, other_user_id].map(|member| RoomMember {
                room_id: room_id.clone(),
                user_id: member.get(),
            });
            diesel::insert_into(room_members::table)
                .values(&members[..])
                .execute(conn)?;

            Ok((load_room(conn, &room_id)?, true))
        })
    }

    fn create_message(&self, new_message: &NewMessage) -> RepositoryResult<Message> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let insertable: DbNewMessage = new_message.into();
            let id = diesel::insert_into(messages::table)
                .values(&insertable)
                .returning(messages::id)
                .get_result::<i32>(conn)?;

            load_message(conn, id)?.ok_or(RepositoryError::NotFound)
        })
    }

    fn mark_room_read(&self, room_id: RoomId, reader_id: UserId) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;

        let updated = diesel::update(
            messages::table
                .filter(messages::room_id.eq(room_id.to_string()))
                .filter(messages::sender_id.ne(reader_id.get()))
                .filter(messages::is_read.eq(false)),
        )
        .set(messages::is_read.eq(true))
        .execute(&mut conn)?;

        Ok(updated)
    }
}
