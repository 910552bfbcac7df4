use diesel::dsl::count_star;
use diesel::prelude::*;

use crate::domain::auth::Role;
use crate::domain::types::{EmailAddress, SourceFolder, UserId};
use crate::domain::user::{CrmUser, NewCrmUser, encode_sources};
use crate::models::user::{CrmUser as DbCrmUser, NewCrmUser as DbNewCrmUser};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, UserReader, UserWriter};
use crate::schema::{crm_users, lead_notes, leads};

fn into_domain(rows: Vec<DbCrmUser>) -> RepositoryResult<Vec<CrmUser>> {
    Ok(rows
        .into_iter()
        .map(CrmUser::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

impl UserReader for DieselRepository {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<CrmUser>> {
        let mut conn = self.conn()?;

        let user = crm_users::table
            .find(id.get())
            .first::<DbCrmUser>(&mut conn)
            .optional()?;

        Ok(user.map(CrmUser::try_from).transpose()?)
    }

    fn get_user_by_email(&self, email: &EmailAddress) -> RepositoryResult<Option<CrmUser>> {
        let mut conn = self.conn()?;

        let user = crm_users::table
            .filter(crm_users::email.eq(email.as_str()))
            .first::<DbCrmUser>(&mut conn)
            .optional()?;

        Ok(user.map(CrmUser::try_from).transpose()?)
    }

    fn list_users(&self) -> RepositoryResult<Vec<CrmUser>> {
        let mut conn = self.conn()?;

        let rows = crm_users::table
            .order(crm_users::real_name.asc())
            .load::<DbCrmUser>(&mut conn)?;

        into_domain(rows)
    }

    fn list_users_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<CrmUser>> {
        let mut conn = self.conn()?;
        let ids: Vec<i32> = ids.iter().map(|id| id.get()).collect();

        let rows = crm_users::table
            .filter(crm_users::id.eq_any(ids))
            .load::<DbCrmUser>(&mut conn)?;

        into_domain(rows)
    }

    fn list_agents(&self) -> RepositoryResult<Vec<CrmUser>> {
        let mut conn = self.conn()?;
        let roles = [Role::Conversion, Role::Retention, Role::TeamLeader].map(|r| r.as_str());

        let rows = crm_users::table
            .filter(crm_users::role.eq_any(roles))
            .order(crm_users::real_name.asc())
            .load::<DbCrmUser>(&mut conn)?;

        into_domain(rows)
    }

    fn list_team_agents(&self, leader_id: UserId) -> RepositoryResult<Vec<CrmUser>> {
        let mut conn = self.conn()?;

        let rows = crm_users::table
            .filter(crm_users::team_leader_id.eq(leader_id.get()))
            .order(crm_users::real_name.asc())
            .load::<DbCrmUser>(&mut conn)?;

        into_domain(rows)
    }
}

impl UserWriter for DieselRepository {
    fn create_user(&self, new_user: &NewCrmUser) -> RepositoryResult<CrmUser> {
        let mut conn = self.conn()?;

        let insertable: DbNewCrmUser = new_user.into();
        let user = diesel::insert_into(crm_users::table)
            .values(&insertable)
            .get_result::<DbCrmUser>(&mut conn)?;

        Ok(CrmUser::try_from(user)?)
    }

    fn delete_user(&self, id: UserId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            diesel::update(leads::table.filter(leads::assigned_to.eq(id.get())))
                .set(leads::assigned_to.eq(None::<i32>))
                .execute(conn)?;
            diesel::update(crm_users::table.filter(crm_users::team_leader_id.eq(id.get())))
                .set(crm_users::team_leader_id.eq(None::<i32>))
                .execute(conn)?;

            // Notes go with their author; keep the per-lead counters in step.
            let authored = lead_notes::table
                .filter(lead_notes::author_id.eq(id.get()))
                .group_by(lead_notes::lead_id)
                .select((lead_notes::lead_id, count_star()))
                .load::<(i32, i64)>(conn)?;
            for (lead_id, removed) in authored {
                let current = leads::table
                    .find(lead_id)
                    .select(leads::note_count)
                    .first::<i32>(conn)?;
                let remaining = (i64::from(current) - removed).max(0) as i32;
                diesel::update(leads::table.find(lead_id))
                    .set(leads::note_count.eq(remaining))
                    .execute(conn)?;
            }
            diesel::delete(lead_notes::table.filter(lead_notes::author_id.eq(id.get())))
                .execute(conn)?;

            let deleted = diesel::delete(crm_users::table.find(id.get())).execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }

    fn set_team_leader(
        &self,
        agent_ids: &[UserId],
        leader_id: Option<UserId>,
    ) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;
        let agent_ids: Vec<i32> = agent_ids.iter().map(|id| id.get()).collect();

        let updated = diesel::update(crm_users::table.filter(crm_users::id.eq_any(agent_ids)))
            .set(crm_users::team_leader_id.eq(leader_id.map(UserId::get)))
            .execute(&mut conn)?;

        Ok(updated)
    }

    fn set_allowed_sources(
        &self,
        id: UserId,
        sources: &[SourceFolder],
    ) -> RepositoryResult<CrmUser> {
        let mut conn = self.conn()?;

        let user = diesel::update(crm_users::table.find(id.get()))
            .set(crm_users::allowed_sources.eq(encode_sources(sources)))
            .get_result::<DbCrmUser>(&mut conn)?;

        Ok(CrmUser::try_from(user)?)
    }

    fn mark_user_synced(&self, id: UserId) -> RepositoryResult<CrmUser> {
        let mut conn = self.conn()?;

        let user = diesel::update(crm_users::table.find(id.get()))
            .set(crm_users::is_synced.eq(true))
            .get_result::<DbCrmUser>(&mut conn)?;

        Ok(CrmUser::try_from(user)?)
    }
}
