use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel::sqlite::Sqlite;

use crate::domain::lead::{KycStatus, Lead, LeadFilterValues, LeadScope, NewLead};
use crate::domain::lead_filter::LeadTab;
use crate::domain::types::{LeadId, StatusLabel, UserId};
use crate::models::lead::{Lead as DbLead, NewLead as DbNewLead};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, LeadListQuery, LeadReader, LeadWriter};
use crate::schema::{lead_notes, leads};

type LeadPredicate = Box<dyn BoxableExpression<leads::table, Sqlite, SqlType = Bool>>;

/// Row restriction for a visibility scope; `None` means every lead.
fn scope_predicate(scope: &LeadScope) -> Option<LeadPredicate> {
    match scope {
        LeadScope::All => None,
        LeadScope::Sources(folders) => {
            let folders: Vec<String> = folders.iter().map(|f| f.as_str().to_string()).collect();
            Some(Box::new(
                leads::source_file.assume_not_null().eq_any(folders),
            ))
        }
        LeadScope::AssignedTo(users) => {
            let users: Vec<i32> = users.iter().map(|id| id.get()).collect();
            Some(Box::new(leads::assigned_to.assume_not_null().eq_any(users)))
        }
    }
}

fn raw_ids(ids: &[LeadId]) -> Vec<i32> {
    ids.iter().map(|id| id.get()).collect()
}

fn filtered_leads(query: &LeadListQuery) -> leads::BoxedQuery<'static, Sqlite> {
    let filter = &query.filter;
    let mut items = leads::table.into_boxed();

    if let Some(predicate) = scope_predicate(&query.scope) {
        items = items.filter(predicate);
    }

    if !filter.statuses.is_empty() {
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.to_string()).collect();
        items = items.filter(leads::status.eq_any(statuses));
    }

    if let Some(term) = filter.effective_search() {
        let pattern = format!("%{term}%");
        items = items.filter(
            leads::name
                .like(pattern.clone())
                .or(leads::surname.like(pattern.clone()))
                .or(leads::email.like(pattern.clone()))
                .or(leads::phone.like(pattern)),
        );
    }

    let (start, end) = filter.date_range.bounds(query.now);
    if let Some(start) = start {
        items = items.filter(leads::created_at.ge(start));
    }
    if let Some(end) = end {
        items = items.filter(leads::created_at.lt(end));
    }

    if !filter.agents.is_empty() {
        let agents: Vec<i32> = filter.agents.iter().map(|id| id.get()).collect();
        items = items.filter(leads::assigned_to.eq_any(agents));
    }

    if !filter.sources.is_empty() {
        let sources: Vec<String> = filter.sources.iter().map(|s| s.to_string()).collect();
        items = items.filter(leads::source_file.eq_any(sources));
    }

    if !filter.countries.is_empty() {
        let countries: Vec<String> = filter.countries.iter().map(|s| s.to_string()).collect();
        items = items.filter(leads::country.eq_any(countries));
    }

    match filter.tab {
        LeadTab::All => {}
        LeadTab::Mine => items = items.filter(leads::assigned_to.eq(query.viewer.get())),
        LeadTab::Unassigned => items = items.filter(leads::assigned_to.is_null()),
    }

    items
}

fn load_by_ids(conn: &mut SqliteConnection, ids: &[i32]) -> RepositoryResult<Vec<Lead>> {
    let rows = leads::table
        .filter(leads::id.eq_any(ids))
        .order((leads::created_at.desc(), leads::id.desc()))
        .load::<DbLead>(conn)?;

    Ok(rows
        .into_iter()
        .map(Lead::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

impl LeadReader for DieselRepository {
    fn get_lead_by_id(&self, id: LeadId) -> RepositoryResult<Option<Lead>> {
        let mut conn = self.conn()?;

        let lead = leads::table
            .find(id.get())
            .first::<DbLead>(&mut conn)
            .optional()?;

        Ok(lead.map(Lead::try_from).transpose()?)
    }

    fn list_leads(&self, query: &LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)> {
        let mut conn = self.conn()?;

        let total: i64 = filtered_leads(query).count().get_result(&mut conn)?;

        let limit = query.filter.effective_limit() as i64;
        let offset = i64::try_from(query.filter.offset()).unwrap_or(i64::MAX);

        let items = filtered_leads(query)
            .order((leads::created_at.desc(), leads::id.desc()))
            .limit(limit)
            .offset(offset)
            .load::<DbLead>(&mut conn)?
            .into_iter()
            .map(Lead::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as usize, items))
    }

    fn list_leads_by_ids(&self, ids: &[LeadId]) -> RepositoryResult<Vec<Lead>> {
        let mut conn = self.conn()?;
        load_by_ids(&mut conn, &raw_ids(ids))
    }

    fn lead_filter_values(&self, scope: &LeadScope) -> RepositoryResult<LeadFilterValues> {
        let mut conn = self.conn()?;

        let mut sources = leads::table
            .select(leads::source_file)
            .filter(leads::source_file.is_not_null())
            .distinct()
            .order(leads::source_file.asc())
            .into_boxed();
        if let Some(predicate) = scope_predicate(scope) {
            sources = sources.filter(predicate);
        }

        let mut countries = leads::table
            .select(leads::country)
            .filter(leads::country.is_not_null())
            .distinct()
            .order(leads::country.asc())
            .into_boxed();
        if let Some(predicate) = scope_predicate(scope) {
            countries = countries.filter(predicate);
        }

        let sources = sources
            .load::<Option<String>>(&mut conn)?
            .into_iter()
            .flatten()
            .filter(|value| !value.trim().is_empty())
            .collect();
        let countries = countries
            .load::<Option<String>>(&mut conn)?
            .into_iter()
            .flatten()
            .filter(|value| !value.trim().is_empty())
            .collect();

        Ok(LeadFilterValues { sources, countries })
    }

    fn count_leads_by_status(&self, scope: &LeadScope) -> RepositoryResult<Vec<(String, usize)>> {
        let mut conn = self.conn()?;

        let mut query = leads::table
            .group_by(leads::status)
            .select((leads::status, count_star()))
            .into_boxed();
        if let Some(predicate) = scope_predicate(scope) {
            query = query.filter(predicate);
        }

        let counts = query
            .load::<(String, i64)>(&mut conn)?
            .into_iter()
            .map(|(status, count)| (status, count as usize))
            .collect();

        Ok(counts)
    }
}

impl LeadWriter for DieselRepository {
    fn create_leads(&self, new_leads: &[NewLead]) -> RepositoryResult<Vec<Lead>> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let mut created = Vec::with_capacity(new_leads.len());
            for new_lead in new_leads {
                let insertable: DbNewLead = new_lead.into();
                let row = diesel::insert_into(leads::table)
                    .values(&insertable)
                    .get_result::<DbLead>(conn)?;
                created.push(Lead::try_from(row)?);
            }
            Ok(created)
        })
    }

    fn update_lead_status(
        &self,
        ids: &[LeadId],
        status: &StatusLabel,
    ) -> RepositoryResult<Vec<Lead>> {
        let mut conn = self.conn()?;
        let ids = raw_ids(ids);

        conn.transaction::<_, RepositoryError, _>(|conn| {
            diesel::update(leads::table.filter(leads::id.eq_any(&ids)))
                .set((
                    leads::status.eq(status.as_str()),
                    leads::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;
            load_by_ids(conn, &ids)
        })
    }

    fn assign_leads(&self, ids: &[LeadId], agent: Option<UserId>) -> RepositoryResult<Vec<Lead>> {
        let mut conn = self.conn()?;
        let ids = raw_ids(ids);

        conn.transaction::<_, RepositoryError, _>(|conn| {
            diesel::update(leads::table.filter(leads::id.eq_any(&ids)))
                .set((
                    leads::assigned_to.eq(agent.map(UserId::get)),
                    leads::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;
            load_by_ids(conn, &ids)
        })
    }

    fn update_lead_kyc(&self, id: LeadId, kyc_status: KycStatus) -> RepositoryResult<Lead> {
        let mut conn = self.conn()?;

        let row = diesel::update(leads::table.find(id.get()))
            .set((
                leads::kyc_status.eq(kyc_status.as_str()),
                leads::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<DbLead>(&mut conn)?;

        Ok(Lead::try_from(row)?)
    }

    fn delete_leads(&self, ids: &[LeadId]) -> RepositoryResult<Vec<Lead>> {
        let mut conn = self.conn()?;
        let ids = raw_ids(ids);

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let removed = load_by_ids(conn, &ids)?;
            diesel::delete(lead_notes::table.filter(lead_notes::lead_id.eq_any(&ids)))
                .execute(conn)?;
            diesel::delete(leads::table.filter(leads::id.eq_any(&ids))).execute(conn)?;
            Ok(removed)
        })
    }
}
