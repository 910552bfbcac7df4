use diesel::prelude::*;

use crate::domain::status::{LeadStatus, NewLeadStatus};
use crate::models::status::{LeadStatus as DbLeadStatus, NewLeadStatus as DbNewLeadStatus};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, StatusReader, StatusWriter};
use crate::schema::lead_statuses;

impl StatusReader for DieselRepository {
    fn list_active_statuses(&self) -> RepositoryResult<Vec<LeadStatus>> {
        let mut conn = self.conn()?;

        let statuses = lead_statuses::table
            .filter(lead_statuses::is_active.eq(true))
            .order((lead_statuses::order_index.asc(), lead_statuses::id.asc()))
            .load::<DbLeadStatus>(&mut conn)?
            .into_iter()
            .map(LeadStatus::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(statuses)
    }

    fn get_status_by_label(&self, label: &str) -> RepositoryResult<Option<LeadStatus>> {
        let mut conn = self.conn()?;

        let status = lead_statuses::table
            .filter(lead_statuses::label.eq(label.trim()))
            .first::<DbLeadStatus>(&mut conn)
            .optional()?;

        Ok(status.map(LeadStatus::try_from).transpose()?)
    }
}

impl StatusWriter for DieselRepository {
    fn create_status(&self, new_status: &NewLeadStatus) -> RepositoryResult<LeadStatus> {
        let mut conn = self.conn()?;

        let insertable: DbNewLeadStatus = new_status.into();
        let status = diesel::insert_into(lead_statuses::table)
            .values(&insertable)
            .get_result::<DbLeadStatus>(&mut conn)?;

        Ok(LeadStatus::try_from(status)?)
    }
}
