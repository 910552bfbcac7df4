//! Pipeline status definitions and the per-status counters.

use crate::changes::{ChangePublisher, broadcast};
use crate::domain::auth::{AuthenticatedUser, Role};
use crate::domain::change::{ChangeEvent, RowChange};
use crate::domain::status::{LeadStatus, NewLeadStatus};
use crate::repository::{LeadReader, StatusReader, StatusWriter, UserReader};
use crate::services::leads::lead_scope;
use crate::services::{ServiceResult, current_user_id, ensure_role};
use crate::store::stats::{StatusCount, StatusCounters};

/// Active statuses in pipeline order.
pub fn list_statuses<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<LeadStatus>>
where
    R: StatusReader + ?Sized,
{
    current_user_id(user)?;
    Ok(repo.list_active_statuses()?)
}

pub fn create_status<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    new_status: NewLeadStatus,
) -> ServiceResult<LeadStatus>
where
    R: StatusWriter + ?Sized,
{
    ensure_role(user, &[Role::Admin])?;

    let status = repo.create_status(&new_status).map_err(|err| {
        log::error!("Failed to create status {}: {err}", new_status.label);
        err
    })?;
    broadcast(publisher, ChangeEvent::Statuses(RowChange::Inserted(status.clone())));

    Ok(status)
}

/// Lead counts per visible status over the caller's lead scope.
pub fn status_counts<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<StatusCount>>
where
    R: LeadReader + StatusReader + UserReader + ?Sized,
{
    let scope = lead_scope(repo, user)?;
    let statuses = repo.list_active_statuses()?;
    let counts = repo.count_leads_by_status(&scope)?;

    let mut counters = StatusCounters::new(&statuses, user.role);
    counters.resync(counts.iter().map(|(label, count)| (label.as_str(), *count)));

    Ok(counters.entries().to_vec())
}
