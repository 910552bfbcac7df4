//! Lead list, lead mutations, import and export.

use std::io::Read;

use crate::changes::{ChangePublisher, broadcast};
use crate::domain::auth::{AuthenticatedUser, Feature, Role};
use crate::domain::change::{ChangeEvent, LeadAssignment, RowChange};
use crate::domain::lead::{KycStatus, Lead, LeadScope};
use crate::domain::lead_filter::LeadFilter;
use crate::domain::status::{DEFAULT_STATUS_LABEL, LeadStatus, is_hidden_for};
use crate::domain::types::{LeadId, SourceFolder, StatusLabel, UserId};
use crate::dto::leads::{AgentOption, BulkResult, FilterOptions, ImportSummary, LeadPage};
use crate::forms::leads::{
    BulkAssignPayload, BulkLeadsPayload, BulkStatusPayload, parse_leads_csv, write_leads_csv,
};
use crate::pagination::Paginated;
use crate::repository::{LeadListQuery, LeadReader, LeadWriter, StatusReader, UserReader};
use crate::services::{
    ServiceError, ServiceResult, current_user_id, ensure_feature, ensure_role,
};

const LEAD_MANAGERS: [Role; 2] = [Role::Admin, Role::Manager];
const KYC_REVIEWERS: [Role; 3] = [Role::Admin, Role::Manager, Role::Compliance];

/// Rows of the lead table the caller may read.
pub fn lead_scope<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<LeadScope>
where
    R: UserReader + ?Sized,
{
    let user_id = current_user_id(user)?;

    match user.role {
        Role::Admin | Role::Compliance => Ok(LeadScope::All),
        Role::Manager => {
            let sources = repo
                .get_user_by_id(user_id)?
                .map(|manager| manager.allowed_sources)
                .unwrap_or_default();
            if sources.is_empty() {
                Ok(LeadScope::All)
            } else {
                Ok(LeadScope::Sources(sources))
            }
        }
        Role::TeamLeader => {
            let mut members = vec![user_id];
            members.extend(repo.list_team_agents(user_id)?.into_iter().map(|agent| agent.id));
            Ok(LeadScope::AssignedTo(members))
        }
        Role::Conversion | Role::Retention => Ok(LeadScope::AssignedTo(vec![user_id])),
    }
}

fn ensure_lead_access(user: &AuthenticatedUser) -> ServiceResult<()> {
    ensure_feature(user, Feature::Leads).or_else(|_| ensure_feature(user, Feature::Kyc))
}

/// Loads every requested lead; a missing or invisible one fails the whole request.
fn visible_leads<R>(repo: &R, scope: &LeadScope, ids: &[LeadId]) -> ServiceResult<Vec<Lead>>
where
    R: LeadReader + ?Sized,
{
    let leads = repo.list_leads_by_ids(ids)?;
    if leads.len() != ids.len() || !leads.iter().all(|lead| scope.permits(lead)) {
        return Err(ServiceError::NotFound);
    }
    Ok(leads)
}

fn active_status<R>(repo: &R, user: &AuthenticatedUser, label: &StatusLabel) -> ServiceResult<LeadStatus>
where
    R: StatusReader + ?Sized,
{
    let status = repo
        .get_status_by_label(label.as_str())?
        .filter(|status| status.is_active)
        .ok_or_else(|| ServiceError::Form(format!("unknown status {label}")))?;

    if is_hidden_for(user.role, status.label.as_str()) {
        return Err(ServiceError::Unauthorized);
    }
    Ok(status)
}

fn single(mut leads: Vec<Lead>) -> ServiceResult<Lead> {
    leads.pop().ok_or(ServiceError::NotFound)
}

fn publish_updated(publisher: &dyn ChangePublisher, leads: &[Lead]) {
    for lead in leads {
        broadcast(publisher, ChangeEvent::Leads(RowChange::Updated(lead.clone())));
    }
}

pub fn list_leads<R>(
    repo: &R,
    user: &AuthenticatedUser,
    filter: LeadFilter,
) -> ServiceResult<LeadPage>
where
    R: LeadReader + UserReader + ?Sized,
{
    ensure_lead_access(user)?;

    let scope = lead_scope(repo, user)?;
    let viewer = current_user_id(user)?;
    let page = filter.effective_page();
    let limit = filter.effective_limit();

    let (total, leads) = repo
        .list_leads(&LeadListQuery::new(filter, scope, viewer))
        .map_err(|err| {
            log::error!("Failed to list leads: {err}");
            err
        })?;

    Ok(Paginated::new(leads, page, total, limit).into())
}

pub fn get_lead<R>(repo: &R, user: &AuthenticatedUser, lead_id: LeadId) -> ServiceResult<Lead>
where
    R: LeadReader + UserReader + ?Sized,
{
    ensure_lead_access(user)?;
    let scope = lead_scope(repo, user)?;
    single(visible_leads(repo, &scope, &[lead_id])?)
}

/// Moves a lead to another active status.
pub fn update_status<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    lead_id: LeadId,
    label: StatusLabel,
) -> ServiceResult<Lead>
where
    R: LeadReader + LeadWriter + StatusReader + UserReader + ?Sized,
{
    ensure_feature(user, Feature::Leads)?;

    let status = active_status(repo, user, &label)?;
    let scope = lead_scope(repo, user)?;
    visible_leads(repo, &scope, &[lead_id])?;

    let updated = repo
        .update_lead_status(&[lead_id], &status.label)
        .map_err(|err| {
            log::error!("Failed to update status of lead {lead_id}: {err}");
            err
        })?;
    publish_updated(publisher, &updated);

    single(updated)
}

pub fn bulk_update_status<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    payload: BulkStatusPayload,
) -> ServiceResult<BulkResult>
where
    R: LeadReader + LeadWriter + StatusReader + UserReader + ?Sized,
{
    ensure_role(user, &LEAD_MANAGERS)?;

    let status = active_status(repo, user, &payload.status)?;
    let scope = lead_scope(repo, user)?;
    visible_leads(repo, &scope, &payload.lead_ids)?;

    let updated = repo
        .update_lead_status(&payload.lead_ids, &status.label)
        .map_err(|err| {
            log::error!("Failed to bulk update lead status: {err}");
            err
        })?;
    publish_updated(publisher, &updated);

    Ok(BulkResult {
        affected: updated.len(),
        leads: updated,
    })
}

fn assign<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    lead_ids: &[LeadId],
    agent_id: Option<UserId>,
) -> ServiceResult<Vec<Lead>>
where
    R: LeadReader + LeadWriter + UserReader + ?Sized,
{
    ensure_role(user, &LEAD_MANAGERS)?;
    let assigned_by = current_user_id(user)?;

    if let Some(agent_id) = agent_id {
        repo.get_user_by_id(agent_id)?
            .filter(|agent| agent.role.is_agent())
            .ok_or_else(|| ServiceError::Form(format!("user {agent_id} is not an agent")))?;
    }

    let scope = lead_scope(repo, user)?;
    let before = visible_leads(repo, &scope, lead_ids)?;

    let updated = repo.assign_leads(lead_ids, agent_id).map_err(|err| {
        log::error!("Failed to assign leads: {err}");
        err
    })?;
    publish_updated(publisher, &updated);

    if let Some(agent_id) = agent_id.filter(|agent_id| *agent_id != assigned_by) {
        for lead in &updated {
            let already_assigned = before
                .iter()
                .any(|old| old.id == lead.id && old.assigned_to == Some(agent_id));
            if already_assigned {
                continue;
            }
            broadcast(
                publisher,
                ChangeEvent::Assignments(LeadAssignment {
                    lead_id: lead.id,
                    lead_name: lead.display_name(),
                    agent_id,
                    assigned_by,
                }),
            );
        }
    }

    Ok(updated)
}

/// Hands a lead to an agent, or unassigns it with `None`.
pub fn assign_agent<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    lead_id: LeadId,
    agent_id: Option<UserId>,
) -> ServiceResult<Lead>
where
    R: LeadReader + LeadWriter + UserReader + ?Sized,
{
    single(assign(repo, publisher, user, &[lead_id], agent_id)?)
}

pub fn bulk_assign<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    payload: BulkAssignPayload,
) -> ServiceResult<BulkResult>
where
    R: LeadReader + LeadWriter + UserReader + ?Sized,
{
    let leads = assign(repo, publisher, user, &payload.lead_ids, payload.agent_id)?;
    Ok(BulkResult {
        affected: leads.len(),
        leads,
    })
}

pub fn update_kyc<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    lead_id: LeadId,
    kyc_status: KycStatus,
) -> ServiceResult<Lead>
where
    R: LeadReader + LeadWriter + UserReader + ?Sized,
{
    ensure_role(user, &KYC_REVIEWERS)?;

    let scope = lead_scope(repo, user)?;
    visible_leads(repo, &scope, &[lead_id])?;

    let lead = repo.update_lead_kyc(lead_id, kyc_status).map_err(|err| {
        log::error!("Failed to update KYC of lead {lead_id}: {err}");
        err
    })?;
    publish_updated(publisher, std::slice::from_ref(&lead));

    Ok(lead)
}

fn delete<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    lead_ids: &[LeadId],
) -> ServiceResult<Vec<Lead>>
where
    R: LeadReader + LeadWriter + UserReader + ?Sized,
{
    ensure_role(user, &LEAD_MANAGERS)?;

    let scope = lead_scope(repo, user)?;
    visible_leads(repo, &scope, lead_ids)?;

    let deleted = repo.delete_leads(lead_ids).map_err(|err| {
        log::error!("Failed to delete leads: {err}");
        err
    })?;
    for lead in &deleted {
        broadcast(publisher, ChangeEvent::Leads(RowChange::Deleted(lead.clone())));
    }

    Ok(deleted)
}

pub fn delete_lead<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    lead_id: LeadId,
) -> ServiceResult<Lead>
where
    R: LeadReader + LeadWriter + UserReader + ?Sized,
{
    single(delete(repo, publisher, user, &[lead_id])?)
}

pub fn bulk_delete<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    payload: BulkLeadsPayload,
) -> ServiceResult<BulkResult>
where
    R: LeadReader + LeadWriter + UserReader + ?Sized,
{
    let leads = delete(repo, publisher, user, &payload.lead_ids)?;
    Ok(BulkResult {
        affected: leads.len(),
        leads,
    })
}

/// Sources and countries within the caller's scope, agents and the statuses
/// the caller may pick.
pub fn filter_options<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<FilterOptions>
where
    R: LeadReader + StatusReader + UserReader + ?Sized,
{
    ensure_lead_access(user)?;

    let scope = lead_scope(repo, user)?;
    let values = repo.lead_filter_values(&scope)?;
    let agents = repo
        .list_agents()?
        .into_iter()
        .map(AgentOption::from)
        .collect();
    let statuses = repo
        .list_active_statuses()?
        .into_iter()
        .filter(|status| !is_hidden_for(user.role, status.label.as_str()))
        .collect();

    Ok(FilterOptions {
        sources: values.sources,
        countries: values.countries,
        agents,
        statuses,
    })
}

pub fn export_csv<R>(
    repo: &R,
    user: &AuthenticatedUser,
    payload: BulkLeadsPayload,
) -> ServiceResult<String>
where
    R: LeadReader + UserReader + ?Sized,
{
    ensure_role(user, &LEAD_MANAGERS)?;

    let scope = lead_scope(repo, user)?;
    let leads = visible_leads(repo, &scope, &payload.lead_ids)?;

    Ok(write_leads_csv(&leads)?)
}

/// Creates leads from an uploaded CSV file, tagged with `folder`.
///
/// Imported leads start in the first active status, or `New` when none is
/// configured.
pub fn import_leads<R, I>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    folder: SourceFolder,
    input: I,
) -> ServiceResult<ImportSummary>
where
    R: LeadWriter + StatusReader + ?Sized,
    I: Read,
{
    ensure_role(user, &LEAD_MANAGERS)?;

    let status = match repo.list_active_statuses()?.into_iter().next() {
        Some(status) => status.label,
        None => StatusLabel::new(DEFAULT_STATUS_LABEL)?,
    };

    let parsed = parse_leads_csv(input, &folder, &status).map_err(|err| {
        log::error!("Failed to parse leads: {err}");
        err
    })?;
    if parsed.leads.is_empty() {
        return Err(ServiceError::Form("file contains no leads".to_string()));
    }

    let created = repo.create_leads(&parsed.leads).map_err(|err| {
        log::error!("Failed to import leads: {err}");
        err
    })?;
    for lead in &created {
        broadcast(publisher, ChangeEvent::Leads(RowChange::Inserted(lead.clone())));
    }
    log::info!(
        "Imported {} leads into {folder}, skipped {}",
        created.len(),
        parsed.skipped
    );

    Ok(ImportSummary {
        imported: created.len(),
        skipped: parsed.skipped,
    })
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::changes::MemoryChangePublisher;
    use crate::domain::types::SourceFolder;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{crm_user, lead, status, user_with_role};

    fn uid(id: i32) -> UserId {
        UserId::new(id).unwrap()
    }

    fn lid(id: i32) -> LeadId {
        LeadId::new(id).unwrap()
    }

    #[test]
    fn agents_only_list_their_own_leads() {
        let mut repo = MockRepository::new();
        repo.expect_list_leads()
            .withf(|query| {
                query.scope == LeadScope::AssignedTo(vec![UserId::new(7).unwrap()])
                    && query.viewer == UserId::new(7).unwrap()
            })
            .times(1)
            .returning(|_| Ok((51, vec![lead(1, Some(7))])));

        let page = list_leads(&repo, &user_with_role(7, Role::Retention), LeadFilter::default())
            .expect("should list leads");

        assert_eq!(page.total, 51);
        assert_eq!(page.pages, 2);
        assert_eq!(page.leads.len(), 1);
    }

    #[test]
    fn team_leader_scope_includes_team() {
        let mut repo = MockRepository::new();
        repo.expect_list_team_agents()
            .times(1)
            .returning(|_| Ok(vec![crm_user(11, Role::Conversion), crm_user(12, Role::Retention)]));

        let scope = lead_scope(&repo, &user_with_role(5, Role::TeamLeader)).unwrap();
        assert_eq!(scope, LeadScope::AssignedTo(vec![uid(5), uid(11), uid(12)]));
    }

    #[test]
    fn manager_scope_follows_granted_sources() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id().times(1).returning(|_| {
            let mut manager = crm_user(2, Role::Manager);
            manager.allowed_sources = vec![SourceFolder::new("march.csv").unwrap()];
            Ok(Some(manager))
        });

        let scope = lead_scope(&repo, &user_with_role(2, Role::Manager)).unwrap();
        assert_eq!(
            scope,
            LeadScope::Sources(vec![SourceFolder::new("march.csv").unwrap()])
        );
    }

    #[test]
    fn leads_outside_scope_are_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_list_leads_by_ids()
            .returning(|_| Ok(vec![lead(3, Some(99))]));

        let result = get_lead(&repo, &user_with_role(7, Role::Conversion), lid(3));
        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn compliance_cannot_change_status() {
        let mut repo = MockRepository::new();
        repo.expect_update_lead_status().times(0);
        let publisher = MemoryChangePublisher::new();

        let result = update_status(
            &repo,
            &publisher,
            &user_with_role(4, Role::Compliance),
            lid(1),
            StatusLabel::new("Interested").unwrap(),
        );

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
        assert!(publisher.events().is_empty());
    }

    #[test]
    fn status_must_be_active() {
        let mut repo = MockRepository::new();
        repo.expect_get_status_by_label()
            .returning(|label| Ok(Some(status(9, label, false))));
        repo.expect_update_lead_status().times(0);

        let result = update_status(
            &repo,
            &MemoryChangePublisher::new(),
            &user_with_role(1, Role::Admin),
            lid(1),
            StatusLabel::new("Archived").unwrap(),
        );

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn conversion_agents_cannot_pick_hidden_statuses() {
        let mut repo = MockRepository::new();
        repo.expect_get_status_by_label()
            .returning(|label| Ok(Some(status(6, label, true))));
        repo.expect_update_lead_status().times(0);

        let result = update_status(
            &repo,
            &MemoryChangePublisher::new(),
            &user_with_role(7, Role::Conversion),
            lid(1),
            StatusLabel::new("Upsale").unwrap(),
        );

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn status_update_publishes_lead_change() {
        let mut repo = MockRepository::new();
        repo.expect_get_status_by_label()
            .returning(|label| Ok(Some(status(2, label, true))));
        repo.expect_list_leads_by_ids()
            .returning(|_| Ok(vec![lead(1, Some(7))]));
        repo.expect_update_lead_status()
            .withf(|ids, label| ids == [LeadId::new(1).unwrap()] && label.as_str() == "Call Back")
            .times(1)
            .returning(|_, label| {
                let mut updated = lead(1, Some(7));
                updated.status = label.clone();
                Ok(vec![updated])
            });
        let publisher = MemoryChangePublisher::new();

        let updated = update_status(
            &repo,
            &publisher,
            &user_with_role(7, Role::Retention),
            lid(1),
            StatusLabel::new("Call Back").unwrap(),
        )
        .expect("should update status");

        assert_eq!(updated.status.as_str(), "Call Back");
        assert_eq!(publisher.topics(), vec!["leads".to_string()]);
    }

    #[test]
    fn assigning_notifies_the_new_agent() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|id| Ok(Some(crm_user(id.get(), Role::Conversion))));
        repo.expect_list_leads_by_ids()
            .returning(|_| Ok(vec![lead(1, None)]));
        repo.expect_assign_leads()
            .times(1)
            .returning(|_, agent| {
                let mut updated = lead(1, None);
                updated.assigned_to = agent;
                Ok(vec![updated])
            });
        let publisher = MemoryChangePublisher::new();

        let updated = assign_agent(
            &repo,
            &publisher,
            &user_with_role(1, Role::Admin),
            lid(1),
            Some(uid(8)),
        )
        .expect("should assign");

        assert_eq!(updated.assigned_to, Some(uid(8)));
        assert_eq!(
            publisher.topics(),
            vec!["leads".to_string(), "assignments".to_string()]
        );
    }

    #[test]
    fn only_agents_can_receive_leads() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|id| Ok(Some(crm_user(id.get(), Role::Compliance))));
        repo.expect_assign_leads().times(0);

        let result = assign_agent(
            &repo,
            &MemoryChangePublisher::new(),
            &user_with_role(1, Role::Admin),
            lid(1),
            Some(uid(4)),
        );

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn bulk_delete_requires_lead_manager() {
        let mut repo = MockRepository::new();
        repo.expect_delete_leads().times(0);

        let result = bulk_delete(
            &repo,
            &MemoryChangePublisher::new(),
            &user_with_role(5, Role::TeamLeader),
            BulkLeadsPayload {
                lead_ids: vec![lid(1), lid(2)],
            },
        );

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn bulk_delete_publishes_each_row() {
        let mut repo = MockRepository::new();
        repo.expect_list_leads_by_ids()
            .returning(|_| Ok(vec![lead(1, None), lead(2, None)]));
        repo.expect_delete_leads()
            .times(1)
            .returning(|_| Ok(vec![lead(1, None), lead(2, None)]));
        let publisher = MemoryChangePublisher::new();

        let result = bulk_delete(
            &repo,
            &publisher,
            &user_with_role(1, Role::Admin),
            BulkLeadsPayload {
                lead_ids: vec![lid(1), lid(2)],
            },
        )
        .expect("should delete");

        assert_eq!(result.affected, 2);
        assert_eq!(publisher.events().len(), 2);
    }

    #[test]
    fn import_uses_first_active_status() {
        let mut repo = MockRepository::new();
        repo.expect_list_active_statuses()
            .returning(|| Ok(vec![status(1, "Fresh", true), status(2, "New", true)]));
        repo.expect_create_leads()
            .withf(|leads| leads.len() == 2 && leads.iter().all(|l| l.status.as_str() == "Fresh"))
            .times(1)
            .returning(|leads| {
                Ok(leads
                    .iter()
                    .enumerate()
                    .map(|(index, _)| lead(index as i32 + 1, None))
                    .collect())
            });
        let publisher = MemoryChangePublisher::new();

        let summary = import_leads(
            &repo,
            &publisher,
            &user_with_role(1, Role::Manager),
            SourceFolder::new("april.csv").unwrap(),
            "name,email\nAnn,ann@example.com\nBob,\n,\n".as_bytes(),
        )
        .expect("should import");

        assert_eq!(
            summary,
            ImportSummary {
                imported: 2,
                skipped: 1
            }
        );
        assert_eq!(publisher.events().len(), 2);
    }

    #[test]
    fn filter_options_hide_statuses_from_conversion() {
        let mut repo = MockRepository::new();
        repo.expect_lead_filter_values()
            .returning(|_| Ok(Default::default()));
        repo.expect_list_agents()
            .returning(|| Ok(vec![crm_user(7, Role::Conversion)]));
        repo.expect_list_active_statuses()
            .returning(|| Ok(vec![status(1, "New", true), status(2, "Upsale", true)]));

        let options = filter_options(&repo, &user_with_role(7, Role::Conversion)).unwrap();

        assert_eq!(options.statuses.len(), 1);
        assert_eq!(options.agents[0].id, uid(7));
    }
}
