//! Team administration: staff accounts, team leader linkage and source grants.

use std::collections::HashMap;

use crate::domain::auth::{AuthenticatedUser, Role};
use crate::domain::types::{SourceFolder, UserId};
use crate::domain::user::{CrmUser, NewCrmUser};
use crate::dto::team::{TeamMember, TeamOverview};
use crate::repository::{UserReader, UserWriter};
use crate::services::{ServiceError, ServiceResult, current_user_id, ensure_role};

const TEAM_ADMINS: [Role; 2] = [Role::Admin, Role::Manager];

/// Roles mirrored to the trading platform back-office.
const SYNCABLE_ROLES: [Role; 3] = [Role::Admin, Role::Manager, Role::Compliance];

fn existing_user<R>(repo: &R, id: UserId) -> ServiceResult<CrmUser>
where
    R: UserReader + ?Sized,
{
    repo.get_user_by_id(id)?.ok_or(ServiceError::NotFound)
}

fn team_leader<R>(repo: &R, id: UserId) -> ServiceResult<CrmUser>
where
    R: UserReader + ?Sized,
{
    let leader = existing_user(repo, id)?;
    if leader.role != Role::TeamLeader {
        return Err(ServiceError::Form(format!("user {id} is not a team leader")));
    }
    Ok(leader)
}

pub fn list_team<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<TeamOverview>
where
    R: UserReader + ?Sized,
{
    ensure_role(user, &TEAM_ADMINS)?;

    let users = repo.list_users()?;

    let names: HashMap<UserId, String> = users
        .iter()
        .map(|member| (member.id, member.real_name.to_string()))
        .collect();
    let mut team_sizes: HashMap<UserId, usize> = HashMap::new();
    for leader_id in users.iter().filter_map(|member| member.team_leader_id) {
        *team_sizes.entry(leader_id).or_default() += 1;
    }

    let free_agents = users
        .iter()
        .filter(|member| member.is_free_agent())
        .map(|member| member.id)
        .collect();

    let members = users
        .into_iter()
        .map(|member| TeamMember {
            team_leader_name: member
                .team_leader_id
                .and_then(|leader_id| names.get(&leader_id).cloned()),
            team_size: team_sizes.get(&member.id).copied().unwrap_or_default(),
            user: member,
        })
        .collect();

    Ok(TeamOverview {
        members,
        free_agents,
    })
}

/// Managers may only create agent accounts.
pub fn create_user<R>(
    repo: &R,
    user: &AuthenticatedUser,
    new_user: NewCrmUser,
) -> ServiceResult<CrmUser>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_role(user, &TEAM_ADMINS)?;
    if user.role == Role::Manager && !new_user.role.is_agent() {
        return Err(ServiceError::Unauthorized);
    }

    if repo.get_user_by_email(&new_user.email)?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "{} is already registered",
            new_user.email
        )));
    }

    let created = repo.create_user(&new_user).map_err(|err| {
        log::error!("Failed to create user {}: {err}", new_user.email);
        err
    })?;
    log::info!("Created {} account {}", created.role, created.email);

    Ok(created)
}

/// Removes a user; their leads and team agents become unassigned.
pub fn delete_user<R>(repo: &R, user: &AuthenticatedUser, id: UserId) -> ServiceResult<()>
where
    R: UserWriter + ?Sized,
{
    ensure_role(user, &[Role::Admin])?;
    if current_user_id(user)? == id {
        return Err(ServiceError::Form("you cannot delete your own account".to_string()));
    }

    repo.delete_user(id).map_err(|err| {
        log::error!("Failed to delete user {id}: {err}");
        err
    })?;
    log::info!("Deleted user {id}");

    Ok(())
}

/// Links free conversion and retention agents to a team leader.
pub fn assign_agents<R>(
    repo: &R,
    user: &AuthenticatedUser,
    leader_id: UserId,
    agent_ids: &[UserId],
) -> ServiceResult<usize>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_role(user, &TEAM_ADMINS)?;
    team_leader(repo, leader_id)?;

    let agents = repo.list_users_by_ids(agent_ids)?;
    if agents.len() != agent_ids.len() {
        return Err(ServiceError::NotFound);
    }
    if let Some(taken) = agents.iter().find(|agent| !agent.is_free_agent()) {
        return Err(ServiceError::Form(format!(
            "{} is not a free agent",
            taken.real_name
        )));
    }

    Ok(repo.set_team_leader(agent_ids, Some(leader_id))?)
}

pub fn remove_agents<R>(
    repo: &R,
    user: &AuthenticatedUser,
    leader_id: UserId,
    agent_ids: &[UserId],
) -> ServiceResult<usize>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_role(user, &TEAM_ADMINS)?;
    team_leader(repo, leader_id)?;

    let team = repo.list_team_agents(leader_id)?;
    if let Some(outsider) = agent_ids
        .iter()
        .find(|id| !team.iter().any(|agent| agent.id == **id))
    {
        return Err(ServiceError::Form(format!(
            "user {outsider} is not in this team"
        )));
    }

    Ok(repo.set_team_leader(agent_ids, None)?)
}

/// Replaces the source folders a manager is restricted to.
pub fn grant_sources<R>(
    repo: &R,
    user: &AuthenticatedUser,
    manager_id: UserId,
    folders: &[SourceFolder],
) -> ServiceResult<CrmUser>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_role(user, &TEAM_ADMINS)?;

    let manager = existing_user(repo, manager_id)?;
    if manager.role != Role::Manager {
        return Err(ServiceError::Form(format!(
            "{} is not a manager",
            manager.real_name
        )));
    }

    Ok(repo.set_allowed_sources(manager_id, folders)?)
}

pub fn mark_synced<R>(repo: &R, user: &AuthenticatedUser, id: UserId) -> ServiceResult<CrmUser>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_role(user, &TEAM_ADMINS)?;

    let target = existing_user(repo, id)?;
    if !SYNCABLE_ROLES.contains(&target.role) {
        return Err(ServiceError::Form(format!(
            "{} accounts are not synced to the platform",
            target.role
        )));
    }

    let synced = repo.mark_user_synced(id)?;
    log::info!("Marked {} as synced", synced.email);
    Ok(synced)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::types::{EmailAddress, PersonName};
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{crm_user, user_with_role};

    fn uid(id: i32) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn overview_counts_team_members() {
        let mut repo = MockRepository::new();
        repo.expect_list_users().returning(|| {
            let leader = crm_user(1, Role::TeamLeader);
            let mut member = crm_user(2, Role::Conversion);
            member.team_leader_id = Some(uid(1));
            let free = crm_user(3, Role::Retention);
            Ok(vec![leader, member, free])
        });

        let overview = list_team(&repo, &user_with_role(9, Role::Manager)).unwrap();

        assert_eq!(overview.members[0].team_size, 1);
        assert_eq!(
            overview.members[1].team_leader_name.as_deref(),
            Some("User 1")
        );
        assert_eq!(overview.free_agents, vec![uid(3)]);
    }

    #[test]
    fn agents_cannot_see_the_team() {
        let repo = MockRepository::new();
        let result = list_team(&repo, &user_with_role(4, Role::TeamLeader));
        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn managers_only_create_agents() {
        let mut repo = MockRepository::new();
        repo.expect_create_user().times(0);

        let result = create_user(
            &repo,
            &user_with_role(2, Role::Manager),
            NewCrmUser {
                email: EmailAddress::new("boss@example.com").unwrap(),
                real_name: PersonName::new("Boss").unwrap(),
                role: Role::Admin,
            },
        );

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn duplicate_emails_conflict() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_email()
            .returning(|_| Ok(Some(crm_user(5, Role::Conversion))));
        repo.expect_create_user().times(0);

        let result = create_user(
            &repo,
            &user_with_role(1, Role::Admin),
            NewCrmUser {
                email: EmailAddress::new("user5@example.com").unwrap(),
                real_name: PersonName::new("Again").unwrap(),
                role: Role::Conversion,
            },
        );

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn admins_cannot_delete_themselves() {
        let mut repo = MockRepository::new();
        repo.expect_delete_user().times(0);

        let result = delete_user(&repo, &user_with_role(1, Role::Admin), uid(1));

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn only_free_agents_join_a_team() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|id| Ok(Some(crm_user(id.get(), Role::TeamLeader))));
        repo.expect_list_users_by_ids().returning(|_| {
            let mut taken = crm_user(3, Role::Retention);
            taken.team_leader_id = Some(uid(8));
            Ok(vec![crm_user(2, Role::Conversion), taken])
        });
        repo.expect_set_team_leader().times(0);

        let result = assign_agents(
            &repo,
            &user_with_role(1, Role::Admin),
            uid(1),
            &[uid(2), uid(3)],
        );

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn removing_agents_clears_the_leader() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|id| Ok(Some(crm_user(id.get(), Role::TeamLeader))));
        repo.expect_list_team_agents().returning(|leader| {
            let mut agent = crm_user(2, Role::Conversion);
            agent.team_leader_id = Some(leader);
            Ok(vec![agent])
        });
        repo.expect_set_team_leader()
            .withf(|ids, leader| ids.to_vec() == vec![uid(2)] && leader.is_none())
            .times(1)
            .returning(|ids, _| Ok(ids.len()));

        let removed =
            remove_agents(&repo, &user_with_role(1, Role::Admin), uid(1), &[uid(2)]).unwrap();

        assert_eq!(removed, 1);
    }

    #[test]
    fn agents_are_never_synced() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|id| Ok(Some(crm_user(id.get(), Role::Retention))));
        repo.expect_mark_user_synced().times(0);

        let result = mark_synced(&repo, &user_with_role(1, Role::Admin), uid(6));

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }
}
