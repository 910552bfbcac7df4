//! DTOs used by team administration.

use serde::Serialize;

use crate::domain::types::UserId;
use crate::domain::user::CrmUser;

#[derive(Debug, Serialize)]
pub struct TeamMember {
    #[serde(flatten)]
    pub user: CrmUser,
    pub team_leader_name: Option<String>,
    /// Agents linked to this user as their leader.
    pub team_size: usize,
}

#[derive(Debug, Serialize)]
pub struct TeamOverview {
    pub members: Vec<TeamMember>,
    /// Conversion and retention agents not yet in a team.
    pub free_agents: Vec<UserId>,
}
