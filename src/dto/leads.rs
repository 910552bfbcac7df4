//! DTOs returned by the lead endpoints.

use serde::Serialize;

use crate::domain::auth::Role;
use crate::domain::lead::Lead;
use crate::domain::status::LeadStatus;
use crate::domain::types::UserId;
use crate::domain::user::CrmUser;
use crate::pagination::Paginated;

/// One page of the lead list.
#[derive(Debug, Serialize)]
pub struct LeadPage {
    pub total: usize,
    pub page: usize,
    /// Number of pages, `ceil(total / limit)`.
    pub pages: usize,
    /// Page numbers for the pager; `null` stands for an ellipsis.
    pub pager: Vec<Option<usize>>,
    pub leads: Vec<Lead>,
}

impl From<Paginated<Lead>> for LeadPage {
    fn from(page: Paginated<Lead>) -> Self {
        Self {
            total: page.total,
            page: page.page,
            pages: page.last_page,
            pager: page.pages,
            leads: page.items,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgentOption {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl From<CrmUser> for AgentOption {
    fn from(user: CrmUser) -> Self {
        Self {
            id: user.id,
            name: user.real_name.into_inner(),
            role: user.role,
        }
    }
}

/// Values offered by the filter bar.
#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub sources: Vec<String>,
    pub countries: Vec<String>,
    pub agents: Vec<AgentOption>,
    pub statuses: Vec<LeadStatus>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Rows touched by a bulk mutation.
#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub affected: usize,
    pub leads: Vec<Lead>,
}
