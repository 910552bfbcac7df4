//! Session identity and role gating.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::types::{TypeConstraintError, UserId};

/// CRM role carried in the session token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Role {
    Admin,
    Manager,
    TeamLeader,
    Conversion,
    Retention,
    Compliance,
}

/// Navigation entries a role is allowed to open in the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Leads,
    Team,
    Chat,
    Notifications,
    Trading,
    Kyc,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Manager,
        Role::TeamLeader,
        Role::Conversion,
        Role::Retention,
        Role::Compliance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::TeamLeader => "team_leader",
            Role::Conversion => "conversion",
            Role::Retention => "retention",
            Role::Compliance => "compliance",
        }
    }

    /// Parses a role name, falling back to `conversion` for unknown values.
    pub fn parse_lenient(value: &str) -> Role {
        value.parse().unwrap_or(Role::Conversion)
    }

    pub fn features(&self) -> &'static [Feature] {
        use Feature::*;
        match self {
            Role::Admin | Role::Manager => &[Leads, Team, Chat, Notifications, Trading, Kyc],
            Role::TeamLeader | Role::Conversion | Role::Retention => {
                &[Leads, Chat, Notifications, Trading]
            }
            Role::Compliance => &[Kyc, Chat, Notifications],
        }
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features().contains(&feature)
    }

    /// Admins and managers may assign, delete and bulk-edit leads.
    pub fn can_manage_leads(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Compliance also reads every lead, but only to review KYC.
    pub fn sees_all_leads(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn is_agent(&self) -> bool {
        matches!(self, Role::TeamLeader | Role::Conversion | Role::Retention)
    }
}

impl std::str::FromStr for Role {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s.trim())
            .ok_or_else(|| TypeConstraintError::InvalidValue(format!("unknown role {s}")))
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse_lenient(&value)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims of a verified session token.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// CRM user id.
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> Result<UserId, TypeConstraintError> {
        self.sub.parse()
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_falls_back_to_conversion() {
        assert_eq!(Role::parse_lenient("team_leader"), Role::TeamLeader);
        assert_eq!(Role::parse_lenient("superuser"), Role::Conversion);
        let parsed: Role = serde_json::from_str("\"compliance\"").unwrap();
        assert_eq!(parsed, Role::Compliance);
        let fallback: Role = serde_json::from_str("\"ghost\"").unwrap();
        assert_eq!(fallback, Role::Conversion);
    }

    #[test]
    fn team_menu_is_admin_and_manager_only() {
        for role in Role::ALL {
            let expected = matches!(role, Role::Admin | Role::Manager);
            assert_eq!(role.has_feature(Feature::Team), expected, "{role}");
        }
        assert!(!Role::Compliance.has_feature(Feature::Leads));
        assert!(Role::Retention.has_feature(Feature::Leads));
    }

    #[test]
    fn user_id_parses_subject() {
        let user = AuthenticatedUser {
            sub: "14".to_string(),
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            role: Role::Admin,
            exp: 0,
        };
        assert_eq!(user.user_id().unwrap().get(), 14);
    }
}
