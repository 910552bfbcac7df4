use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::auth::Role;
use crate::domain::types::{EmailAddress, PersonName, SourceFolder, TypeConstraintError, UserId};

/// CRM staff member.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrmUser {
    pub id: UserId,
    pub email: EmailAddress,
    pub real_name: PersonName,
    pub role: Role,
    pub team_leader_id: Option<UserId>,
    /// Source folders a manager is restricted to; empty means unrestricted.
    pub allowed_sources: Vec<SourceFolder>,
    /// Mirrored to the trading platform back-office.
    pub is_synced: bool,
    pub created_at: NaiveDateTime,
}

impl CrmUser {
    /// Conversion or retention agent without a team leader.
    pub fn is_free_agent(&self) -> bool {
        matches!(self.role, Role::Conversion | Role::Retention) && self.team_leader_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCrmUser {
    pub email: EmailAddress,
    pub real_name: PersonName,
    pub role: Role,
}

/// Encodes folder names as the JSON array persisted in a single column.
pub fn encode_sources(sources: &[SourceFolder]) -> String {
    let names: Vec<&str> = sources.iter().map(SourceFolder::as_str).collect();
    serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
}

/// Decodes the persisted column; blank means unrestricted.
pub fn decode_sources(raw: &str) -> Result<Vec<SourceFolder>, TypeConstraintError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let names = serde_json::from_str::<Vec<String>>(raw)
        .map_err(|err| TypeConstraintError::InvalidValue(format!("allowed_sources: {err}")))?;
    Ok(names
        .into_iter()
        .filter_map(|name| SourceFolder::new(name).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_round_trip_through_column() {
        let sources = vec![
            SourceFolder::new("Leads, March.csv").unwrap(),
            SourceFolder::new("b.csv").unwrap(),
        ];
        let raw = encode_sources(&sources);
        assert_eq!(raw, r#"["Leads, March.csv","b.csv"]"#);
        assert_eq!(decode_sources(&raw).unwrap(), sources);
        assert!(decode_sources("").unwrap().is_empty());
        assert!(decode_sources("[]").unwrap().is_empty());
        assert!(decode_sources("a.csv,b.csv").is_err());
    }
}
