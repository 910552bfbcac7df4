//! Lead aggregate and the visibility scope applied to lead queries.

use std::fmt::{Display, Formatter};

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    CountryName, EmailAddress, LeadId, LeadPhone, PersonName, PlatformUserId, SourceFolder,
    StatusLabel, TypeConstraintError, UserId,
};

/// Know-your-customer verification state of a lead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Pending => "pending",
            KycStatus::Approved => "approved",
            KycStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for KycStatus {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(KycStatus::Pending),
            "approved" => Ok(KycStatus::Approved),
            "rejected" => Ok(KycStatus::Rejected),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown kyc status {other}"
            ))),
        }
    }
}

impl Display for KycStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: LeadId,
    pub name: PersonName,
    pub surname: Option<PersonName>,
    pub email: Option<EmailAddress>,
    pub phone: Option<LeadPhone>,
    pub country: Option<CountryName>,
    pub status: StatusLabel,
    pub kyc_status: KycStatus,
    pub source_file: Option<SourceFolder>,
    pub assigned_to: Option<UserId>,
    pub trading_account_id: Option<PlatformUserId>,
    pub note_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Lead {
    /// Full name shown in lists and profile headers.
    pub fn display_name(&self) -> String {
        match &self.surname {
            Some(surname) => format!("{} {}", self.name, surname),
            None => self.name.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewLead {
    pub name: PersonName,
    pub surname: Option<PersonName>,
    pub email: Option<EmailAddress>,
    pub phone: Option<LeadPhone>,
    pub country: Option<CountryName>,
    pub status: StatusLabel,
    pub source_file: Option<SourceFolder>,
    pub assigned_to: Option<UserId>,
    pub created_at: NaiveDateTime,
}

impl NewLead {
    pub fn new(name: PersonName, status: StatusLabel) -> Self {
        Self {
            name,
            surname: None,
            email: None,
            phone: None,
            country: None,
            status,
            source_file: None,
            assigned_to: None,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Rows of the lead table a user may see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeadScope {
    All,
    /// Only leads imported into one of these folders.
    Sources(Vec<SourceFolder>),
    /// Only leads assigned to one of these users.
    AssignedTo(Vec<UserId>),
}

impl LeadScope {
    pub fn permits(&self, lead: &Lead) -> bool {
        match self {
            LeadScope::All => true,
            LeadScope::Sources(folders) => lead
                .source_file
                .as_ref()
                .is_some_and(|folder| folders.contains(folder)),
            LeadScope::AssignedTo(users) => lead
                .assigned_to
                .is_some_and(|agent| users.contains(&agent)),
        }
    }
}

/// Distinct values used to populate the lead filter bar.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct LeadFilterValues {
    pub sources: Vec<String>,
    pub countries: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead() -> Lead {
        let now = Utc::now().naive_utc();
        Lead {
            id: LeadId::new(1).unwrap(),
            name: PersonName::new("Jane").unwrap(),
            surname: Some(PersonName::new("Doe").unwrap()),
            email: None,
            phone: None,
            country: None,
            status: StatusLabel::new("New").unwrap(),
            kyc_status: KycStatus::Pending,
            source_file: Some(SourceFolder::new("march.csv").unwrap()),
            assigned_to: Some(UserId::new(3).unwrap()),
            trading_account_id: None,
            note_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn scope_permits_matching_rows_only() {
        let lead = lead();
        assert!(LeadScope::All.permits(&lead));
        assert!(LeadScope::AssignedTo(vec![UserId::new(3).unwrap()]).permits(&lead));
        assert!(!LeadScope::AssignedTo(vec![UserId::new(4).unwrap()]).permits(&lead));
        assert!(LeadScope::Sources(vec![SourceFolder::new("march.csv").unwrap()]).permits(&lead));
        assert!(!LeadScope::Sources(vec![]).permits(&lead));
    }

    #[test]
    fn display_name_joins_surname() {
        let mut lead = lead();
        assert_eq!(lead.display_name(), "Jane Doe");
        lead.surname = None;
        assert_eq!(lead.display_name(), "Jane");
    }

    #[test]
    fn kyc_status_parses_case_insensitively() {
        assert_eq!("Approved".parse::<KycStatus>().unwrap(), KycStatus::Approved);
        assert!("maybe".parse::<KycStatus>().is_err());
    }
}
