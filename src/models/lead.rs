//! Diesel models representing leads.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::lead::{KycStatus, Lead as DomainLead, NewLead as DomainNewLead};
use crate::domain::types::{
    CountryName, EmailAddress, LeadId, LeadPhone, PersonName, PlatformUserId, SourceFolder,
    StatusLabel, TypeConstraintError, UserId,
};
use crate::models::user::CrmUser;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::leads)]
#[diesel(belongs_to(CrmUser, foreign_key = assigned_to))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
/// Diesel model for [`crate::domain::lead::Lead`].
pub struct Lead {
    pub id: i32,
    pub name: String,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub status: String,
    pub kyc_status: String,
    pub source_file: Option<String>,
    pub assigned_to: Option<i32>,
    pub trading_account_id: Option<String>,
    pub note_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::leads)]
/// Insertable form of [`Lead`].
pub struct NewLead<'a> {
    pub name: &'a str,
    pub surname: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub country: Option<&'a str>,
    pub status: &'a str,
    pub source_file: Option<&'a str>,
    pub assigned_to: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Stored values that fail validation (legacy imports) are dropped rather
/// than failing the whole row.
fn lenient<T>(
    value: Option<String>,
    build: impl Fn(String) -> Result<T, TypeConstraintError>,
) -> Option<T> {
    value.and_then(|value| build(value).ok())
}

impl TryFrom<Lead> for DomainLead {
    type Error = TypeConstraintError;

    fn try_from(lead: Lead) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LeadId::try_from(lead.id)?,
            name: PersonName::new(lead.name)?,
            surname: lenient(lead.surname, PersonName::new),
            email: lenient(lead.email, EmailAddress::new),
            phone: lenient(lead.phone, LeadPhone::new),
            country: lenient(lead.country, CountryName::new),
            status: StatusLabel::new(lead.status)?,
            kyc_status: lead.kyc_status.parse::<KycStatus>()?,
            source_file: lenient(lead.source_file, SourceFolder::new),
            assigned_to: lead.assigned_to.map(UserId::try_from).transpose()?,
            trading_account_id: lenient(lead.trading_account_id, PlatformUserId::new),
            note_count: lead.note_count,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewLead> for NewLead<'a> {
    fn from(lead: &'a DomainNewLead) -> Self {
        Self {
            name: lead.name.as_str(),
            surname: lead.surname.as_ref().map(PersonName::as_str),
            email: lead.email.as_ref().map(EmailAddress::as_str),
            phone: lead.phone.as_ref().map(LeadPhone::as_str),
            country: lead.country.as_ref().map(CountryName::as_str),
            status: lead.status.as_str(),
            source_file: lead.source_file.as_ref().map(SourceFolder::as_str),
            assigned_to: lead.assigned_to.map(UserId::get),
            created_at: lead.created_at,
            updated_at: lead.created_at,
        }
    }
}
